use crate::{ChunkKey, StageError, StageResult};

use chunk_stage_core::prelude::*;

/// A key that can be stored in a `StoreBackend`.
///
/// Chunk keys are stored as big-endian Morton codes, so the lexicographic order of the bytes is the Morton order of the keys
/// and the chunks of any aligned power-of-two region are contiguous in the backend.
pub trait StoreKey: Copy + Eq + Send + Sync + 'static {
    type Bytes: AsRef<[u8]>;

    fn to_store_bytes(&self) -> Self::Bytes;

    fn from_store_bytes(bytes: &[u8]) -> StageResult<Self>;
}

fn exact<const N: usize>(bytes: &[u8]) -> StageResult<[u8; N]> {
    let mut array = [0; N];
    if bytes.len() != N {
        return Err(StageError::invalid_argument(format!(
            "store key has {} bytes, expected {}",
            bytes.len(),
            N
        )));
    }
    array.copy_from_slice(bytes);

    Ok(array)
}

impl StoreKey for ChunkKey<2> {
    type Bytes = [u8; 8];

    #[inline]
    fn to_store_bytes(&self) -> Self::Bytes {
        Morton2::from(self.0).0.to_be_bytes()
    }

    #[inline]
    fn from_store_bytes(bytes: &[u8]) -> StageResult<Self> {
        Ok(ChunkKey(Index2::from(Morton2(u64::from_be_bytes(exact(bytes)?)))))
    }
}

impl StoreKey for ChunkKey<3> {
    // A `Morton3` only uses the least significant 96 bits of its u128.
    type Bytes = [u8; 12];

    #[inline]
    fn to_store_bytes(&self) -> Self::Bytes {
        let mut bytes = [0; 12];
        bytes.copy_from_slice(&Morton3::from(self.0).0.to_be_bytes()[4..]);

        bytes
    }

    #[inline]
    fn from_store_bytes(bytes: &[u8]) -> StageResult<Self> {
        let mut morton_bytes = [0; 16];
        morton_bytes[4..].copy_from_slice(&exact::<12>(bytes)?);

        Ok(ChunkKey(Index3::from(Morton3(u128::from_be_bytes(morton_bytes)))))
    }
}

impl StoreKey for ChunkKey<4> {
    type Bytes = [u8; 16];

    #[inline]
    fn to_store_bytes(&self) -> Self::Bytes {
        Morton4::from(self.0).0.to_be_bytes()
    }

    #[inline]
    fn from_store_bytes(bytes: &[u8]) -> StageResult<Self> {
        Ok(ChunkKey(Index4::from(Morton4(u128::from_be_bytes(exact(bytes)?)))))
    }
}

/// Integer keys, e.g. for metadata records.
impl StoreKey for u64 {
    type Bytes = [u8; 8];

    #[inline]
    fn to_store_bytes(&self) -> Self::Bytes {
        self.to_be_bytes()
    }

    #[inline]
    fn from_store_bytes(bytes: &[u8]) -> StageResult<Self> {
        Ok(u64::from_be_bytes(exact(bytes)?))
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
