//! Contracts for filling a blank chunk with generated content.
//!
//! Population must be total over a chunk: it may not fail on any input, only be cancelled. The cache hands the populator a
//! chunk nobody else can see yet, so a cancelled population is simply thrown away.

use crate::{CancelToken, StageResult};

use futures::future::BoxFuture;

/// Fills a chunk synchronously.
///
/// Closures taking `&mut C` are populators.
pub trait ChunkPopulator<C>: Send + Sync {
    fn populate(&self, chunk: &mut C);
}

impl<C, F> ChunkPopulator<C> for F
where
    F: Fn(&mut C) + Send + Sync,
{
    #[inline]
    fn populate(&self, chunk: &mut C) {
        (self)(chunk)
    }
}

/// Fills a chunk asynchronously, observing `cancel`.
///
/// Returning `Err(StageError::Cancelled)` is the only permitted failure. Every `ChunkPopulator` is also an
/// `AsyncChunkPopulator` that checks for cancellation before it starts.
pub trait AsyncChunkPopulator<C>: Send + Sync {
    fn populate_async<'a>(
        &'a self,
        chunk: &'a mut C,
        cancel: &'a CancelToken,
    ) -> BoxFuture<'a, StageResult<()>>;
}

impl<C, P> AsyncChunkPopulator<C> for P
where
    C: Send,
    P: ChunkPopulator<C>,
{
    fn populate_async<'a>(
        &'a self,
        chunk: &'a mut C,
        cancel: &'a CancelToken,
    ) -> BoxFuture<'a, StageResult<()>> {
        Box::pin(async move {
            cancel.check()?;
            self.populate(chunk);
            Ok(())
        })
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ArrayChunk, ArrayN, Chunk, ChunkKey2, ChunkStorage, IndexableMut, RasterChunkConfig2, StageError};

    use chunk_stage_core::IndexN;

    fn blank_chunk() -> ArrayChunk<2, u8> {
        let config = RasterChunkConfig2::for_payload::<u8>(2).unwrap();
        Chunk::new(
            ChunkKey2::new(IndexN([0, 0])),
            ArrayN::blank(&config, 0),
            &config,
        )
    }

    #[test]
    fn closures_are_populators() {
        let populator = |chunk: &mut ArrayChunk<2, u8>| {
            let bounds = chunk.stage_bounds();
            chunk.stage_view_mut().write_with(&bounds, |_| 1);
        };
        let mut chunk = blank_chunk();

        futures::executor::block_on(populator.populate_async(&mut chunk, &CancelToken::new()))
            .unwrap();

        assert!(chunk.local_view().values_slice().iter().all(|&v| v == 1));
    }

    #[test]
    fn cancelled_before_start_leaves_chunk_untouched() {
        let populator = |chunk: &mut ArrayChunk<2, u8>| {
            chunk.local_view_mut().reset_values(1);
        };
        let mut chunk = blank_chunk();
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = futures::executor::block_on(populator.populate_async(&mut chunk, &cancel));

        assert!(matches!(result, Err(StageError::Cancelled)));
        assert!(chunk.local_view().values_slice().iter().all(|&v| v == 0));
    }
}
