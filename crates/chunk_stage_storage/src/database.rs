//! Persistence of chunks and other records.
//!
//! A `TransactionalStore` wraps a `StoreBackend` with a reader/writer lock, transactions and a completion state machine.
//! `PartitionedStoreFactory` gives each entity type its own `sled` database. Chunk keys are stored as big-endian Morton codes,
//! so the chunks in any aligned power-of-two region of the stage are contiguous on disk.
//!
//! ```
//! use chunk_stage_core::prelude::*;
//! use chunk_stage_storage::prelude::*;
//!
//! # futures::executor::block_on(async {
//! let store = TransactionalStore::<ChunkKey3, _>::new("chunks", MemoryBackend::new());
//! let key = ChunkKey3::new(IndexN([1, -2, 3]));
//!
//! store
//!     .run_in_transaction(&CancelToken::new(), |txn| {
//!         txn.put(&key, vec![1, 2, 3]);
//!         Ok(())
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(store.get(&key).await.unwrap(), Some(vec![1, 2, 3]));
//!
//! store.request_completion();
//! store.completion().await;
//! assert!(store.get(&key).await.is_err());
//! # });
//! ```

pub mod backend;
mod key;
pub mod lifecycle;
#[cfg(feature = "sled")]
pub mod partition;
pub mod store;

pub use backend::*;
pub use key::*;
pub use lifecycle::*;
#[cfg(feature = "sled")]
pub use partition::*;
pub use store::*;

#[cfg(feature = "sled")]
pub use sled;
