//! Key-value engines underneath a `TransactionalStore`.

use crate::{StageError, StageResult};

use auto_impl::auto_impl;
use futures::future::{BoxFuture, FutureExt};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// A set of writes applied atomically by `StoreBackend::apply`. Later operations on the same key win.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WriteBatch {
    ops: Vec<(Vec<u8>, Option<Vec<u8>>)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: Vec<u8>) {
        self.ops.push((key.into(), Some(value)));
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push((key.into(), None));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// `None` values are deletions.
    pub fn into_ops(self) -> impl Iterator<Item = (Vec<u8>, Option<Vec<u8>>)> {
        self.ops.into_iter()
    }
}

/// An ordered byte-string map. Point operations are synchronous; durability is requested with `flush`.
#[auto_impl(&, Box, Arc)]
pub trait StoreBackend: Send + Sync {
    fn get(&self, key: &[u8]) -> StageResult<Option<Vec<u8>>>;

    fn put(&self, key: &[u8], value: Vec<u8>) -> StageResult<()>;

    fn delete(&self, key: &[u8]) -> StageResult<()>;

    /// Apply every operation in `batch`, or none of them.
    fn apply(&self, batch: WriteBatch) -> StageResult<()>;

    /// All keys, in lexicographic order.
    fn keys(&self) -> StageResult<Vec<Vec<u8>>>;

    /// Resolves once all previous writes are durable.
    fn flush<'a>(&'a self) -> BoxFuture<'a, StageResult<()>>;
}

/// A `StoreBackend` that lives only in memory, for tests and throwaway stages.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    map: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl StoreBackend for MemoryBackend {
    fn get(&self, key: &[u8]) -> StageResult<Option<Vec<u8>>> {
        Ok(self.lock().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: Vec<u8>) -> StageResult<()> {
        self.lock().insert(key.to_vec(), value);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StageResult<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn apply(&self, batch: WriteBatch) -> StageResult<()> {
        let mut map = self.lock();
        for (key, value) in batch.into_ops() {
            match value {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn keys(&self) -> StageResult<Vec<Vec<u8>>> {
        Ok(self.lock().keys().cloned().collect())
    }

    fn flush<'a>(&'a self) -> BoxFuture<'a, StageResult<()>> {
        futures::future::ok::<(), StageError>(()).boxed()
    }
}

#[cfg(feature = "sled")]
pub use self::sled_backend::SledBackend;

#[cfg(feature = "sled")]
mod sled_backend {
    use super::*;

    use sled::Tree;
    use std::path::Path;

    /// A `StoreBackend` over one `sled::Tree`.
    #[derive(Clone, Debug)]
    pub struct SledBackend {
        tree: Tree,
        // Keeps the database open when the tree was opened by us.
        _db: Option<sled::Db>,
    }

    impl SledBackend {
        /// Open (or create) the database at `path` and use its default tree. A `temporary` database is deleted when dropped.
        pub fn open(path: impl AsRef<Path>, temporary: bool) -> StageResult<Self> {
            let db = sled::Config::default()
                .path(path)
                .temporary(temporary)
                .use_compression(false)
                .mode(sled::Mode::HighThroughput)
                .open()?;

            Ok(Self {
                tree: (*db).clone(),
                _db: Some(db),
            })
        }

        /// An in-memory database that is deleted when dropped.
        pub fn temporary() -> StageResult<Self> {
            let db = sled::Config::new().temporary(true).open()?;

            Ok(Self {
                tree: (*db).clone(),
                _db: Some(db),
            })
        }

        /// Use a tree of a database owned elsewhere.
        pub fn from_tree(tree: Tree) -> Self {
            Self { tree, _db: None }
        }

        pub fn tree(&self) -> &Tree {
            &self.tree
        }
    }

    impl StoreBackend for SledBackend {
        fn get(&self, key: &[u8]) -> StageResult<Option<Vec<u8>>> {
            Ok(self.tree.get(key)?.map(|v| v.to_vec()))
        }

        fn put(&self, key: &[u8], value: Vec<u8>) -> StageResult<()> {
            self.tree.insert(key, value)?;
            Ok(())
        }

        fn delete(&self, key: &[u8]) -> StageResult<()> {
            self.tree.remove(key)?;
            Ok(())
        }

        fn apply(&self, batch: WriteBatch) -> StageResult<()> {
            let mut sled_batch = sled::Batch::default();
            for (key, value) in batch.into_ops() {
                match value {
                    Some(value) => sled_batch.insert(key, value),
                    None => sled_batch.remove(key),
                }
            }
            self.tree.apply_batch(sled_batch)?;
            Ok(())
        }

        fn keys(&self) -> StageResult<Vec<Vec<u8>>> {
            self.tree
                .iter()
                .keys()
                .map(|k| k.map(|k| k.to_vec()).map_err(StageError::from))
                .collect()
        }

        fn flush<'a>(&'a self) -> BoxFuture<'a, StageResult<()>> {
            // Flushing blocks on file I/O, so it runs on the blocking pool.
            let tree = self.tree.clone();
            async move {
                tokio::task::spawn_blocking(move || tree.flush())
                    .await
                    .map_err(|e| StageError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;
                Ok::<(), StageError>(())
            }
            .boxed()
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
