use super::{Lifecycle, LifecycleState, StoreBackend, StoreKey, WriteBatch};
use crate::{CancelToken, Serializer, StageResult};

use core::marker::PhantomData;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// A key-value store of one entity type, guarded by a fair (FIFO, so writers are not starved) async reader/writer lock.
///
/// Point reads share the lock. Point writes and transactions hold it exclusively, so at most one transaction runs at a time.
/// After `request_completion`, new operations fail with `StageError::StoreClosed` and the store completes when the in-flight
/// ones have drained.
///
/// There is no atomicity across stores. A transaction only covers the store it was started on.
pub struct TransactionalStore<K, B> {
    name: String,
    backend: B,
    lock: RwLock<()>,
    lifecycle: Lifecycle,
    marker: PhantomData<fn() -> K>,
}

impl<K, B> TransactionalStore<K, B>
where
    K: StoreKey,
    B: StoreBackend,
{
    pub fn new(name: impl Into<String>, backend: B) -> Self {
        Self {
            name: name.into(),
            backend,
            lock: RwLock::new(()),
            lifecycle: Lifecycle::new(),
            marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub async fn get(&self, key: &K) -> StageResult<Option<Vec<u8>>> {
        let _op = self.lifecycle.begin_operation()?;
        let _read = self.lock.read().await;

        self.backend.get(key.to_store_bytes().as_ref())
    }

    pub async fn put(&self, key: &K, value: Vec<u8>) -> StageResult<()> {
        let _op = self.lifecycle.begin_operation()?;
        let _write = self.lock.write().await;

        self.backend.put(key.to_store_bytes().as_ref(), value)
    }

    pub async fn delete(&self, key: &K) -> StageResult<()> {
        let _op = self.lifecycle.begin_operation()?;
        let _write = self.lock.write().await;

        self.backend.delete(key.to_store_bytes().as_ref())
    }

    /// Read and decode the value at `key`. Trailing bytes after the value are ignored.
    pub async fn get_value<S: Serializer>(&self, key: &K, serializer: &S) -> StageResult<Option<S::Value>> {
        match self.get(key).await? {
            Some(bytes) => serializer.deserialize(&mut bytes.as_slice()).map(Some),
            None => Ok(None),
        }
    }

    pub async fn put_value<S: Serializer>(&self, key: &K, value: &S::Value, serializer: &S) -> StageResult<()> {
        let mut bytes = Vec::with_capacity(serializer.encoded_len(value));
        serializer.serialize(value, &mut bytes);

        self.put(key, bytes).await
    }

    /// Every key in the store, in key byte order.
    pub async fn keys(&self) -> StageResult<Vec<K>> {
        let _op = self.lifecycle.begin_operation()?;
        let _read = self.lock.read().await;

        self.backend
            .keys()?
            .iter()
            .map(|bytes| K::from_store_bytes(bytes))
            .collect()
    }

    /// Make all previous writes durable.
    pub async fn flush(&self) -> StageResult<()> {
        let _op = self.lifecycle.begin_operation()?;
        let _read = self.lock.read().await;

        self.backend.flush().await
    }

    /// Run `body` with exclusive access to the store. Writes made by `body` are visible to its own reads and are applied
    /// atomically if it returns `Ok`, or discarded if it returns `Err`.
    ///
    /// Cancellation is checked before waiting for the lock and again before running `body`.
    pub async fn run_in_transaction<R>(
        &self,
        cancel: &CancelToken,
        body: impl FnOnce(&mut Transaction<'_, K, B>) -> StageResult<R>,
    ) -> StageResult<R> {
        cancel.check()?;
        let _op = self.lifecycle.begin_operation()?;
        let _write = self.lock.write().await;
        cancel.check()?;

        let mut transaction = Transaction {
            backend: &self.backend,
            pending: BTreeMap::new(),
            marker: PhantomData,
        };
        let output = body(&mut transaction)?;

        let writes = transaction.pending.len();
        if writes > 0 {
            let mut batch = WriteBatch::new();
            for (key, value) in transaction.pending {
                match value {
                    Some(value) => batch.put(key, value),
                    None => batch.delete(key),
                }
            }
            self.backend.apply(batch)?;
        }
        tracing::debug!(store = %self.name, writes, "committed transaction");

        Ok(output)
    }

    /// Refuse new operations and complete once the in-flight ones drain. Idempotent.
    pub fn request_completion(&self) {
        if self.lifecycle.request_completion() {
            tracing::info!(store = %self.name, "store completion requested");
        }
    }

    /// Resolves when the store has completed.
    pub async fn completion(&self) {
        self.lifecycle.completion().await;
        tracing::info!(store = %self.name, "store completed");
    }
}

/// Reads and buffered writes inside `TransactionalStore::run_in_transaction`.
pub struct Transaction<'a, K, B> {
    backend: &'a B,
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    marker: PhantomData<fn() -> K>,
}

impl<'a, K, B> Transaction<'a, K, B>
where
    K: StoreKey,
    B: StoreBackend,
{
    /// Sees this transaction's own writes.
    pub fn get(&self, key: &K) -> StageResult<Option<Vec<u8>>> {
        let bytes = key.to_store_bytes();
        match self.pending.get(bytes.as_ref()) {
            Some(pending) => Ok(pending.clone()),
            None => self.backend.get(bytes.as_ref()),
        }
    }

    pub fn put(&mut self, key: &K, value: Vec<u8>) {
        self.pending.insert(key.to_store_bytes().as_ref().to_vec(), Some(value));
    }

    pub fn delete(&mut self, key: &K) {
        self.pending.insert(key.to_store_bytes().as_ref().to_vec(), None);
    }

    pub fn get_value<S: Serializer>(&self, key: &K, serializer: &S) -> StageResult<Option<S::Value>> {
        match self.get(key)? {
            Some(bytes) => serializer.deserialize(&mut bytes.as_slice()).map(Some),
            None => Ok(None),
        }
    }

    pub fn put_value<S: Serializer>(&mut self, key: &K, value: &S::Value, serializer: &S) {
        let mut bytes = Vec::with_capacity(serializer.encoded_len(value));
        serializer.serialize(value, &mut bytes);
        self.put(key, bytes);
    }

    /// Number of keys written so far.
    pub fn num_pending(&self) -> usize {
        self.pending.len()
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
