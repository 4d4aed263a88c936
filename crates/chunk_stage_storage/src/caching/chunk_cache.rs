//! A bounded cache of live chunks with at most one instance per key.
//!
//! Chunks are materialized on demand: read from the store and decoded into pooled storage, or, when the store has nothing
//! (or something unreadable), populated from scratch. Loads of one key are serialized by a key-striped async mutex, so two
//! concurrent lookups never build two chunks for the same key, while lookups of unrelated keys proceed in parallel.
//!
//! When there are more than `CacheConfig::capacity` live chunks, the least recently used chunks that nobody holds a handle
//! to are evicted. Dirty chunks are written back to the store first, and their storage goes back to the stash for reuse.

use crate::{
    AsyncChunkPopulator, CacheConfig, CancelToken, Chunk, ChunkCodec, ChunkKey, ChunkStorage, LruCache, NeighborhoodView,
    RasterChunkConfig, ResourceStash, SmallKeyBuildHasher, SmallKeyHashMap, StageResult, StoreBackend, StoreKey,
    TransactionalStore,
};

use core::hash::{BuildHasher, Hash, Hasher};
use itertools::Itertools;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{OwnedRwLockReadGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Dirty chunks written per store transaction by `ChunkCache::flush`.
const FLUSH_BATCH_SIZE: usize = 64;

//  ██╗  ██╗ █████╗ ███╗   ██╗██████╗ ██╗     ███████╗███████╗
//  ██║  ██║██╔══██╗████╗  ██║██╔══██╗██║     ██╔════╝██╔════╝
//  ███████║███████║██╔██╗ ██║██║  ██║██║     █████╗  ███████╗
//  ██╔══██║██╔══██║██║╚██╗██║██║  ██║██║     ██╔══╝  ╚════██║
//  ██║  ██║██║  ██║██║ ╚████║██████╔╝███████╗███████╗███████║
//  ╚═╝  ╚═╝╚═╝  ╚═╝╚═╝  ╚═══╝╚═════╝ ╚══════╝╚══════╝╚══════╝

/// Shared access to a live chunk. A chunk is never evicted while any handle to it exists.
pub struct ChunkHandle<const D: usize, S> {
    key: ChunkKey<D>,
    chunk: Arc<RwLock<Chunk<D, S>>>,
    dirty: Arc<AtomicBool>,
}

impl<const D: usize, S> Clone for ChunkHandle<D, S> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            chunk: self.chunk.clone(),
            dirty: self.dirty.clone(),
        }
    }
}

impl<const D: usize, S> ChunkHandle<D, S> {
    #[inline]
    pub fn key(&self) -> ChunkKey<D> {
        self.key
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Chunk<D, S>> {
        self.chunk.read().await
    }

    /// Marks the chunk dirty, so it will be written back before eviction.
    pub async fn write(&self) -> RwLockWriteGuard<'_, Chunk<D, S>> {
        self.dirty.store(true, Ordering::Release);
        self.chunk.write().await
    }

    /// A read guard that keeps the chunk alive on its own.
    pub async fn read_owned(&self) -> OwnedRwLockReadGuard<Chunk<D, S>> {
        self.chunk.clone().read_owned().await
    }

    /// True if the chunk has changes that the store has not seen.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// True if both handles refer to the same chunk instance.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.chunk, &other.chunk)
    }

    #[inline]
    pub fn into_read_only(self) -> ReadOnlyChunkHandle<D, S> {
        ReadOnlyChunkHandle {
            key: self.key,
            chunk: self.chunk,
        }
    }
}

/// Like a `ChunkHandle`, but it can only read.
pub struct ReadOnlyChunkHandle<const D: usize, S> {
    key: ChunkKey<D>,
    chunk: Arc<RwLock<Chunk<D, S>>>,
}

impl<const D: usize, S> Clone for ReadOnlyChunkHandle<D, S> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            chunk: self.chunk.clone(),
        }
    }
}

impl<const D: usize, S> ReadOnlyChunkHandle<D, S> {
    #[inline]
    pub fn key(&self) -> ChunkKey<D> {
        self.key
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Chunk<D, S>> {
        self.chunk.read().await
    }

    pub async fn read_owned(&self) -> OwnedRwLockReadGuard<Chunk<D, S>> {
        self.chunk.clone().read_owned().await
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.chunk, &other.chunk)
    }
}

struct LiveChunk<const D: usize, S> {
    chunk: Arc<RwLock<Chunk<D, S>>>,
    dirty: Arc<AtomicBool>,
}

impl<const D: usize, S> Clone for LiveChunk<D, S> {
    fn clone(&self) -> Self {
        Self {
            chunk: self.chunk.clone(),
            dirty: self.dirty.clone(),
        }
    }
}

impl<const D: usize, S> LiveChunk<D, S> {
    fn new(chunk: Chunk<D, S>, dirty: bool) -> Self {
        Self {
            chunk: Arc::new(RwLock::new(chunk)),
            dirty: Arc::new(AtomicBool::new(dirty)),
        }
    }

    // Only the live map holds it. New handles are only cloned from the live map, under its lock.
    fn is_unshared(&self) -> bool {
        Arc::strong_count(&self.chunk) == 1
    }

    fn handle(&self, key: ChunkKey<D>) -> ChunkHandle<D, S> {
        ChunkHandle {
            key,
            chunk: self.chunk.clone(),
            dirty: self.dirty.clone(),
        }
    }
}

// ███████╗████████╗ █████╗ ████████╗███████╗
// ██╔════╝╚══██╔══╝██╔══██╗╚══██╔══╝██╔════╝
// ███████╗   ██║   ███████║   ██║   ███████╗
// ╚════██║   ██║   ██╔══██║   ██║   ╚════██║
// ███████║   ██║   ██║  ██║   ██║   ███████║
// ╚══════╝   ╚═╝   ╚═╝  ╚═╝   ╚═╝   ╚══════╝

#[derive(Debug, Default)]
struct CacheStats {
    loads: AtomicUsize,
    populations: AtomicUsize,
    write_backs: AtomicUsize,
    evictions: AtomicUsize,
}

/// Counters of a `ChunkCache` since it was created.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStatsSnapshot {
    /// Chunks decoded from the store.
    pub loads: usize,
    /// Chunks built by the populator.
    pub populations: usize,
    /// Chunks written to the store.
    pub write_backs: usize,
    pub evictions: usize,
}

impl CacheStats {
    fn bump(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            loads: self.loads.load(Ordering::Relaxed),
            populations: self.populations.load(Ordering::Relaxed),
            write_backs: self.write_backs.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

//  ██████╗ █████╗  ██████╗██╗  ██╗███████╗
// ██╔════╝██╔══██╗██╔════╝██║  ██║██╔════╝
// ██║     ███████║██║     ███████║█████╗
// ██║     ██╔══██║██║     ██╔══██║██╔══╝
// ╚██████╗██║  ██║╚██████╗██║  ██║███████╗
//  ╚═════╝╚═╝  ╚═╝ ╚═════╝╚═╝  ╚═╝╚══════╝

/// The identity cache of live chunks for one stage.
///
/// - `S`: chunk storage, pooled in a `ResourceStash`
/// - `B`: the backend of the chunk store
/// - `C`: how chunks are encoded in the store
/// - `P`: fills chunks the store doesn't have
pub struct ChunkCache<const D: usize, S, B, C, P> {
    chunk_config: RasterChunkConfig<D>,
    config: CacheConfig,
    store: Arc<TransactionalStore<ChunkKey<D>, B>>,
    codec: C,
    populator: P,
    stash: ResourceStash<S>,
    live: Mutex<LruCache<ChunkKey<D>, LiveChunk<D, S>>>,
    stripes: Box<[tokio::sync::Mutex<()>]>,
    hasher: SmallKeyBuildHasher,
    stats: CacheStats,
}

impl<const D: usize, S, B, C, P> ChunkCache<D, S, B, C, P>
where
    S: ChunkStorage<D>,
    S::Value: Send + Sync + 'static,
    ChunkKey<D>: StoreKey,
    B: StoreBackend,
    C: ChunkCodec<D, S>,
    P: AsyncChunkPopulator<Chunk<D, S>>,
{
    /// Blank chunks are filled with `ambient` before they are decoded into or populated.
    pub fn new(
        chunk_config: RasterChunkConfig<D>,
        config: CacheConfig,
        ambient: S::Value,
        store: Arc<TransactionalStore<ChunkKey<D>, B>>,
        codec: C,
        populator: P,
    ) -> StageResult<Self> {
        config.validate()?;

        let reset_ambient = ambient.clone();
        let stash = ResourceStash::new(
            &config.stash_config(),
            move || S::blank(&chunk_config, ambient.clone()),
            move |storage: &mut S| storage.reset(reset_ambient.clone()),
        )?;
        let stripes = (0..config.lock_stripes)
            .map(|_| tokio::sync::Mutex::new(()))
            .collect();

        Ok(Self {
            chunk_config,
            config,
            store,
            codec,
            populator,
            stash,
            live: Mutex::new(LruCache::default()),
            stripes,
            hasher: SmallKeyBuildHasher::default(),
            stats: CacheStats::default(),
        })
    }

    #[inline]
    pub fn chunk_config(&self) -> &RasterChunkConfig<D> {
        &self.chunk_config
    }

    #[inline]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    #[inline]
    pub fn store(&self) -> &Arc<TransactionalStore<ChunkKey<D>, B>> {
        &self.store
    }

    #[inline]
    pub fn stash(&self) -> &ResourceStash<S> {
        &self.stash
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of live chunks.
    pub fn len(&self) -> usize {
        self.lock_live().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_live().is_empty()
    }

    /// A view of this cache that can only hand out read-only handles.
    pub fn read_only(&self) -> ReadOnlyChunkCache<'_, D, S, B, C, P> {
        ReadOnlyChunkCache { cache: self }
    }

    fn lock_live(&self) -> MutexGuard<'_, LruCache<ChunkKey<D>, LiveChunk<D, S>>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stripe(&self, key: ChunkKey<D>) -> &tokio::sync::Mutex<()> {
        let mut hasher = self.hasher.build_hasher();
        key.hash(&mut hasher);

        &self.stripes[hasher.finish() as usize % self.stripes.len()]
    }

    /// The live chunk at `key`, marked most recently used.
    fn touch_live(&self, key: ChunkKey<D>) -> Option<ChunkHandle<D, S>> {
        let mut live = self.lock_live();
        live.touch(&key);

        live.get(&key).map(|entry| entry.handle(key))
    }

    /// The live chunk at `key`, if there is one. Never loads and doesn't update the LRU order.
    pub fn get(&self, key: ChunkKey<D>) -> Option<ChunkHandle<D, S>> {
        self.lock_live().get(&key).map(|entry| entry.handle(key))
    }

    /// Get the chunk at `key`, loading or populating it if it isn't live.
    ///
    /// Concurrent calls for the same key return handles to the same chunk, and only one of them does the loading. If
    /// `cancel` fires before the chunk is published, nothing is published and the storage goes back to the stash.
    pub async fn get_or_load(&self, key: ChunkKey<D>, cancel: &CancelToken) -> StageResult<ChunkHandle<D, S>> {
        cancel.check()?;
        if let Some(handle) = self.touch_live(key) {
            return Ok(handle);
        }

        let handle = {
            let _stripe = self.stripe(key).lock().await;

            // Someone else may have loaded it while we waited.
            if let Some(handle) = self.touch_live(key) {
                return Ok(handle);
            }

            let (chunk, dirty) = self.materialize(key, cancel).await?;
            if let Err(e) = cancel.check() {
                self.stash.release(chunk.into_storage());
                return Err(e);
            }

            self.publish(key, chunk, dirty)
        };

        self.evict_excess().await;

        Ok(handle)
    }

    /// Build the chunk for `key` in pooled storage. Returns whether it differs from the store.
    async fn materialize(&self, key: ChunkKey<D>, cancel: &CancelToken) -> StageResult<(Chunk<D, S>, bool)> {
        let stored = match self.store.get(&key).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_interruption() => return Err(e),
            Err(e) => {
                tracing::warn!(?key, error = %e, "failed to read chunk from store, populating instead");
                None
            }
        };

        let mut storage = self.stash.acquire();
        if let Some(bytes) = stored {
            match self.codec.decode_into(&bytes, &mut storage) {
                Ok(()) => {
                    CacheStats::bump(&self.stats.loads, 1);
                    tracing::debug!(?key, "loaded chunk");

                    return Ok((Chunk::new(key, storage, &self.chunk_config), false));
                }
                Err(e) => {
                    tracing::warn!(?key, error = %e, "corrupt chunk in store, populating instead");
                    self.stash.reset(&mut storage);
                }
            }
        }

        let mut chunk = Chunk::new(key, storage, &self.chunk_config);
        if let Err(e) = self.populator.populate_async(&mut chunk, cancel).await {
            self.stash.release(chunk.into_storage());
            return Err(e);
        }
        CacheStats::bump(&self.stats.populations, 1);
        tracing::debug!(?key, "populated chunk");

        Ok((chunk, true))
    }

    fn publish(&self, key: ChunkKey<D>, chunk: Chunk<D, S>, dirty: bool) -> ChunkHandle<D, S> {
        let entry = LiveChunk::new(chunk, dirty);
        let handle = entry.handle(key);
        let replaced = self.lock_live().insert(key, entry);
        debug_assert!(replaced.is_none(), "two live chunks for {:?}", key);

        handle
    }

    /// Evict unshared chunks, least recently used first, until at most `capacity` are live.
    async fn evict_excess(&self) {
        let victims = {
            let live = self.lock_live();
            let excess = live.len().saturating_sub(self.config.capacity);
            live.iter_lru()
                .filter(|(_, entry)| entry.is_unshared())
                .map(|(key, _)| *key)
                .take(excess)
                .collect_vec()
        };

        for key in victims {
            if let Err(e) = self.evict(key).await {
                tracing::warn!(?key, error = %e, "failed to evict chunk");
            }
        }
    }

    /// Evict the chunk at `key` if it is live and nobody holds a handle to it. A dirty chunk is written back first; if that
    /// fails, the chunk stays live. Returns whether the chunk was evicted.
    pub async fn evict(&self, key: ChunkKey<D>) -> StageResult<bool> {
        let _stripe = self.stripe(key).lock().await;

        let entry = {
            let mut live = self.lock_live();
            match live.get(&key) {
                Some(entry) if entry.is_unshared() => live.remove(&key),
                _ => None,
            }
        };
        let LiveChunk { chunk, dirty } = match entry {
            Some(entry) => entry,
            None => return Ok(false),
        };
        let chunk = match Arc::try_unwrap(chunk) {
            Ok(lock) => lock.into_inner(),
            Err(chunk) => {
                self.lock_live().insert(key, LiveChunk { chunk, dirty });
                return Ok(false);
            }
        };

        if dirty.load(Ordering::Acquire) {
            let mut bytes = Vec::with_capacity(self.chunk_config.approximate_size_in_bytes());
            self.codec.encode(chunk.local_view(), &mut bytes);
            if let Err(e) = self.store.put(&key, bytes).await {
                self.lock_live().insert(key, LiveChunk::new(chunk, true));
                return Err(e);
            }
            CacheStats::bump(&self.stats.write_backs, 1);
            tracing::debug!(?key, "wrote back chunk");
        }

        self.stash.release(chunk.into_storage());
        CacheStats::bump(&self.stats.evictions, 1);
        tracing::debug!(?key, "evicted chunk");

        Ok(true)
    }

    /// Write every dirty live chunk to the store, in transactions of up to 64 chunks, then flush the store. Chunks stay live.
    /// Returns the number of chunks written.
    pub async fn flush(&self, cancel: &CancelToken) -> StageResult<usize> {
        let dirty = {
            let live = self.lock_live();
            live.iter_lru()
                .filter(|(_, entry)| entry.dirty.load(Ordering::Acquire))
                .map(|(key, entry)| (*key, entry.clone()))
                .collect_vec()
        };

        let mut written = 0;
        for batch in dirty.chunks(FLUSH_BATCH_SIZE) {
            cancel.check()?;

            let mut encoded = Vec::with_capacity(batch.len());
            for (key, entry) in batch {
                // Cleared before reading, so a concurrent writer re-marks the chunk.
                entry.dirty.store(false, Ordering::Release);
                let chunk = entry.chunk.read().await;
                let mut bytes = Vec::with_capacity(self.chunk_config.approximate_size_in_bytes());
                self.codec.encode(chunk.local_view(), &mut bytes);
                encoded.push((*key, bytes));
            }

            let result = self
                .store
                .run_in_transaction(cancel, |txn| {
                    for (key, bytes) in encoded {
                        txn.put(&key, bytes);
                    }
                    Ok(())
                })
                .await;
            if let Err(e) = result {
                for (_, entry) in batch {
                    entry.dirty.store(true, Ordering::Release);
                }
                return Err(e);
            }

            written += batch.len();
            CacheStats::bump(&self.stats.write_backs, batch.len());
        }

        self.store.flush().await?;
        tracing::debug!(written, "flushed chunk cache");

        Ok(written)
    }

    /// Load the chunk at `key` and all of its neighbors, and hold them for reading.
    ///
    /// The cache may briefly hold more than `capacity` chunks while the view exists.
    pub async fn neighborhood(&self, key: ChunkKey<D>, cancel: &CancelToken) -> StageResult<NeighborhoodView<D, S>> {
        let mut chunks = SmallKeyHashMap::default();
        for neighbor in key.neighborhood() {
            let handle = self.get_or_load(neighbor, cancel).await?;
            chunks.insert(neighbor, handle.read_owned().await);
        }

        Ok(NeighborhoodView::new(key, self.chunk_config, chunks))
    }
}

/// A view of a `ChunkCache` for consumers that must never change the stage, like renderers.
pub struct ReadOnlyChunkCache<'a, const D: usize, S, B, C, P> {
    cache: &'a ChunkCache<D, S, B, C, P>,
}

impl<'a, const D: usize, S, B, C, P> Clone for ReadOnlyChunkCache<'a, D, S, B, C, P> {
    fn clone(&self) -> Self {
        Self { cache: self.cache }
    }
}

impl<'a, const D: usize, S, B, C, P> Copy for ReadOnlyChunkCache<'a, D, S, B, C, P> {}

impl<'a, const D: usize, S, B, C, P> ReadOnlyChunkCache<'a, D, S, B, C, P>
where
    S: ChunkStorage<D>,
    S::Value: Send + Sync + 'static,
    ChunkKey<D>: StoreKey,
    B: StoreBackend,
    C: ChunkCodec<D, S>,
    P: AsyncChunkPopulator<Chunk<D, S>>,
{
    #[inline]
    pub fn chunk_config(&self) -> &RasterChunkConfig<D> {
        self.cache.chunk_config()
    }

    pub fn get(&self, key: ChunkKey<D>) -> Option<ReadOnlyChunkHandle<D, S>> {
        self.cache.get(key).map(ChunkHandle::into_read_only)
    }

    pub async fn get_or_load(
        &self,
        key: ChunkKey<D>,
        cancel: &CancelToken,
    ) -> StageResult<ReadOnlyChunkHandle<D, S>> {
        self.cache
            .get_or_load(key, cancel)
            .await
            .map(ChunkHandle::into_read_only)
    }

    pub async fn neighborhood(&self, key: ChunkKey<D>, cancel: &CancelToken) -> StageResult<NeighborhoodView<D, S>> {
        self.cache.neighborhood(key, cancel).await
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
