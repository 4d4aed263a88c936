use chunk_stage::prelude::*;

use std::sync::Arc;
use tempdir::TempDir;
use utilities::data_sets::rolling_hills;
use utilities::test::init_tracing;

struct VoxelChunks;

impl EntityType for VoxelChunks {
    const TYPE_ID: &'static str = "voxel_chunk";
    type Key = ChunkKey3;
}

/// Counts the solid voxels of the center chunk that have an air neighbor, i.e. the surface a mesher would emit.
struct SurfaceCounter;

impl ChunkContourer<3, IndexableTree3<u16>> for SurfaceCounter {
    type Output = usize;

    fn contour(&self, view: &NeighborhoodView<3, IndexableTree3<u16>>) -> usize {
        let mut surface = 0;
        view.for_each(&view.center_bounds(), |i, value| {
            if value == 1
                && IndexN::von_neumann_offsets()
                    .iter()
                    .any(|&offset| view.get(i + offset).map_or(false, |v| v == 0))
            {
                surface += 1;
            }
        });

        surface
    }
}

fn populate_hills(chunk: &mut TreeChunk<3, u16>) {
    let bounds = chunk.stage_bounds();
    chunk.stage_view_mut().write_with(&bounds, rolling_hills);
    chunk.local_view_mut().merge_uniform();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn evicted_chunks_survive_a_round_trip_through_the_store() {
    init_tracing();

    let dir = TempDir::new("chunk-stage").unwrap();
    let factory = PartitionedStoreFactory::new(StoreConfig::new(dir.path()).with_prefix("world_")).unwrap();
    let store = factory.open::<VoxelChunks>().unwrap();

    let chunk_config = RasterChunkConfig3::for_payload::<u16>(3).unwrap();
    let cache = ChunkCache::new(
        chunk_config,
        CacheConfig::default().with_capacity(4),
        0u16,
        store.clone(),
        TreeChunkCodec::new(PrimitiveSerializer::<u16>::big()),
        populate_hills,
    )
    .unwrap();
    let cancel = CancelToken::new();

    let keys: Vec<_> = Bounds3::new(IndexN([-2, -1, -2]), IndexN([4, 2, 4]))
        .iter_indices()
        .map(ChunkKey3::new)
        .collect();
    for &key in keys.iter() {
        let handle = cache.get_or_load(key, &cancel).await.unwrap();
        assert_eq!(handle.key(), key);
    }
    assert!(cache.len() <= 4);

    let stats = cache.stats();
    assert_eq!(stats.populations, keys.len());
    assert_eq!(stats.write_backs, stats.evictions);

    // Every evicted chunk comes back from the store with the same content.
    for &key in keys.iter() {
        let handle = cache.read_only().get_or_load(key, &cancel).await.unwrap();
        let chunk = handle.read().await;
        for i in chunk.stage_bounds().iter_indices() {
            assert_eq!(chunk.stage_view().get(i).unwrap(), rolling_hills(i));
        }
    }
    assert!(cache.stats().loads > 0);
    assert_eq!(cache.stats().populations, keys.len());

    cache.flush(&cancel).await.unwrap();
    assert_eq!(store.keys().await.unwrap().len(), keys.len());

    store.request_completion();
    store.completion().await;
    assert!(factory.open::<VoxelChunks>().unwrap().get(&keys[0]).await.is_err());
}

#[tokio::test]
async fn contouring_sees_across_chunk_boundaries() {
    init_tracing();

    let store = Arc::new(TransactionalStore::new("chunks", MemoryBackend::new()));
    let chunk_config = RasterChunkConfig3::for_payload::<u16>(3).unwrap();
    let cache = ChunkCache::new(
        chunk_config,
        CacheConfig::default().with_capacity(32),
        0u16,
        store,
        TreeChunkCodec::new(PrimitiveSerializer::<u16>::little()),
        populate_hills,
    )
    .unwrap();

    let center = ChunkKey3::new(IndexN([0, 0, 0]));
    let view = cache.neighborhood(center, &CancelToken::new()).await.unwrap();
    let surface = SurfaceCounter.contour(&view);

    // Recount by brute force from the height field itself.
    let mut expected = 0;
    for i in view.center_bounds().iter_indices() {
        if rolling_hills(i) == 1 && IndexN::von_neumann_offsets().iter().any(|&o| rolling_hills(i + o) == 0) {
            expected += 1;
        }
    }
    assert_eq!(surface, expected);
}

#[test]
fn tree_chunks_collapse_uniform_regions_on_decode() {
    let (sphere, radius) = utilities::data_sets::sphere_array(16, 1u16, 0);
    assert_eq!(radius, 7);

    let mut bytes = Vec::new();
    IndexableSerializer::<3, _>::new(PrimitiveSerializer::<u16>::big()).serialize_indexable(&sphere, &mut bytes);

    let codec = TreeChunkCodec::<3, _>::new(PrimitiveSerializer::<u16>::big());
    let mut tree = IndexableTree3::new(IndexN::ZERO, 4, 0u16).unwrap();
    codec.decode_into(&bytes, &mut tree).unwrap();

    let offset = sphere.bounds().lower_bounds;
    for i in tree.bounds().iter_indices() {
        assert_eq!(tree.get(i).unwrap(), sphere.get(i + offset).unwrap());
    }
    assert!(tree.breadth_first().count() < sphere.bounds().length());
}
