use chunk_stage_core::prelude::*;
use chunk_stage_storage::prelude::*;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn serialize_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize_array");
    for size in ARRAY_SIZES.iter() {
        for (name, serializer) in [
            ("big", IndexableSerializer::<3, _>::new(PrimitiveSerializer::<u32>::big())),
            ("native", IndexableSerializer::<3, _>::new(PrimitiveSerializer::<u32>::native())),
        ] {
            group.bench_with_input(BenchmarkId::new(name, size), size, |b, &size| {
                b.iter_with_setup(
                    || (set_up_array(size), Vec::new()),
                    |(array, mut out)| {
                        serializer.serialize_indexable(&array, &mut out);
                        black_box(out);
                    },
                );
            });
        }
    }
    group.finish();
}

fn deserialize_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("deserialize_array");
    for size in ARRAY_SIZES.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let serializer = IndexableSerializer::<3, _>::new(PrimitiveSerializer::<u32>::big());
            b.iter_with_setup(
                || {
                    let mut bytes = Vec::new();
                    serializer.serialize_indexable(&set_up_array(size), &mut bytes);
                    bytes
                },
                |bytes| {
                    black_box(serializer.deserialize(&mut bytes.as_slice()).unwrap());
                },
            );
        });
    }
    group.finish();
}

fn tree_chunk_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_chunk_round_trip");
    for depth in [3u8, 4, 5].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, &depth| {
            let codec = TreeChunkCodec::<3, _>::new(PrimitiveSerializer::<u32>::little());
            b.iter_with_setup(
                || {
                    let tree = set_up_tree(depth);
                    let blank: IndexableTree3<u32> = IndexableTree::new(IndexN::ZERO, depth, 0).unwrap();
                    (tree, blank)
                },
                |(tree, mut blank)| {
                    let mut bytes = Vec::new();
                    codec.encode(&tree, &mut bytes);
                    codec.decode_into(&bytes, &mut blank).unwrap();
                    black_box(blank);
                },
            );
        });
    }
    group.finish();
}

criterion_group!(benches, serialize_array, deserialize_array, tree_chunk_round_trip);
criterion_main!(benches);

const ARRAY_SIZES: [i32; 3] = [16, 32, 64];

fn set_up_array(size: i32) -> Array3<u32> {
    let bounds = Bounds3::new(IndexN::fill(-size / 2), IndexN::fill(size));

    ArrayN::fill_with(bounds, |i| (i.x() % 3 + i.y() % 3 + i.z() % 3) as u32)
}

// Half solid, half empty, with a bumpy boundary so the tree only partly collapses.
fn set_up_tree(depth: u8) -> IndexableTree3<u32> {
    let mut tree = IndexableTree::new(IndexN::ZERO, depth, 0).unwrap();
    let bounds = tree.bounds();
    let half = 1 << (depth - 1);
    tree.write_with(&bounds, |i| (i.y() < half + (i.x() + i.z()) % 2) as u32);
    tree.merge_uniform();

    tree
}
