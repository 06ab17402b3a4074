//! Row access benchmarks for Tessera.
//!
//! Benchmarks for:
//! - Field reads and writes across storage forms
//! - Reads through view chains
//! - Materialization and overlay merge

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tessera_bench::utils::{random_fields, random_row};
use tessera_common::TupleConfig;
use tessera_tuple::{
    DescriptorRegistry, DifferentialTuple, OwnedTuple, SegmentTransform, SharedTuple, Tuple,
    TupleExt, Value,
};

fn registry(max_width: usize) -> DescriptorRegistry {
    let config = TupleConfig::builder().max_specialized_width(max_width).build();
    DescriptorRegistry::new(config).expect("valid config")
}

/// Benchmark reading every field of a row, per storage form.
fn bench_field_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("tuple/read_all");
    let mut rng = StdRng::seed_from_u64(42);
    let fields = random_fields(&mut rng, 24);

    let forms = [("packed", 32, true), ("split", 8, true), ("generic", 32, false)];
    for (name, width, drain) in forms {
        let registry = registry(width);
        let descriptor = registry.create(&fields);
        if drain {
            registry.shutdown();
        }
        let row = random_row(&mut rng, &descriptor).expect("row");

        group.throughput(Throughput::Elements(fields.len() as u64));
        group.bench_function(BenchmarkId::new("form", name), |b| {
            b.iter(|| {
                for i in 0..row.count() {
                    black_box(row.get_value(i).expect("read"));
                }
            });
        });
    }

    group.finish();
}

/// Benchmark writing scalar fields.
fn bench_field_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("tuple/write");
    let registry = registry(32);
    let descriptor = registry.create(&[tessera_common::FieldType::BIGINT; 16]);
    registry.drain();
    let mut row = OwnedTuple::new(descriptor);

    group.bench_function("bigint_x16", |b| {
        b.iter(|| {
            for i in 0..16 {
                row.set_value(i, Value::BigInt(black_box(i as i64))).expect("write");
            }
        });
    });

    group.finish();
}

/// Benchmark reads through nested segment views.
fn bench_view_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("tuple/view_depth");
    let registry = registry(32);
    let mut rng = StdRng::seed_from_u64(42);
    let descriptor = registry.create(&random_fields(&mut rng, 8));
    registry.drain();
    let row = random_row(&mut rng, &descriptor).expect("row");
    let identity = SegmentTransform::new(&registry, &descriptor, 0, 8).expect("segment");

    let v1 = identity.wrap(&row).expect("wrap");
    let v2 = identity.wrap(&v1).expect("wrap");
    let v3 = identity.wrap(&v2).expect("wrap");

    group.bench_function(BenchmarkId::new("depth", 0), |b| {
        b.iter(|| black_box(row.get_value(black_box(5)).expect("read")))
    });
    group.bench_function(BenchmarkId::new("depth", 1), |b| {
        b.iter(|| black_box(v1.get_value(black_box(5)).expect("read")))
    });
    group.bench_function(BenchmarkId::new("depth", 3), |b| {
        b.iter(|| black_box(v3.get_value(black_box(5)).expect("read")))
    });
    group.bench_function("materialize_depth_3", |b| {
        b.iter(|| black_box(v3.materialize().expect("materialize")))
    });

    group.finish();
}

/// Benchmark overlay writes and merges.
fn bench_overlay(c: &mut Criterion) {
    let mut group = c.benchmark_group("tuple/overlay");
    let registry = registry(32);
    let mut rng = StdRng::seed_from_u64(42);
    let descriptor = registry.create(&[tessera_common::FieldType::INT; 32]);
    registry.drain();
    let origin = SharedTuple::new(random_row(&mut rng, &descriptor).expect("row"));

    group.bench_function("write_4_merge", |b| {
        b.iter(|| {
            let mut overlay = DifferentialTuple::new(origin.clone());
            for i in [1, 7, 13, 29] {
                overlay.set(i, i as i32).expect("write");
            }
            black_box(overlay.merge().expect("merge"))
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_field_reads,
    bench_field_writes,
    bench_view_depth,
    bench_overlay,
);
criterion_main!(benches);
