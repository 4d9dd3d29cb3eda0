//! Microbenchmarks for function-set hot paths
//!
//! These benchmarks measure isolated operations a model checker hits when a
//! TLA+ model quantifies over `[D -> R]`:
//! - Cardinality (fixed-width and arbitrary precision)
//! - Membership without materialization
//! - Odometer enumeration and materialization
//! - Indexed sampling (fixed-width and BigInt indices)
//! - Fingerprinting of materialized spaces
//!
//! Run with: cargo bench -p tla-value --bench hot_path

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use num_bigint::BigInt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tla_value::{value_fingerprint, FuncSetValue, Value};

// ============================================================================
// Test Data Generators
// ============================================================================

/// Create a set of integers {0, 1, ..., n-1}
fn int_set(n: usize) -> Value {
    Value::set((0..n as i64).map(Value::SmallInt))
}

/// [0..d-1 -> 0..r-1]
fn int_space(d: usize, r: usize) -> FuncSetValue {
    FuncSetValue::new(int_set(d), int_set(r))
}

/// A member of `int_space(d, r)`: [i \in 0..d-1 |-> i % r]
fn member_of(d: usize, r: usize) -> Value {
    Value::func((0..d as i64).map(|i| (Value::SmallInt(i), Value::SmallInt(i % r as i64))))
        .expect("keys are distinct")
}

// ============================================================================
// Cardinality Benchmarks
// ============================================================================

fn bench_cardinality(c: &mut Criterion) {
    let mut group = c.benchmark_group("func_set/cardinality");

    group.bench_function("size_fixed", |b| {
        let fs = int_space(10, 4);
        b.iter(|| black_box(black_box(&fs).size()))
    });

    group.bench_function("size_overflow", |b| {
        let fs = int_space(64, 2);
        b.iter(|| black_box(black_box(&fs).size()))
    });

    group.bench_function("cardinality_big", |b| {
        let fs = int_space(200, 7);
        b.iter(|| black_box(black_box(&fs).cardinality()))
    });

    group.finish();
}

// ============================================================================
// Membership Benchmarks
// ============================================================================

fn bench_member(c: &mut Criterion) {
    let mut group = c.benchmark_group("func_set/member");

    for d in [4, 16, 64] {
        group.bench_with_input(BenchmarkId::new("hit", d), &d, |b, &d| {
            let fs = int_space(d, 3);
            let f = member_of(d, 3);
            b.iter(|| black_box(fs.member(black_box(&f))))
        });
    }

    group.bench_function("domain_miss", |b| {
        let fs = int_space(16, 3);
        let f = member_of(15, 3);
        b.iter(|| black_box(fs.member(black_box(&f))))
    });

    group.finish();
}

// ============================================================================
// Enumeration Benchmarks
// ============================================================================

fn bench_enumerate(c: &mut Criterion) {
    let mut group = c.benchmark_group("func_set/enumerate");

    for (d, r) in [(3, 3), (4, 4), (6, 3)] {
        let size = int_space(d, r).size().unwrap_or(0);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("odometer", format!("{d}x{r}")),
            &(d, r),
            |b, &(d, r)| {
                let fs = int_space(d, r);
                b.iter(|| black_box(fs.enumerator().map(|e| e.count())))
            },
        );
        group.bench_with_input(
            BenchmarkId::new("materialize_fresh", format!("{d}x{r}")),
            &(d, r),
            |b, &(d, r)| {
                b.iter(|| {
                    let fs = int_space(d, r);
                    black_box(fs.to_materialized_set().map(|s| s.len()))
                })
            },
        );
    }

    group.bench_function("materialize_cached", |b| {
        let fs = int_space(4, 4);
        let _ = fs.to_materialized_set();
        b.iter(|| black_box(fs.to_materialized_set().map(|s| s.len())))
    });

    group.finish();
}

// ============================================================================
// Sampling Benchmarks
// ============================================================================

fn bench_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("func_set/sample");

    group.bench_function("element_at_fixed", |b| {
        let sampler = int_space(8, 5).sampler().expect("enumerable");
        b.iter(|| black_box(sampler.element_at(black_box(123_456))))
    });

    group.bench_function("element_at_big", |b| {
        let sampler = int_space(64, 2).sampler().expect("enumerable");
        let idx = (BigInt::from(1) << 63) + 12345;
        b.iter(|| black_box(sampler.element_at_big(black_box(&idx))))
    });

    group.bench_function("random_subset_32", |b| {
        let sampler = int_space(40, 3).sampler().expect("enumerable");
        let mut rng = StdRng::seed_from_u64(42);
        b.iter(|| black_box(sampler.random_subset(32, &mut rng)))
    });

    group.finish();
}

// ============================================================================
// Fingerprint and Equality Benchmarks
// ============================================================================

fn bench_fingerprint_and_eq(c: &mut Criterion) {
    let mut group = c.benchmark_group("func_set/compare");

    group.bench_function("fingerprint_cached", |b| {
        let v = Value::func_set(int_set(4), int_set(4));
        let _ = value_fingerprint(&v);
        b.iter(|| black_box(value_fingerprint(black_box(&v))))
    });

    group.bench_function("fast_eq", |b| {
        let a = Value::func_set(int_set(20), int_set(5));
        let b2 = Value::func_set(int_set(20), int_set(5));
        b.iter(|| black_box(black_box(&a) == black_box(&b2)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_cardinality,
    bench_member,
    bench_enumerate,
    bench_sample,
    bench_fingerprint_and_eq,
);
criterion_main!(benches);
