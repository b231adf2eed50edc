//! Benchmarks for observer-core
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use observer_core::{RawState, Runtime, TrackedContainer, Value};

// =============================================================================
// OBSERVABLE BENCHMARKS
// =============================================================================

fn bench_wrap_existing(c: &mut Criterion) {
    let runtime = Runtime::new();
    let state = RawState::record();
    let _keep = runtime.wrap(&state);
    c.bench_function("wrap_existing", |b| {
        b.iter(|| black_box(runtime.wrap(&state)))
    });
}

fn bench_untracked_get(c: &mut Criterion) {
    let runtime = Runtime::new();
    let w = runtime.wrap(&RawState::record_from([("x", 1)]));
    c.bench_function("untracked_get", |b| {
        b.iter(|| black_box(w.get_property(black_box("x"))))
    });
}

fn bench_set_same_value(c: &mut Criterion) {
    let runtime = Runtime::new();
    let w = runtime.wrap(&RawState::record_from([("x", 1)]));
    c.bench_function("set_same_value", |b| {
        b.iter(|| w.set_property("x", black_box(1)))
    });
}

// =============================================================================
// REACTION BENCHMARKS
// =============================================================================

fn bench_observe_create(c: &mut Criterion) {
    let runtime = Runtime::new();
    let w = runtime.wrap(&RawState::record_from([("x", 1)]));
    c.bench_function("observe_create", |b| {
        b.iter(|| {
            let w = w.clone();
            let reaction = runtime.observe(move || Ok(w.get_property("x"))).unwrap();
            runtime.unobserve(&reaction).unwrap();
        })
    });
}

fn bench_trigger_rerun(c: &mut Criterion) {
    let runtime = Runtime::new();
    let w = runtime.wrap(&RawState::record_from([("x", 0)]));
    let w_clone = w.clone();
    let _reaction = runtime
        .observe(move || Ok(w_clone.get_property("x")))
        .unwrap();

    let mut i = 0;
    c.bench_function("trigger_rerun", |b| {
        b.iter(|| {
            i += 1;
            w.set_property("x", black_box(i)).unwrap();
        })
    });
}

// =============================================================================
// STRESS BENCHMARKS
// =============================================================================

fn bench_many_reactions(c: &mut Criterion) {
    let mut group = c.benchmark_group("many_reactions");
    for count in [10, 100, 1000] {
        let runtime = Runtime::new();
        let w = runtime.wrap(&RawState::record_from([("x", 0)]));
        let reactions: Vec<_> = (0..count)
            .map(|_| {
                let w = w.clone();
                runtime.observe(move || Ok(w.get_property("x"))).unwrap()
            })
            .collect();

        let mut i = 0;
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                i += 1;
                w.set_property("x", black_box(i)).unwrap();
            })
        });
        drop(reactions);
    }
    group.finish();
}

fn bench_set_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_iteration");
    for size in [10u32, 100, 1000] {
        let runtime = Runtime::new();
        let set = runtime
            .wrap(&RawState::set_from(0..size))
            .as_set()
            .unwrap();
        let s = set.clone();
        let _reaction = runtime
            .observe(move || {
                Ok(s.iter().filter_map(|v: Value| v.as_number()).sum::<f64>())
            })
            .unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                set.add(black_box(size)).unwrap();
                set.remove(&Value::from(size)).unwrap();
            })
        });
    }
    group.finish();
}

criterion_group!(
    observable_benches,
    bench_wrap_existing,
    bench_untracked_get,
    bench_set_same_value,
);

criterion_group!(reaction_benches, bench_observe_create, bench_trigger_rerun);

criterion_group!(stress_benches, bench_many_reactions, bench_set_iteration);

criterion_main!(observable_benches, reaction_benches, stress_benches);
