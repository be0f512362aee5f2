//! Entry store benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nettable_bench::utils::{generate_keys, random_value};
use nettable_codec::Value;
use nettable_core::{EntryFlags, EntryStore};
use nettable_sync_protocol::SequenceNumber;

fn populated_store(count: usize) -> EntryStore {
    let store = EntryStore::new();
    for key in generate_keys(count) {
        store.put(&key, random_value(), true).unwrap();
    }
    store
}

/// Benchmark local writes.
fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");

    group.bench_function("update_existing", |b| {
        let store = EntryStore::new();
        store.put("/speed", Value::Double(0.0), false).unwrap();
        let mut x = 0.0;
        b.iter(|| {
            x += 1.0;
            black_box(store.put("/speed", Value::Double(x), false).unwrap())
        });
    });

    group.bench_function("insert_new", |b| {
        let keys = generate_keys(10_000);
        b.iter(|| {
            let store = EntryStore::new();
            for key in &keys {
                store.put(key, Value::Boolean(true), false).unwrap();
            }
            black_box(store.len())
        });
    });

    group.finish();
}

/// Benchmark remote application, as on the receive path.
fn bench_remote(c: &mut Criterion) {
    let mut group = c.benchmark_group("remote");

    group.bench_function("apply_update", |b| {
        let store = EntryStore::new();
        store
            .apply_remote_assign("/x", Value::Double(0.0), EntryFlags::NONE, SequenceNumber::new(0))
            .into_changes();
        let mut seq = SequenceNumber::new(0);
        b.iter(|| {
            seq = seq.next();
            black_box(store.apply_remote_update("/x", seq, Value::Double(f64::from(seq.value()))))
        });
    });

    group.finish();
}

/// Benchmark prefix listing.
fn bench_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("list");

    for count in &[100usize, 1000, 10_000] {
        let store = populated_store(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("all", count), &store, |b, store| {
            b.iter(|| black_box(store.list("").count()));
        });
        group.bench_with_input(BenchmarkId::new("subtable", count), &store, |b, store| {
            b.iter(|| black_box(store.list("/table3").count()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_put, bench_remote, bench_list);

criterion_main!(benches);
