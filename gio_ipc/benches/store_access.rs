//! Cached read and shared write benchmarks

use criterion::{Criterion, criterion_group, criterion_main};
use gio_ipc::{Pid, Store, TrackerStore, tracker_schema};
use gio_common::config::StoreConfig;
use std::collections::HashSet;
use std::hint::black_box;

/// Benchmark reads that hit the cache and reads after a remote change
fn bench_reads(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(dir.path());
    let running: HashSet<Pid> = [100, 200].into();
    let local = TrackerStore::open(&config, 100, &running).unwrap();
    let remote = TrackerStore::open(&config, 200, &running).unwrap();
    local.set_session_id(Some("abc123")).unwrap();

    c.bench_function("get_cached_string", |b| {
        b.iter(|| {
            black_box(local.session_id());
        });
    });

    c.bench_function("get_after_remote_write", |b| {
        let mut now = 0i64;
        b.iter(|| {
            now += 1;
            remote.set_last_resume_time(now).unwrap();
            black_box(local.last_resume_time());
        });
    });
}

/// Benchmark writes in single- and multi-process mode
fn bench_writes(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let (layout, vars) = tracker_schema().unwrap();

    let shared = Store::open(&dir.path().join("shared.1"), layout.clone(), true, 100);
    shared
        .finalize_and_register(&HashSet::from([100]))
        .unwrap();
    let private = Store::single_process(layout, 100);

    c.bench_function("put_long_shared", |b| {
        b.iter(|| shared.put(vars.last_pause_time, black_box(42i64)).unwrap());
    });

    c.bench_function("put_long_single_process", |b| {
        b.iter(|| private.put(vars.last_pause_time, black_box(42i64)).unwrap());
    });

    let user = "u".repeat(256);
    c.bench_function("put_string_256_shared", |b| {
        b.iter(|| shared.put_string(vars.user_id, Some(black_box(user.as_str()))).unwrap());
    });

    c.bench_function("add_long_shared", |b| {
        b.iter(|| black_box(shared.add_long(vars.last_resume_time, 1).unwrap()));
    });
}

criterion_group!(benches, bench_reads, bench_writes);
criterion_main!(benches);
