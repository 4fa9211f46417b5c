//! Basic benchmarks for the `typed_pool` package.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::thread;
use std::time::{Duration, Instant};

use criterion::{Criterion, criterion_group, criterion_main};
use typed_pool::{Pool, RawPool};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

const CONTENDING_THREADS: u32 = 4;

#[allow(dead_code, reason = "Fields only give the object a realistic shape")]
struct PooledObject {
    a: String,
    b: Vec<u8>,
    c: bool,
}

fn new_pooled_object() -> PooledObject {
    PooledObject {
        a: "world".to_string(),
        b: b"hello".to_vec(),
        c: true,
    }
}

fn release_pooled_object(object: &mut PooledObject) {
    object.a.clear();
    object.b.clear();
    object.c = false;
}

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("tp_get_put");

    group.bench_function("raw", |b| {
        let pool = RawPool::new(new_pooled_object);

        b.iter(|| {
            let object = black_box(pool.get());
            pool.put_opaque(object);
        });
    });

    group.bench_function("typed", |b| {
        let pool = Pool::new(new_pooled_object);

        b.iter(|| {
            let object = black_box(pool.get());
            pool.put(object);
        });
    });

    group.bench_function("typed_releaser", |b| {
        let pool = Pool::with_releaser(new_pooled_object, release_pooled_object);

        b.iter(|| {
            let object = black_box(pool.get());
            pool.put(object);
        });
    });

    group.bench_function("construct_only", |b| {
        b.iter(|| drop(black_box(new_pooled_object())));
    });

    group.finish();

    let mut group = c.benchmark_group("tp_contended");

    group.bench_function("typed_releaser", |b| {
        let pool = Pool::with_releaser(new_pooled_object, release_pooled_object);

        b.iter_custom(|iters| {
            thread::scope(|scope| {
                let handles = (0..CONTENDING_THREADS)
                    .map(|_| {
                        scope.spawn(|| {
                            let start = Instant::now();

                            for _ in 0..iters {
                                let object = black_box(pool.get());
                                pool.put(object);
                            }

                            start.elapsed()
                        })
                    })
                    .collect::<Vec<_>>();

                handles
                    .into_iter()
                    .map(|handle| handle.join().unwrap())
                    .sum::<Duration>()
                    / CONTENDING_THREADS
            })
        });
    });

    group.finish();
}
