//! # Priority Queue Benchmark
//!
//! Measures the two access patterns the workspace depends on:
//! 1. Bulk enqueue then drain (chunk request queue)
//! 2. Interleaved push, pop and arbitrary removal (D*-Lite open set)

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wildgrove_core::PriorityQueue;

const ELEMENT_COUNT: usize = 10_000;

fn random_values(count: usize, seed: u64) -> Vec<u32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen_range(0..1_000_000)).collect()
}

fn bench_enqueue_drain(c: &mut Criterion) {
    let values = random_values(ELEMENT_COUNT, 7);

    c.bench_function("pq_enqueue_drain_10k", |b| {
        b.iter(|| {
            let mut queue = PriorityQueue::from_ord();
            for &value in &values {
                queue.enqueue(value);
            }
            let mut sum = 0u64;
            while let Ok(value) = queue.dequeue() {
                sum += u64::from(value);
            }
            black_box(sum)
        });
    });
}

fn bench_open_set_churn(c: &mut Criterion) {
    let values = random_values(ELEMENT_COUNT, 11);

    c.bench_function("pq_remove_arbitrary_1k", |b| {
        b.iter_batched(
            || {
                let mut queue = PriorityQueue::from_ord();
                for &value in &values {
                    queue.enqueue(value);
                }
                queue
            },
            |mut queue| {
                for value in values.iter().step_by(10) {
                    queue.remove(value);
                }
                black_box(queue.len())
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_enqueue_drain, bench_open_set_churn);
criterion_main!(benches);
