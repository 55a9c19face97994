//! Transfer queue benchmarks.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use xferq_core::{
    Chunk, CommitOptions, Config, Dir, Progress, PurgeMode, SectionKind, Timeout, TransferQueue,
};

fn random_payload(size: usize) -> Bytes {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    Bytes::from((0..size).map(|_| rng.gen()).collect::<Vec<u8>>())
}

/// Benchmark submission throughput into a preallocated queue.
fn bench_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_submit");

    for count in [64usize, 1024].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let payload = random_payload(64);
            b.iter(|| {
                let queue = TransferQueue::new(Config::new().initial_capacity(count));
                for _ in 0..count {
                    queue
                        .submit_write(black_box(payload.clone()), Timeout::Never)
                        .unwrap();
                }
                black_box(queue.pending(Dir::Tx));
            });
        });
    }

    group.finish();
}

/// Benchmark the full submit, load, commit cycle at several payload sizes.
fn bench_transfer_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_transfer_cycle");

    for size in [64usize, 1024, 16_384].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let queue = TransferQueue::new(Config::default());
            let payload = random_payload(size);

            b.iter(|| {
                queue
                    .submit_write(black_box(payload.clone()), Timeout::Never)
                    .unwrap();
                let Some(Chunk::Write { data, .. }) = queue.load_next(Dir::Tx) else {
                    unreachable!("just submitted");
                };
                queue
                    .commit(Progress::Sent(data.len()), CommitOptions::new())
                    .unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark fragmented commits against a single large transfer.
fn bench_fragmented_commits(c: &mut Criterion) {
    c.bench_function("queue_fragmented_commits_64x256", |b| {
        let queue = TransferQueue::new(Config::default());
        let payload = random_payload(64 * 256);

        b.iter(|| {
            queue
                .submit_write(payload.clone(), Timeout::Never)
                .unwrap();
            while let Some(Chunk::Write { data, .. }) = queue.load_next(Dir::Tx) {
                let chunk = data.len().min(256);
                queue
                    .commit(Progress::Sent(black_box(chunk)), CommitOptions::new())
                    .unwrap();
            }
        });
    });
}

/// Benchmark purging a populated queue. `Expired` walks every transfer
/// without removing any; `All` removes everything.
fn bench_purge(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_purge");

    for (name, mode) in [("scan", PurgeMode::Expired), ("drain", PurgeMode::All)] {
        group.bench_with_input(BenchmarkId::new(name, 1024), &mode, |b, &mode| {
            let payload = random_payload(16);
            b.iter_batched(
                || {
                    let queue = TransferQueue::new(Config::new().initial_capacity(1024));
                    for _ in 0..1024 {
                        queue.submit_write(payload.clone(), Timeout::Never).unwrap();
                    }
                    queue
                },
                |queue| {
                    black_box(queue.purge(Dir::Tx, mode));
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Compare the two critical-section strategies on the uncontended path.
fn bench_section_kinds(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_section_kind");

    for (name, kind) in [("task", SectionKind::Task), ("interrupt", SectionKind::Interrupt)] {
        group.bench_function(name, |b| {
            let queue = TransferQueue::new(Config::new().section(kind));
            let payload = random_payload(64);

            b.iter(|| {
                queue
                    .submit_write(payload.clone(), Timeout::Never)
                    .unwrap();
                queue.load_next(Dir::Tx);
                queue
                    .commit(Progress::Sent(64), CommitOptions::new())
                    .unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_submit,
    bench_transfer_cycle,
    bench_fragmented_commits,
    bench_purge,
    bench_section_kinds
);
criterion_main!(benches);
