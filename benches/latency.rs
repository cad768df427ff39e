use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use blocking_queue_rs::BlockingQueue;
use std::sync::Arc;
use std::thread;

// Number of ping-pong round trips per benchmark
const PING_PONGS: usize = 10_000;

fn ping_pong(capacity: usize) {
    let q1 = Arc::new(BlockingQueue::<u32>::new(capacity));
    let q2 = Arc::new(BlockingQueue::<u32>::new(capacity));

    // Ping thread
    let q1_ping = q1.clone();
    let q2_ping = q2.clone();
    let ping_thread = thread::spawn(move || {
        for i in 0..PING_PONGS {
            q1_ping.enqueue(black_box(i as u32)).unwrap();
            black_box(q2_ping.dequeue().unwrap());
        }
    });

    // Pong thread
    let pong_thread = thread::spawn(move || {
        for _ in 0..PING_PONGS {
            let val = q1.dequeue().unwrap();
            q2.enqueue(black_box(val)).unwrap();
        }
    });

    ping_thread.join().unwrap();
    pong_thread.join().unwrap();
}

fn bench_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("latency");
    group.sample_size(20);

    // Every round trip parks and wakes a thread on each side
    for capacity in [1, 1024] {
        group.bench_function(
            BenchmarkId::new(format!("BlockingQueue/cap={capacity}"), "ping-pong"),
            |b| b.iter(|| ping_pong(capacity)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_latency);
criterion_main!(benches);
