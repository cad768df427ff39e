use blocking_queue_rs::{BlockingQueue, CancelToken, DequeueError};
use std::thread;
use std::sync::Arc;
use std::time::Instant;

fn main() {
    tracing_subscriber::fmt().init();

    println!("BlockingQueue Rust Example");
    println!("--------------------------\n");

    // Configuration
    const PRODUCERS: usize = 2; // Number of producer threads
    const CONSUMERS: usize = 3; // Number of consumer threads
    const N: u32 = 1_000_000; // Each producer enqueues this many elements
    const CAPACITY: usize = 1024; // Queue capacity

    // Create a queue object shared between all producers and consumers
    let queue = Arc::new(BlockingQueue::<u32>::new(CAPACITY));
    let token = CancelToken::new();

    println!("Starting {} producers and {} consumers", PRODUCERS, CONSUMERS);
    println!("Each producer will enqueue {} elements", N);
    println!("Queue capacity: {}\n", CAPACITY);

    let start_time = Instant::now();

    // Start the consumers; they run until the token is cancelled
    let mut consumer_threads = Vec::with_capacity(CONSUMERS);
    for _ in 0..CONSUMERS {
        let q = queue.clone();
        let token = token.clone();
        consumer_threads.push(thread::spawn(move || {
            let mut local_sum = 0u64;
            loop {
                match q.dequeue_with(&token) {
                    Ok(n) => local_sum += n as u64,
                    Err(DequeueError::Cancelled) => return local_sum,
                    Err(err) => panic!("consumer failed: {err}"),
                }
            }
        }));
    }

    // Start the producers
    let mut producer_threads = Vec::with_capacity(PRODUCERS);
    for _ in 0..PRODUCERS {
        let q = queue.clone();
        producer_threads.push(thread::spawn(move || {
            // Enqueue elements in descending order [N, 1]
            for n in (1..=N).rev() {
                q.enqueue(n).unwrap();
            }
        }));
    }

    // Wait for all producers to finish
    for handle in producer_threads {
        handle.join().unwrap();
    }

    // Consumers keep draining while the queue holds values, so wait for it to
    // empty before telling them to stop
    while !queue.is_empty() {
        thread::yield_now();
    }
    token.cancel();

    let sums: Vec<u64> = consumer_threads.into_iter().map(|h| h.join().unwrap()).collect();
    let total_sum: u64 = sums.iter().sum();

    // The expected sum is N*(N+1)/2 * PRODUCERS
    let expected_sum: u64 = (N as u64 * (N as u64 + 1) / 2) * PRODUCERS as u64;

    println!("Execution time: {:?}", start_time.elapsed());
    println!("Total sum: {}", total_sum);
    println!("Expected sum: {}", expected_sum);

    // Verify the result
    if total_sum != expected_sum {
        println!("ERROR: Sum mismatch! Difference: {}", total_sum as i64 - expected_sum as i64);
    } else {
        println!("SUCCESS: All elements were correctly processed.");
    }

    // Show per-consumer stats
    println!("\nPer-consumer statistics:");
    for (i, &sum) in sums.iter().enumerate() {
        println!("Consumer {}: sum = {}", i, sum);
        if sum == 0 {
            println!("WARNING: Consumer {} received no elements!", i);
        }
    }
}
