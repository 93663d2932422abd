//! Stress tests for the worker pool

use parking_lot::Mutex;
use qpool::prelude::*;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
#[ignore] // Run with --ignored flag
fn stress_test_many_small_tasks() {
    let mut pool = ThreadPool::with_default_threads().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..100_000 {
        let counter = counter.clone();
        pool.execute(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();
    }

    pool.shutdown();
    assert_eq!(counter.load(Ordering::Relaxed), 100_000);

    let stats = pool.stats();
    assert_eq!(stats.submitted, 100_000);
    assert_eq!(stats.completed, 100_000);
}

#[test]
#[ignore]
fn stress_test_concurrent_submitters() {
    let pool = Arc::new(ThreadPool::with_threads(4).unwrap());

    let submitters: Vec<_> = (0..8u64)
        .map(|s| {
            let pool = pool.clone();
            thread::spawn(move || {
                let handles: Vec<_> = (0..1_000u64)
                    .map(|i| pool.submit(move || s * 1_000 + i).unwrap())
                    .collect();
                handles
                    .into_iter()
                    .enumerate()
                    .all(|(i, h)| h.join().unwrap() == s * 1_000 + i as u64)
            })
        })
        .collect();

    for submitter in submitters {
        assert!(submitter.join().unwrap());
    }
}

#[test]
#[ignore]
fn stress_test_high_contention() {
    let pool = ThreadPool::with_threads(8).unwrap();
    let data = Arc::new(Mutex::new(vec![0i32; 100]));

    let handles: Vec<_> = (0..1000)
        .map(|_| {
            let data = data.clone();
            pool.submit(move || {
                let mut guard = data.lock();
                for item in guard.iter_mut() {
                    *item += 1;
                }
            })
            .unwrap()
        })
        .collect();

    for handle in handles {
        handle.wait();
    }

    let guard = data.lock();
    assert!(guard.iter().all(|&x| x == 1000));
}

#[test]
#[ignore]
fn stress_test_panic_recovery() {
    let mut pool = ThreadPool::new(
        &Config::builder()
            .num_threads(4)
            .panic_strategy(PanicStrategy::Isolate)
            .build()
            .unwrap(),
    )
    .unwrap();

    // Mix of panicking and non-panicking tasks
    let handles: Vec<_> = (0..1000)
        .map(|i| {
            pool.submit(move || {
                if i % 10 == 0 {
                    panic!("Intentional panic");
                }
                i
            })
            .unwrap()
        })
        .collect();

    let failures = handles
        .into_iter()
        .filter(|h| h.get().is_err())
        .count();
    assert_eq!(failures, 100);

    // pool should still work after panics
    assert_eq!(pool.submit(|| 4950).unwrap().join().unwrap(), 4950);

    pool.shutdown();
    assert_eq!(pool.stats().panicked, 100);
}

#[test]
#[ignore]
fn stress_test_shutdown_with_jittered_backlog() {
    for round in 0..10 {
        let mut pool = ThreadPool::with_threads(4).unwrap();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..200 {
            let done = done.clone();
            let micros = rand::thread_rng().gen_range(0..500);
            pool.execute(move || {
                thread::sleep(Duration::from_micros(micros));
                done.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        // shutdown right away; the backlog must still be drained
        pool.shutdown();
        assert_eq!(done.load(Ordering::SeqCst), 200, "round {}", round);
    }
}

#[test]
#[ignore]
fn stress_test_repeated_create_drop() {
    for iteration in 0..200 {
        let pool = ThreadPool::with_threads(2).unwrap();
        let handle = pool.submit(move || iteration * 2).unwrap();
        assert_eq!(handle.join().unwrap(), iteration * 2, "iteration {}", iteration);
    }
}
