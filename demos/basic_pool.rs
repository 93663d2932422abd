//! Basic worker pool example

use qpool::prelude::*;
use std::time::Duration;

fn main() {
    let config = Config::from_env().expect("invalid QPOOL_* settings");
    let mut pool = ThreadPool::new(&config).expect("Failed to start pool");

    println!("=== Basic Worker Pool Example ===\n");
    println!("Workers: {}", pool.num_threads());

    let greeting = pool.submit(|| String::from("abc")).unwrap();
    let sum = pool.submit_with(|(a, b): (i32, i32)| a + b, (2, 3)).unwrap();
    let broken = pool.submit(|| -> i32 { panic!("test") }).unwrap();

    println!("greeting: {:?}", greeting.get());
    println!("sum: {:?}", sum.get());
    match broken.get() {
        Ok(v) => println!("broken unexpectedly returned {}", v),
        Err(e) => println!("broken failed as expected: {}", e),
    }

    let squares: Vec<_> = (0..10u64)
        .map(|i| {
            pool.submit(move || {
                std::thread::sleep(Duration::from_millis(5));
                i * i
            })
            .unwrap()
        })
        .collect();
    let squares: Vec<u64> = squares.into_iter().filter_map(|h| h.join().ok()).collect();
    println!("squares: {:?}", squares);

    pool.shutdown();
    println!("\nstats: {:?}", pool.stats());

    if let Err(e) = pool.submit(|| ()) {
        println!("after shutdown: {}", e);
    }

    println!("\n=== Example Complete ===");
}
