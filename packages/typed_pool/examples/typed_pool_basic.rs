//! Demonstrates reusing string buffers through a `Pool` shared by several threads.

use std::fmt::Write;
use std::sync::Arc;
use std::thread;

use typed_pool::Pool;

fn main() {
    println!("=== Typed Pool Basic Example ===");

    // Buffers are cleared by the releaser before anyone else can see their contents.
    let pool = Arc::new(Pool::with_releaser(
        || String::with_capacity(256),
        String::clear,
    ));

    let workers = (0..4)
        .map(|worker| {
            let pool = Arc::clone(&pool);

            thread::spawn(move || {
                for line in 0..3 {
                    let mut buffer = pool.get();
                    assert!(buffer.is_empty());

                    write!(buffer, "worker {worker} line {line}")
                        .expect("writing to a String cannot fail");
                    println!("{buffer} (capacity {})", buffer.capacity());

                    pool.put(buffer);
                }
            })
        })
        .collect::<Vec<_>>();

    for worker in workers {
        worker.join().expect("worker thread panicked");
    }

    // Two sweeps without reuse let the pool drop its idle buffers.
    pool.sweep();
    pool.sweep();

    println!("Pool after sweeping: {pool:?}");
    println!("Example completed successfully!");
}
