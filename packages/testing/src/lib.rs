#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for tests, benchmarks and examples in this workspace.

use std::sync::{Barrier, mpsc};
use std::thread;
use std::time::Duration;

/// How long a test may run before [`with_watchdog`] gives up on it.
fn watchdog_timeout() -> Duration {
    // Thread synchronization under Miri is orders of magnitude slower.
    if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    }
}

/// Runs a test on a separate thread and fails it if it does not finish in time.
///
/// Pool tests that go wrong tend to deadlock rather than fail, which would hang the test run.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the test runs directly on
/// the calling thread with no timeout, so that mutation testing can detect hanging mutants.
///
/// # Panics
///
/// Panics if the test exceeds the timeout. Panics from the test itself are propagated.
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// let answer = with_watchdog(|| 6 * 7);
/// assert_eq!(answer, 42);
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let (tx, rx) = mpsc::channel();

    let test_thread = thread::spawn(move || {
        // If this fails, the receiver has already timed out.
        drop(tx.send(test_fn()));
    });

    let timeout = watchdog_timeout();

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            test_thread.join().expect("test thread already produced a result");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test exceeded the {timeout:?} watchdog timeout");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_thread.join() {
            Ok(()) => panic!("test thread disconnected without a result"),
            Err(payload) => std::panic::resume_unwind(payload),
        },
    }
}

/// Runs `worker` on `thread_count` threads at once and waits for all of them to finish.
///
/// Every worker receives its own index. The workers are released together by a barrier, to
/// maximize the overlap between them.
///
/// # Panics
///
/// Propagates the panic of the first worker (by index) that panicked.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use testing::run_concurrently;
///
/// let total = AtomicUsize::new(0);
///
/// run_concurrently(4, |index| {
///     total.fetch_add(index, Ordering::Relaxed);
/// });
///
/// assert_eq!(total.load(Ordering::Relaxed), 6);
/// ```
pub fn run_concurrently<F>(thread_count: usize, worker: F)
where
    F: Fn(usize) + Sync,
{
    let barrier = Barrier::new(thread_count);

    thread::scope(|scope| {
        let handles = (0..thread_count)
            .map(|index| {
                let barrier = &barrier;
                let worker = &worker;

                scope.spawn(move || {
                    barrier.wait();
                    worker(index);
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            if let Err(payload) = handle.join() {
                std::panic::resume_unwind(payload);
            }
        }
    });
}
