//! Deadline wrapper for potentially unbounded operations.
//!
//! Codec work on hostile input can stall inside the decoder for an
//! arbitrarily long time. Running the operation on a worker thread and
//! waiting with `recv_timeout` turns a stall into a `Timeout` error the
//! batch orchestrator can isolate like any other per-item failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use log::warn;

use crate::error::{Error, Result};

/// Run `task` on a worker thread, waiting at most `timeout` for its result.
///
/// On timeout the worker is signalled to discard its result; the thread
/// itself runs to completion in the background since decode loops cannot be
/// interrupted mid-flight.
pub fn run_with_timeout<T, F>(operation: &str, timeout: Duration, task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let abandoned = Arc::new(AtomicBool::new(false));
    let abandoned_worker = abandoned.clone();
    let (tx, rx) = mpsc::channel();

    let handle = thread::Builder::new()
        .name(format!("{}-worker", operation))
        .spawn(move || {
            let result = task();
            // Nobody is listening once the deadline has passed
            if !abandoned_worker.load(Ordering::SeqCst) {
                let _ = tx.send(result);
            }
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            let _ = handle.join();
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            abandoned.store(true, Ordering::SeqCst);
            warn!("{} exceeded its {:?} deadline", operation, timeout);
            Err(Error::Timeout(format!(
                "{} exceeded its {:?} deadline",
                operation, timeout
            )))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(Error::Unknown(format!(
            "{} worker terminated without a result",
            operation
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_task_returns_its_result() {
        let value =
            run_with_timeout("fast", Duration::from_secs(5), || Ok(21 * 2)).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn task_errors_propagate_within_the_deadline() {
        let result: Result<u32> = run_with_timeout("failing", Duration::from_secs(5), || {
            Err(Error::CorruptImage("truncated stream".to_string()))
        });
        assert!(matches!(result, Err(Error::CorruptImage(_))));
    }

    #[test]
    fn slow_task_times_out() {
        let result: Result<u32> =
            run_with_timeout("slow", Duration::from_millis(25), || {
                thread::sleep(Duration::from_millis(500));
                Ok(1)
            });
        assert!(matches!(result, Err(Error::Timeout(_))));
    }
}
