//! Bounded worker pool for independent models
//!
//! Each job runs start to finish on one worker; jobs never share files or
//! accumulators, so no coordination beyond handing out indices is needed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

/// Run `work(0..count)` on at most `jobs` threads, returning results in index order
pub fn run_bounded<T, F>(count: usize, jobs: usize, work: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    let workers = jobs.max(1).min(count);
    if workers <= 1 {
        return (0..count).map(&work).collect();
    }

    let next = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<T>>> = Mutex::new((0..count).map(|_| None).collect());

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                if index >= count {
                    break;
                }
                let result = work(index);
                let mut guard = slots.lock().unwrap_or_else(|e| e.into_inner());
                guard[index] = Some(result);
            });
        }
    });

    slots
        .into_inner()
        .unwrap_or_else(|e| e.into_inner())
        .into_iter()
        .flatten()
        .collect()
}
