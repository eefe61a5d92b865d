//! Fixed-size worker pool over a bounded queue.

use std::thread;

use crossbeam_channel::{bounded, unbounded};

/// Runs a closure over a stream of items on exactly `N` threads.
///
/// Items are pushed through a bounded queue, so no more than `N` items are
/// being processed at once and no more than `N` wait in the queue. Each
/// item is handed to exactly one worker. [`WorkerPool::run`] returns only
/// after every item has been processed and every worker has exited.
#[derive(Clone, Copy, Debug)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// A pool of `workers` threads; zero is treated as one.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process every item and collect the results in completion order.
    pub fn run<I, T, R, F>(&self, items: I, work: F) -> Vec<R>
    where
        I: IntoIterator<Item = T>,
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        let (job_tx, job_rx) = bounded::<T>(self.workers);
        let (result_tx, result_rx) = unbounded::<R>();
        let work = &work;

        thread::scope(|scope| {
            for _ in 0..self.workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for item in job_rx {
                        // The receiver outlives the scope; send cannot fail.
                        let _ = result_tx.send(work(item));
                    }
                });
            }
            drop(job_rx);
            drop(result_tx);

            for item in items {
                if job_tx.send(item).is_err() {
                    break;
                }
            }
            drop(job_tx);
        });

        result_rx.into_iter().collect()
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_WORKERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn every_item_processed_exactly_once() {
        let pool = WorkerPool::new(4);
        let mut out = pool.run(0..1000u32, |i| i * 2);
        out.sort_unstable();
        assert_eq!(out, (0..1000u32).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn never_exceeds_worker_count() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let pool = WorkerPool::new(3);

        pool.run(0..24, |_| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });

        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak {peak} exceeded pool size");
        assert!(peak >= 2, "workers never overlapped");
    }

    #[test]
    fn single_worker_is_serial() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let threads = std::sync::Mutex::new(HashSet::new());

        WorkerPool::new(1).run(0..10, |_| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            threads.lock().unwrap().insert(thread::current().id());
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(threads.lock().unwrap().len(), 1);
    }

    #[test]
    fn zero_workers_means_one() {
        assert_eq!(WorkerPool::new(0).workers(), 1);
        assert_eq!(WorkerPool::new(0).run(vec!["a", "b"], str::len), vec![1, 1]);
    }

    #[test]
    fn empty_input_returns_immediately() {
        let out: Vec<u8> = WorkerPool::new(8).run(Vec::<u8>::new(), |b| b);
        assert!(out.is_empty());
    }

    #[test]
    fn borrowed_items_are_accepted() {
        let names = vec!["x".to_string(), "yy".to_string()];
        let mut lens = WorkerPool::new(2).run(names.iter(), |s| s.len());
        lens.sort_unstable();
        assert_eq!(lens, vec![1, 2]);
    }
}
