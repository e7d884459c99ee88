//! Fixed-size reusable worker pool with a submit/wait barrier.
//!
//! The pool is a one-shot broadcast: [`WorkerPool::submit`] installs one
//! batch of jobs, pinning job `i` to worker `i`, and wakes the workers;
//! [`WorkerPool::wait`] blocks until every woken worker has finished and
//! clears the batch. Only one submission may be in flight at a time —
//! there is no queue and no stealing. Completion order across workers is
//! unspecified; `wait` is the barrier that orders every worker's writes
//! before the submitter's next read.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;

/// One unit of work, executed exactly once by its pinned worker.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

struct State {
    /// Installed batch; worker `i` takes slot `i`. Cleared by `wait`.
    jobs: Vec<Option<Job>>,
    /// Bumped per submission so idle workers can tell a new batch from
    /// the one they already served.
    generation: u64,
    /// Woken workers that have not yet finished their job.
    active: usize,
    shutdown: bool,
}

struct Shared {
    state: Mutex<State>,
    work_ready: Condvar,
    work_done: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("worker pool lock poisoned")
    }
}

/// Fixed set of worker threads, reusable across submissions.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .finish()
    }
}

impl WorkerPool {
    /// Spawn a pool of `threads` workers blocking on the work signal.
    ///
    /// # Panics
    /// Panics when `threads` is zero or a worker thread cannot be spawned.
    #[must_use]
    pub fn new(threads: usize) -> Self {
        assert!(threads > 0, "worker pool needs at least one thread");

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                jobs: Vec::new(),
                generation: 0,
                active: 0,
                shutdown: false,
            }),
            work_ready: Condvar::new(),
            work_done: Condvar::new(),
        });

        let workers = (0..threads)
            .map(|index| {
                let shared = Arc::clone(&shared);
                std::thread::Builder::new()
                    .name(format!("ergfile-worker-{index}"))
                    .spawn(move || worker_loop(&shared, index))
                    .expect("failed to spawn pool worker")
            })
            .collect();

        WorkerPool { shared, workers }
    }

    /// Number of worker threads.
    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Install `jobs` and wake one worker per job.
    ///
    /// Pair every `submit` with a [`WorkerPool::wait`] before the next
    /// submission or before reading anything the jobs wrote.
    ///
    /// # Panics
    /// Panics when a submission is already in flight or when more jobs are
    /// passed than the pool has workers.
    pub fn submit(&self, jobs: Vec<Job>) {
        let mut state = self.shared.lock();
        assert!(state.active == 0, "a submission is already in flight");
        assert!(
            jobs.len() <= self.workers.len(),
            "{} jobs submitted to a pool of {} workers",
            jobs.len(),
            self.workers.len()
        );

        state.active = jobs.len();
        state.jobs = jobs.into_iter().map(Some).collect();
        state.generation += 1;
        drop(state);
        self.shared.work_ready.notify_all();
    }

    /// Block until every job of the in-flight submission has finished.
    pub fn wait(&self) {
        let mut state = self.shared.lock();
        while state.active > 0 {
            state = self
                .shared
                .work_done
                .wait(state)
                .expect("worker pool lock poisoned");
        }
        state.jobs.clear();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        {
            let mut state = self.shared.lock();
            state.shutdown = true;
        }
        self.shared.work_ready.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: &Shared, index: usize) {
    let mut seen_generation = 0;
    loop {
        let job = {
            let mut state = shared.lock();
            loop {
                if state.shutdown {
                    return;
                }
                if state.generation != seen_generation {
                    seen_generation = state.generation;
                    break;
                }
                state = shared
                    .work_ready
                    .wait(state)
                    .expect("worker pool lock poisoned");
            }
            state.jobs.get_mut(index).and_then(Option::take)
        };

        // Workers past the batch length were woken for nothing and are not
        // counted in `active`.
        if let Some(job) = job {
            job();
            let mut state = shared.lock();
            state.active -= 1;
            if state.active == 0 {
                shared.work_done.notify_all();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_each_job_runs_exactly_once() {
        let pool = WorkerPool::new(4);
        let counters: Vec<_> = (0..4).map(|_| Arc::new(AtomicUsize::new(0))).collect();

        let jobs: Vec<Job> = counters
            .iter()
            .map(|counter| {
                let counter = Arc::clone(counter);
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }) as Job
            })
            .collect();

        pool.submit(jobs);
        pool.wait();

        for counter in &counters {
            assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_pool_is_reusable() {
        let pool = WorkerPool::new(2);
        let total = Arc::new(AtomicUsize::new(0));

        for _ in 0..50 {
            let jobs: Vec<Job> = (0..2)
                .map(|_| {
                    let total = Arc::clone(&total);
                    Box::new(move || {
                        total.fetch_add(1, Ordering::SeqCst);
                    }) as Job
                })
                .collect();
            pool.submit(jobs);
            pool.wait();
        }

        assert_eq!(total.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_fewer_jobs_than_workers() {
        let pool = WorkerPool::new(8);
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_in_job = Arc::clone(&hits);
        pool.submit(vec![Box::new(move || {
            hits_in_job.fetch_add(1, Ordering::SeqCst);
        })]);
        pool.wait();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wait_is_a_barrier_for_disjoint_writes() {
        let pool = WorkerPool::new(2);
        let buffer = Arc::new((0..1000u32).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>());

        let jobs: Vec<Job> = [(0usize, 500usize), (500, 1000)]
            .into_iter()
            .map(|(start, end)| {
                let buffer = Arc::clone(&buffer);
                Box::new(move || {
                    for slot in &buffer[start..end] {
                        slot.store(7, Ordering::Relaxed);
                    }
                }) as Job
            })
            .collect();

        pool.submit(jobs);
        pool.wait();

        assert!(buffer.iter().all(|slot| slot.load(Ordering::Relaxed) == 7));
    }

    #[test]
    fn test_empty_submission_completes() {
        let pool = WorkerPool::new(2);
        pool.submit(Vec::new());
        pool.wait();
    }

    #[test]
    fn test_drop_joins_idle_pool() {
        let pool = WorkerPool::new(3);
        drop(pool);
    }
}
