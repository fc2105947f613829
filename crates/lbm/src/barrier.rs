//! Two-phase step barrier for the worker pool.
//!
//! One controller and N workers rendezvous once per simulation step:
//!
//! 1. Wake phase: the controller sets every worker's wake flag and
//!    broadcasts. Each worker consumes its own flag exactly once, so a flag
//!    set before the worker reached `wait_for_work` is not lost and a single
//!    wake cannot be processed twice.
//! 2. Completion phase: each worker signals once after finishing its writes
//!    for the step; the controller blocks until all N signals arrived, then
//!    resets the counter for the next cycle.
//!
//! The barrier is reusable across an unbounded number of cycles. A worker
//! that panics mid-step poisons the barrier through [`PanicGuard`] so the
//! controller's `wait_for_all` reports the fault instead of hanging.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::error::LatticeError;

/// Lock that survives mutex poisoning; the barrier tracks worker panics
/// itself via the `poisoned` flag.
pub(crate) fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct DoneState {
    completed: usize,
    poisoned: bool,
}

pub struct StepBarrier {
    workers: usize,
    wake: Mutex<Vec<bool>>,
    wake_cv: Condvar,
    done: Mutex<DoneState>,
    done_cv: Condvar,
}

impl StepBarrier {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            wake: Mutex::new(vec![false; workers]),
            wake_cv: Condvar::new(),
            done: Mutex::new(DoneState {
                completed: 0,
                poisoned: false,
            }),
            done_cv: Condvar::new(),
        }
    }

    /// Controller: release every worker for one step.
    pub fn wake_all(&self) {
        {
            let mut wake = relock(&self.wake);
            wake.iter_mut().for_each(|flag| *flag = true);
        }
        self.wake_cv.notify_all();
    }

    /// Worker: block until this worker's wake flag is set, then clear it.
    pub fn wait_for_work(&self, worker: usize) {
        let mut wake = relock(&self.wake);
        while !wake[worker] {
            wake = self
                .wake_cv
                .wait(wake)
                .unwrap_or_else(PoisonError::into_inner);
        }
        wake[worker] = false;
    }

    /// Worker: report this step's writes as finished. Called exactly once
    /// per step per worker.
    pub fn signal_done(&self) {
        {
            let mut done = relock(&self.done);
            done.completed += 1;
        }
        self.done_cv.notify_one();
    }

    /// Controller: block until all workers signalled, then reset the
    /// counter. Returns an error if a worker panicked instead of signalling.
    pub fn wait_for_all(&self) -> Result<(), LatticeError> {
        let mut done = relock(&self.done);
        while done.completed < self.workers && !done.poisoned {
            done = self
                .done_cv
                .wait(done)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if done.poisoned {
            return Err(LatticeError::WorkerPanicked);
        }
        done.completed = 0;
        Ok(())
    }

    fn poison(&self) {
        {
            let mut done = relock(&self.done);
            done.poisoned = true;
        }
        self.done_cv.notify_all();
    }

    /// Guard held by each worker for the lifetime of its loop; if the
    /// worker unwinds, the barrier is poisoned so the controller wakes up.
    pub fn panic_guard(&self) -> PanicGuard<'_> {
        PanicGuard { barrier: self }
    }
}

pub struct PanicGuard<'a> {
    barrier: &'a StepBarrier,
}

impl Drop for PanicGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.barrier.poison();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn all_workers_run_once_per_cycle() {
        const WORKERS: usize = 4;
        const CYCLES: usize = 50;

        let barrier = StepBarrier::new(WORKERS);
        let runs: Vec<AtomicUsize> = (0..WORKERS).map(|_| AtomicUsize::new(0)).collect();

        thread::scope(|s| {
            for worker in 0..WORKERS {
                let barrier = &barrier;
                let runs = &runs;
                s.spawn(move || {
                    for _ in 0..CYCLES {
                        barrier.wait_for_work(worker);
                        runs[worker].fetch_add(1, Ordering::SeqCst);
                        barrier.signal_done();
                    }
                });
            }

            for cycle in 0..CYCLES {
                barrier.wake_all();
                barrier.wait_for_all().unwrap();
                // Full rendezvous: every worker ran exactly once more.
                for counter in &runs {
                    assert_eq!(counter.load(Ordering::SeqCst), cycle + 1);
                }
            }
        });
    }

    #[test]
    fn wake_before_wait_is_not_lost() {
        let barrier = StepBarrier::new(1);
        barrier.wake_all();
        thread::scope(|s| {
            s.spawn(|| {
                barrier.wait_for_work(0);
                barrier.signal_done();
            });
            barrier.wait_for_all().unwrap();
        });
    }

    #[test]
    fn worker_panic_poisons_instead_of_hanging() {
        let barrier = StepBarrier::new(1);
        thread::scope(|s| {
            let handle = s.spawn(|| {
                let _guard = barrier.panic_guard();
                barrier.wait_for_work(0);
                panic!("worker died mid-step");
            });
            barrier.wake_all();
            assert_eq!(barrier.wait_for_all(), Err(LatticeError::WorkerPanicked));
            assert!(handle.join().is_err());
        });
    }
}
