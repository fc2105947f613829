//! Orchestrator: owns both grid buffers, the worker pool and the barrier,
//! and drives the step loop.
//!
//! One `simulate()` call spawns a fixed pool of N workers, each bound to a
//! contiguous column range. Per step the controller wakes all workers,
//! waits for all of them to finish writing the work grid, flips the buffer
//! index, and periodically extracts the results matrix. Workers are
//! cooperatively cancelled through the shared run flag and joined before
//! `simulate()` returns.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, info};

use crate::barrier::{relock, StepBarrier};
use crate::cell::Cell;
use crate::config::LatticeConfig;
use crate::error::LatticeError;
use crate::grid::{Grid, ObstacleMask};
use crate::kernel::{ColumnWorker, KernelParams};
use crate::partition::column_ranges;
use crate::results;

/// Lifecycle of a [`Lattice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    Uninitialized,
    Initialized,
    Running,
    Stopping,
    Stopped,
}

/// Two-slot grid arena. The current slot is read-only for the duration of
/// one step; the other slot is the work buffer. Swapping is an atomic index
/// flip performed by the controller while every worker is parked between
/// `signal_done` and the next wake.
struct GridPair {
    slots: [std::cell::UnsafeCell<Grid>; 2],
    cells: [*mut Cell; 2],
    cols: usize,
    current: AtomicUsize,
}

// SAFETY: access is phased by the step barrier. During a step, workers read
// the current slot and write disjoint column sets of the work slot; between
// `wait_for_all` and the next `wake_all` only the controller touches either
// slot. The barrier's mutexes provide the happens-before edges.
unsafe impl Sync for GridPair {}

impl GridPair {
    fn new(current: Grid, work: Grid) -> Self {
        let cols = current.cols;
        let slots = [
            std::cell::UnsafeCell::new(current),
            std::cell::UnsafeCell::new(work),
        ];
        // Raw cell pointers are taken up front, while construction still
        // has exclusive ownership of both grids.
        let cells = [
            unsafe { (*slots[0].get()).cells.as_mut_ptr() },
            unsafe { (*slots[1].get()).cells.as_mut_ptr() },
        ];
        Self {
            slots,
            cells,
            cols,
            current: AtomicUsize::new(0),
        }
    }

    /// SAFETY: caller must be in a phase where the current slot is not
    /// being written (always true: only the work slot is ever written).
    unsafe fn current(&self) -> &Grid {
        &*self.slots[self.current.load(Ordering::Acquire)].get()
    }

    /// SAFETY: caller must own column `x` of the work slot for this step,
    /// or be the controller between steps.
    unsafe fn write_work(&self, x: usize, y: usize, cell: Cell) {
        let work = 1 - self.current.load(Ordering::Acquire);
        *self.cells[work].add(y * self.cols + x) = cell;
    }

    fn swap(&self) {
        self.current.fetch_xor(1, Ordering::AcqRel);
    }

    fn into_current(self) -> Grid {
        let index = self.current.load(Ordering::Acquire);
        let [a, b] = self.slots;
        if index == 0 {
            a.into_inner()
        } else {
            b.into_inner()
        }
    }
}

/// State shared between the controller and the worker pool for one run.
struct SharedRun {
    grids: GridPair,
    barrier: StepBarrier,
    running: Arc<AtomicBool>,
}

/// Cloneable read handle on the results matrix for an external consumer
/// (visualization, watchdog). Snapshots are taken under the results lock;
/// no reference survives past the critical section.
#[derive(Clone)]
pub struct ResultsHandle {
    rows: usize,
    cols: usize,
    inner: Arc<Mutex<Vec<f64>>>,
}

impl ResultsHandle {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Consistent copy of the most recent extraction (row-major).
    pub fn snapshot(&self) -> Vec<f64> {
        relock(&self.inner).clone()
    }
}

/// The simulation engine: obstacle-derived lattice, worker pool, results.
pub struct Lattice {
    config: LatticeConfig,
    state: SimulationState,
    rows: usize,
    cols: usize,
    grid: Option<Grid>,
    results: Arc<Mutex<Vec<f64>>>,
    running: Arc<AtomicBool>,
    steps_completed: u64,
}

impl Lattice {
    pub fn new(config: LatticeConfig) -> Self {
        Self {
            config,
            state: SimulationState::Uninitialized,
            rows: 0,
            cols: 0,
            grid: None,
            results: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicBool::new(true)),
            steps_completed: 0,
        }
    }

    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Steps completed by the most recent run.
    pub fn steps_completed(&self) -> u64 {
        self.steps_completed
    }

    /// Shared cancellation flag: clear it (store `false`) from any thread
    /// to request a graceful shutdown of a running simulation.
    pub fn run_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Read handle on the results matrix, valid across runs.
    pub fn results(&self) -> ResultsHandle {
        ResultsHandle {
            rows: self.rows,
            cols: self.cols,
            inner: Arc::clone(&self.results),
        }
    }

    /// Convenience copy of the results matrix.
    pub fn results_snapshot(&self) -> Vec<f64> {
        relock(&self.results).clone()
    }

    /// Total lattice density, available between runs.
    pub fn total_density(&self) -> Option<f64> {
        self.grid.as_ref().map(Grid::total_density)
    }

    /// Build the lattice from the obstacle mask and reset the results
    /// matrix. Must precede every `simulate()` run.
    pub fn init(&mut self, mask: &ObstacleMask) -> Result<(), LatticeError> {
        if mask.rows == 0 || mask.cols == 0 {
            return Err(LatticeError::EmptyObstacleMask);
        }
        self.config.validate(mask.cols)?;

        let grid = Grid::from_mask(mask, self.config.boundary_conditions);
        self.rows = grid.rows;
        self.cols = grid.cols;
        {
            let mut results = relock(&self.results);
            results.clear();
            results.resize(self.rows * self.cols, 0.0);
        }
        info!(
            "lattice initialized: {}x{} cells, boundary {:?}",
            self.rows, self.cols, self.config.boundary_conditions
        );
        self.grid = Some(grid);
        self.steps_completed = 0;
        self.state = SimulationState::Initialized;
        Ok(())
    }

    /// Run until the shared run flag is cleared externally.
    pub fn simulate(&mut self) -> Result<(), LatticeError> {
        self.run(None)
    }

    /// Run a bounded number of steps, then perform the normal shutdown
    /// protocol. Mostly useful for tests and batch runs.
    pub fn simulate_for(&mut self, steps: u64) -> Result<(), LatticeError> {
        self.run(Some(steps))
    }

    fn run(&mut self, limit: Option<u64>) -> Result<(), LatticeError> {
        if self.state != SimulationState::Initialized {
            return Err(LatticeError::NotInitialized);
        }
        self.config.validate(self.cols)?;

        let current = self.grid.take().expect("state Initialized implies a grid");
        let work = current.work_buffer();
        let shared = SharedRun {
            grids: GridPair::new(current, work),
            barrier: StepBarrier::new(self.config.num_threads),
            running: Arc::clone(&self.running),
        };
        shared.running.store(true, Ordering::Release);

        let ranges = column_ranges(self.cols, self.config.num_threads);
        let params = KernelParams::from_config(&self.config);
        let (rows, cols) = (self.rows, self.cols);
        info!(
            "simulation starting: {} workers over {} columns",
            ranges.len(),
            cols
        );
        self.state = SimulationState::Running;

        let mut failure = None;
        thread::scope(|scope| {
            let handles: Vec<_> = ranges
                .iter()
                .enumerate()
                .map(|(id, range)| {
                    let shared = &shared;
                    let range = range.clone();
                    scope.spawn(move || worker_loop(shared, id, range, rows, cols, params))
                })
                .collect();

            let mut step = 0u64;
            if limit == Some(0) {
                shared.running.store(false, Ordering::Release);
            }
            loop {
                shared.barrier.wake_all();
                if let Err(fault) = shared.barrier.wait_for_all() {
                    failure = Some(fault);
                    break;
                }
                if !shared.running.load(Ordering::Acquire) {
                    // Workers observed the cleared flag on this wake and
                    // have already exited their loops.
                    break;
                }

                shared.grids.swap();
                step += 1;
                self.steps_completed = step;

                if step > self.config.warmup_steps && step % self.config.refresh_steps == 0 {
                    // Controller-exclusive phase: workers are parked.
                    let grid = unsafe { shared.grids.current() };
                    let mut results = relock(&self.results);
                    results::extract(
                        grid,
                        self.config.boundary_conditions,
                        self.config.results_type,
                        results.as_mut_slice(),
                    );
                    debug!("results extracted at step {step}");
                }

                if limit.is_some_and(|max| step >= max) {
                    shared.running.store(false, Ordering::Release);
                }
            }

            self.state = SimulationState::Stopping;
            shared.running.store(false, Ordering::Release);
            // Belt: release any worker still parked (e.g. after a fault).
            shared.barrier.wake_all();
            for handle in handles {
                if handle.join().is_err() {
                    failure = Some(LatticeError::WorkerPanicked);
                }
            }
        });

        self.grid = Some(shared.grids.into_current());
        self.state = SimulationState::Stopped;
        info!("simulation stopped after {} steps", self.steps_completed);

        match failure {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}

/// Body of one worker thread: wait for a wake, check the run flag, advance
/// the owned column range by one step, signal completion.
fn worker_loop(
    shared: &SharedRun,
    id: usize,
    columns: std::ops::Range<usize>,
    rows: usize,
    cols: usize,
    params: KernelParams,
) {
    let _guard = shared.barrier.panic_guard();
    let mut kernel = ColumnWorker::new(columns, rows, cols, params);

    loop {
        shared.barrier.wait_for_work(id);
        if !shared.running.load(Ordering::Acquire) {
            shared.barrier.signal_done();
            break;
        }

        // SAFETY: the barrier guarantees the current slot is stable for the
        // whole step and this worker owns its disjoint columns of the work
        // slot (see GridPair).
        let current = unsafe { shared.grids.current() };
        kernel.step(current, |x, y, cell| unsafe {
            shared.grids.write_work(x, y, cell)
        });

        shared.barrier.signal_done();
    }
}
