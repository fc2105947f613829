//! Concurrency tests: determinism, cooperative shutdown, lifecycle.

use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use lbm::{
    BoundaryConditions, EdgeCondition, Lattice, LatticeConfig, LatticeError, ObstacleMask,
    ResultsType, SimulationState,
};

fn channel_config(num_threads: usize) -> LatticeConfig {
    LatticeConfig {
        boundary_conditions: BoundaryConditions::BounceBack,
        inlet: Some(EdgeCondition::Velocity(0.05)),
        outlet: Some(EdgeCondition::Density(1.0)),
        use_accel_x: false,
        num_threads,
        warmup_steps: 0,
        refresh_steps: 1,
        results_type: ResultsType::Speed,
        ..Default::default()
    }
}

fn obstacle_mask() -> ObstacleMask {
    let mut mask = ObstacleMask::open(10, 12);
    mask.block(5, 4);
    mask.block(5, 5);
    mask
}

#[test]
fn identical_runs_are_deterministic() {
    let run = |threads: usize| {
        let mut lattice = Lattice::new(channel_config(threads));
        lattice.init(&obstacle_mask()).unwrap();
        lattice.simulate_for(40).unwrap();
        lattice.results_snapshot()
    };

    let first = run(3);
    let second = run(3);
    assert_eq!(first, second, "same config and thread count must be bit-identical");
}

#[test]
fn thread_count_does_not_change_results() {
    let run = |threads: usize| {
        let mut lattice = Lattice::new(channel_config(threads));
        lattice.init(&obstacle_mask()).unwrap();
        lattice.simulate_for(30).unwrap();
        lattice.results_snapshot()
    };

    let serial = run(1);
    let parallel = run(4);
    for (a, b) in serial.iter().zip(&parallel) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn external_flag_stops_a_running_simulation() {
    let mut lattice = Lattice::new(channel_config(4));
    lattice.init(&obstacle_mask()).unwrap();
    let flag = lattice.run_flag();

    let (tx, rx) = mpsc::channel();
    let driver = thread::spawn(move || {
        let outcome = lattice.simulate();
        let steps = lattice.steps_completed();
        tx.send((outcome, steps, lattice.state())).unwrap();
    });

    // Let it run briefly, then request shutdown from this thread.
    thread::sleep(Duration::from_millis(50));
    flag.store(false, Ordering::Release);

    let (outcome, steps, state) = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("simulation did not shut down after the flag was cleared");
    driver.join().unwrap();

    outcome.unwrap();
    assert!(steps > 0, "simulation should have advanced before the stop");
    assert_eq!(state, SimulationState::Stopped);
}

#[test]
fn results_handle_reads_while_running() {
    let mut lattice = Lattice::new(channel_config(2));
    lattice.init(&obstacle_mask()).unwrap();
    let flag = lattice.run_flag();
    let results = lattice.results();

    let driver = thread::spawn(move || {
        lattice.simulate().unwrap();
    });

    // Concurrent snapshots must always observe a consistent matrix of the
    // right shape, whatever extraction they interleave with.
    for _ in 0..20 {
        let snapshot = results.snapshot();
        assert_eq!(snapshot.len(), results.rows() * results.cols());
        assert!(snapshot.iter().all(|v| v.is_finite()));
        thread::sleep(Duration::from_millis(2));
    }

    flag.store(false, Ordering::Release);
    driver.join().unwrap();
}

#[test]
fn simulate_requires_init() {
    let mut lattice = Lattice::new(channel_config(2));
    assert_eq!(lattice.simulate_for(1), Err(LatticeError::NotInitialized));
}

#[test]
fn reinit_permits_another_run() {
    let mut lattice = Lattice::new(channel_config(2));
    lattice.init(&obstacle_mask()).unwrap();
    lattice.simulate_for(5).unwrap();
    assert_eq!(lattice.state(), SimulationState::Stopped);

    // A finished run must not be restartable without init.
    assert_eq!(lattice.simulate_for(1), Err(LatticeError::NotInitialized));

    lattice.init(&obstacle_mask()).unwrap();
    lattice.simulate_for(5).unwrap();
    assert_eq!(lattice.steps_completed(), 5);
}

#[test]
fn misconfiguration_is_rejected_before_spawning() {
    let mut lattice = Lattice::new(LatticeConfig {
        num_threads: 0,
        ..channel_config(1)
    });
    assert_eq!(
        lattice.init(&obstacle_mask()),
        Err(LatticeError::InvalidThreadCount)
    );

    let mut lattice = Lattice::new(LatticeConfig {
        num_threads: 64,
        ..channel_config(1)
    });
    assert_eq!(
        lattice.init(&obstacle_mask()),
        Err(LatticeError::TooManyThreads {
            threads: 64,
            cols: 12
        })
    );

    let mut lattice = Lattice::new(channel_config(2));
    assert_eq!(
        lattice.init(&ObstacleMask::open(0, 0)),
        Err(LatticeError::EmptyObstacleMask)
    );
}

#[test]
fn zero_step_run_stops_cleanly() {
    let mut lattice = Lattice::new(channel_config(2));
    lattice.init(&obstacle_mask()).unwrap();
    lattice.simulate_for(0).unwrap();
    assert_eq!(lattice.steps_completed(), 0);
    assert_eq!(lattice.state(), SimulationState::Stopped);
}
