//! Integration tests for whole dinners: scenario, progress, snapshots and
//! the degenerate one-seat table.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use symposium::table::{EventBus, Fork, TableEvent};
use symposium::{AcquisitionOrder, AgentOutcome, Simulation, SimulationConfig, TimingConfig};

fn seeded(agents: usize, duration_ms: u64, seed: u64) -> SimulationConfig {
    SimulationConfig {
        agents,
        duration_ms,
        seed: Some(seed),
        ..SimulationConfig::default()
    }
}

#[test]
fn test_five_philosophers_one_second() {
    let simulation = Simulation::new(SimulationConfig::scenario()).unwrap();
    let forks = simulation.forks();

    let report = simulation.run().unwrap();

    assert_eq!(report.agents.len(), 5);
    assert_eq!(report.order, AcquisitionOrder::ReverseLast);
    assert!(report.total_eating_ms() > 0);
    assert!(report.faulted().next().is_none());
    assert!(forks.iter().all(Fork::is_free));

    let text = report.to_string();
    assert!(text.starts_with("=== Eating time per philosopher ==="));
    assert!(text.trim_end().ends_with("=== Dinner finished ==="));
    for agent in 0..5 {
        assert!(text.contains(&format!("Philosopher {agent}: ")));
    }
    print!("{report}");
}

#[test]
fn test_everyone_eats_eventually() {
    let report = Simulation::new(seeded(5, 2_000, 11)).unwrap().run().unwrap();

    for row in &report.agents {
        assert!(row.stats.eating_ms > 0, "philosopher {} starved", row.agent);
        assert!(row.stats.meals > 0);
    }
    assert!(report.everyone_ate());
}

#[test]
fn test_run_finishes_within_deadline() {
    let config = SimulationConfig {
        timing: TimingConfig::stress(),
        ..seeded(5, 1_000, 5)
    };
    let limit = config.duration() + config.shutdown_deadline();
    let simulation = Simulation::new(config).unwrap();
    let forks = simulation.forks();

    let start = Instant::now();
    let report = simulation.run().unwrap();
    let elapsed = start.elapsed();

    println!(
        "elapsed {elapsed:?}, shutdown latency {:?}, timeouts {}",
        report.shutdown_latency,
        report.total_timeouts()
    );
    assert!(elapsed < limit);
    assert!(report.total_eating_ms() > 0);
    assert!(forks.iter().all(Fork::is_free));
}

#[test]
fn test_snapshots_never_go_backwards() {
    let simulation = Simulation::new(seeded(5, 600, 23)).unwrap();
    let register = simulation.register();
    let runner = thread::spawn(move || simulation.run());

    let mut previous = register.snapshot();
    let mut samples = 0;
    while !runner.is_finished() {
        thread::sleep(Duration::from_millis(5));
        let current = register.snapshot();
        assert_eq!(current.len(), 5);
        for (agent, stats) in current.iter() {
            let before = previous.get(agent).unwrap();
            assert!(stats.eating_ms >= before.eating_ms);
            assert!(stats.meals >= before.meals);
            assert!(stats.timeouts() >= before.timeouts());
        }
        previous = current;
        samples += 1;
    }

    let report = runner.join().unwrap().unwrap();
    assert!(samples > 10);
    for row in &report.agents {
        assert!(row.stats.eating_ms >= previous.eating_ms(row.agent));
    }
}

#[test]
fn test_stress_with_reversed_seat() {
    // Fixed seeds keep the interleavings comparable across runs.
    for seed in [1, 2, 3] {
        let config = SimulationConfig {
            timing: TimingConfig::stress(),
            ..seeded(8, 300, seed)
        };
        let simulation = Simulation::new(config).unwrap();
        let forks = simulation.forks();
        let report = simulation.run().unwrap();

        assert!(report.agents.iter().all(|row| row.outcome == AgentOutcome::Completed));
        assert!(report.total_eating_ms() > 0);
        assert!(forks.iter().all(Fork::is_free));
        println!("seed {seed}: reversed seat, {} timeouts", report.total_timeouts());
    }
}

#[test]
fn test_uniform_order_still_terminates() {
    let config = SimulationConfig {
        timing: TimingConfig::stress(),
        acquisition_order: AcquisitionOrder::Uniform,
        ..seeded(8, 300, 1)
    };
    let simulation = Simulation::new(config).unwrap();
    let forks = simulation.forks();
    let report = simulation.run().unwrap();

    // Timeouts break the wait cycle; the count is informational.
    println!("uniform order: {} timeouts", report.total_timeouts());
    assert_eq!(report.order, AcquisitionOrder::Uniform);
    assert!(forks.iter().all(Fork::is_free));
}

#[test]
fn test_single_philosopher_eats_alone() {
    let simulation = Simulation::new(seeded(1, 300, 9)).unwrap();
    let forks = simulation.forks();
    assert_eq!(forks.len(), 1);

    let report = simulation.run().unwrap();

    assert_eq!(report.agents.len(), 1);
    let row = &report.agents[0];
    assert_eq!(row.outcome, AgentOutcome::Completed);
    assert!(row.stats.eating_ms > 0);
    assert_eq!(row.stats.timeouts(), 0);
    assert!(forks[0].is_free());
}

#[test]
fn test_events_match_register() {
    let bus = EventBus::new(1_000_000);
    let simulation = Simulation::new(seeded(5, 300, 17))
        .unwrap()
        .with_events(bus.sender());

    let report = simulation.run().unwrap();
    assert_eq!(bus.dropped(), 0);

    let mut meals = vec![0u64; 5];
    let mut eaten_ms = vec![0u64; 5];
    let mut left = Vec::new();
    for event in bus.receiver().drain() {
        match event {
            TableEvent::Ate { agent, duration_ms } => {
                meals[agent] += 1;
                eaten_ms[agent] += duration_ms;
            }
            TableEvent::Left { agent } => left.push(agent),
            TableEvent::PrimaryTimeout { .. } | TableEvent::SecondaryTimeout { .. } => {}
        }
    }

    left.sort_unstable();
    assert_eq!(left, vec![0, 1, 2, 3, 4]);
    for row in &report.agents {
        assert_eq!(meals[row.agent], row.stats.meals);
        assert_eq!(eaten_ms[row.agent], row.stats.eating_ms);
    }
}

#[test]
fn test_shared_register_handle_outlives_run() {
    let simulation = Simulation::new(seeded(3, 200, 4)).unwrap();
    let register = simulation.register();
    let report = simulation.run().unwrap();

    assert_eq!(Arc::strong_count(&register), 1);
    let snapshot = register.snapshot();
    for row in &report.agents {
        assert_eq!(snapshot.get(row.agent), Some(&row.stats));
    }
}
