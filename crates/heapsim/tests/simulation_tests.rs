//! Simulation behaviour tests
//!
//! These drive the public `Simulation` API tick by tick with seeded or
//! scripted policies and check the grid invariants along the way.

use heapsim::{
    Command, GcMode, LogLevel, MAX_LOG_ENTRIES, Phase, Policy, RandomPolicy, RegionKind,
    SimConfig, Simulation, SimulationStats, TOTAL_REGIONS,
};

fn seeded(seed: u64) -> Simulation {
    Simulation::with_policy(SimConfig::default(), RandomPolicy::seeded(seed)).unwrap()
}

/// Check the per-region invariants on the current grid
fn assert_grid_invariants(sim: &Simulation) {
    let heap = sim.heap();
    assert_eq!(heap.len(), TOTAL_REGIONS);
    for (i, region) in heap.iter().enumerate() {
        assert_eq!(region.id, i);
        assert!((0.0..=100.0).contains(&region.used_percentage));
        assert!((0.0..=100.0).contains(&region.liveness_percentage));
        if region.kind == RegionKind::Free {
            assert_eq!(region.used_percentage, 0.0);
            assert_eq!(region.liveness_percentage, 0.0);
            assert_eq!(region.age, 0);
            assert!(!region.is_targeted);
        }
    }
}

fn counters(stats: &SimulationStats) -> (u64, u64, u64) {
    (
        stats.allocations,
        stats.minor_collections,
        stats.major_collections,
    )
}

#[test]
fn test_generational_run_keeps_invariants() {
    let mut sim = seeded(0xC0FFEE);
    let mut last = counters(sim.stats());

    for _ in 0..1500 {
        let report = sim.tick();
        assert_grid_invariants(&sim);
        assert!(report.phase.belongs_to(GcMode::Generational));
        // Generational steps always clear the working set they highlight
        assert_eq!(sim.heap().targeted_count(), 0);
        assert!(sim.log().len() <= MAX_LOG_ENTRIES);

        let now = counters(sim.stats());
        assert!(now.0 >= last.0 && now.1 >= last.1 && now.2 >= last.2);
        last = now;
    }

    assert!(sim.stats().minor_collections > 0);
    assert_eq!(sim.log().len(), MAX_LOG_ENTRIES);
}

#[test]
fn test_concurrent_run_keeps_invariants() {
    let mut sim = seeded(42);
    sim.set_mode(GcMode::Concurrent);
    let mut last = counters(sim.stats());

    for _ in 0..1500 {
        let report = sim.tick();
        assert_grid_invariants(&sim);
        assert!(report.phase.belongs_to(GcMode::Concurrent));
        assert_eq!(sim.heap().count(RegionKind::Eden), 0);
        assert!(sim.log().len() <= MAX_LOG_ENTRIES);

        let now = counters(sim.stats());
        assert!(now.0 >= last.0 && now.1 >= last.1 && now.2 >= last.2);
        last = now;
    }

    assert_eq!(sim.stats().minor_collections, 0);
    assert!(sim.stats().major_collections > 0);
}

#[test]
fn test_young_gc_triggers_exactly_at_eden_limit() {
    let mut sim = seeded(2024);
    let limit = sim.config().generational.max_eden_regions;

    let mut triggered = false;
    for _ in 0..100 {
        let eden_before = sim.heap().count(RegionKind::Eden);
        let report = sim.tick();
        if eden_before >= limit {
            assert_eq!(report.phase, Phase::MinorGc);
            triggered = true;
            break;
        }
        assert_eq!(report.phase, Phase::Idle);
    }

    assert!(triggered);
    assert_eq!(sim.stats().minor_collections, 0);
    assert_eq!(
        sim.log().latest().map(|e| e.level),
        Some(LogLevel::Warn)
    );

    sim.tick();
    assert_eq!(sim.stats().minor_collections, 1);
    assert_eq!(sim.heap().count(RegionKind::Eden), 0);
}

#[test]
fn test_heap_full_recovery() {
    let mut sim = seeded(8);
    {
        let heap = sim.heap_mut();
        for i in 0..TOTAL_REGIONS {
            heap[i] = heap[i].stamp(RegionKind::Humongous, 100.0, 100.0, 0);
        }
    }

    let report = sim.apply(Command::Allocate).unwrap();
    assert_eq!(report.phase, Phase::Idle);
    assert_eq!(sim.heap().free_indices().len(), TOTAL_REGIONS);
    let latest = sim.log().latest().unwrap();
    assert_eq!(latest.level, LogLevel::Error);
}

#[test]
fn test_evacuation_failure_path() {
    let mut sim = seeded(9);
    {
        let heap = sim.heap_mut();
        for i in 0..TOTAL_REGIONS {
            let kind = if i < 30 {
                RegionKind::Eden
            } else {
                RegionKind::Old
            };
            heap[i] = heap[i].stamp(kind, 99.0, 79.0, 0);
        }
    }

    assert_eq!(sim.tick().phase, Phase::MinorGc);
    let report = sim.tick();

    assert_eq!(report.phase, Phase::Idle);
    assert_eq!(sim.log().latest().map(|e| e.level), Some(LogLevel::Error));
    let retained = sim.config().generational.young_failure_retained_old;
    assert_eq!(sim.heap().free_indices().len(), TOTAL_REGIONS - retained);
    assert_eq!(sim.stats().minor_collections, 0);
    assert_grid_invariants(&sim);
}

/// Marks every page on the first mark tick and never allocates concurrently
struct FastMarking(RandomPolicy);

impl Policy for FastMarking {
    fn unit(&mut self) -> f64 {
        self.0.unit()
    }

    fn page_mark_progress(&mut self, _chance: f64) -> bool {
        true
    }

    fn page_mark_decay(&mut self) -> f64 {
        20.0
    }

    fn concurrent_allocation(&mut self, _chance: f64) -> bool {
        false
    }
}

#[test]
fn test_concurrent_cycle_completes_once() {
    let mut sim =
        Simulation::with_policy(SimConfig::default(), FastMarking(RandomPolicy::seeded(5)))
            .unwrap();
    sim.set_mode(GcMode::Concurrent);
    {
        let heap = sim.heap_mut();
        for i in 0..60 {
            heap[i] = heap[i].stamp(RegionKind::ActivePage, 80.0, 60.0, 0);
        }
    }

    let mut seen = Vec::new();
    for _ in 0..200 {
        let report = sim.tick();
        if seen.last() != Some(&report.phase) {
            seen.push(report.phase);
        }
        if report.phase == Phase::Idle {
            break;
        }
    }

    assert_eq!(
        seen,
        vec![
            Phase::MarkStart,
            Phase::ConcurrentMark,
            Phase::MarkEnd,
            Phase::ConcurrentRelocate,
            Phase::Idle,
        ]
    );
    assert_eq!(sim.stats().major_collections, 1);
    assert_eq!(sim.stats().minor_collections, 0);
    assert_eq!(sim.heap().count(RegionKind::RelocatingPage), 0);
    assert_eq!(sim.stats().pause_count, 2);
    assert_eq!(sim.stats().avg_pause_time, 200.0);
}

#[test]
fn test_reset_is_idempotent() {
    let mut sim = seeded(11);
    for _ in 0..80 {
        sim.tick();
    }
    sim.set_running(true);

    sim.reset();
    let once = sim.snapshot();
    sim.reset();
    let twice = sim.snapshot();

    assert_eq!(once, twice);
    assert!(once.regions.iter().all(|r| r.kind == RegionKind::Free));
    assert_eq!(once.stats, SimulationStats::default());
    assert!(once.logs.is_empty());
    assert_eq!(once.phase, Phase::Idle);
    assert!(!once.running);
}

#[test]
fn test_mode_switch_resets_state() {
    let mut sim = seeded(12);
    sim.set_running(true);
    for _ in 0..60 {
        sim.tick();
    }
    assert!(sim.stats().allocations > 0);

    sim.apply(Command::SetMode(GcMode::Concurrent));
    let snapshot = sim.snapshot();

    assert_eq!(snapshot.mode, GcMode::Concurrent);
    assert_eq!(snapshot.regions.len(), TOTAL_REGIONS);
    assert!(snapshot.regions.iter().all(|r| r.kind == RegionKind::Free));
    assert_eq!(snapshot.stats, SimulationStats::default());
    assert!(snapshot.logs.is_empty());
    assert_eq!(snapshot.phase, Phase::Idle);
    assert!(!snapshot.running);
    assert_eq!(snapshot.clock.ticks(), 0);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let mut a = seeded(77);
    let mut b = seeded(77);
    for _ in 0..300 {
        assert_eq!(a.tick(), b.tick());
    }
    assert_eq!(a.heap(), b.heap());
    assert_eq!(a.stats(), b.stats());
}
