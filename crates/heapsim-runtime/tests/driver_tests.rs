//! Driver scheduling tests
//!
//! Run on a paused clock: the runtime jumps straight to the next timer when
//! every task is idle, so these never wait in real time.

use heapsim::{GcMode, Phase, RandomPolicy, RegionKind, SimConfig, Simulation, Speed};
use heapsim_runtime::{DriverError, spawn, spawn_with_config};
use std::time::Duration;
use tokio::time::sleep;

fn seeded(seed: u64) -> Simulation {
    Simulation::with_policy(SimConfig::default(), RandomPolicy::seeded(seed)).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_stopped_driver_does_not_tick() {
    let (handle, _task) = spawn(seeded(1));

    sleep(Duration::from_secs(10)).await;
    assert_eq!(handle.snapshot().clock.ticks(), 0);
    assert!(!handle.snapshot().running);
}

#[tokio::test(start_paused = true)]
async fn test_manual_step_and_allocate() {
    let (handle, _task) = spawn(seeded(2));

    let snapshot = handle.step().await.unwrap();
    assert_eq!(snapshot.clock.ticks(), 1);
    assert!(snapshot.stats.allocations > 0);

    let before = snapshot.stats.allocations;
    let snapshot = handle.allocate().await.unwrap();
    assert!(snapshot.stats.allocations > before);
    assert_eq!(snapshot.phase, Phase::Idle);
    assert_eq!(handle.snapshot(), snapshot);
}

#[tokio::test(start_paused = true)]
async fn test_running_ticks_at_base_interval() {
    let (handle, _task) = spawn(seeded(3));

    let snapshot = handle.set_running(true).await.unwrap();
    assert!(snapshot.running);
    assert_eq!(snapshot.clock.ticks(), 0);

    sleep(Duration::from_millis(650)).await;
    assert_eq!(handle.snapshot().clock.ticks(), 1);

    sleep(Duration::from_millis(600)).await;
    assert_eq!(handle.snapshot().clock.ticks(), 2);
    assert_eq!(handle.stats().ticks.load(std::sync::atomic::Ordering::Relaxed), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_pending_tick() {
    let (handle, _task) = spawn(seeded(4));

    handle.set_running(true).await.unwrap();
    sleep(Duration::from_millis(650)).await;
    assert_eq!(handle.snapshot().clock.ticks(), 1);

    let snapshot = handle.set_running(false).await.unwrap();
    assert!(!snapshot.running);
    sleep(Duration::from_secs(5)).await;
    assert_eq!(handle.snapshot().clock.ticks(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_speed_divides_interval() {
    let (handle, _task) = spawn(seeded(5));

    handle.set_speed(Speed::Quadruple).await.unwrap();
    handle.set_running(true).await.unwrap();

    sleep(Duration::from_millis(620)).await;
    assert_eq!(handle.snapshot().clock.ticks(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_pause_delays_next_tick() {
    let mut sim = seeded(6);
    {
        let heap = sim.heap_mut();
        for i in 0..30 {
            heap[i] = heap[i].stamp(RegionKind::Eden, 70.0, 50.0, 0);
        }
    }
    let (handle, _task) = spawn(sim);
    handle.set_running(true).await.unwrap();

    // 600ms: Idle sees a full Eden and switches to MinorGc
    sleep(Duration::from_millis(650)).await;
    assert_eq!(handle.snapshot().phase, Phase::MinorGc);

    // 1200ms: the young collection runs and holds 1200ms of pause
    sleep(Duration::from_millis(600)).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.phase, Phase::Idle);
    assert_eq!(snapshot.stats.minor_collections, 1);
    assert_eq!(snapshot.stats.avg_pause_time, 1200.0);

    // Next tick waits base tick + pause: 1200 + 1800 = 3000ms
    sleep(Duration::from_millis(1650)).await;
    assert_eq!(handle.snapshot().clock.ticks(), 2);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(handle.snapshot().clock.ticks(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_manual_pause_holds_back_timer() {
    let mut sim = seeded(6);
    {
        let heap = sim.heap_mut();
        for i in 0..30 {
            heap[i] = heap[i].stamp(RegionKind::Eden, 70.0, 50.0, 0);
        }
    }
    let (handle, _task) = spawn(sim);
    handle.set_running(true).await.unwrap();

    assert_eq!(handle.step().await.unwrap().phase, Phase::MinorGc);
    let snapshot = handle.step().await.unwrap();
    assert_eq!(snapshot.stats.minor_collections, 1);
    assert_eq!(snapshot.clock.ticks(), 2);

    // The 1200ms pause plus the 600ms base tick must pass first
    sleep(Duration::from_millis(1700)).await;
    assert_eq!(handle.snapshot().clock.ticks(), 2);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(handle.snapshot().clock.ticks(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_sees_ticks() {
    let (handle, _task) = spawn(seeded(7));
    let mut updates = handle.subscribe();

    handle.set_running(true).await.unwrap();
    updates.changed().await.unwrap();
    updates.changed().await.unwrap();
    assert!(updates.borrow().clock.ticks() >= 1);
}

#[tokio::test(start_paused = true)]
async fn test_mode_switch_stops_and_resets() {
    let (handle, _task) = spawn(seeded(8));

    handle.set_running(true).await.unwrap();
    sleep(Duration::from_millis(3100)).await;
    assert!(handle.snapshot().stats.allocations > 0);

    let snapshot = handle.set_mode(GcMode::Concurrent).await.unwrap();
    assert_eq!(snapshot.mode, GcMode::Concurrent);
    assert!(!snapshot.running);
    assert!(snapshot.regions.iter().all(|r| r.kind == RegionKind::Free));
    assert!(snapshot.logs.is_empty());
    assert_eq!(snapshot.stats.allocations, 0);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(handle.snapshot().clock.ticks(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reset_through_handle() {
    let (handle, _task) = spawn(seeded(9));
    for _ in 0..10 {
        handle.step().await.unwrap();
    }

    let once = handle.reset().await.unwrap();
    let twice = handle.reset().await.unwrap();
    assert_eq!(once, twice);
    assert_eq!(once.phase, Phase::Idle);
    assert_eq!(once.clock.ticks(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_handle() {
    let (handle, task) = spawn(seeded(10));
    let other = handle.clone();

    handle.shutdown().await.unwrap();
    task.await.unwrap();

    assert!(!other.is_connected());
    assert!(matches!(other.step().await, Err(DriverError::Closed)));
}

#[tokio::test]
async fn test_invalid_config_is_reported() {
    let mut config = SimConfig::default();
    config.grid.tick = Duration::ZERO;
    assert!(matches!(spawn_with_config(config), Err(DriverError::Sim(_))));
}
