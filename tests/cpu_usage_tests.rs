// CPU usage calculator tests: aggregate, per-core and per-process

mod common;

use common::{raw, ticks};
use sysmon::cpu_usage::{ProcessCpuTracker, clamp_percent, derive_cpu_stats, usage_percent};
use sysmon::models::CpuTicks;

#[test]
fn test_usage_percent_from_deltas() {
    // 100 elapsed ticks, 75 of them idle.
    let usage = usage_percent(&ticks(100, 300), &ticks(125, 375));
    assert!((usage - 25.0).abs() < 1e-9);
}

#[test]
fn test_usage_percent_identical_readings_is_zero() {
    let t = ticks(500, 500);
    assert_eq!(usage_percent(&t, &t), 0.0);
}

#[test]
fn test_usage_percent_counter_reset_is_zero() {
    assert_eq!(usage_percent(&ticks(1000, 1000), &ticks(10, 10)), 0.0);
}

#[test]
fn test_usage_percent_fully_busy_and_fully_idle() {
    assert_eq!(usage_percent(&ticks(0, 0), &ticks(100, 0)), 100.0);
    assert_eq!(usage_percent(&ticks(0, 0), &ticks(0, 100)), 0.0);
}

#[test]
fn test_usage_percent_idle_going_backwards_is_clamped() {
    // Idle counter jumped back while total advanced: raw formula exceeds 100.
    let before = CpuTicks {
        user: 0,
        idle: 200,
        ..CpuTicks::default()
    };
    let after = CpuTicks {
        user: 300,
        idle: 0,
        ..CpuTicks::default()
    };
    assert_eq!(usage_percent(&before, &after), 100.0);
}

#[test]
fn test_total_ignores_guest_columns() {
    let t = CpuTicks {
        user: 10,
        guest: 5,
        guest_nice: 5,
        ..CpuTicks::default()
    };
    assert_eq!(t.total(), 10);
}

#[test]
fn test_total_saturates() {
    let t = CpuTicks {
        user: u64::MAX,
        idle: 10,
        ..CpuTicks::default()
    };
    assert_eq!(t.total(), u64::MAX);
}

#[test]
fn test_derive_cpu_stats_per_core_by_index() {
    let prev = raw(0, 0);
    let curr = raw(50, 50);
    let prev_cores = vec![raw(0, 0), raw(0, 0)];
    let curr_cores = vec![raw(100, 0), raw(0, 100), raw(40, 60)];

    let stats = derive_cpu_stats(&prev, &prev_cores, &curr, &curr_cores);
    assert!((stats.usage - 50.0).abs() < 1e-9);
    assert_eq!(stats.cores.len(), 3);
    assert_eq!(stats.cores[0].usage, 100.0);
    assert_eq!(stats.cores[1].usage, 0.0);
    // No previous reading for a hotplugged core.
    assert_eq!(stats.cores[2].core, 2);
    assert_eq!(stats.cores[2].usage, 0.0);
    assert_eq!(stats.temperature, 50.0);
    assert_eq!(stats.frequency_mhz, 3000);
}

#[test]
fn test_derive_cpu_stats_all_within_range() {
    let stats = derive_cpu_stats(
        &raw(u64::MAX / 2, 0),
        &[raw(7, 3)],
        &raw(1, 1),
        &[raw(9, 1)],
    );
    assert!((0.0..=100.0).contains(&stats.usage));
    assert!(stats.cores.iter().all(|c| (0.0..=100.0).contains(&c.usage)));
}

#[test]
fn test_clamp_percent_non_finite() {
    assert_eq!(clamp_percent(f64::NAN), 0.0);
    assert_eq!(clamp_percent(f64::INFINITY), 0.0);
    assert_eq!(clamp_percent(-3.0), 0.0);
    assert_eq!(clamp_percent(250.0), 100.0);
}

#[test]
fn test_process_first_sighting_is_zero() {
    let mut tracker = ProcessCpuTracker::new();
    assert_eq!(tracker.observe(1, 5_000, 2_000), 0.0);
    tracker.finish_read();
    assert!(tracker.is_tracked(1));
}

#[test]
fn test_process_share_of_machine_time() {
    let mut tracker = ProcessCpuTracker::new();
    tracker.observe(7, 1_000, 0);
    tracker.finish_read();
    // 500 ms of CPU out of 2000 ms * 4 cores.
    let pct = tracker.observe(7, 1_500, 8_000);
    assert!((pct - 6.25).abs() < 1e-9);
}

#[test]
fn test_process_exited_pids_are_evicted() {
    let mut tracker = ProcessCpuTracker::new();
    tracker.observe(1, 10, 0);
    tracker.observe(2, 10, 0);
    tracker.finish_read();
    assert_eq!(tracker.tracked(), 2);

    tracker.observe(2, 20, 100);
    tracker.finish_read();
    assert_eq!(tracker.tracked(), 1);
    assert!(!tracker.is_tracked(1));

    // A reused pid starts over.
    assert_eq!(tracker.observe(1, 1_000_000, 100), 0.0);
}

#[test]
fn test_process_cpu_time_going_backwards_is_zero() {
    let mut tracker = ProcessCpuTracker::new();
    tracker.observe(3, 900, 0);
    tracker.finish_read();
    assert_eq!(tracker.observe(3, 100, 1_000), 0.0);
}

#[test]
fn test_process_share_is_clamped() {
    let mut tracker = ProcessCpuTracker::new();
    tracker.observe(3, 0, 0);
    tracker.finish_read();
    assert_eq!(tracker.observe(3, 10_000, 100), 100.0);
}
