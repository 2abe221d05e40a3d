// CPU usage from successive cumulative counters (system-wide, per core, per process)

use crate::models::{CoreUsage, CpuTicks, DerivedCpuStats, RawCpuSample};
use std::collections::HashMap;

/// Busy percent between two readings of the same counter line.
///
/// `100 * (1 - idle_delta / total_delta)`, clamped to 0..=100. A total delta of zero or less
/// (first sample, identical readings, counter reset) yields 0.
pub fn usage_percent(previous: &CpuTicks, current: &CpuTicks) -> f64 {
    let total_delta = current.total() as f64 - previous.total() as f64;
    if total_delta <= 0.0 {
        return 0.0;
    }
    let idle_delta = current.idle as f64 - previous.idle as f64;
    clamp_percent(100.0 * (1.0 - idle_delta / total_delta))
}

/// Derives aggregate and per-core usage. Temperature and frequency come from `current`.
///
/// Cores are matched by position; a core with no previous reading (hotplug) reports 0.
pub fn derive_cpu_stats(
    previous: &RawCpuSample,
    previous_cores: &[RawCpuSample],
    current: &RawCpuSample,
    current_cores: &[RawCpuSample],
) -> DerivedCpuStats {
    let cores = current_cores
        .iter()
        .enumerate()
        .map(|(core, now)| CoreUsage {
            core,
            usage: previous_cores
                .get(core)
                .map(|before| usage_percent(&before.ticks, &now.ticks))
                .unwrap_or(0.0),
        })
        .collect();

    DerivedCpuStats {
        usage: usage_percent(&previous.ticks, &current.ticks),
        temperature: current.temperature,
        frequency_mhz: current.frequency_mhz,
        cores,
    }
}

/// Clamp into 0..=100; NaN and infinities become 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Per-process CPU percent from cumulative per-pid CPU time.
///
/// Keeps the last observed CPU time of every pid seen in the previous read. Each read calls
/// [`observe`](Self::observe) once per live process and then [`finish_read`](Self::finish_read),
/// which forgets every pid that was not observed, so exited processes never linger.
#[derive(Debug, Default)]
pub struct ProcessCpuTracker {
    previous: HashMap<u32, u64>,
    current: HashMap<u32, u64>,
}

impl ProcessCpuTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `cpu_time` is the process's cumulative CPU time and `elapsed_capacity` the CPU time the
    /// whole machine had available since the previous read, in the same unit.
    /// A pid seen for the first time reports 0.
    pub fn observe(&mut self, pid: u32, cpu_time: u64, elapsed_capacity: u64) -> f64 {
        self.current.insert(pid, cpu_time);
        let Some(before) = self.previous.get(&pid) else {
            return 0.0;
        };
        if elapsed_capacity == 0 {
            return 0.0;
        }
        let spent = cpu_time.saturating_sub(*before);
        clamp_percent(100.0 * spent as f64 / elapsed_capacity as f64)
    }

    /// Ends a read: the pids observed since the last call become the baseline, others are evicted.
    pub fn finish_read(&mut self) {
        self.previous = std::mem::take(&mut self.current);
    }

    /// Number of pids carried into the next read.
    pub fn tracked(&self) -> usize {
        self.previous.len()
    }

    pub fn is_tracked(&self, pid: u32) -> bool {
        self.previous.contains_key(&pid)
    }
}
