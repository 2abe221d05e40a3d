// CPU tick counters and derived usage

/// Cumulative counters for one `cpu` line of /proc/stat, in clock ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CpuTicks {
    /// Elapsed ticks. `guest` and `guest_nice` are already accounted in `user` and `nice`.
    pub fn total(&self) -> u64 {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .iter()
        .fold(0u64, |acc, v| acc.saturating_add(*v))
    }
}

/// One reading for a core or for the aggregate line. Two consecutive readings yield a usage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawCpuSample {
    pub ticks: CpuTicks,
    pub temperature: f64,
    pub frequency_mhz: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoreUsage {
    pub core: usize,
    pub usage: f64,
}

/// Usage derived from two raw readings; all percentages are within 0..=100.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedCpuStats {
    pub usage: f64,
    pub temperature: f64,
    pub frequency_mhz: u64,
    pub cores: Vec<CoreUsage>,
}
