#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpuSample {
    /// Utilization percent.
    pub usage: f64,
    pub memory_total: u64,
    pub memory_used: u64,
    pub temperature: f64,
    /// Board power draw in watts.
    pub power: f64,
    pub clock_mhz: u64,
    pub name: String,
}

impl GpuSample {
    /// Memory in use as a percent of total; 0 when the total is unknown.
    pub fn memory_percent(&self) -> f64 {
        if self.memory_total == 0 {
            return 0.0;
        }
        (self.memory_used as f64 / self.memory_total as f64 * 100.0).clamp(0.0, 100.0)
    }
}
