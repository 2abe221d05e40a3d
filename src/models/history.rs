/// One slot of the rolling history: unix seconds plus the five charted series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: u64,
    pub cpu: f64,
    pub memory: f64,
    pub gpu: f64,
    pub gpu_memory: f64,
    pub gpu_temperature: f64,
}
