// Full system sample handed from the sampling loop to the encoder

use super::{DerivedCpuStats, GpuSample, MemorySample, ProcessSample};

/// Everything one cycle observed. `processes` is already sorted by CPU (descending) and truncated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemSample {
    /// Unix seconds.
    pub timestamp: u64,
    pub cpu: DerivedCpuStats,
    pub memory: MemorySample,
    pub gpu: GpuSample,
    pub processes: Vec<ProcessSample>,
}
