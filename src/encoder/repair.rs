// Range checks for memory and GPU figures before they are published

use crate::cpu_usage::clamp_percent;
use crate::models::{GpuSample, MemorySample};

pub const GIB: u64 = 1024 * 1024 * 1024;

/// Totals above this are collector garbage, not real hardware.
pub const DEFAULT_GPU_MEMORY_CEILING: u64 = 100 * GIB;
/// Substituted for a total above the ceiling.
pub const DEFAULT_GPU_MEMORY_TOTAL: u64 = 8 * GIB;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuLimits {
    pub memory_ceiling: u64,
    pub default_memory_total: u64,
}

impl Default for GpuLimits {
    fn default() -> Self {
        Self {
            memory_ceiling: DEFAULT_GPU_MEMORY_CEILING,
            default_memory_total: DEFAULT_GPU_MEMORY_TOTAL,
        }
    }
}

impl GpuLimits {
    /// Clamps usage, replaces an implausible total and rebuilds `used` from usage when it exceeds
    /// the total. Repairing an already repaired sample changes nothing.
    pub fn repair(&self, gpu: &GpuSample) -> GpuSample {
        let mut out = gpu.clone();
        out.usage = clamp_percent(gpu.usage);

        if out.memory_total > self.memory_ceiling {
            tracing::warn!(
                operation = "repair_gpu",
                memory_total = out.memory_total,
                replacement = self.default_memory_total,
                "GPU memory total above ceiling, using default"
            );
            out.memory_total = self.default_memory_total;
        }

        if out.memory_used > out.memory_total {
            let rebuilt =
                ((out.memory_total as f64 * out.usage / 100.0).round() as u64).min(out.memory_total);
            tracing::warn!(
                operation = "repair_gpu",
                memory_used = out.memory_used,
                memory_total = out.memory_total,
                replacement = rebuilt,
                "GPU memory used above total, deriving from utilization"
            );
            out.memory_used = rebuilt;
        }
        out
    }
}

/// Caps `used` at `total` and recomputes the percentage from the byte counts.
pub fn repair_memory(memory: &MemorySample) -> MemorySample {
    let mut out = *memory;
    if out.used > out.total {
        tracing::warn!(
            operation = "repair_memory",
            used = out.used,
            total = out.total,
            "memory used above total, capping"
        );
        out.used = out.total;
    }
    out.percentage = if out.total > 0 {
        clamp_percent(out.used as f64 / out.total as f64 * 100.0)
    } else {
        0.0
    };
    out
}
