// Domain models: raw collector readings and the values derived from them

mod cpu;
mod gpu;
mod history;
mod memory;
mod process;
mod sample;

pub use cpu::{CoreUsage, CpuTicks, DerivedCpuStats, RawCpuSample};
pub use gpu::GpuSample;
pub use history::HistoryEntry;
pub use memory::MemorySample;
pub use process::ProcessSample;
pub use sample::SystemSample;
