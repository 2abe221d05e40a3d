// Host probes behind the Collector trait. Every read returns a value: when an OS source is
// unavailable the probe logs it and substitutes a documented default.

mod gpu;
mod linux;

use crate::cpu_usage::ProcessCpuTracker;
use crate::models::{CpuTicks, GpuSample, MemorySample, ProcessSample, RawCpuSample};
use std::time::Instant;
use sysinfo::{
    Components, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System, UpdateKind,
};

pub const FALLBACK_CPU_TEMPERATURE: f64 = 45.0;
pub const FALLBACK_CPU_FREQUENCY_MHZ: u64 = 2400;
pub const FALLBACK_MEMORY: MemorySample = MemorySample {
    total: 33_238_007_808,
    used: 10_654_793_728,
    free: 22_583_214_080,
    cached: 209_715_200,
    percentage: 32.1,
};
pub const FALLBACK_GPU_NAME: &str = "Unknown GPU";
pub const FALLBACK_GPU_MEMORY_TOTAL: u64 = 8 * 1024 * 1024 * 1024;

/// Why a single OS source could not be read. Never leaves the collector.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("reading {path}: {source}")]
    Io {
        path: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {source_name}: {detail}")]
    Parse {
        source_name: &'static str,
        detail: String,
    },
    #[error("running {program}: {detail}")]
    Command {
        program: &'static str,
        detail: String,
    },
}

/// Source of raw readings for the sampling loop. Reads never fail; implementations fall back to
/// defaults on their own.
pub trait Collector: Send {
    /// Aggregate reading plus one reading per core.
    fn read_cpu(&mut self) -> (RawCpuSample, Vec<RawCpuSample>);
    fn read_memory(&mut self) -> MemorySample;
    fn read_gpu(&mut self) -> GpuSample;
    /// Live processes with CPU percent already derived, in no particular order.
    fn read_processes(&mut self) -> Vec<ProcessSample>;
}

/// Collector for the local host: /proc for CPU ticks and memory, nvidia-smi for the GPU,
/// sysinfo for processes, sensors and clock frequency.
pub struct SystemCollector {
    sys: System,
    components: Components,
    process_cpu: ProcessCpuTracker,
    last_process_read: Option<Instant>,
    logical_cpus: u64,
}

impl Default for SystemCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCollector {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_frequency();
        let logical_cpus = std::thread::available_parallelism()
            .map(|n| n.get() as u64)
            .unwrap_or(1);
        Self {
            sys,
            components: Components::new_with_refreshed_list(),
            process_cpu: ProcessCpuTracker::new(),
            last_process_read: None,
            logical_cpus,
        }
    }

    fn cpu_temperature(&mut self) -> f64 {
        self.components.refresh(false);
        let hottest = self
            .components
            .list()
            .iter()
            .filter(|c| is_cpu_sensor(c.label()))
            .filter_map(|c| c.temperature())
            .filter(|t| t.is_finite() && *t > 0.0)
            .fold(None, |max: Option<f32>, t| Some(max.map_or(t, |m| m.max(t))));
        match hottest {
            Some(t) => t as f64,
            None => {
                tracing::debug!(
                    operation = "read_cpu",
                    fallback = FALLBACK_CPU_TEMPERATURE,
                    "no CPU temperature sensor, using default"
                );
                FALLBACK_CPU_TEMPERATURE
            }
        }
    }

    fn cpu_frequency(&mut self) -> u64 {
        self.sys.refresh_cpu_frequency();
        self.sys
            .cpus()
            .first()
            .map(|c| c.frequency())
            .filter(|f| *f > 0)
            .unwrap_or_else(|| {
                tracing::debug!(
                    operation = "read_cpu",
                    fallback = FALLBACK_CPU_FREQUENCY_MHZ,
                    "CPU frequency unavailable, using default"
                );
                FALLBACK_CPU_FREQUENCY_MHZ
            })
    }

    fn memory_from_sysinfo(&mut self) -> Option<MemorySample> {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return None;
        }
        let used = total.saturating_sub(self.sys.available_memory());
        Some(MemorySample {
            total,
            used,
            free: self.sys.free_memory(),
            cached: 0,
            percentage: used as f64 / total as f64 * 100.0,
        })
    }
}

impl Collector for SystemCollector {
    fn read_cpu(&mut self) -> (RawCpuSample, Vec<RawCpuSample>) {
        let temperature = self.cpu_temperature();
        let frequency_mhz = self.cpu_frequency();
        let raw = |ticks: CpuTicks| RawCpuSample {
            ticks,
            temperature,
            frequency_mhz,
        };

        match linux::read_cpu_ticks() {
            Ok((aggregate, cores)) => (raw(aggregate), cores.into_iter().map(raw).collect()),
            Err(e) => {
                // Zero counters derive to 0% usage rather than invented figures.
                tracing::warn!(error = %e, operation = "read_cpu", "CPU ticks unavailable");
                let cores = (0..self.logical_cpus)
                    .map(|_| raw(CpuTicks::default()))
                    .collect();
                (raw(CpuTicks::default()), cores)
            }
        }
    }

    fn read_memory(&mut self) -> MemorySample {
        match linux::read_meminfo() {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, operation = "read_memory", "meminfo unavailable");
                self.memory_from_sysinfo().unwrap_or_else(|| {
                    tracing::warn!(
                        operation = "read_memory",
                        "sysinfo memory unavailable, using defaults"
                    );
                    FALLBACK_MEMORY
                })
            }
        }
    }

    fn read_gpu(&mut self) -> GpuSample {
        gpu::query_nvidia_smi().unwrap_or_else(|e| {
            tracing::debug!(error = %e, operation = "read_gpu", "GPU probe failed, using defaults");
            GpuSample {
                memory_total: FALLBACK_GPU_MEMORY_TOTAL,
                name: FALLBACK_GPU_NAME.to_string(),
                ..GpuSample::default()
            }
        })
    }

    fn read_processes(&mut self) -> Vec<ProcessSample> {
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_cpu()
                .with_memory()
                .with_cmd(UpdateKind::OnlyIfNotSet),
        );
        let now = Instant::now();
        // CPU time the whole machine had since the last read, in ms like accumulated_cpu_time.
        let capacity_ms = self
            .last_process_read
            .map(|t| now.duration_since(t).as_millis() as u64 * self.logical_cpus)
            .unwrap_or(0);
        self.last_process_read = Some(now);

        let processes: Vec<ProcessSample> = self
            .sys
            .processes()
            .values()
            .map(|p| {
                let pid = p.pid().as_u32();
                let cpu_percent =
                    self.process_cpu
                        .observe(pid, p.accumulated_cpu_time(), capacity_ms);
                to_process_sample(p, cpu_percent)
            })
            .collect();
        self.process_cpu.finish_read();

        if processes.is_empty() {
            tracing::warn!(operation = "read_processes", "process list unavailable");
        }
        processes
    }
}

fn to_process_sample(p: &Process, cpu_percent: f64) -> ProcessSample {
    let command = p
        .cmd()
        .iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string();
    ProcessSample {
        pid: p.pid().as_u32(),
        name: p.name().to_string_lossy().into_owned(),
        state: state_code(p.status()),
        memory_bytes: p.memory(),
        cpu_percent,
        command,
    }
}

/// Letter used by /proc/<pid>/stat for the scheduler state.
fn state_code(status: ProcessStatus) -> char {
    match status {
        ProcessStatus::Run => 'R',
        ProcessStatus::Sleep => 'S',
        ProcessStatus::UninterruptibleDiskSleep => 'D',
        ProcessStatus::Zombie => 'Z',
        ProcessStatus::Stop => 'T',
        ProcessStatus::Tracing => 't',
        ProcessStatus::Dead => 'X',
        ProcessStatus::Idle => 'I',
        ProcessStatus::Wakekill => 'K',
        ProcessStatus::Waking => 'W',
        ProcessStatus::Parked => 'P',
        _ => '?',
    }
}

fn is_cpu_sensor(label: &str) -> bool {
    let label = label.to_ascii_lowercase();
    ["cpu", "core", "package", "tctl", "tdie", "k10temp", "coretemp"]
        .iter()
        .any(|needle| label.contains(needle))
}
