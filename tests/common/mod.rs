// Shared test helpers
#![allow(dead_code)]

use sysmon::collector::Collector;
use sysmon::models::*;

pub const GIB: u64 = 1024 * 1024 * 1024;

pub fn ticks(busy: u64, idle: u64) -> CpuTicks {
    CpuTicks {
        user: busy,
        idle,
        ..CpuTicks::default()
    }
}

pub fn raw(busy: u64, idle: u64) -> RawCpuSample {
    RawCpuSample {
        ticks: ticks(busy, idle),
        temperature: 50.0,
        frequency_mhz: 3000,
    }
}

pub fn memory_16g_8g() -> MemorySample {
    MemorySample {
        total: 16 * GIB,
        used: 8 * GIB,
        free: 4 * GIB,
        cached: 2 * GIB,
        percentage: 0.0,
    }
}

pub fn gpu(usage: f64, total: u64, used: u64) -> GpuSample {
    GpuSample {
        usage,
        memory_total: total,
        memory_used: used,
        temperature: 60.0,
        power: 120.5,
        clock_mhz: 1800,
        name: "Test GPU".to_string(),
    }
}

pub fn process(pid: u32, name: &str, cpu_percent: f64) -> ProcessSample {
    ProcessSample {
        pid,
        name: name.to_string(),
        state: 'S',
        memory_bytes: 64 * 1024 * 1024,
        cpu_percent,
        command: format!("/usr/bin/{name} --flag"),
    }
}

pub fn sample(timestamp: u64) -> SystemSample {
    SystemSample {
        timestamp,
        cpu: DerivedCpuStats {
            usage: 25.0,
            temperature: 55.0,
            frequency_mhz: 3200,
            cores: (0..4).map(|core| CoreUsage { core, usage: 25.0 }).collect(),
        },
        memory: memory_16g_8g(),
        gpu: gpu(40.0, 8 * GIB, 2 * GIB),
        processes: vec![process(1, "init", 3.0), process(42, "postgres", 1.5)],
    }
}

/// Collector with deterministic readings. Every CPU read advances each counter line by
/// `busy_step` busy and `idle_step` idle ticks, so derived usage is constant.
pub struct ScriptedCollector {
    pub busy_step: u64,
    pub idle_step: u64,
    pub cores: usize,
    pub memory: MemorySample,
    /// GPU reading per cycle; the last one repeats.
    pub gpus: Vec<GpuSample>,
    pub processes: Vec<ProcessSample>,
    cpu_reads: u64,
    gpu_reads: usize,
}

impl ScriptedCollector {
    /// 25% busy on every line, four cores, a sane GPU and three processes.
    pub fn new() -> Self {
        Self {
            busy_step: 25,
            idle_step: 75,
            cores: 4,
            memory: memory_16g_8g(),
            gpus: vec![gpu(40.0, 8 * GIB, 2 * GIB)],
            processes: vec![
                process(10, "low", 0.5),
                process(11, "high", 80.0),
                process(12, "mid", 10.0),
            ],
            cpu_reads: 0,
            gpu_reads: 0,
        }
    }
}

impl Collector for ScriptedCollector {
    fn read_cpu(&mut self) -> (RawCpuSample, Vec<RawCpuSample>) {
        let n = self.cpu_reads;
        self.cpu_reads += 1;
        let line = raw(self.busy_step * n, self.idle_step * n);
        (line, vec![line; self.cores])
    }

    fn read_memory(&mut self) -> MemorySample {
        self.memory
    }

    fn read_gpu(&mut self) -> GpuSample {
        let i = self.gpu_reads.min(self.gpus.len().saturating_sub(1));
        self.gpu_reads += 1;
        self.gpus.get(i).cloned().unwrap_or_default()
    }

    fn read_processes(&mut self) -> Vec<ProcessSample> {
        self.processes.clone()
    }
}
