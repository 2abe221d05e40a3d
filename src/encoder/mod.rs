// Snapshot encoder: bounded JSON documents served as /api/system and /api/history.
// Encoding is a pure function of the sample (or ring) and the configured limits.

mod budget;
mod repair;
mod sanitize;

pub use budget::{Budget, encoded_len};
pub use repair::{
    DEFAULT_GPU_MEMORY_CEILING, DEFAULT_GPU_MEMORY_TOTAL, GIB, GpuLimits, repair_memory,
};
pub use sanitize::{PLACEHOLDER, sanitize_state, sanitize_text};

use crate::cpu_usage::clamp_percent;
use crate::history::HistoryRing;
use crate::models::{HistoryEntry, MemorySample, ProcessSample, SystemSample};
use serde::Serialize;

/// Smallest accepted system document budget; always fits the fixed part of the document.
pub const MIN_DOCUMENT_BYTES: usize = 1024;
/// Smallest accepted history document budget; always fits an empty history.
pub const MIN_HISTORY_BYTES: usize = 256;
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 64 * 1024;
pub const DEFAULT_MAX_HISTORY_BYTES: usize = 16 * 1024;

pub const MAX_NAME_CHARS: usize = 255;
pub const MAX_COMMAND_CHARS: usize = 511;
pub const MAX_GPU_NAME_CHARS: usize = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderLimits {
    pub max_document_bytes: usize,
    pub max_history_bytes: usize,
    pub gpu: GpuLimits,
}

impl Default for EncoderLimits {
    fn default() -> Self {
        Self {
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            max_history_bytes: DEFAULT_MAX_HISTORY_BYTES,
            gpu: GpuLimits::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotEncoder {
    limits: EncoderLimits,
}

impl Default for SnapshotEncoder {
    fn default() -> Self {
        Self::new(EncoderLimits::default())
    }
}

impl SnapshotEncoder {
    /// Budgets below [`MIN_DOCUMENT_BYTES`] / [`MIN_HISTORY_BYTES`] are raised to those minimums.
    pub fn new(limits: EncoderLimits) -> Self {
        Self {
            limits: EncoderLimits {
                max_document_bytes: limits.max_document_bytes.max(MIN_DOCUMENT_BYTES),
                max_history_bytes: limits.max_history_bytes.max(MIN_HISTORY_BYTES),
                gpu: limits.gpu,
            },
        }
    }

    pub fn limits(&self) -> &EncoderLimits {
        &self.limits
    }

    /// Scalar summary of a sample for the history ring, using the same repairs as the document.
    pub fn history_entry(&self, sample: &SystemSample) -> HistoryEntry {
        let memory = repair_memory(&sample.memory);
        let gpu = self.limits.gpu.repair(&sample.gpu);
        HistoryEntry {
            timestamp: sample.timestamp,
            cpu: clamp_percent(sample.cpu.usage),
            memory: memory.percentage,
            gpu: gpu.usage,
            gpu_memory: gpu.memory_percent(),
            gpu_temperature: finite_or_zero(gpu.temperature),
        }
    }

    /// The /api/system document. Never longer than `max_document_bytes`; when space runs out
    /// the lowest-CPU processes are left out first, then trailing per-core entries.
    pub fn encode_system(&self, sample: &SystemSample) -> String {
        let memory = repair_memory(&sample.memory);
        let gpu = self.limits.gpu.repair(&sample.gpu);
        let gpu_name = sanitize_text(&gpu.name, MAX_GPU_NAME_CHARS)
            .unwrap_or_else(|| PLACEHOLDER.to_string());

        let cores: Vec<CoreEntry> = sample
            .cpu
            .cores
            .iter()
            .map(|c| CoreEntry {
                core: c.core,
                usage: one_decimal(clamp_percent(c.usage)),
            })
            .collect();
        let processes: Vec<ProcessEntry> =
            sample.processes.iter().map(ProcessEntry::from_sample).collect();

        let mut document = SystemDocument {
            timestamp: sample.timestamp,
            cpu: CpuSection {
                usage: one_decimal(clamp_percent(sample.cpu.usage)),
                cores_count: sample.cpu.cores.len(),
                temperature: one_decimal(sample.cpu.temperature),
                frequency: sample.cpu.frequency_mhz,
                cores: &[],
            },
            memory: MemorySection::from(&memory),
            gpu: GpuSection {
                usage: one_decimal(gpu.usage),
                memory_total: gpu.memory_total,
                memory_used: gpu.memory_used,
                temperature: one_decimal(gpu.temperature),
                power: one_decimal(gpu.power),
                clock: gpu.clock_mhz,
                name: &gpu_name,
            },
            processes: &[],
        };

        let mut budget = Budget::new(self.limits.max_document_bytes);
        if !budget.reserve(encoded_len(&document)) {
            tracing::warn!(
                operation = "encode_system",
                max_document_bytes = self.limits.max_document_bytes,
                "document budget too small for fixed fields"
            );
            return error_document("document budget too small", sample.timestamp);
        }
        let core_count = budget.take_fitting(cores.iter().map(encoded_len), 1);
        let process_count = if core_count == cores.len() {
            budget.take_fitting(processes.iter().map(encoded_len), 1)
        } else {
            0
        };
        if core_count < cores.len() || process_count < processes.len() {
            tracing::debug!(
                operation = "encode_system",
                cores_dropped = cores.len() - core_count,
                processes_dropped = processes.len() - process_count,
                "document truncated to fit budget"
            );
        }

        document.cpu.cores = &cores[..core_count];
        document.processes = &processes[..process_count];
        to_json(&document, sample.timestamp)
    }

    /// The /api/history document, oldest first. If it would exceed `max_history_bytes` the
    /// oldest entries are left out and `count` reports how many were emitted.
    pub fn encode_history(&self, history: &HistoryRing) -> String {
        let rows: Vec<HistoryRow> = history.iter().map(HistoryRow::from).collect();

        let mut budget = Budget::new(self.limits.max_history_bytes);
        // Base size is measured with the largest count it can carry, so the real count fits.
        let empty = HistoryDocument::from_rows(&[], rows.len());
        if !budget.reserve(encoded_len(&empty)) {
            return error_document("history budget too small", 0);
        }
        let kept = budget.take_fitting(rows.iter().rev().map(HistoryRow::encoded_len), 6);
        if kept < rows.len() {
            tracing::debug!(
                operation = "encode_history",
                entries_dropped = rows.len() - kept,
                "history truncated to fit budget"
            );
        }

        let rows = &rows[rows.len() - kept..];
        to_json(&HistoryDocument::from_rows(rows, rows.len()), 0)
    }
}

/// Rounds to one decimal place for display. Non-finite input becomes 0 so the output stays JSON.
pub fn one_decimal(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let rounded = (value * 10.0).round() / 10.0;
    if !rounded.is_finite() {
        value
    } else if rounded == 0.0 {
        // Avoid "-0.0".
        0.0
    } else {
        rounded
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn error_document(message: &str, timestamp: u64) -> String {
    serde_json::json!({ "error": message, "timestamp": timestamp }).to_string()
}

fn to_json<T: Serialize>(document: &T, timestamp: u64) -> String {
    serde_json::to_string(document).unwrap_or_else(|e| {
        tracing::warn!(error = %e, operation = "to_json", "document serialization failed");
        error_document("encoding failed", timestamp)
    })
}

#[derive(Serialize)]
struct SystemDocument<'a> {
    timestamp: u64,
    cpu: CpuSection<'a>,
    memory: MemorySection,
    gpu: GpuSection<'a>,
    processes: &'a [ProcessEntry],
}

#[derive(Serialize)]
struct CpuSection<'a> {
    usage: f64,
    cores_count: usize,
    temperature: f64,
    frequency: u64,
    cores: &'a [CoreEntry],
}

#[derive(Serialize)]
struct CoreEntry {
    core: usize,
    usage: f64,
}

#[derive(Serialize)]
struct MemorySection {
    total: u64,
    used: u64,
    free: u64,
    cached: u64,
    percentage: f64,
}

impl From<&MemorySample> for MemorySection {
    fn from(m: &MemorySample) -> Self {
        Self {
            total: m.total,
            used: m.used,
            free: m.free,
            cached: m.cached,
            percentage: one_decimal(m.percentage),
        }
    }
}

#[derive(Serialize)]
struct GpuSection<'a> {
    usage: f64,
    memory_total: u64,
    memory_used: u64,
    temperature: f64,
    power: f64,
    clock: u64,
    name: &'a str,
}

#[derive(Serialize)]
struct ProcessEntry {
    pid: u32,
    name: String,
    state: char,
    memory: u64,
    cpu: f64,
    command: String,
}

impl ProcessEntry {
    fn from_sample(p: &ProcessSample) -> Self {
        let name =
            sanitize_text(&p.name, MAX_NAME_CHARS).unwrap_or_else(|| PLACEHOLDER.to_string());
        let command =
            sanitize_text(&p.command, MAX_COMMAND_CHARS).unwrap_or_else(|| name.clone());
        Self {
            pid: p.pid,
            name,
            state: sanitize_state(p.state),
            memory: p.memory_bytes,
            cpu: one_decimal(clamp_percent(p.cpu_percent)),
            command,
        }
    }
}

/// One history entry with display rounding applied.
struct HistoryRow {
    cpu: f64,
    memory: f64,
    gpu: f64,
    gpu_memory: f64,
    gpu_temperature: f64,
    timestamp: u64,
}

impl From<&HistoryEntry> for HistoryRow {
    fn from(e: &HistoryEntry) -> Self {
        Self {
            cpu: one_decimal(e.cpu),
            memory: one_decimal(e.memory),
            gpu: one_decimal(e.gpu),
            gpu_memory: one_decimal(e.gpu_memory),
            gpu_temperature: one_decimal(e.gpu_temperature),
            timestamp: e.timestamp,
        }
    }
}

impl HistoryRow {
    /// Bytes this row adds across the six arrays, separators excluded.
    fn encoded_len(&self) -> usize {
        encoded_len(&self.cpu)
            + encoded_len(&self.memory)
            + encoded_len(&self.gpu)
            + encoded_len(&self.gpu_memory)
            + encoded_len(&self.gpu_temperature)
            + encoded_len(&self.timestamp)
    }
}

#[derive(Serialize)]
struct HistoryDocument {
    cpu: Vec<f64>,
    memory: Vec<f64>,
    gpu: Vec<f64>,
    gpu_memory: Vec<f64>,
    gpu_temperature: Vec<f64>,
    timestamps: Vec<u64>,
    count: usize,
}

impl HistoryDocument {
    fn from_rows(rows: &[HistoryRow], count: usize) -> Self {
        Self {
            cpu: rows.iter().map(|r| r.cpu).collect(),
            memory: rows.iter().map(|r| r.memory).collect(),
            gpu: rows.iter().map(|r| r.gpu).collect(),
            gpu_memory: rows.iter().map(|r| r.gpu_memory).collect(),
            gpu_temperature: rows.iter().map(|r| r.gpu_temperature).collect(),
            timestamps: rows.iter().map(|r| r.timestamp).collect(),
            count,
        }
    }
}
