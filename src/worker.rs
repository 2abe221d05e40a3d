// Sampling loop: collect -> derive -> record history -> encode -> publish, once per interval.
// A cycle runs on the blocking pool because every probe is synchronous file or process I/O.

use crate::collector::Collector;
use crate::cpu_usage::derive_cpu_stats;
use crate::encoder::SnapshotEncoder;
use crate::history::HistoryRing;
use crate::models::{GpuSample, ProcessSample, RawCpuSample, SystemSample};
use crate::publisher::SnapshotPublisher;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tracing::Instrument;

pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_MAX_PROCESSES: usize = 10;

/// Sizing for the state a sampler owns.
#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    pub history_capacity: usize,
    pub max_processes: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            history_capacity: crate::history::DEFAULT_HISTORY_CAPACITY,
            max_processes: DEFAULT_MAX_PROCESSES,
        }
    }
}

/// What one cycle produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub document_bytes: usize,
    pub history_bytes: usize,
    pub processes: usize,
}

/// First GPU memory total that passed the sanity check. Once recorded it is reported on every
/// later cycle, so the total stays fixed for the life of the process.
#[derive(Debug, Default)]
pub struct GpuTotalTracker {
    last_known_total: Option<u64>,
}

impl GpuTotalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_known_total(&self) -> Option<u64> {
        self.last_known_total
    }

    /// Without a recorded total, a plausible one (`0 < total <= ceiling`) is recorded and an
    /// implausible sample is returned unchanged for the encoder to repair.
    pub fn stabilize(&mut self, mut gpu: GpuSample, ceiling: u64) -> GpuSample {
        match self.last_known_total {
            Some(total) => {
                if gpu.memory_total == 0 || gpu.memory_total > ceiling {
                    tracing::warn!(
                        operation = "stabilize_gpu",
                        reported = gpu.memory_total,
                        replacement = total,
                        "implausible GPU memory total, using last known"
                    );
                }
                gpu.memory_total = total;
            }
            None if gpu.memory_total > 0 && gpu.memory_total <= ceiling => {
                self.last_known_total = Some(gpu.memory_total);
            }
            None => {}
        }
        gpu
    }
}

/// Owns everything a cycle mutates. Only the sampling loop holds one, so the history ring and
/// the CPU baselines have a single writer.
pub struct Sampler<C: Collector> {
    collector: C,
    previous_cpu: RawCpuSample,
    previous_cores: Vec<RawCpuSample>,
    gpu_total: GpuTotalTracker,
    history: HistoryRing,
    encoder: SnapshotEncoder,
    publisher: Arc<SnapshotPublisher>,
    max_processes: usize,
}

impl<C: Collector> Sampler<C> {
    /// Takes the first CPU reading as the baseline, so the first cycle already has a delta.
    pub fn new(
        mut collector: C,
        encoder: SnapshotEncoder,
        publisher: Arc<SnapshotPublisher>,
        config: SamplerConfig,
    ) -> Self {
        let (previous_cpu, previous_cores) = collector.read_cpu();
        Self {
            collector,
            previous_cpu,
            previous_cores,
            gpu_total: GpuTotalTracker::new(),
            history: HistoryRing::new(config.history_capacity),
            encoder,
            publisher,
            max_processes: config.max_processes,
        }
    }

    pub fn history(&self) -> &HistoryRing {
        &self.history
    }

    pub fn publisher(&self) -> &Arc<SnapshotPublisher> {
        &self.publisher
    }

    /// Gathers one sample stamped with `timestamp` (unix seconds).
    pub fn sample(&mut self, timestamp: u64) -> SystemSample {
        let (cpu, cores) = self.collector.read_cpu();
        let memory = self.collector.read_memory();
        let gpu = self.collector.read_gpu();
        let processes = self.collector.read_processes();

        let derived = derive_cpu_stats(&self.previous_cpu, &self.previous_cores, &cpu, &cores);
        self.previous_cpu = cpu;
        self.previous_cores = cores;

        SystemSample {
            timestamp,
            cpu: derived,
            memory,
            gpu: self
                .gpu_total
                .stabilize(gpu, self.encoder.limits().gpu.memory_ceiling),
            processes: top_processes(processes, self.max_processes),
        }
    }

    /// One full cycle. Never fails: every probe has a fallback and encoding always fits.
    pub fn run_cycle(&mut self, timestamp: u64) -> CycleReport {
        let sample = self.sample(timestamp);
        self.history.append(self.encoder.history_entry(&sample));

        let document = self.encoder.encode_system(&sample);
        let history = self.encoder.encode_history(&self.history);
        let report = CycleReport {
            cycle: 0,
            document_bytes: document.len(),
            history_bytes: history.len(),
            processes: sample.processes.len(),
        };
        let cycle = self.publisher.publish(document, history);
        CycleReport { cycle, ..report }
    }
}

/// Highest CPU first, ties broken by pid so the order is stable across equal readings.
fn top_processes(mut processes: Vec<ProcessSample>, limit: usize) -> Vec<ProcessSample> {
    processes.sort_by(|a, b| {
        b.cpu_percent
            .total_cmp(&a.cpu_percent)
            .then(a.pid.cmp(&b.pid))
    });
    processes.truncate(limit);
    processes
}

/// Sampler and shutdown signal for the loop.
pub struct WorkerDeps<C: Collector> {
    pub sampler: Sampler<C>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Loop timing and logging config.
pub struct WorkerConfig {
    pub sample_interval_ms: u64,
    /// How often to log sampler stats (real seconds).
    pub stats_log_interval_secs: u64,
}

/// Current unix time in seconds; 0 if the clock is before the epoch.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_else(|e| {
            tracing::warn!(
                error = %e,
                operation = "get_timestamp",
                "system time error"
            );
            0
        })
}

/// Runs cycles every `sample_interval_ms` until `shutdown_rx` fires. The first cycle runs one
/// interval after start; until then readers get the not-ready placeholders.
pub fn spawn<C: Collector + 'static>(
    deps: WorkerDeps<C>,
    config: WorkerConfig,
) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        sampler,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        sample_interval_ms,
        stats_log_interval_secs,
    } = config;

    let period = Duration::from_millis(sample_interval_ms.max(1));
    let stats_log_interval = Duration::from_secs(stats_log_interval_secs.max(1));
    let sampler = Arc::new(Mutex::new(sampler));
    let worker_span = tracing::debug_span!("sampler", sample_interval_ms);

    tokio::spawn(
        async move {
            let mut tick = interval_at(Instant::now() + period, period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut stats_log_tick =
                interval_at(Instant::now() + stats_log_interval, stats_log_interval);
            stats_log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let mut cycles_completed: u64 = 0;
            let mut cycles_failed: u64 = 0;
            let mut last_report: Option<CycleReport> = None;

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        let sampler = sampler.clone();
                        let result = tokio::task::spawn_blocking(move || {
                            // After a panicked cycle the ring still holds only whole entries.
                            let mut sampler = sampler.lock().unwrap_or_else(PoisonError::into_inner);
                            sampler.run_cycle(unix_now())
                        })
                        .await;
                        match result {
                            Ok(report) => {
                                cycles_completed += 1;
                                tracing::trace!(
                                    cycle = report.cycle,
                                    document_bytes = report.document_bytes,
                                    history_bytes = report.history_bytes,
                                    processes = report.processes,
                                    "cycle published"
                                );
                                last_report = Some(report);
                            }
                            Err(e) => {
                                cycles_failed += 1;
                                tracing::warn!(
                                    error = %e,
                                    operation = "run_cycle",
                                    "sampling cycle failed, keeping previous snapshot"
                                );
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Sampler shutting down");
                        break;
                    }
                    _ = stats_log_tick.tick() => {
                        tracing::info!(
                            cycles_completed,
                            cycles_failed,
                            last_document_bytes = last_report.map_or(0, |r| r.document_bytes),
                            last_history_bytes = last_report.map_or(0, |r| r.history_bytes),
                            "sampler stats"
                        );
                    }
                }
            }
        }
        .instrument(worker_span),
    )
}
