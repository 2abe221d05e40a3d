use crate::encoder::{
    DEFAULT_GPU_MEMORY_CEILING, DEFAULT_GPU_MEMORY_TOTAL, DEFAULT_MAX_DOCUMENT_BYTES,
    DEFAULT_MAX_HISTORY_BYTES, EncoderLimits, GpuLimits, MIN_DOCUMENT_BYTES, MIN_HISTORY_BYTES,
};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::worker::{DEFAULT_MAX_PROCESSES, DEFAULT_SAMPLE_INTERVAL_MS, SamplerConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub interval_ms: u64,
    /// Number of cycles kept for /api/history.
    pub history_capacity: usize,
    /// Top-CPU processes included in each snapshot.
    pub max_processes: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_processes: DEFAULT_MAX_PROCESSES,
        }
    }
}

impl SamplingConfig {
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            history_capacity: self.history_capacity,
            max_processes: self.max_processes,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub max_document_bytes: usize,
    pub max_history_bytes: usize,
    /// GPU memory totals above this are treated as bogus readings.
    pub gpu_memory_ceiling_bytes: u64,
    /// Replacement total when no plausible reading has been seen yet.
    pub gpu_default_memory_total_bytes: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            max_history_bytes: DEFAULT_MAX_HISTORY_BYTES,
            gpu_memory_ceiling_bytes: DEFAULT_GPU_MEMORY_CEILING,
            gpu_default_memory_total_bytes: DEFAULT_GPU_MEMORY_TOTAL,
        }
    }
}

impl EncoderConfig {
    pub fn limits(&self) -> EncoderLimits {
        EncoderLimits {
            max_document_bytes: self.max_document_bytes,
            max_history_bytes: self.max_history_bytes,
            gpu: GpuLimits {
                memory_ceiling: self.gpu_memory_ceiling_bytes,
                default_memory_total: self.gpu_default_memory_total_bytes,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// How often to log sampler stats (cycles completed, last document sizes) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            stats_log_interval_secs: 60,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.sampling.interval_ms > 0,
            "sampling.interval_ms must be > 0, got {}",
            self.sampling.interval_ms
        );
        anyhow::ensure!(
            self.sampling.history_capacity > 0,
            "sampling.history_capacity must be > 0, got {}",
            self.sampling.history_capacity
        );
        anyhow::ensure!(
            self.sampling.max_processes > 0,
            "sampling.max_processes must be > 0, got {}",
            self.sampling.max_processes
        );
        anyhow::ensure!(
            self.encoder.max_document_bytes >= MIN_DOCUMENT_BYTES,
            "encoder.max_document_bytes must be >= {}, got {}",
            MIN_DOCUMENT_BYTES,
            self.encoder.max_document_bytes
        );
        anyhow::ensure!(
            self.encoder.max_history_bytes >= MIN_HISTORY_BYTES,
            "encoder.max_history_bytes must be >= {}, got {}",
            MIN_HISTORY_BYTES,
            self.encoder.max_history_bytes
        );
        anyhow::ensure!(
            self.encoder.gpu_default_memory_total_bytes > 0
                && self.encoder.gpu_default_memory_total_bytes
                    <= self.encoder.gpu_memory_ceiling_bytes,
            "encoder.gpu_default_memory_total_bytes must be > 0 and <= encoder.gpu_memory_ceiling_bytes ({}), got {}",
            self.encoder.gpu_memory_ceiling_bytes,
            self.encoder.gpu_default_memory_total_bytes
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
