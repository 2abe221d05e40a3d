// NVIDIA GPU probe via nvidia-smi.

use super::ProbeError;
use crate::models::GpuSample;
use std::process::Command;

const NVIDIA_SMI: &str = "nvidia-smi";
const QUERY: &str = "--query-gpu=utilization.gpu,memory.total,memory.used,temperature.gpu,power.draw,clocks.current.graphics,name";
const FORMAT: &str = "--format=csv,noheader,nounits";

const MIB: u64 = 1024 * 1024;
// Per-field fallbacks when nvidia-smi answers but a column is unparsable (e.g. "[N/A]").
const FALLBACK_TOTAL_MIB: u64 = 8192;
const FALLBACK_TEMPERATURE: f64 = 40.0;
const FALLBACK_POWER: f64 = 30.0;
const FALLBACK_CLOCK_MHZ: u64 = 1500;

/// First GPU reported by nvidia-smi.
pub(super) fn query_nvidia_smi() -> Result<GpuSample, ProbeError> {
    let output = Command::new(NVIDIA_SMI)
        .args([QUERY, FORMAT])
        .output()
        .map_err(|e| ProbeError::Command {
            program: NVIDIA_SMI,
            detail: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(ProbeError::Command {
            program: NVIDIA_SMI,
            detail: format!("exited with {}", output.status),
        });
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or(ProbeError::Parse {
            source_name: NVIDIA_SMI,
            detail: "empty output".into(),
        })?;
    parse_nvidia_smi_line(line)
}

/// `usage, total MiB, used MiB, temperature, power, clock, name`. The name may contain commas.
pub(super) fn parse_nvidia_smi_line(line: &str) -> Result<GpuSample, ProbeError> {
    let parts: Vec<&str> = line.splitn(7, ',').map(str::trim).collect();
    if parts.len() < 7 {
        return Err(ProbeError::Parse {
            source_name: NVIDIA_SMI,
            detail: format!("expected 7 columns, got {}", parts.len()),
        });
    }
    Ok(GpuSample {
        usage: field(parts[0], "utilization.gpu", 0.0),
        memory_total: field(parts[1], "memory.total", FALLBACK_TOTAL_MIB).saturating_mul(MIB),
        memory_used: field(parts[2], "memory.used", 0u64).saturating_mul(MIB),
        temperature: field(parts[3], "temperature.gpu", FALLBACK_TEMPERATURE),
        power: field(parts[4], "power.draw", FALLBACK_POWER),
        clock_mhz: field(parts[5], "clocks.current.graphics", FALLBACK_CLOCK_MHZ),
        name: parts[6].to_string(),
    })
}

fn field<T: std::str::FromStr>(raw: &str, column: &'static str, fallback: T) -> T {
    raw.parse().unwrap_or_else(|_| {
        tracing::debug!(column, raw, "unparsable nvidia-smi column, using default");
        fallback
    })
}
