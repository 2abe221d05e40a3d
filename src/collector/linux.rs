// Linux-specific probes: /proc/stat and /proc/meminfo.

use super::ProbeError;
use crate::models::{CpuTicks, MemorySample};

const PROC_STAT: &str = "/proc/stat";
const PROC_MEMINFO: &str = "/proc/meminfo";

/// Aggregate `cpu` line plus one entry per `cpuN` line, in file order.
pub(super) fn read_cpu_ticks() -> Result<(CpuTicks, Vec<CpuTicks>), ProbeError> {
    let content = read(PROC_STAT)?;
    parse_proc_stat(&content)
}

pub(super) fn read_meminfo() -> Result<MemorySample, ProbeError> {
    let content = read(PROC_MEMINFO)?;
    parse_meminfo(&content)
}

fn read(path: &'static str) -> Result<String, ProbeError> {
    std::fs::read_to_string(path).map_err(|source| ProbeError::Io { path, source })
}

pub(super) fn parse_proc_stat(content: &str) -> Result<(CpuTicks, Vec<CpuTicks>), ProbeError> {
    let mut aggregate = None;
    let mut cores = Vec::new();
    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let Some(label) = fields.next() else {
            continue;
        };
        if label == "cpu" {
            aggregate = Some(parse_ticks(fields));
        } else if label
            .strip_prefix("cpu")
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        {
            cores.push(parse_ticks(fields));
        }
    }
    let aggregate = aggregate.ok_or(ProbeError::Parse {
        source_name: PROC_STAT,
        detail: "no aggregate cpu line".into(),
    })?;
    Ok((aggregate, cores))
}

/// Missing or malformed trailing columns (older kernels) read as 0.
fn parse_ticks<'a>(fields: impl Iterator<Item = &'a str>) -> CpuTicks {
    let mut v = [0u64; 10];
    for (slot, field) in v.iter_mut().zip(fields) {
        *slot = field.parse().unwrap_or(0);
    }
    CpuTicks {
        user: v[0],
        nice: v[1],
        system: v[2],
        idle: v[3],
        iowait: v[4],
        irq: v[5],
        softirq: v[6],
        steal: v[7],
        guest: v[8],
        guest_nice: v[9],
    }
}

/// Used memory is `MemTotal - MemAvailable` when the kernel reports it, otherwise
/// `MemTotal - MemFree - Buffers - Cached - SReclaimable`. Cached includes SReclaimable.
pub(super) fn parse_meminfo(content: &str) -> Result<MemorySample, ProbeError> {
    let mut total = None;
    let mut free = 0u64;
    let mut available = None;
    let mut buffers = 0u64;
    let mut cached = 0u64;
    let mut reclaimable = 0u64;

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(kib) = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
        else {
            continue;
        };
        match key {
            "MemTotal" => total = Some(kib),
            "MemFree" => free = kib,
            "MemAvailable" => available = Some(kib),
            "Buffers" => buffers = kib,
            "Cached" => cached = kib,
            "SReclaimable" => reclaimable = kib,
            _ => {}
        }
    }

    let total = total.filter(|t| *t > 0).ok_or(ProbeError::Parse {
        source_name: PROC_MEMINFO,
        detail: "MemTotal missing or zero".into(),
    })?;
    let used = match available {
        Some(a) => total.saturating_sub(a),
        None => total
            .saturating_sub(free)
            .saturating_sub(buffers)
            .saturating_sub(cached)
            .saturating_sub(reclaimable),
    }
    .min(total);

    Ok(MemorySample {
        total: total * 1024,
        used: used * 1024,
        free: free * 1024,
        cached: (cached + reclaimable) * 1024,
        percentage: used as f64 / total as f64 * 100.0,
    })
}
