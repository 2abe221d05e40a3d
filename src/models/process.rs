#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    /// Single-letter scheduler state (`R`, `S`, `D`, `Z`, ...), `?` when unknown.
    pub state: char,
    /// Resident set size in bytes.
    pub memory_bytes: u64,
    /// Share of total machine CPU time over the last interval.
    pub cpu_percent: f64,
    pub command: String,
}
