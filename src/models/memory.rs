/// Physical memory in bytes. `percentage` is recomputed by the encoder before it is published.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemorySample {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub cached: u64,
    pub percentage: f64,
}
