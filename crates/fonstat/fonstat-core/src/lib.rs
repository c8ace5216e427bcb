pub mod registry;
pub mod source;

pub use registry::{SiteEntry, SiteRegistry};
pub use source::{Reading, ReadingSource, SimulatedSource, SourceError};

/// Derived utilization: `throughput / capacity × 100`, clamped to [0, 100].
///
/// A zero capacity cannot come from a validated config; guard anyway so a
/// hand-built registry can't produce NaN/inf in the shared buffer.
#[inline]
pub fn utilization_percent(throughput_gbps: u32, capacity_gbps: u32) -> f32 {
    if capacity_gbps == 0 {
        return 0.0;
    }
    ((throughput_gbps as f32 / capacity_gbps as f32) * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utilization_is_clamped() {
        assert_eq!(utilization_percent(1000, 2000), 50.0);
        assert_eq!(utilization_percent(3000, 2000), 100.0);
        assert_eq!(utilization_percent(0, 2000), 0.0);
        assert_eq!(utilization_percent(1000, 0), 0.0);
    }
}
