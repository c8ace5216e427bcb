//! Shared fixtures for the stats-bus benchmarks.

use fonstat_records::SiteRecord;

/// Unique /tmp path per benchmark so parallel runs don't collide.
pub fn bench_buffer_path(tag: &str) -> String {
    format!("/tmp/fonstat_bench_{tag}_{}", std::process::id())
}

/// The default four-site registry used across benches.
pub fn default_records() -> Vec<SiteRecord> {
    ["MicrosoftDC", "Dallas", "Dobbins", "Stone"]
        .iter()
        .map(|name| SiteRecord::initial(name, 0, 1000, 50.0))
        .collect()
}
