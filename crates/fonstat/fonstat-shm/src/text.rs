//! Human-readable text view of the stats buffer.
//!
//! Stateless per invocation: every call walks the registry through the safe
//! read path and renders an independent snapshot. The field order and block
//! shape are fixed and consumed by downstream tooling — change them only as
//! a deliberate interface break.

use crate::reader::StatsReader;
use std::fmt::Write;

/// Renders every current record as one text block per site, in registry
/// order, separated by blank lines.
pub fn render(reader: &mut StatsReader) -> String {
    let mut out = String::new();
    out.push_str("FONSTAT Monitoring Data\n");
    out.push_str("=======================\n");

    for i in 0..reader.site_count() {
        let rec = reader.read(i);
        let _ = writeln!(out, "Site: {}", rec.name());
        let _ = writeln!(out, "  Timestamp: {}", rec.timestamp);
        let _ = writeln!(out, "  Throughput: {} Gbps", rec.throughput_gbps);
        let _ = writeln!(out, "  Errors: {}", rec.error_count);
        let _ = writeln!(out, "  BER Errors: {}", rec.ber_error_count);
        let _ = writeln!(out, "  Utilization: {:.2}%", rec.utilization_percent);
        let _ = writeln!(out, "  Link Status: {}", rec.link_status().as_str());
        out.push('\n');
    }

    out
}
