//! Pluggable reading source.
//!
//! The update timer is polymorphic over where readings come from: the
//! simulated source below for development, or a real driver callback wired
//! in through the same trait. Swapping the source never touches the buffer
//! or the consistency protocol.

use crate::registry::SiteEntry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One sampled observation for one site.
///
/// Error fields are *increments* over the previous pass; the timer folds
/// them into the cumulative counters so those stay monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub throughput_gbps: u32,
    pub error_increment: u32,
    pub ber_increment: u32,
}

/// A failed sample for one site. Non-fatal by contract: the timer records
/// the site as DOWN and moves on to the next site in the same pass.
#[derive(Debug, thiserror::Error)]
#[error("reading source failed for site {site_index} ('{site_name}'): {reason}")]
pub struct SourceError {
    pub site_index: usize,
    pub site_name: String,
    pub reason: String,
}

/// Capability that produces the next reading for a site.
///
/// `Send` because the update timer owns the source on its own thread.
pub trait ReadingSource: Send {
    fn sample(&mut self, site_index: usize, site: &SiteEntry) -> Result<Reading, SourceError>;
}

/// Development source producing plausible fiber-link readings:
/// throughput 800..2000 Gbps, 0..3 new errors and 0..2 new BER errors per
/// pass.
pub struct SimulatedSource {
    rng: StdRng,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic variant for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingSource for SimulatedSource {
    fn sample(&mut self, _site_index: usize, _site: &SiteEntry) -> Result<Reading, SourceError> {
        Ok(Reading {
            throughput_gbps: self.rng.gen_range(800..2000),
            error_increment: self.rng.gen_range(0..3),
            ber_increment: self.rng.gen_range(0..2),
        })
    }
}
