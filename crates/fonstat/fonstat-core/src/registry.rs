//! Fixed site registry.
//!
//! The registry is built once at initialization and never changes for the
//! process lifetime. A site's position in the registry is its slot index in
//! the shared stats buffer, so registry order is part of the external
//! interface.

/// One monitored fiber-link endpoint.
#[derive(Debug, Clone)]
pub struct SiteEntry {
    pub name: String,
    /// Link capacity in Gbps, the denominator for utilization.
    pub capacity_gbps: u32,
}

/// Ordered, immutable list of monitored sites.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    entries: Vec<SiteEntry>,
}

impl SiteRegistry {
    /// Builds a registry from entries already validated by the config layer.
    pub fn new(entries: Vec<SiteEntry>) -> Self {
        debug_assert!(!entries.is_empty(), "registry must not be empty");
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SiteEntry> {
        self.entries.get(index)
    }

    /// Sites in slot-index order.
    pub fn iter(&self) -> impl Iterator<Item = &SiteEntry> {
        self.entries.iter()
    }
}
