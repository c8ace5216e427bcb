//! Shared memory layout of the stats buffer.
//!
//! The buffer is a memory-mapped file: a small self-describing header
//! followed by one cache-line-aligned seqlock slot per site. The layout is
//! stable and part of the external mapping contract — a cooperating process
//! that maps the file decodes slots at [`RECORD_STRIDE`] starting at
//! [`slot_region_offset`].
//!
//! # Memory Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       StatsHeader                           │
//! │  ┌────────┬─────────┬────────────┬───────────┬───────────┐  │
//! │  │ magic  │ version │ site_count │ slot_size │ pass_seq  │  │
//! │  │ (8B)   │ (8B)    │ (8B)       │ (8B)      │ (8B atom) │  │
//! │  └────────┴─────────┴────────────┴───────────┴───────────┘  │
//! │                  (padded to slot alignment)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SeqlockSlot<SiteRecord>[0]   — version (8B) + record       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ...                                                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SeqlockSlot<SiteRecord>[site_count - 1]                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  zero padding up to the next page boundary                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The total file length is always rounded up to the platform page size so
//! the whole region can be handed out page-granular to external mappers.

use crate::seqlock::SeqlockSlot;
use fonstat_records::SiteRecord;
use std::mem::{align_of, size_of};
use std::sync::atomic::AtomicU64;

/// Magic number identifying a valid stats buffer file.
///
/// ASCII encoding of "FONSTAT1".
pub const STATS_MAGIC: u64 = 0x464F_4E53_5441_5431;

/// Current buffer format version. Readers reject a mismatch.
pub const LAYOUT_VERSION: u64 = 1;

/// Name of the published stats file inside the registration namespace.
pub const STATS_FILE_NAME: &str = "stats.shm";

/// Byte distance between two consecutive site slots in the mapped region.
pub const RECORD_STRIDE: usize = size_of::<SeqlockSlot<SiteRecord>>();

/// Header at offset 0 of the mapped region.
///
/// `#[repr(C)]` keeps the field order and alignment predictable for
/// cross-process access.
#[repr(C)]
pub struct StatsHeader {
    /// Must equal [`STATS_MAGIC`].
    pub magic: u64,

    /// Must equal [`LAYOUT_VERSION`].
    pub version: u64,

    /// Number of site slots following the header. Fixed at initialization.
    pub site_count: u64,

    /// `size_of::<SeqlockSlot<SiteRecord>>()` at write time; readers verify
    /// it so a record-layout drift between binaries is caught up front.
    pub slot_size: u64,

    /// Count of completed update passes. The writer bumps it once per pass;
    /// pollers can use it as a cheap liveness/novelty signal.
    pub pass_seq: AtomicU64,
}

impl StatsHeader {
    /// Validates a header read from a mapped file.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.magic != STATS_MAGIC {
            return Err("bad magic");
        }
        if self.version != LAYOUT_VERSION {
            return Err("unsupported layout version");
        }
        if self.site_count == 0 {
            return Err("empty site registry");
        }
        if self.slot_size as usize != RECORD_STRIDE {
            return Err("slot size mismatch");
        }
        Ok(())
    }
}

/// Offset of the first site slot.
///
/// The header is padded out to the slot alignment so every slot's atomic
/// version counter lands on its natural boundary (the mapping itself is
/// page-aligned).
pub const fn slot_region_offset() -> usize {
    let align = align_of::<SeqlockSlot<SiteRecord>>();
    (size_of::<StatsHeader>() + align - 1) / align * align
}

/// Offset of site slot `i`.
pub const fn slot_offset(i: usize) -> usize {
    slot_region_offset() + i * RECORD_STRIDE
}

/// Total mapped length for `site_count` sites: header plus slots, rounded up
/// to the platform page size.
pub fn total_bytes(site_count: usize) -> usize {
    fonstat_mmap::round_up_to_page(slot_region_offset() + site_count * RECORD_STRIDE)
}
