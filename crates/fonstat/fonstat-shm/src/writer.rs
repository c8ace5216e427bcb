//! Writer side of the stats buffer.
//!
//! Exactly one `StatsWriter` exists per buffer file. It allocates and
//! default-initializes every slot at creation time, and is afterwards the
//! only mutator: the update timer calls [`StatsWriter::commit`] once per
//! site per pass. Readers are never blocked — the seqlock protocol in each
//! slot carries all synchronization.

use crate::layout::{self, LAYOUT_VERSION, RECORD_STRIDE, STATS_MAGIC, StatsHeader};
use crate::seqlock::SeqlockSlot;
use fonstat_mmap::MmapFileMut;
use fonstat_records::SiteRecord;
use std::io;
use std::path::Path;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Owner of the mapped stats buffer and its single mutation path.
#[derive(Debug)]
pub struct StatsWriter {
    /// Owns the mmap lifetime; the buffer is freed when the writer drops.
    _mm: MmapFileMut,
    /// Raw pointer to the start of the mapped region (header location).
    base: *mut u8,
    /// Slot count, fixed at creation.
    site_count: usize,
    /// Mapped length, page-rounded.
    total_bytes: usize,
}

// SAFETY: the writer is the sole handle on the mutable mapping; sending it
// to the update-timer thread transfers that exclusive ownership whole. It is
// intentionally not Sync — one mutator, ever.
unsafe impl Send for StatsWriter {}

impl StatsWriter {
    /// Creates the buffer file sized for `defaults.len()` sites and writes
    /// every slot's initial record before returning.
    ///
    /// The file is fully initialized when this returns, so the caller may
    /// publish it to readers immediately. Fails with `InvalidInput` on an
    /// empty registry.
    pub fn create<P: AsRef<Path>>(path: P, defaults: &[SiteRecord]) -> io::Result<Self> {
        if defaults.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "stats buffer needs at least one site",
            ));
        }

        let total = layout::total_bytes(defaults.len());
        let mut mm = MmapFileMut::create_rw(path, total as u64)?;
        let base = mm.as_mut_ptr();

        // SAFETY: the region was just created exclusively and is sized by
        // layout::total_bytes for the header plus all slots.
        unsafe {
            let h = base as *mut StatsHeader;
            ptr::write(
                h,
                StatsHeader {
                    magic: STATS_MAGIC,
                    version: LAYOUT_VERSION,
                    site_count: defaults.len() as u64,
                    slot_size: RECORD_STRIDE as u64,
                    pass_seq: AtomicU64::new(0),
                },
            );

            let slots = base.add(layout::slot_region_offset()) as *mut SeqlockSlot<SiteRecord>;
            for (i, rec) in defaults.iter().enumerate() {
                let slot = &mut *slots.add(i);
                slot.init();
                let mut sealed = *rec;
                sealed.checksum = sealed.compute_checksum();
                slot.write(sealed);
            }
        }

        Ok(Self {
            _mm: mm,
            base,
            site_count: defaults.len(),
            total_bytes: total,
        })
    }

    #[inline(always)]
    fn header(&self) -> &StatsHeader {
        // SAFETY: base points to the header we initialized in create()
        unsafe { &*(self.base as *const StatsHeader) }
    }

    #[inline(always)]
    fn slot_mut(&mut self, i: usize) -> &mut SeqlockSlot<SiteRecord> {
        // SAFETY: i was bounds-checked by the caller against site_count
        unsafe {
            let slots = self.base.add(layout::slot_region_offset()) as *mut SeqlockSlot<SiteRecord>;
            &mut *slots.add(i)
        }
    }

    /// Commits one site's record through the seqlock protocol.
    ///
    /// Seals the record with a fresh checksum first, so any reader can verify
    /// a copied snapshot against its own payload. Never blocks.
    ///
    /// # Panics
    /// Panics if `site_index` is outside the registry; indices come from
    /// registry iteration and an out-of-range index is a programming error.
    #[inline(always)]
    pub fn commit(&mut self, site_index: usize, mut record: SiteRecord) {
        assert!(site_index < self.site_count, "site index out of range");
        record.checksum = record.compute_checksum();
        self.slot_mut(site_index).write(record);
    }

    /// Marks one full update pass as complete. Pollers watching `pass_seq`
    /// see it advance after all of the pass's commits are visible.
    #[inline(always)]
    pub fn complete_pass(&self) {
        self.header().pass_seq.fetch_add(1, Ordering::Release);
    }

    pub fn site_count(&self) -> usize {
        self.site_count
    }

    /// Page-rounded length of the mapped buffer.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }
}
