//! Safe read path over the stats buffer.
//!
//! A `StatsReader` maps the published file read-only and copies records out
//! through the bounded-retry seqlock protocol. When a slot stays contended
//! past the retry budget, the reader serves its last successfully copied
//! snapshot for that slot instead of blocking — a reader can therefore never
//! be wedged by the writer, and never surfaces a torn record.

use crate::layout::{self, StatsHeader};
use crate::seqlock::SeqlockSlot;
use fonstat_mmap::MmapFile;
use fonstat_records::SiteRecord;
use std::io;
use std::path::Path;

/// Retry budget for one record read. Generous against a 1 Hz writer; small
/// enough that a read stays bounded in the worst case.
pub const MAX_READ_RETRIES: u32 = 64;

/// Snapshot reader over a published stats buffer.
///
/// Each instance keeps an independent per-slot fallback cache, so readers
/// are isolated from each other and from the writer.
#[derive(Debug)]
pub struct StatsReader {
    /// Owns the mmap lifetime.
    _mm: MmapFile,
    /// Raw pointer to the start of the mapped region (read-only).
    base: *const u8,
    /// Slot count from the validated header.
    site_count: usize,
    /// Last consistent snapshot per slot, served when retries run out.
    last_good: Vec<SiteRecord>,
}

// SAFETY: the reader only ever loads through atomics plus bitwise copies and
// owns its mapping; moving it to another thread is sound. Not Sync because
// the fallback cache is mutated on reads.
unsafe impl Send for StatsReader {}

impl StatsReader {
    /// Opens and validates a published stats buffer.
    ///
    /// # Errors
    /// - `NotFound` if the buffer has not been published yet
    /// - `InvalidData` if the file is not a stats buffer, is truncated, or
    ///   was written with a different record layout
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mm = MmapFile::open_ro(path)?;
        if mm.len() < layout::slot_region_offset() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "file too small for stats header",
            ));
        }
        let base = mm.as_ptr();

        // SAFETY: length was checked to cover the header; validate() rejects
        // foreign content before any slot access.
        let header = unsafe { &*(base as *const StatsHeader) };
        header
            .validate()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let site_count = header.site_count as usize;
        if mm.len() < layout::slot_offset(site_count - 1) + layout::RECORD_STRIDE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "file truncated below declared site count",
            ));
        }

        let mut reader = Self {
            _mm: mm,
            base,
            site_count,
            last_good: vec![SiteRecord::default(); site_count],
        };

        // Seed the fallback cache. The buffer owner wrote every slot before
        // publishing, so these first copies virtually always succeed.
        for i in 0..site_count {
            if let Some(rec) = reader.slot(i).try_read(MAX_READ_RETRIES) {
                reader.last_good[i] = rec;
            }
        }

        Ok(reader)
    }

    #[inline(always)]
    fn slot(&self, i: usize) -> &SeqlockSlot<SiteRecord> {
        // SAFETY: i < site_count and the mapping covers all declared slots
        unsafe {
            let slots =
                self.base.add(layout::slot_region_offset()) as *const SeqlockSlot<SiteRecord>;
            &*slots.add(i)
        }
    }

    /// Copies one site's current record.
    ///
    /// Always returns a self-consistent snapshot: either the freshly copied
    /// record, or — after the retry budget is exhausted — the last snapshot
    /// this reader successfully copied for the slot.
    ///
    /// # Panics
    /// Panics if `site_index >= site_count()`.
    pub fn read(&mut self, site_index: usize) -> SiteRecord {
        assert!(site_index < self.site_count, "site index out of range");
        match self.slot(site_index).try_read(MAX_READ_RETRIES) {
            Some(rec) => {
                self.last_good[site_index] = rec;
                rec
            }
            None => self.last_good[site_index],
        }
    }

    /// Copies every record in registry order. Per-record consistency only;
    /// two records in one snapshot may come from different writer passes.
    pub fn snapshot_all(&mut self) -> Vec<SiteRecord> {
        (0..self.site_count).map(|i| self.read(i)).collect()
    }

    pub fn site_count(&self) -> usize {
        self.site_count
    }

    /// Completed update passes, from the shared header.
    pub fn passes(&self) -> u64 {
        // SAFETY: header validated in open()
        let header = unsafe { &*(self.base as *const StatsHeader) };
        header.pass_seq.load(std::sync::atomic::Ordering::Acquire)
    }
}
