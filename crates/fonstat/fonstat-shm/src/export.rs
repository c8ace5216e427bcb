//! Zero-copy export of the stats buffer.
//!
//! A cooperating process maps the published file directly into its own
//! address space and polls records in place, with no per-read syscall or
//! copy through the publisher. The mapping is established **read-only**:
//! only the publisher's update timer ever mutates the buffer, and the
//! export path enforces that instead of trusting mappers to cooperate.
//!
//! # Consistency obligation
//!
//! The seqlock version counters live inside the mapped memory itself, so a
//! mapper that decodes raw bytes at [`crate::RECORD_STRIDE`] **must**
//! replicate the bounded-retry discipline (sample version, copy, re-sample;
//! odd or changed version means torn) or it will eventually observe records
//! whose fields mix two commits. [`StatsMapping::read_record`] implements
//! that discipline; use it, or mirror it exactly in foreign decoders.

use crate::layout::{self, StatsHeader};
use crate::reader::MAX_READ_RETRIES;
use crate::seqlock::SeqlockSlot;
use fonstat_mmap::MmapFile;
use fonstat_records::SiteRecord;
use std::fs;
use std::io;
use std::path::Path;

/// A direct, read-only mapping of the stats buffer (or a prefix of it).
#[derive(Debug)]
pub struct StatsMapping {
    mm: MmapFile,
    /// Slot count from the header, or 0 when the mapped prefix is too short
    /// to contain one.
    site_count: usize,
}

impl StatsMapping {
    /// Maps `requested_len` bytes of the published buffer, or the whole
    /// buffer when `None`.
    ///
    /// Prefix mappings are permitted; records wholly inside the prefix stay
    /// readable through [`read_record`](Self::read_record).
    ///
    /// # Errors
    /// - `NotFound` — the buffer has not been allocated/published yet
    /// - `InvalidInput` — `requested_len` is zero or exceeds the total
    ///   buffer size
    /// - `InvalidData` — the file exists but is not a valid stats buffer
    ///   (only checked when the header is inside the mapped prefix)
    pub fn map<P: AsRef<Path>>(path: P, requested_len: Option<usize>) -> io::Result<Self> {
        let path = path.as_ref();
        let total = fs::metadata(path)?.len() as usize;

        let len = requested_len.unwrap_or(total);
        if len > total {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "requested mapping length exceeds stats buffer size",
            ));
        }
        // A zero-length mapping has no readable content; reject it up front
        // rather than surfacing whatever the platform mmap says.
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "zero-length stats mapping",
            ));
        }

        let mm = MmapFile::open_ro_prefix(path, len)?;

        let site_count = if len >= layout::slot_region_offset() {
            // SAFETY: the mapped prefix covers the header.
            let header = unsafe { &*(mm.as_ptr() as *const StatsHeader) };
            header
                .validate()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            header.site_count as usize
        } else {
            0
        };

        Ok(Self { mm, site_count })
    }

    /// Raw view of the mapped bytes. Decoding records from this slice
    /// without the retry discipline documented above is a consistency bug.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.mm.as_bytes()
    }

    /// Mapped length in bytes (≤ total buffer size).
    #[inline]
    pub fn len(&self) -> usize {
        self.mm.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mm.len() == 0
    }

    /// Site count declared by the buffer header, 0 for a header-less prefix.
    #[inline]
    pub fn site_count(&self) -> usize {
        self.site_count
    }

    /// Completed update passes, or `None` for a header-less prefix.
    pub fn passes(&self) -> Option<u64> {
        if self.mm.len() < layout::slot_region_offset() {
            return None;
        }
        // SAFETY: header covered and validated in map()
        let header = unsafe { &*(self.mm.as_ptr() as *const StatsHeader) };
        Some(header.pass_seq.load(std::sync::atomic::Ordering::Acquire))
    }

    /// Copies one record out of the mapping with the bounded-retry seqlock
    /// discipline.
    ///
    /// Returns `None` when the slot lies (partly) outside the mapped prefix,
    /// the index is out of range, or the retry budget was exhausted against
    /// a concurrent commit. The mapping keeps no fallback cache — a polling
    /// caller holds on to its own previous snapshot instead.
    pub fn read_record(&self, site_index: usize) -> Option<SiteRecord> {
        if site_index >= self.site_count {
            return None;
        }
        let end = layout::slot_offset(site_index) + layout::RECORD_STRIDE;
        if end > self.mm.len() {
            return None;
        }

        // SAFETY: the slot is wholly inside the mapped, validated region and
        // slot offsets preserve the slot type's alignment.
        let slot = unsafe {
            &*(self
                .mm
                .as_ptr()
                .add(layout::slot_offset(site_index)) as *const SeqlockSlot<SiteRecord>)
        };
        slot.try_read(MAX_READ_RETRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::StatsWriter;

    fn tmp_path(tag: &str) -> String {
        format!("/tmp/fonstat_export_{tag}_{}", std::process::id())
    }

    fn defaults() -> Vec<SiteRecord> {
        ["MicrosoftDC", "Dallas", "Dobbins", "Stone"]
            .iter()
            .map(|name| SiteRecord::initial(name, 100, 1000, 50.0))
            .collect()
    }

    #[test]
    fn map_before_publish_is_not_ready() {
        let err = StatsMapping::map("/tmp/fonstat_export_missing", None).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn oversized_mapping_is_rejected_regardless_of_content() {
        let path = tmp_path("oversize");
        let writer = StatsWriter::create(&path, &defaults()).unwrap();

        let err = StatsMapping::map(&path, Some(writer.total_bytes() + 1)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        drop(writer);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn zero_length_mapping_is_rejected() {
        let path = tmp_path("zero");
        let _writer = StatsWriter::create(&path, &defaults()).unwrap();
        let err = StatsMapping::map(&path, Some(0)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn full_mapping_reads_every_record() {
        let path = tmp_path("full");
        let mut writer = StatsWriter::create(&path, &defaults()).unwrap();
        writer.commit(2, SiteRecord::initial("Dobbins", 200, 1500, 75.0));
        writer.complete_pass();

        let mapping = StatsMapping::map(&path, None).unwrap();
        assert_eq!(mapping.site_count(), 4);
        assert_eq!(mapping.len(), writer.total_bytes());
        assert_eq!(mapping.passes(), Some(1));

        for i in 0..4 {
            let rec = mapping.read_record(i).expect("idle buffer must read");
            assert!(rec.checksum_ok());
        }
        assert_eq!(mapping.read_record(2).unwrap().throughput_gbps, 1500);
        assert!(mapping.read_record(4).is_none());

        drop(writer);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn prefix_mapping_serves_only_covered_slots() {
        let path = tmp_path("prefix");
        let _writer = StatsWriter::create(&path, &defaults()).unwrap();

        // Cover the header and the first two slots only.
        let len = layout::slot_offset(1) + layout::RECORD_STRIDE;
        let mapping = StatsMapping::map(&path, Some(len)).unwrap();
        assert_eq!(mapping.len(), len);
        assert!(mapping.read_record(0).is_some());
        assert!(mapping.read_record(1).is_some());
        assert!(mapping.read_record(2).is_none());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn header_less_prefix_is_raw_bytes_only() {
        let path = tmp_path("headerless");
        let _writer = StatsWriter::create(&path, &defaults()).unwrap();

        let mapping = StatsMapping::map(&path, Some(16)).unwrap();
        assert_eq!(mapping.site_count(), 0);
        assert_eq!(mapping.passes(), None);
        assert!(mapping.read_record(0).is_none());
        assert_eq!(mapping.as_bytes().len(), 16);

        let _ = std::fs::remove_file(&path);
    }
}
