//! Seqlock (sequence lock) slot for lock-free single-writer, multi-reader access.
//!
//! Each telemetry record in the stats buffer is wrapped in one of these slots.
//! The writer increments a version counter before and after overwriting the
//! record; readers detect a concurrent overwrite by checking whether the
//! version was odd or changed across their copy.
//!
//! # Protocol
//!
//! **Writer:**
//! 1. Increment version to odd (signals "write in progress")
//! 2. Write the record fields
//! 3. Increment version to even (signals "write complete")
//!
//! **Reader:**
//! 1. Read version; if odd, the write is in flight — count a retry
//! 2. Copy the record
//! 3. Read version again; if it changed, the copy is torn — count a retry
//! 4. After a bounded number of retries, give up and let the caller fall
//!    back to its last good snapshot
//!
//! The bounded retry is what keeps readers non-blocking: a stalled or
//! misbehaving writer can never wedge a reader in an unbounded spin.

use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

/// A record slot protected by a sequence lock.
///
/// `T` must be `Copy` so a snapshot is a plain bitwise copy with no partial
/// destruction hazards. The slot is cache-line aligned so adjacent sites do
/// not false-share.
///
/// # Memory Layout
///
/// ```text
/// ┌──────────────────────┬──────────────────┐
/// │  version: AtomicU64  │  data: T         │
/// │  (8 bytes)           │  (size_of::<T>)  │
/// └──────────────────────┴──────────────────┘
/// ```
///
/// # Version Semantics
///
/// - **Even**: record is stable, safe to copy
/// - **Odd**: overwrite in progress
#[repr(C, align(64))]
pub struct SeqlockSlot<T: Copy> {
    /// Version counter: odd = write in progress, even = stable.
    version: AtomicU64,
    /// The record. `MaybeUninit` because the slot is carved out of raw
    /// mapped memory; the buffer owner writes every slot before publishing.
    data: MaybeUninit<T>,
}

impl<T: Copy> SeqlockSlot<T> {
    /// Resets the slot to a clean state (version 0 = stable).
    ///
    /// Called once by the buffer owner before the first `write()`. The data
    /// field stays uninitialized until then, which is why the buffer must
    /// not be published to readers before every slot has been written.
    #[inline(always)]
    pub fn init(&mut self) {
        self.version.store(0, Ordering::Relaxed);
    }

    /// Overwrites the record using the seqlock protocol.
    ///
    /// Only the single buffer owner may call this; two concurrent writers on
    /// one slot would race on the version counter. The `Release` stores on
    /// the version guarantee that a reader observing the final even value
    /// also observes the complete record.
    #[inline(always)]
    pub fn write(&mut self, value: T) {
        let v0 = self.version.load(Ordering::Relaxed);
        // Mark write-in-progress (odd)
        self.version.store(v0.wrapping_add(1), Ordering::Release);
        // SAFETY: exclusive write access through &mut self; the pointer is
        // valid for the slot's lifetime inside the mapping.
        unsafe { self.data.as_mut_ptr().write(value) };
        // Mark write-complete (even)
        self.version.store(v0.wrapping_add(2), Ordering::Release);
    }

    /// Attempts to copy a consistent snapshot, retrying at most `max_retries`
    /// times.
    ///
    /// Returns `None` when every attempt raced with an in-flight write. The
    /// caller is expected to fall back to its previous snapshot rather than
    /// spin further; this keeps the read path strictly bounded.
    ///
    /// `Acquire` loads on the version synchronize with the writer's `Release`
    /// stores, so a stable version pair proves the copied bytes all belong to
    /// one commit.
    #[inline(always)]
    pub fn try_read(&self, max_retries: u32) -> Option<T> {
        for _ in 0..=max_retries {
            let v1 = self.version.load(Ordering::Acquire);
            if (v1 & 1) == 1 {
                // Overwrite in flight
                std::hint::spin_loop();
                continue;
            }

            // SAFETY: the buffer owner wrote every slot before publishing,
            // so the data is initialized; consistency is verified below.
            let snapshot = unsafe { self.data.as_ptr().read() };

            let v2 = self.version.load(Ordering::Acquire);
            if v1 == v2 {
                return Some(snapshot);
            }

            // Torn copy, retry
            std::hint::spin_loop();
        }
        None
    }
}
