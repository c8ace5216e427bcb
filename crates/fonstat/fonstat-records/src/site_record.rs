// Fixed-layout per-site telemetry record shared between the publisher and
// every reader. The struct is POD (Copy, repr(C), no padding surprises) so it
// can live in a memory-mapped buffer and be decoded by external processes at
// a fixed stride.

/// Maximum site name length including the NUL padding byte.
pub const SITE_NAME_LEN: usize = 32;

/// Link state of a monitored fiber endpoint.
///
/// Stored in the record as a raw `u32` (1 = up, 0 = down) so the on-disk
/// layout stays a plain integer; this enum is the API-edge view of it.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    Down = 0,
    Up = 1,
}

impl LinkStatus {
    /// Decodes the raw stored word. Any nonzero value counts as up.
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        if raw != 0 { LinkStatus::Up } else { LinkStatus::Down }
    }

    /// Status word used by the text view.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            LinkStatus::Up => "UP",
            LinkStatus::Down => "DOWN",
        }
    }
}

/// One site's telemetry snapshot.
///
/// 96 bytes, align 8. The layout is part of the external mapping contract:
/// a cooperating process that maps the stats buffer decodes records at this
/// exact shape. `checksum` is redundant with the payload fields — the writer
/// recomputes it on every commit, so any reader can verify that a snapshot
/// it copied out is internally consistent (not torn).
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct SiteRecord {
    /// NUL-padded UTF-8 site name, stable for the registry lifetime.
    pub site_name: [u8; SITE_NAME_LEN],
    /// Seconds since the Unix epoch at the last update pass.
    pub timestamp: u64,
    /// Last observed throughput in Gbps.
    pub throughput_gbps: u32,
    /// Cumulative error counter. Never decreases within one buffer lifetime.
    pub error_count: u32,
    /// Cumulative bit-error-rate counter. Never decreases within one buffer lifetime.
    pub ber_error_count: u32,
    /// Raw link status word: 1 = UP, 0 = DOWN.
    pub link_status: u32,
    /// Derived utilization, always clamped to [0, 100].
    pub utilization_percent: f32,
    /// FNV-1a over every payload field above. Written by the publisher only.
    pub checksum: u32,
    /// Extension space, zeroed.
    pub reserved: [u32; 7],
}

impl Default for SiteRecord {
    fn default() -> Self {
        Self {
            site_name: [0; SITE_NAME_LEN],
            timestamp: 0,
            throughput_gbps: 0,
            error_count: 0,
            ber_error_count: 0,
            link_status: LinkStatus::Up as u32,
            utilization_percent: 0.0,
            checksum: 0,
            reserved: [0; 7],
        }
    }
}

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

impl SiteRecord {
    /// Builds the default-initialized record a site carries before its first
    /// update pass: link up, counters zero, utilization derived from the
    /// initial throughput.
    pub fn initial(name: &str, timestamp: u64, throughput_gbps: u32, utilization_percent: f32) -> Self {
        let mut rec = Self {
            timestamp,
            throughput_gbps,
            utilization_percent: utilization_percent.clamp(0.0, 100.0),
            ..Self::default()
        };
        rec.set_name(name);
        rec
    }

    /// Copies `name` into the fixed-size field, truncating to 31 bytes so at
    /// least one NUL terminator always remains.
    pub fn set_name(&mut self, name: &str) {
        self.site_name = [0; SITE_NAME_LEN];
        let bytes = name.as_bytes();
        let n = bytes.len().min(SITE_NAME_LEN - 1);
        self.site_name[..n].copy_from_slice(&bytes[..n]);
    }

    /// Site name with NUL padding stripped. Returns an empty string if the
    /// stored bytes are not valid UTF-8 (possible only if a foreign writer
    /// scribbled on the buffer).
    pub fn name(&self) -> &str {
        let end = self
            .site_name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(SITE_NAME_LEN);
        std::str::from_utf8(&self.site_name[..end]).unwrap_or("")
    }

    #[inline]
    pub fn link_status(&self) -> LinkStatus {
        LinkStatus::from_raw(self.link_status)
    }

    #[inline]
    pub fn set_link_status(&mut self, status: LinkStatus) {
        self.link_status = status as u32;
    }

    /// FNV-1a over every payload field, in declaration order. The float is
    /// hashed through its bit pattern. `checksum` and `reserved` are excluded.
    pub fn compute_checksum(&self) -> u32 {
        let mut h = FNV_OFFSET;
        let mut step = |bytes: &[u8]| {
            for &b in bytes {
                h ^= b as u32;
                h = h.wrapping_mul(FNV_PRIME);
            }
        };
        step(&self.site_name);
        step(&self.timestamp.to_le_bytes());
        step(&self.throughput_gbps.to_le_bytes());
        step(&self.error_count.to_le_bytes());
        step(&self.ber_error_count.to_le_bytes());
        step(&self.link_status.to_le_bytes());
        step(&self.utilization_percent.to_bits().to_le_bytes());
        h
    }

    /// True when the stored checksum matches the payload. A mismatch means
    /// the bytes were copied out mid-commit (torn) or corrupted.
    #[inline]
    pub fn checksum_ok(&self) -> bool {
        self.checksum == self.compute_checksum()
    }
}
