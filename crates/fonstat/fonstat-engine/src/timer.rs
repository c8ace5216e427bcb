//! Periodic update timer: the single writer of the stats buffer.
//!
//! One dedicated thread owns the `StatsWriter` and, once per period, walks
//! the registry in slot order, samples the reading source, and commits the
//! folded record per site. Being a single thread makes overlapping passes
//! impossible by construction; deadline arithmetic makes an overrunning
//! pass start its successor immediately instead of stacking or skipping.
//!
//! The pass must never block on readers and never allocates: the shadow
//! records are pre-sized at spawn and commits are plain seqlock writes.

use fonstat_core::{ReadingSource, SiteRegistry, utilization_percent};
use fonstat_records::{LinkStatus, SiteRecord};
use fonstat_shm::StatsWriter;
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub(crate) struct TimerHandle {
    stop_tx: mpsc::Sender<()>,
    join: Option<JoinHandle<StatsWriter>>,
}

impl TimerHandle {
    /// Disarms the timer and waits for any in-flight pass to finish.
    ///
    /// Returns the writer — and with it ownership of the mapped buffer — so
    /// the caller controls exactly when the memory is released. `None` only
    /// if the timer thread panicked.
    pub(crate) fn stop(mut self) -> Option<StatsWriter> {
        let _ = self.stop_tx.send(());
        self.join.take().and_then(|j| j.join().ok())
    }
}

/// Arms the timer. The first pass runs one full period after arming.
pub(crate) fn spawn(
    mut writer: StatsWriter,
    registry: Arc<SiteRegistry>,
    mut source: Box<dyn ReadingSource>,
    period: Duration,
    initial: Vec<SiteRecord>,
) -> io::Result<TimerHandle> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    let join = std::thread::Builder::new()
        .name("fonstat-update".into())
        .spawn(move || {
            let mut shadow = initial;
            let mut next = Instant::now() + period;
            loop {
                let wait = next.saturating_duration_since(Instant::now());
                match stop_rx.recv_timeout(wait) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }

                run_pass(&mut writer, &registry, source.as_mut(), &mut shadow);
                writer.complete_pass();

                let now = Instant::now();
                if next + period < now {
                    debug!("update pass overran its period");
                }
                next = next_deadline(next, now, period);
            }
            writer
        })?;

    Ok(TimerHandle {
        stop_tx,
        join: Some(join),
    })
}

/// Deadline of the pass following one that just finished: one period after
/// the previous deadline, or `now` when the pass overran — the next pass
/// starts immediately instead of stacking missed deadlines or skipping
/// ahead.
fn next_deadline(prev: Instant, now: Instant, period: Duration) -> Instant {
    let next = prev + period;
    if next < now { now } else { next }
}

/// One update pass over every site in registry order.
///
/// `shadow` is the writer's private copy of each record; folding readings
/// into it (rather than reading the shared buffer back) keeps the counters
/// monotonic without ever touching the read path. On a source failure the
/// site keeps its previous values except the timestamp, and its link is
/// forced DOWN; the failure never aborts the pass.
pub(crate) fn run_pass(
    writer: &mut StatsWriter,
    registry: &SiteRegistry,
    source: &mut dyn ReadingSource,
    shadow: &mut [SiteRecord],
) {
    let ts = epoch_secs();
    for (i, site) in registry.iter().enumerate() {
        let rec = &mut shadow[i];
        rec.timestamp = ts;
        match source.sample(i, site) {
            Ok(reading) => {
                rec.throughput_gbps = reading.throughput_gbps;
                rec.error_count = rec.error_count.saturating_add(reading.error_increment);
                rec.ber_error_count = rec.ber_error_count.saturating_add(reading.ber_increment);
                rec.utilization_percent =
                    utilization_percent(reading.throughput_gbps, site.capacity_gbps);
                rec.set_link_status(LinkStatus::Up);
            }
            Err(e) => {
                warn!(site = %site.name, error = %e, "reading source failed, marking link down");
                rec.set_link_status(LinkStatus::Down);
            }
        }
        writer.commit(i, *rec);
    }
}

pub(crate) fn epoch_secs() -> u64 {
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap();
    t.as_secs()
}
