//! Full publisher lifecycle tests: init ordering, periodic passes, teardown
//! idempotence, and fresh state across re-initialization.

use fonstat_config::PublisherConfig;
use fonstat_core::SimulatedSource;
use fonstat_engine::StatsModule;
use fonstat_records::LinkStatus;
use fonstat_shm::{StatsMapping, StatsReader, render};
use std::time::{Duration, Instant};

fn test_config(tag: &str, interval_ms: u64) -> PublisherConfig {
    PublisherConfig {
        namespace_dir: format!("/tmp/fonstat_lifecycle_{tag}_{}", std::process::id()),
        update_interval_ms: interval_ms,
        ..PublisherConfig::default()
    }
}

fn wait_for_passes(path: &std::path::Path, want: u64, timeout: Duration) -> u64 {
    let deadline = Instant::now() + timeout;
    loop {
        let passes = StatsReader::open(path).map(|r| r.passes()).unwrap_or(0);
        if passes >= want || Instant::now() > deadline {
            return passes;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// Four sites, one timer period: the text view shows four blocks, all
/// timestamps within one period of each other, all counters at or above
/// their initial zero.
#[test]
fn one_period_produces_a_consistent_view() {
    let cfg = test_config("one_period", 50);
    let mut module = StatsModule::init(&cfg, Box::new(SimulatedSource::with_seed(1))).unwrap();
    assert_eq!(module.site_count(), 4);

    let passes = wait_for_passes(module.stats_path(), 1, Duration::from_secs(5));
    assert!(passes >= 1, "timer never completed a pass");

    let mut reader = StatsReader::open(module.stats_path()).unwrap();
    let records = reader.snapshot_all();
    assert_eq!(records.len(), 4);

    let min_ts = records.iter().map(|r| r.timestamp).min().unwrap();
    let max_ts = records.iter().map(|r| r.timestamp).max().unwrap();
    assert!(max_ts - min_ts <= 1, "timestamps straddle more than one period");

    for rec in &records {
        assert_eq!(rec.link_status(), LinkStatus::Up);
        assert!(rec.utilization_percent >= 0.0 && rec.utilization_percent <= 100.0);
        assert!(rec.checksum_ok());
    }

    let text = render(&mut reader);
    assert_eq!(text.matches("Site: ").count(), 4);

    module.shutdown();
}

#[test]
fn shutdown_is_idempotent_and_removes_the_interface() {
    let cfg = test_config("idempotent", 20);
    let mut module = StatsModule::init(&cfg, Box::new(SimulatedSource::with_seed(2))).unwrap();
    let stats_path = module.stats_path().to_path_buf();
    let namespace = module.namespace_dir().to_path_buf();
    assert!(stats_path.exists());

    module.shutdown();
    assert!(!stats_path.exists(), "stats file must be unpublished");
    assert!(!namespace.exists(), "namespace directory must be removed");

    // Second (and third, via Drop) teardown must not fault.
    module.shutdown();
    drop(module);

    assert!(StatsReader::open(&stats_path).is_err());
}

/// Tearing down and re-initializing yields a fresh default buffer: no
/// counter values leak from the previous instance.
#[test]
fn reinit_after_teardown_starts_fresh() {
    // Period long enough that the fresh instance cannot complete a pass
    // between init and the assertions below.
    let cfg = test_config("reinit", 300);

    let mut module = StatsModule::init(&cfg, Box::new(SimulatedSource::with_seed(3))).unwrap();
    let passes = wait_for_passes(module.stats_path(), 3, Duration::from_secs(5));
    assert!(passes >= 3);

    let mut reader = StatsReader::open(module.stats_path()).unwrap();
    let advanced = reader.snapshot_all();
    drop(reader);
    module.shutdown();

    let module = StatsModule::init(&cfg, Box::new(SimulatedSource::with_seed(3))).unwrap();
    let mut reader = StatsReader::open(module.stats_path()).unwrap();
    assert_eq!(reader.passes(), 0, "pass counter must reset");
    for (i, rec) in reader.snapshot_all().into_iter().enumerate() {
        assert_eq!(rec.error_count, 0, "stale counters leaked into site {i}");
        assert_eq!(rec.ber_error_count, 0);
        assert_eq!(rec.link_status(), LinkStatus::Up);
        assert_eq!(rec.name(), advanced[i].name(), "registry order must be stable");
    }
}

/// The mapping contract holds across the whole lifecycle: not-ready before
/// init, prefix-bounded while live, not-ready again after teardown.
#[test]
fn mapping_follows_buffer_lifecycle() {
    let cfg = test_config("mapping", 20);
    let stats_path =
        std::path::Path::new(&cfg.namespace_dir).join(fonstat_shm::STATS_FILE_NAME);

    let err = StatsMapping::map(&stats_path, None).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);

    let mut module = StatsModule::init(&cfg, Box::new(SimulatedSource::with_seed(4))).unwrap();
    let mapping = StatsMapping::map(module.stats_path(), None).unwrap();
    assert_eq!(mapping.site_count(), 4);
    let total = mapping.len();

    let err = StatsMapping::map(module.stats_path(), Some(total + 1)).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);

    drop(mapping);
    module.shutdown();

    let err = StatsMapping::map(&stats_path, None).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
