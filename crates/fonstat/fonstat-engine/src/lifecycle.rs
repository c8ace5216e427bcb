//! Lifecycle manager: one context object owning the buffer, the namespace
//! entry and the update timer, with an explicit init/shutdown ordering.
//!
//! Startup: allocate and fully default-initialize the buffer under a staging
//! name → publish it into the registration namespace with an atomic rename →
//! arm the update timer last. No reader-visible path exists before the
//! buffer behind it is complete, and any failed step releases everything the
//! earlier steps acquired before the error is surfaced.
//!
//! Teardown runs in strict reverse and every step is idempotent: disarm the
//! timer and join it (writer quiescence), unlink the published file, remove
//! the namespace directory, and only then release the buffer memory.

use crate::timer::{self, TimerHandle, epoch_secs};
use fonstat_config::{ConfigError, PublisherConfig};
use fonstat_core::{ReadingSource, SiteEntry, SiteRegistry, utilization_percent};
use fonstat_records::SiteRecord;
use fonstat_shm::{STATS_FILE_NAME, StatsWriter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Staging name the buffer is initialized under before the atomic publish.
const STAGING_FILE_NAME: &str = "stats.shm.staging";

/// Throughput every site reports before its first update pass.
const INITIAL_THROUGHPUT_GBPS: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to create namespace directory '{path}'")]
    Namespace {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to allocate stats buffer '{path}'")]
    Allocate {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to publish stats buffer at '{path}'")]
    Publish {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to start update timer")]
    Timer(#[source] io::Error),
}

/// Process-wide publisher context. Construct once with [`StatsModule::init`],
/// pass by reference to whoever needs the paths, and tear down with
/// [`StatsModule::shutdown`] (also invoked on drop).
pub struct StatsModule {
    namespace_dir: PathBuf,
    stats_path: PathBuf,
    registry: Arc<SiteRegistry>,
    timer: Option<TimerHandle>,
}

impl StatsModule {
    /// Brings the publisher up in the documented order. On any failure,
    /// resources acquired by earlier steps are released before the error is
    /// returned — no partial state survives a failed init.
    pub fn init(
        cfg: &PublisherConfig,
        source: Box<dyn ReadingSource>,
    ) -> Result<Self, LifecycleError> {
        cfg.validate()?;

        let registry = Arc::new(SiteRegistry::new(
            cfg.sites
                .iter()
                .map(|s| SiteEntry {
                    name: s.name.clone(),
                    capacity_gbps: s.capacity_gbps,
                })
                .collect(),
        ));

        let namespace_dir = PathBuf::from(&cfg.namespace_dir);
        fs::create_dir_all(&namespace_dir).map_err(|source| LifecycleError::Namespace {
            path: cfg.namespace_dir.clone(),
            source,
        })?;
        // Prototype permission posture: world read/write, like the proc
        // entry it replaces. Unhardened by design, do not ship as-is.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&namespace_dir, fs::Permissions::from_mode(0o777));
        }

        let ts = epoch_secs();
        let defaults: Vec<SiteRecord> = registry
            .iter()
            .map(|site| {
                SiteRecord::initial(
                    &site.name,
                    ts,
                    INITIAL_THROUGHPUT_GBPS,
                    utilization_percent(INITIAL_THROUGHPUT_GBPS, site.capacity_gbps),
                )
            })
            .collect();

        // Allocate and fully initialize the buffer under the staging name;
        // nothing reader-visible exists yet.
        let staging_path = namespace_dir.join(STAGING_FILE_NAME);
        let writer = match StatsWriter::create(&staging_path, &defaults) {
            Ok(w) => w,
            Err(source) => {
                let _ = fs::remove_file(&staging_path);
                let _ = fs::remove_dir(&namespace_dir);
                return Err(LifecycleError::Allocate {
                    path: staging_path.display().to_string(),
                    source,
                });
            }
        };
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&staging_path, fs::Permissions::from_mode(0o666));
        }

        // Registration: atomic rename makes the fully-initialized buffer
        // appear under its published name in one step.
        let stats_path = namespace_dir.join(STATS_FILE_NAME);
        if let Err(source) = fs::rename(&staging_path, &stats_path) {
            drop(writer);
            let _ = fs::remove_file(&staging_path);
            let _ = fs::remove_dir(&namespace_dir);
            return Err(LifecycleError::Publish {
                path: stats_path.display().to_string(),
                source,
            });
        }

        // Arm the timer only after every prior step succeeded.
        let period = Duration::from_millis(cfg.update_interval_ms);
        let timer = match timer::spawn(
            writer,
            Arc::clone(&registry),
            source,
            period,
            defaults,
        ) {
            Ok(t) => t,
            Err(source) => {
                let _ = fs::remove_file(&stats_path);
                let _ = fs::remove_dir(&namespace_dir);
                return Err(LifecycleError::Timer(source));
            }
        };

        info!(
            namespace = %namespace_dir.display(),
            sites = registry.len(),
            period_ms = cfg.update_interval_ms,
            "stats publisher started"
        );

        Ok(Self {
            namespace_dir,
            stats_path,
            registry,
            timer: Some(timer),
        })
    }

    /// Path of the published stats buffer.
    pub fn stats_path(&self) -> &Path {
        &self.stats_path
    }

    pub fn namespace_dir(&self) -> &Path {
        &self.namespace_dir
    }

    pub fn site_count(&self) -> usize {
        self.registry.len()
    }

    /// Tears the publisher down in strict reverse startup order. Safe to
    /// call more than once; every step is best-effort.
    pub fn shutdown(&mut self) {
        // Disarm first and wait for the in-flight pass: the buffer must not
        // be released while a commit could still touch it.
        let writer = self.timer.take().map(|t| {
            let w = t.stop();
            info!("update timer stopped");
            w
        });

        match fs::remove_file(&self.stats_path) {
            Ok(()) => info!(path = %self.stats_path.display(), "stats buffer unpublished"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, "failed to unlink stats buffer"),
        }

        // Fails while other tenants keep files in the directory; that is fine.
        let _ = fs::remove_dir(&self.namespace_dir);

        // Buffer memory is released last, after quiescence and deregistration.
        drop(writer);
    }
}

impl Drop for StatsModule {
    fn drop(&mut self) {
        self.shutdown();
    }
}
