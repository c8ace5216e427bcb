use anyhow::Context;
use fonstat_config::PublisherConfig;
use fonstat_core::SimulatedSource;
use fonstat_engine::StatsModule;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1);
    let cfg = match &config_path {
        Some(path) => PublisherConfig::load(path.clone())
            .with_context(|| format!("failed to load config '{path}'"))?,
        None => PublisherConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cfg.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let module = StatsModule::init(&cfg, Box::new(SimulatedSource::new()))
        .context("failed to start stats publisher")?;
    tracing::info!(
        stats = %module.stats_path().display(),
        "stats buffer published"
    );

    // Runs until killed. A hard kill skips shutdown(), leaving a stale
    // stats.shm published; the next init replaces it through the staging
    // rename, so the window lasts only until the publisher restarts.
    loop {
        std::thread::sleep(std::time::Duration::from_secs(60));
    }
}
