use anyhow::Context;
use fonstat_shm::{STATS_FILE_NAME, StatsReader, render};
use std::path::Path;

fn main() -> anyhow::Result<()> {
    let namespace = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/tmp/fonstat".into());
    let path = Path::new(&namespace).join(STATS_FILE_NAME);

    let mut reader = StatsReader::open(&path)
        .with_context(|| format!("failed to open stats buffer at {}", path.display()))?;
    print!("{}", render(&mut reader));
    Ok(())
}
