use serde::Deserialize;
use std::path::Path;

/// Site name capacity in the shared record, minus the NUL terminator.
const MAX_SITE_NAME: usize = 31;

#[derive(Deserialize, Debug, Clone)]
pub struct PublisherConfig {
    /// Registration namespace directory under which the stats buffer is
    /// published.
    #[serde(default = "defaults::namespace_dir")]
    pub namespace_dir: String,
    /// Update timer period in milliseconds.
    #[serde(default = "defaults::update_interval_ms")]
    pub update_interval_ms: u64,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    /// Monitored sites, in registry order. Order is part of the interface:
    /// it fixes each site's slot index for the buffer lifetime.
    #[serde(default = "defaults::sites")]
    pub sites: Vec<SiteConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SiteConfig {
    pub name: String,
    /// Link capacity in Gbps, used to derive utilization.
    #[serde(default = "defaults::capacity_gbps")]
    pub capacity_gbps: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {reason}")]
    Invalid { reason: String },
}

mod defaults {
    use super::SiteConfig;

    pub fn namespace_dir() -> String {
        "/tmp/fonstat".into()
    }

    pub fn update_interval_ms() -> u64 {
        1000
    }

    pub fn log_level() -> String {
        "info".into()
    }

    pub fn capacity_gbps() -> u32 {
        2000
    }

    pub fn sites() -> Vec<SiteConfig> {
        ["MicrosoftDC", "Dallas", "Dobbins", "Stone"]
            .iter()
            .map(|name| SiteConfig {
                name: (*name).into(),
                capacity_gbps: capacity_gbps(),
            })
            .collect()
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            namespace_dir: defaults::namespace_dir(),
            update_interval_ms: defaults::update_interval_ms(),
            log_level: defaults::log_level(),
            sites: defaults::sites(),
        }
    }
}

impl PublisherConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let toml_to_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: PublisherConfig = toml::from_str(&toml_to_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sites.is_empty() {
            return Err(invalid("at least one site is required"));
        }
        if self.update_interval_ms == 0 {
            return Err(invalid("update_interval_ms must be > 0"));
        }
        for site in &self.sites {
            if site.name.is_empty() {
                return Err(invalid("site name must not be empty"));
            }
            if site.name.len() > MAX_SITE_NAME {
                return Err(ConfigError::Invalid {
                    reason: format!("site name '{}' exceeds {MAX_SITE_NAME} bytes", site.name),
                });
            }
            if site.capacity_gbps == 0 {
                return Err(ConfigError::Invalid {
                    reason: format!("site '{}' has zero capacity", site.name),
                });
            }
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}
