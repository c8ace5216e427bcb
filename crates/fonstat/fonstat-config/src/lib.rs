pub mod config;
pub use config::{ConfigError, PublisherConfig, SiteConfig};
