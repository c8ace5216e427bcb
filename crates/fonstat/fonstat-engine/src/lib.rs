mod lifecycle;
mod timer;

pub use lifecycle::{LifecycleError, StatsModule};
