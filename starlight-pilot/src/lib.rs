use tracing_subscriber::EnvFilter;

pub mod config;
pub mod drive;
pub mod follow;
pub mod pipeline;
pub mod server;

pub use config::{PilotConfig, Profile};
pub use pipeline::{CycleOutput, Pilot, PilotHandle};

/// Installs the fmt subscriber, `RUST_LOG` driven with `info` as fallback.
/// `log` records are bridged into it. Safe to call more than once.
pub fn log_init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
