//! Logging setup

pub use log::{debug, error, info, trace, warn};

/// Initialize `env_logger` with `default_level` as the baseline filter.
///
/// `RUST_LOG` still overrides the baseline. Unknown level names fall back to
/// `info`. Calling this more than once is harmless; later calls are ignored.
pub fn init(default_level: &str) {
    let level = default_level
        .parse::<log::LevelFilter>()
        .unwrap_or(log::LevelFilter::Info);

    let result = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();

    if result.is_err() {
        log::debug!("Logger already initialized, keeping existing configuration");
    }
}
