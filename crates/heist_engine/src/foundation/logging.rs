//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system with a default filter (e.g. `"info"` or
/// `"heist_engine=debug"`). `RUST_LOG` still takes precedence when set.
///
/// Returns `false` if a logger was already installed.
pub fn init_with_filter(filter: &str) -> bool {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .try_init()
        .is_ok()
}
