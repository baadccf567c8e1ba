//! # warden-log
//!
//! One-call `tracing` setup for binaries and test suites using Warden.
//!
//! ```rust,no_run
//! use warden_log::LogConfig;
//!
//! let _guard = warden_log::init(LogConfig::from_env()).expect("logger");
//! tracing::info!("ready");
//! ```
//!
//! ## Presets
//!
//! - [`LogConfig::development`]: pretty, `debug`, colored
//! - [`LogConfig::production`]: JSON, `info`
//! - [`LogConfig::test`]: compact, `debug`, captured by the test harness
//!
//! ## Environment
//!
//! [`LogConfig::from_env`] reads `WARDEN_LOG` (falling back to `RUST_LOG`) for
//! the filter and `WARDEN_LOG_FORMAT` (`pretty`, `compact` or `json`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;

pub use builder::{LoggerBuilder, LoggerGuard};
pub use config::{LogConfig, LogFormat, LogWriter};
pub use error::{LogError, LogResult};

/// Installs the global subscriber described by `config`.
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init(config: LogConfig) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}

/// Installs a subscriber configured from the environment.
pub fn init_from_env() -> LogResult<LoggerGuard> {
    init(LogConfig::from_env())
}
