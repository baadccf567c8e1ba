//! Logger builder implementation

use tracing_subscriber::fmt::TestWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogConfig, LogFormat, LogWriter};
use crate::error::{LogError, LogResult};

/// Logger builder
#[derive(Debug)]
pub struct LoggerBuilder {
    config: LogConfig,
}

/// Guard that keeps the logger's root span entered.
///
/// Drop it at the end of `main`; dropping it early only leaves the root span.
#[derive(Debug)]
#[must_use = "dropping the guard exits the root span"]
pub struct LoggerGuard {
    _root_span: Option<tracing::span::EnteredSpan>,
}

/// Applies the shared fmt options and installs the subscriber.
macro_rules! install {
    ($filter:expr, $layer:expr, $config:expr) => {{
        let layer = $layer
            .with_writer(make_writer($config.writer))
            .with_target($config.target);
        let result = if $config.time {
            Registry::default().with($filter).with(layer).try_init()
        } else {
            Registry::default()
                .with($filter)
                .with(layer.without_time())
                .try_init()
        };
        result.map_err(|e| LogError::Init(e.to_string()))
    }};
}

impl LoggerBuilder {
    /// Create builder from config
    #[must_use]
    pub fn from_config(config: LogConfig) -> Self {
        Self { config }
    }

    /// Parses the filter directive without installing anything.
    pub fn filter(&self) -> LogResult<EnvFilter> {
        EnvFilter::try_new(&self.config.level).map_err(|e| LogError::Filter {
            directive: self.config.level.clone(),
            reason: e.to_string(),
        })
    }

    /// Build and install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Filter string cannot be parsed
    /// - A global subscriber is already installed
    pub fn build(self) -> LogResult<LoggerGuard> {
        let filter = self.filter()?;
        let config = &self.config;

        match config.format {
            LogFormat::Pretty => {
                install!(filter, fmt::layer().pretty().with_ansi(config.ansi), config)?;
            }
            LogFormat::Compact => {
                install!(filter, fmt::layer().compact().with_ansi(config.ansi), config)?;
            }
            LogFormat::Json => {
                install!(filter, fmt::layer().json().with_ansi(false), config)?;
            }
        }

        let root_span = config
            .service
            .as_deref()
            .map(|service| tracing::info_span!("app", service).entered());

        Ok(LoggerGuard {
            _root_span: root_span,
        })
    }
}

fn make_writer(writer: LogWriter) -> BoxMakeWriter {
    match writer {
        LogWriter::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogWriter::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogWriter::Test => BoxMakeWriter::new(TestWriter::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_is_rejected_before_install() {
        let config = LogConfig {
            level: "warden_action=bogus".to_owned(),
            ..LogConfig::test()
        };
        let err = LoggerBuilder::from_config(config).build().unwrap_err();
        let LogError::Filter { directive, .. } = err else {
            panic!("expected a filter error");
        };
        assert_eq!(directive, "warden_action=bogus");
    }

    #[test]
    fn valid_filter_parses() {
        let builder = LoggerBuilder::from_config(LogConfig::development());
        assert!(builder.filter().is_ok());
    }

    #[test]
    fn second_install_fails() {
        let first = crate::init(LogConfig {
            service: Some("warden-test".to_owned()),
            ..LogConfig::test()
        });
        assert!(first.is_ok());
        tracing::debug!("logger installed");

        let second = crate::init(LogConfig::test());
        assert!(matches!(second, Err(LogError::Init(_))));
    }
}
