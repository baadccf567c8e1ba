//! Logger configuration

mod presets;

use serde::{Deserialize, Serialize};

/// How events are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human-oriented.
    Pretty,
    /// Single line per event.
    #[default]
    Compact,
    /// Newline-delimited JSON.
    Json,
}

impl LogFormat {
    /// Parses a format name, case-insensitively. Unknown names yield `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Where events are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogWriter {
    /// Standard error.
    #[default]
    Stderr,
    /// Standard output.
    Stdout,
    /// Captured per test by the libtest harness.
    Test,
}

/// Logger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `warden_action=debug,warn`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Output destination.
    pub writer: LogWriter,
    /// Colored output (ignored by the JSON format).
    pub ansi: bool,
    /// Include the event target.
    pub target: bool,
    /// Include timestamps.
    pub time: bool,
    /// Service name recorded on a root span wrapping everything logged.
    pub service: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::default(),
            writer: LogWriter::default(),
            ansi: false,
            target: true,
            time: true,
            service: None,
        }
    }
}

impl LogConfig {
    /// Parses a configuration from a JSON document.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("pretty", Some(LogFormat::Pretty))]
    #[case("JSON", Some(LogFormat::Json))]
    #[case("Compact", Some(LogFormat::Compact))]
    #[case("logfmt", None)]
    fn parses_format_names(#[case] name: &str, #[case] expected: Option<LogFormat>) {
        assert_eq!(LogFormat::parse(name), expected);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = LogConfig::from_json(r#"{ "level": "debug", "format": "json" }"#).unwrap();
        assert_eq!(
            config,
            LogConfig {
                level: "debug".to_owned(),
                format: LogFormat::Json,
                ..LogConfig::default()
            }
        );
    }

    #[test]
    fn rejects_unknown_writer() {
        assert!(LogConfig::from_json(r#"{ "writer": "syslog" }"#).is_err());
    }
}
