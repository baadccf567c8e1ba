//! Configuration presets for common scenarios

use super::{LogConfig, LogFormat, LogWriter};

impl LogConfig {
    /// Create configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        // WARDEN_LOG wins over RUST_LOG
        if let Some(level) = lookup("WARDEN_LOG").or_else(|| lookup("RUST_LOG")) {
            config.level = level;
        }

        if let Some(format) = lookup("WARDEN_LOG_FORMAT").as_deref().and_then(LogFormat::parse) {
            config.format = format;
        }

        config
    }

    /// Development configuration (pretty, debug level)
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_owned(),
            format: LogFormat::Pretty,
            ansi: true,
            ..Self::default()
        }
    }

    /// Production configuration (JSON, info level)
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Json,
            writer: LogWriter::Stdout,
            ansi: false,
            ..Self::default()
        }
    }

    /// Test configuration (captured by the test harness)
    #[must_use]
    pub fn test() -> Self {
        Self {
            level: "debug".to_owned(),
            format: LogFormat::Compact,
            writer: LogWriter::Test,
            ansi: false,
            time: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_is_default() {
        assert_eq!(LogConfig::from_lookup(lookup(&[])), LogConfig::default());
    }

    #[test]
    fn warden_log_overrides_rust_log() {
        let config = LogConfig::from_lookup(lookup(&[
            ("RUST_LOG", "warn"),
            ("WARDEN_LOG", "warden_action=trace"),
        ]));
        assert_eq!(config.level, "warden_action=trace");
    }

    #[test]
    fn rust_log_is_the_fallback() {
        let config = LogConfig::from_lookup(lookup(&[("RUST_LOG", "warn")]));
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn unknown_format_keeps_default() {
        let config = LogConfig::from_lookup(lookup(&[("WARDEN_LOG_FORMAT", "xml")]));
        assert_eq!(config.format, LogFormat::Compact);

        let config = LogConfig::from_lookup(lookup(&[("WARDEN_LOG_FORMAT", "json")]));
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn presets() {
        assert_eq!(LogConfig::development().format, LogFormat::Pretty);
        assert_eq!(LogConfig::production().format, LogFormat::Json);
        let test = LogConfig::test();
        assert_eq!(test.writer, LogWriter::Test);
        assert!(!test.ansi);
    }
}
