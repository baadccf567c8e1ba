use serde_json::Value;

/// Sink for the diagnostics an action reports about itself.
///
/// Both methods default to no-ops, so an implementation may provide only
/// the channel it cares about. The pipeline reports callback failures on
/// `error` and thrown-error transformer failures on `warn`.
pub trait ActionLogger: Send + Sync {
    /// Reports an error-level event.
    fn error(&self, message: &str, details: Option<&Value>) {
        let _ = (message, details);
    }

    /// Reports a warning-level event.
    fn warn(&self, message: &str, details: Option<&Value>) {
        let _ = (message, details);
    }
}

/// Forwards action diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl ActionLogger for TracingLogger {
    fn error(&self, message: &str, details: Option<&Value>) {
        match details {
            Some(details) => tracing::error!(%details, "{message}"),
            None => tracing::error!("{message}"),
        }
    }

    fn warn(&self, message: &str, details: Option<&Value>) {
        match details {
            Some(details) => tracing::warn!(%details, "{message}"),
            None => tracing::warn!("{message}"),
        }
    }
}
