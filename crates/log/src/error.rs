/// Errors raised while installing the logger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LogError {
    /// The level directive is not a valid `EnvFilter`.
    #[error("invalid log filter {directive:?}: {reason}")]
    Filter {
        /// The rejected directive.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("failed to install subscriber: {0}")]
    Init(String),
}

/// Result alias for logger setup.
pub type LogResult<T> = Result<T, LogError>;
