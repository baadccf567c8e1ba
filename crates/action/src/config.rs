use serde::{Deserialize, Serialize};
use warden_schema::ValidationErrorFormat;

/// Envelope shape returned by non-stateful actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    /// `{ success, data | error }`
    #[default]
    Api,
    /// `{ type: "ok" | "err", value | error }`
    Functional,
}

/// Envelope shape an action actually materializes, after the stateful flag
/// has been taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeFormat {
    /// See [`ResultFormat::Api`].
    Api,
    /// See [`ResultFormat::Functional`].
    Functional,
    /// API shape plus the echoed submitted values.
    Stateful,
}

/// Serializable part of an action's configuration.
///
/// Every field has a default, so a partial document is enough:
///
/// ```rust
/// use warden_action::{ActionConfig, ResultFormat};
///
/// let config = ActionConfig::from_json(r#"{ "resultFormat": "functional" }"#).unwrap();
/// assert_eq!(config.result_format, ResultFormat::Functional);
/// assert!(!config.stateful);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[non_exhaustive]
pub struct ActionConfig {
    /// Envelope shape for `run` results.
    pub result_format: ResultFormat,
    /// Shape of validation issues inside validation errors.
    pub validation_error_format: ValidationErrorFormat,
    /// Forces the stateful envelope, overriding `result_format`.
    pub stateful: bool,
    /// Optional human-readable action name, exposed in metadata and logs.
    pub name: Option<String>,
}

impl ActionConfig {
    /// Parses a configuration from a JSON document.
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// The envelope shape this configuration materializes.
    #[must_use]
    pub fn envelope_format(&self) -> EnvelopeFormat {
        if self.stateful {
            return EnvelopeFormat::Stateful;
        }
        match self.result_format {
            ResultFormat::Api => EnvelopeFormat::Api,
            ResultFormat::Functional => EnvelopeFormat::Functional,
        }
    }
}

/// Failure to load an [`ActionConfig`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The document is not valid JSON or has a field of the wrong type.
    #[error("invalid action configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
