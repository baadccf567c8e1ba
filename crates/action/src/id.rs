use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier minted once when an action is built.
///
/// Every result the action produces, including its initial placeholder,
/// carries this identifier. It is never taken from caller-supplied data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(Uuid);

impl ActionId {
    /// Generates a fresh random identifier.
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(ActionId::generate(), ActionId::generate());
    }

    #[test]
    fn display_is_hyphenated_uuid() {
        let id = ActionId::generate();
        assert_eq!(id.to_string(), id.as_uuid().hyphenated().to_string());
    }
}
