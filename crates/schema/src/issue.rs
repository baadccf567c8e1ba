//! Validation issues reported by schema adapters.
//!
//! An adapter reports a failure as a list of [`Issue`]s. Each issue carries a
//! message and an optional path into the validated value. Path segments come
//! in the shapes validation libraries actually produce: plain keys, array
//! indices, descriptor objects wrapping a key, and symbol-like keys that have
//! no serializable form.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// PATH SEGMENT
// ============================================================================

/// One step of an issue path as reported by an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object key.
    Key(String),
    /// Array index.
    Index(u64),
    /// Descriptor object carrying the real key (e.g. `{ key: "email" }`).
    Keyed(Box<PathSegment>),
    /// Key with no serializable representation. Dropped during formatting.
    Symbol(String),
}

impl PathSegment {
    /// Wraps a segment in a key-bearing descriptor.
    #[must_use]
    pub fn keyed(inner: impl Into<PathSegment>) -> Self {
        Self::Keyed(Box::new(inner.into()))
    }

    /// Creates a symbol segment with the given description.
    #[must_use]
    pub fn symbol(description: impl Into<String>) -> Self {
        Self::Symbol(description.into())
    }

    /// Resolves the segment to a serializable key.
    ///
    /// Descriptors are unwrapped recursively. Returns `None` for symbols,
    /// including a descriptor whose underlying key is a symbol.
    #[must_use]
    pub fn normalize(&self) -> Option<PathKey> {
        match self {
            Self::Key(key) => Some(PathKey::Key(key.clone())),
            Self::Index(index) => Some(PathKey::Index(*index)),
            Self::Keyed(inner) => inner.normalize(),
            Self::Symbol(_) => None,
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<u64> for PathSegment {
    fn from(index: u64) -> Self {
        Self::Index(index)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index as u64)
    }
}

// ============================================================================
// PATH KEY
// ============================================================================

/// A normalized, serializable path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathKey {
    /// Array index.
    Index(u64),
    /// Object key.
    Key(String),
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Key(key) => f.write_str(key),
        }
    }
}

// ============================================================================
// ISSUE
// ============================================================================

/// A single validation failure.
///
/// # Examples
///
/// ```rust
/// use warden_schema::{Issue, PathKey};
///
/// let issue = Issue::new("must be positive").at(["items", "0"]).with_segment(2_u64);
/// assert_eq!(issue.normalized_path().len(), 3);
/// assert_eq!(issue.normalized_path()[2], PathKey::Index(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Human-readable description of the failure.
    pub message: String,
    /// Location of the failure inside the validated value, if any.
    pub path: Option<Vec<PathSegment>>,
}

impl Issue {
    /// Creates an issue without a path (a form-level issue).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    /// Replaces the path of this issue.
    #[must_use = "builder methods must be chained or built"]
    pub fn at<P>(mut self, path: impl IntoIterator<Item = P>) -> Self
    where
        P: Into<PathSegment>,
    {
        self.path = Some(path.into_iter().map(Into::into).collect());
        self
    }

    /// Appends one segment to the path of this issue.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_segment(mut self, segment: impl Into<PathSegment>) -> Self {
        self.path.get_or_insert_with(Vec::new).push(segment.into());
        self
    }

    /// Prepends a segment, used when nesting issues under a parent field.
    #[must_use = "builder methods must be chained or built"]
    pub fn under(mut self, segment: impl Into<PathSegment>) -> Self {
        self.path
            .get_or_insert_with(Vec::new)
            .insert(0, segment.into());
        self
    }

    /// The path with descriptors unwrapped and symbol segments dropped.
    #[must_use]
    pub fn normalized_path(&self) -> Vec<PathKey> {
        self.path
            .iter()
            .flatten()
            .filter_map(PathSegment::normalize)
            .collect()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.normalized_path();
        if path.is_empty() {
            return f.write_str(&self.message);
        }
        let joined = path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{joined}: {}", self.message)
    }
}
