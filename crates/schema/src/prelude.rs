//! Convenience re-exports for schema authors.

pub use crate::adapter::{Outcome, Schema, from_async_fn, from_fn, json};
pub use crate::combinators::SchemaExt;
pub use crate::format::{ValidationErrorFormat, ValidationIssues, format_issues};
pub use crate::issue::{Issue, PathKey, PathSegment};
