//! # warden-schema
//!
//! The contract every validation backend implements to plug into a Warden
//! action, plus the issue model shared by input, bind-argument and output
//! validation.
//!
//! ## Quick Start
//!
//! ```rust
//! use warden_schema::prelude::*;
//! use serde_json::json;
//!
//! # futures::executor::block_on(async {
//! let name = from_fn(|value: &serde_json::Value| match value.as_str() {
//!     Some(s) => Outcome::Valid(s.trim().to_owned()),
//!     None => Outcome::invalid(Issue::new("expected a string")),
//! });
//!
//! assert_eq!(name.validate(&json!("  ada ")).await, Outcome::Valid("ada".to_owned()));
//! # });
//! ```
//!
//! ## Adapters
//!
//! - [`from_fn`](adapter::from_fn): synchronous closure
//! - [`from_async_fn`](adapter::from_async_fn): closure returning a future
//! - [`json`](adapter::json): serde deserialization into a typed value
//!
//! Compose with [`SchemaExt::map`](combinators::SchemaExt::map) and
//! [`SchemaExt::refine`](combinators::SchemaExt::refine).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod combinators;
pub mod format;
pub mod issue;
pub mod prelude;

pub use adapter::{
    AsyncFnSchema, BoxFuture, FnSchema, Json, Outcome, Schema, from_async_fn, from_fn, json,
};
pub use combinators::{Map, Refine, SchemaExt};
pub use format::{FlatIssue, ValidationErrorFormat, ValidationIssues, format_issues};
pub use issue::{Issue, PathKey, PathSegment};
