//! # warden-action
//!
//! Type-safe actions: a fluent builder that wires schemas, declared errors,
//! a handler and lifecycle callbacks into a callable [`Action`], and the
//! execution pipeline that runs it.
//!
//! ## Core Types
//!
//! - [`ActionBuilder`] / [`HandledBuilder`]: fluent, type-state builder
//! - [`Action`]: the built, cloneable action
//! - [`Envelope`]: result shaped as `api`, `functional` or stateful
//! - [`ActionError`]: system errors plus the declared user errors
//! - [`action_errors!`]: declares a closed user error set
//! - [`Metadata`]: per-invocation context for the handler and callbacks
//! - [`ActionLogger`]: optional sink for callback and transformer failures
//!
//! ## Pipeline
//!
//! Each invocation runs `on_start`, bound-argument validation, input
//! validation, the handler, output validation, then `on_success` or
//! `on_error`, and finally `on_settled`. Nothing escapes as a panic or an
//! `Err`: every failure becomes an [`ActionError`] inside the envelope.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use warden_action::prelude::*;
//!
//! action_errors! {
//!     pub enum TodoError {
//!         NotFound = "NOT_FOUND" => fn not_found(id: String),
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let get_todo = ActionBuilder::new()
//!     .input_schema(json::<String>())
//!     .errors::<TodoError>()
//!     .handler(|args| async move {
//!         if args.input == "42" {
//!             return args.errors.raise(TodoError::not_found(args.input));
//!         }
//!         Reply::data(format!("todo {}", args.input))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let envelope = get_todo.run(json!("42")).await;
//! assert_eq!(
//!     serde_json::to_value(&envelope).unwrap(),
//!     json!({ "success": false, "error": { "type": "NOT_FOUND", "id": "42" } })
//! );
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

// Lets `action_errors!` name this crate the same way inside and outside it.
extern crate self as warden_action;

/// The built action and its entry points.
pub mod action;
/// Fluent action builder.
pub mod builder;
/// Lifecycle callback events.
pub mod callbacks;
/// Serializable action configuration.
pub mod config;
/// Error taxonomy.
pub mod error;
/// Handler arguments and replies.
pub mod handler;
/// Action identifiers.
pub mod id;
/// Diagnostic sink port.
pub mod logger;
mod macros;
/// Per-invocation metadata.
pub mod metadata;
mod pipeline;
pub mod prelude;
pub mod result;
mod validation;

pub use action::Action;
pub use builder::{ActionBuilder, HandledBuilder};
pub use callbacks::{CallbackStage, ErrorEvent, SettledEvent, StartEvent, SuccessEvent};
pub use config::{ActionConfig, ConfigError, EnvelopeFormat, ResultFormat};
pub use error::{
    ActionError, ActionFailure, BuildError, Errors, NoErrors, Thrown, UserError,
    BIND_ARGS_VALIDATION_MESSAGE, IMPLICIT_RETURN_MESSAGE, INITIAL_STATE_MESSAGE,
    INPUT_VALIDATION_MESSAGE, NO_INPUT_SCHEMA_MESSAGE, OUTPUT_VALIDATION_MESSAGE,
    UNHANDLED_MESSAGE,
};
pub use handler::{HandlerArgs, Reply};
pub use id::ActionId;
pub use logger::{ActionLogger, TracingLogger};
pub use metadata::Metadata;
pub use result::{ActionResult, ApiResult, Envelope, FunctionalResult, StatefulResult};

#[doc(hidden)]
pub mod __private {
    pub use serde;
}
