//! Convenience re-exports for action authors.
//!
//! ```rust,ignore
//! use warden_action::prelude::*;
//! ```

pub use crate::action::Action;
pub use crate::action_errors;
pub use crate::builder::{ActionBuilder, HandledBuilder};
pub use crate::callbacks::{ErrorEvent, SettledEvent, StartEvent, SuccessEvent};
pub use crate::config::{ActionConfig, ResultFormat};
pub use crate::error::{ActionError, ActionFailure, NoErrors, Thrown, UserError};
pub use crate::handler::{HandlerArgs, Reply};
pub use crate::logger::{ActionLogger, TracingLogger};
pub use crate::metadata::Metadata;
pub use crate::result::{ActionResult, Envelope, StatefulResult};

pub use warden_schema::prelude::*;
