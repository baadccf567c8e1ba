//! Error taxonomy flowing through the action pipeline.
//!
//! Two families share one public type, [`ActionError`]:
//!
//! - **system errors** owned by the pipeline (validation failures, the
//!   unhandled catch-all, implicit return, initial state, missing input
//!   schema, internal logic), and
//! - **user errors**, a closed enum declared per action with
//!   [`action_errors!`](crate::action_errors) and surfaced as
//!   [`ActionError::User`].
//!
//! [`InternalError`] additionally carries the output-validation kind, which is
//! remapped to `UNHANDLED` before anything reaches a caller.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use warden_schema::ValidationIssues;

use crate::handler::Reply;
use crate::id::ActionId;

/// Message of the `UNHANDLED` error.
pub const UNHANDLED_MESSAGE: &str = "An unhandled error occurred";
/// Message of the `IMPLICIT_RETURN` error.
pub const IMPLICIT_RETURN_MESSAGE: &str = "Action handler returned without a value";
/// Message of the `INITIAL_STATE` error.
pub const INITIAL_STATE_MESSAGE: &str = "Action has not been executed yet";
/// Message of the `NO_INPUT_SCHEMA` error.
pub const NO_INPUT_SCHEMA_MESSAGE: &str = "No input schema defined for this action";
/// Message of the `INPUT_VALIDATION` error.
pub const INPUT_VALIDATION_MESSAGE: &str = "Input validation failed";
/// Message of the `BIND_ARGS_VALIDATION` error.
pub const BIND_ARGS_VALIDATION_MESSAGE: &str = "Bind arguments validation failed";
/// Message of the `OUTPUT_VALIDATION` error.
pub const OUTPUT_VALIDATION_MESSAGE: &str = "Output validation failed";

// ============================================================================
// USER ERRORS
// ============================================================================

/// A user-declared error variant set.
///
/// Implementations serialize as an object whose `type` field equals
/// [`kind`](Self::kind). Use [`action_errors!`](crate::action_errors) rather
/// than implementing this by hand.
pub trait UserError: Serialize + Clone + fmt::Debug + Send + Sync + 'static {
    /// The literal `type` discriminant of this error.
    fn kind(&self) -> &'static str;
}

/// Error set of an action that declares no errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoErrors {}

impl UserError for NoErrors {
    fn kind(&self) -> &'static str {
        match *self {}
    }
}

/// Error-factory handle passed to handlers.
///
/// ```rust,ignore
/// .handler(|args| async move {
///     if missing {
///         return args.errors.raise(TodoError::not_found("42"));
///     }
///     Ok(Reply::Data(todo))
/// })
/// ```
pub struct Errors<E> {
    _kind: PhantomData<fn() -> E>,
}

impl<E> Errors<E> {
    pub(crate) fn new() -> Self {
        Self { _kind: PhantomData }
    }

    /// Ends the invocation with a declared error.
    ///
    /// Output validation is skipped for replies built this way.
    pub fn raise<O>(&self, error: impl Into<E>) -> anyhow::Result<Reply<O, E>> {
        Ok(Reply::Error(error.into()))
    }
}

impl<E> Clone for Errors<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Errors<E> {}

impl<E> fmt::Debug for Errors<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Errors")
            .field("kind", &std::any::type_name::<E>())
            .finish()
    }
}

// ============================================================================
// PUBLIC ERROR
// ============================================================================

/// Error observable by callers of an action.
///
/// Serializes to a flat object with a `type` discriminant; validation kinds
/// flatten their formatted issues into the same object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ActionError<E> {
    /// Raw input rejected by the input schema.
    InputValidation {
        /// Fixed description.
        message: String,
        /// Formatted issues.
        #[serde(flatten)]
        issues: ValidationIssues,
    },
    /// A bound argument rejected by its schema.
    BindArgsValidation {
        /// Fixed description.
        message: String,
        /// Formatted issues of the first failing argument.
        #[serde(flatten)]
        issues: ValidationIssues,
    },
    /// Uncaught handler failure, or failure of the thrown-error transformer.
    Unhandled {
        /// Fixed description.
        message: String,
    },
    /// The handler finished without producing a value.
    ImplicitReturn {
        /// Fixed description.
        message: String,
    },
    /// Placeholder error seeding stateful flows before a first call.
    InitialState {
        /// Fixed description.
        message: String,
    },
    /// Input-only validation requested on an action without an input schema.
    NoInputSchema {
        /// Fixed description.
        message: String,
    },
    /// A state the pipeline treats as unreachable, such as an adapter failing
    /// without reporting issues.
    InternalLogic {
        /// What went wrong.
        message: String,
    },
    /// A declared user error.
    #[serde(untagged)]
    User(E),
}

impl<E> ActionError<E> {
    /// `INPUT_VALIDATION` with the given issues.
    pub fn input_validation(issues: ValidationIssues) -> Self {
        Self::InputValidation {
            message: INPUT_VALIDATION_MESSAGE.to_owned(),
            issues,
        }
    }

    /// `BIND_ARGS_VALIDATION` with the given issues.
    pub fn bind_args_validation(issues: ValidationIssues) -> Self {
        Self::BindArgsValidation {
            message: BIND_ARGS_VALIDATION_MESSAGE.to_owned(),
            issues,
        }
    }

    /// `UNHANDLED`.
    pub fn unhandled() -> Self {
        Self::Unhandled {
            message: UNHANDLED_MESSAGE.to_owned(),
        }
    }

    /// `IMPLICIT_RETURN`.
    pub fn implicit_return() -> Self {
        Self::ImplicitReturn {
            message: IMPLICIT_RETURN_MESSAGE.to_owned(),
        }
    }

    /// `INITIAL_STATE`.
    pub fn initial_state() -> Self {
        Self::InitialState {
            message: INITIAL_STATE_MESSAGE.to_owned(),
        }
    }

    /// `NO_INPUT_SCHEMA`.
    pub fn no_input_schema() -> Self {
        Self::NoInputSchema {
            message: NO_INPUT_SCHEMA_MESSAGE.to_owned(),
        }
    }

    /// `INTERNAL_LOGIC` with a description of the broken assumption.
    pub fn internal_logic(message: impl Into<String>) -> Self {
        Self::InternalLogic {
            message: message.into(),
        }
    }

    /// Returns `true` for declared user errors.
    #[must_use]
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }

    /// The declared user error, if this is one.
    #[must_use]
    pub fn as_user(&self) -> Option<&E> {
        match self {
            Self::User(error) => Some(error),
            _ => None,
        }
    }

    /// Formatted issues of validation kinds.
    #[must_use]
    pub fn issues(&self) -> Option<&ValidationIssues> {
        match self {
            Self::InputValidation { issues, .. } | Self::BindArgsValidation { issues, .. } => {
                Some(issues)
            }
            _ => None,
        }
    }
}

impl<E: UserError> ActionError<E> {
    /// The `type` discriminant this error serializes with.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputValidation { .. } => "INPUT_VALIDATION",
            Self::BindArgsValidation { .. } => "BIND_ARGS_VALIDATION",
            Self::Unhandled { .. } => "UNHANDLED",
            Self::ImplicitReturn { .. } => "IMPLICIT_RETURN",
            Self::InitialState { .. } => "INITIAL_STATE",
            Self::NoInputSchema { .. } => "NO_INPUT_SCHEMA",
            Self::InternalLogic { .. } => "INTERNAL_LOGIC",
            Self::User(error) => error.kind(),
        }
    }
}

impl<E: UserError> fmt::Display for ActionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputValidation { message, issues }
            | Self::BindArgsValidation { message, issues } => {
                write!(f, "{}: {message} ({} issue(s))", self.kind(), issues.len())
            }
            Self::Unhandled { message }
            | Self::ImplicitReturn { message }
            | Self::InitialState { message }
            | Self::NoInputSchema { message }
            | Self::InternalLogic { message } => write!(f, "{}: {message}", self.kind()),
            Self::User(error) => write!(f, "{}: {error:?}", error.kind()),
        }
    }
}

impl<E: UserError> std::error::Error for ActionError<E> {}

// ============================================================================
// INTERNAL ERROR
// ============================================================================

/// Error as tracked inside the pipeline, before the public remap.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum InternalError<E> {
    /// The handler's own return value failed the output schema.
    OutputValidation(ValidationIssues),
    /// Any error that is already public.
    Action(ActionError<E>),
}

impl<E> InternalError<E> {
    /// Maps to the caller-visible error; output validation becomes `UNHANDLED`.
    pub(crate) fn into_public(self) -> ActionError<E> {
        match self {
            Self::OutputValidation(issues) => {
                tracing::debug!(?issues, "{OUTPUT_VALIDATION_MESSAGE}");
                ActionError::unhandled()
            }
            Self::Action(error) => error,
        }
    }
}

impl<E> From<ActionError<E>> for InternalError<E> {
    fn from(error: ActionError<E>) -> Self {
        Self::Action(error)
    }
}

// ============================================================================
// THROWN
// ============================================================================

/// Whatever escaped a handler: an error it returned or a panic while it ran.
///
/// Handed to the thrown-error transformer configured with
/// [`ActionBuilder::handle_thrown_error`](crate::ActionBuilder::handle_thrown_error).
#[derive(Debug)]
pub enum Thrown {
    /// The handler future resolved to `Err`.
    Error(anyhow::Error),
    /// The handler panicked; carries the panic message when it was a string.
    Panic(String),
}

impl Thrown {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic with non-string payload".to_owned());
        Self::Panic(message)
    }

    /// Human-readable message of the failure.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Error(error) => error.to_string(),
            Self::Panic(message) => message.clone(),
        }
    }

    /// Downcasts a returned error to a concrete type.
    #[must_use]
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        match self {
            Self::Error(error) => error.downcast_ref::<T>(),
            Self::Panic(_) => None,
        }
    }

    /// Returns `true` when the handler panicked.
    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panic(_))
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(error) => write!(f, "{error:#}"),
            Self::Panic(message) => write!(f, "panic: {message}"),
        }
    }
}

// ============================================================================
// FAILURE / BUILD ERRORS
// ============================================================================

/// An action's error result re-raised as a Rust error.
///
/// Produced by [`Envelope::into_result`](crate::Envelope::into_result).
/// [`Action::owns`](crate::Action::owns) checks whether a failure came from
/// a given action.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("action {action_id} failed: {error}")]
pub struct ActionFailure<E: UserError> {
    /// Identifier of the action that produced the error.
    pub action_id: ActionId,
    /// The public error.
    pub error: ActionError<E>,
}

/// Construction-time failures of the action builder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum BuildError {
    /// A name was configured but it is blank.
    #[error("action name must not be blank")]
    EmptyName,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use warden_schema::{Issue, ValidationErrorFormat, format_issues};

    crate::action_errors! {
        enum TodoError {
            NotFound = "NOT_FOUND" => fn not_found(id: String),
            Locked = "LOCKED" => fn locked(),
        }
    }

    #[test]
    fn system_errors_serialize_with_type_and_message() {
        let err: ActionError<NoErrors> = ActionError::unhandled();
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({ "type": "UNHANDLED", "message": "An unhandled error occurred" })
        );
    }

    #[test]
    fn validation_errors_flatten_issues() {
        let issues = format_issues(
            &[Issue::new("expected string").at(["name"])],
            ValidationErrorFormat::Flattened,
        );
        let err: ActionError<NoErrors> = ActionError::input_validation(issues);
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "type": "INPUT_VALIDATION",
                "message": "Input validation failed",
                "issues": [{ "path": ["name"], "message": "expected string" }]
            })
        );
    }

    #[test]
    fn nested_validation_errors_flatten_groups() {
        let issues = format_issues(
            &[Issue::new("too short").at(["title"]), Issue::new("bad form")],
            ValidationErrorFormat::Nested,
        );
        let err: ActionError<NoErrors> = ActionError::bind_args_validation(issues);
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "type": "BIND_ARGS_VALIDATION",
                "message": "Bind arguments validation failed",
                "formErrors": ["bad form"],
                "fieldErrors": { "title": ["too short"] }
            })
        );
    }

    #[test]
    fn user_errors_serialize_untagged() {
        let err = ActionError::User(TodoError::not_found("42"));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({ "type": "NOT_FOUND", "id": "42" })
        );
        assert_eq!(err.kind(), "NOT_FOUND");
        assert!(err.is_user());

        let locked = ActionError::User(TodoError::locked());
        assert_eq!(serde_json::to_value(&locked).unwrap(), json!({ "type": "LOCKED" }));
    }

    #[test]
    fn output_validation_is_remapped_to_unhandled() {
        let issues = format_issues(&[Issue::new("bad")], ValidationErrorFormat::Flattened);
        let internal: InternalError<NoErrors> = InternalError::OutputValidation(issues);
        assert_eq!(internal.into_public(), ActionError::unhandled());
    }

    #[test]
    fn other_internal_errors_pass_through() {
        let internal: InternalError<TodoError> =
            ActionError::User(TodoError::not_found("1")).into();
        assert_eq!(
            internal.into_public(),
            ActionError::User(TodoError::not_found("1"))
        );
    }

    #[test]
    fn thrown_from_panic_payloads() {
        let from_str = Thrown::from_panic(Box::new("boom"));
        assert_eq!(from_str.message(), "boom");
        assert!(from_str.is_panic());

        let from_string = Thrown::from_panic(Box::new(String::from("kaboom")));
        assert_eq!(from_string.message(), "kaboom");

        let opaque = Thrown::from_panic(Box::new(7_u8));
        assert_eq!(opaque.message(), "panic with non-string payload");
    }

    #[test]
    fn thrown_downcasts_returned_errors() {
        #[derive(Debug, thiserror::Error)]
        #[error("quota exceeded")]
        struct Quota;

        let thrown = Thrown::Error(anyhow::Error::new(Quota));
        assert!(thrown.downcast_ref::<Quota>().is_some());
        assert_eq!(thrown.message(), "quota exceeded");
    }

    #[test]
    fn display_includes_kind() {
        let err: ActionError<TodoError> = ActionError::no_input_schema();
        assert_eq!(
            err.to_string(),
            "NO_INPUT_SCHEMA: No input schema defined for this action"
        );
        let failure = ActionFailure {
            action_id: ActionId::generate(),
            error: ActionError::User(TodoError::locked()),
        };
        assert!(failure.to_string().ends_with("failed: LOCKED: Locked"));
    }

    #[test]
    fn errors_handle_raises_user_error() {
        let errors: Errors<TodoError> = Errors::new();
        let reply = errors.raise::<()>(TodoError::locked()).unwrap();
        assert!(matches!(reply, Reply::Error(TodoError::Locked {})));
    }
}
