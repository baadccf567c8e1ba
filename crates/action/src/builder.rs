//! Fluent, type-state construction of an [`Action`].
//!
//! ```rust,ignore
//! let create_todo = ActionBuilder::new()
//!     .name("createTodo")
//!     .input_schema(json::<NewTodo>())
//!     .errors::<TodoError>()
//!     .handler(|args| async move { Reply::data(store.insert(args.input).await?) })
//!     .on_settled(|event| async move { audit(event.result).await })
//!     .build()?;
//! ```
//!
//! Every setter consumes the builder and returns a new one. Settings whose
//! types depend on earlier choices are dropped when those choices change:
//!
//! - [`input_schema`](ActionBuilder::input_schema) and
//!   [`errors`](ActionBuilder::errors) happen before a handler exists, so the
//!   handler and callbacks are never carried across them;
//!   `errors` also clears the thrown-error transformer.
//! - [`HandledBuilder::handler`] replaces the handler and clears the output
//!   schema and every callback.
//!
//! An action cannot be built without a handler: `build` only exists on
//! [`HandledBuilder`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use warden_schema::{Schema, ValidationErrorFormat};

use crate::action::Action;
use crate::callbacks::{self, Callbacks, ErrorEvent, SettledEvent, StartEvent, SuccessEvent};
use crate::config::{ActionConfig, ResultFormat};
use crate::error::{BuildError, NoErrors, Thrown, UserError};
use crate::handler::{self, BoxedHandler, HandlerArgs, Reply};
use crate::logger::ActionLogger;
use crate::pipeline::{Descriptor, ThrownTransformer};
use crate::validation::{BindSchema, ErasedBind, InputSlot, OutputSchema};

// ============================================================================
// ACTION BUILDER
// ============================================================================

/// Configures an action up to its handler.
///
/// `I` is the validated input type (`()` until an input schema is set) and
/// `E` the declared error set ([`NoErrors`] until [`errors`](Self::errors)).
pub struct ActionBuilder<I = (), E = NoErrors> {
    config: ActionConfig,
    input: InputSlot<I>,
    bind_schemas: Vec<BindSchema>,
    transformer: Option<ThrownTransformer<E>>,
    logger: Option<Arc<dyn ActionLogger>>,
}

impl ActionBuilder {
    /// Starts an action with no schemas, no declared errors and default
    /// configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ActionConfig::default(),
            input: InputSlot::absent(),
            bind_schemas: Vec::new(),
            transformer: None,
            logger: None,
        }
    }
}

impl Default for ActionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, E> ActionBuilder<I, E> {
    /// Replaces the whole serializable configuration, name included.
    pub fn config(mut self, config: ActionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the action name shown in metadata and logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Selects the envelope shape of non-stateful results.
    pub fn result_format(mut self, format: ResultFormat) -> Self {
        self.config.result_format = format;
        self
    }

    /// Selects how validation issues are shaped inside errors.
    pub fn validation_error_format(mut self, format: ValidationErrorFormat) -> Self {
        self.config.validation_error_format = format;
        self
    }

    /// Forces the stateful envelope.
    pub fn stateful(mut self, stateful: bool) -> Self {
        self.config.stateful = stateful;
        self
    }

    /// Reports callback and transformer failures to `logger`.
    pub fn logger(mut self, logger: impl ActionLogger + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Validates (and transforms) the raw input with `schema`.
    ///
    /// The handler receives the schema's output as its input.
    pub fn input_schema<S>(self, schema: S) -> ActionBuilder<S::Output, E>
    where
        S: Schema + 'static,
    {
        ActionBuilder {
            config: self.config,
            input: InputSlot::Schema(Arc::new(schema)),
            bind_schemas: self.bind_schemas,
            transformer: self.transformer,
            logger: self.logger,
        }
    }

    /// Appends a schema for the next positional bound argument.
    ///
    /// The validated value reaches the handler as JSON.
    pub fn bind_schema<S>(mut self, schema: S) -> Self
    where
        S: Schema + 'static,
        S::Output: Serialize,
    {
        self.bind_schemas.push(ErasedBind::boxed(schema));
        self
    }

    /// Replaces all bound-argument schemas, one per position.
    pub fn bind_schemas<S>(mut self, schemas: impl IntoIterator<Item = S>) -> Self
    where
        S: Schema + 'static,
        S::Output: Serialize,
    {
        self.bind_schemas = schemas.into_iter().map(ErasedBind::boxed).collect();
        self
    }

    /// Declares the user errors the handler may return.
    pub fn errors<E2: UserError>(self) -> ActionBuilder<I, E2> {
        ActionBuilder {
            config: self.config,
            input: self.input,
            bind_schemas: self.bind_schemas,
            transformer: None,
            logger: self.logger,
        }
    }

    /// Converts a failed or panicking handler into a declared error instead
    /// of `UNHANDLED`.
    ///
    /// If the transformer itself panics, the result is `UNHANDLED` and the
    /// failure is reported on the logger's `warn` channel.
    pub fn handle_thrown_error<F>(mut self, transformer: F) -> Self
    where
        F: Fn(&Thrown) -> E + Send + Sync + 'static,
    {
        self.transformer = Some(Arc::new(transformer));
        self
    }

    /// Sets the business logic, fixing the output type.
    pub fn handler<O, F, Fut>(self, handler: F) -> HandledBuilder<I, O, E>
    where
        F: Fn(HandlerArgs<I, O, E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Reply<O, E>>> + Send + 'static,
    {
        HandledBuilder {
            base: self,
            handler: handler::boxed(handler),
            output_schema: None,
            callbacks: Callbacks::default(),
        }
    }
}

impl<I, E> fmt::Debug for ActionBuilder<I, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionBuilder")
            .field("config", &self.config)
            .field("input", &self.input)
            .field("bind_schemas", &self.bind_schemas.len())
            .field("transformer", &self.transformer.is_some())
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

// ============================================================================
// HANDLED BUILDER
// ============================================================================

/// An action with a handler: output schema, callbacks, then [`build`](Self::build).
pub struct HandledBuilder<I, O, E> {
    base: ActionBuilder<I, E>,
    handler: BoxedHandler<I, O, E>,
    output_schema: Option<OutputSchema<O>>,
    callbacks: Callbacks<I, O, E>,
}

impl<I, O, E> HandledBuilder<I, O, E> {
    /// Replaces the handler. Clears the output schema and all callbacks.
    pub fn handler<O2, F, Fut>(self, handler: F) -> HandledBuilder<I, O2, E>
    where
        F: Fn(HandlerArgs<I, O2, E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Reply<O2, E>>> + Send + 'static,
    {
        self.base.handler(handler)
    }

    /// Checks (and may transform) every value the handler returns.
    ///
    /// Declared errors and wrapped results are never checked. A failure
    /// reaches callers as `UNHANDLED`.
    pub fn output_schema<S>(mut self, schema: S) -> Self
    where
        S: Schema<O, Output = O> + 'static,
    {
        self.output_schema = Some(Arc::new(schema));
        self
    }

    /// Runs before any validation.
    pub fn on_start<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(StartEvent<I, O, E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.callbacks.on_start = Some(callbacks::boxed(callback));
        self
    }

    /// Runs after a successful outcome.
    pub fn on_success<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(SuccessEvent<I, O, E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.callbacks.on_success = Some(callbacks::boxed(callback));
        self
    }

    /// Runs after a failed outcome, with the error callers will see.
    pub fn on_error<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(ErrorEvent<I, O, E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.callbacks.on_error = Some(callbacks::boxed(callback));
        self
    }

    /// Runs exactly once per invocation, after every other callback.
    pub fn on_settled<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(SettledEvent<I, O, E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.callbacks.on_settled = Some(callbacks::boxed(callback));
        self
    }

    /// Finalizes the action and assigns its identifier.
    pub fn build(self) -> Result<Action<I, O, E>, BuildError> {
        let ActionBuilder {
            config,
            input,
            bind_schemas,
            transformer,
            logger,
        } = self.base;

        let name = match config.name.as_deref() {
            Some(name) if name.trim().is_empty() => return Err(BuildError::EmptyName),
            Some(name) => Some(Arc::from(name)),
            None => None,
        };

        Ok(Action::new(Descriptor {
            config,
            name,
            input,
            bind_schemas,
            output_schema: self.output_schema,
            handler: self.handler,
            callbacks: self.callbacks,
            transformer,
            logger,
        }))
    }
}

impl<I, O, E> fmt::Debug for HandledBuilder<I, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandledBuilder")
            .field("base", &self.base)
            .field("output_schema", &self.output_schema.is_some())
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvelopeFormat;
    use serde_json::Value;
    use warden_schema::{Outcome, from_fn, json};

    crate::action_errors! {
        enum DemoError {
            Failed = "FAILED" => fn failed(),
        }
    }

    fn noop() -> HandledBuilder<(), u8, NoErrors> {
        ActionBuilder::new().handler(|_| async { Reply::data(1) })
    }

    #[test]
    fn setters_update_config() {
        let action = ActionBuilder::new()
            .name("demo")
            .result_format(ResultFormat::Functional)
            .validation_error_format(ValidationErrorFormat::Nested)
            .handler(|_| async { Reply::data(()) })
            .build()
            .unwrap();

        assert_eq!(action.name(), Some("demo"));
        assert_eq!(action.config().result_format, ResultFormat::Functional);
        assert_eq!(
            action.config().validation_error_format,
            ValidationErrorFormat::Nested
        );
        assert_eq!(action.envelope_format(), EnvelopeFormat::Functional);
    }

    #[test]
    fn stateful_flag_wins_over_result_format() {
        let action = ActionBuilder::new()
            .result_format(ResultFormat::Functional)
            .stateful(true)
            .handler(|_| async { Reply::data(()) })
            .build()
            .unwrap();
        assert_eq!(action.envelope_format(), EnvelopeFormat::Stateful);
    }

    #[test]
    fn config_replaces_previous_settings() {
        let config = ActionConfig::from_json(r#"{ "name": "fromJson" }"#).unwrap();
        let builder = ActionBuilder::new().name("first").stateful(true).config(config);
        let action = builder.handler(|_| async { Reply::data(()) }).build().unwrap();
        assert_eq!(action.name(), Some("fromJson"));
        assert!(!action.config().stateful);
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = ActionBuilder::new()
            .name("   ")
            .handler(|_| async { Reply::data(()) })
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::EmptyName);
    }

    #[test]
    fn unnamed_action_builds() {
        let action = noop().build().unwrap();
        assert_eq!(action.name(), None);
    }

    #[test]
    fn errors_clears_transformer() {
        let builder = ActionBuilder::new()
            .errors::<DemoError>()
            .handle_thrown_error(|_| DemoError::failed());
        assert!(builder.transformer.is_some());

        let builder = builder.errors::<DemoError>();
        assert!(builder.transformer.is_none());
    }

    #[test]
    fn input_schema_keeps_other_settings() {
        let builder = ActionBuilder::new()
            .name("typed")
            .bind_schema(json::<u32>())
            .input_schema(json::<String>());
        assert!(builder.input.is_configured());
        assert_eq!(builder.bind_schemas.len(), 1);
        assert_eq!(builder.config.name.as_deref(), Some("typed"));
    }

    #[test]
    fn bind_schemas_replace_list() {
        let builder = ActionBuilder::new()
            .bind_schema(json::<u32>())
            .bind_schemas([json::<String>(), json::<String>()]);
        assert_eq!(builder.bind_schemas.len(), 2);
    }

    #[test]
    fn replacing_handler_clears_callbacks_and_output_schema() {
        let handled = noop()
            .output_schema(from_fn(|n: &u8| Outcome::Valid(*n)))
            .on_start(|_| async { Ok(()) })
            .on_settled(|_| async { Ok(()) });
        assert!(handled.output_schema.is_some());
        assert!(handled.callbacks.on_start.is_some());

        let replaced = handled.handler(|_| async { Reply::data(Value::Null) });
        assert!(replaced.output_schema.is_none());
        assert!(replaced.callbacks.on_start.is_none());
        assert!(replaced.callbacks.on_settled.is_none());
    }

    #[test]
    fn every_build_gets_a_fresh_identifier() {
        let first = noop().build().unwrap();
        let second = noop().build().unwrap();
        assert_ne!(first.id(), second.id());
        assert_eq!(first.id(), first.clone().id());
    }
}
