use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::{ActionConfig, EnvelopeFormat};
use crate::error::{ActionError, ActionFailure, UserError};
use crate::id::ActionId;
use crate::pipeline::{Descriptor, Invocation, Settled};
use crate::result::{self, Envelope, StatefulResult};
use crate::validation;

/// A configured, callable action.
///
/// Built with [`ActionBuilder`](crate::ActionBuilder). Cloning is cheap and
/// clones share the identifier; concurrent invocations share nothing else
/// than the immutable configuration.
///
/// `I` is the validated input (`()` without an input schema), `O` the
/// handler output and `E` the declared user errors.
pub struct Action<I, O, E> {
    inner: Arc<Inner<I, O, E>>,
}

struct Inner<I, O, E> {
    id: ActionId,
    descriptor: Descriptor<I, O, E>,
}

impl<I, O, E> Action<I, O, E> {
    pub(crate) fn new(descriptor: Descriptor<I, O, E>) -> Self {
        let id = ActionId::generate();
        tracing::debug!(
            action_id = %id,
            action_name = descriptor.name.as_deref().unwrap_or(""),
            "action built"
        );
        Self {
            inner: Arc::new(Inner { id, descriptor }),
        }
    }

    /// Identifier fixed at build time and stamped on every result.
    #[must_use]
    pub fn id(&self) -> ActionId {
        self.inner.id
    }

    /// Configured name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.inner.descriptor.name.as_deref()
    }

    /// Serializable configuration.
    #[must_use]
    pub fn config(&self) -> &ActionConfig {
        &self.inner.descriptor.config
    }

    /// Envelope shape produced by [`run`](Self::run).
    #[must_use]
    pub fn envelope_format(&self) -> EnvelopeFormat {
        self.inner.descriptor.config.envelope_format()
    }

    /// Returns `true` when the failure was produced by this action.
    #[must_use]
    pub fn owns(&self, failure: &ActionFailure<E>) -> bool
    where
        E: UserError,
    {
        failure.action_id == self.inner.id
    }

    /// Placeholder result in this action's envelope shape, carrying
    /// `INITIAL_STATE`.
    #[must_use]
    pub fn initial_result(&self) -> Envelope<O, E> {
        result::initial(self.inner.id, self.envelope_format())
    }

    /// Stateful placeholder to seed [`run_stateful`](Self::run_stateful).
    #[must_use]
    pub fn initial_state(&self) -> StatefulResult<O, E> {
        StatefulResult::initial(self.inner.id)
    }
}

impl<I, O, E> Action<I, O, E>
where
    I: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
    E: UserError,
{
    /// Runs the action without bound arguments.
    ///
    /// In stateful mode the previous result is the `INITIAL_STATE`
    /// placeholder.
    pub async fn run(&self, raw_input: Value) -> Envelope<O, E> {
        self.run_with_bind_args(Vec::new(), raw_input).await
    }

    /// Runs the action with positional bound arguments ahead of the input.
    pub async fn run_with_bind_args(
        &self,
        bind_args: Vec<Value>,
        raw_input: Value,
    ) -> Envelope<O, E> {
        let format = self.envelope_format();
        let prev_result = match format {
            EnvelopeFormat::Stateful => Some(self.initial_state()),
            EnvelopeFormat::Api | EnvelopeFormat::Functional => None,
        };

        let settled = self
            .execute(Invocation {
                raw_input,
                raw_bind_args: bind_args,
                prev_result,
            })
            .await;

        result::materialize(
            self.inner.id,
            settled.result.into_inner(),
            format,
            &settled.metadata.raw_input,
        )
    }

    /// Runs the action in stateful mode, whatever its configuration says.
    ///
    /// `prev` is handed to the handler through
    /// [`Metadata::prev_result`](crate::Metadata::prev_result); pass
    /// [`initial_state`](Self::initial_state) on the first submission.
    pub async fn run_stateful(
        &self,
        prev: StatefulResult<O, E>,
        raw_input: Value,
    ) -> StatefulResult<O, E> {
        self.run_stateful_with_bind_args(Vec::new(), prev, raw_input).await
    }

    /// [`run_stateful`](Self::run_stateful) with bound arguments.
    pub async fn run_stateful_with_bind_args(
        &self,
        bind_args: Vec<Value>,
        prev: StatefulResult<O, E>,
        raw_input: Value,
    ) -> StatefulResult<O, E> {
        let settled = self
            .execute(Invocation {
                raw_input,
                raw_bind_args: bind_args,
                prev_result: Some(prev),
            })
            .await;

        StatefulResult::settled(
            self.inner.id,
            settled.result.into_inner(),
            &settled.metadata.raw_input,
        )
    }

    /// Validates a raw input without running the handler or any callback.
    ///
    /// Fails with `NO_INPUT_SCHEMA` when the action has no input schema.
    pub async fn validate_input(&self, raw_input: &Value) -> Result<I, ActionError<E>> {
        let descriptor = &self.inner.descriptor;
        if !descriptor.input.is_configured() {
            return Err(ActionError::no_input_schema());
        }
        validation::validate_input(
            &descriptor.input,
            raw_input,
            descriptor.config.validation_error_format,
        )
        .await
    }

    async fn execute(&self, invocation: Invocation<O, E>) -> Settled<I, O, E> {
        self.inner.descriptor.execute(self.inner.id, invocation).await
    }
}

impl<I, O, E> Clone for Action<I, O, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I, O, E> fmt::Debug for Action<I, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.inner.id)
            .field("name", &self.name())
            .field("descriptor", &self.inner.descriptor)
            .finish()
    }
}
