//! The execution pipeline.
//!
//! ```text
//! Start ─▶ ValidatingBindArgs ─▶ ValidatingInput ─▶ Invoking ─▶ ValidatingOutput ─▶ Succeeded
//!              │                     │                │               │
//!              └─────────────────────┴────────────────┴───────────────┴──────────▶ Errored
//! ```
//!
//! Every failure is converted into a typed error at the stage that produced
//! it. Both terminal states stamp the action identifier, fire `on_success` or
//! `on_error`, then fire `on_settled`. Shaping the result into an envelope is
//! left to the caller.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::{Value, json};
use tracing::Instrument;

use crate::callbacks::{
    CallbackStage, Callbacks, ErrorEvent, SettledEvent, StartEvent, SuccessEvent, fire,
};
use crate::config::ActionConfig;
use crate::error::{ActionError, Errors, InternalError, Thrown, UserError};
use crate::handler::{BoxedHandler, HandlerArgs, Reply};
use crate::id::ActionId;
use crate::logger::ActionLogger;
use crate::metadata::Metadata;
use crate::result::{ActionResult, StatefulResult};
use crate::validation::{
    BindSchema, InputSlot, OutputSchema, validate_bind_args, validate_input, validate_output,
};

/// Converts whatever escaped a handler into a declared error.
pub(crate) type ThrownTransformer<E> = Arc<dyn Fn(&Thrown) -> E + Send + Sync>;

/// Everything an action needs to run, fixed at build time.
pub(crate) struct Descriptor<I, O, E> {
    pub(crate) config: ActionConfig,
    pub(crate) name: Option<Arc<str>>,
    pub(crate) input: InputSlot<I>,
    pub(crate) bind_schemas: Vec<BindSchema>,
    pub(crate) output_schema: Option<OutputSchema<O>>,
    pub(crate) handler: BoxedHandler<I, O, E>,
    pub(crate) callbacks: Callbacks<I, O, E>,
    pub(crate) transformer: Option<ThrownTransformer<E>>,
    pub(crate) logger: Option<Arc<dyn ActionLogger>>,
}

impl<I, O, E> fmt::Debug for Descriptor<I, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("config", &self.config)
            .field("input", &self.input)
            .field("bind_schemas", &self.bind_schemas.len())
            .field("output_schema", &self.output_schema.is_some())
            .field("callbacks", &self.callbacks)
            .field("transformer", &self.transformer.is_some())
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

/// One invocation's submitted data.
#[derive(Debug)]
pub(crate) struct Invocation<O, E> {
    pub(crate) raw_input: Value,
    pub(crate) raw_bind_args: Vec<Value>,
    /// Set in stateful mode only.
    pub(crate) prev_result: Option<StatefulResult<O, E>>,
}

/// A finished invocation, ready for the materializer.
#[derive(Debug)]
pub(crate) struct Settled<I, O, E> {
    pub(crate) result: ActionResult<O, E>,
    pub(crate) metadata: Arc<Metadata<I, O, E>>,
}

impl<I, O, E> Descriptor<I, O, E>
where
    I: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
    E: UserError,
{
    /// Runs one invocation to completion. Never fails: every error ends up in
    /// the settled result.
    pub(crate) async fn execute(
        &self,
        action_id: ActionId,
        invocation: Invocation<O, E>,
    ) -> Settled<I, O, E> {
        let span = tracing::debug_span!(
            "action.run",
            action_id = %action_id,
            action_name = self.name.as_deref().unwrap_or(""),
        );
        self.execute_inner(action_id, invocation).instrument(span).await
    }

    async fn execute_inner(
        &self,
        action_id: ActionId,
        invocation: Invocation<O, E>,
    ) -> Settled<I, O, E> {
        let Invocation {
            raw_input,
            raw_bind_args,
            prev_result,
        } = invocation;

        let base = Arc::new(Metadata::new(
            action_id,
            self.name.clone(),
            raw_input,
            raw_bind_args,
            prev_result,
        ));
        let logger = self.logger.as_deref();

        fire(
            CallbackStage::Start,
            self.callbacks.on_start.as_ref(),
            StartEvent {
                metadata: Arc::clone(&base),
            },
            logger,
        )
        .await;

        let (outcome, metadata) = self.settle(&base).await;
        let outcome = outcome.map_err(InternalError::into_public);

        match &outcome {
            Ok(_) => tracing::debug!("action succeeded"),
            Err(error) => tracing::debug!(error = error.kind(), "action failed"),
        }

        match &outcome {
            Ok(data) => {
                fire(
                    CallbackStage::Success,
                    self.callbacks.on_success.as_ref(),
                    SuccessEvent {
                        data: data.clone(),
                        metadata: Arc::clone(&metadata),
                    },
                    logger,
                )
                .await;
            }
            Err(error) => {
                fire(
                    CallbackStage::Error,
                    self.callbacks.on_error.as_ref(),
                    ErrorEvent {
                        error: error.clone(),
                        metadata: Arc::clone(&metadata),
                    },
                    logger,
                )
                .await;
            }
        }

        let result = ActionResult::stamped(action_id, outcome);
        fire(
            CallbackStage::Settled,
            self.callbacks.on_settled.as_ref(),
            SettledEvent {
                result: result.clone(),
                metadata: Arc::clone(&metadata),
            },
            logger,
        )
        .await;

        Settled { result, metadata }
    }

    /// Validation and invocation. Returns the outcome together with the most
    /// complete metadata reached.
    async fn settle(
        &self,
        base: &Arc<Metadata<I, O, E>>,
    ) -> (Result<O, InternalError<E>>, Arc<Metadata<I, O, E>>) {
        let format = self.config.validation_error_format;

        let bind_args =
            match validate_bind_args(&self.bind_schemas, &base.raw_bind_args, format).await {
                Ok(bind_args) => bind_args,
                Err(error) => return (Err(error.into()), Arc::clone(base)),
            };

        let bound = Metadata {
            bind_args: Some(bind_args.clone()),
            ..(**base).clone()
        };

        let input = match validate_input(&self.input, &base.raw_input, format).await {
            Ok(input) => input,
            Err(error) => return (Err(error.into()), Arc::new(bound)),
        };

        let metadata = Arc::new(Metadata {
            input: Some(input.clone()),
            ..bound
        });

        let args = HandlerArgs {
            input,
            bind_args,
            errors: Errors::new(),
            metadata: Arc::clone(&metadata),
        };

        let outcome = match invoke(&self.handler, args).await {
            Ok(Reply::Data(data)) => {
                validate_output(self.output_schema.as_ref(), data, format).await
            }
            Ok(Reply::Error(error)) => Err(ActionError::User(error).into()),
            Ok(Reply::Wrapped(wrapped)) => match wrapped.into_inner() {
                Ok(data) => validate_output(self.output_schema.as_ref(), data, format).await,
                Err(error) => Err(error.into()),
            },
            Ok(Reply::Empty) => Err(ActionError::implicit_return().into()),
            Err(thrown) => Err(self.recover(&thrown).into()),
        };

        (outcome, metadata)
    }

    /// Maps a thrown failure through the transformer, degrading to `UNHANDLED`.
    fn recover(&self, thrown: &Thrown) -> ActionError<E> {
        let Some(transformer) = &self.transformer else {
            tracing::error!(error = %thrown, "action handler failed");
            return ActionError::unhandled();
        };

        match std::panic::catch_unwind(AssertUnwindSafe(|| transformer(thrown))) {
            Ok(error) => ActionError::User(error),
            Err(payload) => {
                let failure = Thrown::from_panic(payload);
                tracing::warn!(
                    error = %thrown,
                    transformer_error = %failure,
                    "thrown-error transformer failed"
                );
                if let Some(logger) = &self.logger {
                    logger.warn(
                        "handleThrownError failed",
                        Some(&json!({
                            "error": thrown.to_string(),
                            "transformerError": failure.to_string(),
                        })),
                    );
                }
                ActionError::unhandled()
            }
        }
    }
}

/// Calls the handler, catching panics raised while calling or polling it.
async fn invoke<I, O, E>(
    handler: &BoxedHandler<I, O, E>,
    args: HandlerArgs<I, O, E>,
) -> Result<Reply<O, E>, Thrown> {
    let future = std::panic::catch_unwind(AssertUnwindSafe(|| handler(args)))
        .map_err(Thrown::from_panic)?;

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(error)) => Err(Thrown::Error(error)),
        Err(payload) => Err(Thrown::from_panic(payload)),
    }
}
