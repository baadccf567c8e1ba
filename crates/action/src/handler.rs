//! What a handler receives and what it may return.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::Errors;
use crate::metadata::Metadata;
use crate::result::ActionResult;

/// Arguments of one handler invocation.
#[non_exhaustive]
pub struct HandlerArgs<I, O, E> {
    /// Validated input.
    pub input: I,
    /// Validated bound arguments, one per configured bind schema.
    pub bind_args: Vec<Value>,
    /// Factory for the action's declared errors.
    pub errors: Errors<E>,
    /// Invocation metadata with the validated fields populated.
    pub metadata: Arc<Metadata<I, O, E>>,
}

/// What a handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<O, E> {
    /// A value; checked against the output schema when one is configured.
    Data(O),
    /// A declared error; never checked against the output schema.
    Error(E),
    /// An already-built result, for example from another action. Its
    /// success or failure is kept, its action identifier is replaced. A
    /// wrapped success still goes through the output schema.
    Wrapped(ActionResult<O, E>),
    /// No value. Reported as `IMPLICIT_RETURN`.
    Empty,
}

impl<O, E> Reply<O, E> {
    /// Wraps a value. Shorthand for `Ok(Reply::Data(data))` in handlers.
    pub fn data(data: O) -> anyhow::Result<Self> {
        Ok(Self::Data(data))
    }
}

impl<O, E> From<Result<O, E>> for Reply<O, E> {
    fn from(result: Result<O, E>) -> Self {
        match result {
            Ok(data) => Self::Data(data),
            Err(error) => Self::Error(error),
        }
    }
}

impl<O, E> From<ActionResult<O, E>> for Reply<O, E> {
    fn from(result: ActionResult<O, E>) -> Self {
        Self::Wrapped(result)
    }
}

impl<O, E> From<Option<O>> for Reply<O, E> {
    fn from(data: Option<O>) -> Self {
        data.map_or(Self::Empty, Self::Data)
    }
}

/// Type-erased handler stored in an action.
pub(crate) type BoxedHandler<I, O, E> = Arc<
    dyn Fn(HandlerArgs<I, O, E>) -> BoxFuture<'static, anyhow::Result<Reply<O, E>>> + Send + Sync,
>;

pub(crate) fn boxed<I, O, E, F, Fut>(handler: F) -> BoxedHandler<I, O, E>
where
    F: Fn(HandlerArgs<I, O, E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Reply<O, E>>> + Send + 'static,
{
    Arc::new(move |args| Box::pin(handler(args)))
}
