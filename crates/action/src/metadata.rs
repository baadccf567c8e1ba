use std::sync::Arc;

use serde_json::Value;

use crate::id::ActionId;
use crate::result::StatefulResult;

/// Per-invocation context handed to the handler and every callback.
///
/// Built fresh for each call. The validated fields are `None` until the
/// corresponding validation has run, so `on_start` always sees them empty.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Metadata<I, O, E> {
    /// Identifier of the action being run.
    pub action_id: ActionId,
    /// Configured action name.
    pub action_name: Option<Arc<str>>,
    /// Input as submitted, before validation.
    pub raw_input: Value,
    /// Bound arguments as submitted, before validation.
    pub raw_bind_args: Vec<Value>,
    /// Input after the input schema ran.
    pub input: Option<I>,
    /// Bound arguments after their schemas ran.
    pub bind_args: Option<Vec<Value>>,
    /// Result of the previous call, in stateful mode only.
    pub prev_result: Option<StatefulResult<O, E>>,
}

impl<I, O, E> Metadata<I, O, E> {
    pub(crate) fn new(
        action_id: ActionId,
        action_name: Option<Arc<str>>,
        raw_input: Value,
        raw_bind_args: Vec<Value>,
        prev_result: Option<StatefulResult<O, E>>,
    ) -> Self {
        Self {
            action_id,
            action_name,
            raw_input,
            raw_bind_args,
            input: None,
            bind_args: None,
            prev_result,
        }
    }

    /// Returns `true` once input and bind-argument validation have passed.
    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.input.is_some() && self.bind_args.is_some()
    }
}
