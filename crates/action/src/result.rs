//! Result envelopes returned to callers, and the materializer producing them.
//!
//! The pipeline settles on an [`ActionResult`]. The materializer then shapes
//! it into one of three wire envelopes:
//!
//! | Format | Success | Failure |
//! |--------|---------|---------|
//! | api | `{ "success": true, "data": .. }` | `{ "success": false, "error": .. }` |
//! | functional | `{ "type": "ok", "value": .. }` | `{ "type": "err", "error": .. }` |
//! | stateful | api shape + `"values"` | api shape + `"values"` |
//!
//! The action identifier travels with every envelope but is not serialized;
//! read it with `action_id()`.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::config::EnvelopeFormat;
use crate::error::{ActionError, ActionFailure, UserError};
use crate::id::ActionId;

/// Key prefix of framework bookkeeping fields in form submissions.
const FRAMEWORK_KEY_PREFIX: &str = "$ACTION_";

// ============================================================================
// ACTION RESULT
// ============================================================================

/// Settled outcome of one invocation, before it is shaped into an envelope.
///
/// Handlers may also return one through [`Reply::Wrapped`](crate::Reply::Wrapped)
/// to forward another action's outcome; the pipeline keeps the success or
/// failure and stamps its own identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult<O, E> {
    pub(crate) action_id: Option<ActionId>,
    pub(crate) result: Result<O, ActionError<E>>,
}

impl<O, E> ActionResult<O, E> {
    /// Successful outcome, not yet stamped.
    pub fn success(data: O) -> Self {
        Self {
            action_id: None,
            result: Ok(data),
        }
    }

    /// Failed outcome, not yet stamped.
    pub fn failure(error: ActionError<E>) -> Self {
        Self {
            action_id: None,
            result: Err(error),
        }
    }

    pub(crate) fn stamped(action_id: ActionId, result: Result<O, ActionError<E>>) -> Self {
        Self {
            action_id: Some(action_id),
            result,
        }
    }

    /// Identifier of the action that settled this result.
    #[must_use]
    pub fn action_id(&self) -> Option<ActionId> {
        self.action_id
    }

    /// Returns `true` for a successful outcome.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Borrows the outcome.
    pub fn as_result(&self) -> Result<&O, &ActionError<E>> {
        self.result.as_ref()
    }

    /// Consumes into the outcome.
    pub fn into_inner(self) -> Result<O, ActionError<E>> {
        self.result
    }
}

impl<O, E> From<Envelope<O, E>> for ActionResult<O, E> {
    fn from(envelope: Envelope<O, E>) -> Self {
        let (action_id, result) = envelope.into_parts();
        Self {
            action_id: Some(action_id),
            result,
        }
    }
}

// ============================================================================
// ENVELOPES
// ============================================================================

/// `api` envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult<O, E> {
    /// `{ "success": true, "data": .. }`
    Success {
        /// Handler output.
        data: O,
        /// Producing action.
        action_id: ActionId,
    },
    /// `{ "success": false, "error": .. }`
    Failure {
        /// Public error.
        error: ActionError<E>,
        /// Producing action.
        action_id: ActionId,
    },
}

impl<O, E> ApiResult<O, E> {
    fn from_parts(action_id: ActionId, result: Result<O, ActionError<E>>) -> Self {
        match result {
            Ok(data) => Self::Success { data, action_id },
            Err(error) => Self::Failure { error, action_id },
        }
    }

    fn into_parts(self) -> (ActionId, Result<O, ActionError<E>>) {
        match self {
            Self::Success { data, action_id } => (action_id, Ok(data)),
            Self::Failure { error, action_id } => (action_id, Err(error)),
        }
    }

    fn serialize_fields<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error>
    where
        O: Serialize,
        E: Serialize,
    {
        match self {
            Self::Success { data, .. } => {
                map.serialize_entry("success", &true)?;
                map.serialize_entry("data", data)
            }
            Self::Failure { error, .. } => {
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)
            }
        }
    }
}

impl<O: Serialize, E: Serialize> Serialize for ApiResult<O, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        self.serialize_fields(&mut map)?;
        map.end()
    }
}

/// `functional` envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionalResult<O, E> {
    /// `{ "type": "ok", "value": .. }`
    Ok {
        /// Handler output.
        value: O,
        /// Producing action.
        action_id: ActionId,
    },
    /// `{ "type": "err", "error": .. }`
    Err {
        /// Public error.
        error: ActionError<E>,
        /// Producing action.
        action_id: ActionId,
    },
}

impl<O: Serialize, E: Serialize> Serialize for FunctionalResult<O, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            Self::Ok { value, .. } => {
                map.serialize_entry("type", "ok")?;
                map.serialize_entry("value", value)?;
            }
            Self::Err { error, .. } => {
                map.serialize_entry("type", "err")?;
                map.serialize_entry("error", error)?;
            }
        }
        map.end()
    }
}

/// Stateful envelope: the api shape plus the submitted values.
#[derive(Debug, Clone, PartialEq)]
pub struct StatefulResult<O, E> {
    /// The api-shaped outcome.
    pub result: ApiResult<O, E>,
    /// Submitted raw input, without framework bookkeeping keys.
    pub values: Value,
}

impl<O, E> StatefulResult<O, E> {
    /// Placeholder seeding a stateful flow before the first submission.
    pub(crate) fn initial(action_id: ActionId) -> Self {
        Self {
            result: ApiResult::Failure {
                error: ActionError::initial_state(),
                action_id,
            },
            values: Value::Null,
        }
    }

    pub(crate) fn settled(
        action_id: ActionId,
        result: Result<O, ActionError<E>>,
        raw_input: &Value,
    ) -> Self {
        Self {
            result: ApiResult::from_parts(action_id, result),
            values: echo_values(raw_input),
        }
    }

    /// Identifier of the producing action.
    #[must_use]
    pub fn action_id(&self) -> ActionId {
        match &self.result {
            ApiResult::Success { action_id, .. } | ApiResult::Failure { action_id, .. } => {
                *action_id
            }
        }
    }

    /// Returns `true` for a successful outcome.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.result, ApiResult::Success { .. })
    }

    /// Returns `true` for the `INITIAL_STATE` placeholder.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        matches!(
            &self.result,
            ApiResult::Failure {
                error: ActionError::InitialState { .. },
                ..
            }
        )
    }
}

impl<O: Serialize, E: Serialize> Serialize for StatefulResult<O, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        self.result.serialize_fields(&mut map)?;
        map.serialize_entry("values", &self.values)?;
        map.end()
    }
}

/// Result returned by an action, in the shape its configuration selects.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<O, E> {
    /// `api` format.
    Api(ApiResult<O, E>),
    /// `functional` format.
    Functional(FunctionalResult<O, E>),
    /// Stateful format.
    Stateful(StatefulResult<O, E>),
}

impl<O, E> Envelope<O, E> {
    /// Identifier of the producing action.
    #[must_use]
    pub fn action_id(&self) -> ActionId {
        match self {
            Self::Api(ApiResult::Success { action_id, .. } | ApiResult::Failure { action_id, .. })
            | Self::Functional(
                FunctionalResult::Ok { action_id, .. } | FunctionalResult::Err { action_id, .. },
            ) => *action_id,
            Self::Stateful(stateful) => stateful.action_id(),
        }
    }

    /// Returns `true` for a successful outcome.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.data().is_some()
    }

    /// Handler output, when successful.
    #[must_use]
    pub fn data(&self) -> Option<&O> {
        match self {
            Self::Api(ApiResult::Success { data, .. })
            | Self::Functional(FunctionalResult::Ok { value: data, .. })
            | Self::Stateful(StatefulResult {
                result: ApiResult::Success { data, .. },
                ..
            }) => Some(data),
            _ => None,
        }
    }

    /// Public error, when failed.
    #[must_use]
    pub fn error(&self) -> Option<&ActionError<E>> {
        match self {
            Self::Api(ApiResult::Failure { error, .. })
            | Self::Functional(FunctionalResult::Err { error, .. })
            | Self::Stateful(StatefulResult {
                result: ApiResult::Failure { error, .. },
                ..
            }) => Some(error),
            _ => None,
        }
    }

    /// Echoed submitted values of a stateful envelope.
    #[must_use]
    pub fn values(&self) -> Option<&Value> {
        match self {
            Self::Stateful(stateful) => Some(&stateful.values),
            _ => None,
        }
    }

    /// The stateful envelope, if this is one.
    #[must_use]
    pub fn into_stateful(self) -> Option<StatefulResult<O, E>> {
        match self {
            Self::Stateful(stateful) => Some(stateful),
            _ => None,
        }
    }

    fn into_parts(self) -> (ActionId, Result<O, ActionError<E>>) {
        match self {
            Self::Api(api) => api.into_parts(),
            Self::Functional(FunctionalResult::Ok { value, action_id }) => (action_id, Ok(value)),
            Self::Functional(FunctionalResult::Err { error, action_id }) => {
                (action_id, Err(error))
            }
            Self::Stateful(stateful) => stateful.result.into_parts(),
        }
    }
}

impl<O, E: UserError> Envelope<O, E> {
    /// Unwraps the output, re-raising a failure as an identifier-tagged error.
    ///
    /// ```rust,ignore
    /// let todo = create_todo.run(json!({ "title": "x" })).await.into_result()?;
    /// ```
    pub fn into_result(self) -> Result<O, ActionFailure<E>> {
        let (action_id, result) = self.into_parts();
        result.map_err(|error| ActionFailure { action_id, error })
    }
}

impl<O: Serialize, E: Serialize> Serialize for Envelope<O, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Api(api) => api.serialize(serializer),
            Self::Functional(functional) => functional.serialize(serializer),
            Self::Stateful(stateful) => stateful.serialize(serializer),
        }
    }
}

// ============================================================================
// MATERIALIZER
// ============================================================================

/// Shapes a stamped result into the configured envelope.
pub(crate) fn materialize<O, E>(
    action_id: ActionId,
    result: Result<O, ActionError<E>>,
    format: EnvelopeFormat,
    raw_input: &Value,
) -> Envelope<O, E> {
    match format {
        EnvelopeFormat::Api => Envelope::Api(ApiResult::from_parts(action_id, result)),
        EnvelopeFormat::Functional => Envelope::Functional(match result {
            Ok(value) => FunctionalResult::Ok { value, action_id },
            Err(error) => FunctionalResult::Err { error, action_id },
        }),
        EnvelopeFormat::Stateful => {
            Envelope::Stateful(StatefulResult::settled(action_id, result, raw_input))
        }
    }
}

/// Placeholder result in the configured envelope, carrying `INITIAL_STATE`.
pub(crate) fn initial<O, E>(action_id: ActionId, format: EnvelopeFormat) -> Envelope<O, E> {
    match format {
        EnvelopeFormat::Stateful => Envelope::Stateful(StatefulResult::initial(action_id)),
        other => materialize(
            action_id,
            Err(ActionError::initial_state()),
            other,
            &Value::Null,
        ),
    }
}

/// Copy of the submitted input with framework bookkeeping keys removed.
///
/// Only top-level object keys are inspected; other values are echoed as-is.
pub(crate) fn echo_values(raw_input: &Value) -> Value {
    match raw_input {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .filter(|(key, _)| !key.starts_with(FRAMEWORK_KEY_PREFIX))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NoErrors;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    crate::action_errors! {
        enum FormError {
            Taken = "TAKEN" => fn taken(field: String),
        }
    }

    fn id() -> ActionId {
        ActionId::generate()
    }

    #[test]
    fn api_success_shape() {
        let envelope: Envelope<&str, NoErrors> =
            materialize(id(), Ok("success"), EnvelopeFormat::Api, &Value::Null);
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({ "success": true, "data": "success" })
        );
    }

    #[test]
    fn api_failure_shape() {
        let envelope: Envelope<(), FormError> = materialize(
            id(),
            Err(ActionError::User(FormError::taken("email"))),
            EnvelopeFormat::Api,
            &Value::Null,
        );
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({ "success": false, "error": { "type": "TAKEN", "field": "email" } })
        );
    }

    #[test]
    fn functional_shapes() {
        let ok: Envelope<u32, NoErrors> =
            materialize(id(), Ok(7), EnvelopeFormat::Functional, &Value::Null);
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({ "type": "ok", "value": 7 })
        );

        let err: Envelope<u32, NoErrors> = materialize(
            id(),
            Err(ActionError::unhandled()),
            EnvelopeFormat::Functional,
            &Value::Null,
        );
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "type": "err",
                "error": { "type": "UNHANDLED", "message": "An unhandled error occurred" }
            })
        );
    }

    #[test]
    fn stateful_echoes_values_without_framework_keys() {
        let raw = json!({
            "email": "a@b.c",
            "$ACTION_ID_abc123": "",
            "$ACTION_REF_1": "",
            "remember": "on"
        });
        let envelope: Envelope<(), NoErrors> =
            materialize(id(), Ok(()), EnvelopeFormat::Stateful, &raw);
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "success": true,
                "data": null,
                "values": { "email": "a@b.c", "remember": "on" }
            })
        );
    }

    #[test]
    fn echo_keeps_non_object_input() {
        assert_eq!(echo_values(&json!([1, 2])), json!([1, 2]));
        assert_eq!(echo_values(&json!("plain")), json!("plain"));
    }

    #[test]
    fn identifier_is_carried_but_not_serialized() {
        let action_id = id();
        let envelope: Envelope<u8, NoErrors> =
            materialize(action_id, Ok(1), EnvelopeFormat::Api, &Value::Null);
        assert_eq!(envelope.action_id(), action_id);
        let text = serde_json::to_string(&envelope).unwrap();
        assert!(!text.contains(&action_id.to_string()));
    }

    #[test]
    fn initial_placeholder_per_format() {
        let action_id = id();
        for format in [
            EnvelopeFormat::Api,
            EnvelopeFormat::Functional,
            EnvelopeFormat::Stateful,
        ] {
            let envelope: Envelope<u8, NoErrors> = initial(action_id, format);
            assert_eq!(envelope.action_id(), action_id);
            assert_eq!(envelope.error(), Some(&ActionError::initial_state()));
        }

        let stateful: Envelope<u8, NoErrors> = initial(action_id, EnvelopeFormat::Stateful);
        assert!(stateful.clone().into_stateful().unwrap().is_initial());
        assert_eq!(stateful.values(), Some(&Value::Null));
    }

    #[test]
    fn into_result_tags_failure_with_identifier() {
        let action_id = id();
        let envelope: Envelope<u8, FormError> = materialize(
            action_id,
            Err(ActionError::User(FormError::taken("name"))),
            EnvelopeFormat::Functional,
            &Value::Null,
        );
        let failure = envelope.into_result().unwrap_err();
        assert_eq!(failure.action_id, action_id);
        assert_eq!(failure.error, ActionError::User(FormError::taken("name")));

        let ok: Envelope<u8, FormError> =
            materialize(action_id, Ok(3), EnvelopeFormat::Api, &Value::Null);
        assert_eq!(ok.into_result().unwrap(), 3);
    }

    #[test]
    fn envelope_converts_back_to_action_result() {
        let action_id = id();
        let envelope: Envelope<u8, NoErrors> =
            materialize(action_id, Ok(9), EnvelopeFormat::Stateful, &json!({}));
        let result = ActionResult::from(envelope);
        assert_eq!(result.action_id(), Some(action_id));
        assert_eq!(result.into_inner(), Ok(9));
    }
}
