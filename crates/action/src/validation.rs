//! Validation stage: input, bound arguments and handler output.
//!
//! Each step runs its schema adapter and turns a failure into the matching
//! error kind. An adapter that fails without reporting any issue is treated as
//! a defect and surfaces as `INTERNAL_LOGIC`.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use warden_schema::{BoxFuture, Issue, Outcome, Schema, ValidationErrorFormat, format_issues};

use crate::error::{ActionError, InternalError};

/// Type-erased bound-argument schema. Typed outputs are stored as JSON.
pub(crate) type BindSchema = Arc<dyn Schema<Value, Output = Value>>;

/// Type-erased output schema.
pub(crate) type OutputSchema<O> = Arc<dyn Schema<O, Output = O>>;

/// Where an action's validated input comes from.
pub(crate) enum InputSlot<I> {
    /// No input schema: the handler receives this placeholder.
    Absent(fn() -> I),
    /// Input is produced by the schema.
    Schema(Arc<dyn Schema<Value, Output = I>>),
}

impl InputSlot<()> {
    pub(crate) fn absent() -> Self {
        Self::Absent(|| ())
    }
}

impl<I> InputSlot<I> {
    pub(crate) fn is_configured(&self) -> bool {
        matches!(self, Self::Schema(_))
    }
}

impl<I> Clone for InputSlot<I> {
    fn clone(&self) -> Self {
        match self {
            Self::Absent(placeholder) => Self::Absent(*placeholder),
            Self::Schema(schema) => Self::Schema(Arc::clone(schema)),
        }
    }
}

impl<I> fmt::Debug for InputSlot<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent(_) => f.write_str("InputSlot::Absent"),
            Self::Schema(_) => f.write_str("InputSlot::Schema"),
        }
    }
}

// ============================================================================
// ERASED BIND SCHEMA
// ============================================================================

/// Adapts a schema with a serializable output to a [`BindSchema`].
pub(crate) struct ErasedBind<S> {
    inner: S,
}

impl<S> ErasedBind<S>
where
    S: Schema + 'static,
    S::Output: Serialize,
{
    pub(crate) fn boxed(inner: S) -> BindSchema {
        Arc::new(Self { inner })
    }
}

impl<S> Schema for ErasedBind<S>
where
    S: Schema,
    S::Output: Serialize,
{
    type Output = Value;

    fn validate<'a>(&'a self, value: &'a Value) -> BoxFuture<'a, Outcome<Value>> {
        Box::pin(async move {
            match self.inner.validate(value).await {
                Outcome::Valid(output) => match serde_json::to_value(output) {
                    Ok(json) => Outcome::Valid(json),
                    Err(error) => Outcome::invalid(Issue::new(format!(
                        "validated argument is not representable as JSON: {error}"
                    ))),
                },
                Outcome::Invalid(issues) => Outcome::Invalid(issues),
            }
        })
    }
}

// ============================================================================
// STEPS
// ============================================================================

/// Runs the input schema, or yields the placeholder when none is configured.
pub(crate) async fn validate_input<I, E>(
    slot: &InputSlot<I>,
    raw_input: &Value,
    format: ValidationErrorFormat,
) -> Result<I, ActionError<E>>
where
    I: Send + 'static,
{
    let schema = match slot {
        InputSlot::Absent(placeholder) => return Ok(placeholder()),
        InputSlot::Schema(schema) => schema,
    };

    match schema.validate(raw_input).await {
        Outcome::Valid(input) => Ok(input),
        Outcome::Invalid(issues) if issues.is_empty() => Err(ActionError::internal_logic(
            "input schema rejected the value without reporting issues",
        )),
        Outcome::Invalid(issues) => Err(ActionError::input_validation(format_issues(
            &issues, format,
        ))),
    }
}

/// Runs each bind schema against the argument at the same position.
///
/// Stops at the first failing argument. A missing argument is validated as
/// `null`; arguments beyond the configured schemas are dropped.
pub(crate) async fn validate_bind_args<E>(
    schemas: &[BindSchema],
    raw_bind_args: &[Value],
    format: ValidationErrorFormat,
) -> Result<Vec<Value>, ActionError<E>> {
    let missing = Value::Null;
    let mut validated = Vec::with_capacity(schemas.len());

    for (position, schema) in schemas.iter().enumerate() {
        let raw = raw_bind_args.get(position).unwrap_or(&missing);
        match schema.validate(raw).await {
            Outcome::Valid(value) => validated.push(value),
            Outcome::Invalid(issues) if issues.is_empty() => {
                return Err(ActionError::internal_logic(format!(
                    "bind schema {position} rejected the value without reporting issues"
                )));
            }
            Outcome::Invalid(issues) => {
                return Err(ActionError::bind_args_validation(format_issues(
                    &issues, format,
                )));
            }
        }
    }

    Ok(validated)
}

/// Runs the output schema over a handler value, when one is configured.
pub(crate) async fn validate_output<O, E>(
    schema: Option<&OutputSchema<O>>,
    data: O,
    format: ValidationErrorFormat,
) -> Result<O, InternalError<E>>
where
    O: Send + Sync + 'static,
{
    let Some(schema) = schema else {
        return Ok(data);
    };

    match schema.validate(&data).await {
        Outcome::Valid(output) => Ok(output),
        Outcome::Invalid(issues) if issues.is_empty() => Err(ActionError::internal_logic(
            "output schema rejected the value without reporting issues",
        )
        .into()),
        Outcome::Invalid(issues) => Err(InternalError::OutputValidation(format_issues(
            &issues, format,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::NoErrors;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use warden_schema::{from_fn, json};

    type Error = ActionError<NoErrors>;

    fn positive() -> BindSchema {
        ErasedBind::boxed(from_fn(|v: &Value| match v.as_i64() {
            Some(n) if n > 0 => Outcome::Valid(n),
            _ => Outcome::invalid(Issue::new("expected a positive integer")),
        }))
    }

    #[tokio::test]
    async fn absent_input_schema_yields_placeholder() {
        let slot = InputSlot::absent();
        let result: Result<(), Error> =
            validate_input(&slot, &json!({ "ignored": true }), ValidationErrorFormat::Flattened)
                .await;
        assert_eq!(result, Ok(()));
        assert!(!slot.is_configured());
    }

    #[tokio::test]
    async fn input_schema_transforms_value() {
        let slot = InputSlot::Schema(Arc::new(from_fn(|v: &Value| match v.as_str() {
            Some(s) => Outcome::Valid(s.trim().to_owned()),
            None => Outcome::invalid(Issue::new("expected string")),
        })));
        let result: Result<String, Error> =
            validate_input(&slot, &json!("  hi "), ValidationErrorFormat::Flattened).await;
        assert_eq!(result.unwrap(), "hi");
    }

    #[tokio::test]
    async fn input_failure_is_formatted() {
        let slot = InputSlot::Schema(Arc::new(json::<String>()));
        let err = validate_input::<String, NoErrors>(
            &slot,
            &json!(123),
            ValidationErrorFormat::Nested,
        )
        .await
        .unwrap_err();
        let issues = err.issues().unwrap();
        assert_eq!(issues.format(), ValidationErrorFormat::Nested);
        assert_eq!(issues.len(), 1);
    }

    #[tokio::test]
    async fn empty_issue_list_is_internal_logic() {
        let slot = InputSlot::Schema(Arc::new(from_fn(|_: &Value| Outcome::<u8>::Invalid(vec![]))));
        let err = validate_input::<u8, NoErrors>(&slot, &json!(1), ValidationErrorFormat::Flattened)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::InternalLogic { .. }));
    }

    #[tokio::test]
    async fn bind_args_stop_at_first_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let spy_calls = Arc::clone(&calls);
        let spy = ErasedBind::boxed(from_fn(move |v: &Value| {
            spy_calls.fetch_add(1, Ordering::SeqCst);
            Outcome::Valid(v.clone())
        }));

        let schemas = vec![positive(), positive(), spy];
        let err = validate_bind_args::<NoErrors>(
            &schemas,
            &[json!(1), json!(-5), json!("x")],
            ValidationErrorFormat::Flattened,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ActionError::BindArgsValidation { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bind_args_pad_missing_and_drop_extra() {
        let optional = ErasedBind::boxed(json::<Option<u8>>());
        let schemas = vec![positive(), optional];

        let short = validate_bind_args::<NoErrors>(
            &schemas,
            &[json!(4)],
            ValidationErrorFormat::Flattened,
        )
        .await
        .unwrap();
        assert_eq!(short, vec![json!(4), Value::Null]);

        let long = validate_bind_args::<NoErrors>(
            &schemas,
            &[json!(4), json!(2), json!("extra")],
            ValidationErrorFormat::Flattened,
        )
        .await
        .unwrap();
        assert_eq!(long, vec![json!(4), json!(2)]);
    }

    #[tokio::test]
    async fn output_failure_stays_internal() {
        let schema: OutputSchema<i64> = Arc::new(from_fn(|n: &i64| {
            if *n < 10 {
                Outcome::Valid(*n)
            } else {
                Outcome::invalid(Issue::new("too large"))
            }
        }));

        let ok = validate_output::<_, NoErrors>(Some(&schema), 3, ValidationErrorFormat::Flattened)
            .await;
        assert_eq!(ok, Ok(3));

        let err = validate_output::<_, NoErrors>(Some(&schema), 30, ValidationErrorFormat::Flattened)
            .await
            .unwrap_err();
        assert!(matches!(err, InternalError::OutputValidation(_)));
        assert_eq!(err.into_public(), ActionError::unhandled());
    }

    #[tokio::test]
    async fn missing_output_schema_passes_data_through() {
        let data = validate_output::<_, NoErrors>(None, "as-is", ValidationErrorFormat::Flattened)
            .await;
        assert_eq!(data, Ok("as-is"));
    }
}
