//! The schema adapter contract.
//!
//! Any validation library plugs into an action by implementing [`Schema`]:
//! given a value, return either the validated (possibly transformed) value or
//! a list of issues. Synchronous adapters return a ready future; callers always
//! await.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::issue::Issue;

/// Boxed, `Send` future returned by [`Schema::validate`].
pub type BoxFuture<'a, T> = futures::future::BoxFuture<'a, T>;

// ============================================================================
// OUTCOME
// ============================================================================

/// Result of running a schema against a value.
///
/// `Invalid` with an empty issue list is not a meaningful failure; consumers
/// treat it as a defect of the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "validation outcomes must be inspected"]
pub enum Outcome<T> {
    /// The value passed; carries the adapter's output.
    Valid(T),
    /// The value failed with the given issues.
    Invalid(Vec<Issue>),
}

impl<T> Outcome<T> {
    /// Failure with a single issue.
    pub fn invalid(issue: Issue) -> Self {
        Self::Invalid(vec![issue])
    }

    /// Returns `true` for [`Outcome::Valid`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Transforms the validated value, leaving issues untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Valid(value) => Outcome::Valid(f(value)),
            Self::Invalid(issues) => Outcome::Invalid(issues),
        }
    }

    /// Converts into a standard `Result`.
    pub fn into_result(self) -> Result<T, Vec<Issue>> {
        match self {
            Self::Valid(value) => Ok(value),
            Self::Invalid(issues) => Err(issues),
        }
    }
}

impl<T> From<Result<T, Vec<Issue>>> for Outcome<T> {
    fn from(result: Result<T, Vec<Issue>>) -> Self {
        match result {
            Ok(value) => Self::Valid(value),
            Err(issues) => Self::Invalid(issues),
        }
    }
}

// ============================================================================
// SCHEMA TRAIT
// ============================================================================

/// A validator that checks and optionally transforms a value of type `T`.
///
/// Object-safe: actions store schemas as `Arc<dyn Schema<T, Output = U>>`.
///
/// # Examples
///
/// ```rust
/// use warden_schema::{BoxFuture, Issue, Outcome, Schema};
/// use serde_json::Value;
///
/// struct NonEmpty;
///
/// impl Schema for NonEmpty {
///     type Output = String;
///
///     fn validate<'a>(&'a self, value: &'a Value) -> BoxFuture<'a, Outcome<String>> {
///         let outcome = match value.as_str() {
///             Some(s) if !s.is_empty() => Outcome::Valid(s.to_owned()),
///             _ => Outcome::invalid(Issue::new("must be a non-empty string")),
///         };
///         Box::pin(async move { outcome })
///     }
/// }
/// ```
pub trait Schema<T: ?Sized = Value>: Send + Sync {
    /// Value produced on success.
    type Output: Send + 'static;

    /// Validates `value`.
    fn validate<'a>(&'a self, value: &'a T) -> BoxFuture<'a, Outcome<Self::Output>>;
}

impl<T: ?Sized, S: Schema<T> + ?Sized> Schema<T> for Arc<S> {
    type Output = S::Output;

    fn validate<'a>(&'a self, value: &'a T) -> BoxFuture<'a, Outcome<Self::Output>> {
        (**self).validate(value)
    }
}

impl<T: ?Sized, S: Schema<T> + ?Sized> Schema<T> for Box<S> {
    type Output = S::Output;

    fn validate<'a>(&'a self, value: &'a T) -> BoxFuture<'a, Outcome<Self::Output>> {
        (**self).validate(value)
    }
}

// ============================================================================
// CLOSURE ADAPTERS
// ============================================================================

/// Schema backed by a synchronous closure. See [`from_fn`].
pub struct FnSchema<F, T: ?Sized> {
    check: F,
    _input: PhantomData<fn(&T)>,
}

/// Builds a schema from a synchronous closure.
pub fn from_fn<T, U, F>(check: F) -> FnSchema<F, T>
where
    T: ?Sized,
    F: Fn(&T) -> Outcome<U> + Send + Sync,
{
    FnSchema {
        check,
        _input: PhantomData,
    }
}

impl<T, U, F> Schema<T> for FnSchema<F, T>
where
    T: ?Sized,
    U: Send + 'static,
    F: Fn(&T) -> Outcome<U> + Send + Sync,
{
    type Output = U;

    fn validate<'a>(&'a self, value: &'a T) -> BoxFuture<'a, Outcome<U>> {
        Box::pin(futures::future::ready((self.check)(value)))
    }
}

impl<F, T: ?Sized> std::fmt::Debug for FnSchema<F, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSchema").finish_non_exhaustive()
    }
}

/// Schema backed by a closure returning a future. See [`from_async_fn`].
pub struct AsyncFnSchema<F, T> {
    check: F,
    _input: PhantomData<fn(T)>,
}

/// Builds a schema from an asynchronous closure.
///
/// The closure receives an owned clone of the value so the returned future
/// can be `'static`.
pub fn from_async_fn<T, U, F, Fut>(check: F) -> AsyncFnSchema<F, T>
where
    T: Clone,
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome<U>> + Send + 'static,
{
    AsyncFnSchema {
        check,
        _input: PhantomData,
    }
}

impl<T, U, F, Fut> Schema<T> for AsyncFnSchema<F, T>
where
    T: Clone,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome<U>> + Send + 'static,
{
    type Output = U;

    fn validate<'a>(&'a self, value: &'a T) -> BoxFuture<'a, Outcome<U>> {
        Box::pin((self.check)(value.clone()))
    }
}

impl<F, T> std::fmt::Debug for AsyncFnSchema<F, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnSchema").finish_non_exhaustive()
    }
}

// ============================================================================
// SERDE ADAPTER
// ============================================================================

/// Schema that deserializes a JSON value into `T`. See [`json`].
pub struct Json<T> {
    _output: PhantomData<fn() -> T>,
}

/// Builds a schema that accepts any JSON value deserializable into `T`.
///
/// A deserialization failure yields one issue carrying serde's message.
///
/// ```rust
/// use warden_schema::{Outcome, Schema, json};
///
/// # futures::executor::block_on(async {
/// let schema = json::<u32>();
/// assert_eq!(schema.validate(&serde_json::json!(7)).await, Outcome::Valid(7));
/// assert!(!schema.validate(&serde_json::json!("7")).await.is_valid());
/// # });
/// ```
#[must_use]
pub fn json<T: DeserializeOwned>() -> Json<T> {
    Json {
        _output: PhantomData,
    }
}

impl<T: DeserializeOwned + Send + 'static> Schema for Json<T> {
    type Output = T;

    fn validate<'a>(&'a self, value: &'a Value) -> BoxFuture<'a, Outcome<T>> {
        let outcome = match T::deserialize(value) {
            Ok(parsed) => Outcome::Valid(parsed),
            Err(error) => Outcome::invalid(Issue::new(error.to_string())),
        };
        Box::pin(futures::future::ready(outcome))
    }
}

impl<T> std::fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Json")
            .field("output", &std::any::type_name::<T>())
            .finish()
    }
}
