//! Combinators for building schemas out of other schemas.

use crate::adapter::{BoxFuture, Outcome, Schema};
use crate::issue::Issue;

/// Extension methods available on every [`Schema`].
pub trait SchemaExt<T: ?Sized = serde_json::Value>: Schema<T> + Sized {
    /// Transforms the validated value.
    ///
    /// ```rust
    /// use warden_schema::prelude::*;
    ///
    /// # futures::executor::block_on(async {
    /// let upper = json::<String>().map(|s| s.trim().to_uppercase());
    /// assert_eq!(
    ///     upper.validate(&serde_json::json!(" hi ")).await,
    ///     Outcome::Valid("HI".to_owned())
    /// );
    /// # });
    /// ```
    fn map<U, F>(self, transform: F) -> Map<Self, F>
    where
        F: Fn(Self::Output) -> U + Send + Sync,
        U: Send + 'static,
    {
        Map {
            inner: self,
            transform,
        }
    }

    /// Adds a predicate run after the inner schema succeeds.
    fn refine<F>(self, check: F) -> Refine<Self, F>
    where
        F: Fn(&Self::Output) -> Result<(), Issue> + Send + Sync,
    {
        Refine { inner: self, check }
    }
}

impl<T: ?Sized, S: Schema<T>> SchemaExt<T> for S {}

/// Schema returned by [`SchemaExt::map`].
#[derive(Debug, Clone)]
pub struct Map<S, F> {
    inner: S,
    transform: F,
}

impl<T, S, F, U> Schema<T> for Map<S, F>
where
    T: ?Sized + Sync,
    S: Schema<T>,
    F: Fn(S::Output) -> U + Send + Sync,
    U: Send + 'static,
{
    type Output = U;

    fn validate<'a>(&'a self, value: &'a T) -> BoxFuture<'a, Outcome<U>> {
        Box::pin(async move {
            self.inner
                .validate(value)
                .await
                .map(|validated| (self.transform)(validated))
        })
    }
}

/// Schema returned by [`SchemaExt::refine`].
#[derive(Debug, Clone)]
pub struct Refine<S, F> {
    inner: S,
    check: F,
}

impl<T, S, F> Schema<T> for Refine<S, F>
where
    T: ?Sized + Sync,
    S: Schema<T>,
    F: Fn(&S::Output) -> Result<(), Issue> + Send + Sync,
{
    type Output = S::Output;

    fn validate<'a>(&'a self, value: &'a T) -> BoxFuture<'a, Outcome<S::Output>> {
        Box::pin(async move {
            match self.inner.validate(value).await {
                Outcome::Valid(validated) => match (self.check)(&validated) {
                    Ok(()) => Outcome::Valid(validated),
                    Err(issue) => Outcome::invalid(issue),
                },
                invalid @ Outcome::Invalid(_) => invalid,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::json;
    use serde_json::json;

    #[tokio::test]
    async fn map_transforms_only_valid_values() {
        let schema = json::<String>().map(|s| s.len());
        assert_eq!(schema.validate(&json!("four")).await, Outcome::Valid(4));
        assert!(!schema.validate(&json!(4)).await.is_valid());
    }

    #[tokio::test]
    async fn refine_reports_predicate_issue() {
        let schema = json::<i64>().refine(|n| {
            if *n >= 18 {
                Ok(())
            } else {
                Err(Issue::new("must be an adult").at(["age"]))
            }
        });

        assert_eq!(schema.validate(&json!(30)).await, Outcome::Valid(30));
        let Outcome::Invalid(issues) = schema.validate(&json!(12)).await else {
            panic!("expected issues");
        };
        assert_eq!(issues, vec![Issue::new("must be an adult").at(["age"])]);
    }

    #[tokio::test]
    async fn refine_skips_predicate_when_inner_fails() {
        let schema = json::<i64>().refine(|_| panic!("predicate must not run"));
        assert!(!schema.validate(&json!("x")).await.is_valid());
    }
}
