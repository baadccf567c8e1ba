//! Lifecycle callbacks and their isolated dispatch.
//!
//! Order per invocation: `on_start`, then exactly one of `on_success` or
//! `on_error`, then `on_settled`. A callback that fails (returns `Err` or
//! panics, either while being called or while its future is polled) is
//! reported and otherwise ignored. It never changes the result and never
//! prevents a later callback from running.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::json;

use crate::error::{ActionError, Thrown};
use crate::logger::ActionLogger;
use crate::metadata::Metadata;
use crate::result::ActionResult;

// ============================================================================
// EVENTS
// ============================================================================

/// Payload of `on_start`. Validated metadata fields are always empty here.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct StartEvent<I, O, E> {
    /// Invocation metadata.
    pub metadata: Arc<Metadata<I, O, E>>,
}

/// Payload of `on_success`.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct SuccessEvent<I, O, E> {
    /// Output after output validation.
    pub data: O,
    /// Invocation metadata.
    pub metadata: Arc<Metadata<I, O, E>>,
}

/// Payload of `on_error`. Carries the error as callers will see it.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ErrorEvent<I, O, E> {
    /// Public error.
    pub error: ActionError<E>,
    /// Invocation metadata.
    pub metadata: Arc<Metadata<I, O, E>>,
}

/// Payload of `on_settled`.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct SettledEvent<I, O, E> {
    /// Final outcome, stamped with the action identifier.
    pub result: ActionResult<O, E>,
    /// Invocation metadata.
    pub metadata: Arc<Metadata<I, O, E>>,
}

// ============================================================================
// STORAGE
// ============================================================================

/// Boxed async callback receiving an owned event.
pub(crate) type Callback<Ev> =
    Arc<dyn Fn(Ev) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

pub(crate) fn boxed<Ev, F, Fut>(callback: F) -> Callback<Ev>
where
    F: Fn(Ev) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |event| Box::pin(callback(event)))
}

/// Lifecycle stage a callback is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackStage {
    /// Before validation.
    Start,
    /// After a successful outcome.
    Success,
    /// After a failed outcome.
    Error,
    /// After either outcome.
    Settled,
}

impl CallbackStage {
    /// Conventional callback name, as shown in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "onStart",
            Self::Success => "onSuccess",
            Self::Error => "onError",
            Self::Settled => "onSettled",
        }
    }
}

impl fmt::Display for CallbackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The callbacks configured on one action.
pub(crate) struct Callbacks<I, O, E> {
    pub(crate) on_start: Option<Callback<StartEvent<I, O, E>>>,
    pub(crate) on_success: Option<Callback<SuccessEvent<I, O, E>>>,
    pub(crate) on_error: Option<Callback<ErrorEvent<I, O, E>>>,
    pub(crate) on_settled: Option<Callback<SettledEvent<I, O, E>>>,
}

impl<I, O, E> Default for Callbacks<I, O, E> {
    fn default() -> Self {
        Self {
            on_start: None,
            on_success: None,
            on_error: None,
            on_settled: None,
        }
    }
}

impl<I, O, E> Clone for Callbacks<I, O, E> {
    fn clone(&self) -> Self {
        Self {
            on_start: self.on_start.clone(),
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
            on_settled: self.on_settled.clone(),
        }
    }
}

impl<I, O, E> fmt::Debug for Callbacks<I, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_settled", &self.on_settled.is_some())
            .finish()
    }
}

// ============================================================================
// DISPATCH
// ============================================================================

/// Runs one callback, isolating every way it can fail.
pub(crate) async fn fire<Ev>(
    stage: CallbackStage,
    callback: Option<&Callback<Ev>>,
    event: Ev,
    logger: Option<&dyn ActionLogger>,
) {
    let Some(callback) = callback else {
        return;
    };

    let future = match std::panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
        Ok(future) => future,
        Err(payload) => {
            report(stage, &Thrown::from_panic(payload), logger);
            return;
        }
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => report(stage, &Thrown::Error(error), logger),
        Err(payload) => report(stage, &Thrown::from_panic(payload), logger),
    }
}

fn report(stage: CallbackStage, failure: &Thrown, logger: Option<&dyn ActionLogger>) {
    tracing::error!(callback = %stage, error = %failure, "action callback failed");
    if let Some(logger) = logger {
        logger.error(
            &format!("{stage} callback failed"),
            Some(&json!({ "error": failure.to_string() })),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::Value;

    #[derive(Default)]
    struct Recorder {
        errors: Mutex<Vec<(String, Option<Value>)>>,
    }

    impl ActionLogger for Recorder {
        fn error(&self, message: &str, details: Option<&Value>) {
            self.errors
                .lock()
                .push((message.to_owned(), details.cloned()));
        }
    }

    #[tokio::test]
    async fn missing_callback_is_a_no_op() {
        let recorder = Recorder::default();
        fire::<u8>(CallbackStage::Start, None, 1, Some(&recorder)).await;
        assert!(recorder.errors.lock().is_empty());
    }

    #[tokio::test]
    async fn successful_callback_receives_event() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: Callback<u8> = boxed(move |event| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().push(event);
                Ok(())
            }
        });

        fire(CallbackStage::Success, Some(&callback), 7, None).await;
        assert_eq!(*seen.lock(), vec![7]);
    }

    #[tokio::test]
    async fn returned_error_is_reported() {
        let recorder = Recorder::default();
        let callback: Callback<()> = boxed(|()| async { Err(anyhow::anyhow!("db down")) });

        fire(CallbackStage::Error, Some(&callback), (), Some(&recorder)).await;

        let errors = recorder.errors.lock();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "onError callback failed");
        assert_eq!(errors[0].1, Some(json!({ "error": "db down" })));
    }

    #[tokio::test]
    async fn synchronous_panic_is_reported() {
        let recorder = Recorder::default();
        let callback: Callback<()> =
            Arc::new(|()| -> BoxFuture<'static, anyhow::Result<()>> { panic!("sync boom") });

        fire(CallbackStage::Start, Some(&callback), (), Some(&recorder)).await;

        let errors = recorder.errors.lock();
        assert_eq!(errors[0].1, Some(json!({ "error": "panic: sync boom" })));
    }

    #[tokio::test]
    async fn panic_while_polling_is_reported() {
        let recorder = Recorder::default();
        fn explode() -> anyhow::Result<()> {
            panic!("async boom")
        }
        let callback: Callback<()> = boxed(|()| async {
            tokio::task::yield_now().await;
            explode()
        });

        fire(CallbackStage::Settled, Some(&callback), (), Some(&recorder)).await;

        let errors = recorder.errors.lock();
        assert_eq!(errors[0].0, "onSettled callback failed");
    }

    #[tokio::test]
    async fn failure_without_logger_is_swallowed() {
        let callback: Callback<()> = boxed(|()| async { Err(anyhow::anyhow!("ignored")) });
        fire(CallbackStage::Success, Some(&callback), (), None).await;
    }

    #[test]
    fn stage_names() {
        assert_eq!(CallbackStage::Start.to_string(), "onStart");
        assert_eq!(CallbackStage::Settled.as_str(), "onSettled");
    }
}
