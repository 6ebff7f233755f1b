//! Results of translator calls that may complete now or later.

use std::fmt;
use std::future::Future;

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use serde_json::Value;

/// Deferred translator result.
pub type DeferredValue = BoxFuture<'static, anyhow::Result<Value>>;

/// What a translator member returns when called.
///
/// Translators choose explicitly whether a call completes immediately or
/// yields a future; the accessor awaits the latter before handing the value
/// back, so callers see one shape either way.
pub enum Outcome {
    Immediate(Value),
    Deferred(DeferredValue),
}

impl Outcome {
    pub fn immediate(value: impl Into<Value>) -> Self {
        Self::Immediate(value.into())
    }

    /// Immediate completion without a meaningful value.
    pub fn done() -> Self {
        Self::Immediate(Value::Null)
    }

    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self::Deferred(future.boxed())
    }

    /// A deferred result that has already failed.
    pub fn failed(error: anyhow::Error) -> Self {
        Self::Deferred(future::ready(Err(error)).boxed())
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Waits for the value, suspending only when the outcome is deferred.
    pub async fn settle(self) -> anyhow::Result<Value> {
        match self {
            Self::Immediate(value) => Ok(value),
            Self::Deferred(future) => future.await,
        }
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(value) => f.debug_tuple("Immediate").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Self::Immediate(value)
    }
}
