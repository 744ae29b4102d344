//! Result-object calls (`{ data, error }`) driven through the retry loop.
//!
//! Some callers prefer an outcome they can inspect over an `Err` they must
//! propagate. [`execute_safe`] lets those callers reuse [`execute`] without
//! changing convention: the error field is lifted into `Err` for the retry
//! loop and lowered back once the loop is done.

use std::fmt::Display;
use std::future::Future;

use super::classify::Classify;
use super::policy::RetryPolicy;
use super::run::execute;

/// A call result carried as data rather than as `Err`.
///
/// `data` may be `None` on success (e.g. an optional single-row lookup).
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T, E> {
    pub data: Option<T>,
    pub error: Option<E>,
}

impl<T, E> Outcome<T, E> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            data: None,
            error: None,
        }
    }

    pub fn failed(error: E) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    /// A present error wins over any data.
    pub fn into_result(self) -> Result<Option<T>, E> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.data),
        }
    }

    pub fn from_result(result: Result<Option<T>, E>) -> Self {
        match result {
            Ok(data) => Self { data, error: None },
            Err(e) => Self::failed(e),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        Self::from_result(result.map(Some))
    }
}

/// Retry a result-object call; never returns `Err`.
///
/// A returned `error` counts as a failed attempt and goes through the same
/// classification as [`execute`]. After the last attempt the final error
/// comes back as `Outcome { data: None, error: Some(e) }`.
pub async fn execute_safe<T, E, F, Fut>(policy: &RetryPolicy, mut call: F) -> Outcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Outcome<T, E>>,
    E: Classify + Display,
{
    let result = execute(policy, || {
        let fut = call();
        async move { fut.await.into_result() }
    })
    .await;
    Outcome::from_result(result)
}
