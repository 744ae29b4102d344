//! Retry and backoff for calls to the club data service.
//!
//! This module encapsulates transient-error classification (marker match on
//! message or code) and exponential backoff so that every controller shares
//! one policy. Both call conventions are supported: `Result` via [`execute`]
//! and result objects via [`execute_safe`].

mod classify;
mod error;
mod outcome;
mod policy;
mod run;

pub use classify::{is_retryable, Classify, RetryableMarkers, DEFAULT_RETRYABLE_MARKERS};
pub use error::{RemoteError, RemoteResult};
pub use outcome::{execute_safe, Outcome};
pub use policy::{delay, PolicyError, RetryOptions, RetryPolicy};
pub use run::execute;
