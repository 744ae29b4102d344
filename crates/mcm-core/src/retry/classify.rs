//! Classify errors as transient (retry) or permanent (fail fast).
//!
//! Matching is a heuristic over the error's message and code: an error is
//! transient when either contains one of the configured markers. Anything
//! that matches nothing is treated as permanent.

use std::borrow::Cow;

use super::error::RemoteError;

/// Markers used when no override is configured.
pub const DEFAULT_RETRYABLE_MARKERS: &[&str] = &[
    "econnreset",
    "etimedout",
    "econnrefused",
    "enotfound",
    "eai_again",
    "network",
    "timeout",
    "timed out",
    "fetch failed",
    "connection reset",
    "database is locked",
    "busy",
];

/// Exposes the parts of an error the classifier looks at.
pub trait Classify {
    fn error_message(&self) -> Cow<'_, str>;

    fn error_code(&self) -> Option<Cow<'_, str>> {
        None
    }
}

impl Classify for RemoteError {
    fn error_message(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.message)
    }

    fn error_code(&self) -> Option<Cow<'_, str>> {
        self.code.as_deref().map(Cow::Borrowed)
    }
}

impl Classify for sqlx::Error {
    fn error_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn error_code(&self) -> Option<Cow<'_, str>> {
        match self {
            sqlx::Error::Database(db) => db.code(),
            sqlx::Error::Io(io) => Some(Cow::Owned(io.kind().to_string())),
            _ => None,
        }
    }
}

impl Classify for std::io::Error {
    fn error_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn error_code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(self.kind().to_string()))
    }
}

impl Classify for anyhow::Error {
    fn error_message(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{:#}", self))
    }
}

/// Set of lowercase substrings that mark an error as transient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableMarkers {
    markers: Vec<String>,
}

impl Default for RetryableMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_RETRYABLE_MARKERS.iter().copied())
    }
}

impl RetryableMarkers {
    /// Build a marker set. Blank markers are dropped (they would match everything).
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = markers
            .into_iter()
            .map(|m| normalize(m.as_ref()))
            .filter(|m| !m.is_empty())
            .collect();
        out.sort();
        out.dedup();
        Self { markers: out }
    }

    /// A set that matches nothing, so every failure is permanent.
    pub fn none() -> Self {
        Self {
            markers: Vec::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    fn matches(&self, text: &str) -> bool {
        let text = normalize(text);
        !text.is_empty() && self.markers.iter().any(|m| text.contains(m.as_str()))
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Whether `error` looks transient under `markers`. `None` is never retryable.
pub fn is_retryable<E: Classify + ?Sized>(error: Option<&E>, markers: &RetryableMarkers) -> bool {
    let Some(error) = error else {
        return false;
    };
    if markers.matches(&error.error_message()) {
        return true;
    }
    error
        .error_code()
        .map(|code| markers.matches(&code))
        .unwrap_or(false)
}
