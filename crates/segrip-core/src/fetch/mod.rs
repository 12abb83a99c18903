//! Bounded-retry fetch of a single resource.
//!
//! [`HttpGet`] is one attempt (curl easy handle in production); the
//! [`RetryingFetcher`] wraps it with the retry policy and turns exhaustion into
//! [`FetchOutcome::NotFound`] instead of an error, so a missing segment is a
//! gap and never aborts the job.

mod curl_get;

pub use curl_get::CurlGet;

use crate::retry::{run_with_retry, ErrorKind, FetchError, RetryPolicy};
use url::Url;

/// A single blocking GET attempt.
pub trait HttpGet: Sync {
    fn get(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Result of a retried fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(Vec<u8>),
    /// Every attempt failed; `kinds` classifies each failed attempt.
    NotFound {
        attempts: u32,
        last_error: FetchError,
        kinds: Vec<ErrorKind>,
    },
}

impl FetchOutcome {
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            FetchOutcome::Fetched(b) => Some(b),
            FetchOutcome::NotFound { .. } => None,
        }
    }
}

/// Runs [`HttpGet`] attempts under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryingFetcher<G> {
    get: G,
    policy: RetryPolicy,
}

impl<G: HttpGet> RetryingFetcher<G> {
    pub fn new(get: G, policy: RetryPolicy) -> Self {
        Self { get, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url`, sleeping the calling thread between failed attempts.
    pub fn fetch(&self, url: &Url) -> FetchOutcome {
        let res = run_with_retry(&self.policy, |attempt| {
            self.get.get(url).map_err(|e| {
                tracing::trace!(%url, attempt, error = %e, "fetch attempt failed");
                e
            })
        });
        match res {
            Ok(bytes) => FetchOutcome::Fetched(bytes),
            Err(ex) => FetchOutcome::NotFound {
                attempts: ex.attempts,
                last_error: ex.last_error,
                kinds: ex.kinds,
            },
        }
    }
}
