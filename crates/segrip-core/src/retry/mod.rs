//! Retry policy for segment fetches.
//!
//! Every failure (timeout, connection error, non-2xx status) is retried with a
//! fixed delay until the attempt budget is spent. Errors are still classified
//! so the download summary can separate throttling from other failures.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, Exhausted};
