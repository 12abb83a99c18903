//! Retry loop: run a closure until success or policy says stop.

use super::classify;
use super::error::FetchError;
use super::policy::{ErrorKind, RetryDecision, RetryPolicy};

/// All attempts failed. Carries what the caller needs for logging and summaries.
#[derive(Debug)]
pub struct Exhausted {
    pub attempts: u32,
    pub last_error: FetchError,
    /// Classification of every failed attempt, in order.
    pub kinds: Vec<ErrorKind>,
}

/// Runs a closure until it succeeds or the retry policy says to stop.
/// On failure, sleeps the calling thread for the policy delay then tries again.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<T, Exhausted>
where
    F: FnMut(u32) -> Result<T, FetchError>,
{
    let mut attempt = 1u32;
    let mut kinds = Vec::new();
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                kinds.push(kind);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => {
                        return Err(Exhausted {
                            attempts: attempt,
                            last_error: e,
                            kinds,
                        })
                    }
                    RetryDecision::RetryAfter(d) => {
                        if !d.is_zero() {
                            std::thread::sleep(d);
                        }
                        attempt += 1;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeds_after_transient_failures() {
        let policy = RetryPolicy::immediate(5);
        let mut calls = 0;
        let out = run_with_retry(&policy, |attempt| {
            calls += 1;
            if attempt < 3 {
                Err(FetchError::Http(503))
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(out.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn exhausts_after_max_attempts() {
        let policy = RetryPolicy::immediate(4);
        let mut calls = 0;
        let out: Result<(), _> = run_with_retry(&policy, |_| {
            calls += 1;
            Err(FetchError::Http(404))
        });
        let ex = out.unwrap_err();
        assert_eq!(calls, 4);
        assert_eq!(ex.attempts, 4);
        assert_eq!(ex.kinds, vec![ErrorKind::Http4xx(404); 4]);
        assert!(matches!(ex.last_error, FetchError::Http(404)));
    }
}
