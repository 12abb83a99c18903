//! One download worker: walks a single interval in index order.

use url::Url;

use crate::fetch::{FetchOutcome, HttpGet, RetryingFetcher};
use crate::job::DownloadJob;
use crate::progress::{ProgressCounter, ProgressStats};
use crate::retry::ErrorKind;
use crate::segmenter::Interval;
use crate::storage;

/// What one worker did with its interval.
#[derive(Debug, Default)]
pub(super) struct WorkerReport {
    pub fetched: usize,
    pub already_present: usize,
    pub missing: Vec<usize>,
    pub throttle_events: u32,
    pub error_events: u32,
}

pub(super) fn run_worker<G: HttpGet>(
    job: &DownloadJob,
    interval: Interval,
    base_url: &Url,
    fetcher: &RetryingFetcher<G>,
    counter: &ProgressCounter,
    progress_tx: Option<&tokio::sync::mpsc::Sender<ProgressStats>>,
) -> WorkerReport {
    let mut report = WorkerReport::default();
    let publish = |completed: usize| {
        if let Some(tx) = progress_tx {
            let _ = tx.try_send(ProgressStats {
                completed,
                total: job.segment_count,
            });
        }
    };

    for index in interval.indices() {
        let path = job.segment_path(index);
        if path.exists() {
            report.already_present += 1;
            publish(counter.increment_and_get());
            continue;
        }

        // Validated by the coordinator before any worker starts.
        let url = match job.segment_url(base_url, index) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(job = %job.name, index, error = %e, "segment URL");
                report.missing.push(index);
                continue;
            }
        };

        match fetcher.fetch(&url) {
            FetchOutcome::Fetched(bytes) => {
                if let Err(e) = storage::write_segment(&path, &bytes) {
                    tracing::warn!(
                        job = %job.name,
                        index,
                        path = %path.display(),
                        error = %e,
                        "segment write failed"
                    );
                    report.missing.push(index);
                    continue;
                }
                report.fetched += 1;
                let done = counter.increment_and_get();
                tracing::debug!(job = %job.name, index, bytes = bytes.len(), done, "segment saved");
                publish(done);
            }
            FetchOutcome::NotFound {
                attempts,
                last_error,
                kinds,
            } => {
                for kind in kinds {
                    if kind == ErrorKind::Throttled {
                        report.throttle_events += 1;
                    } else {
                        report.error_events += 1;
                    }
                }
                tracing::warn!(
                    job = %job.name,
                    index,
                    attempts,
                    error = %last_error,
                    "segment skipped after retries"
                );
                report.missing.push(index);
            }
        }
    }
    report
}
