//! Segment download coordinator.
//!
//! One OS thread per [`Interval`]; each worker walks its index range, fetches
//! through the [`RetryingFetcher`], writes the segment file and bumps the
//! shared [`ProgressCounter`]. A segment that cannot be fetched is left
//! missing. The call returns only after every worker has been joined, so no
//! segment write can race with assembly.

mod worker;

use std::thread;

use thiserror::Error;
use url::Url;

use crate::fetch::{HttpGet, RetryingFetcher};
use crate::job::{DownloadJob, JobSpecError};
use crate::progress::{ProgressCounter, ProgressStats};
use crate::segmenter::Interval;
use crate::storage;

use worker::{run_worker, WorkerReport};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("cannot build segment URLs: {0}")]
    Url(#[from] JobSpecError),
    #[error("create segment directory {path}: {source}")]
    SegmentDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("{0} download worker(s) panicked")]
    WorkerPanicked(usize),
}

/// Outcome of the download phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub segments_expected: usize,
    /// Segments fetched during this run.
    pub fetched: usize,
    /// Segments whose file was already on disk and were not fetched again.
    pub already_present: usize,
    /// Indices left missing (fetch exhausted or write failed), ascending.
    pub missing: Vec<usize>,
    /// Failed attempts on missing segments classified as throttling (429/503).
    pub throttle_events: u32,
    /// Every other failed attempt on missing segments.
    pub error_events: u32,
}

impl DownloadSummary {
    /// Segment files available for assembly after this phase.
    pub fn available(&self) -> usize {
        self.fetched + self.already_present
    }

    fn absorb(&mut self, r: WorkerReport) {
        self.fetched += r.fetched;
        self.already_present += r.already_present;
        self.missing.extend(r.missing);
        self.throttle_events += r.throttle_events;
        self.error_events += r.error_events;
    }
}

/// Downloads every index of `partition` for `job`, one worker per interval.
///
/// If `progress_tx` is `Some`, a [`ProgressStats`] is offered after each
/// completed segment (`try_send`; a full channel drops the update).
pub fn download_segments<G: HttpGet>(
    job: &DownloadJob,
    partition: &[Interval],
    base_url: &Url,
    fetcher: &RetryingFetcher<G>,
    counter: &ProgressCounter,
    progress_tx: Option<&tokio::sync::mpsc::Sender<ProgressStats>>,
) -> Result<DownloadSummary, DownloadError> {
    // Fail before spawning anything if the URL scheme is unusable.
    job.segment_url(base_url, 0)?;
    let dir = job.segment_dir();
    storage::ensure_dir(&dir).map_err(|source| DownloadError::SegmentDir {
        path: dir.clone(),
        source,
    })?;

    tracing::info!(
        job = %job.name,
        segments = job.segment_count,
        workers = partition.len(),
        "download phase started"
    );

    let mut summary = DownloadSummary {
        segments_expected: job.segment_count,
        ..DownloadSummary::default()
    };
    let mut panicked = 0usize;

    thread::scope(|s| {
        let handles: Vec<_> = partition
            .iter()
            .copied()
            .filter(|iv| !iv.is_empty())
            .map(|iv| {
                s.spawn(move || run_worker(job, iv, base_url, fetcher, counter, progress_tx))
            })
            .collect();
        for h in handles {
            match h.join() {
                Ok(report) => summary.absorb(report),
                Err(_) => panicked += 1,
            }
        }
    });

    if panicked > 0 {
        return Err(DownloadError::WorkerPanicked(panicked));
    }
    summary.missing.sort_unstable();

    tracing::info!(
        job = %job.name,
        fetched = summary.fetched,
        already_present = summary.already_present,
        missing = summary.missing.len(),
        throttle_events = summary.throttle_events,
        error_events = summary.error_events,
        "download phase finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{FetchError, RetryPolicy};
    use crate::segmenter::partition;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Serves `seg<N>` for every index except those in `dead`.
    struct FakeSource {
        dead: HashSet<usize>,
        calls: Arc<AtomicUsize>,
    }

    fn source(dead: &[usize]) -> (FakeSource, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let src = FakeSource {
            dead: dead.iter().copied().collect(),
            calls: Arc::clone(&calls),
        };
        (src, calls)
    }

    fn index_of(url: &Url) -> usize {
        let last = url.path_segments().unwrap().last().unwrap();
        last.trim_start_matches("video")
            .trim_end_matches(".jpeg")
            .parse()
            .unwrap()
    }

    impl HttpGet for FakeSource {
        fn get(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let i = index_of(url);
            if self.dead.contains(&i) {
                Err(FetchError::Http(404))
            } else {
                Ok(format!("seg{}", i).into_bytes())
            }
        }
    }

    fn setup(count: usize) -> (tempfile::TempDir, DownloadJob, Url) {
        let dir = tempfile::tempdir().unwrap();
        let job = DownloadJob::new("movie", "src", "720p", count, dir.path()).unwrap();
        (dir, job, Url::parse("http://segments.invalid/").unwrap())
    }

    #[test]
    fn downloads_every_index_once() {
        let (_dir, job, base) = setup(23);
        let (src, _calls) = source(&[]);
        let fetcher = RetryingFetcher::new(src, RetryPolicy::immediate(3));
        let counter = ProgressCounter::new();
        let summary =
            download_segments(&job, &partition(23, 4), &base, &fetcher, &counter, None).unwrap();
        assert_eq!(summary.fetched, 23);
        assert!(summary.missing.is_empty());
        assert_eq!(counter.get(), 23);
        for i in 0..23 {
            assert_eq!(
                std::fs::read(job.segment_path(i)).unwrap(),
                format!("seg{}", i).into_bytes()
            );
        }
    }

    #[test]
    fn dead_segments_become_gaps_without_stopping_siblings() {
        let (_dir, job, base) = setup(12);
        let dead = [2, 7, 11];
        let (src, calls) = source(&dead);
        let fetcher = RetryingFetcher::new(src, RetryPolicy::immediate(5));
        let counter = ProgressCounter::new();
        let summary =
            download_segments(&job, &partition(12, 3), &base, &fetcher, &counter, None).unwrap();
        assert_eq!(summary.missing, vec![2, 7, 11]);
        assert_eq!(summary.fetched, 9);
        assert_eq!(summary.error_events, 15);
        assert_eq!(counter.get(), 9);
        for i in 0..12 {
            assert_eq!(job.segment_path(i).exists(), !dead.contains(&i));
        }
        // 9 successes + 3 dead * 5 attempts.
        assert_eq!(calls.load(Ordering::SeqCst), 9 + 15);
    }

    #[test]
    fn existing_segments_are_not_fetched_again() {
        let (_dir, job, base) = setup(4);
        storage::ensure_dir(&job.segment_dir()).unwrap();
        storage::write_segment(&job.segment_path(1), b"kept").unwrap();
        let (src, calls) = source(&[]);
        let fetcher = RetryingFetcher::new(src, RetryPolicy::immediate(1));
        let counter = ProgressCounter::new();
        let summary =
            download_segments(&job, &partition(4, 2), &base, &fetcher, &counter, None).unwrap();
        assert_eq!(summary.already_present, 1);
        assert_eq!(summary.fetched, 3);
        assert_eq!(summary.available(), 4);
        assert_eq!(counter.get(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(std::fs::read(job.segment_path(1)).unwrap(), b"kept");
    }

    #[test]
    fn progress_updates_are_published() {
        let (_dir, job, base) = setup(5);
        let (src, _calls) = source(&[]);
        let fetcher = RetryingFetcher::new(src, RetryPolicy::immediate(1));
        let counter = ProgressCounter::new();
        let (tx, mut rx) = tokio::sync::mpsc::channel(64);
        download_segments(&job, &partition(5, 2), &base, &fetcher, &counter, Some(&tx)).unwrap();
        drop(tx);
        let mut seen = Vec::new();
        while let Ok(stats) = rx.try_recv() {
            assert_eq!(stats.total, 5);
            seen.push(stats.completed);
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn empty_job_spawns_nothing() {
        let (_dir, job, base) = setup(0);
        let (src, calls) = source(&[]);
        let fetcher = RetryingFetcher::new(src, RetryPolicy::immediate(1));
        let counter = ProgressCounter::new();
        let summary =
            download_segments(&job, &partition(0, 8), &base, &fetcher, &counter, None).unwrap();
        assert_eq!(summary, DownloadSummary::default());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
