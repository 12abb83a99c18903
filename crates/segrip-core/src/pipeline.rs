//! One job end to end: cover, segments, assembly, cleanup, rename.
//!
//! Each phase is switchable through [`JobOptions`]. The download phase joins
//! every worker before assembly starts; the segment directory is only removed
//! after an assembly that succeeded.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

use crate::assemble::{self, AssemblyResult, TranscodeFailure, TranscodeOptions};
use crate::config::TranscoderConfig;
use crate::downloader::{self, DownloadError, DownloadSummary};
use crate::fetch::{FetchOutcome, HttpGet, RetryingFetcher};
use crate::job::{DownloadJob, OUTPUT_EXT};
use crate::progress::{ProgressCounter, ProgressStats};
use crate::sanitize::sanitize_title;
use crate::segmenter::partition;
use crate::storage;
use crate::transcoder::{EncoderBackend, EncoderSelector, TranscodeProgress};

/// How present segments become the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssembleStrategy {
    /// Byte-for-byte concatenation.
    Concat,
    /// Concat manifest through the external transcoder.
    Transcode(TranscodeOptions),
}

#[derive(Debug, Clone)]
pub struct JobOptions {
    pub download: bool,
    pub assemble: bool,
    /// Remove the segment directory after a successful assembly.
    pub cleanup: bool,
    pub strategy: AssembleStrategy,
    /// Rename the output to this title (sanitized) when set.
    pub display_title: Option<String>,
    pub cover_url: Option<Url>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            download: true,
            assemble: true,
            cleanup: true,
            strategy: AssembleStrategy::Concat,
            display_title: None,
            cover_url: None,
        }
    }
}

/// Shared collaborators for running jobs.
pub struct JobContext<'a, G, B> {
    pub fetcher: &'a RetryingFetcher<G>,
    pub base_url: &'a Url,
    pub workers: usize,
    pub transcoder: &'a TranscoderConfig,
    pub encoders: &'a EncoderSelector<B>,
    pub counter: &'a ProgressCounter,
    pub download_progress: Option<&'a mpsc::Sender<ProgressStats>>,
    pub transcode_progress: Option<&'a mpsc::Sender<TranscodeProgress>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub job: String,
    pub cover_saved: bool,
    pub download: Option<DownloadSummary>,
    pub assembly: Option<AssemblyResult>,
    /// Where the output ended up after an optional rename.
    pub final_path: Option<PathBuf>,
}

impl JobReport {
    /// Completion ratio of the assembly, if one ran.
    pub fn completion_ratio(&self) -> Option<f64> {
        self.assembly.as_ref().map(AssemblyResult::completion_ratio)
    }
}

/// Job failure. Assembly errors carry the download summary, so a failed job
/// still reports how many segments were fetched.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("prepare {path}: {source}")]
    Prepare { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error("concatenating {job}: {source}")]
    Concat {
        job: String,
        download: Option<DownloadSummary>,
        #[source]
        source: io::Error,
    },
    #[error("{failure}")]
    Transcode {
        download: Option<DownloadSummary>,
        #[source]
        failure: TranscodeFailure,
    },
}

impl JobError {
    /// Summary of the download phase, when it ran before the failure.
    pub fn download_summary(&self) -> Option<&DownloadSummary> {
        match self {
            JobError::Concat { download, .. } | JobError::Transcode { download, .. } => {
                download.as_ref()
            }
            _ => None,
        }
    }

    /// Segments that made it to disk, when the failure happened at assembly.
    pub fn segments_found(&self) -> Option<usize> {
        match self {
            JobError::Transcode { failure, .. } => Some(failure.segments_found),
            JobError::Concat { download, .. } => download.as_ref().map(DownloadSummary::available),
            _ => None,
        }
    }
}

/// Runs every enabled phase of `job` in order.
pub fn run_job<G, B>(
    ctx: &JobContext<'_, G, B>,
    job: &DownloadJob,
    options: &JobOptions,
) -> Result<JobReport, JobError>
where
    G: HttpGet,
    B: EncoderBackend,
{
    let seg_dir = job.segment_dir();
    storage::ensure_dir(&seg_dir).map_err(|source| JobError::Prepare {
        path: seg_dir.clone(),
        source,
    })?;

    let mut report = JobReport {
        job: job.name.clone(),
        cover_saved: false,
        download: None,
        assembly: None,
        final_path: None,
    };

    if let Some(url) = &options.cover_url {
        report.cover_saved = fetch_cover(ctx.fetcher, job, url);
    }

    if options.download {
        ctx.counter.reset();
        let intervals = partition(job.segment_count, ctx.workers);
        let summary = downloader::download_segments(
            job,
            &intervals,
            ctx.base_url,
            ctx.fetcher,
            ctx.counter,
            ctx.download_progress,
        )?;
        ctx.counter.reset();
        report.download = Some(summary);
    }

    if !options.assemble {
        return Ok(report);
    }

    let result = match options.strategy {
        AssembleStrategy::Concat => {
            assemble::concatenate(job).map_err(|source| JobError::Concat {
                job: job.name.clone(),
                download: report.download.clone(),
                source,
            })?
        }
        AssembleStrategy::Transcode(topts) => {
            let tx = ctx.transcode_progress;
            assemble::transcode(job, &topts, ctx.transcoder, ctx.encoders, |p| {
                if let Some(tx) = tx {
                    let _ = tx.try_send(p.clone());
                }
            })
            .map_err(|failure| JobError::Transcode {
                download: report.download.clone(),
                failure,
            })?
        }
    };

    if options.cleanup {
        if let Err(e) = storage::remove_segment_dir(&seg_dir) {
            tracing::warn!(job = %job.name, dir = %seg_dir.display(), error = %e, "segment cleanup failed");
        }
    }

    let final_path = match &options.display_title {
        Some(title) => rename_to_title(&result.output_path, &job.output_root, title),
        None => result.output_path.clone(),
    };
    tracing::info!(
        job = %job.name,
        found = result.segments_found,
        expected = result.segments_expected,
        ratio = result.completion_ratio(),
        output = %final_path.display(),
        "job finished"
    );
    report.final_path = Some(final_path);
    report.assembly = Some(result);
    Ok(report)
}

/// Downloads the cover next to the output. Failure is logged, never fatal.
fn fetch_cover<G: HttpGet>(fetcher: &RetryingFetcher<G>, job: &DownloadJob, url: &Url) -> bool {
    let path = job.cover_path();
    match fetcher.fetch(url) {
        FetchOutcome::Fetched(bytes) => match storage::write_segment(&path, &bytes) {
            Ok(()) => {
                tracing::info!(job = %job.name, cover = %path.display(), "cover saved");
                true
            }
            Err(e) => {
                tracing::warn!(job = %job.name, error = %e, "writing cover failed");
                false
            }
        },
        FetchOutcome::NotFound { attempts, last_error, .. } => {
            tracing::warn!(job = %job.name, %url, attempts, error = %last_error, "cover fetch failed");
            false
        }
    }
}

/// Renames `output` to `<root>/<sanitized title>.mp4`. Returns the path the
/// file is at afterwards.
fn rename_to_title(output: &std::path::Path, root: &std::path::Path, title: &str) -> PathBuf {
    let Some(stem) = sanitize_title(title, OUTPUT_EXT.len() + 1) else {
        tracing::warn!(title, "title has no usable characters; keeping job name");
        return output.to_path_buf();
    };
    let target = root.join(format!("{}.{}", stem, OUTPUT_EXT));
    if target == output {
        return target;
    }
    match std::fs::rename(output, &target) {
        Ok(()) => target,
        Err(e) => {
            tracing::warn!(from = %output.display(), to = %target.display(), error = %e, "rename to title failed");
            output.to_path_buf()
        }
    }
}
