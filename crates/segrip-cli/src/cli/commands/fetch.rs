//! `segrip fetch` – download, assemble and report one asset.

use std::io::Write;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use segrip_core::assemble::TranscodeOptions;
use segrip_core::config::SegripConfig;
use segrip_core::fetch::{CurlGet, RetryingFetcher};
use segrip_core::job::DownloadJob;
use segrip_core::downloader::DownloadSummary;
use segrip_core::pipeline::{self, AssembleStrategy, JobContext, JobError, JobOptions, JobReport};
use segrip_core::playlist;
use segrip_core::progress::{ProgressCounter, ProgressStats};
use segrip_core::transcoder::{self, EncoderSelector, FfmpegEncoders, TranscodeProgress};
use url::Url;

use crate::cli::FetchArgs;

const BAR_WIDTH: usize = 40;
const PROGRESS_INTERVAL_MS: u128 = 200;

fn job_options(args: &FetchArgs) -> Result<JobOptions> {
    let cover_url = args
        .cover_url
        .as_deref()
        .map(Url::parse)
        .transpose()
        .context("invalid --cover-url")?;
    let strategy = if args.ffmpeg {
        AssembleStrategy::Transcode(TranscodeOptions {
            attach_cover_as_preview: args.cover_as_preview,
            reencode_video: args.video_reencode,
            reencode_audio: args.audio_reencode,
        })
    } else {
        AssembleStrategy::Concat
    };
    Ok(JobOptions {
        download: !args.no_download,
        assemble: !args.no_assemble,
        cleanup: !args.keep_segments,
        strategy,
        display_title: args.title.clone(),
        cover_url,
    })
}

fn print_download(d: &DownloadSummary) {
    println!(
        "  segments: {} fetched, {} already present, {} missing",
        d.fetched,
        d.already_present,
        d.missing.len()
    );
    if d.throttle_events > 0 || d.error_events > 0 {
        println!(
            "  failed attempts: {} throttled, {} other",
            d.throttle_events, d.error_events
        );
    }
}

fn print_report(report: &JobReport, elapsed_secs: f64) {
    println!("Job {} finished in {:.1}s", report.job, elapsed_secs);
    if let Some(d) = &report.download {
        print_download(d);
    }
    if let Some(a) = &report.assembly {
        println!(
            "  assembled {}/{} segments ({:.2}%)",
            a.segments_found,
            a.segments_expected,
            a.completion_ratio() * 100.0
        );
    }
    if let Some(p) = &report.final_path {
        println!("  output: {}", p.display());
    }
}

pub async fn run_fetch(cfg: &SegripConfig, args: FetchArgs) -> Result<()> {
    let options = job_options(&args)?;
    if args.ffmpeg && !transcoder::check_available(&cfg.transcoder.program) {
        bail!(
            "--ffmpeg needs a runnable transcoder; {:?} was not found (see `segrip check`)",
            cfg.transcoder.program
        );
    }

    let base_url = Url::parse(&cfg.segment_base_url)
        .with_context(|| format!("invalid segment_base_url {:?}", cfg.segment_base_url))?;
    let output_root = args.output.clone().unwrap_or_else(|| cfg.output_root.clone());
    let workers = args.workers.unwrap_or_else(|| cfg.effective_workers()).max(1);
    let fetcher = RetryingFetcher::new(
        CurlGet::new(cfg.fetch_timeout(), cfg.user_agent.clone()),
        cfg.retry_policy(),
    );
    let transcoder_cfg = cfg.transcoder.clone();

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressStats>(64);
    let (transcode_tx, mut transcode_rx) = tokio::sync::mpsc::channel::<TranscodeProgress>(16);

    let download_printer = tokio::spawn(async move {
        let mut last_print: Option<Instant> = None;
        while let Some(stats) = progress_rx.recv().await {
            let due = last_print
                .map(|t| t.elapsed().as_millis() >= PROGRESS_INTERVAL_MS)
                .unwrap_or(true);
            if due || stats.completed >= stats.total {
                eprint!("\r{}", stats.render_bar(BAR_WIDTH));
                let _ = std::io::stderr().flush();
                last_print = Some(Instant::now());
            }
        }
        if last_print.is_some() {
            eprintln!();
        }
    });
    let transcode_printer = tokio::spawn(async move {
        let mut printed = false;
        while let Some(p) = transcode_rx.recv().await {
            eprint!("\r{}    ", p);
            let _ = std::io::stderr().flush();
            printed = true;
        }
        if printed {
            eprintln!();
        }
    });

    let started = Instant::now();
    let report = tokio::task::spawn_blocking(move || -> Result<JobReport> {
        let (resolution_tag, segment_count) = match (args.resolution, args.segments) {
            (Some(r), Some(n)) => (r, n),
            _ => {
                let resolved = playlist::resolve(&fetcher, &base_url, &args.source_id)
                    .context("resolve playlist")?;
                (resolved.resolution_tag, resolved.segment_count)
            }
        };
        let job = DownloadJob::new(
            args.name,
            args.source_id,
            resolution_tag,
            segment_count,
            output_root,
        )?;

        let encoders = EncoderSelector::new(FfmpegEncoders::new(transcoder_cfg.program.clone()));
        let counter = ProgressCounter::new();
        let ctx = JobContext {
            fetcher: &fetcher,
            base_url: &base_url,
            workers,
            transcoder: &transcoder_cfg,
            encoders: &encoders,
            counter: &counter,
            download_progress: Some(&progress_tx),
            transcode_progress: Some(&transcode_tx),
        };
        Ok(pipeline::run_job(&ctx, &job, &options)?)
    })
    .await
    .context("job task join");

    // Senders are dropped with the blocking closure; printers drain and exit.
    let _ = download_printer.await;
    let _ = transcode_printer.await;

    let report = match report? {
        Ok(report) => report,
        Err(e) => {
            if let Some(d) = e.downcast_ref::<JobError>().and_then(JobError::download_summary) {
                println!("Job failed after {:.1}s", started.elapsed().as_secs_f64());
                print_download(d);
            }
            return Err(e);
        }
    };
    print_report(&report, started.elapsed().as_secs_f64());
    Ok(())
}
