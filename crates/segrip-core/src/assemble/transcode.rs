use std::process::Command;

use thiserror::Error;

use super::manifest::{present_segments, write_manifest};
use super::AssemblyResult;
use crate::config::TranscoderConfig;
use crate::job::DownloadJob;
use crate::transcoder::{
    build_transcode_args, run_with_progress, CoverInput, EncoderBackend, EncoderSelector,
    StreamKind, TranscodeError, TranscodeProgress, COPY_CODEC,
};

/// Per-job transcoder switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscodeOptions {
    /// Attach `<name>-cover.jpg` as the preview picture when it exists.
    pub attach_cover_as_preview: bool,
    pub reencode_video: bool,
    pub reencode_audio: bool,
}

/// Fatal transcoder failure. Carries the segment counts so the caller can
/// still report what was downloaded.
#[derive(Debug, Error)]
#[error("transcoding {job} failed ({segments_found}/{segments_expected} segments): {source}")]
pub struct TranscodeFailure {
    pub job: String,
    pub segments_found: usize,
    pub segments_expected: usize,
    #[source]
    pub source: TranscodeError,
}

impl TranscodeFailure {
    /// Transcoder exit code, when it ran and failed.
    pub fn exit_code(&self) -> Option<i32> {
        self.source.exit_code()
    }
}

/// Builds a concat manifest from the present segments and runs the
/// transcoder on it, reporting every progress update to `on_update`.
///
/// Streams that are not re-encoded are copied. Partial output is left in
/// place on failure.
pub fn transcode<B, F>(
    job: &DownloadJob,
    options: &TranscodeOptions,
    config: &TranscoderConfig,
    selector: &EncoderSelector<B>,
    on_update: F,
) -> Result<AssemblyResult, TranscodeFailure>
where
    B: EncoderBackend,
    F: FnMut(&TranscodeProgress),
{
    let segments = present_segments(job);
    let found = segments.len();
    let fail = |source: TranscodeError| TranscodeFailure {
        job: job.name.clone(),
        segments_found: found,
        segments_expected: job.segment_count,
        source,
    };
    if segments.is_empty() {
        return Err(fail(TranscodeError::NoSegments));
    }

    let video_codec = pick_codec(
        selector,
        StreamKind::Video,
        options.reencode_video,
        &config.video_flavors,
    )
    .map_err(fail)?;
    let audio_codec = pick_codec(
        selector,
        StreamKind::Audio,
        options.reencode_audio,
        &config.audio_flavors,
    )
    .map_err(fail)?;

    let mut manifest = tempfile::Builder::new()
        .prefix(".segrip-concat-")
        .suffix(".txt")
        .tempfile_in(&job.output_root)
        .map_err(|e| fail(TranscodeError::Io(e)))?;
    write_manifest(manifest.as_file_mut(), &segments).map_err(|e| fail(TranscodeError::Io(e)))?;

    let cover_path = job.cover_path();
    let cover = (options.attach_cover_as_preview && cover_path.is_file())
        .then_some(CoverInput { path: &cover_path });
    if options.attach_cover_as_preview && cover.is_none() {
        tracing::warn!(job = %job.name, cover = %cover_path.display(), "cover requested but missing");
    }

    let output = job.output_path();
    let mut cmd = Command::new(&config.program);
    cmd.args(build_transcode_args(
        manifest.path(),
        cover,
        &video_codec,
        &audio_codec,
        &output,
    ));

    tracing::info!(
        job = %job.name,
        segments = found,
        video = %video_codec,
        audio = %audio_codec,
        cover = cover.is_some(),
        "transcode started"
    );
    let last = run_with_progress(&mut cmd, on_update).map_err(fail)?;
    tracing::info!(job = %job.name, frames = last.frame, size = %last.human_size(), "transcode finished");

    Ok(AssemblyResult::for_job(job, found))
}

fn pick_codec<B: EncoderBackend>(
    selector: &EncoderSelector<B>,
    kind: StreamKind,
    reencode: bool,
    flavors: &[String],
) -> Result<String, TranscodeError> {
    if reencode {
        selector.select_encoder(kind, flavors)
    } else {
        Ok(COPY_CODEC.to_string())
    }
}
