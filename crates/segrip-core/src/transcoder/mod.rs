//! External transcoder (ffmpeg-compatible CLI) plumbing.
//!
//! - [`progress`]: pure parser for the `-progress pipe:1` key=value stream.
//! - [`command`]: argument building for the concat transcode.
//! - [`run`]: spawn, consume progress line by line, map exit status.
//! - [`encoders`]: encoder listing, benchmark and memoized selection.

pub mod command;
pub mod encoders;
pub mod progress;
pub mod run;

use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

pub use command::{build_transcode_args, CoverInput};
pub use encoders::{EncoderBackend, EncoderCandidate, EncoderSelector, FfmpegEncoders, StreamKind};
pub use progress::{apply_progress_line, human_size, TranscodeProgress};
pub use run::run_with_progress;

/// Codec value meaning "no re-encode".
pub const COPY_CODEC: &str = "copy";

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("reading transcoder output: {0}")]
    Io(#[from] std::io::Error),
    #[error("transcoder exited with {status}")]
    Exit { status: ExitStatus },
    #[error("no segment files to transcode")]
    NoSegments,
    #[error("encoder listing from {program} failed: {detail}")]
    EncoderQuery { program: String, detail: String },
}

impl TranscodeError {
    /// Exit code if the process ran and failed.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            TranscodeError::Exit { status } => status.code(),
            _ => None,
        }
    }
}

/// True if `<program> -version` runs and exits successfully.
pub fn check_available(program: &str) -> bool {
    let ok = Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    tracing::debug!(program, ok, "transcoder availability check");
    ok
}
