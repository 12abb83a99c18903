//! CLI for segrip.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use segrip_core::config;
use segrip_core::transcoder::StreamKind;

use commands::{run_check, run_encoders, run_fetch};

/// Top-level CLI for segrip.
#[derive(Debug, Parser)]
#[command(name = "segrip")]
#[command(about = "segrip: concurrent segment fetcher and assembler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a segmented asset and assemble it into one file.
    Fetch(FetchArgs),

    /// Probe the transcoder's encoders and print the one that would be used.
    Encoders {
        #[arg(value_enum)]
        kind: KindArg,
        /// Flavor substring, highest priority first. Repeatable; defaults to config.
        #[arg(long = "flavor", value_name = "F")]
        flavors: Vec<String>,
    },

    /// Check that the configured transcoder can be run.
    Check,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Remote identifier the segment URLs are built from.
    #[arg(long, value_name = "ID")]
    pub source_id: String,

    /// Local name: segment folder and output file name.
    #[arg(long)]
    pub name: String,

    /// Variant directory (e.g. 1280x720). Resolved from the playlist when omitted.
    #[arg(long, value_name = "R", requires = "segments")]
    pub resolution: Option<String>,

    /// Number of segments. Resolved from the playlist when omitted.
    #[arg(long, value_name = "N", requires = "resolution")]
    pub segments: Option<usize>,

    /// Output root (default: config `output_root`).
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Download workers (default: config, else CPU count).
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Assemble through the external transcoder instead of raw concatenation.
    #[arg(long)]
    pub ffmpeg: bool,

    /// Fetch a cover image to `<name>-cover.jpg` first.
    #[arg(long, value_name = "URL")]
    pub cover_url: Option<String>,

    /// Attach the cover as the output's preview picture (transcoder mode).
    #[arg(long, requires = "ffmpeg")]
    pub cover_as_preview: bool,

    #[arg(long, requires = "ffmpeg")]
    pub video_reencode: bool,

    #[arg(long, requires = "ffmpeg")]
    pub audio_reencode: bool,

    /// Rename the output to this title.
    #[arg(long, value_name = "T")]
    pub title: Option<String>,

    /// Skip the download phase (assemble what is already on disk).
    #[arg(long)]
    pub no_download: bool,

    /// Skip assembly (download only).
    #[arg(long)]
    pub no_assemble: bool,

    /// Keep the segment folder after assembly.
    #[arg(long)]
    pub keep_segments: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Video,
    Audio,
}

impl From<KindArg> for StreamKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Video => StreamKind::Video,
            KindArg::Audio => StreamKind::Audio,
        }
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Fetch(args) => run_fetch(&cfg, args).await?,
            CliCommand::Encoders { kind, flavors } => {
                run_encoders(&cfg, kind.into(), flavors).await?
            }
            CliCommand::Check => run_check(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
