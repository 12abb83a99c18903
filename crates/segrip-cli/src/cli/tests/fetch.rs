//! Tests for `segrip fetch` argument parsing.

use super::parse;
use crate::cli::{Cli, CliCommand, FetchArgs};
use clap::Parser;
use std::path::PathBuf;

fn fetch(args: &[&str]) -> FetchArgs {
    match parse(args) {
        CliCommand::Fetch(a) => a,
        other => panic!("expected Fetch, got {:?}", other),
    }
}

#[test]
fn cli_parse_fetch_minimal() {
    let a = fetch(&["segrip", "fetch", "--source-id", "0f1e", "--name", "abc-123"]);
    assert_eq!(a.source_id, "0f1e");
    assert_eq!(a.name, "abc-123");
    assert!(a.resolution.is_none());
    assert!(a.segments.is_none());
    assert!(a.output.is_none());
    assert!(!a.ffmpeg);
    assert!(!a.no_download);
    assert!(!a.no_assemble);
    assert!(!a.keep_segments);
}

#[test]
fn cli_parse_fetch_explicit_layout() {
    let a = fetch(&[
        "segrip",
        "fetch",
        "--source-id",
        "id",
        "--name",
        "n",
        "--resolution",
        "1280x720",
        "--segments",
        "1776",
        "--output",
        "/tmp/out",
        "--workers",
        "8",
        "--title",
        "Some Title",
        "--keep-segments",
    ]);
    assert_eq!(a.resolution.as_deref(), Some("1280x720"));
    assert_eq!(a.segments, Some(1776));
    assert_eq!(a.output, Some(PathBuf::from("/tmp/out")));
    assert_eq!(a.workers, Some(8));
    assert_eq!(a.title.as_deref(), Some("Some Title"));
    assert!(a.keep_segments);
}

#[test]
fn cli_parse_fetch_transcoder_flags() {
    let a = fetch(&[
        "segrip",
        "fetch",
        "--source-id",
        "id",
        "--name",
        "n",
        "--ffmpeg",
        "--cover-url",
        "https://img.example/n/cover.jpg",
        "--cover-as-preview",
        "--video-reencode",
        "--audio-reencode",
    ]);
    assert!(a.ffmpeg);
    assert!(a.cover_as_preview);
    assert!(a.video_reencode);
    assert!(a.audio_reencode);
    assert_eq!(a.cover_url.as_deref(), Some("https://img.example/n/cover.jpg"));
}

#[test]
fn cli_parse_fetch_phase_switches() {
    let a = fetch(&[
        "segrip",
        "fetch",
        "--source-id",
        "id",
        "--name",
        "n",
        "--no-download",
        "--no-assemble",
    ]);
    assert!(a.no_download);
    assert!(a.no_assemble);
}

#[test]
fn cli_parse_fetch_resolution_needs_segments() {
    let r = Cli::try_parse_from([
        "segrip",
        "fetch",
        "--source-id",
        "id",
        "--name",
        "n",
        "--resolution",
        "720p",
    ]);
    assert!(r.is_err());
}

#[test]
fn cli_parse_fetch_requires_name() {
    assert!(Cli::try_parse_from(["segrip", "fetch", "--source-id", "id"]).is_err());
}
