//! Tests for encoders and check.

use super::parse;
use crate::cli::{Cli, CliCommand, KindArg};
use clap::Parser;

#[test]
fn cli_parse_check() {
    match parse(&["segrip", "check"]) {
        CliCommand::Check => {}
        _ => panic!("expected Check"),
    }
}

#[test]
fn cli_parse_encoders_video_default_flavors() {
    match parse(&["segrip", "encoders", "video"]) {
        CliCommand::Encoders { kind, flavors } => {
            assert_eq!(kind, KindArg::Video);
            assert!(flavors.is_empty());
        }
        _ => panic!("expected Encoders"),
    }
}

#[test]
fn cli_parse_encoders_audio_with_flavors() {
    match parse(&[
        "segrip", "encoders", "audio", "--flavor", "libopus", "--flavor", "aac",
    ]) {
        CliCommand::Encoders { kind, flavors } => {
            assert_eq!(kind, KindArg::Audio);
            assert_eq!(flavors, vec!["libopus", "aac"]);
        }
        _ => panic!("expected Encoders"),
    }
}

#[test]
fn cli_parse_encoders_rejects_unknown_kind() {
    assert!(Cli::try_parse_from(["segrip", "encoders", "subtitle"]).is_err());
}
