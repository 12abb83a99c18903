//! Transcoder invocation arguments for concat-manifest input.

use std::ffi::OsString;
use std::path::Path;

/// Second input mapped as an attached picture stream.
#[derive(Debug, Clone, Copy)]
pub struct CoverInput<'a> {
    pub path: &'a Path,
}

/// Arguments (program excluded) for transcoding the concat manifest at
/// `manifest` into `output`, with progress on stdout.
pub fn build_transcode_args(
    manifest: &Path,
    cover: Option<CoverInput<'_>>,
    video_codec: &str,
    audio_codec: &str,
    output: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-nostdin",
        "-loglevel",
        "error",
        "-progress",
        "pipe:1",
        "-f",
        "concat",
        "-safe",
        "0",
        "-i",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push(manifest.as_os_str().to_owned());

    match cover {
        Some(cover) => {
            args.push("-i".into());
            args.push(cover.path.as_os_str().to_owned());
            for a in [
                "-map",
                "0:v",
                "-map",
                "0:a?",
                "-map",
                "1",
                "-c:v:0",
                video_codec,
                "-c:a:0",
                audio_codec,
                "-c:v:1",
                "copy",
                "-disposition:v:1",
                "attached_pic",
            ] {
                args.push(a.into());
            }
        }
        None => {
            for a in ["-c:v", video_codec, "-c:a", audio_codec] {
                args.push(a.into());
            }
        }
    }

    args.push("-y".into());
    args.push(output.as_os_str().to_owned());
    args
}
