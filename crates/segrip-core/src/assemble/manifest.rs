//! Concat manifest for the transcoder's `concat` demuxer.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::job::DownloadJob;

/// Paths of the segment files present on disk, ascending by index.
pub fn present_segments(job: &DownloadJob) -> Vec<PathBuf> {
    (0..job.segment_count)
        .map(|i| job.segment_path(i))
        .filter(|p| p.is_file())
        .collect()
}

/// Writes one `file '<path>'` line per segment to `out`.
pub fn write_manifest<W: Write>(out: &mut W, segments: &[PathBuf]) -> io::Result<()> {
    for seg in segments {
        let abs = absolute(seg);
        writeln!(out, "file '{}'", quote(&abs.to_string_lossy()))?;
    }
    out.flush()
}

/// Single quotes cannot be escaped inside a quoted string, so close, escape, reopen.
fn quote(s: &str) -> String {
    s.replace('\'', r"'\''")
}

/// The demuxer resolves relative entries against the manifest's directory.
fn absolute(p: &Path) -> PathBuf {
    fs::canonicalize(p).unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(p))
            .unwrap_or_else(|_| p.to_path_buf())
    })
}
