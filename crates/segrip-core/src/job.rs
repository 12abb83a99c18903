//! The download job handed to the core, and every path/URL derived from it.

use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Extension of the assembled output file.
pub const OUTPUT_EXT: &str = "mp4";

#[derive(Debug, Error)]
pub enum JobSpecError {
    #[error("job name must not be empty")]
    EmptyName,
    #[error("job name {0:?} must be a single path component")]
    NameNotAComponent(String),
    #[error("segment source id must not be empty")]
    EmptySourceId,
    #[error("{field} {value:?} must be a plain URL path segment")]
    UnsafeSegment { field: &'static str, value: String },
    #[error("invalid segment URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A resolved asset: which segments to fetch and where to put them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// Local name of the asset; names the segment folder and output file.
    pub name: String,
    /// Remote identifier the segment URLs are built from.
    pub segment_source_id: String,
    /// Variant directory on the remote side (e.g. `1280x720`).
    pub resolution_tag: String,
    /// Number of segments; valid indices are `0..segment_count`.
    pub segment_count: usize,
    pub output_root: PathBuf,
}

impl DownloadJob {
    pub fn new(
        name: impl Into<String>,
        segment_source_id: impl Into<String>,
        resolution_tag: impl Into<String>,
        segment_count: usize,
        output_root: impl Into<PathBuf>,
    ) -> Result<Self, JobSpecError> {
        let job = DownloadJob {
            name: name.into(),
            segment_source_id: segment_source_id.into(),
            resolution_tag: resolution_tag.into(),
            segment_count,
            output_root: output_root.into(),
        };
        job.validate()?;
        Ok(job)
    }

    pub fn validate(&self) -> Result<(), JobSpecError> {
        if self.name.trim().is_empty() {
            return Err(JobSpecError::EmptyName);
        }
        let mut components = Path::new(&self.name).components();
        let single = matches!(
            (components.next(), components.next()),
            (Some(std::path::Component::Normal(_)), None)
        );
        if !single {
            return Err(JobSpecError::NameNotAComponent(self.name.clone()));
        }
        if self.segment_source_id.trim().is_empty() {
            return Err(JobSpecError::EmptySourceId);
        }
        check_path_segment("segment source id", &self.segment_source_id)?;
        check_path_segment("resolution tag", &self.resolution_tag)?;
        Ok(())
    }

    /// Directory holding this job's segment files.
    pub fn segment_dir(&self) -> PathBuf {
        self.output_root.join(&self.name)
    }

    /// Path of the segment file for `index`.
    pub fn segment_path(&self, index: usize) -> PathBuf {
        self.segment_dir().join(segment_file_name(index))
    }

    /// Final assembled file: `<output_root>/<name>.mp4`.
    pub fn output_path(&self) -> PathBuf {
        self.output_root.join(format!("{}.{}", self.name, OUTPUT_EXT))
    }

    /// Cover image location: `<output_root>/<name>-cover.jpg`.
    pub fn cover_path(&self) -> PathBuf {
        self.output_root.join(format!("{}-cover.jpg", self.name))
    }

    /// Remote URL of segment `index`: `<base>/<source_id>/<resolution>/video<index>.jpeg`.
    pub fn segment_url(&self, base: &Url, index: usize) -> Result<Url, JobSpecError> {
        let rel = format!(
            "{}/{}/{}",
            self.segment_source_id,
            self.resolution_tag,
            segment_file_name(index)
        );
        Ok(with_trailing_slash(base)?.join(&rel)?)
    }
}

pub fn segment_file_name(index: usize) -> String {
    format!("video{}.jpeg", index)
}

/// Rejects values `Url::join` would not treat as one relative path segment
/// (`:` starts a scheme, a slash starts a path or authority, `?` and `#` end the path).
pub(crate) fn check_path_segment(field: &'static str, value: &str) -> Result<(), JobSpecError> {
    let bad = value.is_empty()
        || value == "."
        || value == ".."
        || value.chars().any(|c| {
            matches!(c, ':' | '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control()
        });
    if bad {
        return Err(JobSpecError::UnsafeSegment {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
pub(crate) fn with_trailing_slash(base: &Url) -> Result<Url, url::ParseError> {
    if base.path().ends_with('/') {
        Ok(base.clone())
    } else {
        Url::parse(&format!("{}/", base.as_str()))
    }
}
