//! Turning downloaded segment files into the final output file.
//!
//! Two strategies: [`concatenate`] appends segment bytes verbatim, and
//! [`transcode`] hands a concat manifest to the external transcoder. Both
//! skip gaps and report how many segments they actually used.

mod concat;
mod manifest;
mod transcode;

use std::path::PathBuf;

pub use concat::concatenate;
pub use manifest::{present_segments, write_manifest};
pub use transcode::{transcode, TranscodeFailure, TranscodeOptions};

use crate::job::DownloadJob;

/// What an assembly produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyResult {
    pub output_path: PathBuf,
    pub segments_expected: usize,
    /// Segment files that went into the output; never more than expected.
    pub segments_found: usize,
}

impl AssemblyResult {
    pub(crate) fn for_job(job: &DownloadJob, segments_found: usize) -> Self {
        Self {
            output_path: job.output_path(),
            segments_expected: job.segment_count,
            segments_found,
        }
    }

    /// `segments_found / segments_expected`; a job with no segments is complete.
    pub fn completion_ratio(&self) -> f64 {
        if self.segments_expected == 0 {
            return 1.0;
        }
        self.segments_found as f64 / self.segments_expected as f64
    }

    pub fn is_complete(&self) -> bool {
        self.segments_found == self.segments_expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_ratio() {
        let r = AssemblyResult {
            output_path: PathBuf::from("x.mp4"),
            segments_expected: 4,
            segments_found: 3,
        };
        assert_eq!(r.completion_ratio(), 0.75);
        assert!(!r.is_complete());

        let empty = AssemblyResult {
            output_path: PathBuf::from("x.mp4"),
            segments_expected: 0,
            segments_found: 0,
        };
        assert_eq!(empty.completion_ratio(), 1.0);
        assert!(empty.is_complete());
    }
}
