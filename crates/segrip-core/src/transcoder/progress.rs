//! Transcoder progress stream parsing.
//!
//! The transcoder writes repeated `key=value` lines to stdout. Only `frame`,
//! `bitrate`, `total_size` and `speed` are kept; anything else, including
//! lines without `=` and values that do not parse, leaves the state as is.

use std::fmt;

const SIZE_UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];

/// Latest known transcode state. Display only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscodeProgress {
    pub frame: u64,
    pub bitrate: String,
    pub size_bytes: u64,
    pub speed: String,
}

impl TranscodeProgress {
    pub fn human_size(&self) -> String {
        human_size(self.size_bytes)
    }
}

impl fmt::Display for TranscodeProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Video Frames: {}, Bitrate: {}, File Size: {}, Speed: {}",
            self.frame,
            self.bitrate,
            self.human_size(),
            self.speed
        )
    }
}

/// Folds one output line into the state.
pub fn apply_progress_line(mut state: TranscodeProgress, line: &str) -> TranscodeProgress {
    let Some((key, value)) = line.split_once('=') else {
        return state;
    };
    let value = value.trim();
    match key.trim() {
        "frame" => {
            if let Ok(n) = value.parse() {
                state.frame = n;
            }
        }
        "bitrate" => state.bitrate = value.to_string(),
        "total_size" => {
            if let Ok(n) = value.parse() {
                state.size_bytes = n;
            }
        }
        "speed" => state.speed = value.to_string(),
        _ => {}
    }
    state
}

/// Scales bytes by 1000 while the value exceeds 1000, rounded to two decimals.
///
/// `2_500_000` → `"2.5 MB"`, `999` → `"999 B"`.
pub fn human_size(bytes: u64) -> String {
    if bytes <= 1000 {
        return format!("{} {}", bytes, SIZE_UNITS[0]);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value > 1000.0 && unit + 1 < SIZE_UNITS.len() {
        value /= 1000.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}
