//! Encoder discovery, benchmark and selection.
//!
//! A build of the transcoder can list encoders that do not work on this host
//! (hardware encoders without the hardware), so every candidate is tried on a
//! one-frame synthetic input before it can be picked.

use std::collections::HashMap;
use std::process::{Command, Stdio};
use std::sync::Mutex;

use super::{TranscodeError, COPY_CODEC};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    /// Leading capability letter in the encoder listing.
    pub fn tag(self) -> char {
        match self {
            StreamKind::Video => 'V',
            StreamKind::Audio => 'A',
        }
    }

    /// Stream specifier letter used in codec flags (`-c:v`, `-c:a`).
    pub fn specifier(self) -> &'static str {
        match self {
            StreamKind::Video => "v",
            StreamKind::Audio => "a",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderCandidate {
    pub name: String,
    pub kind: StreamKind,
}

/// Access to the transcoder's encoder list and a per-encoder smoke test.
pub trait EncoderBackend {
    /// Raw output of the encoder listing.
    fn list_encoders(&self) -> Result<String, TranscodeError>;
    /// True if a one-frame encode with `candidate` succeeds.
    fn benchmark(&self, candidate: &EncoderCandidate) -> bool;
}

/// Parses the encoder listing.
///
/// Entries follow the `------` separator line when there is one; each entry
/// starts with a capability field whose first letter is the stream type,
/// followed by the encoder name.
pub fn parse_encoder_listing(listing: &str, kind: StreamKind) -> Vec<EncoderCandidate> {
    let body = match listing.split_once("------") {
        Some((_, rest)) => rest,
        None => listing,
    };
    body.lines()
        .map(str::trim)
        .filter(|l| l.starts_with(kind.tag()))
        .filter_map(|l| l.split_whitespace().nth(1))
        .map(|name| EncoderCandidate {
            name: name.to_string(),
            kind,
        })
        .collect()
}

/// Keeps candidates whose name contains any flavor. No flavors keeps all.
pub fn filter_by_flavor(candidates: Vec<EncoderCandidate>, flavors: &[String]) -> Vec<EncoderCandidate> {
    if flavors.is_empty() {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|c| flavors.iter().any(|f| c.name.contains(f.as_str())))
        .collect()
}

/// Reorders `encoders` by flavor priority.
///
/// For flavor `i` (in priority order), every encoder containing it is removed
/// and reinserted at position `i`. With several matches for one flavor the
/// last match ends up first, and an encoder matching several flavors keeps
/// the position of the last flavor it matched.
pub fn order_by_flavor(mut encoders: Vec<String>, flavors: &[String]) -> Vec<String> {
    for (index, flavor) in flavors.iter().enumerate() {
        let snapshot = encoders.clone();
        for encoder in snapshot {
            if encoder.contains(flavor.as_str()) {
                if let Some(pos) = encoders.iter().position(|e| *e == encoder) {
                    encoders.remove(pos);
                }
                let at = index.min(encoders.len());
                encoders.insert(at, encoder);
            }
        }
    }
    encoders
}

/// Picks an encoder per (stream kind, flavor list) and remembers the answer.
///
/// The cache lives as long as the selector; create one per run and share it.
pub struct EncoderSelector<B> {
    backend: B,
    cache: Mutex<HashMap<(StreamKind, Vec<String>), String>>,
}

impl<B: EncoderBackend> EncoderSelector<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the encoder to use, or `"copy"` when no candidate survives the
    /// benchmark. Probing runs at most once per distinct key; concurrent
    /// callers wait for the first probe.
    pub fn select_encoder(
        &self,
        kind: StreamKind,
        flavor_priority: &[String],
    ) -> Result<String, TranscodeError> {
        let key = (kind, flavor_priority.to_vec());
        let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(hit) = cache.get(&key) {
            return Ok(hit.clone());
        }
        let chosen = self.probe(kind, flavor_priority)?;
        cache.insert(key, chosen.clone());
        Ok(chosen)
    }

    /// Forget every memoized choice.
    pub fn clear(&self) {
        self.cache.lock().unwrap_or_else(|p| p.into_inner()).clear();
    }

    fn probe(&self, kind: StreamKind, flavors: &[String]) -> Result<String, TranscodeError> {
        let listing = self.backend.list_encoders()?;
        let candidates = filter_by_flavor(parse_encoder_listing(&listing, kind), flavors);
        tracing::info!(?kind, candidates = candidates.len(), "benchmarking encoders");

        let mut usable: Vec<String> = Vec::new();
        for c in &candidates {
            let ok = self.backend.benchmark(c);
            tracing::debug!(encoder = %c.name, ok, "encoder benchmark");
            if ok && !usable.contains(&c.name) {
                usable.push(c.name.clone());
            } else if !ok {
                tracing::warn!(encoder = %c.name, "encoder unusable on this host");
            }
        }

        let chosen = order_by_flavor(usable, flavors)
            .into_iter()
            .next()
            .unwrap_or_else(|| COPY_CODEC.to_string());
        tracing::info!(?kind, encoder = %chosen, "encoder selected");
        Ok(chosen)
    }
}

/// [`EncoderBackend`] backed by an ffmpeg-compatible executable.
#[derive(Debug, Clone)]
pub struct FfmpegEncoders {
    pub program: String,
}

impl FfmpegEncoders {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn benchmark_args(candidate: &EncoderCandidate) -> Vec<String> {
        let (source, frames_flag) = match candidate.kind {
            StreamKind::Video => ("color=black:s=256x256", "-frames:v"),
            StreamKind::Audio => ("anullsrc=r=48000:cl=stereo", "-frames:a"),
        };
        let codec_flag = format!("-c:{}", candidate.kind.specifier());
        let args: [&str; 16] = [
            "-loglevel",
            "quiet",
            "-hide_banner",
            "-nostdin",
            "-f",
            "lavfi",
            "-i",
            source,
            codec_flag.as_str(),
            candidate.name.as_str(),
            frames_flag,
            "1",
            "-f",
            "null",
            "-",
            "-benchmark",
        ];
        args.iter().map(|s| s.to_string()).collect()
    }
}

impl EncoderBackend for FfmpegEncoders {
    fn list_encoders(&self) -> Result<String, TranscodeError> {
        tracing::info!(program = %self.program, "querying encoders");
        let out = Command::new(&self.program)
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|source| TranscodeError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !out.status.success() {
            return Err(TranscodeError::EncoderQuery {
                program: self.program.clone(),
                detail: out.status.to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    fn benchmark(&self, candidate: &EncoderCandidate) -> bool {
        Command::new(&self.program)
            .args(Self::benchmark_args(candidate))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}
