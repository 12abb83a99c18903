use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per segment (including the first).
    pub max_attempts: u32,
    /// Fixed delay in seconds between attempts.
    pub delay_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay_secs: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            delay: Duration::from_secs_f64(self.delay_secs.max(0.0)),
        }
    }
}

/// External transcoder settings (`[transcoder]` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Program name or path of the transcoder (ffmpeg-compatible CLI).
    pub program: String,
    /// Flavor priority used when re-encoding video.
    pub video_flavors: Vec<String>,
    /// Flavor priority used when re-encoding audio.
    pub audio_flavors: Vec<String>,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            video_flavors: vec!["hevc".to_string(), "h264".to_string()],
            audio_flavors: vec!["libopus".to_string()],
        }
    }
}

/// Global configuration loaded from `~/.config/segrip/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegripConfig {
    /// Base URL that segment paths are joined onto.
    pub segment_base_url: String,
    /// Number of download workers; None = host CPU count.
    #[serde(default)]
    pub workers: Option<usize>,
    /// Per-attempt timeout for a single segment GET.
    pub fetch_timeout_secs: u64,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Root directory for segment folders and final output.
    pub output_root: PathBuf,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
}

impl Default for SegripConfig {
    fn default() -> Self {
        Self {
            segment_base_url: "https://surrit.com/".to_string(),
            workers: None,
            fetch_timeout_secs: 5,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            output_root: PathBuf::from("segrip_downloads"),
            retry: None,
            transcoder: TranscoderConfig::default(),
        }
    }
}

impl SegripConfig {
    /// Worker count to use: configured value, else available parallelism, never 0.
    pub fn effective_workers(&self) -> usize {
        self.workers
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4)
            })
            .max(1)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone().unwrap_or_default().to_policy()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("segrip")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SegripConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SegripConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: SegripConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
