//! `segrip encoders video|audio` – run the encoder prober.

use anyhow::{Context, Result};
use segrip_core::config::SegripConfig;
use segrip_core::transcoder::{EncoderSelector, FfmpegEncoders, StreamKind};

pub async fn run_encoders(cfg: &SegripConfig, kind: StreamKind, flavors: Vec<String>) -> Result<()> {
    let flavors = if flavors.is_empty() {
        match kind {
            StreamKind::Video => cfg.transcoder.video_flavors.clone(),
            StreamKind::Audio => cfg.transcoder.audio_flavors.clone(),
        }
    } else {
        flavors
    };
    let program = cfg.transcoder.program.clone();
    let chosen = tokio::task::spawn_blocking({
        let flavors = flavors.clone();
        move || EncoderSelector::new(FfmpegEncoders::new(program)).select_encoder(kind, &flavors)
    })
    .await
    .context("encoder probe task join")??;
    println!("{:?} encoder for flavors {:?}: {}", kind, flavors, chosen);
    Ok(())
}
