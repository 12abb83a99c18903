//! `segrip check` – is the transcoder runnable?

use anyhow::{bail, Result};
use segrip_core::config::SegripConfig;
use segrip_core::transcoder;

pub fn run_check(cfg: &SegripConfig) -> Result<()> {
    let program = &cfg.transcoder.program;
    if transcoder::check_available(program) {
        println!("transcoder OK: {}", program);
        Ok(())
    } else {
        bail!("transcoder {:?} not found or not runnable (set [transcoder] program in config)", program)
    }
}
