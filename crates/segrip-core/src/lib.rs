pub mod config;
pub mod logging;

pub mod assemble;
pub mod downloader;
pub mod fetch;
pub mod job;
pub mod pipeline;
pub mod playlist;
pub mod progress;
pub mod retry;
pub mod sanitize;
pub mod segmenter;
pub mod storage;
pub mod transcoder;
