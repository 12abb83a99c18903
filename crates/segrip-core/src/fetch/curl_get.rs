//! Single GET via a libcurl easy handle.

use super::HttpGet;
use crate::retry::FetchError;
use std::time::Duration;
use url::Url;

/// Blocking GET with a short overall timeout. One easy handle per call, so the
/// value is freely shared between worker threads.
#[derive(Debug, Clone)]
pub struct CurlGet {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    /// Skip TLS peer/host verification (the segment hosts use odd certificates).
    pub insecure: bool,
}

impl Default for CurlGet {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            user_agent: None,
            insecure: true,
        }
    }
}

impl CurlGet {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            timeout,
            user_agent: Some(user_agent.into()),
            ..Self::default()
        }
    }
}

impl HttpGet for CurlGet {
    fn get(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let mut body = Vec::new();
        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.timeout)?;
        easy.timeout(self.timeout)?;
        if let Some(ua) = &self.user_agent {
            easy.useragent(ua)?;
        }
        if self.insecure {
            easy.ssl_verify_peer(false)?;
            easy.ssl_verify_host(false)?;
        }

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }
        Ok(body)
    }
}
