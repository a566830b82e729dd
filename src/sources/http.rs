use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Response};

use crate::config::HttpConfig;
use crate::sources::RemoteSource;

/// Blocking HTTP client for the app's CDN links.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<Response> {
        if url.trim().is_empty() {
            bail!("no URL recorded");
        }
        self.client
            .get(url)
            .send()
            .with_context(|| format!("request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("{} returned an error status", url))
    }
}

impl RemoteSource for HttpSource {
    fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self.get(url)?;
        let mut file =
            File::create(dest).with_context(|| format!("cannot create {}", dest.display()))?;
        let written = response
            .copy_to(&mut file)
            .with_context(|| format!("reading body of {} failed", url))?;
        log::debug!("downloaded {} bytes from {}", written, url);
        Ok(written)
    }
}
