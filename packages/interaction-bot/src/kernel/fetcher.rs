//! Input file fetching over HTTP(S), `file://` URLs, or plain local paths.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use url::Url;

use super::BaseFileFetcher;

/// Where a `-file` argument points.
#[derive(Debug, Clone, PartialEq)]
pub enum FileLocation {
    Remote(Url),
    Local(PathBuf),
}

impl FileLocation {
    pub fn parse(raw: &str) -> Result<Self> {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self::Remote(url)),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|_| anyhow!("Invalid file URL: {}", raw)),
            Ok(url) if url.scheme().len() > 1 => bail!("Unsupported URL scheme: {}", url.scheme()),
            // Single-letter "schemes" are Windows drive letters
            _ => Ok(Self::Local(PathBuf::from(raw))),
        }
    }
}

pub struct HttpFileFetcher {
    client: reqwest::Client,
}

impl HttpFileFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BaseFileFetcher for HttpFileFetcher {
    async fn fetch(&self, location: &str) -> Result<String> {
        match FileLocation::parse(location)? {
            FileLocation::Remote(url) => {
                info!(url = %url, "Downloading file");
                let resp = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .with_context(|| format!("Failed to download {}", url))?;
                let status = resp.status();
                if !status.is_success() {
                    bail!("HTTP {} for {}", status.as_u16(), url);
                }
                let text = resp.text().await.context("Failed to read response body")?;
                info!(url = %url, bytes = text.len(), "File downloaded");
                Ok(text)
            }
            FileLocation::Local(path) => {
                let text = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                info!(path = %path.display(), bytes = text.len(), "File loaded");
                Ok(text)
            }
        }
    }
}
