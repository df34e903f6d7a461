//! Outbound HTTP used by link validation: timed page fetches and a single
//! manual-mode redirect probe. All network failures degrade to `None`.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::warn;
use url::Url;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Body of `url` as text, or None on timeout/error/non-2xx.
    async fn get_text(&self, url: &str, timeout: Duration) -> Option<String>;

    /// Resolved `Location` target of one HEAD redirect, or None when the
    /// response is not a redirect or the probe failed.
    async fn head_location(&self, url: &str, timeout: Duration) -> Option<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .user_agent(concat!("menumaison/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get_text(&self, url: &str, timeout: Duration) -> Option<String> {
        let response = match self.client.get(url).timeout(timeout).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, "search page fetch failed");
                return None;
            }
        };
        if !response.status().is_success() {
            return None;
        }
        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(url, error = %e, "search page body read failed");
                None
            }
        }
    }

    async fn head_location(&self, url: &str, timeout: Duration) -> Option<String> {
        let response = match self.client.head(url).timeout(timeout).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, "redirect probe failed");
                return None;
            }
        };
        if !response.status().is_redirection() {
            return None;
        }
        let location = response.headers().get(reqwest::header::LOCATION)?;
        let location = location.to_str().ok()?;
        let base = Url::parse(url).ok()?;
        let resolved = base.join(location).ok()?;
        Some(resolved.to_string())
    }
}

/// Fetcher that never reaches the network; used by tests and as a safe
/// default when outbound HTTP is unwanted.
#[derive(Default)]
pub struct NullFetcher;

#[async_trait]
impl PageFetcher for NullFetcher {
    async fn get_text(&self, _url: &str, _timeout: Duration) -> Option<String> {
        None
    }

    async fn head_location(&self, _url: &str, _timeout: Duration) -> Option<String> {
        None
    }
}
