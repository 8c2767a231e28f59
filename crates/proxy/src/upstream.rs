use anyhow::Context;
use serde_json::Value;
use std::time::Duration;

/// The prediction service behind the proxy. Only `GET /predict` is relayed.
#[derive(Debug, Clone)]
pub struct Upstream {
    http: reqwest::Client,
    base_url: String,
}

impl Upstream {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        anyhow::ensure!(!base_url.trim().is_empty(), "proxy upstream URL is empty");

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build upstream http client")?;

        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One call, no retry. Non-success status and non-JSON bodies are errors.
    pub async fn predict(&self, symbol: &str) -> anyhow::Result<Value> {
        let url = format!("{}/predict", self.base_url);
        let res = self
            .http
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read upstream body from {url}"))?;

        anyhow::ensure!(
            status.is_success(),
            "upstream returned {status}: {}",
            truncate(&text, 200)
        );

        serde_json::from_str(&text).context("upstream body is not JSON")
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
