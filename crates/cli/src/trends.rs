use anyhow::Context;
use std::time::Duration;
use stockcast_core::domain::market_trends::MarketTrends;

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load market trends data";

pub async fn fetch(base_url: &str, timeout: Duration) -> anyhow::Result<MarketTrends> {
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build market trends http client")?;

    let url = format!("{}/api/market-trends", base_url.trim().trim_end_matches('/'));
    let res = http
        .get(&url)
        .send()
        .await
        .with_context(|| format!("GET {url} failed"))?
        .error_for_status()
        .with_context(|| format!("GET {url} returned an error status"))?;

    res.json::<MarketTrends>()
        .await
        .context("failed to decode market trends response")
}
