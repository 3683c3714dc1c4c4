//! Rate feeds over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client as HttpClient, RequestBuilder};
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::SnapshotSource;
use crate::config::SourcesConfig;
use crate::engine::Snapshot;
use crate::error::{Error, Result};
use crate::source::SourcePayload;

/// Fetches all four feeds concurrently.
pub struct HttpSnapshotSource {
    http: HttpClient,
    config: SourcesConfig,
}

impl HttpSnapshotSource {
    #[must_use]
    pub fn from_config(config: &SourcesConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .user_agent(concat!("ratearb/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            config: config.clone(),
        }
    }

    async fn send_with_retry<F>(&self, label: &str, build: F) -> Result<Value>
    where
        F: Fn() -> RequestBuilder,
    {
        let max_attempts = self.config.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let response = match build().send().await {
                Ok(response) => response,
                Err(err) => {
                    if attempt >= max_attempts || !Self::should_retry(&err) {
                        return Err(err.into());
                    }
                    self.backoff(label, attempt, max_attempts, &err).await;
                    continue;
                }
            };

            let response = response.error_for_status()?;
            match response.json::<Value>().await {
                Ok(value) => {
                    debug!(source = label, attempt, "Feed fetched");
                    return Ok(value);
                }
                Err(err) => {
                    if attempt >= max_attempts || !Self::should_retry(&err) {
                        return Err(err.into());
                    }
                    self.backoff(label, attempt, max_attempts, &err).await;
                }
            }
        }
    }

    fn should_retry(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }

    async fn backoff(&self, label: &str, attempt: u32, max_attempts: u32, err: &reqwest::Error) {
        warn!(
            source = label,
            attempt,
            max_attempts,
            error = %err,
            "HTTP request failed, retrying"
        );
        let delay = backoff_delay(self.config.retry_backoff(), attempt);
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }

    async fn hyperliquid(&self) -> Result<Value> {
        self.send_with_retry("hyperliquid", || {
            self.http
                .post(&self.config.hyperliquid_url)
                .json(&json!({ "type": "predictedFundings" }))
        })
        .await
    }

    async fn get(&self, label: &str, url: &str) -> Result<Value> {
        self.send_with_retry(label, || self.http.get(url)).await
    }
}

/// Delay before retry `attempt`: the base delay doubled per prior retry.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    base.saturating_mul(1 << exponent)
}

/// Keep a fetched payload, or log the failure and leave the source out.
fn keep(
    payloads: &mut Vec<SourcePayload>,
    label: &str,
    result: Result<Value>,
    wrap: fn(Value) -> SourcePayload,
) {
    match result {
        Ok(value) => payloads.push(wrap(value)),
        Err(err) => warn!(source = label, error = %err, "Feed unavailable, continuing without it"),
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self) -> Result<Snapshot> {
        let (hyperliquid, drift, lending, staking) = tokio::join!(
            self.hyperliquid(),
            self.get("drift", &self.config.drift_url),
            self.get("lending", &self.config.lending_url),
            self.get("staking", &self.config.staking_url),
        );

        let mut payloads = Vec::with_capacity(4);
        keep(&mut payloads, "hyperliquid", hyperliquid, SourcePayload::Hyperliquid);
        keep(&mut payloads, "drift", drift, SourcePayload::Drift);
        keep(&mut payloads, "lending", lending, SourcePayload::Lending);
        keep(&mut payloads, "staking", staking, SourcePayload::Staking);

        if payloads.is_empty() {
            return Err(Error::NoData);
        }
        info!(sources = payloads.len(), "Snapshot fetched");
        Ok(Snapshot::new(payloads).with_fetched_at(Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, 4), Duration::from_millis(800));
    }

    #[test]
    fn failed_feeds_are_left_out() {
        let mut payloads = Vec::new();
        keep(&mut payloads, "drift", Ok(json!({ "data": [] })), SourcePayload::Drift);
        keep(&mut payloads, "staking", Err(Error::NoData), SourcePayload::Staking);

        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0], SourcePayload::Drift(json!({ "data": [] })));
    }

    #[tokio::test]
    async fn unreachable_endpoints_yield_no_data() {
        let config = SourcesConfig {
            hyperliquid_url: "http://127.0.0.1:9/info".into(),
            drift_url: "http://127.0.0.1:9/markets24h".into(),
            lending_url: "http://127.0.0.1:9/current-rates".into(),
            staking_url: "http://127.0.0.1:9/current-staking-rates".into(),
            timeout_secs: 1,
            max_retries: 0,
            retry_backoff_ms: 0,
            ..SourcesConfig::default()
        };

        let result = HttpSnapshotSource::from_config(&config).fetch().await;
        assert!(matches!(result, Err(Error::NoData)));
    }
}
