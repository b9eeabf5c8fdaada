//! HTTP client with retry for the Yahoo Finance chart endpoint

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use thiserror::Error;

use super::parse_chart_response;
use crate::data::PriceSeries;

/// Base URL for the chart endpoint
const BASE_URL_CHART: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Request for {ticker} failed with status {status}")]
    Status { ticker: String, status: u16 },

    #[error("Price source error for {ticker}: {message}")]
    Api { ticker: String, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("No data returned for ticker: {0}")]
    NoData(String),
}

/// Fetch configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Max attempts per ticker
    pub max_retries: u32,
    /// Base delay between attempts in milliseconds (grows linearly)
    pub retry_delay_ms: u64,
    /// User agent string
    pub user_agent: String,
    /// Chart endpoint, without trailing slash
    pub base_url: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 1000,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            base_url: BASE_URL_CHART.to_string(),
        }
    }
}

/// Daily price client
pub struct YahooClient {
    client: reqwest::Client,
    config: FetchConfig,
}

impl YahooClient {
    /// Create a new client with the given configuration
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    /// Build URL for a ticker's daily chart between two unix timestamps
    fn build_url(&self, ticker: &str, period1: i64, period2: i64) -> String {
        format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            self.config.base_url, ticker, period1, period2
        )
    }

    /// Fetch a response body with retry
    async fn fetch_body(&self, ticker: &str, url: &str) -> Result<String, FetchError> {
        let mut last_error = FetchError::NoData(ticker.to_string());

        for attempt in 0..self.config.max_retries {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.text().await.map_err(FetchError::RequestFailed);
                    }
                    tracing::warn!(
                        "{}: request failed with status {} (attempt {}/{})",
                        ticker,
                        status,
                        attempt + 1,
                        self.config.max_retries
                    );
                    last_error = FetchError::Status {
                        ticker: ticker.to_string(),
                        status: status.as_u16(),
                    };
                    // Unknown symbols will not appear on retry
                    if status.as_u16() == 404 {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "{}: request failed (attempt {}/{}): {}",
                        ticker,
                        attempt + 1,
                        self.config.max_retries,
                        e
                    );
                    last_error = FetchError::RequestFailed(e);
                }
            }

            if attempt + 1 < self.config.max_retries {
                let backoff = Duration::from_millis(self.config.retry_delay_ms * (attempt as u64 + 1));
                tokio::time::sleep(backoff).await;
            }
        }

        Err(last_error)
    }

    /// Fetch daily prices for one ticker over the last `lookback_days` calendar days
    pub async fn fetch_series(
        &self,
        ticker: &str,
        lookback_days: u32,
    ) -> Result<PriceSeries, FetchError> {
        let end = Utc::now();
        let start = window_start(end, lookback_days);
        let url = self.build_url(ticker, start.timestamp(), end.timestamp());

        tracing::info!("Fetching {} ({} days)", ticker, lookback_days);
        let body = self.fetch_body(ticker, &url).await?;
        parse_chart_response(ticker, &body)
    }

    /// Fetch daily prices for several tickers, one request at a time
    pub async fn fetch_history(
        &self,
        tickers: &[String],
        lookback_days: u32,
    ) -> Result<Vec<PriceSeries>, FetchError> {
        let mut series = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            series.push(self.fetch_series(ticker, lookback_days).await?);
        }
        Ok(series)
    }
}

/// Start of a `days`-long window ending at `end`, clamped to the unix epoch
fn window_start(end: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    TimeDelta::try_days(i64::from(days))
        .and_then(|window| end.checked_sub_signed(window))
        .filter(|start| *start > DateTime::UNIX_EPOCH)
        .unwrap_or(DateTime::UNIX_EPOCH)
}
