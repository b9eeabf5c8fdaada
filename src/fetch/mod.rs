//! Daily price download from Yahoo Finance
//!
//! Fetches adjusted closing prices from the public chart endpoint.
//!
//! # Example
//!
//! ```no_run
//! use kelly::fetch::{FetchConfig, YahooClient};
//! use kelly::PriceHistory;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = YahooClient::new(FetchConfig::default())?;
//! let series = client
//!     .fetch_history(&["AAPL".to_string(), "MSFT".to_string()], 126)
//!     .await?;
//! let prices = PriceHistory::align(series)?;
//! println!("{} aligned rows", prices.len());
//! # Ok(())
//! # }
//! ```

mod client;

pub use client::{FetchConfig, FetchError, YahooClient};

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::data::PriceSeries;

/// Top-level chart response
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Parse a chart response body into a price series
///
/// Adjusted closes are used when present, plain closes otherwise. Null
/// prices are skipped.
pub fn parse_chart_response(ticker: &str, body: &str) -> Result<PriceSeries, FetchError> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if let Some(err) = response.chart.error {
        return Err(FetchError::Api {
            ticker: ticker.to_string(),
            message: format!("{}: {}", err.code, err.description),
        });
    }

    let result = response
        .chart
        .result
        .and_then(|mut results| {
            if results.is_empty() {
                None
            } else {
                Some(results.swap_remove(0))
            }
        })
        .ok_or_else(|| FetchError::NoData(ticker.to_string()))?;

    let closes = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose)
        .filter(|prices| !prices.is_empty())
        .or_else(|| result.indicators.quote.into_iter().next().map(|q| q.close))
        .unwrap_or_default();

    let points: Vec<(NaiveDate, f64)> = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(&ts, price)| {
            let date = DateTime::from_timestamp(ts, 0)?.date_naive();
            price.map(|p| (date, p))
        })
        .collect();

    if points.is_empty() {
        return Err(FetchError::NoData(ticker.to_string()));
    }

    Ok(PriceSeries::new(ticker, points))
}
