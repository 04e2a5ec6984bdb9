//! Yahoo Finance chart API client
//!
//! Fetches daily adjusted-close history for a ticker via the public
//! `v8/finance/chart` endpoint. Rows without a usable close are dropped;
//! when the adjusted series is missing the raw close is used instead.
//!
//! # Example
//!
//! ```rust,no_run
//! use odds_alpha::api::YahooClient;
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = YahooClient::new();
//!     let start = NaiveDate::from_ymd_opt(2005, 1, 1).unwrap();
//!     let end = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
//!     let bars = client.get_daily_history("BVB.DE", start, end).await.unwrap();
//!     println!("Got {} trading days", bars.len());
//! }
//! ```

use super::error::{ApiError, ApiResult};
use crate::data::loader::PriceBar;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::Deserialize;

/// Yahoo Finance API base URL
const BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Some Yahoo endpoints reject requests without a browser User-Agent
const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Yahoo Finance client for daily price history
#[derive(Debug, Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Vec<Option<f64>>,
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooClient {
    /// Create a new client against the public endpoint
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Create a client against a custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetch daily bars for `symbol` between `start` and `end` (inclusive)
    pub async fn get_daily_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResult<Vec<PriceBar>> {
        if symbol.trim().is_empty() {
            return Err(ApiError::InvalidSymbol(symbol.to_string()));
        }

        // and_hms_opt only fails for out-of-range clock values; these are constant
        let period1 = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let period2 = end.and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp();
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        let response: ChartResponse = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await?
            .json()
            .await?;

        parse_chart(response)
    }
}

/// Convert the chart payload into date-sorted price bars
fn parse_chart(response: ChartResponse) -> ApiResult<Vec<PriceBar>> {
    if let Some(err) = response.chart.error {
        return Err(ApiError::ApiResponseError(format!(
            "{}: {}",
            err.code, err.description
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or(ApiError::NoData)?;

    let timestamps = result.timestamp.ok_or(ApiError::NoData)?;

    // Prefer the adjusted series, fall back to the raw quote close
    let closes: Vec<Option<f64>> = match result.indicators.adjclose {
        Some(mut adj) if !adj.is_empty() => adj.remove(0).adjclose,
        _ => result
            .indicators
            .quote
            .into_iter()
            .next()
            .and_then(|q| q.close)
            .ok_or(ApiError::NoData)?,
    };

    let mut bars = Vec::with_capacity(timestamps.len());
    for (ts, close) in timestamps.into_iter().zip(closes) {
        let (Some(close), Some(dt)) = (close, DateTime::from_timestamp(ts, 0)) else {
            continue;
        };
        bars.push(PriceBar {
            date: dt.date_naive(),
            adj_close: close,
        });
    }

    if bars.is_empty() {
        return Err(ApiError::NoData);
    }
    Ok(bars)
}
