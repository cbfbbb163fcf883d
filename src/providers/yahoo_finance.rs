use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::util::with_retry;
use crate::core::rates::RateSource;

/// Days scanned past the requested date so weekends and holidays still
/// resolve to the first trading day's close.
const TRADING_DAY_WINDOW: i64 = 7;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const RETRIES: usize = 2;
const RETRY_DELAY_MS: u64 = 250;

/// Rate source backed by the Yahoo Finance chart API.
pub struct YahooRateSource {
    base_url: String,
}

impl YahooRateSource {
    pub fn new(base_url: &str) -> Self {
        YahooRateSource {
            base_url: base_url.to_string(),
        }
    }

    async fn fetch_chart(&self, url: &str) -> Result<ChartItem> {
        debug!("Requesting rate data from {}", url);
        let client = reqwest::Client::builder()
            .user_agent("reel/1.0")
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let response = with_retry(
            || async {
                let response = client.get(url).send().await?;
                response.json::<ChartResponse>().await
            },
            RETRIES,
            RETRY_DELAY_MS,
        )
        .await
        .map_err(|e| anyhow!("Request error: {} for URL: {}", e, url))?;

        response
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No chart data in response for URL: {}", url))
    }
}

#[derive(Deserialize, Debug)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Vec<ChartItem>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

/// First non-null close at or after the target timestamp.
fn first_close_at_or_after(
    target_ts: i64,
    timestamps: &[i64],
    closes: &[Option<f64>],
) -> Option<f64> {
    timestamps
        .iter()
        .zip(closes)
        .find(|(ts, close)| **ts >= target_ts && close.is_some())
        .and_then(|(_, close)| *close)
}

#[async_trait]
impl RateSource for YahooRateSource {
    #[instrument(name = "YahooHistoricalFetch", skip(self), fields(ticker = %ticker, date = %date))]
    async fn historical(&self, ticker: &str, date: NaiveDate) -> Result<Option<f64>> {
        let start = date.and_time(NaiveTime::MIN).and_utc().timestamp();
        let end = (date + chrono::Duration::days(TRADING_DAY_WINDOW))
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            self.base_url, ticker, start, end
        );
        let item = self.fetch_chart(&url).await?;

        let (Some(timestamps), Some(closes)) = (
            item.timestamp.as_ref(),
            item.indicators
                .as_ref()
                .and_then(|inds| inds.quote.first())
                .and_then(|q| q.close.as_ref()),
        ) else {
            debug!("No price bars in window for {}", ticker);
            return Ok(None);
        };

        Ok(first_close_at_or_after(start, timestamps, closes))
    }

    #[instrument(name = "YahooLiveFetch", skip(self), fields(ticker = %ticker))]
    async fn live(&self, ticker: &str) -> Result<f64> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.base_url, ticker
        );
        let item = self.fetch_chart(&url).await?;
        Ok(item.meta.regular_market_price)
    }
}
