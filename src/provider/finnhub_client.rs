use super::config;
use super::MarketDataProvider;
use crate::error::ScanError;
use crate::scanner::models::{
    Fundamentals, OptionChain, OptionExpiration, OptionQuote, OptionSide, PriceBar, PriceSeries,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDate};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tracing::{debug, warn};

// -----------------------------------------------
// RESPONSE MODELS
// -----------------------------------------------

#[derive(Debug, Deserialize)]
struct CandleResponse {
    #[serde(rename = "s")]
    status: String,
    #[serde(rename = "c", default)]
    closes: Vec<f64>,
    #[serde(rename = "v", default)]
    volumes: Vec<f64>,
    #[serde(rename = "t", default)]
    timestamps: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct OptionChainResponse {
    #[serde(default)]
    data: Vec<ExpirationEntry>,
}

#[derive(Debug, Deserialize)]
struct ExpirationEntry {
    #[serde(rename = "expirationDate")]
    expiration_date: Option<String>,
    #[serde(default)]
    options: HashMap<String, Vec<ContractEntry>>,
}

#[derive(Debug, Deserialize)]
struct ContractEntry {
    strike: Option<f64>,
    bid: Option<f64>,
    ask: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileResponse {
    #[serde(rename = "finnhubIndustry")]
    industry: Option<String>,
    #[serde(rename = "marketCapitalization")]
    market_cap: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct MetricResponse {
    #[serde(default)]
    metric: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct EarningsResponse {
    #[serde(rename = "earningsCalendar", default)]
    earnings_calendar: Vec<EarningsEntry>,
}

#[derive(Debug, Deserialize)]
struct EarningsEntry {
    date: Option<String>,
}

// -----------------------------------------------
// FETCH ERRORS
// -----------------------------------------------

struct FetchError {
    retryable: bool,
    error: ScanError,
}

impl FetchError {
    fn retry(error: ScanError) -> Self {
        Self { retryable: true, error }
    }

    fn fatal(error: ScanError) -> Self {
        Self { retryable: false, error }
    }
}

// -----------------------------------------------
// CLIENT
// -----------------------------------------------

/// REST adapter for finnhub.io
pub struct FinnhubClient {
    client: Client,
    api_key: String,
}

impl FinnhubClient {
    pub fn new(api_key: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            anyhow::bail!("FINNHUB_API_KEY is empty");
        }
        Ok(Self {
            client: build_client()?,
            api_key: api_key.trim().to_string(),
        })
    }

    /// GET with exponential backoff on 429/5xx and transport failures
    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ScanError> {
        let backoff = ExponentialBackoff::from_millis(config::RETRY_BASE_DELAY_MS)
            .factor(config::RETRY_FACTOR)
            .max_delay(Duration::from_secs(config::RETRY_MAX_DELAY_SECS))
            .map(jitter)
            .take(config::RETRY_MAX_ATTEMPTS);

        let text = RetryIf::spawn(
            backoff,
            || async move {
                let res = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| FetchError::retry(ScanError::from(e)))?;

                let status = res.status();
                if status.is_success() {
                    return res
                        .text()
                        .await
                        .map_err(|e| FetchError::retry(ScanError::from(e)));
                }

                let body = res.text().await.unwrap_or_default();
                let preview: String = body.chars().take(200).collect();

                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    Err(FetchError::retry(ScanError::Provider(format!(
                        "retryable status {}: {}",
                        status, preview
                    ))))
                } else if status == StatusCode::NOT_FOUND {
                    Err(FetchError::fatal(ScanError::NotFound(preview)))
                } else {
                    Err(FetchError::fatal(ScanError::Provider(format!(
                        "client error {}: {}",
                        status, preview
                    ))))
                }
            },
            |e: &FetchError| e.retryable,
        )
        .await
        .map_err(|e| e.error)?;

        let trimmed = text.trim();
        if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
            let preview: String = trimmed.chars().take(200).collect();
            return Err(ScanError::Provider(format!("Non-JSON response: {}", preview)));
        }

        Ok(serde_json::from_str(trimmed)?)
    }

    /// Next earnings date within the horizon; failures only cost the field
    async fn fetch_earnings_date(&self, ticker: &str) -> Option<NaiveDate> {
        let today = Local::now().date_naive();
        let horizon = today + ChronoDuration::days(config::EARNINGS_HORIZON_DAYS);
        let url = config::finnhub_earnings_url(
            ticker,
            &today.format("%Y-%m-%d").to_string(),
            &horizon.format("%Y-%m-%d").to_string(),
            &self.api_key,
        );

        match self.fetch_json::<EarningsResponse>(&url).await {
            Ok(resp) => resp
                .earnings_calendar
                .iter()
                .filter_map(|e| e.date.as_deref())
                .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                .filter(|d| *d >= today)
                .min(),
            Err(e) => {
                debug!(ticker, error = %e, "earnings calendar unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl MarketDataProvider for FinnhubClient {
    fn name(&self) -> &str {
        "finnhub"
    }

    async fn get_price_history(
        &self,
        ticker: &str,
        lookback_days: u32,
    ) -> Result<PriceSeries, ScanError> {
        let to = Local::now().timestamp();
        let from = to - config::calendar_days_for(lookback_days) * 86_400;
        let url = config::finnhub_candle_url(ticker, from, to, &self.api_key);

        let candles: CandleResponse = self.fetch_json(&url).await?;
        candles_to_series(ticker, candles, lookback_days as usize)
    }

    async fn get_option_chain(&self, ticker: &str, _max_dte: i64) -> Result<OptionChain, ScanError> {
        // DTE filtering happens in the scanner against the evaluation date
        let url = config::finnhub_option_chain_url(ticker, &self.api_key);
        let response: OptionChainResponse = self.fetch_json(&url).await?;
        Ok(chain_from_response(ticker, response))
    }

    async fn get_fundamentals(&self, ticker: &str) -> Result<Fundamentals, ScanError> {
        let profile: ProfileResponse = self
            .fetch_json(&config::finnhub_profile_url(ticker, &self.api_key))
            .await?;
        let metrics: MetricResponse = self
            .fetch_json(&config::finnhub_metric_url(ticker, &self.api_key))
            .await?;

        if profile.industry.is_none() && metrics.metric.is_empty() {
            return Err(ScanError::NotFound(format!("no profile or metrics for {}", ticker)));
        }

        let mut fundamentals = fundamentals_from_responses(profile, metrics);
        fundamentals.earnings_date = self.fetch_earnings_date(ticker).await;
        Ok(fundamentals)
    }
}

// -----------------------------------------------
// RESPONSE MAPPING
// -----------------------------------------------

fn candles_to_series(
    ticker: &str,
    candles: CandleResponse,
    keep_last: usize,
) -> Result<PriceSeries, ScanError> {
    if candles.status != "ok" {
        return Err(ScanError::NotFound(format!(
            "no candles for {} (status '{}')",
            ticker, candles.status
        )));
    }
    if candles.closes.len() != candles.timestamps.len() {
        return Err(ScanError::Provider(format!(
            "candle arrays for {} have mismatched lengths",
            ticker
        )));
    }

    let bars: Vec<PriceBar> = candles
        .timestamps
        .iter()
        .zip(candles.closes.iter())
        .enumerate()
        .filter_map(|(i, (&ts, &close))| {
            let date = DateTime::from_timestamp(ts, 0)?.date_naive();
            Some(PriceBar {
                date,
                close,
                volume: candles.volumes.get(i).copied().unwrap_or(0.0),
            })
        })
        .collect();

    let mut series = PriceSeries::new(bars);
    if keep_last > 0 && series.bars.len() > keep_last {
        let drop = series.bars.len() - keep_last;
        series.bars.drain(..drop);
    }
    Ok(series)
}

fn chain_from_response(ticker: &str, response: OptionChainResponse) -> OptionChain {
    let mut expirations = Vec::new();

    for entry in response.data {
        let Some(expiration) = entry
            .expiration_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            warn!(ticker, "dropping expiration with unparseable date");
            continue;
        };
        let side_quotes = |key: &str, side: OptionSide| -> Vec<OptionQuote> {
            entry
                .options
                .get(key)
                .map(|contracts| {
                    contracts
                        .iter()
                        .filter_map(|c| {
                            Some(OptionQuote {
                                strike: c.strike?,
                                bid: c.bid,
                                ask: c.ask,
                                expiration,
                                side,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default()
        };

        expirations.push(OptionExpiration {
            expiration,
            calls: side_quotes("CALL", OptionSide::Call),
            puts: side_quotes("PUT", OptionSide::Put),
        });
    }

    OptionChain {
        ticker: ticker.to_string(),
        expirations,
    }
}

fn metric_f64(metrics: &HashMap<String, serde_json::Value>, key: &str) -> Option<f64> {
    metrics.get(key).and_then(|v| v.as_f64()).filter(|v| v.is_finite())
}

fn fundamentals_from_responses(profile: ProfileResponse, metrics: MetricResponse) -> Fundamentals {
    let m = &metrics.metric;
    Fundamentals {
        implied_volatility: metric_f64(m, "impliedVolatility"),
        // reported in percent
        dividend_yield: metric_f64(m, "dividendYieldIndicatedAnnual").map(|v| v / 100.0),
        sector: profile.industry.filter(|s| !s.is_empty()),
        market_cap: profile.market_cap,
        // reported in millions of shares
        avg_volume: metric_f64(m, "10DayAverageTradingVolume").map(|v| v * 1_000_000.0),
        earnings_date: None,
    }
}

// -----------------------------------------------
// HTTP CLIENT BUILDER
// -----------------------------------------------
fn build_client() -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

    Client::builder()
        .default_headers(headers)
        .user_agent(config::USER_AGENT)
        .timeout(config::HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candles_to_series_keeps_tail() {
        let candles: CandleResponse = serde_json::from_str(
            r#"{"s":"ok","c":[10.0,11.0,12.0],"v":[100,200,300],"t":[1717372800,1717459200,1717545600]}"#,
        )
        .unwrap();
        let series = candles_to_series("XYZ", candles, 2).unwrap();
        assert_eq!(series.closes(), vec![11.0, 12.0]);
        assert_eq!(series.average_volume(), Some(250.0));
    }

    #[test]
    fn test_no_data_candles_are_not_found() {
        let candles: CandleResponse = serde_json::from_str(r#"{"s":"no_data"}"#).unwrap();
        assert!(matches!(
            candles_to_series("XYZ", candles, 90),
            Err(ScanError::NotFound(_))
        ));
    }

    #[test]
    fn test_chain_mapping_keeps_missing_quotes() {
        let response: OptionChainResponse = serde_json::from_str(
            r#"{"code":"XYZ","data":[
                {"expirationDate":"2025-06-06","options":{
                    "CALL":[{"strike":105,"bid":1.2,"ask":1.3}],
                    "PUT":[{"strike":95,"bid":null,"ask":0.8}]}},
                {"expirationDate":"2025-09-19","options":{"CALL":[],"PUT":[]}},
                {"expirationDate":"bogus","options":{}}
            ]}"#,
        )
        .unwrap();
        let chain = chain_from_response("XYZ", response);

        // Far expirations are kept; only the unparseable date is dropped
        assert_eq!(chain.expirations.len(), 2);
        assert_eq!(chain.expirations[1].expiration, NaiveDate::from_ymd_opt(2025, 9, 19).unwrap());
        let exp = &chain.expirations[0];
        assert_eq!(exp.calls.len(), 1);
        assert_eq!(exp.puts[0].bid, None);
        assert!(!exp.puts[0].is_well_formed());
    }

    #[test]
    fn test_fundamentals_normalization() {
        let metrics: MetricResponse = serde_json::from_str(
            r#"{"metric":{"dividendYieldIndicatedAnnual":1.5,"10DayAverageTradingVolume":2.5}}"#,
        )
        .unwrap();
        let profile = ProfileResponse {
            industry: Some("Semiconductors".to_string()),
            market_cap: Some(1200.0),
        };
        let f = fundamentals_from_responses(profile, metrics);
        assert_eq!(f.implied_volatility, None);
        assert_eq!(f.dividend_yield, Some(0.015));
        assert_eq!(f.avg_volume, Some(2_500_000.0));
        assert_eq!(f.sector.as_deref(), Some("Semiconductors"));
    }
}
