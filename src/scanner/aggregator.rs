use super::config::ScanConfig;
use super::indicators::compute_indicators;
use super::models::{
    BreakoutSignal, Eligibility, Fundamentals, Indicators, MarketSnapshot, OptionChain,
    PriceSeries, ScanReport, ScanResult, TickerFailure,
};
use super::processor::{find_covered_call, find_put_credit_spreads};
use super::rules::{is_eligible, passes_global_filters};
use crate::error::ScanError;
use crate::provider::MarketDataProvider;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// A ticker that cleared the global filters and still needs its chain searched
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenedTicker {
    pub snapshot: MarketSnapshot,
    pub indicators: Indicators,
    pub eligibility: Eligibility,
}

/// What happened to one ticker during a scan
#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    Evaluated(Box<ScanResult>),
    FilteredOut,
    Failed(TickerFailure),
}

impl TickerOutcome {
    fn failed(ticker: &str, err: &ScanError) -> Self {
        TickerOutcome::Failed(TickerFailure {
            ticker: ticker.to_string(),
            kind: err.kind().to_string(),
            reason: err.to_string(),
        })
    }
}

// -----------------------------------------------
// PURE EVALUATION
// -----------------------------------------------

/// Indicators, snapshot and filters for one ticker.
///
/// `Ok(None)` means the data was fine but the ticker failed the global filters.
pub fn screen_ticker(
    ticker: &str,
    history: &PriceSeries,
    fundamentals: Fundamentals,
    config: &ScanConfig,
) -> Result<Option<ScreenedTicker>, ScanError> {
    let indicators = compute_indicators(history, config.breakout_window)?;
    let last_price = history
        .last_close()
        .ok_or_else(|| ScanError::InsufficientData("price series is empty".to_string()))?;

    let mut snapshot = MarketSnapshot::from_parts(ticker, last_price, fundamentals);
    if snapshot.avg_volume.is_none() {
        snapshot.avg_volume = history.average_volume().filter(|v| *v > 0.0);
    }

    if !passes_global_filters(&snapshot, indicators.rsi, config) {
        return Ok(None);
    }

    let eligibility = is_eligible(&snapshot, indicators.rsi, config);
    Ok(Some(ScreenedTicker {
        snapshot,
        indicators,
        eligibility,
    }))
}

/// Search the chain for the strategies the ticker is eligible for
pub fn complete_ticker(
    screened: ScreenedTicker,
    chain: Option<&OptionChain>,
    config: &ScanConfig,
) -> ScanResult {
    let price = screened.snapshot.last_price;

    let covered_call = match chain {
        Some(chain) if screened.eligibility.covered_call => find_covered_call(
            chain,
            price,
            config.max_dte,
            config.min_premium_pct,
            config.evaluation_date,
            config.holding_days,
        ),
        _ => None,
    };

    let put_spreads = match chain {
        Some(chain) if screened.eligibility.put_spread => find_put_credit_spreads(
            chain,
            price,
            config.max_dte,
            config.min_pop,
            config.otm_pop,
            config.evaluation_date,
        ),
        _ => Vec::new(),
    };

    ScanResult {
        snapshot: screened.snapshot,
        rsi: screened.indicators.rsi,
        breakout_high: screened.indicators.breakout_high,
        is_breakout: screened.indicators.is_breakout,
        eligibility: screened.eligibility,
        covered_call,
        put_spreads,
    }
}

// -----------------------------------------------
// PROVIDER-BACKED EVALUATION
// -----------------------------------------------

/// Fetch and evaluate one ticker. Any fetch failure skips the ticker entirely.
pub async fn evaluate_ticker(
    provider: &dyn MarketDataProvider,
    ticker: &str,
    config: &ScanConfig,
) -> TickerOutcome {
    let history = match provider.get_price_history(ticker, config.lookback_days).await {
        Ok(history) => history,
        Err(e) => return TickerOutcome::failed(ticker, &e),
    };
    let fundamentals = match provider.get_fundamentals(ticker).await {
        Ok(fundamentals) => fundamentals,
        Err(e) => return TickerOutcome::failed(ticker, &e),
    };

    let screened = match screen_ticker(ticker, &history, fundamentals, config) {
        Ok(Some(screened)) => screened,
        Ok(None) => return TickerOutcome::FilteredOut,
        Err(e) => return TickerOutcome::failed(ticker, &e),
    };

    // Only pay for the chain when a strategy could use it
    let chain = if screened.eligibility.any() {
        match provider.get_option_chain(ticker, config.max_dte).await {
            Ok(chain) => Some(chain),
            Err(e) => return TickerOutcome::failed(ticker, &e),
        }
    } else {
        None
    };

    TickerOutcome::Evaluated(Box::new(complete_ticker(screened, chain.as_ref(), config)))
}

/// Merge per-ticker outcomes, in watchlist order, into the three collections
pub fn collect_outcomes(
    tickers: &[String],
    outcomes: Vec<TickerOutcome>,
    config: &ScanConfig,
) -> ScanReport {
    let mut report = ScanReport::empty(config.evaluation_date);
    report.tickers_requested = tickers.len();

    for outcome in outcomes {
        match outcome {
            TickerOutcome::Evaluated(result) => {
                if result.is_breakout {
                    report.breakouts.push(BreakoutSignal {
                        ticker: result.snapshot.ticker.clone(),
                        price: result.snapshot.last_price,
                        breakout_high: result.breakout_high,
                        window_days: config.breakout_window.days(),
                        rsi: result.rsi.value(),
                        implied_volatility: result.snapshot.implied_volatility,
                        avg_volume: result.snapshot.avg_volume,
                        sector: result.snapshot.sector.clone(),
                    });
                }
                if let Some(call) = &result.covered_call {
                    report.covered_calls.push(call.clone());
                }
                report.put_spreads.extend(result.put_spreads.iter().cloned());
                report.results.push(*result);
            }
            TickerOutcome::FilteredOut => report.tickers_filtered_out += 1,
            TickerOutcome::Failed(failure) => report.failures.push(failure),
        }
    }

    report
}

// -----------------------------------------------
// WATCHLIST SCAN
// -----------------------------------------------

/// Scan a whole watchlist with at most `config.max_concurrent` tickers in flight.
///
/// Only an invalid configuration aborts the scan; per-ticker failures are
/// reported in `ScanReport::failures`.
pub async fn aggregate(
    provider: Arc<dyn MarketDataProvider>,
    tickers: &[String],
    config: &ScanConfig,
) -> Result<ScanReport, ScanError> {
    config.validate()?;

    info!(
        provider = provider.name(),
        tickers = tickers.len(),
        evaluation_date = %config.evaluation_date,
        "starting scan"
    );

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent));
    let shared_config = Arc::new(config.clone());
    let mut handles = Vec::with_capacity(tickers.len());

    for ticker in tickers {
        let provider = Arc::clone(&provider);
        let sem = Arc::clone(&semaphore);
        let cfg = Arc::clone(&shared_config);
        let ticker = ticker.clone();

        handles.push(tokio::spawn(async move {
            let _permit = match sem.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    return TickerOutcome::failed(
                        &ticker,
                        &ScanError::Provider(format!("Semaphore error: {}", e)),
                    );
                }
            };
            evaluate_ticker(provider.as_ref(), &ticker, &cfg).await
        }));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (ticker, handle) in tickers.iter().zip(handles) {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => TickerOutcome::failed(ticker, &ScanError::Provider(format!("Task error: {}", e))),
        };
        if let TickerOutcome::Failed(failure) = &outcome {
            warn!(ticker = %failure.ticker, kind = %failure.kind, "skipping ticker: {}", failure.reason);
        }
        outcomes.push(outcome);
    }

    let report = collect_outcomes(tickers, outcomes, config);
    info!(
        evaluated = report.results.len(),
        filtered_out = report.tickers_filtered_out,
        failed = report.failures.len(),
        breakouts = report.breakouts.len(),
        covered_calls = report.covered_calls.len(),
        put_spreads = report.put_spreads.len(),
        "scan complete"
    );

    Ok(report)
}
