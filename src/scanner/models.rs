use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// -----------------------------------------------
// PRICE HISTORY
// -----------------------------------------------

/// One daily observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: f64,
}

/// Ordered (oldest first) closes and volumes over the lookback window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        Self { bars }
    }

    /// Build a series of consecutive days from bare closes (volume 0)
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Self {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                close,
                volume: 0.0,
            })
            .collect();
        Self { bars }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// Mean volume across the series, `None` when empty
    pub fn average_volume(&self) -> Option<f64> {
        if self.bars.is_empty() {
            return None;
        }
        let total: f64 = self.bars.iter().map(|b| b.volume).sum();
        Some(total / self.bars.len() as f64)
    }
}

// -----------------------------------------------
// FUNDAMENTALS & SNAPSHOT
// -----------------------------------------------

/// Per-ticker fundamentals as reported by a provider. `None` means unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fundamentals {
    /// Fraction, e.g. 0.42 for 42%
    pub implied_volatility: Option<f64>,
    /// Fraction. Zero is a real value, distinct from unavailable.
    pub dividend_yield: Option<f64>,
    pub sector: Option<String>,
    pub market_cap: Option<f64>,
    pub avg_volume: Option<f64>,
    pub earnings_date: Option<NaiveDate>,
}

/// Normalized view of one ticker for a single scan cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: String,
    pub last_price: f64,
    pub avg_volume: Option<f64>,
    pub implied_volatility: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub sector: Option<String>,
    pub market_cap: Option<f64>,
    pub earnings_date: Option<NaiveDate>,
}

impl MarketSnapshot {
    pub fn from_parts(ticker: &str, last_price: f64, fundamentals: Fundamentals) -> Self {
        Self {
            ticker: ticker.to_string(),
            last_price,
            avg_volume: fundamentals.avg_volume,
            implied_volatility: fundamentals.implied_volatility,
            dividend_yield: fundamentals.dividend_yield,
            sector: fundamentals.sector,
            market_cap: fundamentals.market_cap,
            earnings_date: fundamentals.earnings_date,
        }
    }
}

// -----------------------------------------------
// RSI
// -----------------------------------------------

/// RSI reading. `Unavailable` is never coerced to a neutral value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum RsiValue {
    Defined(f64),
    Unavailable,
}

impl RsiValue {
    pub fn value(self) -> Option<f64> {
        match self {
            RsiValue::Defined(v) => Some(v),
            RsiValue::Unavailable => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, RsiValue::Defined(_))
    }
}

/// Output of the technical-indicator calculator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub rsi: RsiValue,
    pub breakout_high: f64,
    pub is_breakout: bool,
}

// -----------------------------------------------
// OPTION CHAIN
// -----------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionSide {
    Call,
    Put,
}

/// A single contract quote. Missing bid/ask marks the quote as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub strike: f64,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub expiration: NaiveDate,
    pub side: OptionSide,
}

impl OptionQuote {
    /// Both sides of the market present and non-negative
    pub fn is_well_formed(&self) -> bool {
        self.strike.is_finite()
            && self.strike > 0.0
            && matches!(self.bid, Some(b) if b.is_finite() && b >= 0.0)
            && matches!(self.ask, Some(a) if a.is_finite() && a >= 0.0)
    }
}

/// Calls and puts for one expiration date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionExpiration {
    pub expiration: NaiveDate,
    #[serde(default)]
    pub calls: Vec<OptionQuote>,
    #[serde(default)]
    pub puts: Vec<OptionQuote>,
}

impl OptionExpiration {
    /// Days to expiration relative to `as_of` (0 on expiry day)
    pub fn days_to_expiry(&self, as_of: NaiveDate) -> i64 {
        (self.expiration - as_of).num_days()
    }
}

/// All quoted expirations for one ticker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionChain {
    pub ticker: String,
    #[serde(default)]
    pub expirations: Vec<OptionExpiration>,
}

// -----------------------------------------------
// CANDIDATES & RESULTS
// -----------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoveredCallCandidate {
    pub ticker: String,
    pub strike: f64,
    pub premium: f64,
    pub dte: i64,
    pub expiration: NaiveDate,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutCreditSpreadCandidate {
    pub ticker: String,
    pub short_strike: f64,
    pub long_strike: f64,
    pub credit: f64,
    pub width: f64,
    pub pop: f64,
    pub dte: i64,
    pub expiration: NaiveDate,
}

/// Row of the breakout collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutSignal {
    pub ticker: String,
    pub price: f64,
    pub breakout_high: f64,
    pub window_days: usize,
    pub rsi: Option<f64>,
    pub implied_volatility: Option<f64>,
    pub avg_volume: Option<f64>,
    pub sector: Option<String>,
}

/// Which strategies a ticker qualifies for before the chain is searched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    pub covered_call: bool,
    pub put_spread: bool,
}

impl Eligibility {
    pub fn any(self) -> bool {
        self.covered_call || self.put_spread
    }
}

/// Everything the scan learned about one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub snapshot: MarketSnapshot,
    pub rsi: RsiValue,
    pub breakout_high: f64,
    pub is_breakout: bool,
    pub eligibility: Eligibility,
    pub covered_call: Option<CoveredCallCandidate>,
    pub put_spreads: Vec<PutCreditSpreadCandidate>,
}

/// A ticker that was skipped, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerFailure {
    pub ticker: String,
    pub kind: String,
    pub reason: String,
}

/// Result set of one watchlist scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub evaluation_date: NaiveDate,
    pub breakouts: Vec<BreakoutSignal>,
    pub covered_calls: Vec<CoveredCallCandidate>,
    pub put_spreads: Vec<PutCreditSpreadCandidate>,
    pub results: Vec<ScanResult>,
    pub failures: Vec<TickerFailure>,
    pub tickers_requested: usize,
    pub tickers_filtered_out: usize,
}

impl ScanReport {
    pub fn empty(evaluation_date: NaiveDate) -> Self {
        Self {
            evaluation_date,
            breakouts: Vec::new(),
            covered_calls: Vec::new(),
            put_spreads: Vec::new(),
            results: Vec::new(),
            failures: Vec::new(),
            tickers_requested: 0,
            tickers_filtered_out: 0,
        }
    }

    pub fn total_signals(&self) -> usize {
        self.breakouts.len() + self.covered_calls.len() + self.put_spreads.len()
    }
}
