//! Strategy evaluation engine.
//!
//! Pure, synchronous rules that turn one ticker's market data into breakout,
//! covered-call and put-credit-spread signals, plus the watchlist aggregator
//! that drives them through a [`crate::provider::MarketDataProvider`].

pub mod aggregator;
pub mod config;
pub mod indicators;
pub mod models;
pub mod processor;
pub mod rules;

pub use aggregator::{aggregate, collect_outcomes, complete_ticker, evaluate_ticker, screen_ticker, ScreenedTicker, TickerOutcome};
pub use config::{BreakoutWindow, OtmPop, PriceBucket, ScanConfig};
pub use indicators::{calculate_breakout, calculate_rsi, compute_indicators};
pub use processor::{
    eligible_expirations, estimate_pop, evaluate_spread_pair,
    find_covered_call, find_put_credit_spreads,
};
pub use rules::{
    evaluate_covered_call_potential, evaluate_put_credit_spread_risk, is_eligible,
    passes_global_filters, rsi_in_band,
};
