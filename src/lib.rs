pub mod alerts;
pub mod api_server_axum;
pub mod app_config;
pub mod error;
pub mod export;
pub mod logging;
pub mod provider;
pub mod scan_commands;
pub mod scanner;
pub mod watchlist;

// Re-exports for convenience
pub use error::ScanError;
pub use provider::{FinnhubClient, FixtureProvider, MarketDataProvider, ProviderKind};
pub use scanner::models::{
    BreakoutSignal, CoveredCallCandidate, Fundamentals, MarketSnapshot, OptionChain,
    OptionExpiration, OptionQuote, OptionSide, PriceBar, PriceSeries, PutCreditSpreadCandidate,
    RsiValue, ScanReport, ScanResult, TickerFailure,
};
pub use scanner::{aggregate, ScanConfig};
