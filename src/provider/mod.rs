//! Market data sources behind one interface.
//!
//! The scanner core never talks to an upstream directly; it goes through
//! [`MarketDataProvider`] and the concrete adapter is chosen at startup.

pub mod config;
pub mod finnhub_client;
pub mod fixtures;

use crate::error::ScanError;
use crate::scanner::models::{Fundamentals, OptionChain, PriceSeries};
use async_trait::async_trait;
use std::sync::Arc;

pub use finnhub_client::FinnhubClient;
pub use fixtures::{FixtureProvider, TickerFixture};

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Daily closes and volumes covering roughly `lookback_days`
    async fn get_price_history(
        &self,
        ticker: &str,
        lookback_days: u32,
    ) -> Result<PriceSeries, ScanError>;

    /// Quoted expirations up to `max_dte` days out. May be empty.
    async fn get_option_chain(&self, ticker: &str, max_dte: i64) -> Result<OptionChain, ScanError>;

    async fn get_fundamentals(&self, ticker: &str) -> Result<Fundamentals, ScanError>;
}

/// Which adapter backs a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    Finnhub { api_key: String },
    Fixtures { dir: std::path::PathBuf },
}

/// Build the configured adapter
pub fn build_provider(kind: &ProviderKind) -> anyhow::Result<Arc<dyn MarketDataProvider>> {
    match kind {
        ProviderKind::Finnhub { api_key } => Ok(Arc::new(FinnhubClient::new(api_key)?)),
        ProviderKind::Fixtures { dir } => Ok(Arc::new(FixtureProvider::new(dir.clone()))),
    }
}
