use super::MarketDataProvider;
use crate::error::ScanError;
use crate::scanner::models::{Fundamentals, OptionChain, PriceSeries};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk snapshot of everything a provider would return for one ticker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickerFixture {
    #[serde(default)]
    pub history: PriceSeries,
    #[serde(default)]
    pub option_chain: OptionChain,
    #[serde(default)]
    pub fundamentals: Fundamentals,
}

/// Replays `<dir>/<TICKER>.json` files. Used for offline runs and tests.
pub struct FixtureProvider {
    dir: PathBuf,
}

impl FixtureProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write a fixture in the layout `load` expects
    pub fn save(dir: &Path, ticker: &str, fixture: &TickerFixture) -> anyhow::Result<()> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", ticker.to_uppercase()));
        std::fs::write(path, serde_json::to_string_pretty(fixture)?)?;
        Ok(())
    }

    async fn load(&self, ticker: &str) -> Result<TickerFixture, ScanError> {
        let path = self.dir.join(format!("{}.json", ticker.to_uppercase()));
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ScanError::NotFound(format!("no fixture at {}", path.display())));
            }
            Err(e) => {
                return Err(ScanError::Provider(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let mut fixture: TickerFixture = serde_json::from_str(&text)?;
        if fixture.option_chain.ticker.is_empty() {
            fixture.option_chain.ticker = ticker.to_uppercase();
        }
        Ok(fixture)
    }
}

#[async_trait]
impl MarketDataProvider for FixtureProvider {
    fn name(&self) -> &str {
        "fixtures"
    }

    async fn get_price_history(
        &self,
        ticker: &str,
        lookback_days: u32,
    ) -> Result<PriceSeries, ScanError> {
        let mut history = self.load(ticker).await?.history;
        let keep = lookback_days as usize;
        if history.bars.len() > keep {
            let drop = history.bars.len() - keep;
            history.bars.drain(..drop);
        }
        Ok(history)
    }

    async fn get_option_chain(&self, ticker: &str, _max_dte: i64) -> Result<OptionChain, ScanError> {
        // DTE filtering happens in the scanner against the evaluation date
        Ok(self.load(ticker).await?.option_chain)
    }

    async fn get_fundamentals(&self, ticker: &str) -> Result<Fundamentals, ScanError> {
        Ok(self.load(ticker).await?.fundamentals)
    }
}
