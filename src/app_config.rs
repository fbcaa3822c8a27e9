use crate::provider::ProviderKind;
use crate::watchlist;
use anyhow::{bail, Result};
use colored::Colorize;
use std::path::PathBuf;

// -----------------------------------------------
// PROCESS DEFAULTS
// -----------------------------------------------
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_WATCHLIST_FILE: &str = "default_stock_list.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "scan_output";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_FIXTURES_DIR: &str = "fixtures";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Batch,
    Server,
}

impl RunMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "batch" => Some(RunMode::Batch),
            "server" => Some(RunMode::Server),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Batch => "batch",
            RunMode::Server => "server",
        }
    }
}

/// Application configuration handler
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub mode: RunMode,
    pub port: u16,
    pub provider: ProviderKind,
    /// Explicit tickers from `SCANNER_WATCHLIST`; empty means use the watchlist file
    pub watchlist: Vec<String>,
    pub watchlist_file: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: String,
}

impl AppConfig {
    /// Create new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads values through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode_value = lookup("SCANNER_MODE").unwrap_or_else(|| "batch".to_string());
        let Some(mode) = RunMode::parse(&mode_value) else {
            bail!("Invalid SCANNER_MODE '{}'. Use 'batch' or 'server'", mode_value);
        };

        let port = match lookup("SCANNER_PORT") {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("Invalid SCANNER_PORT '{}'", v))?,
            None => DEFAULT_PORT,
        };

        let provider_name = lookup("SCANNER_PROVIDER").unwrap_or_else(|| "finnhub".to_string());
        let provider = match provider_name.trim().to_lowercase().as_str() {
            "finnhub" => {
                let api_key = lookup("FINNHUB_API_KEY").unwrap_or_default();
                if api_key.trim().is_empty() {
                    bail!("FINNHUB_API_KEY must be set when SCANNER_PROVIDER=finnhub");
                }
                ProviderKind::Finnhub { api_key }
            }
            "fixtures" => ProviderKind::Fixtures {
                dir: lookup("SCANNER_FIXTURES_DIR")
                    .unwrap_or_else(|| DEFAULT_FIXTURES_DIR.to_string())
                    .into(),
            },
            other => bail!("Invalid SCANNER_PROVIDER '{}'. Use 'finnhub' or 'fixtures'", other),
        };

        Ok(Self {
            mode,
            port,
            provider,
            watchlist: lookup("SCANNER_WATCHLIST")
                .map(|v| watchlist::parse_watchlist(&v))
                .unwrap_or_default(),
            watchlist_file: lookup("SCANNER_WATCHLIST_FILE")
                .unwrap_or_else(|| DEFAULT_WATCHLIST_FILE.to_string())
                .into(),
            output_dir: lookup("SCANNER_OUTPUT_DIR")
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string())
                .into(),
            log_dir: lookup("SCANNER_LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
        })
    }

    /// Tickers for a batch run: the explicit list, else the watchlist file
    pub fn resolve_watchlist(&self) -> Vec<String> {
        if self.watchlist.is_empty() {
            watchlist::load_default_tickers(&self.watchlist_file)
        } else {
            self.watchlist.clone()
        }
    }

    /// Print the effective configuration
    pub fn log_config(&self) {
        let provider = match &self.provider {
            ProviderKind::Finnhub { .. } => "finnhub".to_string(),
            ProviderKind::Fixtures { dir } => format!("fixtures ({})", dir.display()),
        };
        println!("{} Mode: {}", "→".cyan(), self.mode.as_str().yellow());
        println!("{} Provider: {}", "→".cyan(), provider.yellow());
        if self.mode == RunMode::Server {
            println!("{} Port: {}", "→".cyan(), self.port.to_string().yellow());
        }
        println!();
    }
}
