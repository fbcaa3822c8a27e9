use thiserror::Error;

/// Errors raised while evaluating a watchlist.
///
/// Everything except `Configuration` is scoped to a single ticker: the scan
/// records it and moves on to the next symbol.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScanError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ScanError {
    /// True when the failure only affects one ticker
    pub fn is_skippable(&self) -> bool {
        !matches!(self, ScanError::Configuration(_))
    }

    /// Short machine-readable label, used in reports and CSV output
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::InsufficientData(_) => "insufficient_data",
            ScanError::NotFound(_) => "not_found",
            ScanError::Provider(_) => "provider_error",
            ScanError::Configuration(_) => "configuration_error",
        }
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        ScanError::Provider(err.to_string())
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::Provider(format!("Parse error: {}", err))
    }
}
