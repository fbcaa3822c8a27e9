use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

// -----------------------------------------------
// WATCHLIST LIMITS
// -----------------------------------------------
pub const MAX_TICKERS: usize = 300;

pub const FALLBACK_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "TSLA", "AMZN", "NVDA", "AMD", "GOOGL", "META", "NFLX", "INTC",
];

/// Split a comma or newline separated list into upper-case tickers.
/// Duplicates keep their first position; the result is capped at 300.
pub fn parse_watchlist(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split([',', '\n', '\r'])
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .take(MAX_TICKERS)
        .collect()
}

/// Read the `Ticker` column of a CSV file
pub fn read_ticker_file(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open watchlist file: {}", path.display()))?;

    let column = reader
        .headers()?
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("ticker"))
        .with_context(|| format!("No 'Ticker' column in {}", path.display()))?;

    let mut tickers = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(value) = record.get(column) {
            tickers.push(value.to_string());
        }
    }

    Ok(parse_watchlist(&tickers.join(",")))
}

/// Default watchlist: the CSV file if readable and non-empty, otherwise the built-in list
pub fn load_default_tickers(path: &Path) -> Vec<String> {
    match read_ticker_file(path) {
        Ok(tickers) if !tickers.is_empty() => tickers,
        Ok(_) => {
            warn!(path = %path.display(), "watchlist file has no tickers, using fallback list");
            fallback_tickers()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "using fallback watchlist");
            fallback_tickers()
        }
    }
}

pub fn fallback_tickers() -> Vec<String> {
    FALLBACK_TICKERS.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_watchlist() {
        let tickers = parse_watchlist(" aapl, msft ,,TSLA\nnvda, AAPL ");
        assert_eq!(tickers, vec!["AAPL", "MSFT", "TSLA", "NVDA"]);
    }

    #[test]
    fn test_parse_watchlist_caps_length() {
        let text: Vec<String> = (0..400).map(|i| format!("T{}", i)).collect();
        assert_eq!(parse_watchlist(&text.join(",")).len(), MAX_TICKERS);
    }

    #[test]
    fn test_load_default_tickers_from_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Ticker,Name").unwrap();
        writeln!(file, "amd,Advanced Micro Devices").unwrap();
        writeln!(file, "PLTR,Palantir").unwrap();

        assert_eq!(load_default_tickers(file.path()), vec!["AMD", "PLTR"]);
    }

    #[test]
    fn test_load_default_tickers_fallback() {
        let tickers = load_default_tickers(Path::new("/definitely/not/here.csv"));
        assert_eq!(tickers.len(), FALLBACK_TICKERS.len());
        assert_eq!(tickers[0], "AAPL");
    }
}
