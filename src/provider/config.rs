use std::time::Duration;

// -----------------------------------------------
// FINNHUB API ENDPOINTS
// -----------------------------------------------
pub const FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";

pub fn finnhub_candle_url(symbol: &str, from: i64, to: i64, token: &str) -> String {
    format!(
        "{}/stock/candle?symbol={}&resolution=D&from={}&to={}&token={}",
        FINNHUB_BASE_URL,
        urlencoding::encode(symbol),
        from,
        to,
        urlencoding::encode(token)
    )
}

pub fn finnhub_option_chain_url(symbol: &str, token: &str) -> String {
    format!(
        "{}/stock/option-chain?symbol={}&token={}",
        FINNHUB_BASE_URL,
        urlencoding::encode(symbol),
        urlencoding::encode(token)
    )
}

pub fn finnhub_profile_url(symbol: &str, token: &str) -> String {
    format!(
        "{}/stock/profile2?symbol={}&token={}",
        FINNHUB_BASE_URL,
        urlencoding::encode(symbol),
        urlencoding::encode(token)
    )
}

pub fn finnhub_metric_url(symbol: &str, token: &str) -> String {
    format!(
        "{}/stock/metric?symbol={}&metric=all&token={}",
        FINNHUB_BASE_URL,
        urlencoding::encode(symbol),
        urlencoding::encode(token)
    )
}

pub fn finnhub_earnings_url(symbol: &str, from: &str, to: &str, token: &str) -> String {
    format!(
        "{}/calendar/earnings?symbol={}&from={}&to={}&token={}",
        FINNHUB_BASE_URL,
        urlencoding::encode(symbol),
        from,
        to,
        urlencoding::encode(token)
    )
}

// -----------------------------------------------
// HTTP CLIENT CONFIG
// -----------------------------------------------
pub const USER_AGENT: &str = concat!("options-scanner/", env!("CARGO_PKG_VERSION"));
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

// -----------------------------------------------
// RETRY CONFIG
// -----------------------------------------------
pub const RETRY_BASE_DELAY_MS: u64 = 250;
pub const RETRY_FACTOR: u64 = 2;
pub const RETRY_MAX_DELAY_SECS: u64 = 5;
pub const RETRY_MAX_ATTEMPTS: usize = 3;

// -----------------------------------------------
// DATA WINDOWS
// -----------------------------------------------
/// Days ahead searched for the next earnings report
pub const EARNINGS_HORIZON_DAYS: i64 = 90;

/// Calendar days requested to cover `lookback` trading sessions
pub fn calendar_days_for(lookback: u32) -> i64 {
    lookback as i64 * 7 / 5 + 7
}
