use crate::error::ScanError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// -----------------------------------------------
// STRATEGY THRESHOLDS
// -----------------------------------------------
pub const RSI_PERIOD: usize = 14;
pub const BREAKOUT_PROXIMITY: f64 = 0.98;
pub const COVERED_CALL_MIN_IV: f64 = 0.40;
pub const PUT_SPREAD_MIN_IV: f64 = 0.30;
pub const MIN_CREDIT_TO_WIDTH: f64 = 0.33;
pub const ITM_SPREAD_POP: f64 = 0.50;
/// Slack for inclusive thresholds on values derived from cent quotes
pub const THRESHOLD_EPSILON: f64 = 1e-9;

// -----------------------------------------------
// DEFAULTS
// -----------------------------------------------
pub const DEFAULT_RSI_MIN: f64 = 40.0;
pub const DEFAULT_RSI_MAX: f64 = 60.0;
pub const DEFAULT_IV_MIN_PERCENT: f64 = 30.0;
pub const DEFAULT_VOL_MIN: f64 = 1_000_000.0;
pub const DEFAULT_MAX_DTE: i64 = 14;
pub const DEFAULT_MIN_PREMIUM_PCT: f64 = 1.0;
pub const DEFAULT_MIN_POP: f64 = 0.65;
pub const DEFAULT_HOLDING_DAYS: i64 = 7;
pub const DEFAULT_LOOKBACK_DAYS: u32 = 90;
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

// -----------------------------------------------
// BREAKOUT WINDOW
// -----------------------------------------------

/// Trailing window used for the breakout high. Only 30 and 60 are recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "u32", into = "u32")]
pub enum BreakoutWindow {
    #[default]
    Days30,
    Days60,
}

impl BreakoutWindow {
    pub fn days(self) -> usize {
        match self {
            BreakoutWindow::Days30 => 30,
            BreakoutWindow::Days60 => 60,
        }
    }
}

impl TryFrom<u32> for BreakoutWindow {
    type Error = ScanError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            30 => Ok(BreakoutWindow::Days30),
            60 => Ok(BreakoutWindow::Days60),
            other => Err(ScanError::Configuration(format!(
                "breakout window must be 30 or 60 days, got {}",
                other
            ))),
        }
    }
}

impl From<BreakoutWindow> for u32 {
    fn from(window: BreakoutWindow) -> Self {
        window.days() as u32
    }
}

// -----------------------------------------------
// PRICE BUCKET
// -----------------------------------------------

/// Mutually exclusive last-price ranges. Lower bound inclusive, upper exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceBucket {
    #[serde(rename = "under_10")]
    Under10,
    #[serde(rename = "10_to_50")]
    From10To50,
    #[serde(rename = "50_to_150")]
    From50To150,
    #[serde(rename = "150_plus")]
    Over150,
}

impl PriceBucket {
    pub fn contains(self, price: f64) -> bool {
        match self {
            PriceBucket::Under10 => price < 10.0,
            PriceBucket::From10To50 => (10.0..50.0).contains(&price),
            PriceBucket::From50To150 => (50.0..150.0).contains(&price),
            PriceBucket::Over150 => price >= 150.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceBucket::Under10 => "<$10",
            PriceBucket::From10To50 => "$10-$50",
            PriceBucket::From50To150 => "$50-$150",
            PriceBucket::Over150 => "$150+",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ScanError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "under_10" | "<$10" | "<10" => Ok(PriceBucket::Under10),
            "10_to_50" | "$10-$50" | "10-50" => Ok(PriceBucket::From10To50),
            "50_to_150" | "$50-$150" | "50-150" => Ok(PriceBucket::From50To150),
            "150_plus" | "$150+" | "150+" => Ok(PriceBucket::Over150),
            other => Err(ScanError::Configuration(format!(
                "unknown price bucket '{}'",
                other
            ))),
        }
    }
}

// -----------------------------------------------
// OUT-OF-THE-MONEY POP HEURISTIC
// -----------------------------------------------

/// Probability of profit assigned to a spread whose short strike sits below spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "f64", into = "f64")]
pub enum OtmPop {
    #[default]
    Seventy,
    SeventyFive,
}

impl OtmPop {
    pub fn value(self) -> f64 {
        match self {
            OtmPop::Seventy => 0.70,
            OtmPop::SeventyFive => 0.75,
        }
    }
}

impl TryFrom<f64> for OtmPop {
    type Error = ScanError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if (value - 0.70).abs() < 1e-9 {
            Ok(OtmPop::Seventy)
        } else if (value - 0.75).abs() < 1e-9 {
            Ok(OtmPop::SeventyFive)
        } else {
            Err(ScanError::Configuration(format!(
                "out-of-the-money POP must be 0.70 or 0.75, got {}",
                value
            )))
        }
    }
}

impl From<OtmPop> for f64 {
    fn from(pop: OtmPop) -> Self {
        pop.value()
    }
}

// -----------------------------------------------
// SCAN CONFIG
// -----------------------------------------------

/// Thresholds for one scan. Passed explicitly to every evaluation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub rsi_min: f64,
    pub rsi_max: f64,
    pub iv_min_percent: f64,
    pub vol_min: f64,
    pub breakout_window: BreakoutWindow,
    pub price_bucket: Option<PriceBucket>,
    pub max_dte: i64,
    pub min_premium_pct: f64,
    pub min_pop: f64,
    pub otm_pop: OtmPop,
    pub holding_days: i64,
    pub lookback_days: u32,
    pub max_concurrent: usize,
    /// Reference date for DTE and entry/exit dates. Never read from the clock by the core.
    pub evaluation_date: NaiveDate,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            rsi_min: DEFAULT_RSI_MIN,
            rsi_max: DEFAULT_RSI_MAX,
            iv_min_percent: DEFAULT_IV_MIN_PERCENT,
            vol_min: DEFAULT_VOL_MIN,
            breakout_window: BreakoutWindow::default(),
            price_bucket: None,
            max_dte: DEFAULT_MAX_DTE,
            min_premium_pct: DEFAULT_MIN_PREMIUM_PCT,
            min_pop: DEFAULT_MIN_POP,
            otm_pop: OtmPop::default(),
            holding_days: DEFAULT_HOLDING_DAYS,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            evaluation_date: NaiveDate::default(),
        }
    }
}

impl ScanConfig {
    /// Defaults pinned to a given evaluation date
    pub fn for_date(evaluation_date: NaiveDate) -> Self {
        Self {
            evaluation_date,
            ..Self::default()
        }
    }

    /// Reject threshold combinations before any ticker is evaluated
    pub fn validate(&self) -> Result<(), ScanError> {
        let in_rsi_range = |v: f64| (0.0..=100.0).contains(&v);

        if !in_rsi_range(self.rsi_min) || !in_rsi_range(self.rsi_max) {
            return Err(ScanError::Configuration(format!(
                "RSI bounds must lie in [0, 100], got [{}, {}]",
                self.rsi_min, self.rsi_max
            )));
        }
        if self.rsi_min > self.rsi_max {
            return Err(ScanError::Configuration(format!(
                "rsi_min ({}) is greater than rsi_max ({})",
                self.rsi_min, self.rsi_max
            )));
        }
        if !(self.iv_min_percent >= 0.0) {
            return Err(ScanError::Configuration(format!(
                "iv_min_percent must be >= 0, got {}",
                self.iv_min_percent
            )));
        }
        if !(self.vol_min >= 0.0) {
            return Err(ScanError::Configuration(format!(
                "vol_min must be >= 0, got {}",
                self.vol_min
            )));
        }
        if !(self.min_premium_pct >= 0.0) {
            return Err(ScanError::Configuration(format!(
                "min_premium_pct must be >= 0, got {}",
                self.min_premium_pct
            )));
        }
        if !(0.0..=1.0).contains(&self.min_pop) {
            return Err(ScanError::Configuration(format!(
                "min_pop must lie in [0, 1], got {}",
                self.min_pop
            )));
        }
        if self.max_dte < 0 {
            return Err(ScanError::Configuration(format!(
                "max_dte must be >= 0, got {}",
                self.max_dte
            )));
        }
        if self.holding_days < 1 {
            return Err(ScanError::Configuration(format!(
                "holding_days must be >= 1, got {}",
                self.holding_days
            )));
        }
        if self.lookback_days < 1 {
            return Err(ScanError::Configuration(
                "lookback_days must be >= 1".to_string(),
            ));
        }
        if self.max_concurrent < 1 {
            return Err(ScanError::Configuration(
                "max_concurrent must be >= 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Overlay `SCANNER_*` environment variables on the defaults
    pub fn from_env(evaluation_date: NaiveDate) -> Result<Self, ScanError> {
        Self::from_lookup(evaluation_date, |key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads values through `lookup`
    pub fn from_lookup<F>(evaluation_date: NaiveDate, lookup: F) -> Result<Self, ScanError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::for_date(evaluation_date);

        if let Some(v) = lookup("SCANNER_RSI_MIN") {
            config.rsi_min = parse_var("SCANNER_RSI_MIN", &v)?;
        }
        if let Some(v) = lookup("SCANNER_RSI_MAX") {
            config.rsi_max = parse_var("SCANNER_RSI_MAX", &v)?;
        }
        if let Some(v) = lookup("SCANNER_IV_MIN") {
            config.iv_min_percent = parse_var("SCANNER_IV_MIN", &v)?;
        }
        if let Some(v) = lookup("SCANNER_VOL_MIN") {
            config.vol_min = parse_var("SCANNER_VOL_MIN", &v)?;
        }
        if let Some(v) = lookup("SCANNER_BREAKOUT_DAYS") {
            config.breakout_window = BreakoutWindow::try_from(parse_var::<u32>("SCANNER_BREAKOUT_DAYS", &v)?)?;
        }
        if let Some(v) = lookup("SCANNER_PRICE_BUCKET") {
            config.price_bucket = if v.trim().is_empty() || v.eq_ignore_ascii_case("all") {
                None
            } else {
                Some(PriceBucket::parse(&v)?)
            };
        }
        if let Some(v) = lookup("SCANNER_MAX_DTE") {
            config.max_dte = parse_var("SCANNER_MAX_DTE", &v)?;
        }
        if let Some(v) = lookup("SCANNER_MIN_PREMIUM_PCT") {
            config.min_premium_pct = parse_var("SCANNER_MIN_PREMIUM_PCT", &v)?;
        }
        if let Some(v) = lookup("SCANNER_MIN_POP") {
            config.min_pop = parse_var("SCANNER_MIN_POP", &v)?;
        }
        if let Some(v) = lookup("SCANNER_OTM_POP") {
            config.otm_pop = OtmPop::try_from(parse_var::<f64>("SCANNER_OTM_POP", &v)?)?;
        }
        if let Some(v) = lookup("SCANNER_HOLDING_DAYS") {
            config.holding_days = parse_var("SCANNER_HOLDING_DAYS", &v)?;
        }
        if let Some(v) = lookup("SCANNER_MAX_CONCURRENT") {
            config.max_concurrent = parse_var("SCANNER_MAX_CONCURRENT", &v)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ScanError> {
    value.trim().parse::<T>().map_err(|_| {
        ScanError::Configuration(format!("{} has an invalid value '{}'", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ScanConfig::for_date(date()).validate().is_ok());
    }

    #[test]
    fn test_inverted_rsi_band_rejected() {
        let config = ScanConfig {
            rsi_min: 70.0,
            rsi_max: 30.0,
            ..ScanConfig::for_date(date())
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ScanError::Configuration(_)));
        assert!(!err.is_skippable());
    }

    #[test]
    fn test_price_bucket_boundaries() {
        assert!(PriceBucket::Under10.contains(9.99));
        assert!(!PriceBucket::Under10.contains(10.0));
        assert!(PriceBucket::From10To50.contains(10.0));
        assert!(!PriceBucket::From10To50.contains(50.0));
        assert!(PriceBucket::From50To150.contains(50.0));
        assert!(PriceBucket::Over150.contains(150.0));
    }

    #[test]
    fn test_breakout_window_only_accepts_30_or_60() {
        assert_eq!(BreakoutWindow::try_from(60).unwrap(), BreakoutWindow::Days60);
        assert!(BreakoutWindow::try_from(45).is_err());
    }

    #[test]
    fn test_from_lookup_overlays_values() {
        let vars: HashMap<&str, &str> = [
            ("SCANNER_RSI_MIN", "30"),
            ("SCANNER_BREAKOUT_DAYS", "60"),
            ("SCANNER_PRICE_BUCKET", "10_to_50"),
            ("SCANNER_OTM_POP", "0.75"),
        ]
        .into_iter()
        .collect();

        let config =
            ScanConfig::from_lookup(date(), |k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.rsi_min, 30.0);
        assert_eq!(config.breakout_window, BreakoutWindow::Days60);
        assert_eq!(config.price_bucket, Some(PriceBucket::From10To50));
        assert_eq!(config.otm_pop.value(), 0.75);
        assert_eq!(config.evaluation_date, date());
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let result = ScanConfig::from_lookup(date(), |k| {
            (k == "SCANNER_VOL_MIN").then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(ScanError::Configuration(_))));
    }

    #[test]
    fn test_config_json_uses_plain_numbers() {
        let config = ScanConfig::for_date(date());
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["breakout_window"], 30);
        assert_eq!(json["otm_pop"], 0.7);

        let parsed: ScanConfig =
            serde_json::from_str(r#"{"rsi_min": 35, "breakout_window": 60, "evaluation_date": "2025-06-02"}"#)
                .unwrap();
        assert_eq!(parsed.rsi_min, 35.0);
        assert_eq!(parsed.breakout_window, BreakoutWindow::Days60);
        assert_eq!(parsed.rsi_max, DEFAULT_RSI_MAX);
    }
}
