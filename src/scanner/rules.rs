use super::config::{COVERED_CALL_MIN_IV, PUT_SPREAD_MIN_IV, ScanConfig, THRESHOLD_EPSILON};
use super::models::{Eligibility, MarketSnapshot, RsiValue};

// Missing RSI or IV always fails the check that needs it.

/// True when a defined RSI falls inside the configured band
pub fn rsi_in_band(rsi: RsiValue, config: &ScanConfig) -> bool {
    rsi.value()
        .is_some_and(|v| v >= config.rsi_min && v <= config.rsi_max)
}

/// Watchlist-level gate applied before any strategy is considered
pub fn passes_global_filters(snapshot: &MarketSnapshot, rsi: RsiValue, config: &ScanConfig) -> bool {
    // Rule 1: RSI band
    if !rsi_in_band(rsi, config) {
        return false;
    }

    // Rule 2: minimum implied volatility (percent)
    let iv_ok = snapshot
        .implied_volatility
        .is_some_and(|iv| iv * 100.0 + THRESHOLD_EPSILON >= config.iv_min_percent);
    if !iv_ok {
        return false;
    }

    // Rule 3: minimum average volume
    if !snapshot.avg_volume.is_some_and(|v| v >= config.vol_min) {
        return false;
    }

    // Rule 4: optional price bucket
    match config.price_bucket {
        Some(bucket) => bucket.contains(snapshot.last_price),
        None => true,
    }
}

/// Premium-harvest candidates: rich IV and no dividend
pub fn evaluate_covered_call_potential(snapshot: &MarketSnapshot) -> bool {
    let rich_iv = snapshot
        .implied_volatility
        .is_some_and(|iv| iv > COVERED_CALL_MIN_IV);
    rich_iv && snapshot.dividend_yield == Some(0.0)
}

/// Put spreads need IV above 30% and an RSI inside the band
pub fn evaluate_put_credit_spread_risk(
    snapshot: &MarketSnapshot,
    rsi: RsiValue,
    config: &ScanConfig,
) -> bool {
    let iv_ok = snapshot
        .implied_volatility
        .is_some_and(|iv| iv > PUT_SPREAD_MIN_IV);
    iv_ok && rsi_in_band(rsi, config)
}

/// Per-strategy eligibility for one ticker
pub fn is_eligible(snapshot: &MarketSnapshot, rsi: RsiValue, config: &ScanConfig) -> Eligibility {
    Eligibility {
        covered_call: evaluate_covered_call_potential(snapshot),
        put_spread: evaluate_put_credit_spread_risk(snapshot, rsi, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::config::PriceBucket;
    use chrono::NaiveDate;

    fn snapshot(iv: Option<f64>, dividend: Option<f64>) -> MarketSnapshot {
        MarketSnapshot {
            ticker: "TEST".to_string(),
            last_price: 42.0,
            avg_volume: Some(2_000_000.0),
            implied_volatility: iv,
            dividend_yield: dividend,
            sector: Some("Technology".to_string()),
            market_cap: Some(1_000.0),
            earnings_date: None,
        }
    }

    fn config() -> ScanConfig {
        ScanConfig::for_date(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap())
    }

    #[test]
    fn test_covered_call_potential() {
        assert!(evaluate_covered_call_potential(&snapshot(Some(0.45), Some(0.0))));
        assert!(!evaluate_covered_call_potential(&snapshot(Some(0.45), Some(0.02))));
        assert!(!evaluate_covered_call_potential(&snapshot(Some(0.40), Some(0.0))));
        assert!(!evaluate_covered_call_potential(&snapshot(None, Some(0.0))));
        // unknown dividend is not the same as no dividend
        assert!(!evaluate_covered_call_potential(&snapshot(Some(0.45), None)));
    }

    #[test]
    fn test_put_spread_risk() {
        let cfg = config();
        let snap = snapshot(Some(0.35), Some(0.01));
        assert!(evaluate_put_credit_spread_risk(&snap, RsiValue::Defined(50.0), &cfg));
        assert!(!evaluate_put_credit_spread_risk(&snap, RsiValue::Defined(75.0), &cfg));
        assert!(!evaluate_put_credit_spread_risk(&snap, RsiValue::Unavailable, &cfg));
        assert!(!evaluate_put_credit_spread_risk(
            &snapshot(Some(0.30), None),
            RsiValue::Defined(50.0),
            &cfg
        ));
    }

    #[test]
    fn test_global_filters() {
        let cfg = config();
        let snap = snapshot(Some(0.31), Some(0.0));
        assert!(passes_global_filters(&snap, RsiValue::Defined(40.0), &cfg));
        assert!(passes_global_filters(&snap, RsiValue::Defined(60.0), &cfg));
        assert!(!passes_global_filters(&snap, RsiValue::Unavailable, &cfg));
        assert!(!passes_global_filters(&snapshot(Some(0.29), None), RsiValue::Defined(50.0), &cfg));
        assert!(!passes_global_filters(&snapshot(None, None), RsiValue::Defined(50.0), &cfg));

        let thin = MarketSnapshot {
            avg_volume: Some(999_999.0),
            ..snap.clone()
        };
        assert!(!passes_global_filters(&thin, RsiValue::Defined(50.0), &cfg));

        let unknown_volume = MarketSnapshot {
            avg_volume: None,
            ..snap.clone()
        };
        assert!(!passes_global_filters(&unknown_volume, RsiValue::Defined(50.0), &cfg));
    }

    #[test]
    fn test_price_bucket_filter() {
        let cfg = ScanConfig {
            price_bucket: Some(PriceBucket::From50To150),
            ..config()
        };
        let snap = snapshot(Some(0.5), Some(0.0));
        assert!(!passes_global_filters(&snap, RsiValue::Defined(50.0), &cfg));

        let pricier = MarketSnapshot {
            last_price: 75.0,
            ..snap
        };
        assert!(passes_global_filters(&pricier, RsiValue::Defined(50.0), &cfg));
    }

    #[test]
    fn test_is_eligible_combines_both() {
        let e = is_eligible(&snapshot(Some(0.45), Some(0.0)), RsiValue::Defined(50.0), &config());
        assert!(e.covered_call && e.put_spread);

        let e = is_eligible(&snapshot(Some(0.35), Some(0.0)), RsiValue::Defined(50.0), &config());
        assert!(!e.covered_call && e.put_spread);
    }
}
