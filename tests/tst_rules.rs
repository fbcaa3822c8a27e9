use chrono::NaiveDate;
use options_scanner::scanner::config::PriceBucket;
use options_scanner::scanner::rules::{
    evaluate_covered_call_potential, evaluate_put_credit_spread_risk, is_eligible,
    passes_global_filters,
};
use options_scanner::{Fundamentals, MarketSnapshot, RsiValue, ScanConfig};

fn config() -> ScanConfig {
    ScanConfig::for_date(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap())
}

fn snapshot(price: f64, iv: Option<f64>, dividend: Option<f64>, volume: Option<f64>) -> MarketSnapshot {
    MarketSnapshot::from_parts(
        "TEST",
        price,
        Fundamentals {
            implied_volatility: iv,
            dividend_yield: dividend,
            avg_volume: volume,
            ..Fundamentals::default()
        },
    )
}

#[test]
fn test_covered_call_potential() {
    assert!(evaluate_covered_call_potential(&snapshot(100.0, Some(0.45), Some(0.0), None)));
    assert!(!evaluate_covered_call_potential(&snapshot(100.0, Some(0.45), Some(0.02), None)));
    assert!(!evaluate_covered_call_potential(&snapshot(100.0, Some(0.40), Some(0.0), None)));
    assert!(!evaluate_covered_call_potential(&snapshot(100.0, None, Some(0.0), None)));
    assert!(!evaluate_covered_call_potential(&snapshot(100.0, Some(0.45), None, None)));
}

#[test]
fn test_put_credit_spread_risk() {
    let cfg = config();
    let snap = snapshot(100.0, Some(0.35), Some(0.01), None);

    assert!(evaluate_put_credit_spread_risk(&snap, RsiValue::Defined(50.0), &cfg));
    assert!(!evaluate_put_credit_spread_risk(&snap, RsiValue::Defined(65.0), &cfg));
    assert!(!evaluate_put_credit_spread_risk(&snap, RsiValue::Unavailable, &cfg));
    assert!(!evaluate_put_credit_spread_risk(
        &snapshot(100.0, Some(0.30), None, None),
        RsiValue::Defined(50.0),
        &cfg
    ));
}

#[test]
fn test_global_filters() {
    let cfg = config();
    let good = snapshot(100.0, Some(0.35), Some(0.0), Some(2_000_000.0));

    assert!(passes_global_filters(&good, RsiValue::Defined(40.0), &cfg));
    assert!(passes_global_filters(&good, RsiValue::Defined(60.0), &cfg));
    assert!(!passes_global_filters(&good, RsiValue::Defined(39.9), &cfg));
    assert!(!passes_global_filters(&good, RsiValue::Unavailable, &cfg));

    let low_iv = snapshot(100.0, Some(0.25), Some(0.0), Some(2_000_000.0));
    assert!(!passes_global_filters(&low_iv, RsiValue::Defined(50.0), &cfg));

    let thin = snapshot(100.0, Some(0.35), Some(0.0), Some(500_000.0));
    assert!(!passes_global_filters(&thin, RsiValue::Defined(50.0), &cfg));

    let unknown_volume = snapshot(100.0, Some(0.35), Some(0.0), None);
    assert!(!passes_global_filters(&unknown_volume, RsiValue::Defined(50.0), &cfg));
}

#[test]
fn test_iv_exactly_at_minimum_passes() {
    let mut cfg = config();
    cfg.iv_min_percent = 57.0;

    let at_min = snapshot(100.0, Some(0.57), Some(0.0), Some(2_000_000.0));
    let below = snapshot(100.0, Some(0.569), Some(0.0), Some(2_000_000.0));
    assert!(passes_global_filters(&at_min, RsiValue::Defined(50.0), &cfg));
    assert!(!passes_global_filters(&below, RsiValue::Defined(50.0), &cfg));
}

#[test]
fn test_price_bucket_filter() {
    let mut cfg = config();
    cfg.price_bucket = Some(PriceBucket::From50To150);

    let inside = snapshot(100.0, Some(0.35), Some(0.0), Some(2_000_000.0));
    let outside = snapshot(8.0, Some(0.35), Some(0.0), Some(2_000_000.0));
    assert!(passes_global_filters(&inside, RsiValue::Defined(50.0), &cfg));
    assert!(!passes_global_filters(&outside, RsiValue::Defined(50.0), &cfg));
}

#[test]
fn test_is_eligible_independent_strategies() {
    let cfg = config();

    let both = is_eligible(&snapshot(100.0, Some(0.45), Some(0.0), None), RsiValue::Defined(50.0), &cfg);
    assert!(both.covered_call && both.put_spread);

    let spread_only =
        is_eligible(&snapshot(100.0, Some(0.45), Some(0.02), None), RsiValue::Defined(50.0), &cfg);
    assert!(!spread_only.covered_call && spread_only.put_spread);

    let call_only =
        is_eligible(&snapshot(100.0, Some(0.45), Some(0.0), None), RsiValue::Defined(70.0), &cfg);
    assert!(call_only.covered_call && !call_only.put_spread);
    assert!(call_only.any());
}
