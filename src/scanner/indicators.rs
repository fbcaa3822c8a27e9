use super::config::{BREAKOUT_PROXIMITY, BreakoutWindow, RSI_PERIOD, THRESHOLD_EPSILON};
use super::models::{Indicators, PriceSeries, RsiValue};
use crate::error::ScanError;

/// Compute RSI(14) and breakout status for one price series
pub fn compute_indicators(
    series: &PriceSeries,
    window: BreakoutWindow,
) -> Result<Indicators, ScanError> {
    if series.is_empty() {
        return Err(ScanError::InsufficientData("price series is empty".to_string()));
    }

    let closes = series.closes();
    if closes.iter().any(|c| !c.is_finite()) {
        return Err(ScanError::InsufficientData(
            "price series contains non-finite closes".to_string(),
        ));
    }

    let rsi = calculate_rsi(&closes, RSI_PERIOD);
    let (breakout_high, is_breakout) = calculate_breakout(&closes, window.days())?;

    Ok(Indicators {
        rsi,
        breakout_high,
        is_breakout,
    })
}

/// Simple-moving-average RSI over the last `period` price changes.
///
/// Needs `period + 1` closes. A window with no losses reads 100, including a
/// flat window where gains are zero too.
pub fn calculate_rsi(closes: &[f64], period: usize) -> RsiValue {
    if period == 0 || closes.len() < period + 1 {
        return RsiValue::Unavailable;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let recent = &deltas[deltas.len() - period..];

    let avg_gain = recent.iter().map(|&d| d.max(0.0)).sum::<f64>() / period as f64;
    let avg_loss = recent.iter().map(|&d| (-d).max(0.0)).sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        return RsiValue::Defined(100.0);
    }

    let rs = avg_gain / avg_loss;
    let rsi = 100.0 - 100.0 / (1.0 + rs);
    RsiValue::Defined(rsi.clamp(0.0, 100.0))
}

/// Trailing high over the last `window_days` closes and whether the latest
/// close sits within 2% of it. Short histories use every available close.
pub fn calculate_breakout(closes: &[f64], window_days: usize) -> Result<(f64, bool), ScanError> {
    let latest = *closes
        .last()
        .ok_or_else(|| ScanError::InsufficientData("no closes for breakout window".to_string()))?;

    let take = window_days.clamp(1, closes.len());
    let breakout_high = closes[closes.len() - take..]
        .iter()
        .copied()
        .fold(f64::MIN, f64::max);

    Ok((breakout_high, latest + THRESHOLD_EPSILON >= breakout_high * BREAKOUT_PROXIMITY))
}
