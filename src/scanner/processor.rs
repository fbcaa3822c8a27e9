use super::config::{ITM_SPREAD_POP, MIN_CREDIT_TO_WIDTH, OtmPop, THRESHOLD_EPSILON};
use super::models::{
    CoveredCallCandidate, OptionChain, OptionExpiration, OptionQuote, OptionSide,
    PutCreditSpreadCandidate,
};
use chrono::{Duration, NaiveDate};
use tracing::debug;

/// Unexpired expirations with DTE <= `max_dte`, earliest first
pub fn eligible_expirations(
    chain: &OptionChain,
    as_of: NaiveDate,
    max_dte: i64,
) -> Vec<(&OptionExpiration, i64)> {
    let mut selected: Vec<(&OptionExpiration, i64)> = chain
        .expirations
        .iter()
        .map(|exp| (exp, exp.days_to_expiry(as_of)))
        .filter(|(_, dte)| *dte >= 0 && *dte <= max_dte)
        .collect();
    selected.sort_by_key(|(exp, _)| exp.expiration);
    selected
}

/// Quotes of one side sorted by ascending strike.
///
/// Returns `None` when the side is empty or any quote lacks a usable bid/ask,
/// in which case the whole expiration is skipped.
fn usable_side(quotes: &[OptionQuote], side: OptionSide) -> Option<Vec<&OptionQuote>> {
    let mut side_quotes: Vec<&OptionQuote> = quotes.iter().filter(|q| q.side == side).collect();
    if side_quotes.is_empty() || !side_quotes.iter().all(|q| q.is_well_formed()) {
        return None;
    }
    side_quotes.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    Some(side_quotes)
}

/// First out-of-the-money call paying at least `min_premium_pct` of spot.
///
/// Expirations are walked earliest first and the search stops at the first
/// expiration that yields a candidate. Within an expiration the lowest
/// qualifying strike wins.
pub fn find_covered_call(
    chain: &OptionChain,
    price: f64,
    max_dte: i64,
    min_premium_pct: f64,
    as_of: NaiveDate,
    holding_days: i64,
) -> Option<CoveredCallCandidate> {
    if !price.is_finite() || price <= 0.0 {
        return None;
    }
    let min_premium = price * (min_premium_pct / 100.0);

    for (expiration, dte) in eligible_expirations(chain, as_of, max_dte) {
        let Some(calls) = usable_side(&expiration.calls, OptionSide::Call) else {
            debug!(
                ticker = %chain.ticker,
                expiration = %expiration.expiration,
                "skipping expiration with empty or malformed call side"
            );
            continue;
        };

        let hit = calls.into_iter().find(|q| {
            q.strike > price && q.bid.is_some_and(|bid| bid + THRESHOLD_EPSILON >= min_premium)
        });

        if let Some(call) = hit {
            let premium = call.bid.unwrap_or_default();
            return Some(CoveredCallCandidate {
                ticker: chain.ticker.clone(),
                strike: call.strike,
                premium,
                dte,
                expiration: expiration.expiration,
                entry_date: as_of,
                exit_date: as_of + Duration::days(dte.min(holding_days)),
            });
        }
    }

    None
}

/// Heuristic probability of profit: `otm_pop` when the short strike is below
/// spot, 0.50 otherwise
pub fn estimate_pop(short_strike: f64, price: f64, otm_pop: OtmPop) -> f64 {
    if short_strike < price {
        otm_pop.value()
    } else {
        ITM_SPREAD_POP
    }
}

/// Check one adjacent put pair. `short` is the lower strike, `long` the next one up.
pub fn evaluate_spread_pair(
    ticker: &str,
    short: &OptionQuote,
    long: &OptionQuote,
    price: f64,
    min_pop: f64,
    otm_pop: OtmPop,
    dte: i64,
) -> Option<PutCreditSpreadCandidate> {
    let width = long.strike - short.strike;
    if width <= 0.0 {
        return None;
    }

    let credit = short.bid? - long.ask?;
    if credit <= 0.0 || credit / width + THRESHOLD_EPSILON < MIN_CREDIT_TO_WIDTH {
        return None;
    }

    let pop = estimate_pop(short.strike, price, otm_pop);
    if pop < min_pop {
        return None;
    }

    Some(PutCreditSpreadCandidate {
        ticker: ticker.to_string(),
        short_strike: short.strike,
        long_strike: long.strike,
        credit,
        width,
        pop,
        dte,
        expiration: short.expiration,
    })
}

/// At most one put credit spread per eligible expiration: the first adjacent
/// strike pair, in ascending strike order, that clears every threshold
pub fn find_put_credit_spreads(
    chain: &OptionChain,
    price: f64,
    max_dte: i64,
    min_pop: f64,
    otm_pop: OtmPop,
    as_of: NaiveDate,
) -> Vec<PutCreditSpreadCandidate> {
    let mut spreads = Vec::new();
    if !price.is_finite() || price <= 0.0 {
        return spreads;
    }

    for (expiration, dte) in eligible_expirations(chain, as_of, max_dte) {
        let Some(puts) = usable_side(&expiration.puts, OptionSide::Put) else {
            debug!(
                ticker = %chain.ticker,
                expiration = %expiration.expiration,
                "skipping expiration with empty or malformed put side"
            );
            continue;
        };

        let found = puts.windows(2).find_map(|pair| {
            evaluate_spread_pair(&chain.ticker, pair[0], pair[1], price, min_pop, otm_pop, dte)
        });

        if let Some(spread) = found {
            spreads.push(spread);
        }
    }

    spreads
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn quote(side: OptionSide, strike: f64, bid: f64, ask: f64, exp: NaiveDate) -> OptionQuote {
        OptionQuote {
            strike,
            bid: Some(bid),
            ask: Some(ask),
            expiration: exp,
            side,
        }
    }

    #[test]
    fn test_eligible_expirations_sorted_and_bounded() {
        let chain = OptionChain {
            ticker: "XYZ".to_string(),
            expirations: vec![
                OptionExpiration { expiration: day(20), calls: vec![], puts: vec![] },
                OptionExpiration { expiration: day(6), calls: vec![], puts: vec![] },
                OptionExpiration { expiration: day(1), calls: vec![], puts: vec![] },
                OptionExpiration { expiration: day(13), calls: vec![], puts: vec![] },
            ],
        };
        let picked: Vec<i64> = eligible_expirations(&chain, day(2), 14)
            .into_iter()
            .map(|(_, dte)| dte)
            .collect();
        assert_eq!(picked, vec![4, 11]);
    }

    #[test]
    fn test_estimate_pop() {
        assert_eq!(estimate_pop(95.0, 100.0, OtmPop::Seventy), 0.70);
        assert_eq!(estimate_pop(95.0, 100.0, OtmPop::SeventyFive), 0.75);
        assert_eq!(estimate_pop(100.0, 100.0, OtmPop::Seventy), 0.50);
    }

    #[test]
    fn test_spread_pair_rejects_low_credit_ratio() {
        let exp = day(6);
        let short = quote(OptionSide::Put, 95.0, 2.0, 2.2, exp);
        let long = quote(OptionSide::Put, 100.0, 0.4, 0.5, exp);
        // credit 1.5 on width 5 -> 0.30
        assert!(evaluate_spread_pair("XYZ", &short, &long, 100.0, 0.65, OtmPop::Seventy, 4).is_none());
    }

    #[test]
    fn test_spread_pair_accepts() {
        let exp = day(6);
        let short = quote(OptionSide::Put, 95.0, 2.5, 2.6, exp);
        let long = quote(OptionSide::Put, 100.0, 0.4, 0.5, exp);
        let spread =
            evaluate_spread_pair("XYZ", &short, &long, 100.0, 0.65, OtmPop::Seventy, 4).unwrap();
        assert_eq!(spread.width, 5.0);
        assert!((spread.credit - 2.0).abs() < 1e-9);
        assert_eq!(spread.pop, 0.70);
        assert_eq!(spread.expiration, exp);
    }
}
