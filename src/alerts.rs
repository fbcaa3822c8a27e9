use crate::scanner::models::{RsiValue, ScanReport, ScanResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::fmt::Write;
use tracing::info;

pub const SUMMARY_SUBJECT: &str = "Daily Options Scan Report";
pub const DEFAULT_SMTP_PORT: u16 = 587;

// -----------------------------------------------
// SUMMARY TABLE
// -----------------------------------------------

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "-".to_string())
}

fn covered_call_cell(result: &ScanResult) -> String {
    match &result.covered_call {
        Some(call) => format!("{:.2} @ {:.2}", call.strike, call.premium),
        None => "-".to_string(),
    }
}

fn put_spread_cell(result: &ScanResult) -> String {
    match result.put_spreads.as_slice() {
        [] => "-".to_string(),
        [first] => format!("{:.2}/{:.2} cr {:.2}", first.short_strike, first.long_strike, first.credit),
        [first, rest @ ..] => format!(
            "{:.2}/{:.2} cr {:.2} (+{})",
            first.short_strike,
            first.long_strike,
            first.credit,
            rest.len()
        ),
    }
}

/// Fixed-width plain-text report: one row per ticker that passed the filters,
/// then the skipped tickers.
pub fn build_summary(report: &ScanReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Options scan for {}", report.evaluation_date);
    let _ = writeln!(
        out,
        "Tickers: {} requested, {} evaluated, {} filtered out, {} failed",
        report.tickers_requested,
        report.results.len(),
        report.tickers_filtered_out,
        report.failures.len()
    );
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "{:<8} {:>10} {:>7} {:>7} {:<18} {:<28} {:<9} {:<11} {:<11}",
        "Ticker", "Price", "RSI", "IV", "Covered Call", "Put Credit Spread", "Breakout", "Entry Date", "Exit Date"
    );
    let _ = writeln!(out, "{}", "-".repeat(115));

    for result in &report.results {
        let rsi = match result.rsi {
            RsiValue::Defined(v) => format!("{:.1}", v),
            RsiValue::Unavailable => "-".to_string(),
        };
        let iv = fmt_opt(result.snapshot.implied_volatility.map(|v| v * 100.0), 1);
        let (entry, exit) = match &result.covered_call {
            Some(call) => (call.entry_date.to_string(), call.exit_date.to_string()),
            None => ("-".to_string(), "-".to_string()),
        };

        let _ = writeln!(
            out,
            "{:<8} {:>10.2} {:>7} {:>7} {:<18} {:<28} {:<9} {:<11} {:<11}",
            result.snapshot.ticker,
            result.snapshot.last_price,
            rsi,
            iv,
            covered_call_cell(result),
            put_spread_cell(result),
            if result.is_breakout { "yes" } else { "no" },
            entry,
            exit
        );
    }

    if report.results.is_empty() {
        let _ = writeln!(out, "No tickers passed the filters.");
    }

    if !report.failures.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Skipped tickers:");
        for failure in &report.failures {
            let _ = writeln!(out, "  {:<8} [{}] {}", failure.ticker, failure.kind, failure.reason);
        }
    }

    out
}

// -----------------------------------------------
// DELIVERY
// -----------------------------------------------

#[async_trait]
pub trait Alerter: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<()>;
}

/// Writes the summary to the log instead of sending it anywhere
pub struct LogAlerter;

#[async_trait]
impl Alerter for LogAlerter {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        info!(subject, "{}", body);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

impl SmtpSettings {
    /// `None` unless `SMTP_HOST` and `SCANNER_ALERT_EMAIL` are both set
    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (Some(host), Some(to)) = (lookup("SMTP_HOST"), lookup("SCANNER_ALERT_EMAIL")) else {
            return Ok(None);
        };

        let port = match lookup("SMTP_PORT") {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid SMTP_PORT '{}'", v))?,
            None => DEFAULT_SMTP_PORT,
        };
        let username = lookup("SMTP_USERNAME").unwrap_or_default();
        let from = lookup("SMTP_FROM").unwrap_or_else(|| username.clone());

        Ok(Some(Self {
            host,
            port,
            password: lookup("SMTP_PASSWORD").unwrap_or_default(),
            username,
            from,
            to,
        }))
    }
}

/// Sends the summary by e-mail
pub struct SmtpAlerter {
    settings: SmtpSettings,
}

impl SmtpAlerter {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    pub fn from_env() -> Result<Option<Self>> {
        Ok(SmtpSettings::from_lookup(|key| std::env::var(key).ok())?.map(Self::new))
    }

    fn create_transport(settings: &SmtpSettings) -> Result<SmtpTransport> {
        let creds = Credentials::new(settings.username.clone(), settings.password.clone());
        Ok(SmtpTransport::relay(&settings.host)?
            .port(settings.port)
            .credentials(creds)
            .build())
    }
}

#[async_trait]
impl Alerter for SmtpAlerter {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        let email = Message::builder()
            .from(self.settings.from.parse().context("Invalid from address")?)
            .to(self.settings.to.parse().context("Invalid recipient")?)
            .subject(subject)
            .body(body.to_string())
            .context("Failed to build email")?;

        let settings = self.settings.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let transport = Self::create_transport(&settings)?;
            transport.send(&email).context("SMTP send failed")?;
            Ok(())
        })
        .await??;

        info!(to = %self.settings.to, "summary email sent");
        Ok(())
    }
}

/// SMTP when configured, otherwise the log
pub fn alerter_from_env() -> Result<Box<dyn Alerter>> {
    Ok(match SmtpAlerter::from_env()? {
        Some(smtp) => Box::new(smtp),
        None => Box::new(LogAlerter),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::models::{
        CoveredCallCandidate, Eligibility, MarketSnapshot, Fundamentals, TickerFailure,
    };
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn report() -> ScanReport {
        let fundamentals = Fundamentals {
            implied_volatility: Some(0.45),
            dividend_yield: Some(0.0),
            ..Fundamentals::default()
        };
        let mut report = ScanReport::empty(date(2));
        report.tickers_requested = 2;
        report.results.push(ScanResult {
            snapshot: MarketSnapshot::from_parts("AAA", 100.0, fundamentals),
            rsi: RsiValue::Defined(50.0),
            breakout_high: 101.0,
            is_breakout: true,
            eligibility: Eligibility { covered_call: true, put_spread: false },
            covered_call: Some(CoveredCallCandidate {
                ticker: "AAA".to_string(),
                strike: 105.0,
                premium: 1.5,
                dte: 5,
                expiration: date(7),
                entry_date: date(2),
                exit_date: date(7),
            }),
            put_spreads: Vec::new(),
        });
        report.failures.push(TickerFailure {
            ticker: "BBB".to_string(),
            kind: "provider_error".to_string(),
            reason: "Provider error: timeout".to_string(),
        });
        report
    }

    #[test]
    fn test_build_summary() {
        let summary = build_summary(&report());

        assert!(summary.contains("Ticker"));
        assert!(summary.contains("Put Credit Spread"));
        let row = summary.lines().find(|l| l.starts_with("AAA")).unwrap();
        assert!(row.contains("105.00 @ 1.50"));
        assert!(row.contains("45.0"));
        assert!(row.contains("2025-06-07"));
        assert!(summary.contains("Skipped tickers:"));
        assert!(summary.contains("BBB"));
    }

    #[test]
    fn test_smtp_settings_optional() {
        assert_eq!(SmtpSettings::from_lookup(|_| None).unwrap(), None);

        let settings = SmtpSettings::from_lookup(|key| match key {
            "SMTP_HOST" => Some("smtp.example.com".to_string()),
            "SMTP_USERNAME" => Some("bot@example.com".to_string()),
            "SCANNER_ALERT_EMAIL" => Some("me@example.com".to_string()),
            _ => None,
        })
        .unwrap()
        .unwrap();

        assert_eq!(settings.port, DEFAULT_SMTP_PORT);
        assert_eq!(settings.from, "bot@example.com");
    }

    #[tokio::test]
    async fn test_log_alerter() {
        assert!(LogAlerter.send(SUMMARY_SUBJECT, "body").await.is_ok());
    }
}
