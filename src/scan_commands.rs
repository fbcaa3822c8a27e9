use crate::alerts::{self, SUMMARY_SUBJECT};
use crate::api_server_axum::{self, AppState};
use crate::app_config::AppConfig;
use crate::export;
use crate::provider;
use crate::scanner::aggregator;
use crate::scanner::config::ScanConfig;
use crate::scanner::models::ScanReport;
use anyhow::Result;
use colored::Colorize;
use tracing::error;

/// Command handlers for the scanner binary
pub struct ScanCommands;

impl ScanCommands {
    /// Scan the watchlist once, write CSVs and send the summary
    pub async fn run_batch(app_config: &AppConfig) -> Result<()> {
        println!("{}", "=".repeat(60).blue());
        println!("{}", "Options Scanner Batch".green().bold());
        println!("{}", "=".repeat(60).blue());
        println!();

        let today = chrono::Local::now().date_naive();
        let scan_config = ScanConfig::from_env(today)?;
        let provider = provider::build_provider(&app_config.provider)?;

        // Step 1: Resolve the watchlist
        println!("{}", "Step 1: Loading watchlist...".cyan());
        let tickers = app_config.resolve_watchlist();
        println!("{} {} tickers", "✓".green(), tickers.len());
        println!();

        // Step 2: Scan
        println!("{}", "Step 2: Scanning tickers...".cyan());
        println!("{} Max concurrent requests: {}", "ℹ".blue(), scan_config.max_concurrent);
        println!("{} Evaluation date: {}", "ℹ".blue(), scan_config.evaluation_date);
        println!();

        let start_time = std::time::Instant::now();
        let report = aggregator::aggregate(provider, &tickers, &scan_config).await?;
        let elapsed = start_time.elapsed();

        Self::display_batch_summary(&report, elapsed);

        // Step 3: Export
        println!("{}", "Step 3: Writing results...".cyan());
        for path in export::write_report(&app_config.output_dir, &report)? {
            println!("{} Saved {}", "✓".green(), path.display());
        }
        println!();

        // Step 4: Summary delivery is best effort
        let summary = alerts::build_summary(&report);
        match alerts::alerter_from_env() {
            Ok(alerter) => {
                if let Err(e) = alerter.send(SUMMARY_SUBJECT, &summary).await {
                    error!(error = %e, "failed to send scan summary");
                    println!("{} Summary not sent: {}", "⚠".yellow(), e);
                }
            }
            Err(e) => {
                error!(error = %e, "invalid alert configuration");
                println!("{} Summary not sent: {}", "⚠".yellow(), e);
            }
        }

        println!("{}", "=".repeat(60).blue());
        println!("{}", "Done!".green().bold());
        println!("{}", "=".repeat(60).blue());

        Ok(())
    }

    /// Run API server mode
    pub async fn run_server(app_config: &AppConfig) -> Result<()> {
        println!("{}", "=".repeat(60).blue());
        println!("{}", "Options Scanner API Server".green().bold());
        println!("{}", "=".repeat(60).blue());
        println!();

        let provider = provider::build_provider(&app_config.provider)?;
        let app_state = AppState::new(provider, app_config.resolve_watchlist());
        api_server_axum::start_server(app_config.port, app_state).await
    }

    fn display_batch_summary(report: &ScanReport, elapsed: std::time::Duration) {
        println!("{}", "=".repeat(60).blue());
        println!("{}", "Summary".cyan().bold());
        println!("{}", "=".repeat(60).blue());
        println!("{} Evaluated: {}", "✓".green(), report.results.len());
        println!("{} Filtered out: {}", "ℹ".blue(), report.tickers_filtered_out);
        println!("{} Failed: {}", "✗".red(), report.failures.len());
        println!("{} Breakouts: {}", "→".cyan(), report.breakouts.len());
        println!("{} Covered calls: {}", "→".cyan(), report.covered_calls.len());
        println!("{} Put credit spreads: {}", "→".cyan(), report.put_spreads.len());
        println!("{} Time taken: {:.2}s", "⏱".yellow(), elapsed.as_secs_f64());
        println!();

        if !report.failures.is_empty() {
            println!("{}", "Failed Tickers:".red());
            for failure in report.failures.iter().take(10) {
                println!(
                    "  {} {} → {}",
                    "✗".red(),
                    failure.ticker.yellow(),
                    failure.reason.chars().take(80).collect::<String>()
                );
            }
            if report.failures.len() > 10 {
                println!("  ... and {} more", report.failures.len() - 10);
            }
            println!();
        }
    }

    pub fn print_usage() {
        eprintln!("Set SCANNER_MODE to control execution mode ('batch' or 'server')");
        eprintln!("Examples:");
        eprintln!("  FINNHUB_API_KEY=... SCANNER_MODE=batch cargo run");
        eprintln!("  SCANNER_MODE=server SCANNER_PORT=3001 cargo run");
        eprintln!("  SCANNER_PROVIDER=fixtures SCANNER_FIXTURES_DIR=./fixtures SCANNER_WATCHLIST=AAPL,MSFT cargo run");
    }
}
