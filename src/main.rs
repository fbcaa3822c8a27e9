use anyhow::Result;
use colored::Colorize;
use options_scanner::app_config::{AppConfig, RunMode};
use options_scanner::logging;
use options_scanner::scan_commands::ScanCommands;

#[tokio::main]
async fn main() -> Result<()> {
    let app_config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            ScanCommands::print_usage();
            std::process::exit(1);
        }
    };

    logging::init_logging(&app_config.log_dir)?;
    app_config.log_config();

    match app_config.mode {
        RunMode::Batch => ScanCommands::run_batch(&app_config).await?,
        RunMode::Server => ScanCommands::run_server(&app_config).await?,
    }

    Ok(())
}
