// Entrypoint for the CLI application.
// - Keeps `main` small: load settings, set up logging, hand over to the menu.
// - A missing or incomplete env file is reported and exits with status 0.

use clap::Parser;
use crossterm::style::Stylize;
use purview_inventory::{app, config::Settings, ui::StdTerminal, ui::Terminal};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "purview-inventory", version, about = "Interactive Microsoft Purview inventory")]
struct Cli {
    /// Env file with TENANT_ID, CLIENT_ID, CLIENT_SECRET, SUBSCRIPTION_ID and
    /// PURVIEW_ACCOUNT_NAME (defaults to ./purview.env)
    #[arg(long, env = "PURVIEW_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.env_file.as_deref());

    let level = cli
        .log_level
        .clone()
        .or_else(|| settings.as_ref().ok().and_then(|s| s.log_level.clone()))
        .unwrap_or_else(|| "warn".to_string());
    init_logging(&level);

    let mut term = StdTerminal::new();
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "configuration unavailable");
            term.clear()?;
            println!("\n\n{}\n\n", e.to_string().red());
            return Ok(());
        }
    };

    // Blocks until the user picks Exit.
    app::run(&settings, &mut term)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
