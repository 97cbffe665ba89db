//! CelesTrak Fetcher CLI application
//!
//! Command-line interface for keeping a rotating local snapshot of CelesTrak
//! orbital element sets.

use std::process;

use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

// Import CLI modules through the library (module is public but not re-exported)
use celestrak_fetcher::cli::{
    handle_catalog, handle_config, handle_fetch, handle_list, handle_rotate, load_config, Cli,
    Commands,
};
use celestrak_fetcher::config::AppConfig;
use celestrak_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            error!(category = e.category(), "Fatal: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Main application logic; returns the process exit status
async fn run() -> Result<i32> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let config = load_config(&cli).await?;

    init_logging(&cli, &config);

    info!("CelesTrak Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    let quiet = cli.global.quiet;
    match cli.command() {
        Commands::Fetch(args) => {
            info!("Executing fetch command");
            handle_fetch(config, args, quiet).await
        }
        Commands::Rotate => {
            info!("Executing rotate command");
            handle_rotate(config, quiet).await.map(|_| 0)
        }
        Commands::Catalog(args) => handle_catalog(config, args).await.map(|_| 0),
        Commands::List(args) => handle_list(config, args).await.map(|_| 0),
        Commands::Config(args) => handle_config(config, args, &cli).await.map(|_| 0),
    }
}

/// Initialize logging from CLI flags, falling back to the configured level
fn init_logging(cli: &Cli, config: &AppConfig) {
    let log_level = cli
        .log_level()
        .or_else(|| config.logging.level.parse().ok())
        .unwrap_or(tracing::Level::INFO);

    let filter = EnvFilter::from_default_env();
    let filter = match format!("celestrak_fetcher={}", log_level).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_level(cli.global.very_verbose || cli.global.verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
