use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookcovers::config::Config;
use bookcovers::covers::FanOutCoordinator;
use bookcovers::models::{BookId, CoverId};

#[derive(Parser)]
#[command(
    name = "bookcovers",
    version,
    about = "Fetch book covers concurrently from a cover service",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the cover service base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every cover slot of a book (all or nothing)
    Covers {
        /// Book identifier (UUID)
        book_id: String,

        /// Print every slot outcome instead of the aggregated covers
        #[arg(long, default_value = "false")]
        report: bool,
    },

    /// Fetch a single cover by its identifier
    Cover {
        /// Cover identifier, e.g. "<book-id>-dummycover1"
        cover_id: String,
    },

    /// Print the cover identifiers probed for a book
    Slots {
        /// Book identifier (UUID)
        book_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(base_url) = &cli.base_url {
        config.cover_service.base_url = base_url.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    config.validate().context("Invalid configuration")?;

    // Initialize tracing/logging
    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    tracing::info!(base_url = %config.cover_service.base_url, "bookcovers starting");

    match cli.command {
        Commands::Covers { book_id, report } => {
            let book_id = parse_book_id(&book_id)?;
            tracing::info!(book_id = %book_id, report = %report, "Starting covers command");
            covers(&config, book_id, report).await?;
        }

        Commands::Cover { cover_id } => {
            tracing::info!(cover_id = %cover_id, "Starting cover command");
            cover(&config, CoverId::new(cover_id)).await?;
        }

        Commands::Slots { book_id } => {
            let book_id = parse_book_id(&book_id)?;
            slots(&config, book_id)?;
        }
    }

    tracing::info!("bookcovers completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("bookcovers=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("bookcovers={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

fn parse_book_id(raw: &str) -> Result<BookId> {
    raw.parse()
        .with_context(|| format!("Invalid book identifier: {raw}"))
}

async fn covers(config: &Config, book_id: BookId, report: bool) -> Result<()> {
    let coordinator = FanOutCoordinator::from_config(&config.cover_service)?;

    if report {
        let report = coordinator.dispatch(&book_id).await?;
        println!("book {}", report.book_id());
        for (slot, outcome) in report.outcomes().iter().enumerate() {
            println!("slot {}: {}", slot + 1, outcome.label());
        }
        return Ok(());
    }

    let covers = coordinator.fetch_all_covers(&book_id).await?;
    println!("{}", serde_json::to_string_pretty(&covers)?);
    Ok(())
}

async fn cover(config: &Config, cover_id: CoverId) -> Result<()> {
    let coordinator = FanOutCoordinator::from_config(&config.cover_service)?;
    let record = coordinator
        .client()
        .get_cover(&cover_id)
        .await
        .with_context(|| format!("Failed to fetch cover {cover_id}"))?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn slots(config: &Config, book_id: BookId) -> Result<()> {
    let coordinator = FanOutCoordinator::from_config(&config.cover_service)?;
    let client = coordinator.client();

    for cover_id in coordinator.cover_identifiers(&book_id) {
        println!("{cover_id}\t{}", client.cover_url(&cover_id)?);
    }
    Ok(())
}
