use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stock_watcher::config::DEFAULT_TARGET_ELEMENT_ID;
use stock_watcher::element_finder::evaluate_file;
use stock_watcher::{InvocationEvent, Settings, StockCheckRunner};

#[derive(Parser)]
#[command(name = "stock-watcher", version, about = "Checks a product page and emails when it can be bought")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the configured product page once and send an alert if it is in stock
    Check {
        /// Execution id to use in logs
        #[arg(long)]
        source: Option<String>,

        /// Raw invocation event as JSON, e.g. '{"source":"scheduler"}'
        #[arg(long, conflicts_with = "source")]
        event: Option<String>,

        /// Pretty-print the JSON response
        #[arg(long)]
        pretty: bool,
    },
    /// Evaluate a saved HTML file offline; nothing is fetched or sent
    Evaluate {
        file: PathBuf,

        #[arg(long, default_value = DEFAULT_TARGET_ELEMENT_ID)]
        element_id: String,

        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only the JSON result.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stock_watcher=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check { source, event, pretty } => {
            let settings = Settings::from_env().context("Invalid configuration, refusing to start")?;
            info!(region = %settings.region, url = %settings.target_url, "Configuration loaded");

            let runner = StockCheckRunner::from_settings(&settings)?;

            let event = match (event, source) {
                (Some(json), _) => serde_json::from_str::<InvocationEvent>(&json).context("Invalid --event JSON")?,
                (None, Some(source)) => InvocationEvent::with_source(source),
                (None, None) => InvocationEvent::default(),
            };

            let response = runner.invoke(&event).await;
            print_json(&response, pretty)?;
        }
        Command::Evaluate { file, element_id, pretty } => {
            let result = evaluate_file(&file, &element_id)
                .await
                .with_context(|| format!("Failed to evaluate {}", file.display()))?;
            print_json(&result, pretty)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
