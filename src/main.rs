use augur::Result;
use augur::commands::{build_index, run_reading, run_weather, show_status};
use augur::config::{run_interactive_config, show_config};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "augur")]
#[command(about = "Tarot and oracle readings with retrieval-augmented context, plus a weather assistant")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the Mistral connection and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Build the card index from CSV deck files
    Index {
        /// Directory containing the deck CSV files
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Request a card reading for a free-text query
    Reading {
        /// Query naming the cards to interpret; prompted for when omitted
        query: Option<String>,
    },
    /// Ask about the current weather at a location
    Weather {
        /// US zip code or free-text location; prompted for when omitted
        location: Option<String>,
        /// Report the temperature in Fahrenheit
        #[arg(long)]
        fahrenheit: bool,
    },
    /// Show configuration and card index status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Index { data_dir } => {
            build_index(&data_dir).await?;
        }
        Commands::Reading { query } => {
            run_reading(query).await?;
        }
        Commands::Weather {
            location,
            fahrenheit,
        } => {
            run_weather(location, fahrenheit)?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}
