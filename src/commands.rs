use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use indicatif::ProgressBar;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::AugurError;
use crate::config::settings::API_KEY_ENV;
use crate::config::{Config, get_config_dir};
use crate::corpus::{card_texts, load_corpus};
use crate::index::{VectorStore, build_entries};
use crate::mistral::MistralClient;
use crate::reading::ReadingPipeline;
use crate::weather::{LocationResolver, WeatherAssistant, WeatherFetcher};

fn load_config() -> Result<Config> {
    let config_dir = get_config_dir().context("Failed to locate configuration directory")?;
    Config::load(&config_dir)
}

/// Rebuild the card index from every CSV deck in `data_dir`
#[inline]
pub async fn build_index(data_dir: &Path) -> Result<()> {
    let config = load_config()?;

    let records = load_corpus(data_dir)?;
    let texts = card_texts(&records);
    println!("Loaded {} cards from {}", texts.len(), data_dir.display());

    let client = MistralClient::from_env(&config.mistral)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Embedding card corpus...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    let vectors = client.embed_batch(&texts)?;
    spinner.finish_and_clear();

    let entries = build_entries(texts, vectors)?;

    let store = VectorStore::open(&config).await?;
    store.rebuild(&entries).await?;

    println!(
        "{}",
        style(format!("✓ Card index rebuilt with {} entries", entries.len())).green()
    );
    Ok(())
}

/// Run the reading pipeline for a query and render the result
#[inline]
pub async fn run_reading(query: Option<String>) -> Result<()> {
    let config = load_config()?;

    let query = match query {
        Some(query) => query,
        None => Input::new()
            .with_prompt("Enter your query with tarot/oracle cards")
            .interact_text()?,
    };
    if query.trim().is_empty() {
        println!(
            "{}",
            style("Please enter a query before requesting a reading.").yellow()
        );
        return Ok(());
    }

    let client = Arc::new(MistralClient::from_env(&config.mistral)?);
    let store = Arc::new(VectorStore::open(&config).await?);
    let pipeline = ReadingPipeline::new(client, store, config.retrieval.neighbors);

    let reading = match pipeline.interpret(&query).await {
        Ok(reading) => reading,
        Err(AugurError::NoCardsIdentified) => {
            println!(
                "{}",
                style("No cards were identified in the query.").yellow()
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "{} {}",
        style("Identified cards:").bold(),
        reading.cards.join(", ")
    );
    println!();
    println!("{}", style(&reading.interpretation).green());
    println!();
    println!("{}", style("Cards retrieved:").bold());
    for text in &reading.context {
        println!("  {text}");
    }

    Ok(())
}

/// Answer a weather question through the tool-calling round trip
#[inline]
pub fn run_weather(location: Option<String>, fahrenheit: bool) -> Result<()> {
    let config = load_config()?;

    let location = match location {
        Some(location) => location,
        None => Input::new()
            .with_prompt("Enter a location (zip code or some combination of city/state/country)")
            .interact_text()?,
    };
    if location.trim().is_empty() {
        println!("{}", style("Please enter a location.").yellow());
        return Ok(());
    }

    let client = Arc::new(MistralClient::from_env(&config.mistral)?);
    let resolver = LocationResolver::new(&config.geocoding)?;
    let fetcher = WeatherFetcher::new(&config.forecast)?;
    let assistant = WeatherAssistant::new(client, resolver, fetcher);

    let answer = assistant.ask(&location, fahrenheit)?;

    println!("{}", style(&answer.answer).green());
    println!();
    println!("{}", style("Raw weather data:").bold());
    println!(
        "{}",
        serde_json::to_string_pretty(&answer.report)
            .context("Failed to render weather report")?
    );

    Ok(())
}

/// Show configuration paths and card index status
#[inline]
pub async fn show_status() -> Result<()> {
    let config = load_config()?;

    println!("{}", style("🔮 Augur Status").bold().cyan());
    println!();
    println!("  Config file: {}", config.config_file_path().display());
    println!(
        "  Vector database: {}",
        config.vector_database_path().display()
    );

    let store = VectorStore::open(&config).await?;
    let count = store.count().await?;
    if count == 0 {
        println!(
            "  Card index: {} (run `augur index` to build it)",
            style("not built").yellow()
        );
    } else {
        println!("  Card index: {} entries", style(count).green());
    }

    if std::env::var(API_KEY_ENV).is_ok() {
        println!("  {API_KEY_ENV}: {}", style("set").green());
    } else {
        println!("  {API_KEY_ENV}: {}", style("not set").red());
    }

    Ok(())
}
