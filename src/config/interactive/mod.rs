use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};

use super::settings::API_KEY_ENV;
use super::{Config, ConfigError, get_config_dir};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔮 Augur Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Mistral Configuration").bold().yellow());
    eprintln!("Configure the Mistral platform endpoint and models.");
    eprintln!();

    configure_mistral(&mut config)?;
    configure_retrieval(&mut config)?;

    eprintln!();
    if std::env::var(API_KEY_ENV).is_ok() {
        eprintln!("{}", style(format!("✓ {API_KEY_ENV} is set")).green());
    } else {
        eprintln!(
            "{}",
            style(format!("⚠ Warning: {API_KEY_ENV} is not set")).yellow()
        );
        eprintln!("You can continue, but set it before running readings or weather queries.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config_dir = get_config_dir().context("Failed to locate configuration directory")?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Mistral Settings:").bold().yellow());
    eprintln!("  Endpoint: {}", style(&config.mistral.endpoint).cyan());
    eprintln!("  Chat Model: {}", style(&config.mistral.chat_model).cyan());
    eprintln!(
        "  Embedding Model: {}",
        style(&config.mistral.embedding_model).cyan()
    );
    eprintln!("  Batch Size: {}", style(config.mistral.batch_size).cyan());
    eprintln!(
        "  Embedding Dimension: {}",
        style(config.mistral.embedding_dimension).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Retrieval Settings:").bold().yellow());
    eprintln!("  Neighbors: {}", style(config.retrieval.neighbors).cyan());

    eprintln!();
    eprintln!("{}", style("Weather Settings:").bold().yellow());
    eprintln!(
        "  Zip Lookup: {}",
        style(&config.geocoding.zip_endpoint).cyan()
    );
    eprintln!(
        "  Geocoding: {}",
        style(&config.geocoding.search_endpoint).cyan()
    );
    eprintln!("  Forecast: {}", style(&config.forecast.endpoint).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    let config_dir = get_config_dir().context("Failed to locate configuration directory")?;
    Config::load(&config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: config_dir.clone(),
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_mistral(config: &mut Config) -> Result<()> {
    let endpoint: String = Input::new()
        .with_prompt("Mistral endpoint")
        .default(config.mistral.endpoint.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            url::Url::parse(input)
                .map(|_| ())
                .map_err(|_| ConfigError::InvalidEndpoint(input.clone()))
        })
        .interact_text()?;
    config.mistral.endpoint = endpoint;

    let chat_model: String = Input::new()
        .with_prompt("Chat model")
        .default(config.mistral.chat_model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    config.mistral.chat_model = chat_model;

    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(config.mistral.embedding_model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    config.mistral.embedding_model = embedding_model;

    let batch_size: u32 = Input::new()
        .with_prompt("Embedding batch size")
        .default(config.mistral.batch_size)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 || *input > 1000 {
                Err("Batch size must be between 1 and 1000")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    config.mistral.batch_size = batch_size;

    Ok(())
}

fn configure_retrieval(config: &mut Config) -> Result<()> {
    let neighbors: usize = Input::new()
        .with_prompt("Neighbors requested per card")
        .default(config.retrieval.neighbors)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input == 0 || *input > 100 {
                Err("Neighbor count must be between 1 and 100")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    config.retrieval.neighbors = neighbors;

    Ok(())
}
