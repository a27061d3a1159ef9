
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::fmt::Write as _;

use super::{Config, ConfigError, OpenAiConfig, PineconeConfig, RecommendConfig};
use crate::index::Metric;

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🛍  Smart Shopper Configuration Setup").bold().cyan());
    eprintln!();
    eprintln!(
        "{}",
        style("API keys are never saved; they are read from the environment or asked for per session.")
            .dim()
    );
    eprintln!();

    let mut config = load_existing_config();

    eprintln!("{}", style("OpenAI Configuration").bold().yellow());
    configure_openai(&mut config.openai)?;

    eprintln!();
    eprintln!("{}", style("Pinecone Configuration").bold().yellow());
    configure_pinecone(&mut config.pinecone)?;

    eprintln!();
    eprintln!("{}", style("Recommendation Configuration").bold().yellow());
    configure_recommend(&mut config.recommend)?;

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
    let config = Config::load_default().context("Failed to load configuration")?;
    eprint!("{}", render_config(&config));
    Ok(())
}

fn render_config(config: &Config) -> String {
    let mut out = String::new();
    let mut line = |label: &str, value: String| {
        let _ = writeln!(out, "  {}: {}", label, style(value).cyan());
    };

    line("OpenAI URL", config.openai.base_url.clone());
    line("Embedding Model", config.openai.embedding_model.clone());
    line("Chat Model", config.openai.chat_model.clone());
    line("Assistant Persona", config.openai.assistant_persona.clone());
    line("Pinecone URL", config.pinecone.control_url.clone());
    line("Index", config.pinecone.index_name.clone());
    line(
        "Index Shape",
        format!(
            "{} dims, {}, {}",
            config.pinecone.dimension, config.pinecone.metric, config.pinecone.cloud
        ),
    );
    line("Top K", config.recommend.top_k.to_string());
    line(
        "Ingest Concurrency",
        config.recommend.ingest_concurrency.to_string(),
    );
    line("Request Timeout", format!("{}s", config.timeout_seconds));

    format!(
        "{}\n\n{}\nConfig file: {}\n",
        style("📋 Current Configuration").bold().cyan(),
        out,
        style(config.config_file_path().display()).dim()
    )
}

fn load_existing_config() -> Config {
    Config::load_default().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Config::default()
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            config
        },
    )
}

fn configure_openai(openai: &mut OpenAiConfig) -> Result<()> {
    let base_url: String = Input::new()
        .with_prompt("OpenAI base URL")
        .default(openai.base_url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            OpenAiConfig {
                base_url: input.clone(),
                ..openai.clone()
            }
            .validate()
        })
        .interact_text()?;

    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(openai.embedding_model.clone())
        .interact_text()?;

    let chat_model: String = Input::new()
        .with_prompt("Chat model")
        .default(openai.chat_model.clone())
        .interact_text()?;

    openai.set_base_url(base_url)?;
    openai.set_embedding_model(embedding_model)?;
    openai.set_chat_model(chat_model)?;

    Ok(())
}

fn configure_pinecone(pinecone: &mut PineconeConfig) -> Result<()> {
    let index_name: String = Input::new()
        .with_prompt("Index name")
        .default(pinecone.index_name.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            PineconeConfig {
                index_name: input.clone(),
                ..pinecone.clone()
            }
            .validate()
        })
        .interact_text()?;

    let dimension: u32 = Input::new()
        .with_prompt("Embedding dimension (must match the embedding model)")
        .default(pinecone.dimension)
        .interact_text()?;

    let metrics: Vec<&str> = Metric::ALL.iter().map(|m| m.as_str()).collect();
    let metric_index = Select::new()
        .with_prompt("Distance metric")
        .default(
            Metric::ALL
                .iter()
                .position(|m| *m == pinecone.metric)
                .unwrap_or(0),
        )
        .items(&metrics)
        .interact()?;

    let clouds = &["aws", "gcp", "azure"];
    let cloud_index = Select::new()
        .with_prompt("Serverless cloud")
        .default(clouds.iter().position(|c| *c == pinecone.cloud).unwrap_or(0))
        .items(clouds)
        .interact()?;

    pinecone.set_index_name(index_name)?;
    pinecone.set_dimension(dimension)?;
    pinecone.metric = Metric::ALL[metric_index];
    pinecone.set_cloud(clouds[cloud_index].to_string())?;

    Ok(())
}

fn configure_recommend(recommend: &mut RecommendConfig) -> Result<()> {
    let top_k: usize = Input::new()
        .with_prompt("Recommendations per query")
        .default(recommend.top_k)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=10_000).contains(input) {
                Ok(())
            } else {
                Err("Must be between 1 and 10000")
            }
        })
        .interact_text()?;

    let concurrency: usize = Input::new()
        .with_prompt("Concurrent embedding requests during ingestion")
        .default(recommend.ingest_concurrency)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=64).contains(input) {
                Ok(())
            } else {
                Err("Must be between 1 and 64")
            }
        })
        .interact_text()?;

    recommend.set_top_k(top_k)?;
    recommend.set_ingest_concurrency(concurrency)?;

    Ok(())
}
