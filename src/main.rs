use std::path::PathBuf;

use clap::{Parser, Subcommand};
use smart_shopper::Result;
use smart_shopper::commands::{ingest_catalog, recommend, run_chat};
use smart_shopper::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "smart-shopper")]
#[command(about = "Product recommendations over an OpenAI-embedded Pinecone catalog")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure OpenAI, Pinecone and recommendation settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Embed a product catalog CSV and store it in Pinecone
    Ingest {
        /// CSV with product_id, product_name, description and image_url columns
        path: PathBuf,
    },
    /// Recommend products for a single query
    Recommend {
        /// What the shopper is looking for
        query: String,
        /// Maximum number of products to return
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Start an interactive recommendation chat
    Chat {
        /// Keep vectors in memory instead of Pinecone
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
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
        Commands::Ingest { path } => {
            ingest_catalog(&path).await?;
        }
        Commands::Recommend { query, top_k } => {
            recommend(&query, top_k).await?;
        }
        Commands::Chat { offline } => {
            run_chat(offline).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn ingest_command_with_path() {
        let cli = Cli::try_parse_from(["smart-shopper", "ingest", "catalog.csv"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ingest { path } = parsed.command {
                assert_eq!(path, PathBuf::from("catalog.csv"));
            }
        }
    }

    #[test]
    fn ingest_requires_path() {
        let cli = Cli::try_parse_from(["smart-shopper", "ingest"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn recommend_command_defaults() {
        let cli = Cli::try_parse_from(["smart-shopper", "recommend", "warm hat"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Recommend { query, top_k } = parsed.command {
                assert_eq!(query, "warm hat");
                assert_eq!(top_k, None);
            }
        }
    }

    #[test]
    fn recommend_command_with_top_k() {
        let cli = Cli::try_parse_from(["smart-shopper", "recommend", "warm hat", "--top-k", "3"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Recommend { top_k, .. } = parsed.command {
                assert_eq!(top_k, Some(3));
            }
        }
    }

    #[test]
    fn chat_offline_flag() {
        let cli = Cli::try_parse_from(["smart-shopper", "chat", "--offline"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Chat { offline } = parsed.command {
                assert!(offline);
            }
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["smart-shopper", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["smart-shopper", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["smart-shopper", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
