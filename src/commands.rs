use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use crate::config::{Config, Credentials, PartialCredentials, RecommendConfig};
use crate::index::InMemoryIndex;
use crate::recommender::{IngestError, IngestReport, Recommendation, Recommender, Services};
use crate::session::{ConversationTurn, Session};

/// Embed a catalog file and store it in the configured index
#[inline]
pub async fn ingest_catalog(path: &Path) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let credentials = load_credentials(false)?;
    let recommender = Recommender::new(Services::from_config(&config), &config);

    info!("Ingesting catalog {}", path.display());

    let outcome = recommender.ingest_catalog(path, &credentials).await;
    report_ingest(outcome)?;

    Ok(())
}

/// Print an ingestion outcome. Failures are printed and then returned as errors.
fn report_ingest(outcome: Result<IngestReport, IngestError>) -> Result<IngestReport> {
    match outcome {
        Ok(report) => {
            println!("{}", style(report.status_message()).green());
            println!("  Index: {}", report.index_name);
            if report.created_index {
                println!("  Created index on first use");
            }
            println!("  Rows read: {}", report.rows);
            println!("  Records written: {}", report.written);
            if !report.skipped.is_empty() {
                println!("  Skipped rows: {}", report.skipped.len());
                for row in &report.skipped {
                    println!("    {}: {}", row.product_id, row.error);
                }
            }
            Ok(report)
        }
        Err(e) => {
            error!("Ingestion failed: {}", e);
            println!("{}", style(e.status_message()).red());
            println!("  Cause: {}", e);
            anyhow::bail!("{}", e.status_message())
        }
    }
}

/// One-shot recommendation and reply for `query`
#[inline]
pub async fn recommend(query: &str, top_k: Option<usize>) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let top_k = resolve_top_k(top_k, &config.recommend)?;
    let credentials = load_credentials(false)?;
    let recommender = Recommender::new(Services::from_config(&config), &config);

    let recommendations = recommender
        .recommend_products(query, &credentials, top_k)
        .await;
    let reply = recommender
        .generate_contextual_message(query, &recommendations, &credentials)
        .await;

    print_gallery(&recommendations);
    println!();
    println!("{}", reply);

    Ok(())
}

/// A `--top-k` override checked against the same bounds as the config value
fn resolve_top_k(requested: Option<usize>, defaults: &RecommendConfig) -> Result<usize> {
    let mut recommend = defaults.clone();
    if let Some(top_k) = requested {
        recommend
            .set_top_k(top_k)
            .context("Invalid --top-k value")?;
    }
    Ok(recommend.top_k)
}

/// Interactive chat session on stdin
#[inline]
pub async fn run_chat(offline: bool) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let credentials = load_credentials(offline)?;
    let services = if offline {
        info!("Using a process-local index; uploaded catalogs last until exit");
        Services::with_local_index(&config, Arc::new(InMemoryIndex::new()))
    } else {
        Services::from_config(&config)
    };
    let mut session = Session::new(Recommender::new(services, &config), credentials);

    for turn in session.conversation().history() {
        print_turn(turn);
    }
    eprintln!(
        "{}",
        style("Commands: /upload <path>, /clear, /help, /quit").dim()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines
            .next_line()
            .await
            .context("Failed to read from stdin")?
        else {
            break;
        };

        match ChatCommand::parse(&line) {
            ChatCommand::Empty => {}
            ChatCommand::Quit => break,
            ChatCommand::Help => {
                eprintln!("  /upload <path>  ingest a product catalog CSV");
                eprintln!("  /clear          start the conversation over");
                eprintln!("  /quit           leave the chat");
            }
            ChatCommand::Clear => {
                session.clear();
                for turn in session.conversation().history() {
                    print_turn(turn);
                }
            }
            ChatCommand::Upload(None) => {
                eprintln!("{}", style("Usage: /upload <path>").yellow());
            }
            ChatCommand::Upload(Some(path)) => {
                let status = session.upload_catalog(&path).await;
                println!("{}", style(status).bold());
            }
            ChatCommand::Query(text) => {
                session.set_input(text);
                let turn = session.submit_query().await.clone();
                print_gallery(session.conversation().gallery());
                println!("{} {}", style("bot>").cyan().bold(), turn.assistant_text);
            }
        }
    }

    Ok(())
}

/// A line typed into the chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatCommand {
    Empty,
    Quit,
    Help,
    Clear,
    Upload(Option<PathBuf>),
    Query(String),
}

impl ChatCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }

        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match command {
            "/quit" | "/exit" => Self::Quit,
            "/help" => Self::Help,
            "/clear" => Self::Clear,
            "/upload" => {
                let rest = rest.trim();
                Self::Upload((!rest.is_empty()).then(|| Path::new(rest).to_path_buf()))
            }
            _ => Self::Query(line.to_string()),
        }
    }
}

/// Environment first, then hidden terminal prompts. Offline runs need no Pinecone secrets.
fn load_credentials(offline: bool) -> Result<Credentials> {
    let mut partial = PartialCredentials::from_env();
    if offline {
        partial.pinecone_api_key.get_or_insert_default();
        partial
            .pinecone_region
            .get_or_insert_with(|| "local".to_string());
    }
    partial
        .complete_interactively()
        .context("Failed to collect credentials")
}

fn prompt() -> Result<()> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{} ", style("you>").green().bold())?;
    stderr.flush()?;
    Ok(())
}

fn print_turn(turn: &ConversationTurn) {
    println!("{} {}", style("you>").green().bold(), turn.user_text);
    println!("{} {}", style("bot>").cyan().bold(), turn.assistant_text);
}

fn print_gallery(recommendations: &[Recommendation]) {
    if recommendations.is_empty() {
        println!("{}", style("No matching products found.").dim());
        return;
    }

    println!("Recommended products ({}):", recommendations.len());
    for recommendation in recommendations {
        println!(
            "  {} {}",
            style(&recommendation.label).bold(),
            style(&recommendation.image_url).dim()
        );
    }
}
