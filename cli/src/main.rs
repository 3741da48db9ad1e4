//! CLI entrypoint for llm-council
//!
//! This is the composition root: it loads configuration, constructs the
//! provider gateway and stores, and wires them into the retrieval engine
//! and the deliberation orchestrator via dependency injection.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use council_application::{
    DeliberateInput, Deliberation, DeliberationProgress, NoProgress, RetrievalEngine,
};
use council_domain::DeliberationPhase;
use council_infrastructure::{
    ConfigLoader, FileConfig, JsonlDocumentStore, JsonlTranscriptLogger, JsonlVectorStore,
    OpenAiCompatibleGateway,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "council",
    about = "Pose a question to a panel of models, let them deliberate, get one scored answer",
    version
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Explicit config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the council a question
    Ask {
        question: String,

        /// Ground the deliberation in the document collection
        #[arg(long)]
        rag: bool,

        /// Number of chunks to retrieve with --rag
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Ingest a text file into the document collection
    Ingest {
        file: PathBuf,

        /// Document id (defaults to the file stem)
        #[arg(long)]
        id: Option<String>,

        /// Document title (defaults to the file name)
        #[arg(long)]
        title: Option<String>,

        #[arg(long, default_value = "upload")]
        source: String,

        #[arg(long, default_value = "general")]
        category: String,
    },
    /// Remove a document and all of its index entries
    Remove { id: String },
    /// Search the document collection
    Search {
        query: String,

        #[arg(long)]
        top_k: Option<usize>,
    },
    /// List the council members
    Members,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigLoader::load(cli.config.as_ref())
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to load configuration")?;

    // === Dependency Injection ===
    let gateway = Arc::new(
        OpenAiCompatibleGateway::new(
            &config.provider.base_url,
            config.provider.api_key(),
            &config.provider.embedding_model,
            config.provider.request_timeout(),
        )
        .context("Failed to construct provider gateway")?,
    );

    let data_dir = config.storage.resolve_data_dir();
    let documents = Arc::new(
        JsonlDocumentStore::open(data_dir.join("documents.jsonl"))
            .context("Failed to open document store")?,
    );
    let vectors = Arc::new(
        JsonlVectorStore::open(data_dir.join("vectors.jsonl"))
            .context("Failed to open vector store")?,
    );
    let engine = RetrievalEngine::new(
        Arc::clone(&gateway),
        documents,
        vectors,
        config.retrieval_config(),
    );

    match &cli.command {
        Command::Ask {
            question,
            rag,
            top_k,
        } => {
            let question = question.clone();
            let rag = *rag;
            let top_k = *top_k;
            run_ask(&cli, &config, gateway, &engine, question, rag, top_k).await
        }
        Command::Ingest {
            file,
            id,
            title,
            source,
            category,
        } => {
            let file = file.clone();
            let id = id.clone();
            let title = title.clone();
            let source = source.clone();
            let category = category.clone();
            run_ingest(&cli, &engine, file, id, title, source, category).await
        }
        Command::Remove { id } => {
            engine.remove(id).await.context("Failed to remove document")?;
            println!("Removed document '{}'", id);
            Ok(())
        }
        Command::Search { query, top_k } => {
            let outcome = engine
                .search(query, top_k.unwrap_or(config.retrieval.top_k))
                .await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else if outcome.is_empty() {
                println!("No results.");
            } else {
                println!("{}", outcome.context);
                println!();
                println!("Relevance: {:.2}", outcome.relevance_score);
                for source in &outcome.sources {
                    println!("  - {} ({})", source.title, source.source);
                }
            }
            Ok(())
        }
        Command::Members => {
            let deliberation = Deliberation::new(
                Arc::clone(&gateway),
                config.roster(),
                config.deliberation_config(),
            )
            .context("Invalid council roster")?;
            for member in deliberation.members() {
                println!(
                    "{:<12} {:<16} {:<22} temp {:.1}  {}",
                    member.id,
                    member.persona_name,
                    member.model.to_string(),
                    member.temperature,
                    member.role
                );
            }
            Ok(())
        }
    }
}

async fn run_ask(
    cli: &Cli,
    config: &FileConfig,
    gateway: Arc<OpenAiCompatibleGateway>,
    engine: &RetrievalEngine<OpenAiCompatibleGateway>,
    question: String,
    rag: bool,
    top_k: Option<usize>,
) -> Result<()> {
    let deliberation = Deliberation::new(gateway, config.roster(), config.deliberation_config())
        .context("Invalid council roster")?;

    let mut input = DeliberateInput::new(question.as_str());
    let mut sources = Vec::new();
    if rag {
        let outcome = engine
            .search(&question, top_k.unwrap_or(config.retrieval.top_k))
            .await;
        if !outcome.is_empty() {
            info!(
                sources = outcome.sources.len(),
                relevance = outcome.relevance_score,
                "Grounding deliberation in retrieved context"
            );
            sources = outcome.sources.clone();
            input = input.with_context(outcome.context);
        }
    }

    // Ctrl-C aborts cooperatively; completed stages are still reported
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let progress: Box<dyn DeliberationProgress> = if cli.json {
        Box::new(NoProgress)
    } else {
        Box::new(ConsoleProgress)
    };
    let result = deliberation
        .process_query_cancellable(input, progress.as_ref(), &cancel)
        .await;

    let data_dir = config.storage.resolve_data_dir();
    if let Some(logger) = JsonlTranscriptLogger::new(data_dir.join("transcripts.jsonl")) {
        logger.log(&result);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    println!("{}", result.synthesis_text);
    println!();
    for response in &result.initial_responses {
        let status = if response.success { "ok" } else { "failed" };
        println!(
            "  {:<16} [{:>6}]  confidence {:.0}%  {}",
            response.member_name,
            status,
            response.confidence * 100.0,
            response.reasoning
        );
    }
    if !sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &sources {
            println!("  - {} ({})", source.title, source.source);
        }
    }
    println!();
    println!(
        "Consensus score: {:.2}  ({} reviews, {} ms)",
        result.consensus_score,
        result.peer_reviews.len(),
        result.execution_time_ms
    );
    Ok(())
}

async fn run_ingest(
    cli: &Cli,
    engine: &RetrievalEngine<OpenAiCompatibleGateway>,
    file: PathBuf,
    id: Option<String>,
    title: Option<String>,
    source: String,
    category: String,
) -> Result<()> {
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let id = id.unwrap_or_else(|| {
        file.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string())
    });
    let title = title.unwrap_or_else(|| {
        file.file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| id.clone())
    });

    let summary = engine
        .ingest(&id, &title, &content, &source, &category)
        .await
        .context("Failed to ingest document")?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "id": id,
                "chunks_total": summary.chunks_total,
                "chunks_indexed": summary.chunks_indexed,
            })
        );
    } else {
        println!(
            "Ingested '{}' as {}: {}/{} chunks indexed",
            title, id, summary.chunks_indexed, summary.chunks_total
        );
    }
    Ok(())
}

/// Minimal console progress: one line per phase event, written to stderr
/// so stdout stays clean for the result.
struct ConsoleProgress;

impl DeliberationProgress for ConsoleProgress {
    fn on_phase_start(&self, phase: &DeliberationPhase, total_tasks: usize) {
        eprintln!(">> {} ({} tasks)", phase, total_tasks);
    }

    fn on_task_complete(&self, _phase: &DeliberationPhase, label: &str, success: bool) {
        let marker = if success { "+" } else { "x" };
        eprintln!("   [{}] {}", marker, label);
    }

    fn on_phase_complete(&self, _phase: &DeliberationPhase) {}
}
