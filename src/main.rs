//! Doc Sage - document question-answering agent
//!
//! Answers natural-language questions over a single text/PDF document
//! by interleaving reasoning steps with semantic paragraph retrieval.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use doc_sage::cli::{AskArgs, Cli, Commands, ConfigArgs, IndexArgs};
use doc_sage::{
    build_embedder, generate_sample_config, run_session_async, Config, Document, HttpOracle,
    IndexStore, PrepareOutcome, ReactAgent, SemanticIndex,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(EnvFilter::from_default_env().add_directive("doc_sage=info".parse()?))
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load(),
    };

    match cli.command {
        Commands::Ask(args) => ask(&config, args).await?,
        Commands::Index(args) => index(&config, args)?,
        Commands::Config(args) => show_config(args)?,
    }

    Ok(())
}

async fn ask(config: &Config, args: AskArgs) -> Result<()> {
    let doc = Document::load(&args.document, args.kind)?;

    let embedder = build_embedder(&config.embedding);
    let store = IndexStore::new(config.index.store_dir());
    let (index, outcome) = SemanticIndex::prepare(&doc.text, &doc.identity, embedder, &store)?;

    if outcome == PrepareOutcome::Rebuilt {
        println!(
            "Indexed {} ({} paragraphs)",
            doc.identity.bold(),
            index.len()
        );
    }

    let mut agent_config = config.agent.clone();
    if let Some(max_iterations) = args.max_iterations {
        agent_config.max_iterations = max_iterations;
    }

    let oracle = Arc::new(HttpOracle::new(config.oracle.clone()));
    let agent = Arc::new(ReactAgent::new(Arc::new(index), oracle, agent_config));

    let result = run_session_async(
        agent,
        doc.identity.clone(),
        args.question.clone(),
        args.parallel,
    )
    .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for (question, answer) in result.questions.iter().zip(result.answers.iter()) {
            println!("{} {}", "Q:".cyan().bold(), question);
            println!("{} {}\n", "A:".green().bold(), answer);
        }
    }

    Ok(())
}

fn index(config: &Config, args: IndexArgs) -> Result<()> {
    let doc = Document::load(&args.document, args.kind)?;

    let store = IndexStore::new(config.index.store_dir());
    if args.rebuild {
        store.clear(&doc.identity)?;
    }

    let embedder = build_embedder(&config.embedding);
    let (index, outcome) = SemanticIndex::prepare(&doc.text, &doc.identity, embedder, &store)?;

    match outcome {
        PrepareOutcome::Rebuilt => println!(
            "Built index {} ({} paragraphs)",
            doc.identity.bold(),
            index.len()
        ),
        PrepareOutcome::Loaded => println!(
            "Index {} is up to date ({} paragraphs)",
            doc.identity.bold(),
            index.len()
        ),
    }

    Ok(())
}

fn show_config(args: ConfigArgs) -> Result<()> {
    if args.sample {
        print!("{}", generate_sample_config());
        return Ok(());
    }

    let path = Config::default_path();
    println!("Config path: {}", path.display());
    println!(
        "Status: {}",
        if Config::exists() {
            "present".green().to_string()
        } else {
            "not created (defaults in effect)".yellow().to_string()
        }
    );

    Ok(())
}
