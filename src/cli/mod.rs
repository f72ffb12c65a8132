//! CLI module - command line interface definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::document::DocumentKind;

/// Doc Sage - document question-answering agent
///
/// Answers natural-language questions over a single text or PDF
/// document by interleaving reasoning steps with semantic paragraph
/// retrieval.
#[derive(Parser, Debug)]
#[command(name = "doc-sage")]
#[command(author = "Ryan Cashmoney <tunclon@proton.me>")]
#[command(version)]
#[command(about = "📜 Document question-answering agent", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Config file path (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer questions over a document
    Ask(AskArgs),

    /// Build or refresh the persisted index for a document
    Index(IndexArgs),

    /// Show or generate configuration
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct AskArgs {
    /// Document path (.txt or .pdf)
    #[arg(required = true)]
    pub document: PathBuf,

    /// Question to answer (repeatable)
    #[arg(long, short = 'q', required = true)]
    pub question: Vec<String>,

    /// Document kind (default: inferred from extension)
    #[arg(long, value_enum)]
    pub kind: Option<DocumentKind>,

    /// Override the configured iteration budget
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Answer questions in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Emit the session result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct IndexArgs {
    /// Document path (.txt or .pdf)
    #[arg(required = true)]
    pub document: PathBuf,

    /// Document kind (default: inferred from extension)
    #[arg(long, value_enum)]
    pub kind: Option<DocumentKind>,

    /// Discard any existing snapshot and rebuild
    #[arg(long)]
    pub rebuild: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct ConfigArgs {
    /// Print a commented sample config
    #[arg(long)]
    pub sample: bool,
}
