//! Doc Sage Library
//!
//! Document question-answering agent: answers natural-language
//! questions over a single text/PDF document by interleaving
//! reasoning steps with retrieval actions against a semantic
//! paragraph index (ReAct loop).
//!
//! # Features
//!
//! - **Semantic Index**: Paragraph embeddings with exact L2 retrieval,
//!   persisted per document and reloaded across runs
//! - **ReAct Loop**: Bounded Thought/Action/Observation iteration with
//!   a deterministic completion oracle
//! - **Fail Soft**: Malformed planner output, missing lookup history,
//!   and oracle transport failures are recovered locally
//! - **Parallel Sessions**: Independent questions fan out over one
//!   shared read-only index
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use doc_sage::{
//!     build_embedder, run_session, AgentConfig, Config, Document, HttpOracle,
//!     IndexStore, ReactAgent, SemanticIndex,
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load();
//!     let doc = Document::load(std::path::Path::new("story.pdf"), None)?;
//!
//!     let embedder = build_embedder(&config.embedding);
//!     let store = IndexStore::new(config.index.store_dir());
//!     let (index, _) = SemanticIndex::prepare(&doc.text, &doc.identity, embedder, &store)?;
//!
//!     let oracle = Arc::new(HttpOracle::new(config.oracle.clone()));
//!     let agent = ReactAgent::new(Arc::new(index), oracle, AgentConfig::default());
//!
//!     let result = run_session(
//!         &agent,
//!         &doc.identity,
//!         &["Where did Clara live?".to_string()],
//!         false,
//!     )?;
//!     println!("{}", result.answers[0]);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod document;
pub mod embedder;
pub mod index;
pub mod session;

// Re-export commonly used types
pub use agent::{
    Action, ActionExecutor, ActionOutcome, AgentConfig, CompletionOracle, CursorTable, HttpOracle,
    LookupError, OracleConfig, OracleRequest, ReactAgent, ScriptedOracle, DATA_NOT_AVAILABLE,
    INSTRUCTION_PROMPT, NO_RESULTS,
};
pub use config::{generate_sample_config, Config, IndexConfig};
pub use document::{normalize_text, Document, DocumentError, DocumentKind};
pub use embedder::{
    build_embedder, euclidean_distance, Embedder, EmbedderBackend, EmbedderConfig, HttpEmbedder,
    TokenHashEmbedder,
};
pub use index::{IndexStore, PrepareOutcome, SearchHit, SemanticIndex};
pub use session::{run_session, run_session_async, SessionResult};
