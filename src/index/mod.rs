//! Semantic Index - paragraph vectors with exact nearest-neighbor search
//!
//! Turns a normalized document into a queryable vector index:
//! - Splits on newlines, one paragraph per non-blank line
//! - Embeds every paragraph once at build time (rayon + progress bar)
//! - Ranked L2 similarity queries, exact flat scan
//! - Snapshot persistence: bincode vector table (fast) plus a JSON
//!   paragraph file (human-debuggable), both required to count as
//!   loadable; absence of either triggers a full rebuild

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embedder::{euclidean_distance, Embedder};

/// Whether `prepare` found a usable snapshot or had to build one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareOutcome {
    /// Snapshot existed and was loaded; nothing was re-embedded
    Loaded,
    /// Document was split, embedded, indexed, and persisted
    Rebuilt,
}

/// One ranked search hit
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Original paragraph text
    pub text: String,
    /// Euclidean distance to the query (lower is closer)
    pub distance: f32,
}

// ============================================================================
// Snapshot Store
// ============================================================================

/// Serialized vector table (bincode)
#[derive(Debug, Serialize, Deserialize)]
struct VectorTable {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

/// Serialized paragraph sequence + metadata (JSON)
#[derive(Debug, Serialize, Deserialize)]
struct ParagraphSnapshot {
    version: u32,
    identity: String,
    backend: String,
    dimension: usize,
    built_at: DateTime<Utc>,
    paragraphs: Vec<String>,
}

const SNAPSHOT_VERSION: u32 = 1;

/// Manages on-disk index snapshots, one pair of artifacts per identity
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Default snapshot directory under the platform data dir
    pub fn default_dir() -> PathBuf {
        directories::ProjectDirs::from("com", "tunclon", "doc-sage")
            .map(|dirs| dirs.data_dir().join("indexes"))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".doc-sage")
                    .join("indexes")
            })
    }

    fn artifact_paths(&self, identity: &str) -> (PathBuf, PathBuf) {
        let hash = hex::encode(&blake3::hash(identity.as_bytes()).as_bytes()[..8]);
        (
            self.dir.join(format!("{}.vec", hash)),
            self.dir.join(format!("{}.paragraphs.json", hash)),
        )
    }

    /// True when both snapshot artifacts are present for this identity
    pub fn exists(&self, identity: &str) -> bool {
        let (vec_path, para_path) = self.artifact_paths(identity);
        vec_path.exists() && para_path.exists()
    }

    /// Delete the snapshot for an identity, if any
    pub fn clear(&self, identity: &str) -> Result<()> {
        let (vec_path, para_path) = self.artifact_paths(identity);
        for path in [vec_path, para_path] {
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove snapshot: {}", path.display()))?;
            }
        }
        Ok(())
    }

    /// Load a snapshot. Returns `None` when either artifact is absent or
    /// the snapshot version is stale; a present-but-unreadable snapshot
    /// is an error, never silently rebuilt over.
    fn load(&self, identity: &str) -> Result<Option<(Vec<String>, Vec<Vec<f32>>, usize)>> {
        let (vec_path, para_path) = self.artifact_paths(identity);

        if !vec_path.exists() || !para_path.exists() {
            return Ok(None);
        }

        let para_data = fs::read_to_string(&para_path)
            .with_context(|| format!("Failed to read paragraph snapshot: {}", para_path.display()))?;
        let snapshot: ParagraphSnapshot = serde_json::from_str(&para_data)
            .with_context(|| format!("Failed to parse paragraph snapshot: {}", para_path.display()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            warn!(
                "Snapshot version mismatch for {}: expected {}, found {}. Rebuilding.",
                identity, SNAPSHOT_VERSION, snapshot.version
            );
            return Ok(None);
        }

        let vec_data = fs::read(&vec_path)
            .with_context(|| format!("Failed to read vector table: {}", vec_path.display()))?;
        let table: VectorTable = bincode::deserialize(&vec_data)
            .with_context(|| format!("Failed to parse vector table: {}", vec_path.display()))?;

        if table.vectors.len() != snapshot.paragraphs.len() {
            bail!(
                "Snapshot corrupt for {}: {} vectors vs {} paragraphs",
                identity,
                table.vectors.len(),
                snapshot.paragraphs.len()
            );
        }

        info!(
            "Loaded index snapshot: {} ({} paragraphs, dim={})",
            identity,
            snapshot.paragraphs.len(),
            table.dimension
        );

        Ok(Some((snapshot.paragraphs, table.vectors, table.dimension)))
    }

    /// Persist both artifacts atomically (write-to-temp, then rename)
    fn save(
        &self,
        identity: &str,
        backend: &str,
        paragraphs: &[String],
        vectors: &[Vec<f32>],
        dimension: usize,
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create index dir: {}", self.dir.display()))?;

        let (vec_path, para_path) = self.artifact_paths(identity);

        let table = VectorTable {
            dimension,
            vectors: vectors.to_vec(),
        };
        let vec_tmp = vec_path.with_extension("tmp");
        let encoded = bincode::serialize(&table).context("Failed to serialize vector table")?;
        fs::write(&vec_tmp, encoded)
            .with_context(|| format!("Failed to write vector table: {}", vec_tmp.display()))?;
        fs::rename(&vec_tmp, &vec_path)?;

        let snapshot = ParagraphSnapshot {
            version: SNAPSHOT_VERSION,
            identity: identity.to_string(),
            backend: backend.to_string(),
            dimension,
            built_at: Utc::now(),
            paragraphs: paragraphs.to_vec(),
        };
        let para_tmp = para_path.with_extension("tmp");
        let json = serde_json::to_string_pretty(&snapshot)
            .context("Failed to serialize paragraph snapshot")?;
        fs::write(&para_tmp, json)
            .with_context(|| format!("Failed to write paragraph snapshot: {}", para_tmp.display()))?;
        fs::rename(&para_tmp, &para_path)?;

        debug!("Snapshot saved: {} -> {}", identity, vec_path.display());
        Ok(())
    }
}

// ============================================================================
// Semantic Index
// ============================================================================

/// Read-only after `prepare`; safe to share across question sessions
pub struct SemanticIndex {
    paragraphs: Vec<String>,
    vectors: Vec<Vec<f32>>,
    embedder: Arc<dyn Embedder>,
}

impl SemanticIndex {
    /// Load the persisted index for `identity`, or split/embed/build/persist
    /// when no usable snapshot exists. Idempotent: a second call with an
    /// unchanged snapshot performs no re-embedding.
    ///
    /// Builds for the same identity are serialized through an
    /// identity-scoped lock so concurrent sessions cannot race on the
    /// snapshot files.
    pub fn prepare(
        document: &str,
        identity: &str,
        embedder: Arc<dyn Embedder>,
        store: &IndexStore,
    ) -> Result<(Self, PrepareOutcome)> {
        let lock = build_lock(identity);
        let _guard = lock.lock();

        if let Some((paragraphs, vectors, _dimension)) = store.load(identity)? {
            return Ok((
                Self {
                    paragraphs,
                    vectors,
                    embedder,
                },
                PrepareOutcome::Loaded,
            ));
        }

        info!("No snapshot for {}, building index", identity);

        let paragraphs: Vec<String> = document
            .split('\n')
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(|p| p.to_string())
            .collect();

        let pb = ProgressBar::new(paragraphs.len() as u64).with_style(
            ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message("Embedding paragraphs");

        let vectors: Vec<Vec<f32>> = paragraphs
            .par_iter()
            .progress_with(pb)
            .map(|p| embedder.embed(p))
            .collect::<Result<_>>()
            .context("Failed to embed document paragraphs")?;

        store.save(
            identity,
            embedder.backend(),
            &paragraphs,
            &vectors,
            embedder.dimension(),
        )?;

        info!(
            "Index built: {} ({} paragraphs, backend={})",
            identity,
            paragraphs.len(),
            embedder.backend()
        );

        Ok((
            Self {
                paragraphs,
                vectors,
                embedder,
            },
            PrepareOutcome::Rebuilt,
        ))
    }

    /// Ranked similarity query. Returns up to `top_k` hits ascending by
    /// distance; an empty index yields an empty result, never an error.
    /// Embedding failure surfaces as a retrieval error for this call only.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        if self.vectors.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(query)
            .with_context(|| format!("Failed to embed query: {:?}", query))?;

        let mut hits: Vec<SearchHit> = self
            .vectors
            .par_iter()
            .enumerate()
            .map(|(i, v)| SearchHit {
                text: self.paragraphs[i].clone(),
                distance: euclidean_distance(&query_vector, v),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);

        debug!("Search {:?}: {} hits", query, hits.len());
        Ok(hits)
    }

    /// Number of indexed paragraphs
    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

/// Per-identity build locks. `prepare` for one identity at a time;
/// different identities build freely in parallel.
fn build_lock(identity: &str) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<Mutex<HashMap<String, Arc<Mutex<()>>>>> = OnceLock::new();
    let locks = LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    locks
        .lock()
        .entry(identity.to_string())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

// ============================================================================
// Tests
// ============================================================================
