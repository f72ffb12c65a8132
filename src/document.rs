//! Document loading - txt/PDF to normalized paragraph text
//!
//! Produces the single normalized string the index consumes: one
//! paragraph per line, soft line breaks merged. A line break is kept
//! only when the preceding line ends a sentence or the break is part
//! of a blank-line paragraph separator; everything else is a wrap
//! artifact and becomes a space.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;

/// Supported source document kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DocumentKind {
    /// Plain UTF-8 text
    Txt,
    /// PDF (text extracted per page)
    Pdf,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Txt => write!(f, "txt"),
            DocumentKind::Pdf => write!(f, "pdf"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unsupported document type: {extension:?}")]
    UnsupportedType { extension: String },
}

/// A loaded, normalized document plus the identity its index is filed under
#[derive(Debug, Clone)]
pub struct Document {
    /// Normalized text, paragraphs separated by newlines
    pub text: String,
    /// Index identity, derived from the filename stem
    pub identity: String,
}

impl Document {
    /// Load a document from disk, inferring the kind from the file
    /// extension unless one is given explicitly.
    pub fn load(path: &Path, kind: Option<DocumentKind>) -> Result<Self> {
        let kind = match kind {
            Some(k) => k,
            None => infer_kind(path)?,
        };

        info!("Loading {} document: {}", kind, path.display());

        let raw = match kind {
            DocumentKind::Txt => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read document: {}", path.display()))?,
            DocumentKind::Pdf => pdf_extract::extract_text(path)
                .with_context(|| format!("Failed to extract PDF text: {}", path.display()))?,
        };

        let text = normalize_text(&raw);
        debug!("Document normalized: {} chars", text.len());

        let identity = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());

        Ok(Self { text, identity })
    }

    /// Wrap an already-normalized string (tests, embedded documents)
    pub fn from_text(text: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            text: normalize_text(&text.into()),
            identity: identity.into(),
        }
    }
}

fn infer_kind(path: &Path) -> Result<DocumentKind> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "text" | "md" => Ok(DocumentKind::Txt),
        "pdf" => Ok(DocumentKind::Pdf),
        _ => Err(DocumentError::UnsupportedType { extension }.into()),
    }
}

/// NFC-normalize and merge soft-wrapped lines into paragraphs.
///
/// A single newline is replaced with a space when the previous line
/// does not end with sentence punctuation and the next line is not
/// blank. Blank lines act as hard paragraph separators.
pub fn normalize_text(raw: &str) -> String {
    let text: String = raw.nfc().collect();
    let lines: Vec<&str> = text.lines().collect();

    let mut out = String::with_capacity(text.len());
    for (i, line) in lines.iter().enumerate() {
        out.push_str(line);

        if i + 1 == lines.len() {
            break;
        }

        let ends_sentence = line
            .trim_end()
            .chars()
            .last()
            .map(|c| matches!(c, '.' | '!' | '?'))
            .unwrap_or(false);
        let next_blank = lines[i + 1].trim().is_empty();

        if !ends_sentence && !next_blank && !line.trim().is_empty() {
            out.push(' ');
        } else {
            out.push('\n');
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
