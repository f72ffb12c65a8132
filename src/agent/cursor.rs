//! Keyword cursor table - "next paragraph" state for Lookup
//!
//! Session-scoped and explicitly passed: every question gets its own
//! table, so parallel sessions over one index never share history.
//! Keyword matching is exact string equality by design; `Lookup[fox]`
//! and `Lookup[fox.]` are different histories.

use std::collections::HashMap;

use thiserror::Error;

/// Named failure kinds for cursor operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// `advance` was called for a keyword never recorded by a Search
    /// in this session
    #[error("no prior search for keyword {keyword:?}")]
    UnknownKeyword { keyword: String },
}

#[derive(Debug, Clone)]
struct CursorEntry {
    paragraphs: Vec<String>,
    cursor: usize,
}

/// Per-keyword pagination over ranked search results
#[derive(Debug, Default)]
pub struct CursorTable {
    entries: HashMap<String, CursorEntry>,
}

impl CursorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the entry for `keyword` with a fresh ranked list,
    /// cursor at the start. Returns the first paragraph, or `None`
    /// when the list is empty.
    pub fn record_search(&mut self, keyword: &str, ranked: Vec<String>) -> Option<&str> {
        self.entries.insert(
            keyword.to_string(),
            CursorEntry {
                paragraphs: ranked,
                cursor: 0,
            },
        );
        self.entries
            .get(keyword)
            .and_then(|e| e.paragraphs.first())
            .map(|s| s.as_str())
    }

    /// Step to the next paragraph for `keyword`. `None` means the
    /// ranked list is exhausted; the cursor is not advanced past the
    /// end, so repeated calls keep returning `None`.
    pub fn advance(&mut self, keyword: &str) -> Result<Option<&str>, LookupError> {
        let entry = self
            .entries
            .get_mut(keyword)
            .ok_or_else(|| LookupError::UnknownKeyword {
                keyword: keyword.to_string(),
            })?;

        if entry.cursor + 1 >= entry.paragraphs.len() {
            return Ok(None);
        }

        entry.cursor += 1;
        Ok(Some(&entry.paragraphs[entry.cursor]))
    }

    /// Whether a Search has been recorded for this exact keyword
    pub fn contains(&self, keyword: &str) -> bool {
        self.entries.contains_key(keyword)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
