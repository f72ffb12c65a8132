//! Action parsing and dispatch
//!
//! Grammar: `Verb[Parameter]` with verb one of Search, Lookup, Finish.
//! The parameter is everything strictly between the first `[` and the
//! last `]`. Anything else is a no-op observation rather than an
//! error: one malformed planner output must not end the session.

use anyhow::Result;
use tracing::{debug, warn};

use crate::index::SemanticIndex;

use super::cursor::{CursorTable, LookupError};

/// Observation emitted when a retrieval finds nothing
pub const NO_RESULTS: &str = "No Results";

/// A parsed action expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Search(String),
    Lookup(String),
    Finish(String),
    /// No bracket pair or unknown verb; the raw text is kept for logging
    Malformed(String),
}

impl Action {
    /// Parse one action expression. Never fails; unparseable input
    /// becomes `Malformed`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        let open = match raw.find('[') {
            Some(i) => i,
            None => return Action::Malformed(raw.to_string()),
        };
        let close = match raw.rfind(']') {
            Some(i) if i > open => i,
            _ => return Action::Malformed(raw.to_string()),
        };

        let verb = &raw[..open];
        let param = raw[open + 1..close].to_string();

        match verb {
            "Search" => Action::Search(param),
            "Lookup" => Action::Lookup(param),
            "Finish" => Action::Finish(param),
            _ => Action::Malformed(raw.to_string()),
        }
    }
}

/// Result of executing one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub observation: String,
    pub done: bool,
}

/// Executes parsed actions against the index. Stateless between calls;
/// all side effects land in the caller-owned cursor table.
pub struct ActionExecutor<'a> {
    index: &'a SemanticIndex,
    top_k: usize,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(index: &'a SemanticIndex, top_k: usize) -> Self {
        Self { index, top_k }
    }

    /// Execute one action expression, producing an observation and a
    /// termination flag. Only retrieval failures (embedding transport)
    /// surface as errors.
    pub fn execute(&self, raw: &str, cursors: &mut CursorTable) -> Result<ActionOutcome> {
        match Action::parse(raw) {
            Action::Search(keyword) => {
                let observation = self.search(&keyword, cursors)?;
                Ok(ActionOutcome {
                    observation,
                    done: false,
                })
            }
            Action::Lookup(keyword) => {
                let observation = match cursors.advance(&keyword) {
                    Ok(Some(paragraph)) => paragraph.to_string(),
                    Ok(None) => NO_RESULTS.to_string(),
                    Err(LookupError::UnknownKeyword { .. }) => {
                        // Planner skipped the required Search; degrade
                        // to a fresh Search instead of aborting.
                        warn!("Lookup without prior Search for {:?}, searching instead", keyword);
                        self.search(&keyword, cursors)?
                    }
                };
                Ok(ActionOutcome {
                    observation,
                    done: false,
                })
            }
            Action::Finish(answer) => Ok(ActionOutcome {
                observation: answer,
                done: true,
            }),
            Action::Malformed(raw) => {
                warn!("Planner emitted malformed action: {:?}", raw);
                Ok(ActionOutcome {
                    observation: String::new(),
                    done: false,
                })
            }
        }
    }

    fn search(&self, keyword: &str, cursors: &mut CursorTable) -> Result<String> {
        let hits = self.index.search(keyword, self.top_k)?;

        if hits.is_empty() {
            debug!("Search {:?}: no hits", keyword);
            return Ok(NO_RESULTS.to_string());
        }

        let texts: Vec<String> = hits.into_iter().map(|h| h.text).collect();
        let first = cursors
            .record_search(keyword, texts)
            .unwrap_or(NO_RESULTS)
            .to_string();
        Ok(first)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::TokenHashEmbedder;
    use crate::index::{IndexStore, SemanticIndex};
    use proptest::prelude::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn test_index(document: &str) -> SemanticIndex {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path().to_path_buf());
        let embedder = Arc::new(TokenHashEmbedder::new(256));
        let (index, _) = SemanticIndex::prepare(document, "exec-test", embedder, &store).unwrap();
        index
    }

    #[test]
    fn test_parse_well_formed() {
        assert_eq!(
            Action::parse("Search[Eiffel Tower]"),
            Action::Search("Eiffel Tower".to_string())
        );
        assert_eq!(
            Action::parse("Lookup[fox]"),
            Action::Lookup("fox".to_string())
        );
        assert_eq!(
            Action::parse("Finish[Paris]"),
            Action::Finish("Paris".to_string())
        );
        assert_eq!(Action::parse("Finish[]"), Action::Finish(String::new()));
    }

    #[test]
    fn test_parse_brackets_inside_parameter() {
        // Parameter spans first `[` to last `]`
        assert_eq!(
            Action::parse("Search[High Plains [United States]]"),
            Action::Search("High Plains [United States]".to_string())
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(Action::parse("Bogus"), Action::Malformed(_)));
        assert!(matches!(Action::parse("Search[oops"), Action::Malformed(_)));
        assert!(matches!(Action::parse("Wander[far]"), Action::Malformed(_)));
        assert!(matches!(Action::parse(""), Action::Malformed(_)));
    }

    #[test]
    fn test_finish_terminates_with_payload() {
        let index = test_index("irrelevant text");
        let executor = ActionExecutor::new(&index, 3);
        let mut cursors = CursorTable::new();

        let outcome = executor.execute("Finish[Paris]", &mut cursors).unwrap();
        assert_eq!(outcome.observation, "Paris");
        assert!(outcome.done);
    }

    #[test]
    fn test_search_empty_index_reports_no_results() {
        let index = test_index("   \n  ");
        let executor = ActionExecutor::new(&index, 3);
        let mut cursors = CursorTable::new();

        let outcome = executor
            .execute("Search[Eiffel Tower]", &mut cursors)
            .unwrap();
        assert_eq!(outcome.observation, NO_RESULTS);
        assert!(!outcome.done);
        // No cursor entry was created for the empty result
        assert!(!cursors.contains("Eiffel Tower"));
    }

    #[test]
    fn test_malformed_action_is_noop() {
        let index = test_index("some text");
        let executor = ActionExecutor::new(&index, 3);
        let mut cursors = CursorTable::new();

        let outcome = executor.execute("Bogus", &mut cursors).unwrap();
        assert_eq!(outcome.observation, "");
        assert!(!outcome.done);
    }

    #[test]
    fn test_search_then_lookup_pages_through_results() {
        let index = test_index(
            "the quick brown fox jumps\n\
             a quick brown fox rests\n\
             an unrelated turtle paragraph",
        );
        let executor = ActionExecutor::new(&index, 2);
        let mut cursors = CursorTable::new();

        let first = executor
            .execute("Search[quick brown fox]", &mut cursors)
            .unwrap();
        assert!(!first.observation.is_empty());
        assert_ne!(first.observation, NO_RESULTS);

        let second = executor
            .execute("Lookup[quick brown fox]", &mut cursors)
            .unwrap();
        assert_ne!(second.observation, first.observation);
        assert_ne!(second.observation, NO_RESULTS);

        // Two hits recorded, so the third lookup is exhausted
        let third = executor
            .execute("Lookup[quick brown fox]", &mut cursors)
            .unwrap();
        assert_eq!(third.observation, NO_RESULTS);
    }

    #[test]
    fn test_lookup_without_search_degrades_to_search() {
        let index = test_index("the quick brown fox jumps");
        let executor = ActionExecutor::new(&index, 3);
        let mut cursors = CursorTable::new();

        let outcome = executor
            .execute("Lookup[quick brown fox]", &mut cursors)
            .unwrap();
        assert_eq!(outcome.observation, "the quick brown fox jumps");
        // The fallback search recorded history like a real Search would
        assert!(cursors.contains("quick brown fox"));
    }

    proptest! {
        #[test]
        fn prop_wrapped_parameter_roundtrips(param in "[^\\[\\]]{0,40}") {
            let raw = format!("Search[{}]", param);
            prop_assert_eq!(Action::parse(&raw), Action::Search(param));
        }

        #[test]
        fn prop_bracketless_input_is_malformed(raw in "[^\\[\\]]{0,40}") {
            prop_assert!(matches!(Action::parse(&raw), Action::Malformed(_)));
        }
    }
}
