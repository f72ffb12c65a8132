//! Session driver - a question list against one prepared index
//!
//! Each question runs as an independent ReAct session (own transcript,
//! own cursor table) over the shared read-only index, so sessions can
//! run in parallel across questions without interfering. Answers come
//! back one per question, in input order.

use std::sync::Arc;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::agent::ReactAgent;

/// Driver-facing result: one answer per question, in input order
#[derive(Debug, Clone, Serialize)]
pub struct SessionResult {
    pub session_id: String,
    pub document: String,
    pub questions: Vec<String>,
    pub answers: Vec<String>,
}

/// Answer every question in order. `parallel` fans the questions out
/// across rayon workers; answer order still follows question order.
pub fn run_session(
    agent: &ReactAgent,
    identity: &str,
    questions: &[String],
    parallel: bool,
) -> Result<SessionResult> {
    let session_id = uuid::Uuid::new_v4().to_string();
    info!(
        "Session {} over {:?}: {} questions{}",
        session_id,
        identity,
        questions.len(),
        if parallel { " (parallel)" } else { "" }
    );

    let answers: Vec<String> = if parallel {
        questions
            .par_iter()
            .map(|q| agent.answer_question(q))
            .collect::<Result<_>>()?
    } else {
        questions
            .iter()
            .map(|q| agent.answer_question(q))
            .collect::<Result<_>>()?
    };

    Ok(SessionResult {
        session_id,
        document: identity.to_string(),
        questions: questions.to_vec(),
        answers,
    })
}

/// Async wrapper for running a session inside a tokio context
pub async fn run_session_async(
    agent: Arc<ReactAgent>,
    identity: String,
    questions: Vec<String>,
    parallel: bool,
) -> Result<SessionResult> {
    tokio::task::spawn_blocking(move || run_session(&agent, &identity, &questions, parallel))
        .await
        .context("Session task failed")?
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentConfig, CompletionOracle, OracleRequest, ScriptedOracle};
    use crate::embedder::TokenHashEmbedder;
    use crate::index::{IndexStore, SemanticIndex};
    use tempfile::tempdir;

    /// Answers every question by echoing it back through `Finish`,
    /// regardless of interleaving across parallel sessions.
    struct QuestionEchoOracle;

    impl CompletionOracle for QuestionEchoOracle {
        fn complete(&self, request: &OracleRequest) -> Result<String> {
            let question = request
                .context
                .rfind("Question: ")
                .map(|i| &request.context[i + "Question: ".len()..])
                .and_then(|rest| rest.lines().next())
                .unwrap_or("");
            Ok(format!("Echoing.\nAction 1: Finish[{}]", question))
        }
    }

    fn shared_index() -> Arc<SemanticIndex> {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path().to_path_buf());
        let embedder = Arc::new(TokenHashEmbedder::new(128));
        let (index, _) =
            SemanticIndex::prepare("Paris is the capital of France.", "session-test", embedder, &store)
                .unwrap();
        Arc::new(index)
    }

    #[test]
    fn test_answers_follow_question_order() {
        let agent = ReactAgent::new(
            shared_index(),
            Arc::new(ScriptedOracle::new(vec![
                "First question.\nAction 1: Finish[answer one]",
                "Second question.\nAction 1: Finish[answer two]",
            ])),
            AgentConfig::default(),
        );

        let questions = vec!["q1".to_string(), "q2".to_string()];
        let result = run_session(&agent, "session-test", &questions, false).unwrap();

        assert_eq!(result.questions, questions);
        assert_eq!(result.answers, vec!["answer one", "answer two"]);
        assert!(!result.session_id.is_empty());
    }

    #[test]
    fn test_parallel_sessions_do_not_interfere() {
        let agent = ReactAgent::new(
            shared_index(),
            Arc::new(QuestionEchoOracle),
            AgentConfig::default(),
        );

        let questions: Vec<String> = (0..16).map(|i| format!("question {}", i)).collect();
        let result = run_session(&agent, "session-test", &questions, true).unwrap();

        // Each answer matches its own question, in input order
        assert_eq!(result.answers, questions);
    }

    #[test]
    fn test_result_serializes_to_json() {
        let agent = ReactAgent::new(
            shared_index(),
            Arc::new(ScriptedOracle::new(vec!["Done.\nAction 1: Finish[42]"])),
            AgentConfig::default(),
        );

        let result =
            run_session(&agent, "session-test", &["q".to_string()], false).unwrap();
        let json = serde_json::to_string(&result).unwrap();

        assert!(json.contains("\"questions\":[\"q\"]"));
        assert!(json.contains("\"answers\":[\"42\"]"));
    }
}
