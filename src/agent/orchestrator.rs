//! ReAct orchestrator - the bounded plan/act/observe loop
//!
//! One `answer_question` call is one session: a fresh transcript and a
//! fresh cursor table over the shared read-only index. The loop always
//! returns a string - the `Finish` payload on success, a fixed sentinel
//! on iteration exhaustion. Planner misbehavior (malformed output,
//! transport failure) is recovered locally and never ends the session.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::index::SemanticIndex;

use super::action::ActionExecutor;
use super::cursor::CursorTable;
use super::oracle::{CompletionOracle, OracleRequest};
use super::prompt::INSTRUCTION_PROMPT;

/// Final answer when the iteration budget runs out without a `Finish`
pub const DATA_NOT_AVAILABLE: &str = "Data Not Available";

/// Tunables for the reasoning loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Iteration budget per question
    pub max_iterations: usize,
    /// Paragraphs retrieved per Search
    pub top_k: usize,
    /// Output cap per completion request
    pub max_tokens: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            top_k: 3,
            max_tokens: 100,
        }
    }
}

/// Drives the ReAct loop for questions over one prepared index
pub struct ReactAgent {
    index: Arc<SemanticIndex>,
    oracle: Arc<dyn CompletionOracle>,
    config: AgentConfig,
}

impl ReactAgent {
    pub fn new(
        index: Arc<SemanticIndex>,
        oracle: Arc<dyn CompletionOracle>,
        config: AgentConfig,
    ) -> Self {
        Self {
            index,
            oracle,
            config,
        }
    }

    /// Answer one question. Errors surface only from retrieval
    /// (embedding transport or index failure); everything the planner
    /// does wrong is recovered inside the loop.
    pub fn answer_question(&self, question: &str) -> Result<String> {
        let mut transcript = format!("{}Question: {}\n", INSTRUCTION_PROMPT, question);
        let executor = ActionExecutor::new(&self.index, self.config.top_k);
        let mut cursors = CursorTable::new();

        let mut iteration = 0;
        while iteration < self.config.max_iterations {
            iteration += 1;
            debug!("Iteration {} for {:?}", iteration, question);

            let (thought, action) = self.plan_step(&transcript, iteration);
            let outcome = executor.execute(&action, &mut cursors)?;

            // The step record lands in the transcript whether or not
            // the action made sense; the planner sees its own misfires.
            transcript.push_str(&format!(
                "Thought {n}: {thought}\nAction {n}: {action}\nObservation {n}: {observation}\n",
                n = iteration,
                thought = thought,
                action = action,
                observation = outcome.observation,
            ));

            if outcome.done {
                info!("Question answered in {} iterations", iteration);
                return Ok(outcome.observation);
            }
        }

        info!(
            "Iteration budget ({}) exhausted for {:?}",
            self.config.max_iterations, question
        );
        Ok(DATA_NOT_AVAILABLE.to_string())
    }

    /// One planning step: request thought+action in a single completion,
    /// falling back to a second, narrower request for just the action
    /// when the completion does not follow the expected shape.
    fn plan_step(&self, transcript: &str, iteration: usize) -> (String, String) {
        let completion = self.complete_or_empty(
            format!("{}Thought {}:", transcript, iteration),
            vec![format!("\nObservation {}:", iteration)],
        );

        let separator = format!("\nAction {}: ", iteration);
        if let Some((thought, action)) = completion.trim().split_once(&separator) {
            return (thought.trim().to_string(), action.trim().to_string());
        }

        // Separator missing: keep the first line as the thought and
        // re-prompt for the action alone, stopping at the line break.
        let thought = completion.trim().lines().next().unwrap_or("").to_string();
        warn!(
            "Planner output missing action separator at iteration {}, re-prompting",
            iteration
        );

        let action = self
            .complete_or_empty(
                format!(
                    "{}Thought {n}: {}\nAction {n}:",
                    transcript,
                    thought,
                    n = iteration
                ),
                vec!["\n".to_string()],
            )
            .trim()
            .to_string();

        (thought, action)
    }

    /// Transport failures degrade to an empty completion, which the
    /// parser treats as malformed planner output.
    fn complete_or_empty(&self, context: String, stop: Vec<String>) -> String {
        let request = OracleRequest {
            context,
            stop,
            max_tokens: self.config.max_tokens,
        };
        match self.oracle.complete(&request) {
            Ok(text) => text,
            Err(e) => {
                warn!("Completion request failed: {:#}", e);
                String::new()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
