//! Integration tests for Doc Sage

use std::path::Path;
use std::sync::Arc;

use doc_sage::{
    build_embedder, run_session, run_session_async, AgentConfig, CompletionOracle, Document,
    EmbedderBackend, EmbedderConfig, IndexStore, OracleRequest, PrepareOutcome, ReactAgent,
    ScriptedOracle, SemanticIndex, DATA_NOT_AVAILABLE,
};
use tempfile::tempdir;

const STORY: &str = "\
Clara lived in a small cottage at the edge of the village of Brindlemere.
Every morning she walked to the harbor with her dog Leo.
One summer Clara and Leo sailed to the lighthouse island together.
The lighthouse keeper taught them how to read the old tide charts.
They returned home before the autumn storms arrived.";

fn write_story(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("clara_story.txt");
    std::fs::write(&path, STORY).unwrap();
    path
}

fn offline_embedder_config() -> EmbedderConfig {
    EmbedderConfig {
        backend: EmbedderBackend::TokenHash,
        dimension: 256,
        ..Default::default()
    }
}

fn prepare_index(doc: &Document, store: &IndexStore) -> (SemanticIndex, PrepareOutcome) {
    let embedder = build_embedder(&offline_embedder_config());
    SemanticIndex::prepare(&doc.text, &doc.identity, embedder, store).unwrap()
}

#[test]
fn test_full_question_answering_flow() {
    let dir = tempdir().unwrap();
    let doc_path = write_story(dir.path());

    let doc = Document::load(&doc_path, None).unwrap();
    assert_eq!(doc.identity, "clara_story");

    let store = IndexStore::new(dir.path().join("indexes"));
    let (index, outcome) = prepare_index(&doc, &store);
    assert_eq!(outcome, PrepareOutcome::Rebuilt);
    assert_eq!(index.len(), 5);

    let oracle = Arc::new(ScriptedOracle::new(vec![
        "I need to find where Clara lived.\nAction 1: Search[Clara lived]",
        "The paragraph names the village.\nAction 2: Finish[a cottage near Brindlemere]",
    ]));
    let agent = ReactAgent::new(
        Arc::new(index),
        Arc::clone(&oracle) as Arc<dyn CompletionOracle>,
        AgentConfig::default(),
    );

    let result = run_session(
        &agent,
        &doc.identity,
        &["Where did Clara live?".to_string()],
        false,
    )
    .unwrap();

    assert_eq!(result.answers, vec!["a cottage near Brindlemere"]);
    assert_eq!(oracle.call_count(), 2);

    // The observation fed back to the planner was the real paragraph
    let second_request = &oracle.requests()[1];
    assert!(second_request
        .context
        .contains("Observation 1: Clara lived in a small cottage"));
}

#[test]
fn test_snapshot_reused_across_sessions() {
    let dir = tempdir().unwrap();
    let doc_path = write_story(dir.path());
    let store = IndexStore::new(dir.path().join("indexes"));

    let doc = Document::load(&doc_path, None).unwrap();
    let (_, first) = prepare_index(&doc, &store);
    assert_eq!(first, PrepareOutcome::Rebuilt);

    // Second run against the same identity loads the snapshot
    let (index, second) = prepare_index(&doc, &store);
    assert_eq!(second, PrepareOutcome::Loaded);
    assert_eq!(index.len(), 5);
}

#[test]
fn test_unanswerable_question_hits_iteration_budget() {
    let dir = tempdir().unwrap();
    let doc_path = write_story(dir.path());

    let doc = Document::load(&doc_path, None).unwrap();
    let store = IndexStore::new(dir.path().join("indexes"));
    let (index, _) = prepare_index(&doc, &store);

    // The planner keeps searching for something that is not there
    let oracle = Arc::new(ScriptedOracle::new(vec![
        "Searching.\nAction 1: Search[spaceship engines]",
        "Searching again.\nAction 2: Lookup[spaceship engines]",
        "One more try.\nAction 3: Search[warp drive]",
    ]));
    let agent = ReactAgent::new(
        Arc::new(index),
        oracle,
        AgentConfig {
            max_iterations: 3,
            ..Default::default()
        },
    );

    let result = run_session(
        &agent,
        &doc.identity,
        &["How do the spaceship engines work?".to_string()],
        false,
    )
    .unwrap();

    assert_eq!(result.answers, vec![DATA_NOT_AVAILABLE]);
}

#[tokio::test]
async fn test_async_session_wrapper() {
    let dir = tempdir().unwrap();
    let doc_path = write_story(dir.path());

    let doc = Document::load(&doc_path, None).unwrap();
    let store = IndexStore::new(dir.path().join("indexes"));
    let (index, _) = prepare_index(&doc, &store);

    let oracle = Arc::new(ScriptedOracle::new(vec![
        "Done thinking.\nAction 1: Finish[Leo]",
        "Done thinking.\nAction 1: Finish[the lighthouse keeper]",
    ]));
    let agent = Arc::new(ReactAgent::new(
        Arc::new(index),
        oracle as Arc<dyn CompletionOracle>,
        AgentConfig::default(),
    ));

    let result = run_session_async(
        agent,
        doc.identity.clone(),
        vec![
            "Who walked with Clara?".to_string(),
            "Who taught them the tide charts?".to_string(),
        ],
        false,
    )
    .await
    .unwrap();

    assert_eq!(result.answers, vec!["Leo", "the lighthouse keeper"]);
    assert_eq!(result.questions.len(), result.answers.len());
}

#[test]
fn test_session_result_json_shape() {
    let dir = tempdir().unwrap();
    let doc_path = write_story(dir.path());

    let doc = Document::load(&doc_path, None).unwrap();
    let store = IndexStore::new(dir.path().join("indexes"));
    let (index, _) = prepare_index(&doc, &store);

    let oracle = Arc::new(ScriptedOracle::new(vec!["Ok.\nAction 1: Finish[yes]"]));
    let agent = ReactAgent::new(
        Arc::new(index),
        oracle as Arc<dyn CompletionOracle>,
        AgentConfig::default(),
    );

    let result = run_session(
        &agent,
        &doc.identity,
        &["Did they sail?".to_string()],
        false,
    )
    .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&serde_json::to_string(&result).unwrap()).unwrap();
    assert_eq!(json["document"], "clara_story");
    assert_eq!(json["questions"][0], "Did they sail?");
    assert_eq!(json["answers"][0], "yes");
    assert!(json["session_id"].as_str().is_some());
}

#[test]
fn test_planner_that_ignores_instructions_still_answers() {
    let dir = tempdir().unwrap();
    let doc_path = write_story(dir.path());

    let doc = Document::load(&doc_path, None).unwrap();
    let store = IndexStore::new(dir.path().join("indexes"));
    let (index, _) = prepare_index(&doc, &store);

    // Lookup without a prior Search, then a completion with no action
    // separator, then the corrective action, then a clean finish.
    let oracle = Arc::new(ScriptedOracle::new(vec![
        "Skipping the search step.\nAction 1: Lookup[lighthouse island]",
        "Now I will just ramble without an action line.",
        "Search[tide charts]",
        "Enough.\nAction 3: Finish[they sailed to the lighthouse island]",
    ]));
    let agent = ReactAgent::new(
        Arc::new(index),
        Arc::clone(&oracle) as Arc<dyn CompletionOracle>,
        AgentConfig::default(),
    );

    let result = run_session(
        &agent,
        &doc.identity,
        &["What adventure did Clara and Leo have?".to_string()],
        false,
    )
    .unwrap();

    assert_eq!(result.answers, vec!["they sailed to the lighthouse island"]);
    // 4 completions: three planning calls plus one corrective re-prompt
    assert_eq!(oracle.call_count(), 4);
}

#[test]
fn test_oracle_request_carries_stop_and_cap() {
    let dir = tempdir().unwrap();
    let doc_path = write_story(dir.path());

    let doc = Document::load(&doc_path, None).unwrap();
    let store = IndexStore::new(dir.path().join("indexes"));
    let (index, _) = prepare_index(&doc, &store);

    let oracle = Arc::new(ScriptedOracle::new(vec!["Ok.\nAction 1: Finish[done]"]));
    let agent = ReactAgent::new(
        Arc::new(index),
        Arc::clone(&oracle) as Arc<dyn CompletionOracle>,
        AgentConfig {
            max_tokens: 64,
            ..Default::default()
        },
    );

    run_session(&agent, &doc.identity, &["q".to_string()], false).unwrap();

    let requests: Vec<OracleRequest> = oracle.requests();
    assert_eq!(requests[0].stop, vec!["\nObservation 1:".to_string()]);
    assert_eq!(requests[0].max_tokens, 64);
    assert!(requests[0].context.contains("Question: q"));
}
