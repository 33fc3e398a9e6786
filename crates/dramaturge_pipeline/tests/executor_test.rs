//! Integration tests for the stage executor, driven by a scripted mock
//! driver.

use async_trait::async_trait;
use dramaturge_core::{GenerateRequest, GenerateResponse, Role, Scene, Script, SetupPayoff};
use dramaturge_error::{BackendError, DramaturgeResult};
use dramaturge_interface::AnalysisDriver;
use dramaturge_pipeline::{PipelineConfig, RETRY_CAP, Stage, StageExecutor};
use serde_json::json;
use std::sync::Mutex;

/// Replays a fixed sequence of responses; `Err` entries simulate
/// backend failures.
struct MockDriver {
    responses: Mutex<Vec<Result<String, String>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl MockDriver {
    fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request(&self, index: usize) -> GenerateRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl AnalysisDriver for MockDriver {
    async fn generate(&self, req: &GenerateRequest) -> DramaturgeResult<GenerateResponse> {
        self.requests.lock().unwrap().push(req.clone());
        let next = self.responses.lock().unwrap().remove(0);
        match next {
            Ok(text) => Ok(GenerateResponse { text }),
            Err(message) => Err(BackendError::new(message).into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

fn scene(id: &str, mission: &str, setup_for: &[&str], payoff_from: &[&str]) -> Scene {
    Scene {
        scene_id: id.to_string(),
        setting: "Office".to_string(),
        characters: vec!["Alice".to_string(), "Victor".to_string()],
        scene_mission: mission.to_string(),
        key_events: vec![],
        info_change: vec![],
        relation_change: vec![],
        key_object: vec![],
        setup_payoff: SetupPayoff {
            setup_for: setup_for.iter().map(|s| s.to_string()).collect(),
            payoff_from: payoff_from.iter().map(|s| s.to_string()).collect(),
        },
        performance_notes: vec![],
        visual_actions: vec![],
    }
}

/// A script with an intact setup/payoff chain, so Stage 3 skips the
/// model entirely.
fn clean_script() -> Script {
    Script {
        scenes: vec![
            scene("S01", "Alice pitches the funding plan", &["S02"], &[]),
            scene("S02", "The funding vote happens", &[], &["S01"]),
        ],
    }
}

/// A script with a one-directional setup link for Stage 3 to fix.
fn broken_script() -> Script {
    Script {
        scenes: vec![
            scene("S01", "Alice pitches the funding plan", &["S02"], &[]),
            scene("S02", "The funding vote happens", &[], &[]),
        ],
    }
}

fn discoverer_response() -> String {
    json!({
        "tccs": [{
            "tcc_id": "TCC_01",
            "super_objective": "Secure the startup funding",
            "core_conflict_type": "interpersonal",
            "evidence_scenes": ["S01", "S02"],
            "confidence": 0.9
        }],
        "metadata": {
            "total_scenes_analyzed": 2,
            "primary_evidence_available": true,
            "fallback_mode": false
        }
    })
    .to_string()
}

fn auditor_response() -> String {
    json!({
        "rankings": {
            "a_line": {
                "tcc_id": "TCC_01",
                "super_objective": "Secure the startup funding",
                "spine_score": 5.5,
                "reasoning": {
                    "scene_count": 2,
                    "setup_payoff_density": 1.0,
                    "drives_climax": true
                },
                "forces": {
                    "protagonist": "Alice",
                    "primary_antagonist": "Victor"
                }
            },
            "b_lines": [],
            "c_lines": []
        },
        "metrics": {
            "total_scenes": 2,
            "a_line_coverage": 1.0,
            "b_line_coverage": 0.0,
            "c_line_coverage": 0.0
        }
    })
    .to_string()
}

fn modifier_response() -> String {
    json!({
        "modified_script": {
            "scenes": [
                {
                    "scene_id": "S01",
                    "setting": "Office",
                    "characters": ["Alice", "Victor"],
                    "scene_mission": "Alice pitches the funding plan",
                    "setup_payoff": {"setup_for": ["S02"], "payoff_from": []}
                },
                {
                    "scene_id": "S02",
                    "setting": "Office",
                    "characters": ["Alice", "Victor"],
                    "scene_mission": "The funding vote happens",
                    "setup_payoff": {"setup_for": [], "payoff_from": ["S01"]}
                }
            ]
        },
        "modification_log": [{
            "issue_id": "ISS_001",
            "applied": true,
            "scene_id": "S02",
            "field": "setup_payoff.payoff_from",
            "change_type": "append",
            "old_value": [],
            "new_value": ["S01"]
        }],
        "validation": {
            "total_issues": 1,
            "fixed": 1,
            "skipped": 0,
            "new_issues_introduced": 0
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_happy_path_with_clean_script_skips_modifier_call() {
    let driver = MockDriver::new(vec![Ok(discoverer_response()), Ok(auditor_response())]);
    let executor = StageExecutor::new(driver, PipelineConfig::default());

    let run = executor.run(&clean_script()).await;

    assert_eq!(run.final_stage, Some(Stage::Done));
    assert!(run.is_complete());
    assert_eq!(run.retry_count, 0);
    assert!(run.errors.is_empty());

    // Stage 3 synthesized a zero-count output without a model call.
    let modifier = run.modifier_output.unwrap();
    assert_eq!(modifier.validation.total_issues, 0);
    assert!(modifier.modification_log.is_empty());
    assert_eq!(modifier.modified_script, clean_script());
    assert_eq!(executor.driver().calls(), 2);
    assert_eq!(run.metrics.total_model_calls(), 2);
    assert_eq!(run.metrics.model_calls_for(Stage::Modify), 0);
}

#[tokio::test]
async fn test_broken_chain_reaches_modifier() {
    let driver = MockDriver::new(vec![
        Ok(discoverer_response()),
        Ok(auditor_response()),
        Ok(modifier_response()),
    ]);
    let executor = StageExecutor::new(driver, PipelineConfig::default());

    let run = executor.run(&broken_script()).await;

    assert_eq!(run.final_stage, Some(Stage::Done));
    assert_eq!(executor.driver().calls(), 3);

    let modifier = run.modifier_output.unwrap();
    assert_eq!(modifier.validation.fixed, 1);
    assert_eq!(
        modifier.modified_script.scenes[1].setup_payoff.payoff_from,
        vec!["S01"]
    );

    // The Modifier request carries the synthesized audit report.
    let request = executor.driver().request(2);
    assert_eq!(request.messages[0].role, Role::System);
    assert!(request.messages[1].content.contains("ISS_001"));
    assert!(request.messages[1].content.contains("broken_setup_payoff"));
}

#[tokio::test]
async fn test_fenced_and_prose_wrapped_output_accepted() {
    let fenced = format!("Here is my analysis:\n```json\n{}\n```\nDone!", discoverer_response());
    let driver = MockDriver::new(vec![Ok(fenced), Ok(auditor_response())]);
    let executor = StageExecutor::new(driver, PipelineConfig::default());

    let run = executor.run(&clean_script()).await;
    assert_eq!(run.final_stage, Some(Stage::Done));
    assert_eq!(run.retry_count, 0);
}

#[tokio::test]
async fn test_invalid_output_retried_then_succeeds() {
    let driver = MockDriver::new(vec![
        Ok("I cannot find any conflicts.".to_string()),
        Ok(discoverer_response()),
        Ok(auditor_response()),
    ]);
    let executor = StageExecutor::new(driver, PipelineConfig::default());

    let run = executor.run(&clean_script()).await;

    assert_eq!(run.final_stage, Some(Stage::Done));
    assert_eq!(run.retry_count, 1);
    assert_eq!(run.errors.len(), 1);
    assert!(run.errors[0].starts_with("discover error:"));
    assert_eq!(run.metrics.model_calls_for(Stage::Discover), 2);
}

#[tokio::test]
async fn test_retry_budget_exhaustion_fails_run() {
    let driver = MockDriver::new(vec![
        Err("503 Service Unavailable".to_string()),
        Err("503 Service Unavailable".to_string()),
        Err("503 Service Unavailable".to_string()),
    ]);
    let executor = StageExecutor::new(driver, PipelineConfig::default());

    let run = executor.run(&clean_script()).await;

    assert_eq!(run.final_stage, Some(Stage::Failed));
    assert!(!run.is_complete());
    assert!(run.discoverer_output.is_none());
    assert_eq!(run.retry_count, RETRY_CAP);
    assert_eq!(run.errors.len(), RETRY_CAP as usize);
    assert_eq!(executor.driver().calls(), RETRY_CAP as usize);
}

#[tokio::test]
async fn test_retry_budget_shared_across_stages() {
    // One failure in Discover, two in Audit: the shared counter hits
    // the cap and the run fails without a fourth attempt.
    let driver = MockDriver::new(vec![
        Err("timeout".to_string()),
        Ok(discoverer_response()),
        Err("timeout".to_string()),
        Err("timeout".to_string()),
    ]);
    let executor = StageExecutor::new(driver, PipelineConfig::default());

    let run = executor.run(&clean_script()).await;

    assert_eq!(run.final_stage, Some(Stage::Failed));
    assert_eq!(run.retry_count, RETRY_CAP);
    assert!(run.discoverer_output.is_some());
    assert!(run.auditor_output.is_none());
    assert_eq!(executor.driver().calls(), 4);
}

#[tokio::test]
async fn test_mirror_threads_merged_before_audit() {
    let mirrored = json!({
        "tccs": [
            {
                "tcc_id": "TCC_01",
                "super_objective": "Alice wants to achieve the funding vote",
                "core_conflict_type": "interpersonal",
                "evidence_scenes": ["S01", "S02"],
                "confidence": 0.9
            },
            {
                "tcc_id": "TCC_02",
                "super_objective": "Victor moves to stop the funding vote",
                "core_conflict_type": "interpersonal",
                "evidence_scenes": ["S01", "S02"],
                "confidence": 0.7
            }
        ],
        "metadata": {
            "total_scenes_analyzed": 2,
            "primary_evidence_available": true,
            "fallback_mode": false
        }
    })
    .to_string();
    let driver = MockDriver::new(vec![Ok(mirrored), Ok(auditor_response())]);
    let executor = StageExecutor::new(driver, PipelineConfig::default());

    let run = executor.run(&clean_script()).await;

    assert_eq!(run.final_stage, Some(Stage::Done));
    let discoverer = run.discoverer_output.unwrap();
    assert_eq!(discoverer.tccs.len(), 1);
    assert_eq!(discoverer.tccs[0].tcc_id, "TCC_01");
    assert!(run.reconcile_log.iter().any(|l| l.contains("Merged")));

    // The Auditor saw only the merged thread.
    let request = executor.driver().request(1);
    assert!(!request.messages[1].content.contains("TCC_02"));
}

#[tokio::test]
async fn test_request_carries_configured_sampling_params() {
    let driver = MockDriver::new(vec![Ok(discoverer_response()), Ok(auditor_response())]);
    let config = PipelineConfig::default()
        .with_model(Some("deepseek-chat".to_string()))
        .with_max_tokens(Some(2048));
    let executor = StageExecutor::new(driver, config);

    let run = executor.run(&clean_script()).await;
    assert_eq!(run.final_stage, Some(Stage::Done));

    let request = executor.driver().request(0);
    assert_eq!(request.model.as_deref(), Some("deepseek-chat"));
    assert_eq!(request.max_tokens, Some(2048));
    assert_eq!(request.temperature, Some(0.0));
    assert!(request.messages[1].content.starts_with("Analyze this script:"));
}
