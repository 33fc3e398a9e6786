//! Deterministic setup/payoff integrity scan.
//!
//! Stage 3's input issues come from here, not from a model: every
//! `setup_for` link must point at an existing scene whose `payoff_from`
//! names the originating scene, and every `payoff_from` target must
//! exist. Defects become `Issue` records, capped so a badly-linked
//! script cannot flood the Modifier.

use dramaturge_core::{
    AuditReport, FixAction, Issue, IssueCategory, Scene, Script, Severity, SuggestedFix,
};
use serde_json::json;

/// Stage 3 handles at most this many issues per run.
pub const MAX_ISSUES: usize = 10;

/// Scan the script's setup/payoff links and return one message per
/// defect. Empty when the chain is intact.
pub fn validate_setup_payoff_integrity(script: &Script) -> Vec<String> {
    let scene_map = script.scene_map();
    let mut errors = Vec::new();

    for scene in &script.scenes {
        for setup_id in &scene.setup_payoff.setup_for {
            match scene_map.get(setup_id.as_str()) {
                None => errors.push(format!(
                    "Scene {} references non-existent scene {} in setup_for",
                    scene.scene_id, setup_id
                )),
                Some(target) => {
                    if !target.setup_payoff.payoff_from.contains(&scene.scene_id) {
                        errors.push(format!(
                            "Scene {} sets up for {}, but {} doesn't have {} in payoff_from",
                            scene.scene_id, setup_id, setup_id, scene.scene_id
                        ));
                    }
                }
            }
        }
        for payoff_id in &scene.setup_payoff.payoff_from {
            if !scene_map.contains_key(payoff_id.as_str()) {
                errors.push(format!(
                    "Scene {} references non-existent scene {} in payoff_from",
                    scene.scene_id, payoff_id
                ));
            }
        }
    }

    errors
}

/// Build the Modifier's audit report from the integrity scan.
///
/// Each defect becomes a high-severity issue with a concrete suggested
/// fix, numbered `ISS_001` onward and capped at [`MAX_ISSUES`].
pub fn audit_script(script: &Script) -> AuditReport {
    let scene_map = script.scene_map();
    let mut issues = Vec::new();

    'scan: for scene in &script.scenes {
        for setup_id in &scene.setup_payoff.setup_for {
            if issues.len() >= MAX_ISSUES {
                break 'scan;
            }
            match scene_map.get(setup_id.as_str()) {
                None => issues.push(dangling_reference_issue(
                    issues.len() + 1,
                    scene,
                    setup_id,
                    "setup_for",
                )),
                Some(target) => {
                    if !target.setup_payoff.payoff_from.contains(&scene.scene_id) {
                        issues.push(missing_payoff_issue(issues.len() + 1, scene, setup_id));
                    }
                }
            }
        }
        for payoff_id in &scene.setup_payoff.payoff_from {
            if issues.len() >= MAX_ISSUES {
                break 'scan;
            }
            if !scene_map.contains_key(payoff_id.as_str()) {
                issues.push(dangling_reference_issue(
                    issues.len() + 1,
                    scene,
                    payoff_id,
                    "payoff_from",
                ));
            }
        }
    }

    AuditReport { issues }
}

fn missing_payoff_issue(number: usize, scene: &Scene, setup_id: &str) -> Issue {
    Issue {
        issue_id: format!("ISS_{number:03}"),
        severity: Severity::High,
        category: IssueCategory::BrokenSetupPayoff,
        description: format!(
            "Scene {} sets up for {}, but {} doesn't have {} in payoff_from",
            scene.scene_id, setup_id, setup_id, scene.scene_id
        ),
        affected_scenes: vec![scene.scene_id.clone(), setup_id.to_string()],
        suggested_fix: SuggestedFix {
            action: FixAction::AddPayoffReference,
            target_scene: setup_id.to_string(),
            field: "setup_payoff.payoff_from".to_string(),
            value: json!([scene.scene_id]),
        },
    }
}

fn dangling_reference_issue(number: usize, scene: &Scene, target_id: &str, link: &str) -> Issue {
    Issue {
        issue_id: format!("ISS_{number:03}"),
        severity: Severity::High,
        category: IssueCategory::BrokenSetupPayoff,
        description: format!(
            "Scene {} references non-existent scene {} in {}",
            scene.scene_id, target_id, link
        ),
        affected_scenes: vec![scene.scene_id.clone()],
        suggested_fix: SuggestedFix {
            action: FixAction::FixConsistency,
            target_scene: scene.scene_id.clone(),
            field: format!("setup_payoff.{link}"),
            value: json!([]),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dramaturge_core::SetupPayoff;

    fn scene(id: &str, setup_for: &[&str], payoff_from: &[&str]) -> Scene {
        Scene {
            scene_id: id.to_string(),
            setting: "Office".to_string(),
            characters: vec!["Alice".to_string()],
            scene_mission: "Advance the funding plot".to_string(),
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

    #[test]
    fn test_intact_chain_produces_no_issues() {
        let script = Script {
            scenes: vec![scene("S01", &["S02"], &[]), scene("S02", &[], &["S01"])],
        };
        assert!(validate_setup_payoff_integrity(&script).is_empty());
        assert!(audit_script(&script).issues.is_empty());
    }

    #[test]
    fn test_missing_reciprocal_payoff_detected() {
        let script = Script {
            scenes: vec![scene("S01", &["S02"], &[]), scene("S02", &[], &[])],
        };
        let errors = validate_setup_payoff_integrity(&script);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("doesn't have S01 in payoff_from"));

        let report = audit_script(&script);
        assert_eq!(report.issues.len(), 1);
        let issue = &report.issues[0];
        assert_eq!(issue.issue_id, "ISS_001");
        assert_eq!(issue.severity, Severity::High);
        assert_eq!(issue.suggested_fix.target_scene, "S02");
        assert_eq!(issue.suggested_fix.value, json!(["S01"]));
        assert_eq!(issue.affected_scenes, vec!["S01", "S02"]);
    }

    #[test]
    fn test_dangling_references_detected() {
        let script = Script {
            scenes: vec![scene("S01", &["S99"], &["S98"])],
        };
        let errors = validate_setup_payoff_integrity(&script);
        assert_eq!(errors.len(), 2);

        let report = audit_script(&script);
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.issues[0].suggested_fix.action, FixAction::FixConsistency);
        assert_eq!(report.issues[1].issue_id, "ISS_002");
    }

    #[test]
    fn test_issue_count_capped() {
        let scenes: Vec<Scene> = (1..=15)
            .map(|i| scene(&format!("S{i:02}"), &["S99"], &[]))
            .collect();
        let script = Script { scenes };
        assert_eq!(validate_setup_payoff_integrity(&script).len(), 15);
        assert_eq!(audit_script(&script).issues.len(), MAX_ISSUES);
    }
}
