//! Ranking score formulas.
//!
//! The Auditor prompt instructs the model to apply these exact
//! formulas; they live here so the host can recompute or spot-check
//! the model's arithmetic.

use dramaturge_core::Script;
use std::collections::HashSet;

/// Spine score for A-line ranking:
/// `scene_count * 2 + setup_payoff_density * 1.5 + 2 if drives_climax`.
pub fn spine_score(scene_count: u32, setup_payoff_density: f64, drives_climax: bool) -> f64 {
    let base = f64::from(scene_count) * 2.0 + setup_payoff_density * 1.5;
    if drives_climax { base + 2.0 } else { base }
}

/// Heart score for B-line ranking:
/// `emotional_intensity * 10 + a_line_interaction * 5`.
pub fn heart_score(emotional_intensity: f64, a_line_interaction: f64) -> f64 {
    emotional_intensity * 10.0 + a_line_interaction * 5.0
}

/// Interaction between a thread and the A-line: shared scenes over the
/// smaller scene list. Zero when either list is empty.
pub fn a_line_interaction(tcc_scenes: &[String], a_line_scenes: &[String]) -> f64 {
    let set_a: HashSet<&str> = tcc_scenes.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = a_line_scenes.iter().map(String::as_str).collect();
    let min_len = set_a.len().min(set_b.len());
    if min_len == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f64 / min_len as f64
}

/// Fraction of the given scenes that carry at least one setup or
/// payoff link. Unknown scene ids count against the density.
pub fn setup_payoff_density(script: &Script, scene_ids: &[String]) -> f64 {
    if scene_ids.is_empty() {
        return 0.0;
    }
    let scene_map = script.scene_map();
    let linked = scene_ids
        .iter()
        .filter_map(|id| scene_map.get(id.as_str()))
        .filter(|scene| {
            !scene.setup_payoff.setup_for.is_empty() || !scene.setup_payoff.payoff_from.is_empty()
        })
        .count();
    linked as f64 / scene_ids.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use dramaturge_core::{Scene, SetupPayoff};

    #[test]
    fn test_spine_score_formula() {
        assert!((spine_score(10, 0.5, false) - 20.75).abs() < 1e-9);
        assert!((spine_score(10, 0.5, true) - 22.75).abs() < 1e-9);
    }

    #[test]
    fn test_heart_score_formula() {
        assert!((heart_score(0.8, 0.5) - 10.5).abs() < 1e-9);
    }

    #[test]
    fn test_a_line_interaction_min_denominator() {
        let tcc = vec!["S01".to_string(), "S02".to_string()];
        let a_line = vec!["S01".to_string(), "S03".to_string(), "S04".to_string()];
        assert!((a_line_interaction(&tcc, &a_line) - 0.5).abs() < 1e-9);
        assert!((a_line_interaction(&[], &a_line)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_setup_payoff_density() {
        let script = Script {
            scenes: vec![
                Scene {
                    scene_id: "S01".to_string(),
                    setting: "Office".to_string(),
                    characters: vec!["Alice".to_string()],
                    scene_mission: "Establish the funding conflict".to_string(),
                    key_events: vec![],
                    info_change: vec![],
                    relation_change: vec![],
                    key_object: vec![],
                    setup_payoff: SetupPayoff {
                        setup_for: vec!["S02".to_string()],
                        payoff_from: vec![],
                    },
                    performance_notes: vec![],
                    visual_actions: vec![],
                },
                Scene {
                    scene_id: "S02".to_string(),
                    setting: "Office".to_string(),
                    characters: vec!["Alice".to_string()],
                    scene_mission: "Pay off the funding setup".to_string(),
                    key_events: vec![],
                    info_change: vec![],
                    relation_change: vec![],
                    key_object: vec![],
                    setup_payoff: SetupPayoff::default(),
                    performance_notes: vec![],
                    visual_actions: vec![],
                },
            ],
        };
        let ids = vec!["S01".to_string(), "S02".to_string()];
        assert!((setup_payoff_density(&script, &ids) - 0.5).abs() < 1e-9);
        assert!((setup_payoff_density(&script, &[])).abs() < f64::EPSILON);
    }
}
