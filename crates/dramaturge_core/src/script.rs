//! Screenplay representation.
//!
//! A `Script` is an ordered sequence of `Scene` values produced by an
//! external parser/loader. Stages 1 and 2 read it without mutation;
//! Stage 3 produces a modified copy.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Information a character learns within a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoChange {
    /// Character who learns something
    pub character: String,
    /// What was learned
    pub learned: String,
}

/// A relationship change between exactly two characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationChange {
    /// The two characters involved
    pub chars: Vec<String>,
    /// Relationship state before the scene
    #[serde(rename = "from")]
    pub from_state: String,
    /// Relationship state after the scene
    #[serde(rename = "to")]
    pub to_state: String,
}

/// A key object and its status within a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyObject {
    /// Object name
    pub object: String,
    /// Object status (e.g. "introduced", "destroyed")
    pub status: String,
}

/// Bidirectional setup/payoff causal links between scenes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetupPayoff {
    /// Scene ids this scene sets up
    #[serde(default)]
    pub setup_for: Vec<String>,
    /// Scene ids this scene pays off
    #[serde(default)]
    pub payoff_from: Vec<String>,
}

/// A performance annotation attached to a character's line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceNote {
    /// Character name
    pub character: String,
    /// Performance direction (e.g. "whispered", "trembling")
    pub note: String,
    /// Associated line fragment, when available
    #[serde(default)]
    pub line_context: Option<String>,
}

/// A single scene in the script.
///
/// Scene ids follow the pattern `S` + 2-3 digits + optional lowercase
/// suffix (e.g. `S05b`) used by the parser to de-duplicate ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene identifier
    pub scene_id: String,
    /// Scene setting
    pub setting: String,
    /// Characters present in the scene
    pub characters: Vec<String>,
    /// Dramatic purpose of the scene
    pub scene_mission: String,
    /// Key events in the scene
    #[serde(default)]
    pub key_events: Vec<String>,
    /// Information changes
    #[serde(default)]
    pub info_change: Vec<InfoChange>,
    /// Relationship changes
    #[serde(default)]
    pub relation_change: Vec<RelationChange>,
    /// Key objects
    #[serde(default)]
    pub key_object: Vec<KeyObject>,
    /// Setup/payoff links
    #[serde(default)]
    pub setup_payoff: SetupPayoff,
    /// Performance annotations
    #[serde(default)]
    pub performance_notes: Vec<PerformanceNote>,
    /// Visual action descriptions
    #[serde(default)]
    pub visual_actions: Vec<String>,
}

/// Complete script data.
///
/// Invariant: scene ids are unique within a script. The validator
/// enforces this for Stage-3 output; loaders are expected to uphold it
/// for input scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Ordered scenes
    pub scenes: Vec<Scene>,
}

impl Script {
    /// Number of scenes in the script.
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Build a scene-id lookup map.
    pub fn scene_map(&self) -> HashMap<&str, &Scene> {
        self.scenes
            .iter()
            .map(|scene| (scene.scene_id.as_str(), scene))
            .collect()
    }

    /// Whether a scene id exists in the script.
    pub fn contains_scene(&self, scene_id: &str) -> bool {
        self.scenes.iter().any(|scene| scene.scene_id == scene_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_change_serde_aliases() {
        let json = r#"{"chars": ["A", "B"], "from": "allies", "to": "rivals"}"#;
        let change: RelationChange = serde_json::from_str(json).unwrap();
        assert_eq!(change.from_state, "allies");
        assert_eq!(change.to_state, "rivals");

        let round_trip = serde_json::to_value(&change).unwrap();
        assert_eq!(round_trip["from"], "allies");
    }

    #[test]
    fn test_scene_optional_fields_default() {
        let json = r#"{
            "scene_id": "S01",
            "setting": "Office",
            "characters": ["Alice"],
            "scene_mission": "Establish the funding conflict"
        }"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        assert!(scene.key_events.is_empty());
        assert!(scene.setup_payoff.setup_for.is_empty());
    }

    #[test]
    fn test_scene_map_lookup() {
        let script = Script {
            scenes: vec![Scene {
                scene_id: "S01".to_string(),
                setting: "Office".to_string(),
                characters: vec!["Alice".to_string()],
                scene_mission: "Establish the funding conflict".to_string(),
                key_events: vec![],
                info_change: vec![],
                relation_change: vec![],
                key_object: vec![],
                setup_payoff: SetupPayoff::default(),
                performance_notes: vec![],
                visual_actions: vec![],
            }],
        };
        assert!(script.contains_scene("S01"));
        assert!(script.scene_map().contains_key("S01"));
        assert_eq!(script.scene_count(), 1);
    }
}
