//! Stage output parsing and validation.
//!
//! Each stage's sanitized text goes through the same three steps:
//! parse to a JSON value, apply a small set of tolerant coercions for
//! known model quirks, then deserialize into the typed schema and check
//! cross-field invariants. Coercions are deliberate and logged; nothing
//! else is repaired silently.

use dramaturge_core::{
    AuditorOutput, DiscovererOutput, Forces, ModifierOutput, Rankings, Script, Tcc,
};
use dramaturge_error::{DramaturgeResult, JsonError, ValidationError, ValidationErrorKind};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Scene id pattern: `S` + 2-3 digits + optional lowercase suffix.
pub const SCENE_ID_PATTERN: &str = r"^S\d{2,3}[a-z]?$";
/// Thread id pattern.
pub const TCC_ID_PATTERN: &str = r"^TCC_\d{2}$";
/// Issue id pattern.
pub const ISSUE_ID_PATTERN: &str = r"^ISS_\d{3}$";

static SCENE_ID: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(SCENE_ID_PATTERN).expect("Valid scene id regex"));
static TCC_ID: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(TCC_ID_PATTERN).expect("Valid thread id regex"));
static ISSUE_ID: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(ISSUE_ID_PATTERN).expect("Valid issue id regex"));
static ISSUE_ID_PREFIX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^ISS_\d{3}").expect("Valid issue id prefix regex"));

/// Parse and validate Stage 1 output.
///
/// Accepts the sanitized completion text and returns the typed output,
/// or a validation error identifying the offending field.
pub fn parse_discoverer(json: &str) -> DramaturgeResult<DiscovererOutput> {
    let value: JsonValue = serde_json::from_str(json)
        .map_err(|e| JsonError::new(format!("Discoverer output is not valid JSON: {e}")))?;
    let output: DiscovererOutput = serde_json::from_value(value).map_err(|e| {
        ValidationError::new(ValidationErrorKind::Schema {
            field: "discoverer".to_string(),
            message: e.to_string(),
        })
    })?;
    validate_discoverer(&output)?;
    Ok(output)
}

/// Parse and validate Stage 2 output, coercing known shape quirks
/// before strict deserialization.
pub fn parse_auditor(json: &str) -> DramaturgeResult<AuditorOutput> {
    let mut value: JsonValue = serde_json::from_str(json)
        .map_err(|e| JsonError::new(format!("Auditor output is not valid JSON: {e}")))?;
    normalize_auditor(&mut value);
    let output: AuditorOutput = serde_json::from_value(value).map_err(|e| {
        ValidationError::new(ValidationErrorKind::Schema {
            field: "auditor".to_string(),
            message: e.to_string(),
        })
    })?;
    validate_auditor(&output)?;
    Ok(output)
}

/// Parse and validate Stage 3 output, coercing known id and
/// change-type quirks before strict deserialization.
pub fn parse_modifier(json: &str) -> DramaturgeResult<ModifierOutput> {
    let mut value: JsonValue = serde_json::from_str(json)
        .map_err(|e| JsonError::new(format!("Modifier output is not valid JSON: {e}")))?;
    normalize_modifier(&mut value);
    let output: ModifierOutput = serde_json::from_value(value).map_err(|e| {
        ValidationError::new(ValidationErrorKind::Schema {
            field: "modifier".to_string(),
            message: e.to_string(),
        })
    })?;
    validate_modifier(&output)?;
    Ok(output)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Models sometimes emit a lone string where `dynamic_antagonist`
/// expects a list. Wrap it.
fn normalize_auditor(value: &mut JsonValue) {
    let Some(rankings) = value.get_mut("rankings") else {
        return;
    };
    if let Some(forces) = rankings.pointer_mut("/a_line/forces") {
        coerce_dynamic_antagonist(forces);
    }
    for key in ["b_lines", "c_lines"] {
        if let Some(JsonValue::Array(lines)) = rankings.get_mut(key) {
            for line in lines {
                if let Some(forces) = line.get_mut("forces") {
                    coerce_dynamic_antagonist(forces);
                }
            }
        }
    }
}

fn coerce_dynamic_antagonist(forces: &mut JsonValue) {
    let Some(slot) = forces.get_mut("dynamic_antagonist") else {
        return;
    };
    if let JsonValue::String(single) = slot {
        tracing::debug!(value = %single, "Coercing dynamic_antagonist string to list");
        let single = std::mem::take(single);
        *slot = JsonValue::Array(vec![JsonValue::String(single)]);
    }
}

/// Repair modification-log quirks: issue ids with spurious suffixes
/// (`ISS_001_retry`) are truncated to their valid prefix, and free-form
/// change types are mapped onto the canonical action set.
fn normalize_modifier(value: &mut JsonValue) {
    let Some(JsonValue::Array(entries)) = value.get_mut("modification_log") else {
        return;
    };
    for entry in entries {
        if let Some(JsonValue::String(issue_id)) = entry.get_mut("issue_id")
            && !ISSUE_ID.is_match(issue_id)
            && let Some(prefix) = ISSUE_ID_PREFIX.find(issue_id)
        {
            let truncated = prefix.as_str().to_string();
            tracing::debug!(from = %issue_id, to = %truncated, "Truncating issue id suffix");
            *issue_id = truncated;
        }
        if let Some(slot) = entry.get_mut("change_type")
            && let JsonValue::String(raw) = slot
        {
            let canonical = canonical_change_type(raw);
            if canonical != raw {
                tracing::debug!(from = %raw, to = %canonical, "Mapping change_type to canonical action");
                *slot = JsonValue::String(canonical.to_string());
            }
        }
    }
}

/// Map a free-form change-type string onto the canonical action set.
/// Exact matches pass through; otherwise substring heuristics apply,
/// and anything unrecognized becomes `update` (the no-op action).
fn canonical_change_type(raw: &str) -> &'static str {
    let lowered = raw.trim().to_lowercase();
    match lowered.as_str() {
        "add" => return "add",
        "append" => return "append",
        "update" => return "update",
        "remove" => return "remove",
        "delete" => return "delete",
        _ => {}
    }
    if lowered.contains("remove") || lowered.contains("clear") {
        "remove"
    } else if lowered.contains("delete") {
        "delete"
    } else if lowered.contains("append") {
        "append"
    } else if lowered.contains("add") {
        "add"
    } else {
        "update"
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_discoverer(output: &DiscovererOutput) -> DramaturgeResult<()> {
    check_cardinality("tccs", output.tccs.len(), 1, 5)?;
    check_unique_ids("tccs", output.tccs.iter().map(|t| t.tcc_id.as_str()))?;
    for (i, tcc) in output.tccs.iter().enumerate() {
        validate_tcc(&format!("tccs[{i}]"), tcc)?;
    }
    Ok(())
}

fn validate_tcc(prefix: &str, tcc: &Tcc) -> DramaturgeResult<()> {
    check_pattern(&format!("{prefix}.tcc_id"), &tcc.tcc_id, &TCC_ID, TCC_ID_PATTERN)?;
    check_length(
        &format!("{prefix}.super_objective"),
        &tcc.super_objective,
        10,
        200,
    )?;
    let evidence_field = format!("{prefix}.evidence_scenes");
    if tcc.evidence_scenes.len() < 2 {
        return Err(ValidationError::new(ValidationErrorKind::TooFewElements {
            field: evidence_field,
            len: tcc.evidence_scenes.len(),
            min: 2,
        })
        .into());
    }
    for (j, scene_id) in tcc.evidence_scenes.iter().enumerate() {
        check_pattern(
            &format!("{evidence_field}[{j}]"),
            scene_id,
            &SCENE_ID,
            SCENE_ID_PATTERN,
        )?;
    }
    check_range(&format!("{prefix}.confidence"), tcc.confidence, 0.5, 1.0)?;
    Ok(())
}

fn validate_auditor(output: &AuditorOutput) -> DramaturgeResult<()> {
    let rankings = &output.rankings;
    validate_rankings(rankings)?;
    for (name, coverage) in [
        ("metrics.a_line_coverage", output.metrics.a_line_coverage),
        ("metrics.b_line_coverage", output.metrics.b_line_coverage),
        ("metrics.c_line_coverage", output.metrics.c_line_coverage),
    ] {
        check_range(name, coverage, 0.0, 1.0)?;
    }
    Ok(())
}

fn validate_rankings(rankings: &Rankings) -> DramaturgeResult<()> {
    let a = &rankings.a_line;
    check_pattern("rankings.a_line.tcc_id", &a.tcc_id, &TCC_ID, TCC_ID_PATTERN)?;
    check_positive("rankings.a_line.spine_score", a.spine_score)?;
    check_range(
        "rankings.a_line.reasoning.setup_payoff_density",
        a.reasoning.setup_payoff_density,
        0.0,
        1.0,
    )?;
    validate_forces("rankings.a_line.forces", &a.forces)?;

    if rankings.b_lines.len() > 2 {
        return Err(ValidationError::new(ValidationErrorKind::TooManyElements {
            field: "rankings.b_lines".to_string(),
            len: rankings.b_lines.len(),
            max: 2,
        })
        .into());
    }
    for (i, b) in rankings.b_lines.iter().enumerate() {
        let prefix = format!("rankings.b_lines[{i}]");
        check_pattern(&format!("{prefix}.tcc_id"), &b.tcc_id, &TCC_ID, TCC_ID_PATTERN)?;
        check_positive(&format!("{prefix}.heart_score"), b.heart_score)?;
        check_range(
            &format!("{prefix}.reasoning.emotional_intensity"),
            b.reasoning.emotional_intensity,
            0.0,
            1.0,
        )?;
        check_range(
            &format!("{prefix}.reasoning.a_line_interaction"),
            b.reasoning.a_line_interaction,
            0.3,
            1.0,
        )?;
        validate_forces(&format!("{prefix}.forces"), &b.forces)?;
    }
    for (i, c) in rankings.c_lines.iter().enumerate() {
        let prefix = format!("rankings.c_lines[{i}]");
        check_pattern(&format!("{prefix}.tcc_id"), &c.tcc_id, &TCC_ID, TCC_ID_PATTERN)?;
        check_positive(&format!("{prefix}.flavor_score"), c.flavor_score)?;
        check_range(
            &format!("{prefix}.reasoning.thematic_relevance"),
            c.reasoning.thematic_relevance,
            0.0,
            1.0,
        )?;
        validate_forces(&format!("{prefix}.forces"), &c.forces)?;
    }
    Ok(())
}

fn validate_forces(prefix: &str, forces: &Forces) -> DramaturgeResult<()> {
    if forces.protagonist.is_empty() {
        return Err(ValidationError::new(ValidationErrorKind::TooShort {
            field: format!("{prefix}.protagonist"),
            len: 0,
            min: 1,
        })
        .into());
    }
    if forces.primary_antagonist.is_empty() {
        return Err(ValidationError::new(ValidationErrorKind::TooShort {
            field: format!("{prefix}.primary_antagonist"),
            len: 0,
            min: 1,
        })
        .into());
    }
    Ok(())
}

fn validate_modifier(output: &ModifierOutput) -> DramaturgeResult<()> {
    let v = &output.validation;
    if v.fixed + v.skipped != v.total_issues {
        return Err(ValidationError::new(ValidationErrorKind::CountMismatch {
            fixed: v.fixed,
            skipped: v.skipped,
            total: v.total_issues,
        })
        .into());
    }
    for (i, entry) in output.modification_log.iter().enumerate() {
        check_pattern(
            &format!("modification_log[{i}].issue_id"),
            &entry.issue_id,
            &ISSUE_ID,
            ISSUE_ID_PATTERN,
        )?;
    }
    validate_script("modified_script", &output.modified_script)?;
    Ok(())
}

/// Structural checks on a script: unique scene ids, well-formed ids,
/// at least one character per scene, and two distinct participants in
/// every relation change.
pub fn validate_script(prefix: &str, script: &Script) -> DramaturgeResult<()> {
    check_unique_ids(
        &format!("{prefix}.scenes"),
        script.scenes.iter().map(|s| s.scene_id.as_str()),
    )?;
    for (i, scene) in script.scenes.iter().enumerate() {
        let scene_prefix = format!("{prefix}.scenes[{i}]");
        check_pattern(
            &format!("{scene_prefix}.scene_id"),
            &scene.scene_id,
            &SCENE_ID,
            SCENE_ID_PATTERN,
        )?;
        if scene.characters.is_empty() {
            return Err(ValidationError::new(ValidationErrorKind::TooFewElements {
                field: format!("{scene_prefix}.characters"),
                len: 0,
                min: 1,
            })
            .into());
        }
        for (j, rel) in scene.relation_change.iter().enumerate() {
            let distinct: HashSet<&str> = rel.chars.iter().map(String::as_str).collect();
            if rel.chars.len() != 2 || distinct.len() != 2 {
                return Err(ValidationError::new(
                    ValidationErrorKind::RelationParticipants {
                        field: format!("{scene_prefix}.relation_change[{j}].chars"),
                        chars: rel.chars.clone(),
                    },
                )
                .into());
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Check helpers
// ---------------------------------------------------------------------------

fn check_pattern(
    field: &str,
    value: &str,
    regex: &regex::Regex,
    pattern: &'static str,
) -> DramaturgeResult<()> {
    if regex.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new(ValidationErrorKind::Pattern {
            field: field.to_string(),
            value: value.to_string(),
            pattern,
        })
        .into())
    }
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> DramaturgeResult<()> {
    let len = value.chars().count();
    if len < min {
        Err(ValidationError::new(ValidationErrorKind::TooShort {
            field: field.to_string(),
            len,
            min,
        })
        .into())
    } else if len > max {
        Err(ValidationError::new(ValidationErrorKind::TooLong {
            field: field.to_string(),
            len,
            max,
        })
        .into())
    } else {
        Ok(())
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> DramaturgeResult<()> {
    if value < min || value > max {
        Err(ValidationError::new(ValidationErrorKind::Range {
            field: field.to_string(),
            value,
            min,
            max,
        })
        .into())
    } else {
        Ok(())
    }
}

fn check_positive(field: &str, value: f64) -> DramaturgeResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new(ValidationErrorKind::NotPositive {
            field: field.to_string(),
            value,
        })
        .into())
    }
}

fn check_cardinality(field: &str, len: usize, min: usize, max: usize) -> DramaturgeResult<()> {
    if len < min {
        Err(ValidationError::new(ValidationErrorKind::TooFewElements {
            field: field.to_string(),
            len,
            min,
        })
        .into())
    } else if len > max {
        Err(ValidationError::new(ValidationErrorKind::TooManyElements {
            field: field.to_string(),
            len,
            max,
        })
        .into())
    } else {
        Ok(())
    }
}

fn check_unique_ids<'a>(
    field: &str,
    ids: impl Iterator<Item = &'a str>,
) -> DramaturgeResult<()> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for id in ids {
        if !seen.insert(id) && !duplicates.iter().any(|d| d == id) {
            duplicates.push(id.to_string());
        }
    }
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(ValidationErrorKind::DuplicateIds {
            field: field.to_string(),
            duplicates,
        })
        .into())
    }
}
