//! Deterministic reconciliation of Stage 1 thread candidates.
//!
//! The Discoverer tends to produce mirror threads: the same conflict
//! reported once from each side, or near-duplicate threads over the
//! same scenes. Reconciliation runs entirely without the model and in a
//! fixed order: auto-merge near-duplicates, merge antagonist mirrors,
//! warn about residual high overlap, then reverse-verify evidence
//! scenes against the script. Threads are penalized, never silently
//! dropped, so downstream stages always see at least what the model
//! produced.

use crate::ReconcilerConfig;
use dramaturge_core::{Scene, Script, Tcc};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Word pairs indicating one thread blocks what the other seeks.
/// Bilingual because scripts arrive in Chinese and English.
const OPPOSITION_MARKERS: [(&str, &str); 9] = [
    ("阻止", "寻求"),
    ("阻止", "获取"),
    ("阻止", "想要"),
    ("block", "get"),
    ("stop", "achieve"),
    ("prevent", "want"),
    ("反对", "支持"),
    ("破坏", "建立"),
    ("against", "for"),
];

static CJK_WORDS: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"[\u{4e00}-\u{9fa5}]+").expect("Valid CJK word regex"));
static LATIN_WORDS: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"[a-zA-Z]+").expect("Valid Latin word regex"));

const STOP_WORDS: [&str; 39] = [
    "的", "了", "是", "在", "和", "与", "被", "把", "对", "到", "为", "着", "过", "不", "这",
    "那", "有", "要", "会", "能", "想", "the", "a", "an", "is", "are", "was", "were", "to",
    "of", "and", "in", "for", "on", "with", "as", "at", "by", "from",
];

/// Result of running the full reconciliation sequence.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    /// Surviving threads after merging and verification
    pub tccs: Vec<Tcc>,
    /// Human-readable log of every merge, penalty, and filter decision
    pub logs: Vec<String>,
    /// Residual independence warnings that merging could not resolve
    pub warnings: Vec<String>,
}

/// Run the full reconciliation sequence over Stage 1 candidates.
pub fn reconcile(tccs: Vec<Tcc>, script: &Script, config: &ReconcilerConfig) -> ReconcileOutcome {
    let mut logs = Vec::new();

    let (tccs, merge_logs) = merge_mirror_tccs(tccs, *config.merge_threshold());
    logs.extend(merge_logs);

    let (tccs, mirror_logs) = merge_antagonist_mirrors(tccs, *config.antagonist_threshold());
    logs.extend(mirror_logs);

    let warnings = independence_warnings(&tccs, *config.antagonist_threshold());

    let (tccs, verify_logs) = verify_evidence(tccs, script);
    logs.extend(verify_logs);

    ReconcileOutcome { tccs, logs, warnings }
}

/// Overlap ratio between two evidence-scene lists: intersection size
/// over the smaller list's size. Zero when either list is empty.
pub fn overlap_ratio(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();
    let min_len = set_a.len().min(set_b.len());
    if min_len == 0 {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    intersection as f64 / min_len as f64
}

/// Merge threads whose evidence overlap meets the threshold, keeping
/// the highest-confidence thread of each merged group.
pub fn merge_mirror_tccs(tccs: Vec<Tcc>, threshold: f64) -> (Vec<Tcc>, Vec<String>) {
    if tccs.len() <= 1 {
        return (tccs, Vec::new());
    }

    let mut merged = Vec::new();
    let mut skip = vec![false; tccs.len()];
    let mut logs = Vec::new();

    for i in 0..tccs.len() {
        if skip[i] {
            continue;
        }
        let mut group = vec![i];
        for j in (i + 1)..tccs.len() {
            if skip[j] {
                continue;
            }
            let ratio = overlap_ratio(&tccs[i].evidence_scenes, &tccs[j].evidence_scenes);
            if ratio >= threshold {
                group.push(j);
                skip[j] = true;
                logs.push(format!(
                    "Merged {} into {} (overlap: {:.0}%)",
                    tccs[j].tcc_id,
                    tccs[i].tcc_id,
                    ratio * 100.0
                ));
            }
        }
        if group.len() > 1 {
            let best = group
                .iter()
                .copied()
                .max_by(|&a, &b| {
                    tccs[a]
                        .confidence
                        .partial_cmp(&tccs[b].confidence)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(i);
            logs.push(format!(
                "Kept {} as representative (confidence: {:.2})",
                tccs[best].tcc_id, tccs[best].confidence
            ));
            merged.push(tccs[best].clone());
        } else {
            merged.push(tccs[i].clone());
        }
    }

    (merged, logs)
}

/// Merge antagonist mirrors: pairs with high evidence overlap whose
/// objectives contain opposing marker words (one blocks what the other
/// seeks). The higher-confidence thread wins and absorbs the sorted
/// union of both evidence lists.
pub fn merge_antagonist_mirrors(tccs: Vec<Tcc>, threshold: f64) -> (Vec<Tcc>, Vec<String>) {
    if tccs.len() <= 1 {
        return (tccs, Vec::new());
    }

    let mut processed = Vec::new();
    let mut skip = vec![false; tccs.len()];
    let mut logs = Vec::new();

    for i in 0..tccs.len() {
        if skip[i] {
            continue;
        }
        let mut mirror = None;
        for j in (i + 1)..tccs.len() {
            if skip[j] {
                continue;
            }
            let ratio = overlap_ratio(&tccs[i].evidence_scenes, &tccs[j].evidence_scenes);
            if ratio < threshold {
                continue;
            }
            if objectives_oppose(&tccs[i].super_objective, &tccs[j].super_objective) {
                skip[j] = true;
                logs.push(format!(
                    "{} & {} are antagonist mirrors (overlap: {:.0}%)",
                    tccs[i].tcc_id,
                    tccs[j].tcc_id,
                    ratio * 100.0
                ));
                mirror = Some(j);
                break;
            }
        }
        match mirror {
            Some(j) => {
                let (first, second) = (&tccs[i], &tccs[j]);
                let mut winner = if first.confidence >= second.confidence {
                    first.clone()
                } else {
                    second.clone()
                };
                let union: HashSet<&String> = first
                    .evidence_scenes
                    .iter()
                    .chain(&second.evidence_scenes)
                    .collect();
                let mut scenes: Vec<String> = union.into_iter().cloned().collect();
                scenes.sort();
                winner.evidence_scenes = scenes;
                logs.push(format!(
                    "Merged: keeping {} (higher confidence wins)",
                    winner.tcc_id
                ));
                processed.push(winner);
            }
            None => processed.push(tccs[i].clone()),
        }
    }

    (processed, logs)
}

fn objectives_oppose(obj1: &str, obj2: &str) -> bool {
    let lower1 = obj1.to_lowercase();
    let lower2 = obj2.to_lowercase();
    OPPOSITION_MARKERS.iter().any(|(block, seek)| {
        (lower1.contains(block) && lower2.contains(seek))
            || (lower1.contains(seek) && lower2.contains(block))
    })
}

/// Warnings for thread pairs whose overlap exceeds the threshold after
/// merging. These could not be auto-resolved and go to the run's error
/// list for a human to review.
pub fn independence_warnings(tccs: &[Tcc], threshold: f64) -> Vec<String> {
    let mut warnings = Vec::new();
    for i in 0..tccs.len() {
        for j in (i + 1)..tccs.len() {
            let ratio = overlap_ratio(&tccs[i].evidence_scenes, &tccs[j].evidence_scenes);
            if ratio > threshold {
                warnings.push(format!(
                    "High overlap between {} and {} ({:.0}%). May be mirror conflicts. \
                     Check: '{}' vs '{}'",
                    tccs[i].tcc_id,
                    tccs[j].tcc_id,
                    ratio * 100.0,
                    tccs[i].super_objective,
                    tccs[j].super_objective
                ));
            }
        }
    }
    warnings
}

/// Drop threads whose evidence span covers too little of the script.
///
/// Coverage is `(last - first + 1) / total_scenes` over the numeric
/// parts of the evidence scene ids. Threads with fewer than two
/// parseable scene numbers are dropped as well.
pub fn filter_low_coverage(
    tccs: Vec<Tcc>,
    total_scenes: usize,
    threshold: f64,
) -> (Vec<Tcc>, Vec<String>) {
    if total_scenes == 0 {
        return (tccs, vec!["total_scenes is 0, skipping coverage filter".to_string()]);
    }

    static SCENE_NUMBER: LazyLock<regex::Regex> =
        LazyLock::new(|| regex::Regex::new(r"\d+").expect("Valid scene number regex"));

    let mut kept = Vec::new();
    let mut logs = Vec::new();

    for tcc in tccs {
        let numbers: Vec<u32> = tcc
            .evidence_scenes
            .iter()
            .filter_map(|id| SCENE_NUMBER.find(id))
            .filter_map(|m| m.as_str().parse().ok())
            .collect();

        if numbers.len() < 2 {
            logs.push(format!(
                "{} has fewer than 2 parseable scenes, filtered out",
                tcc.tcc_id
            ));
            continue;
        }

        let first = numbers.iter().min().copied().unwrap_or(0);
        let last = numbers.iter().max().copied().unwrap_or(0);
        let coverage = f64::from(last - first + 1) / total_scenes as f64;

        if coverage >= threshold {
            logs.push(format!(
                "{} coverage: {:.0}% (S{:02}-S{:02})",
                tcc.tcc_id,
                coverage * 100.0,
                first,
                last
            ));
            kept.push(tcc);
        } else {
            logs.push(format!(
                "{} filtered: coverage {:.0}% below {:.0}% threshold",
                tcc.tcc_id,
                coverage * 100.0,
                threshold * 100.0
            ));
        }
    }

    (kept, logs)
}

/// Reverse-verify each thread's evidence scenes against the script.
///
/// A scene supports a thread when its key events, mission, or relation
/// changes share keywords with the thread's objective. Threads keep
/// only their supported scenes; a thread down to one supported scene
/// loses 0.2 confidence (floor 0.5), a thread with none loses 0.3
/// (floor 0.4) and keeps its original evidence. No thread is removed.
pub fn verify_evidence(tccs: Vec<Tcc>, script: &Script) -> (Vec<Tcc>, Vec<String>) {
    let scene_map = script.scene_map();
    let mut verified = Vec::new();
    let mut logs = Vec::new();

    for mut tcc in tccs {
        let objective = tcc.super_objective.to_lowercase();
        let mut valid = Vec::new();
        let mut invalid = Vec::new();

        for scene_id in &tcc.evidence_scenes {
            match scene_map.get(scene_id.as_str()) {
                None => invalid.push(format!("{scene_id} (not found)")),
                Some(scene) => {
                    if scene_supports(scene, &objective) {
                        valid.push(scene_id.clone());
                    } else {
                        invalid.push(format!("{scene_id} (no supporting evidence)"));
                    }
                }
            }
        }

        if !invalid.is_empty() {
            logs.push(format!(
                "{}: {}/{} scenes lack clear evidence: {}",
                tcc.tcc_id,
                invalid.len(),
                tcc.evidence_scenes.len(),
                invalid.join(", ")
            ));
        }

        if valid.len() >= 2 {
            tcc.evidence_scenes = valid;
            logs.push(format!(
                "{}: validated with {} evidence scenes",
                tcc.tcc_id,
                tcc.evidence_scenes.len()
            ));
        } else if valid.len() == 1 {
            tcc.evidence_scenes = valid;
            tcc.confidence = (tcc.confidence - 0.2).max(0.5);
            logs.push(format!(
                "{}: kept with reduced confidence ({:.2}), only 1 valid scene",
                tcc.tcc_id, tcc.confidence
            ));
        } else {
            // Keep original evidence rather than break downstream stages.
            tcc.confidence = (tcc.confidence - 0.3).max(0.4);
            logs.push(format!(
                "{}: no keyword evidence found, kept with low confidence ({:.2})",
                tcc.tcc_id, tcc.confidence
            ));
        }
        verified.push(tcc);
    }

    (verified, logs)
}

fn scene_supports(scene: &Scene, objective_lower: &str) -> bool {
    if scene
        .key_events
        .iter()
        .any(|event| has_keyword_overlap(objective_lower, &event.to_lowercase()))
    {
        return true;
    }
    if has_keyword_overlap(objective_lower, &scene.scene_mission.to_lowercase()) {
        return true;
    }
    scene.relation_change.iter().any(|rel| {
        let rel_str = format!("{:?} {} {}", rel.chars, rel.from_state, rel.to_state).to_lowercase();
        has_keyword_overlap(objective_lower, &rel_str)
    })
}

/// Keyword overlap between two lowercased texts. Extracts CJK
/// character runs and Latin word tokens, drops stop words, and counts
/// shared words plus substring containment between words of length 2
/// or more ("投资" matches "创业投资").
fn has_keyword_overlap(text1: &str, text2: &str) -> bool {
    let words1 = extract_keywords(text1);
    let words2 = extract_keywords(text2);

    let mut overlap = words1.intersection(&words2).count();
    if overlap >= 1 {
        return true;
    }
    for w1 in &words1 {
        if w1.chars().count() < 2 {
            continue;
        }
        for w2 in &words2 {
            if w2.chars().count() >= 2 && (w2.contains(w1.as_str()) || w1.contains(w2.as_str())) {
                overlap += 1;
                break;
            }
        }
        if overlap >= 1 {
            return true;
        }
    }
    false
}

fn extract_keywords(text: &str) -> HashSet<String> {
    let stop_words: HashSet<&str> = STOP_WORDS.into_iter().collect();
    CJK_WORDS
        .find_iter(text)
        .chain(LATIN_WORDS.find_iter(text))
        .map(|m| m.as_str().to_lowercase())
        .filter(|word| !stop_words.contains(word.as_str()))
        .collect()
}
