use quillplan_core::CardinalityLock;
use serde_json::{Map, Value};

use crate::errors::{ContractError, Result};
use crate::model::PacingProfile;

/// Slack for float shares such as `0.45 + 0.40 + 0.15`.
const SHARE_TOLERANCE: f64 = 1e-9;

/// Per-act word budgets that sum to `max_total_words` exactly.
///
/// Every act except the last gets `floor(total * share)`; the last act takes
/// whatever remains.
pub fn compute_word_targets(max_total_words: i64, profile: &PacingProfile) -> Vec<(String, i64)> {
    let mut targets = Vec::with_capacity(profile.acts.len());
    let mut assigned = 0_i64;
    for (idx, act) in profile.acts.iter().enumerate() {
        let words = if idx + 1 == profile.acts.len() {
            max_total_words - assigned
        } else {
            (max_total_words as f64 * act.word_share).floor() as i64
        };
        assigned += words;
        targets.push((act.act.clone(), words));
    }
    targets
}

/// Chapter counts of the profile, checked against the expected total.
pub fn chapter_lock(profile: &PacingProfile, expected_chapters: Option<u32>) -> Result<CardinalityLock> {
    let expected = expected_chapters.unwrap_or_else(|| profile.total_chapters());
    let counts = profile
        .acts
        .iter()
        .map(|act| (act.act.clone(), i64::from(act.chapters)));
    Ok(CardinalityLock::new(counts, i64::from(expected))?)
}

/// Check that the profile names exactly the acts the schema knows, each with
/// at least one chapter and a word share in `0..=1`, shares summing to at
/// most 1.
pub fn check_profile(profile: &PacingProfile, known_acts: &[String]) -> Result<()> {
    let mut names: Vec<&str> = profile.acts.iter().map(|act| act.act.as_str()).collect();
    names.sort_unstable();
    let mut known: Vec<&str> = known_acts.iter().map(String::as_str).collect();
    known.sort_unstable();
    if names != known {
        return Err(ContractError::InvalidRequest(format!(
            "pacing acts {names:?} do not match schema acts {known:?}"
        )));
    }
    if let Some(act) = profile.acts.iter().find(|act| act.chapters == 0) {
        return Err(ContractError::InvalidRequest(format!(
            "act '{}' needs at least one chapter",
            act.act
        )));
    }
    if let Some(act) = profile
        .acts
        .iter()
        .find(|act| !(0.0..=1.0).contains(&act.word_share))
    {
        return Err(ContractError::UnsatisfiablePacing(format!(
            "act '{}' has word share {} outside 0..=1",
            act.act, act.word_share
        )));
    }
    let shares: f64 = profile.acts.iter().map(|act| act.word_share).sum();
    if shares > 1.0 + SHARE_TOLERANCE {
        return Err(ContractError::UnsatisfiablePacing(format!(
            "word shares sum to {shares}, more than 1"
        )));
    }
    Ok(())
}

/// Check that every act target clears the schema minimum and leaves each of
/// the act's chapters at least `floor` words.
pub fn check_word_targets(
    targets: &[(String, i64)],
    profile: &PacingProfile,
    act_minimum: impl Fn(&str) -> Option<i64>,
    floor: i64,
) -> Result<()> {
    for (act, words) in targets {
        if let Some(minimum) = act_minimum(act)
            && *words < minimum
        {
            return Err(ContractError::UnsatisfiablePacing(format!(
                "act '{act}' gets {words} words, below the minimum of {minimum}"
            )));
        }
        let chapters = profile
            .acts
            .iter()
            .find(|pacing| pacing.act == *act)
            .map_or(0, |pacing| i64::from(pacing.chapters));
        let needed = floor.saturating_mul(chapters);
        if *words < needed {
            return Err(ContractError::UnsatisfiablePacing(format!(
                "act '{act}' gets {words} words but its {chapters} chapters need at least {needed}"
            )));
        }
    }
    Ok(())
}

/// `{act: words}` object for the locked `pacing.word_targets`.
pub fn targets_value(targets: &[(String, i64)]) -> Value {
    let map: Map<String, Value> = targets
        .iter()
        .map(|(act, words)| (act.clone(), Value::from(*words)))
        .collect();
    Value::Object(map)
}
