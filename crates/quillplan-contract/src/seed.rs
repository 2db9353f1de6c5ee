use quillplan_core::{CardinalityLock, JsonPath, SeedOverlay};
use serde_json::{Value, json};

use crate::errors::Result;
use crate::schema::{CHAPTER_PLAN, SEED_WORD_COUNT};

/// Word count of chapters synthesized during backfill.
pub const PLACEHOLDER_WORD_COUNT: i64 = 1600;

/// One empty, pre-numbered chapter row per planned chapter, in act order.
pub fn build_chapter_seed(lock: &CardinalityLock) -> Vec<Value> {
    lock.iter()
        .flat_map(|(act, count)| std::iter::repeat_n(act, count))
        .enumerate()
        .map(|(idx, act)| {
            json!({
                "ch": idx + 1,
                "title": "",
                "act": act,
                "setting": "",
                "figure": null,
                "external_goal": "",
                "obstacle": "",
                "turn": "",
                "cliffhanger": "",
                "word_count": SEED_WORD_COUNT,
            })
        })
        .collect()
}

/// Overlay that swaps the derived chapter array for the seed and empties the
/// research selection so the generator fills it from scratch.
pub fn chapter_seed_overlay(lock: &CardinalityLock) -> Result<SeedOverlay> {
    Ok(SeedOverlay {
        array_path: CHAPTER_PLAN.parse::<JsonPath>()?,
        records: build_chapter_seed(lock),
        overrides: vec![(
            "research_selection".parse::<JsonPath>()?,
            json!({"mythic_figures": [], "locales": []}),
        )],
    })
}

/// Deterministic stand-in chapter used when an act is short of chapters.
pub fn placeholder_chapter(act: &str) -> Value {
    let title = match act {
        "I" => "Crossing the Birch Edge",
        "II" => "Lantern-Leaf Trial",
        "III" => "Stone Ford Return",
        _ => "Untitled Passage",
    };
    json!({
        "ch": 0,
        "title": title,
        "act": act,
        "setting": "Enchanted Forest",
        "figure": null,
        "external_goal": "Advance safely",
        "obstacle": "Shifting path",
        "turn": "Pattern spotted; fair trade offered",
        "cliffhanger": "New trail reveals itself",
        "word_count": PLACEHOLDER_WORD_COUNT,
    })
}
