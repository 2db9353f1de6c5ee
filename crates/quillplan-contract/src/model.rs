use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default overall word budget when the request does not name one.
pub const DEFAULT_MAX_TOTAL_WORDS: i64 = 60_000;

fn default_max_total_words() -> i64 {
    DEFAULT_MAX_TOTAL_WORDS
}

/// Caller-supplied materials for one planning run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlanRequest {
    /// Canonical book model; locked into `canon.book_model`.
    pub book_model: Value,
    /// Canonical blueprint; locked into `canon.blueprint`.
    pub blueprint: Value,
    /// Research corpus the generator may select figures and locales from.
    #[serde(default)]
    pub research: Value,
    /// Advisory high-level plan text.
    #[serde(default)]
    pub planning_text: String,
    /// Locked book summary.
    pub summary_text: String,
    /// Overall word budget, split across acts.
    #[serde(default = "default_max_total_words")]
    pub max_total_words: i64,
    /// Expected chapter count; must match the pacing profile when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_chapters: Option<u32>,
}

/// Chapter count and word share of one act.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActPacing {
    pub act: String,
    pub chapters: u32,
    /// Fraction of the overall word budget; the last act takes the remainder.
    pub word_share: f64,
}

/// Ordered act layout of a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PacingProfile {
    pub acts: Vec<ActPacing>,
}

impl Default for PacingProfile {
    fn default() -> Self {
        Self {
            acts: vec![
                ActPacing {
                    act: "I".to_string(),
                    chapters: 12,
                    word_share: 0.45,
                },
                ActPacing {
                    act: "II".to_string(),
                    chapters: 9,
                    word_share: 0.40,
                },
                ActPacing {
                    act: "III".to_string(),
                    chapters: 3,
                    word_share: 0.15,
                },
            ],
        }
    }
}

impl PacingProfile {
    pub fn total_chapters(&self) -> u32 {
        self.acts.iter().map(|act| act.chapters).sum()
    }
}

/// Point-of-view rule locked into every plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PointOfView {
    #[serde(rename = "type")]
    pub kind: String,
    pub rule: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanConstraints {
    pub summary: String,
    pub max_total_words: i64,
    pub pov: PointOfView,
    pub tone: String,
    pub pace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MythicFigure {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_snippet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Locale {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_snippet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResearchSelection {
    pub mythic_figures: Vec<MythicFigure>,
    pub locales: Vec<Locale>,
}

/// Locked chapter counts and word budgets per act.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Pacing {
    pub acts: BTreeMap<String, i64>,
    pub word_targets: BTreeMap<String, i64>,
}

/// One planned chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChapterEntry {
    pub ch: u32,
    pub title: String,
    pub act: String,
    pub setting: String,
    pub figure: Option<String>,
    pub external_goal: String,
    pub obstacle: String,
    pub turn: String,
    pub cliffhanger: String,
    pub word_count: i64,
}

/// Canon passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Canon {
    pub book_model: Value,
    pub blueprint: Value,
}

/// Accepted, schema-valid book plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BookPlan {
    pub constraints: PlanConstraints,
    pub research_selection: ResearchSelection,
    pub pacing: Pacing,
    pub chapter_plan: Vec<ChapterEntry>,
    pub canon: Canon,
}

impl BookPlan {
    /// Chapters tagged with `act`, in plan order.
    pub fn chapters_in_act<'a>(&'a self, act: &'a str) -> impl Iterator<Item = &'a ChapterEntry> {
        self.chapter_plan
            .iter()
            .filter(move |chapter| chapter.act == act)
    }

    /// Sum of `word_count` across `act`.
    pub fn act_words(&self, act: &str) -> i64 {
        self.chapters_in_act(act)
            .map(|chapter| chapter.word_count)
            .sum()
    }
}
