use quillplan_core::{
    ArrayLock, CardinalityLock, CategoryRule, CategoryTarget, ChatMessage, EnforcementContext,
    JsonPath, LockedValue, SchemaNode, Specialization, derive_skeleton, inject_seed, specialize,
};
use serde_json::{Value, json};
use tracing::debug;

use crate::errors::{ContractError, Result};
use crate::model::{PacingProfile, PlanRequest, PointOfView};
use crate::pacing::{
    chapter_lock, check_profile, check_word_targets, compute_word_targets, targets_value,
};
use crate::prompt::build_prompt;
use crate::schema::{
    ACT_FIELD, CHAPTER_PLAN, SEQUENCE_FIELD, WORD_COUNT_FIELD, WORD_COUNT_FLOOR,
    base_book_plan_schema,
};
use crate::seed::{chapter_seed_overlay, placeholder_chapter};
use crate::selection::{MIN_SELECTION_ITEMS, research_selection_rules};

pub const DEFAULT_TONE: &str = "witty";
pub const DEFAULT_PACE: &str = "fast paced";
pub const POV_KIND: &str = "third_person_objective";
pub const POV_RULE: &str =
    "no inner thoughts; only observable actions, dialogue, and sensory details";

/// Everything one planning run needs, derived from a request and a profile.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    /// Specialized contract the output is validated against.
    pub schema: SchemaNode,
    /// Seeded skeleton handed to the generator.
    pub skeleton: Value,
    pub context: EnforcementContext,
    pub messages: Vec<ChatMessage>,
    pub word_targets: Vec<(String, i64)>,
    pub chapter_lock: CardinalityLock,
}

impl PreparedRun {
    pub fn word_target(&self, act: &str) -> Option<i64> {
        self.word_targets
            .iter()
            .find(|(name, _)| name == act)
            .map(|(_, words)| *words)
    }
}

/// Tone and pace named by the book model, with defaults.
pub fn tone_and_pace(book_model: &Value) -> (String, String) {
    let read = |pointer: &str, default: &str| {
        book_model
            .pointer(pointer)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };
    (read("/tone/type", DEFAULT_TONE), read("/pace/type", DEFAULT_PACE))
}

/// Build the specialized schema, seeded skeleton, enforcement context and
/// prompt for one run.
pub fn prepare_run(request: &PlanRequest, profile: &PacingProfile) -> Result<PreparedRun> {
    let base = base_book_plan_schema()?;
    check_request(request, &base)?;

    let chapters: JsonPath = CHAPTER_PLAN.parse()?;
    let known_acts = schema_acts(&base, &chapters)?;
    check_profile(profile, &known_acts)?;

    let lock = chapter_lock(profile, request.expected_chapters)?;
    let word_targets = compute_word_targets(request.max_total_words, profile);
    check_word_targets(
        &word_targets,
        profile,
        |act| target_minimum(&base, act),
        WORD_COUNT_FLOOR,
    )?;
    let (tone, pace) = tone_and_pace(&request.book_model);
    let pov = PointOfView {
        kind: POV_KIND.to_string(),
        rule: POV_RULE.to_string(),
    };

    let locks = vec![
        locked("constraints.summary", json!(request.summary_text))?,
        locked("constraints.max_total_words", json!(request.max_total_words))?,
        locked("constraints.pov", serde_json::to_value(&pov)?)?,
        locked("constraints.tone", json!(tone))?,
        locked("constraints.pace", json!(pace))?,
        locked("pacing.acts", lock.to_value())?,
        locked("pacing.word_targets", targets_value(&word_targets))?,
        locked("canon.book_model", request.book_model.clone())?,
        locked("canon.blueprint", request.blueprint.clone())?,
    ];

    let mut consts: Vec<(JsonPath, Value)> = locks
        .iter()
        .filter(|lock| lock.path.leaf() != "pov")
        .map(|lock| (lock.path.clone(), lock.value.clone()))
        .collect();
    consts.push(("constraints.pov.type".parse::<JsonPath>()?, json!(pov.kind)));
    consts.push(("constraints.pov.rule".parse::<JsonPath>()?, json!(pov.rule)));

    let specialization = Specialization {
        consts,
        min_items: vec![
            (
                "research_selection.mythic_figures".parse::<JsonPath>()?,
                MIN_SELECTION_ITEMS as u64,
            ),
            (
                "research_selection.locales".parse::<JsonPath>()?,
                MIN_SELECTION_ITEMS as u64,
            ),
        ],
        array: Some(ArrayLock {
            path: chapters.clone(),
            discriminator: ACT_FIELD.to_string(),
            cardinality: lock.clone(),
            required_present: None,
        }),
    };
    let schema = specialize(&base, &specialization)?;

    let mut skeleton = derive_skeleton(&schema);
    inject_seed(&mut skeleton, &chapter_seed_overlay(&lock)?);

    let categories = CategoryRule {
        array_path: chapters,
        discriminator: ACT_FIELD.to_string(),
        sequence_field: SEQUENCE_FIELD.to_string(),
        budget_field: WORD_COUNT_FIELD.to_string(),
        budget_floor: WORD_COUNT_FLOOR,
        categories: lock
            .iter()
            .map(|(act, count)| CategoryTarget {
                name: act.to_string(),
                count,
                budget: word_targets
                    .iter()
                    .find(|(name, _)| name == act)
                    .map(|(_, words)| *words),
                placeholder: placeholder_chapter(act),
            })
            .collect(),
    };

    let context = EnforcementContext {
        locks,
        categories: Some(categories),
        selections: research_selection_rules(&schema, &request.book_model, &request.summary_text)?,
    };

    debug!(
        chapters = lock.total(),
        max_total_words = request.max_total_words,
        tone = %tone,
        pace = %pace,
        "prepared planning run"
    );

    Ok(PreparedRun {
        schema,
        skeleton,
        context,
        messages: build_prompt(request),
        word_targets,
        chapter_lock: lock,
    })
}

fn locked(path: &str, value: Value) -> Result<LockedValue> {
    Ok(LockedValue::new(path.parse::<JsonPath>()?, value))
}

fn check_request(request: &PlanRequest, base: &SchemaNode) -> Result<()> {
    let floor = base
        .resolve(&"constraints.max_total_words".parse::<JsonPath>()?)
        .and_then(|node| node.minimum)
        .unwrap_or(1);
    if request.max_total_words < floor {
        return Err(ContractError::InvalidRequest(format!(
            "max_total_words must be at least {floor}, got {}",
            request.max_total_words
        )));
    }
    if !request.book_model.is_object() || !request.blueprint.is_object() {
        return Err(ContractError::InvalidRequest(
            "book_model and blueprint must be JSON objects".to_string(),
        ));
    }
    Ok(())
}

/// Schema minimum of `pacing.word_targets.<act>`.
fn target_minimum(base: &SchemaNode, act: &str) -> Option<i64> {
    let path = format!("pacing.word_targets.{act}").parse::<JsonPath>().ok()?;
    base.resolve(&path).and_then(|node| node.minimum)
}

fn schema_acts(base: &SchemaNode, chapters: &JsonPath) -> Result<Vec<String>> {
    let acts = base
        .resolve(chapters)
        .and_then(|node| node.items.as_deref())
        .and_then(|items| items.properties.get(ACT_FIELD))
        .map(|node| {
            node.enum_values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if acts.is_empty() {
        return Err(ContractError::InvalidRequest(format!(
            "schema declares no act categories at {chapters}[].{ACT_FIELD}"
        )));
    }
    Ok(acts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quillplan_core::get_path;

    fn request() -> PlanRequest {
        PlanRequest {
            book_model: json!({"book": {"idea": "A fox meets the Leshy"}, "tone": {"type": "gentle"}}),
            blueprint: json!({"structure": "three acts"}),
            research: json!({}),
            planning_text: String::new(),
            summary_text: "A fox finds a lantern.".to_string(),
            max_total_words: 60_000,
            expected_chapters: Some(24),
        }
    }

    #[test]
    fn tone_and_pace_fall_back_to_defaults() {
        assert_eq!(
            tone_and_pace(&json!({"tone": {"type": "gentle"}})),
            ("gentle".to_string(), DEFAULT_PACE.to_string())
        );
        assert_eq!(
            tone_and_pace(&json!({"tone": "flat"})),
            (DEFAULT_TONE.to_string(), DEFAULT_PACE.to_string())
        );
    }

    #[test]
    fn prepared_run_locks_chapter_layout() {
        let run = prepare_run(&request(), &PacingProfile::default()).expect("prepare");

        let chapters: JsonPath = "chapter_plan".parse().expect("path");
        let array = run.schema.resolve(&chapters).expect("chapter array");
        assert_eq!(array.min_items, Some(24));
        assert_eq!(array.max_items, Some(24));
        assert_eq!(run.schema.all_of.len(), 3);

        let seeded = get_path(&run.skeleton, &chapters)
            .and_then(Value::as_array)
            .expect("seeded chapters");
        assert_eq!(seeded.len(), 24);
        assert_eq!(seeded[12]["act"], "II");

        let rule = run.context.categories.as_ref().expect("category rule");
        assert_eq!(rule.total(), 24);
        assert_eq!(rule.categories[2].budget, Some(9_000));
        assert_eq!(run.word_target("I"), Some(27_000));
        assert_eq!(run.context.locks.len(), 9);
    }

    #[test]
    fn tone_is_burned_into_schema() {
        let run = prepare_run(&request(), &PacingProfile::default()).expect("prepare");
        let tone = run
            .schema
            .resolve(&"constraints.tone".parse::<JsonPath>().expect("path"))
            .and_then(|node| node.const_value.clone());
        assert_eq!(tone, Some(json!("gentle")));
        let pov_kind = run
            .schema
            .resolve(&"constraints.pov.type".parse::<JsonPath>().expect("path"))
            .and_then(|node| node.const_value.clone());
        assert_eq!(pov_kind, Some(json!(POV_KIND)));
    }

    #[test]
    fn rejects_mismatched_chapter_count_and_small_budgets() {
        let mut bad = request();
        bad.expected_chapters = Some(20);
        assert!(prepare_run(&bad, &PacingProfile::default()).is_err());

        let mut bad = request();
        bad.max_total_words = 5_000;
        assert!(matches!(
            prepare_run(&bad, &PacingProfile::default()),
            Err(ContractError::InvalidRequest(_))
        ));
    }

    #[test]
    fn unreachable_act_budgets_fail_before_generation() {
        let mut crowded = PacingProfile::default();
        crowded.acts[0].chapters = 40;
        let mut small = request();
        small.max_total_words = 10_000;
        small.expected_chapters = None;
        assert!(matches!(
            prepare_run(&small, &crowded),
            Err(ContractError::UnsatisfiablePacing(_))
        ));

        let mut thin = PacingProfile::default();
        thin.acts[1].word_share = 0.50;
        thin.acts[2].word_share = 0.05;
        small.expected_chapters = Some(24);
        assert!(matches!(
            prepare_run(&small, &thin),
            Err(ContractError::UnsatisfiablePacing(_))
        ));

        assert!(prepare_run(&small, &PacingProfile::default()).is_ok());
    }
}
