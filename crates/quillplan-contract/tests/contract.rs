use std::fs;
use std::path::Path;

use quillplan_contract::{
    BookPlan, JsonSchemaValidator, PacingProfile, PlanRequest, prepare_run, validate_document_json,
};
use quillplan_core::{DocumentValidator, JsonPath, get_path_mut, set_path};
use serde_json::{Value, json};

fn load_request() -> PlanRequest {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/request.json");
    let contents =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing json at {}", path.display()));
    serde_json::from_str(&contents).expect("parse request")
}

fn path(text: &str) -> JsonPath {
    text.parse().expect("path")
}

fn filled_skeleton(skeleton: &Value) -> Value {
    let mut document = skeleton.clone();
    set_path(
        &mut document,
        &path("research_selection.mythic_figures"),
        json!([{"name": "Baba Yaga"}, {"name": "Leshy"}, {"name": "Domovoi"}]),
    );
    set_path(
        &mut document,
        &path("research_selection.locales"),
        json!([{"name": "Meadow"}, {"name": "Forest Edge"}, {"name": "Enchanted Forest"}]),
    );
    document
}

#[test]
fn seeded_skeleton_with_selection_validates() {
    let request = load_request();
    let prepared = prepare_run(&request, &PacingProfile::default()).expect("prepare run");
    let validator = JsonSchemaValidator::compile(&prepared.schema).expect("compile schema");

    let document = filled_skeleton(&prepared.skeleton);
    let report = validator.validate(&document);
    assert!(report.is_ok(), "unexpected errors: {}", report.summary(5));

    let plan: BookPlan = serde_json::from_value(document).expect("typed plan");
    assert_eq!(plan.chapter_plan.len(), 24);
    assert_eq!(plan.chapters_in_act("III").count(), 3);
    assert_eq!(plan.constraints.tone, "witty");
    assert_eq!(plan.pacing.word_targets["II"], 24_000);
}

#[test]
fn bare_skeleton_misses_research_minimum() {
    let prepared = prepare_run(&load_request(), &PacingProfile::default()).expect("prepare run");
    let validator = JsonSchemaValidator::compile(&prepared.schema).expect("compile schema");

    let report = validator.validate(&prepared.skeleton);
    assert!(!report.is_ok());
    assert!(
        report
            .issues
            .iter()
            .any(|issue| issue.pointer.starts_with("/research_selection"))
    );
}

#[test]
fn locked_values_and_lengths_are_checked() {
    let prepared = prepare_run(&load_request(), &PacingProfile::default()).expect("prepare run");
    let schema_json = prepared.schema.to_json();

    let mut drifted = filled_skeleton(&prepared.skeleton);
    set_path(&mut drifted, &path("constraints.tone"), json!("grim"));
    let report = validate_document_json(&drifted, &schema_json).expect("compile");
    assert!(report.rejects("/constraints/tone"));

    let mut short = filled_skeleton(&prepared.skeleton);
    get_path_mut(&mut short, &path("chapter_plan"))
        .and_then(Value::as_array_mut)
        .expect("chapters")
        .pop();
    let report = validate_document_json(&short, &schema_json).expect("compile");
    assert!(!report.is_ok());

    let mut no_finale = filled_skeleton(&prepared.skeleton);
    let chapters = get_path_mut(&mut no_finale, &path("chapter_plan"))
        .and_then(Value::as_array_mut)
        .expect("chapters");
    for chapter in chapters.iter_mut() {
        if chapter["act"] == "III" {
            chapter["act"] = json!("II");
        }
    }
    let report = validate_document_json(&no_finale, &schema_json).expect("compile");
    assert!(!report.is_ok());
}

#[test]
fn undeclared_keys_are_rejected() {
    let prepared = prepare_run(&load_request(), &PacingProfile::default()).expect("prepare run");
    let validator = JsonSchemaValidator::compile(&prepared.schema).expect("compile schema");

    let mut document = filled_skeleton(&prepared.skeleton);
    document["notes"] = json!("scratch");
    assert!(!validator.validate(&document).is_ok());
}
