use std::env;
use std::path::{Path, PathBuf};

use quillplan_contract::{JsonSchemaValidator, PacingProfile, PlanRequest, prepare_run};
use quillplan_core::{DocumentValidator, ValidationReport};
use serde_json::Value;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut plan_path: Option<PathBuf> = None;
    let mut request_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--request" => {
                request_path = args.next().map(PathBuf::from);
            }
            _ => {
                if plan_path.is_none() {
                    plan_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let plan_path = plan_path.ok_or("missing plan path")?;
    let request_path = request_path.ok_or("missing --request path")?;

    let plan_json = load_json(&plan_path)?;
    let request: PlanRequest = serde_json::from_value(load_json(&request_path)?)?;
    let prepared = prepare_run(&request, &PacingProfile::default())?;
    let validator = JsonSchemaValidator::compile(&prepared.schema)?;

    let report = validator.validate(&plan_json);
    if !report.is_ok() {
        eprintln!("plan validation failed");
        print_report(&report);
        std::process::exit(1);
    }

    println!("plan validated successfully");
    Ok(())
}

fn load_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let json = serde_json::from_str(&contents)?;
    Ok(json)
}

fn print_report(report: &ValidationReport) {
    for issue in &report.issues {
        eprintln!("{} {} ({})", issue.pointer, issue.message, issue.kind);
    }
}
