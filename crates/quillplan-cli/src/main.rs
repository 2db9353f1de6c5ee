mod output;
mod registry;
mod settings;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use quillplan_contract::{
    ContractError, PlanRequest, PreparedRun, book_plan_json_schema, prepare_run,
    request_json_schema,
};
use quillplan_core::ValidationReport;
use quillplan_engine::{PlanningError, enforce_raw, plan_prepared};
use quillplan_ollama::OllamaClient;
use output::{Artifact, OutputError, write_document};
use registry::{
    RunContext, RunReport, RunStatus, init_run_logging, init_stderr_logging, start_run,
};
use serde::Serialize;
use settings::{Settings, load_or_create_settings};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("settings error: {0}")]
    Settings(#[from] settings::SettingsError),
    #[error("contract error: {0}")]
    Contract(#[from] ContractError),
    #[error("planning error: {0}")]
    Planning(#[from] PlanningError),
    #[error("output error: {0}")]
    Output(#[from] OutputError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document failed validation with {0} issue(s)")]
    Invalid(usize),
}

#[derive(Parser, Debug)]
#[command(name = "quillplan", version, about = "Schema-locked book planning")]
struct Cli {
    /// Settings file; created with defaults when missing.
    #[arg(long, global = true, default_value = "quillplan.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a book plan through the configured Ollama server.
    Plan(PlanArgs),
    /// Enforce and validate a saved raw generator response.
    Enforce(EnforceArgs),
    /// Print the specialized schema for a request.
    Schema(RequestArgs),
    /// Print the seeded skeleton for a request.
    Skeleton(RequestArgs),
    /// Print the JSON Schema of request files.
    RequestSchema,
    /// Print the JSON Schema of accepted plans.
    PlanSchema,
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Plan request JSON file.
    #[arg(long)]
    request: PathBuf,
    /// Write the output here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[command(flatten)]
    request: RequestArgs,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    /// Ollama base URL.
    #[arg(long, env = "OLLAMA_BASE_URL")]
    base_url: Option<String>,
    /// Ollama model name.
    #[arg(long, env = "OLLAMA_MODEL_NAME")]
    model: Option<String>,
    /// Override the configured attempt bound.
    #[arg(long)]
    max_attempts: Option<u32>,
    /// Skip schema validation of enforced documents.
    #[arg(long, default_value_t = false)]
    no_validate: bool,
}

#[derive(Args, Debug)]
struct EnforceArgs {
    #[command(flatten)]
    request: RequestArgs,
    /// Raw generator response to repair.
    #[arg(long)]
    raw: PathBuf,
    /// Skip schema validation of the enforced document.
    #[arg(long, default_value_t = false)]
    no_validate: bool,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Plan(args) => run_plan(&cli.config, args),
        Command::Enforce(args) => run_enforce(&cli.config, args),
        Command::Schema(args) => {
            let prepared = prepare(&cli.config, &args)?;
            emit(&prepared.schema.to_json(), args.out.as_deref())
        }
        Command::Skeleton(args) => {
            let prepared = prepare(&cli.config, &args)?;
            emit(&prepared.skeleton, args.out.as_deref())
        }
        Command::RequestSchema => emit(&request_json_schema(), None),
        Command::PlanSchema => emit(&book_plan_json_schema(), None),
    }
}

fn run_plan(config_path: &Path, args: PlanArgs) -> Result<(), CliError> {
    let PlanArgs {
        request: RequestArgs { request, out },
        run_dir,
        base_url,
        model,
        max_attempts,
        no_validate,
    } = args;

    let mut settings = load_or_create_settings(config_path)?;
    if let Some(base_url) = base_url {
        settings.llm.base_url = base_url;
    }
    if let Some(model) = model {
        settings.llm.model = model;
    }
    if let Some(max_attempts) = max_attempts {
        settings.planner.max_attempts = max_attempts;
    }
    if no_validate {
        settings.planner.validate = false;
    }

    let plan_request = load_request(&request)?;
    let prepared = prepare_run(&plan_request, &settings.pacing)?;

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        run_dir,
        request_path: request.clone(),
        settings: settings.clone(),
    };
    let run = start_run(&run_ctx)?;
    let _run_span = init_run_logging(&run.logs_path(), &run_id, &settings.llm.model)?.entered();

    tracing::info!(event = "run_started", base_url = %settings.llm.base_url);

    run.write(Artifact::Schema, &prepared.schema.to_json())?;
    run.write(Artifact::Skeleton, &prepared.skeleton)?;
    tracing::info!(event = "contract_written", path = %run.root.display());

    let timer = Instant::now();
    let client = OllamaClient::new(settings.llm.clone());
    let outcome = plan_prepared(&prepared, &client, &settings.planner_options());
    let word_targets: BTreeMap<String, i64> = prepared.word_targets.iter().cloned().collect();

    match outcome {
        Ok(planned) => {
            let plan_path = run.write(Artifact::Plan, &planned.document)?;
            if let Some(out) = out.as_deref() {
                write_document(out, &planned.document)?;
            }
            run.write(
                Artifact::Report,
                &RunReport {
                    run_id: run_id.clone(),
                    status: RunStatus::Accepted,
                    attempts: planned.attempts,
                    history: planned.history,
                    enforcement: Some(planned.report),
                    word_targets,
                    duration_ms: timer.elapsed().as_millis(),
                    error: None,
                },
            )?;
            tracing::info!(
                event = "run_finished",
                status = "success",
                attempts = planned.attempts,
                path = %plan_path.display()
            );
            println!("{}", plan_path.display());
            Ok(())
        }
        Err(err) => {
            let (attempts, history) = match &err {
                PlanningError::RetryExhausted {
                    attempts, history, ..
                } => (*attempts, history.clone()),
                _ => (0, Vec::new()),
            };
            run.write(
                Artifact::Report,
                &RunReport {
                    run_id,
                    status: RunStatus::Failed,
                    attempts,
                    history,
                    enforcement: None,
                    word_targets,
                    duration_ms: timer.elapsed().as_millis(),
                    error: Some(err.to_string()),
                },
            )?;
            tracing::warn!(event = "run_finished", status = "failed", error = %err);
            Err(err.into())
        }
    }
}

fn run_enforce(config_path: &Path, args: EnforceArgs) -> Result<(), CliError> {
    init_stderr_logging()?;
    let prepared = prepare(config_path, &args.request)?;
    let raw = std::fs::read_to_string(&args.raw)?;

    let outcome = enforce_raw(&prepared, &raw, !args.no_validate)?;
    tracing::info!(
        event = "enforced",
        repairs = outcome.report.repairs(),
        issues = outcome.validation.issues.len()
    );
    eprintln!("{}", serde_json::to_string_pretty(&outcome.report)?);
    emit(&outcome.document, args.request.out.as_deref())?;

    if outcome.validation.is_ok() {
        Ok(())
    } else {
        print_report(&outcome.validation);
        Err(CliError::Invalid(outcome.validation.issues.len()))
    }
}

fn prepare(config_path: &Path, args: &RequestArgs) -> Result<PreparedRun, CliError> {
    let settings: Settings = load_or_create_settings(config_path)?;
    let request = load_request(&args.request)?;
    Ok(prepare_run(&request, &settings.pacing)?)
}

fn load_request(path: &Path) -> Result<PlanRequest, CliError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn emit<T: Serialize>(value: &T, out: Option<&Path>) -> Result<(), CliError> {
    match out {
        Some(path) => write_document(path, value)?,
        None => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn print_report(report: &ValidationReport) {
    for issue in &report.issues {
        eprintln!("rejected {issue}");
    }
}
