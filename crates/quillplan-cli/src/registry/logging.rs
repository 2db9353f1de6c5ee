use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{Level, Span, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

use super::{RegistryError, RegistryResult};

const DEFAULT_STDERR_FILTER: &str = "warn";

/// Installs the run log (`logs.ndjson`, planner events only) and the stderr
/// layer, then returns the `run` span. Events recorded inside it carry the
/// run id and model.
pub fn init_run_logging(path: &Path, run_id: &str, model: &str) -> RegistryResult<Span> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::registry()
        .with(run_log_layer(file))
        .with(stderr_layer())
        .try_init()
        .map_err(|err| RegistryError::Logging(err.to_string()))?;

    Ok(run_span(run_id, model))
}

/// Stderr-only logging for commands that do not create a run directory.
pub fn init_stderr_logging() -> RegistryResult<()> {
    tracing_subscriber::registry()
        .with(stderr_layer())
        .try_init()
        .map_err(|err| RegistryError::Logging(err.to_string()))
}

fn run_span(run_id: &str, model: &str) -> Span {
    tracing::info_span!("run", run_id = %run_id, model = %model)
}

/// Only quillplan crates reach the run log; transport crates stay out.
fn run_log_targets() -> Targets {
    Targets::new().with_target("quillplan", Level::DEBUG)
}

fn run_log_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let file = Arc::new(Mutex::new(file));
    let make_writer = BoxMakeWriter::new(move || RunLogWriter {
        file: Arc::clone(&file),
    });

    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(make_writer)
        .with_filter(run_log_targets())
}

fn stderr_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_STDERR_FILTER));
    tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(filter)
}

struct RunLogWriter {
    file: Arc<Mutex<File>>,
}

impl RunLogWriter {
    fn file(&self) -> io::Result<std::sync::MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|_| io::Error::other("run log lock poisoned"))
    }
}

impl Write for RunLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file()?.flush()
    }
}
