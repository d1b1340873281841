use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, RunOutcome, RunSummary};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

/// Prints progress lines to stdout as the run advances.
pub struct ConsoleOutput;

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", progress_line(&event));
    }
}

/// Console rendering of a progress event; timed steps get their duration appended.
pub fn progress_line(event: &ProgressEvent) -> String {
    match event.elapsed {
        Some(elapsed) => format!("{} ({:.2}s)", event.message, elapsed.as_secs_f64()),
        None => event.message.clone(),
    }
}

impl ConsoleOutput {
    pub fn print_outcome(summary: &RunSummary) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", outcome_message(&summary.outcome))
    }
}

pub fn outcome_message(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::NoRecords { .. } => "No records found. Exiting.".to_string(),
        RunOutcome::NoFilteredRecords { .. } => "No filtered records found. Exiting.".to_string(),
        RunOutcome::Written { records, .. } => format!("Done: {records} records reported."),
    }
}

/// Machine-readable output for `--non-interactive`; progress is silent.
pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}
