use std::fmt;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::info;

use crate::chart;
use crate::domain::{LengthBounds, SequenceRecord, TaxonId, chart_filename, csv_filename};
use crate::error::KiraError;
use crate::ncbi::EntrezClient;
use crate::report;
use crate::retriever::Retriever;

pub const DEFAULT_MAX_RECORDS: usize = 20;

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub taxon: TaxonId,
    pub bounds: LengthBounds,
    pub start: usize,
    pub max_records: usize,
    pub output_dir: Utf8PathBuf,
}

impl RunRequest {
    pub fn csv_path(&self) -> Utf8PathBuf {
        self.output_dir.join(csv_filename(&self.taxon))
    }

    pub fn chart_path(&self) -> Utf8PathBuf {
        self.output_dir.join(chart_filename(&self.taxon))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    NoRecords {
        reason: String,
    },
    NoFilteredRecords {
        reason: String,
    },
    Written {
        csv_path: String,
        chart_path: String,
        records: usize,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub taxid: String,
    pub organism: Option<String>,
    pub total_count: Option<u64>,
    /// Batch size sent to efetch, after the per-request cap.
    pub requested: Option<usize>,
    /// Entries parsed from the batch before length filtering.
    pub parsed: Option<usize>,
    pub min_length: usize,
    pub max_length: Option<usize>,
    pub records: Vec<SequenceRecord>,
    pub outcome: RunOutcome,
    pub finished_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Search,
    Fetch,
    Report,
    Chart,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Search => write!(f, "Search"),
            Phase::Fetch => write!(f, "Fetch"),
            Phase::Report => write!(f, "Report"),
            Phase::Chart => write!(f, "Chart"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C: EntrezClient> {
    retriever: Retriever<C>,
}

impl<C: EntrezClient> App<C> {
    pub fn new(client: C) -> Self {
        Self {
            retriever: Retriever::new(client),
        }
    }

    pub fn retriever(&self) -> &Retriever<C> {
        &self.retriever
    }

    /// Search, fetch one batch, then write the CSV report and the chart.
    ///
    /// Remote failures end the run with a "no records" outcome instead of an
    /// error; only local write failures are returned as `Err`.
    pub fn run(
        &mut self,
        request: &RunRequest,
        sink: &dyn ProgressSink,
    ) -> Result<RunSummary, KiraError> {
        let taxon = &request.taxon;
        let mut summary = RunSummary {
            taxid: taxon.to_string(),
            organism: None,
            total_count: None,
            requested: None,
            parsed: None,
            min_length: request.bounds.min(),
            max_length: (request.bounds.max() != usize::MAX).then_some(request.bounds.max()),
            records: Vec::new(),
            outcome: RunOutcome::NoRecords {
                reason: String::new(),
            },
            finished_at: String::new(),
        };

        emit(
            sink,
            Phase::Search,
            format!("Searching for records with taxID: {taxon}"),
            None,
        );
        let started = Instant::now();
        let search = self.retriever.search(taxon, request.bounds);
        summary.organism = match (&search, self.retriever.session()) {
            (_, Some(session)) => Some(session.organism.clone()),
            (Err(KiraError::NoRecords { organism, .. }), None) => Some(organism.clone()),
            _ => None,
        };
        if let Some(organism) = &summary.organism {
            emit(
                sink,
                Phase::Search,
                format!("Organism: {organism} (TaxID: {taxon})"),
                None,
            );
        }
        match search {
            Ok(count) => {
                summary.total_count = Some(count);
                emit(
                    sink,
                    Phase::Search,
                    format!("Found {count} records"),
                    Some(started.elapsed()),
                );
            }
            Err(err) => {
                let reason = if err.is_remote() {
                    format!("Error searching TaxID {taxon}: {err}")
                } else {
                    err.to_string()
                };
                emit(sink, Phase::Search, reason.clone(), Some(started.elapsed()));
                summary.outcome = RunOutcome::NoRecords { reason };
                return Ok(finish(summary));
            }
        }

        emit(sink, Phase::Fetch, "Fetching filtered records...", None);
        let started = Instant::now();
        let batch = match self.retriever.fetch_report(request.start, request.max_records) {
            Ok(batch) => batch,
            Err(err) => {
                let reason = if err.is_remote() {
                    format!("Error fetching records: {err}")
                } else {
                    err.to_string()
                };
                emit(sink, Phase::Fetch, reason.clone(), Some(started.elapsed()));
                summary.outcome = RunOutcome::NoFilteredRecords { reason };
                return Ok(finish(summary));
            }
        };
        summary.requested = Some(batch.requested);
        summary.parsed = Some(batch.parsed);
        let records = batch.records;
        emit(
            sink,
            Phase::Fetch,
            format!(
                "Kept {} records with length in {}",
                records.len(),
                request.bounds
            ),
            Some(started.elapsed()),
        );
        if records.is_empty() {
            summary.outcome = RunOutcome::NoFilteredRecords {
                reason: format!("no fetched record has a length in {}", request.bounds),
            };
            return Ok(finish(summary));
        }

        let csv_path = request.csv_path();
        let chart_path = request.chart_path();
        write_outputs(&records, &csv_path, &chart_path, sink)?;

        summary.outcome = RunOutcome::Written {
            csv_path: csv_path.to_string(),
            chart_path: chart_path.to_string(),
            records: records.len(),
        };
        summary.records = records;
        Ok(finish(summary))
    }
}

fn write_outputs(
    records: &[SequenceRecord],
    csv_path: &Utf8Path,
    chart_path: &Utf8Path,
    sink: &dyn ProgressSink,
) -> Result<(), KiraError> {
    let started = Instant::now();
    report::generate_csv(records, csv_path)?;
    emit(
        sink,
        Phase::Report,
        format!("CSV report generated: {csv_path}"),
        Some(started.elapsed()),
    );

    let started = Instant::now();
    chart::generate_plot(records, chart_path)?;
    emit(
        sink,
        Phase::Chart,
        format!("Plot saved as: {chart_path}"),
        Some(started.elapsed()),
    );
    Ok(())
}

fn emit(
    sink: &dyn ProgressSink,
    phase: Phase,
    message: impl Into<String>,
    elapsed: Option<Duration>,
) {
    sink.event(ProgressEvent {
        phase,
        message: message.into(),
        elapsed,
    });
}

fn finish(mut summary: RunSummary) -> RunSummary {
    summary.finished_at = chrono::Utc::now().to_rfc3339();
    info!(taxid = %summary.taxid, outcome = ?summary.outcome, "run finished");
    summary
}
