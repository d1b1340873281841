use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("invalid taxonomic id: {0}")]
    #[diagnostic(help("a taxonomic id is a positive integer, e.g. 9606"))]
    InvalidTaxonId(String),

    #[error("invalid length bounds: minimum {min} is greater than maximum {max}")]
    InvalidLengthBounds { min: usize, max: usize },

    #[error("invalid length value: {0}")]
    InvalidLength(String),

    #[error("invalid contact email: {0}")]
    InvalidEmail(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("missing required input: {0}")]
    #[diagnostic(help("pass it as a flag, put it in kira-tr.json, or drop --non-interactive"))]
    MissingInput(&'static str),

    #[error("failed to read input: {0}")]
    Prompt(String),

    #[error("NCBI request failed: {0}")]
    NcbiHttp(String),

    #[error("NCBI returned status {status}: {message}")]
    NcbiStatus { status: u16, message: String },

    #[error("NCBI reported an error: {0}")]
    NcbiService(String),

    #[error("malformed NCBI response: {0}")]
    MalformedResponse(String),

    #[error("No records found for {organism} (taxid {taxon})")]
    NoRecords { taxon: String, organism: String },

    #[error("no search results to fetch; run a search first")]
    NoActiveSession,

    #[error("failed to parse GenBank records: {0}")]
    GenbankParse(String),

    #[error("failed to write CSV report: {0}")]
    Report(String),

    #[error("failed to render chart: {0}")]
    Chart(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl KiraError {
    /// Errors raised by the remote database or while decoding its replies.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            KiraError::NcbiHttp(_)
                | KiraError::NcbiStatus { .. }
                | KiraError::NcbiService(_)
                | KiraError::MalformedResponse(_)
                | KiraError::GenbankParse(_)
        )
    }
}
