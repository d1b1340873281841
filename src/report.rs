use std::io::Write;

use camino::Utf8Path;
use tracing::info;

use crate::domain::SequenceRecord;
use crate::error::KiraError;
use crate::fs_util::write_atomic;

pub const CSV_HEADER: [&str; 2] = ["Accession Number", "Sequence Length"];

/// Writes `records` as a two-column table to `path`, replacing any existing file.
pub fn generate_csv(records: &[SequenceRecord], path: &Utf8Path) -> Result<(), KiraError> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    write_atomic(path, &buffer)?;
    info!(%path, rows = records.len(), "CSV report written");
    Ok(())
}

pub fn write_csv<W: Write>(records: &[SequenceRecord], writer: W) -> Result<(), KiraError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer
        .write_record(CSV_HEADER)
        .map_err(|err| KiraError::Report(err.to_string()))?;
    for record in records {
        writer
            .write_record([record.accession.as_str(), &record.length.to_string()])
            .map_err(|err| KiraError::Report(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| KiraError::Report(err.to_string()))
}
