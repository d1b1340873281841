//! GenBank flat-file decoding for efetch `rettype=gb` replies.

use std::io::Cursor;

use gb_io::reader::SeqReader;
use gb_io::seq::Seq;

use crate::domain::SequenceRecord;
use crate::error::KiraError;

/// Parses every entry in `text`, in file order.
pub fn parse_records(text: &str) -> Result<Vec<SequenceRecord>, KiraError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    SeqReader::new(Cursor::new(text.as_bytes()))
        .enumerate()
        .map(|(index, entry)| {
            let seq = entry
                .map_err(|err| KiraError::GenbankParse(format!("entry {}: {err}", index + 1)))?;
            to_record(&seq, index)
        })
        .collect()
}

fn to_record(seq: &Seq, index: usize) -> Result<SequenceRecord, KiraError> {
    let accession = record_id(seq).ok_or_else(|| {
        KiraError::GenbankParse(format!("entry {} has no accession", index + 1))
    })?;
    Ok(SequenceRecord::new(accession, sequence_length(seq)))
}

// VERSION is preferred (ACCESSION.VERSION), then the primary ACCESSION, then LOCUS.
fn record_id(seq: &Seq) -> Option<String> {
    [&seq.version, &seq.accession, &seq.name]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .filter_map(|value| value.split_whitespace().next())
        .map(str::to_string)
        .next()
}

// CON records carry no residues, only the length declared on the LOCUS line.
fn sequence_length(seq: &Seq) -> usize {
    if seq.seq.is_empty() {
        seq.len.unwrap_or(0)
    } else {
        seq.seq.len()
    }
}
