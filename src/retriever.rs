use tracing::{info, warn};

use crate::domain::{LengthBounds, MAX_BATCH_SIZE, SequenceRecord, TaxonId};
use crate::error::KiraError;
use crate::genbank;
use crate::ncbi::{EntrezClient, History, NUCLEOTIDE_DB};

/// State captured by a successful search and consumed by [`Retriever::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSession {
    pub taxon: TaxonId,
    pub organism: String,
    pub history: History,
    pub count: u64,
    pub bounds: LengthBounds,
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Active(SearchSession),
}

/// One fetched batch: the size asked for, how many entries parsed, and the
/// in-range records.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub requested: usize,
    pub parsed: usize,
    pub records: Vec<SequenceRecord>,
}

pub struct Retriever<C: EntrezClient> {
    client: C,
    state: SessionState,
}

impl<C: EntrezClient> Retriever<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: SessionState::Idle,
        }
    }

    pub fn session(&self) -> Option<&SearchSession> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Active(session) => Some(session),
        }
    }

    /// Runs a history-enabled nucleotide search for every record of `taxon`.
    ///
    /// Any previous session is dropped first, so a failed search always
    /// leaves the retriever idle.
    pub fn search(&mut self, taxon: &TaxonId, bounds: LengthBounds) -> Result<u64, KiraError> {
        self.state = SessionState::Idle;
        info!(taxid = %taxon, "searching for records");

        let result = self.search_inner(taxon, bounds);
        match &result {
            Ok(count) => info!(taxid = %taxon, count, "search complete"),
            Err(KiraError::NoRecords { .. }) => info!(taxid = %taxon, "no records found"),
            Err(err) => warn!(taxid = %taxon, error = %err, "search failed"),
        }
        result
    }

    fn search_inner(&mut self, taxon: &TaxonId, bounds: LengthBounds) -> Result<u64, KiraError> {
        let organism = self.client.taxonomy_name(taxon)?;
        info!(taxid = %taxon, %organism, "organism resolved");

        let reply = self
            .client
            .search_history(NUCLEOTIDE_DB, &taxon.organism_term())?;
        if reply.count == 0 {
            return Err(KiraError::NoRecords {
                taxon: taxon.to_string(),
                organism,
            });
        }
        let history = reply.history.ok_or_else(|| {
            KiraError::MalformedResponse("search returned no history handle".to_string())
        })?;

        self.state = SessionState::Active(SearchSession {
            taxon: taxon.clone(),
            organism,
            history,
            count: reply.count,
            bounds,
        });
        Ok(reply.count)
    }

    /// Fetches one batch starting at `start` and keeps the records whose
    /// length lies within the session bounds, in database order.
    pub fn fetch(
        &self,
        start: usize,
        max_records: usize,
    ) -> Result<Vec<SequenceRecord>, KiraError> {
        self.fetch_report(start, max_records)
            .map(|report| report.records)
    }

    /// Same as [`Retriever::fetch`], keeping the batch counts.
    pub fn fetch_report(&self, start: usize, max_records: usize) -> Result<FetchReport, KiraError> {
        let SessionState::Active(session) = &self.state else {
            warn!("fetch called without an active search session");
            return Err(KiraError::NoActiveSession);
        };

        let batch_size = max_records.min(MAX_BATCH_SIZE);
        if batch_size == 0 {
            return Ok(FetchReport {
                requested: 0,
                parsed: 0,
                records: Vec::new(),
            });
        }

        let result = self
            .client
            .fetch_genbank(NUCLEOTIDE_DB, &session.history, start, batch_size)
            .and_then(|text| genbank::parse_records(&text));
        let parsed = match result {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(start, batch_size, error = %err, "fetch failed");
                return Err(err);
            }
        };

        let parsed_count = parsed.len();
        let records = filter_by_length(parsed, session.bounds);
        info!(
            start,
            batch_size,
            parsed = parsed_count,
            kept = records.len(),
            bounds = %session.bounds,
            "fetch complete"
        );
        Ok(FetchReport {
            requested: batch_size,
            parsed: parsed_count,
            records,
        })
    }
}

pub fn filter_by_length(records: Vec<SequenceRecord>, bounds: LengthBounds) -> Vec<SequenceRecord> {
    records
        .into_iter()
        .filter(|record| bounds.contains(record.length))
        .collect()
}
