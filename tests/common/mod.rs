#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use kira_taxon_report::domain::TaxonId;
use kira_taxon_report::error::KiraError;
use kira_taxon_report::ncbi::{EntrezClient, History, SearchReply};

#[derive(Debug, Default, Clone)]
pub struct Calls {
    pub taxonomy: usize,
    pub search_terms: Vec<String>,
    pub fetches: Vec<(usize, usize)>,
}

#[derive(Default)]
pub struct MockEntrez {
    pub organism: Option<String>,
    pub count: AtomicU64,
    pub genbank: String,
    pub fail_fetch: bool,
    pub calls: Mutex<Calls>,
}

impl MockEntrez {
    pub fn with_fixture(name: &str, count: u64) -> Self {
        let genbank = std::fs::read_to_string(format!("tests/fixtures/{name}")).unwrap();
        Self {
            organism: Some("Homo sapiens".to_string()),
            count: AtomicU64::new(count),
            genbank,
            ..Self::default()
        }
    }

    pub fn set_count(&self, count: u64) {
        self.count.store(count, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }
}

impl EntrezClient for MockEntrez {
    fn taxonomy_name(&self, _taxon: &TaxonId) -> Result<String, KiraError> {
        self.calls.lock().unwrap().taxonomy += 1;
        self.organism
            .clone()
            .ok_or_else(|| KiraError::MalformedResponse("no ScientificName".to_string()))
    }

    fn search_history(&self, _db: &str, term: &str) -> Result<SearchReply, KiraError> {
        self.calls.lock().unwrap().search_terms.push(term.to_string());
        let count = self.count.load(Ordering::SeqCst);
        let history = (count > 0).then(|| History {
            web_env: "MCID_test".to_string(),
            query_key: "1".to_string(),
        });
        Ok(SearchReply { count, history })
    }

    fn fetch_genbank(
        &self,
        _db: &str,
        _history: &History,
        start: usize,
        batch_size: usize,
    ) -> Result<String, KiraError> {
        self.calls.lock().unwrap().fetches.push((start, batch_size));
        if self.fail_fetch {
            return Err(KiraError::NcbiStatus {
                status: 500,
                message: "backend unavailable".to_string(),
            });
        }
        Ok(self.genbank.clone())
    }
}
