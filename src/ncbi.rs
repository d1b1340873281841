use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::debug;

use crate::domain::{ContactEmail, TaxonId};
use crate::error::KiraError;

pub const EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
pub const TOOL_NAME: &str = "kira-tr";
pub const NUCLEOTIDE_DB: &str = "nucleotide";

/// Server-side handle on a previous esearch (`WebEnv` + `query_key`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    pub web_env: String,
    pub query_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReply {
    pub count: u64,
    pub history: Option<History>,
}

#[derive(Debug, Clone)]
pub struct EntrezIdentity {
    pub email: ContactEmail,
    pub api_key: Option<String>,
}

pub trait EntrezClient {
    fn taxonomy_name(&self, taxon: &TaxonId) -> Result<String, KiraError>;
    fn search_history(&self, db: &str, term: &str) -> Result<SearchReply, KiraError>;
    fn fetch_genbank(
        &self,
        db: &str,
        history: &History,
        start: usize,
        batch_size: usize,
    ) -> Result<String, KiraError>;
}

impl<C: EntrezClient + ?Sized> EntrezClient for &C {
    fn taxonomy_name(&self, taxon: &TaxonId) -> Result<String, KiraError> {
        (**self).taxonomy_name(taxon)
    }

    fn search_history(&self, db: &str, term: &str) -> Result<SearchReply, KiraError> {
        (**self).search_history(db, term)
    }

    fn fetch_genbank(
        &self,
        db: &str,
        history: &History,
        start: usize,
        batch_size: usize,
    ) -> Result<String, KiraError> {
        (**self).fetch_genbank(db, history, start, batch_size)
    }
}

#[derive(Clone)]
pub struct EntrezHttpClient {
    client: Client,
    base_url: String,
    identity: EntrezIdentity,
}

impl EntrezHttpClient {
    pub fn new(identity: EntrezIdentity) -> Result<Self, KiraError> {
        Self::with_base_url(identity, EUTILS_BASE_URL)
    }

    pub fn with_base_url(identity: EntrezIdentity, base_url: &str) -> Result<Self, KiraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&user_agent())
                .map_err(|err| KiraError::NcbiHttp(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| KiraError::NcbiHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            identity,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query for the taxonomy efetch that resolves a scientific name.
    pub fn taxonomy_params(&self, taxon: &TaxonId) -> Vec<(&'static str, String)> {
        self.with_identity(vec![
            ("db", "taxonomy".to_string()),
            ("id", taxon.as_str().to_string()),
            ("retmode", "xml".to_string()),
        ])
    }

    /// Query for a history-enabled esearch.
    pub fn search_params(&self, db: &str, term: &str) -> Vec<(&'static str, String)> {
        self.with_identity(vec![
            ("db", db.to_string()),
            ("term", term.to_string()),
            ("usehistory", "y".to_string()),
            ("retmode", "json".to_string()),
        ])
    }

    /// Query for one GenBank batch read from a stored search.
    pub fn fetch_params(
        &self,
        db: &str,
        history: &History,
        start: usize,
        batch_size: usize,
    ) -> Vec<(&'static str, String)> {
        self.with_identity(vec![
            ("db", db.to_string()),
            ("rettype", "gb".to_string()),
            ("retmode", "text".to_string()),
            ("retstart", start.to_string()),
            ("retmax", batch_size.to_string()),
            ("WebEnv", history.web_env.clone()),
            ("query_key", history.query_key.clone()),
        ])
    }

    fn with_identity(
        &self,
        mut params: Vec<(&'static str, String)>,
    ) -> Vec<(&'static str, String)> {
        params.push(("tool", TOOL_NAME.to_string()));
        params.push(("email", self.identity.email.as_str().to_string()));
        if let Some(api_key) = self
            .identity
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
        {
            params.push(("api_key", api_key.to_string()));
        }
        params
    }

    // Entrez calls are made exactly once; failures surface to the caller.
    fn get_text(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String, KiraError> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!(%url, "entrez request");
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .map_err(|err| KiraError::NcbiHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response
            .text()
            .map_err(|err| KiraError::NcbiHttp(err.to_string()))
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, KiraError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "NCBI request failed".to_string());
        Err(KiraError::NcbiStatus { status, message })
    }
}

/// `User-Agent` sent with every Entrez request.
pub fn user_agent() -> String {
    format!("{TOOL_NAME}/{}", env!("CARGO_PKG_VERSION"))
}

impl EntrezClient for EntrezHttpClient {
    fn taxonomy_name(&self, taxon: &TaxonId) -> Result<String, KiraError> {
        let body = self.get_text("efetch.fcgi", &self.taxonomy_params(taxon))?;
        parse_taxonomy_xml(&body)
    }

    fn search_history(&self, db: &str, term: &str) -> Result<SearchReply, KiraError> {
        let body = self.get_text("esearch.fcgi", &self.search_params(db, term))?;
        parse_esearch_json(&body)
    }

    fn fetch_genbank(
        &self,
        db: &str,
        history: &History,
        start: usize,
        batch_size: usize,
    ) -> Result<String, KiraError> {
        self.get_text(
            "efetch.fcgi",
            &self.fetch_params(db, history, start, batch_size),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename = "TaxaSet")]
struct TaxaSetXml {
    #[serde(rename = "Taxon", default)]
    taxa: Vec<TaxonXml>,
}

#[derive(Debug, Deserialize)]
struct TaxonXml {
    #[serde(rename = "ScientificName")]
    scientific_name: Option<String>,
}

/// Extracts the scientific name of the first `Taxon` in an efetch taxonomy reply.
pub fn parse_taxonomy_xml(xml: &str) -> Result<String, KiraError> {
    if let Some(message) = entrez_xml_error(xml) {
        return Err(KiraError::NcbiService(message));
    }
    let parsed: TaxaSetXml = quick_xml::de::from_str(xml)
        .map_err(|err| KiraError::MalformedResponse(format!("taxonomy XML: {err}")))?;
    parsed
        .taxa
        .into_iter()
        .next()
        .and_then(|taxon| taxon.scientific_name)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            KiraError::MalformedResponse("taxonomy reply has no ScientificName".to_string())
        })
}

fn entrez_xml_error(xml: &str) -> Option<String> {
    let re = Regex::new(r"(?s)<ERROR>(.*?)</ERROR>").ok()?;
    re.captures(xml)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

#[derive(Debug, Deserialize)]
struct ESearchEnvelope {
    #[serde(default)]
    esearchresult: Option<ESearchResultJson>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ESearchResultJson {
    #[serde(default)]
    count: Option<String>,
    #[serde(default)]
    webenv: Option<String>,
    #[serde(default)]
    querykey: Option<String>,
    #[serde(rename = "ERROR", default)]
    error: Option<String>,
}

pub fn parse_esearch_json(body: &str) -> Result<SearchReply, KiraError> {
    let envelope: ESearchEnvelope = serde_json::from_str(body)
        .map_err(|err| KiraError::MalformedResponse(format!("esearch JSON: {err}")))?;
    if let Some(message) = envelope.error {
        return Err(KiraError::NcbiService(message));
    }
    let result = envelope.esearchresult.ok_or_else(|| {
        KiraError::MalformedResponse("esearch reply has no esearchresult".to_string())
    })?;
    if let Some(message) = result.error {
        return Err(KiraError::NcbiService(message));
    }

    let count = result
        .count
        .as_deref()
        .ok_or_else(|| KiraError::MalformedResponse("esearch reply has no count".to_string()))?
        .trim()
        .parse::<u64>()
        .map_err(|err| KiraError::MalformedResponse(format!("esearch count: {err}")))?;

    let history = match (result.webenv, result.querykey) {
        (Some(web_env), Some(query_key)) if !web_env.is_empty() && !query_key.is_empty() => {
            Some(History { web_env, query_key })
        }
        _ => None,
    };
    if count > 0 && history.is_none() {
        return Err(KiraError::MalformedResponse(
            "esearch reply has results but no WebEnv/query_key".to_string(),
        ));
    }

    Ok(SearchReply { count, history })
}
