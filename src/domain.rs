use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::KiraError;

/// Largest number of records requested from efetch in one call.
pub const MAX_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaxonId(String);

impl TaxonId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Entrez search term selecting every record of this organism.
    pub fn organism_term(&self) -> String {
        format!("txid{}[Organism]", self.0)
    }
}

impl fmt::Display for TaxonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxonId {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().trim_start_matches("txid");
        let is_valid = !normalized.is_empty()
            && normalized.chars().all(|ch| ch.is_ascii_digit())
            && normalized.chars().any(|ch| ch != '0');
        if !is_valid {
            return Err(KiraError::InvalidTaxonId(value.to_string()));
        }
        Ok(Self(normalized.trim_start_matches('0').to_string()))
    }
}

impl TryFrom<String> for TaxonId {
    type Error = KiraError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaxonId> for String {
    fn from(value: TaxonId) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactEmail(String);

impl ContactEmail {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContactEmail {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        let re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .map_err(|err| KiraError::InvalidEmail(err.to_string()))?;
        if !re.is_match(normalized) {
            return Err(KiraError::InvalidEmail(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

/// Inclusive sequence length range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LengthBounds {
    min: usize,
    max: usize,
}

impl LengthBounds {
    pub fn new(min: usize, max: usize) -> Result<Self, KiraError> {
        if min > max {
            return Err(KiraError::InvalidLengthBounds { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn from_options(min: Option<usize>, max: Option<usize>) -> Result<Self, KiraError> {
        Self::new(min.unwrap_or(0), max.unwrap_or(usize::MAX))
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn contains(&self, length: usize) -> bool {
        self.min <= length && length <= self.max
    }
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self {
            min: 0,
            max: usize::MAX,
        }
    }
}

impl fmt::Display for LengthBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.max == usize::MAX {
            write!(f, "[{}, inf)", self.min)
        } else {
            write!(f, "[{}, {}]", self.min, self.max)
        }
    }
}

pub fn parse_length(value: &str) -> Result<usize, KiraError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| KiraError::InvalidLength(value.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceRecord {
    pub accession: String,
    pub length: usize,
}

impl SequenceRecord {
    pub fn new(accession: impl Into<String>, length: usize) -> Self {
        Self {
            accession: accession.into(),
            length,
        }
    }
}

pub fn csv_filename(taxon: &TaxonId) -> String {
    format!("taxid_{}_filtered_records.csv", taxon.as_str())
}

pub fn chart_filename(taxon: &TaxonId) -> String {
    format!("taxid_{}_sequence_lengths.png", taxon.as_str())
}
