use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::app::{DEFAULT_MAX_RECORDS, RunRequest};
use crate::domain::{ContactEmail, LengthBounds, TaxonId, parse_length};
use crate::error::KiraError;

pub const DEFAULT_CONFIG_FILE: &str = "kira-tr.json";
pub const API_KEY_ENV: &str = "NCBI_API_KEY";

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub taxid: Option<String>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub max_records: Option<usize>,
    #[serde(default)]
    pub output_dir: Option<String>,
}

impl Config {
    /// Fills every unset field from `other`.
    pub fn or(self, other: Config) -> Config {
        Config {
            email: self.email.or(other.email),
            api_key: self.api_key.or(other.api_key),
            taxid: self.taxid.or(other.taxid),
            min_length: self.min_length.or(other.min_length),
            max_length: self.max_length.or(other.max_length),
            start: self.start.or(other.start),
            max_records: self.max_records.or(other.max_records),
            output_dir: self.output_dir.or(other.output_dir),
        }
    }

    pub fn from_env() -> Config {
        Config {
            api_key: std::env::var(API_KEY_ENV)
                .ok()
                .filter(|value| !value.trim().is_empty()),
            ..Config::default()
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads an explicit config file, or `kira-tr.json` when it exists.
    pub fn resolve(path: Option<&str>) -> Result<Option<Config>, KiraError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| KiraError::ConfigRead(config_path.clone()))?;
        Self::parse(&content).map(Some)
    }

    pub fn parse(content: &str) -> Result<Config, KiraError> {
        serde_json::from_str(content).map_err(|err| KiraError::ConfigParse(err.to_string()))
    }
}

/// Source of inputs that were not supplied by flags, config, or environment.
pub trait InputPrompter {
    fn email(&self) -> Result<String, KiraError>;
    fn api_key(&self) -> Result<String, KiraError>;
    fn taxid(&self) -> Result<String, KiraError>;
    fn min_length(&self) -> Result<String, KiraError>;
    fn max_length(&self) -> Result<String, KiraError>;
}

#[derive(Debug, Clone)]
pub struct ResolvedInputs {
    pub email: ContactEmail,
    pub api_key: Option<String>,
    pub request: RunRequest,
}

/// Turns merged settings into a run request, asking `prompter` for whatever
/// is still missing. Without a prompter, email and taxid are required and
/// the length bounds default to `[0, inf)`.
pub fn resolve_inputs(
    config: Config,
    prompter: Option<&dyn InputPrompter>,
) -> Result<ResolvedInputs, KiraError> {
    let email = match (config.email, prompter) {
        (Some(value), _) => value,
        (None, Some(prompter)) => prompter.email()?,
        (None, None) => return Err(KiraError::MissingInput("email")),
    };
    let api_key = match (config.api_key, prompter) {
        (Some(value), _) => Some(value),
        (None, Some(prompter)) => Some(prompter.api_key()?),
        (None, None) => None,
    }
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty());
    let taxid = match (config.taxid, prompter) {
        (Some(value), _) => value,
        (None, Some(prompter)) => prompter.taxid()?,
        (None, None) => return Err(KiraError::MissingInput("taxid")),
    };
    let min_length = match (config.min_length, prompter) {
        (Some(value), _) => Some(value),
        (None, Some(prompter)) => Some(parse_length(&prompter.min_length()?)?),
        (None, None) => None,
    };
    let max_length = match (config.max_length, prompter) {
        (Some(value), _) => Some(value),
        (None, Some(prompter)) => Some(parse_length(&prompter.max_length()?)?),
        (None, None) => None,
    };

    let request = RunRequest {
        taxon: taxid.parse::<TaxonId>()?,
        bounds: LengthBounds::from_options(min_length, max_length)?,
        start: config.start.unwrap_or(0),
        max_records: config.max_records.unwrap_or(DEFAULT_MAX_RECORDS),
        output_dir: Utf8PathBuf::from(config.output_dir.unwrap_or_else(|| ".".to_string())),
    };

    Ok(ResolvedInputs {
        email: email.parse()?,
        api_key,
        request,
    })
}
