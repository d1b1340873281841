use std::process::ExitCode;

use clap::Parser;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_taxon_report::app::{App, RunOutcome};
use kira_taxon_report::config::{
    Config, ConfigLoader, InputPrompter, ResolvedInputs, resolve_inputs,
};
use kira_taxon_report::domain::{ContactEmail, TaxonId, parse_length};
use kira_taxon_report::error::KiraError;
use kira_taxon_report::ncbi::{EntrezHttpClient, EntrezIdentity};
use kira_taxon_report::output::{ConsoleOutput, JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "kira-tr")]
#[command(about = "Fetch NCBI nucleotide records for a taxon and report their lengths")]
#[command(version, author)]
struct Cli {
    /// Never prompt; fail when email or taxid is missing and print a JSON summary.
    #[arg(long)]
    non_interactive: bool,

    /// JSON config file (defaults to ./kira-tr.json when present).
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    email: Option<String>,

    /// NCBI API key (falls back to NCBI_API_KEY).
    #[arg(long)]
    api_key: Option<String>,

    #[arg(long)]
    taxid: Option<String>,

    #[arg(long)]
    min_length: Option<usize>,

    #[arg(long)]
    max_length: Option<usize>,

    /// Offset of the first record to fetch.
    #[arg(long)]
    start: Option<usize>,

    /// Records to request (capped at 500 per call).
    #[arg(long)]
    max_records: Option<usize>,

    #[arg(long)]
    output_dir: Option<String>,
}

impl Cli {
    fn to_config(&self) -> Config {
        Config {
            email: self.email.clone(),
            api_key: self.api_key.clone(),
            taxid: self.taxid.clone(),
            min_length: self.min_length,
            max_length: self.max_length,
            start: self.start,
            max_records: self.max_records,
            output_dir: self.output_dir.clone(),
        }
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        KiraError::MissingInput(_)
        | KiraError::InvalidTaxonId(_)
        | KiraError::InvalidLength(_)
        | KiraError::InvalidLengthBounds { .. }
        | KiraError::InvalidEmail(_)
        | KiraError::ConfigRead(_)
        | KiraError::ConfigParse(_) => 2,
        KiraError::Report(_) | KiraError::Chart(_) | KiraError::Filesystem(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let file_config = ConfigLoader::resolve(cli.config.as_deref())?.unwrap_or_default();
    let merged = cli.to_config().or(file_config).or(Config::from_env());

    let prompter = DialoguerPrompter::new();
    let ResolvedInputs {
        email,
        api_key,
        request,
    } = match output_mode {
        OutputMode::Interactive => resolve_inputs(merged, Some(&prompter))?,
        OutputMode::NonInteractive => resolve_inputs(merged, None)?,
    };

    let client = EntrezHttpClient::new(EntrezIdentity { email, api_key })?;
    let mut app = App::new(client);

    match output_mode {
        OutputMode::Interactive => {
            let summary = app.run(&request, &ConsoleOutput)?;
            if !matches!(summary.outcome, RunOutcome::Written { .. }) {
                ConsoleOutput::print_outcome(&summary).into_diagnostic()?;
            }
        }
        OutputMode::NonInteractive => {
            let summary = app.run(&request, &JsonOutput)?;
            JsonOutput::print_summary(&summary).into_diagnostic()?;
        }
    }
    Ok(())
}

struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl DialoguerPrompter {
    fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    fn ask<F>(&self, prompt: &str, validate: F) -> Result<String, KiraError>
    where
        F: Fn(&str) -> Result<(), KiraError>,
    {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .validate_with(|value: &String| validate(value).map_err(|err| err.to_string()))
            .interact_text()
            .map_err(|err| KiraError::Prompt(err.to_string()))
    }
}

impl InputPrompter for DialoguerPrompter {
    fn email(&self) -> Result<String, KiraError> {
        self.ask("Enter your email address for NCBI", |value| {
            value.parse::<ContactEmail>().map(|_| ())
        })
    }

    fn api_key(&self) -> Result<String, KiraError> {
        Password::with_theme(&self.theme)
            .with_prompt("Enter your NCBI API key (leave empty to skip)")
            .allow_empty_password(true)
            .interact()
            .map_err(|err| KiraError::Prompt(err.to_string()))
    }

    fn taxid(&self) -> Result<String, KiraError> {
        self.ask("Enter taxonomic ID (taxid) of the organism", |value| {
            value.parse::<TaxonId>().map(|_| ())
        })
    }

    fn min_length(&self) -> Result<String, KiraError> {
        self.ask("Enter minimum sequence length", |value| {
            parse_length(value).map(|_| ())
        })
    }

    fn max_length(&self) -> Result<String, KiraError> {
        self.ask("Enter maximum sequence length", |value| {
            parse_length(value).map(|_| ())
        })
    }
}
