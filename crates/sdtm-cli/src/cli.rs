//! CLI argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "sdtmq",
    version,
    about = "Answer standard clinical questions over SDTM datasets",
    long_about = "Resolve standard queries (laboratory, medications, procedures, adverse \
                  events, vital signs, disposition, dosing) against a folder of SDTM CSV \
                  datasets.\n\n\
                  Each query is anchored on caller-supplied dates or on the subject's own \
                  reference dates and prints the read issued together with its rows."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow subject identifiers and values in logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one standard query.
    Query(QueryArgs),

    /// List the query modules and their modes.
    Modules,

    /// List the values a category placeholder may take for a subject.
    Values(ValuesArgs),

    /// List subjects present in the study.
    Subjects(SubjectsArgs),
}

/// Where the datasets live and how the engine is configured.
#[derive(Args)]
pub struct StudyArgs {
    /// Folder of SDTM CSV datasets.
    #[arg(value_name = "STUDY_FOLDER")]
    pub study_folder: PathBuf,

    /// Engine configuration file (TOML).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Project number (overrides the configuration file).
    #[arg(long = "project")]
    pub project: Option<String>,

    /// Date ongoing anchor events resolve to (default: today).
    #[arg(long = "as-of", value_name = "YYYY-MM-DD")]
    pub as_of: Option<NaiveDate>,
}

#[derive(Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub study: StudyArgs,

    /// Request body as JSON, `-` to read it from stdin.
    #[arg(long = "request", value_name = "JSON", conflicts_with_all = ["module", "mode"])]
    pub request: Option<String>,

    /// Module id (1-7), see `sdtmq modules`.
    #[arg(long = "module", required_unless_present = "request")]
    pub module: Option<i64>,

    /// Relationship mode, e.g. `at_time` or `prior_first`.
    #[arg(long = "mode", required_unless_present = "request")]
    pub mode: Option<String>,

    /// Unique subject identifier.
    #[arg(long = "subject", required_unless_present = "request")]
    pub subject: Option<String>,

    /// Anchor start date.
    #[arg(long = "start", value_name = "DATE")]
    pub start: Option<String>,

    /// Anchor end date, or ONGOING.
    #[arg(long = "end", value_name = "DATE")]
    pub end: Option<String>,

    /// Day offset for `within_days`; negative looks back.
    #[arg(long = "days", allow_hyphen_values = true)]
    pub days: Option<i64>,

    /// Medication or procedure categories, comma-separated.
    #[arg(long = "category")]
    pub category: Option<String>,

    /// Medication or procedure indications, comma-separated.
    #[arg(long = "indication")]
    pub indication: Option<String>,

    /// Laboratory or vital signs tests, comma-separated.
    #[arg(long = "tests")]
    pub tests: Option<String>,

    /// Laboratory test category.
    #[arg(long = "test-category")]
    pub test_category: Option<String>,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Args)]
pub struct ValuesArgs {
    #[command(flatten)]
    pub study: StudyArgs,

    /// Unique subject identifier.
    #[arg(long = "subject")]
    pub subject: String,

    /// Dataset to read, e.g. CM.
    #[arg(long = "table")]
    pub table: String,

    /// Field to list, e.g. CMCAT.
    #[arg(long = "field")]
    pub field: String,

    /// Restrict to rows whose category column holds one of these values:
    /// `COLUMN=VALUE[,VALUE...]`.
    #[arg(long = "within", value_name = "COLUMN=VALUES")]
    pub within: Option<String>,
}

#[derive(Args)]
pub struct SubjectsArgs {
    #[command(flatten)]
    pub study: StudyArgs,

    /// Only subjects with records in every listed dataset.
    #[arg(long = "table", value_name = "DOMAIN")]
    pub tables: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
