//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use listsync_model::{RecordId, RecordKind};

#[derive(Parser)]
#[command(
    name = "listsync",
    version,
    about = "Browse, create and edit records kept in a JSON store",
    long_about = "Browse, create and edit records kept in a JSON store.\n\n\
                  Record kinds, their fields and required-field rules come from\n\
                  TOML schemas: --schemas DIR, then $LISTSYNC_SCHEMAS_DIR, then\n\
                  the built-in account, contact, lead and opportunity schemas."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON store file (created on first write).
    #[arg(
        long = "store",
        value_name = "PATH",
        default_value = "listsync.json",
        global = true
    )]
    pub store: PathBuf,

    /// Directory of schema TOML files.
    #[arg(long = "schemas", value_name = "DIR", global = true)]
    pub schemas: Option<PathBuf>,

    /// TOML file overriding notification titles and messages.
    #[arg(long = "messages", value_name = "PATH", global = true)]
    pub messages: Option<PathBuf>,

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

    /// Allow field values in trace logs (redacted otherwise).
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the record kinds in the schema catalog.
    Kinds,

    /// Fetch and print every record of a kind.
    List {
        #[arg(value_name = "KIND", value_parser = parse_kind)]
        kind: RecordKind,
    },

    /// Print one record as the editor sees it.
    Show {
        #[arg(value_name = "KIND", value_parser = parse_kind)]
        kind: RecordKind,
        #[arg(value_name = "ID", value_parser = parse_id)]
        id: RecordId,
    },

    /// Create a record.
    Create(CreateArgs),

    /// Edit the one selected record.
    Edit(EditArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(value_name = "KIND", value_parser = parse_kind)]
    pub kind: RecordKind,

    /// Field assignment; repeat for several fields.
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,
}

#[derive(Args)]
pub struct EditArgs {
    #[arg(value_name = "KIND", value_parser = parse_kind)]
    pub kind: RecordKind,

    /// Record to select; editing needs exactly one.
    #[arg(long = "select", value_name = "ID", value_parser = parse_id)]
    pub select: Vec<RecordId>,

    /// Field assignment; repeat for several fields.
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,
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

fn parse_kind(value: &str) -> Result<RecordKind, listsync_model::ModelError> {
    RecordKind::new(value)
}

fn parse_id(value: &str) -> Result<RecordId, listsync_model::ModelError> {
    RecordId::new(value)
}

fn parse_assignment(value: &str) -> Result<(String, String), String> {
    let (field, text) = value
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got `{value}`"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in `{value}`"));
    }
    Ok((field.to_string(), text.to_string()))
}
