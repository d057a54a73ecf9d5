use crate::config::RouterConfig;
use crate::domain::model::ExportFormat;
use crate::utils::error::{Result, RouterError};
use crate::utils::validation::{validate_file_extensions, Validate};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const INPUT_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls", "xlsm", "xlsb", "ods"];

#[derive(Debug, Clone, Parser)]
#[command(name = "listing-router")]
#[command(about = "Route property listing sheets to BDEs and bundle one file per BDE")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, global = true, help = "Log CPU and memory per phase")]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Process master files and write the per-BDE archive
    Process(ProcessArgs),
    /// Inspect or edit the local BDE directory
    #[command(subcommand)]
    Directory(DirectoryCommand),
}

#[derive(Debug, Clone, clap::Args)]
pub struct ProcessArgs {
    /// Master files (CSV or Excel)
    #[arg(short, long = "input", required = true, num_args = 1..)]
    pub inputs: Vec<String>,

    /// BDEs to build files for, comma separated. Defaults to everyone.
    #[arg(short, long, value_delimiter = ',')]
    pub agents: Vec<String>,

    /// Output file format (csv or xlsx)
    #[arg(long)]
    pub format: Option<ExportFormat>,

    #[arg(short, long)]
    pub output_path: Option<String>,

    /// Send a row only to the first matching BDE
    #[arg(long)]
    pub exclusive: bool,

    /// Date stamped into file names, e.g. 19Oct2026. Defaults to today.
    #[arg(long, value_parser = parse_date_stamp)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum DirectoryCommand {
    /// List BDEs and their locations
    List,
    /// Add a BDE or replace its locations
    Add {
        name: String,
        /// Comma separated locations, e.g. "Wagholi, Kharadi"
        locations: String,
    },
    /// Remove a BDE
    Remove { name: String },
}

fn parse_date_stamp(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%d%b%Y")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map_err(|e| format!("expected DDMonYYYY or YYYY-MM-DD: {}", e))
}

impl CliConfig {
    /// Load the TOML file (or defaults) and apply command line overrides.
    pub fn resolve(&self) -> Result<RouterConfig> {
        let mut config = match &self.config {
            Some(path) => RouterConfig::from_file(path).map_err(|e| RouterError::ConfigError {
                message: format!("failed to load '{}': {}", path.display(), e),
            })?,
            None => RouterConfig::default(),
        };

        if let Command::Process(args) = &self.command {
            if let Some(format) = args.format {
                config.export.format = format;
            }
            if let Some(output_path) = &args.output_path {
                config.export.output_path = output_path.clone();
            }
            if args.exclusive {
                config.routing.allow_overlap = false;
            }
        }

        Ok(config)
    }
}

impl Validate for ProcessArgs {
    fn validate(&self) -> Result<()> {
        validate_file_extensions("input", &self.inputs, INPUT_EXTENSIONS)
    }
}
