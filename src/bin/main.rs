//! Joinery CLI - render saved query documents to SQL
//!
//! Usage:
//!   joinery render <query.json> [--dialect <dialect>] [--config <joinery.toml>]
//!   joinery check <query.json>
//!
//! Examples:
//!   joinery render orders.json
//!   joinery render orders.json --dialect tsql
//!   joinery check orders.json

use clap::{Parser, Subcommand, ValueEnum};
use joinery::config::{QuerySettings, Settings};
use joinery::query::{Query, QueryDocument};
use joinery::sql::Dialect;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser)]
#[command(name = "joinery")]
#[command(about = "Joinery - render query graphs to SQL")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to JOINERY_CONFIG, ./joinery.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SQL for a saved query document
    Render {
        /// Path to the query document (JSON)
        file: PathBuf,

        /// Database family to generate for (overrides the document)
        #[arg(short, long)]
        dialect: Option<DialectArg>,
    },

    /// Summarize a query document; fails when it contains cross joins
    Check {
        /// Path to the query document (JSON)
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Postgres,
    Mysql,
    Tsql,
    Duckdb,
    Snowflake,
    Oracle,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Tsql => Dialect::TSql,
            DialectArg::Duckdb => Dialect::DuckDb,
            DialectArg::Snowflake => Dialect::Snowflake,
            DialectArg::Oracle => Dialect::Oracle,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("JOINERY_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Render { file, dialect } => cmd_render(&file, dialect, &settings.query),
        Commands::Check { file } => cmd_check(&file, &settings.query),
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings, joinery::config::SettingsError> {
    match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
}

fn load_query(file: &Path, settings: &QuerySettings) -> Result<Query, ExitCode> {
    let document = QueryDocument::load(file).map_err(|e| {
        eprintln!("Error reading query '{}': {}", file.display(), e);
        ExitCode::FAILURE
    })?;

    Query::from_document_with(document, settings).map_err(|e| {
        eprintln!("Error in query '{}': {}", file.display(), e);
        ExitCode::FAILURE
    })
}

fn cmd_render(file: &Path, dialect: Option<DialectArg>, settings: &QuerySettings) -> ExitCode {
    let mut query = match load_query(file, settings) {
        Ok(query) => query,
        Err(code) => return code,
    };

    if let Some(dialect) = dialect {
        query.set_dialect(dialect.into());
    }
    debug!(dialect = %query.dialect(), "rendering query");

    if query.contains_cross_joins() {
        eprintln!("Warning: query contains cross joins (ON 0 = 0)");
    }
    if query.contains_unsupported_joins() {
        eprintln!("Warning: {} does not support FULL OUTER JOIN", query.dialect());
    }
    println!("{}", query.generate_query());
    ExitCode::SUCCESS
}

fn cmd_check(file: &Path, settings: &QuerySettings) -> ExitCode {
    let query = match load_query(file, settings) {
        Ok(query) => query,
        Err(code) => return code,
    };

    println!("File: {}", file.display());
    println!("Dialect: {}", query.dialect());
    println!("Tables: {}", query.containers().len());
    println!("Constants: {}", query.constants().len());
    println!("Joins: {}", query.joins().len());
    println!("Selected: {}", query.selection().len());
    println!("Ordered: {}", query.ordering().len());

    if query.user_sql().is_some() {
        println!("Note: hand-written SQL overrides the generated text");
    }

    if query.contains_unsupported_joins() {
        eprintln!("Warning: {} does not support FULL OUTER JOIN", query.dialect());
    }

    if query.contains_cross_joins() {
        eprintln!("Cross joins found: some tables are joined on 0 = 0");
        return ExitCode::FAILURE;
    }

    println!("OK: {} has no cross joins", file.display());
    ExitCode::SUCCESS
}
