//! # es-cli — The "Console" of EVENTSET
//!
//! Load JSON event files as named sets and query them.
//!
//! - `es query --data a.json --data b.json "FROM a, b WHERE num > 1"` — Run a query.
//! - `es explain --data a.json "FROM a ORDER BY num"` — Print the optimised plan.
//! - `es schema --data a.json` — Print each set's keyset and row count.

mod config;
mod load;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use es_set::query::{executor, parser, Catalog, QueryError};

use config::{Config, OutputFormat};
use load::LoadError;
use output::SchemaRow;

// =============================================================================
// CLI
// =============================================================================

/// EVENTSET — lazy relational queries over typed event files.
#[derive(Parser)]
#[command(name = "es", version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, default_value = "es.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query and print one page of results.
    Query {
        /// JSON array file; repeat for more sets. The set is named after the file stem.
        #[arg(long = "data", required = true)]
        data: Vec<PathBuf>,

        /// Print JSON regardless of the configured format.
        #[arg(long)]
        json: bool,

        query: String,
    },

    /// Print the optimised plan for a query without evaluating it.
    Explain {
        #[arg(long = "data", required = true)]
        data: Vec<PathBuf>,

        query: String,
    },

    /// Print each loaded set's keyset and row count.
    Schema {
        #[arg(long = "data", required = true)]
        data: Vec<PathBuf>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("cannot encode result: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate set name '{0}'")]
    DuplicateSet(String),
}

// =============================================================================
// Commands
// =============================================================================

fn load_catalog(paths: &[PathBuf], config: &Config) -> Result<Catalog, CliError> {
    let mut catalog = Catalog::new();
    for path in paths {
        let (name, set) = load::load_set(path, |name| config.schema_for(name).cloned())?;
        if catalog.get(&name).is_some() {
            return Err(CliError::DuplicateSet(name));
        }
        catalog.insert(name, set);
    }
    Ok(catalog)
}

async fn run(cli: Cli, config: Config) -> Result<(), CliError> {
    match cli.command {
        Commands::Query { data, json, query } => {
            let catalog = load_catalog(&data, &config)?;
            let query = parser::parse(&query)?;
            let result = executor::execute(&query, &catalog, config.output.default_limit).await?;
            let format = if json {
                OutputFormat::Json
            } else {
                config.output.format
            };
            match format {
                OutputFormat::Table => println!("{}", output::result_table(&result)),
                OutputFormat::Json => println!("{}", output::result_json(&result)?),
            }
        }

        Commands::Explain { data, query } => {
            let catalog = load_catalog(&data, &config)?;
            let query = parser::parse(&query)?;
            let plan = executor::plan(&query, &catalog)?;
            println!("{}", plan.set.explain());
            println!("project {}", plan.keys);
        }

        Commands::Schema { data } => {
            let catalog = load_catalog(&data, &config)?;
            let mut rows = Vec::with_capacity(catalog.len());
            for (name, set) in catalog.iter() {
                rows.push(SchemaRow {
                    set: name.to_string(),
                    rows: set.count().await.map_err(QueryError::from)?,
                    keys: set.keys().clone(),
                });
            }
            println!("{}", output::schema_table(rows));
        }
    }
    Ok(())
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "es_cli=info,es_set=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config);

    if let Err(e) = run(cli, config).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
