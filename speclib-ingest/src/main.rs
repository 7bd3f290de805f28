//! speclib-ingest - Spectral library import CLI
//!
//! Thin command-line host around the import engine and the library browser
//! query service; all logic lives in the library crates.

use anyhow::Result;
use clap::{Parser, Subcommand};
use speclib_ingest::{ImportContext, ImportService, LibraryBrowserService};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "speclib-ingest", version, about = "Import and browse spectral reflectance libraries")]
struct Cli {
    /// Catalog database path (defaults to the platform data directory)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import spectra from instrument or CSV files
    Import {
        /// Files to import
        files: Vec<PathBuf>,

        /// Override the target library name for all records
        #[arg(long)]
        library: Option<String>,

        /// Extra importer options as key=value pairs
        #[arg(long = "option", value_parser = parse_key_val)]
        options: Vec<(String, String)>,
    },
    /// Print the library/material/spectrum hierarchy
    Tree,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let db_path = speclib_common::config::resolve_database_path(cli.database.as_deref());
    info!("Database: {}", db_path.display());
    let pool = speclib_common::db::init_database(&db_path).await?;

    match cli.command {
        Command::Import {
            files,
            library,
            options,
        } => run_import(pool, files, library, options).await?,
        Command::Tree => run_tree(pool).await,
    }

    Ok(())
}

async fn run_import(
    pool: SqlitePool,
    files: Vec<PathBuf>,
    library: Option<String>,
    options: Vec<(String, String)>,
) -> Result<()> {
    if files.is_empty() {
        anyhow::bail!("no input files given");
    }

    let context = ImportContext {
        target_library: library,
        extra_options: options.into_iter().collect(),
    };
    let service = ImportService::new(pool);

    for path in files {
        let mut on_progress = |processed: usize, total: usize| {
            info!(processed, total, "Import progress");
        };

        match service
            .import_path(&path, &context, Some(&mut on_progress))
            .await
        {
            Ok(summary) => {
                info!(
                    path = %path.display(),
                    created_materials = summary.created_materials,
                    created_spectra = summary.created_spectra,
                    "Import finished"
                );
                for warning in &summary.warnings {
                    warn!(path = %path.display(), "{warning}");
                }
            }
            Err(err) => warn!(path = %path.display(), error = %err, "Import failed"),
        }
    }

    Ok(())
}

async fn run_tree(pool: SqlitePool) {
    let service = LibraryBrowserService::new(pool);
    for library in service.fetch_library_tree().await {
        println!("{}", library.name);
        for material in &library.materials {
            println!("  {} [{}]", material.name, material.category);
            for spectrum in &material.spectra {
                println!("    {}", spectrum.label);
            }
        }
    }
}
