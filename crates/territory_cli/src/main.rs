//! Command-line front end for the territory store.
//!
//! # Responsibility
//! - Map subcommands onto `TerritoryService` operations.
//! - Print the status code and JSON envelope of every response.
//!
//! # Invariants
//! - Exit status is non-zero whenever the envelope reports a failure.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::process::ExitCode;
use territory_core::{
    init_logging, ApiResponse, AppConfig, SqliteTerritoryStore, StoreConfig, TerritoryDto,
    TerritoryService,
};

#[derive(Parser)]
#[command(name = "territories", author, version, about, long_about = None)]
struct Cli {
    /// SQLite path or `:memory:`; overrides TERRITORIES_DATABASE_URL.
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List territories of one region.
    List { region_code: String },
    /// Create a batch of territories.
    Create {
        /// Territory as CODE:NAME:REGION; repeat for a batch.
        #[arg(long = "territory", value_parser = parse_territory)]
        territories: Vec<TerritoryDto>,
    },
    /// Rename a batch of territories matched by code and region.
    Update {
        #[arg(long = "territory", value_parser = parse_territory)]
        territories: Vec<TerritoryDto>,
    },
    /// Delete territories by code across all regions.
    Delete { codes: Vec<String> },
}

fn parse_territory(raw: &str) -> Result<TerritoryDto, String> {
    let mut parts = raw.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(code), Some(name), Some(region_code)) => {
            Ok(TerritoryDto::new(code, name, region_code))
        }
        _ => Err(format!("expected CODE:NAME:REGION, got `{raw}`")),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(database) = cli.database {
        config.store = StoreConfig::new(database);
    }
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }

    let store = SqliteTerritoryStore::open(&config.store)
        .with_context(|| format!("failed to open store `{}`", config.store.database_url))?;
    let service = TerritoryService::new(store);
    info!("event=cli_start module=cli status=ok");

    let success = match cli.command {
        Command::List { region_code } => print_response(&service.list(&region_code).await)?,
        Command::Create { territories } => {
            print_response(&service.create_many(into_batch(territories)).await)?
        }
        Command::Update { territories } => {
            print_response(&service.update_many(into_batch(territories)).await)?
        }
        Command::Delete { codes } => {
            print_response(&service.delete_many_by_codes(codes).await)?
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn into_batch(territories: Vec<TerritoryDto>) -> Vec<Option<TerritoryDto>> {
    territories.into_iter().map(Some).collect()
}

fn print_response<T: Serialize>(response: &ApiResponse<T>) -> Result<bool> {
    let body = serde_json::to_string_pretty(response).context("failed to encode response")?;
    println!("{}", response.status_code());
    println!("{body}");
    Ok(response.is_success())
}
