//! Climate API - Main Server
//!
//! Serves precipitation and temperature observations from a SQLite data
//! file as read-only JSON:
//! 1. Loads configuration (climate_api.toml, DATABASE_PATH, flags)
//! 2. Validates the data file's station and measurement tables
//! 3. Starts the HTTP endpoint and answers requests on a worker pool
//!
//! Usage:
//!   cargo run --release                                  # defaults, 127.0.0.1:5000
//!   cargo run --release -- --database data/hawaii.sqlite --bind 0.0.0.0:8080
//!
//! Environment:
//!   DATABASE_PATH - SQLite data file (overrides climate_api.toml)
//!   RUST_LOG      - log filter (default: info)

use clap::Parser;
use climate_api::config::{self, ServiceConfig};
use climate_api::db;
use climate_api::endpoint::EndpointServer;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "climate_api")]
#[command(about = "Read-only JSON API for Honolulu precipitation and temperature observations")]
#[command(version)]
struct Cli {
    #[arg(short, long, help = "Config file [default: climate_api.toml if present]")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "SQLite data file with station and measurement tables")]
    database: Option<PathBuf>,

    #[arg(short, long, help = "Listen address, e.g. 127.0.0.1:5000")]
    bind: Option<String>,

    #[arg(short, long, help = "Request handler threads")]
    workers: Option<usize>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = config::load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, cli);
    config.validate()?;

    log::info!("Climate data file: {}", config.database_path.display());

    // Schema problems are fatal before the listener opens
    let conn = db::connect_and_verify(&config.database_path)?;
    let stations = db::load_stations(&conn)?;
    log::info!("Validated station and measurement tables ({} stations)", stations.len());

    let orphans = db::orphan_station_ids(&conn)?;
    if !orphans.is_empty() {
        log::warn!(
            "{} measurement station id(s) have no station row: {}",
            orphans.len(),
            orphans.join(", ")
        );
    }
    drop(conn);

    let server = EndpointServer::bind(&config, stations.len()).map_err(|e| e.to_string())?;
    log::info!("Starting {} request workers", config.workers);
    server.run();

    Ok(())
}

fn apply_overrides(config: &mut ServiceConfig, cli: Cli) {
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
}
