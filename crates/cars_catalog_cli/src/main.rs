//! `cars-catalog` command line entry point.
//!
//! # Responsibility
//! - Load configuration from the environment and initialize logging.
//! - Open the catalog store and dispatch exactly one subcommand.
//! - Map service failures to process exit codes.

use cars_catalog_core::{
    init_logging, open_pool, CatalogConfig, FaultClass, FieldUpdate, ServiceError,
    SnapshotLookup, SqliteVehicleRepository, Vehicle, VehicleFilter, VehiclePatch,
    VehicleService,
};
use clap::{Parser, Subcommand};
use figment::providers::Serialized;
use log::{error, info};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Vehicle catalog maintenance tool
#[derive(Parser)]
#[command(name = "cars-catalog")]
#[command(version)]
struct Cli {
    /// Database file; overrides CARS_CATALOG_DB_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check core wiring without touching the store
    Ping,

    /// List vehicles matching every given filter
    List {
        #[arg(long)]
        reg_num: Option<String>,
        #[arg(long)]
        mark: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        surname: Option<String>,
        #[arg(long)]
        patronymic: Option<String>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        /// Page size, clamped into 5..=100
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Ingest vehicles from a JSON registry snapshot
    Import {
        /// JSON array of vehicle records
        snapshot: PathBuf,
        /// Registration numbers to ingest; all snapshot records when omitted
        reg_nums: Vec<String>,
    },

    /// Partially update one vehicle
    Update {
        reg_num: String,
        #[arg(long)]
        mark: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long, conflicts_with = "clear_year")]
        year: Option<i32>,
        #[arg(long)]
        clear_year: bool,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        surname: Option<String>,
        #[arg(long)]
        patronymic: Option<String>,
    },

    /// Delete one vehicle by registration number
    Delete { reg_num: String },
}

/// Failure carried out of `run` with its exit code.
struct CliFailure {
    code: u8,
    message: String,
}

impl CliFailure {
    fn setup(message: impl Into<String>) -> Self {
        Self {
            code: 1,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for CliFailure {
    fn from(value: ServiceError) -> Self {
        let code = match value.fault() {
            FaultClass::CallerInput => 2,
            FaultClass::NotFound => 3,
            FaultClass::Internal => 1,
        };
        Self {
            code,
            message: value.to_string(),
        }
    }
}

type Catalog = VehicleService<SqliteVehicleRepository, SnapshotLookup>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            eprintln!("error: {}", failure.message);
            ExitCode::from(failure.code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliFailure> {
    if let Command::Ping = cli.command {
        println!("cars_catalog_core ping={}", cars_catalog_core::ping());
        println!(
            "cars_catalog_core version={}",
            cars_catalog_core::core_version()
        );
        return Ok(());
    }

    let mut figment = CatalogConfig::figment();
    if let Some(db) = cli.db {
        figment = figment.merge(Serialized::default("db_path", db));
    }
    let config =
        CatalogConfig::from_figment(figment).map_err(|err| CliFailure::setup(err.to_string()))?;
    init_logging(&config.log_level, config.log_dir.as_deref()).map_err(CliFailure::setup)?;
    info!(
        "event=cli_start module=cli status=ok db_path={}",
        config.db_path.display()
    );

    let pool = open_pool(&config.db_path, &config.pool).map_err(|err| {
        error!("event=cli_start module=cli status=error error={}", err);
        CliFailure::setup(err.to_string())
    })?;
    let repo = SqliteVehicleRepository::try_new(pool)
        .map_err(|err| CliFailure::setup(err.to_string()))?;

    match cli.command {
        Command::Ping => Ok(()),
        Command::List {
            reg_num,
            mark,
            model,
            year,
            name,
            surname,
            patronymic,
            offset,
            limit,
        } => {
            let filter = VehicleFilter {
                reg_num,
                mark,
                model,
                year,
                name,
                surname,
                patronymic,
            };
            let service: Catalog = VehicleService::new(repo, SnapshotLookup::new());
            let page = service.list(&filter, offset, limit)?;
            print_json(&page.items)
        }
        Command::Import { snapshot, reg_nums } => {
            let lookup = load_snapshot(&snapshot)?;
            let reg_nums = if reg_nums.is_empty() {
                lookup.reg_nums()
            } else {
                reg_nums
            };
            let service: Catalog = VehicleService::new(repo, lookup);
            let inserted = service.add_all(&reg_nums)?;
            println!("inserted={inserted}");
            Ok(())
        }
        Command::Update {
            reg_num,
            mark,
            model,
            year,
            clear_year,
            name,
            surname,
            patronymic,
        } => {
            // Empty text and year 0 keep the stored value.
            let mut patch = VehiclePatch::new(reg_num);
            patch.mark = mark.map_or(FieldUpdate::Keep, FieldUpdate::from_text);
            patch.model = model.map_or(FieldUpdate::Keep, FieldUpdate::from_text);
            patch.year = if clear_year {
                FieldUpdate::Clear
            } else {
                year.map_or(FieldUpdate::Keep, FieldUpdate::from_year)
            };
            patch.owner_name = name.map_or(FieldUpdate::Keep, FieldUpdate::from_text);
            patch.owner_surname = surname.map_or(FieldUpdate::Keep, FieldUpdate::from_text);
            patch.owner_patronymic = patronymic.into();

            let service: Catalog = VehicleService::new(repo, SnapshotLookup::new());
            let record = service.update(&patch)?;
            print_json(&record)
        }
        Command::Delete { reg_num } => {
            let service: Catalog = VehicleService::new(repo, SnapshotLookup::new());
            let removed = service.delete(&reg_num)?;
            println!("removed={removed}");
            Ok(())
        }
    }
}

fn load_snapshot(path: &Path) -> Result<SnapshotLookup, CliFailure> {
    let raw = std::fs::read_to_string(path).map_err(|err| CliFailure {
        code: 2,
        message: format!("cannot read snapshot `{}`: {err}", path.display()),
    })?;
    let vehicles: Vec<Vehicle> = serde_json::from_str(&raw).map_err(|err| CliFailure {
        code: 2,
        message: format!("invalid snapshot `{}`: {err}", path.display()),
    })?;
    Ok(SnapshotLookup::from_vehicles(vehicles))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliFailure> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliFailure::setup(format!("cannot render output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
