//! Import command implementation for the Savour CLI.

use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use savour_core::{SqliteCatalog, VenueRecord};
use serde::{Deserialize, Serialize};

use crate::fs::{open_utf8_file, require_existing};
use crate::{
    ARG_CATALOG_DB, ARG_VENUES, CliError, ENV_IMPORT_CATALOG_DB, ENV_IMPORT_VENUES, write_report,
};

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Create the catalogue when missing and upsert every venue \
                 record from a JSON array. Records are keyed by venue id, so \
                 importing a file twice updates rather than duplicates.",
    about = "Load venue records into a catalogue"
)]
#[ortho_config(prefix = "SAVOUR")]
pub(crate) struct ImportArgs {
    /// Path to the SQLite catalogue, created when missing.
    #[arg(long = ARG_CATALOG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) catalog_db: Option<Utf8PathBuf>,
    /// JSON file holding an array of venue records.
    #[arg(long = ARG_VENUES, value_name = "path")]
    #[serde(default)]
    pub(crate) venues: Option<Utf8PathBuf>,
}

/// Resolved `import` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportConfig {
    pub(crate) catalog_db: Utf8PathBuf,
    pub(crate) venues: Utf8PathBuf,
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportArgs) -> Result<Self, Self::Error> {
        let catalog_db = args.catalog_db.ok_or(CliError::MissingArgument {
            field: ARG_CATALOG_DB,
            env: ENV_IMPORT_CATALOG_DB,
        })?;
        let venues = args.venues.ok_or(CliError::MissingArgument {
            field: ARG_VENUES,
            env: ENV_IMPORT_VENUES,
        })?;
        Ok(Self { catalog_db, venues })
    }
}

#[derive(Serialize)]
struct ImportReport<'a> {
    catalog: &'a Utf8Path,
    imported: usize,
}

pub(super) fn run_import(args: ImportArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_import_with(args, &mut stdout)
}

pub(super) fn run_import_with(args: ImportArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = ImportConfig::try_from(merged)?;
    let imported = execute_import(&config)?;
    write_report(
        writer,
        &ImportReport {
            catalog: &config.catalog_db,
            imported,
        },
    )
}

/// Upsert every record from the venue file and return how many were read.
pub(super) fn execute_import(config: &ImportConfig) -> Result<usize, CliError> {
    require_existing(&config.venues, ARG_VENUES)?;
    let records = load_venues(&config.venues)?;
    let catalog = SqliteCatalog::create(config.catalog_db.as_std_path()).map_err(|source| {
        CliError::OpenCatalog {
            path: config.catalog_db.clone(),
            source,
        }
    })?;
    for record in &records {
        catalog
            .insert_venue(record)
            .map_err(|source| CliError::UpdateCatalog {
                path: config.catalog_db.clone(),
                source,
            })?;
    }
    info!("imported {} venues into {}", records.len(), config.catalog_db);
    Ok(records.len())
}

fn load_venues(path: &Utf8Path) -> Result<Vec<VenueRecord>, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenVenues {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseVenues {
        path: path.to_path_buf(),
        source,
    })
}
