//! Command-line interface for ranking venues from a Savour catalogue.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use serde::Serialize;

mod error;
mod fs;
mod gate;
mod import;
mod rank;
mod rate;

pub use error::CliError;

use import::{ImportArgs, run_import};
use rank::{RankArgs, run_rank};
use rate::{RateArgs, run_rate};

pub(crate) const ARG_CATALOG_DB: &str = "catalog-db";
pub(crate) const ARG_USER: &str = "user";
pub(crate) const ARG_TOP_N: &str = "top-n";
pub(crate) const ARG_HISTORY_SCOPE: &str = "history-scope";
pub(crate) const ARG_OPEN_AT: &str = "open-at";
pub(crate) const ARG_OPEN_NOW: &str = "open-now";
pub(crate) const ARG_VENUE: &str = "venue";
pub(crate) const ARG_RATING: &str = "rating";
pub(crate) const ARG_REVIEW: &str = "review";
pub(crate) const ARG_RATED_AT: &str = "rated-at";
pub(crate) const ARG_GATE_COMMAND: &str = "gate-command";
pub(crate) const ARG_VENUES: &str = "venues";
pub(crate) const ENV_RANK_CATALOG_DB: &str = "SAVOUR_CMDS_RANK_CATALOG_DB";
pub(crate) const ENV_RANK_USER: &str = "SAVOUR_CMDS_RANK_USER";
pub(crate) const ENV_RATE_CATALOG_DB: &str = "SAVOUR_CMDS_RATE_CATALOG_DB";
pub(crate) const ENV_RATE_USER: &str = "SAVOUR_CMDS_RATE_USER";
pub(crate) const ENV_RATE_VENUE: &str = "SAVOUR_CMDS_RATE_VENUE";
pub(crate) const ENV_RATE_RATING: &str = "SAVOUR_CMDS_RATE_RATING";
pub(crate) const ENV_RATE_REVIEW: &str = "SAVOUR_CMDS_RATE_REVIEW";
pub(crate) const ENV_RATE_GATE_COMMAND: &str = "SAVOUR_CMDS_RATE_GATE_COMMAND";
pub(crate) const ENV_IMPORT_CATALOG_DB: &str = "SAVOUR_CMDS_IMPORT_CATALOG_DB";
pub(crate) const ENV_IMPORT_VENUES: &str = "SAVOUR_CMDS_IMPORT_VENUES";

/// Run the Savour CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Rank(args) => run_rank(args),
        Command::Rate(args) => run_rate(args),
        Command::Import(args) => run_import(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "savour",
    about = "Rank catalogue venues for a diner from their own ratings",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Rank the venues matching a set of facets for one user.
    Rank(RankArgs),
    /// Screen a review and store its rating in the catalogue.
    Rate(RateArgs),
    /// Load venue records from a JSON file into the catalogue.
    Import(ImportArgs),
}

/// Pretty-print `report` as JSON followed by a newline.
pub(crate) fn write_report<T: Serialize>(writer: &mut dyn Write, report: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(report).map_err(CliError::SerialiseReport)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteReport)?;
    writer.write_all(b"\n").map_err(CliError::WriteReport)?;
    Ok(())
}

#[cfg(test)]
mod tests;
