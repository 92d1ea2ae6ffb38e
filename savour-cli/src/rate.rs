//! Rate command implementation for the Savour CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use chrono::Utc;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use savour_core::{RatingEvent, RecordOutcome, ReviewGate, SqliteCatalog, UserId, VenueId};
use serde::{Deserialize, Serialize};

use crate::fs::require_existing;
use crate::gate::CommandGate;
use crate::{
    ARG_CATALOG_DB, ARG_GATE_COMMAND, ARG_RATED_AT, ARG_RATING, ARG_REVIEW, ARG_USER, ARG_VENUE,
    CliError, ENV_RATE_CATALOG_DB, ENV_RATE_GATE_COMMAND, ENV_RATE_RATING, ENV_RATE_REVIEW,
    ENV_RATE_USER, ENV_RATE_VENUE, write_report,
};

/// CLI arguments for the `rate` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Store one user's rating of a catalogued venue. The review \
                 text is piped to the gate command first; the rating is only \
                 stored when that command exits successfully.",
    about = "Screen a review and store its rating"
)]
#[ortho_config(prefix = "SAVOUR")]
pub(crate) struct RateArgs {
    /// Path to the SQLite catalogue.
    #[arg(long = ARG_CATALOG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) catalog_db: Option<Utf8PathBuf>,
    /// User submitting the rating.
    #[arg(long = ARG_USER, value_name = "key")]
    #[serde(default)]
    pub(crate) user: Option<String>,
    /// Venue being rated.
    #[arg(long = ARG_VENUE, value_name = "key")]
    #[serde(default)]
    pub(crate) venue: Option<String>,
    /// Star rating between 1 and 5.
    #[arg(long = ARG_RATING, value_name = "stars")]
    #[serde(default)]
    pub(crate) rating: Option<f64>,
    /// Review text screened by the gate.
    #[arg(long = ARG_REVIEW, value_name = "text")]
    #[serde(default)]
    pub(crate) review: Option<String>,
    /// Unix timestamp of the rating (defaults to now).
    #[arg(long = ARG_RATED_AT, value_name = "seconds")]
    #[serde(default)]
    pub(crate) rated_at: Option<i64>,
    /// Classifier program that reads the review on stdin.
    #[arg(long = ARG_GATE_COMMAND, value_name = "program")]
    #[serde(default)]
    pub(crate) gate_command: Option<String>,
}

impl RateArgs {
    pub(crate) fn into_config(self) -> Result<RateConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RateConfig::try_from(merged)
    }
}

/// Resolved `rate` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RateConfig {
    pub(crate) catalog_db: Utf8PathBuf,
    pub(crate) event: RatingEvent,
    pub(crate) review: String,
    pub(crate) gate_command: String,
}

fn required<T>(value: Option<T>, field: &'static str, env: &'static str) -> Result<T, CliError> {
    value.ok_or(CliError::MissingArgument { field, env })
}

impl TryFrom<RateArgs> for RateConfig {
    type Error = CliError;

    fn try_from(args: RateArgs) -> Result<Self, Self::Error> {
        let catalog_db = required(args.catalog_db, ARG_CATALOG_DB, ENV_RATE_CATALOG_DB)?;
        let user = UserId::new(required(args.user, ARG_USER, ENV_RATE_USER)?).map_err(
            |source| CliError::InvalidIdentifier {
                field: ARG_USER,
                source,
            },
        )?;
        let venue = VenueId::new(required(args.venue, ARG_VENUE, ENV_RATE_VENUE)?).map_err(
            |source| CliError::InvalidIdentifier {
                field: ARG_VENUE,
                source,
            },
        )?;
        let rating = required(args.rating, ARG_RATING, ENV_RATE_RATING)?;
        let review = required(args.review, ARG_REVIEW, ENV_RATE_REVIEW)?;
        let gate_command = required(args.gate_command, ARG_GATE_COMMAND, ENV_RATE_GATE_COMMAND)?;
        let rated_at = args.rated_at.unwrap_or_else(|| Utc::now().timestamp());
        let event = RatingEvent::new(user, venue, rating, rated_at).map_err(|source| {
            CliError::InvalidRating {
                field: ARG_RATING,
                source,
            }
        })?;

        Ok(Self {
            catalog_db,
            event,
            review,
            gate_command,
        })
    }
}

pub(super) fn run_rate(args: RateArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_rate_with(args, &mut stdout)
}

pub(super) fn run_rate_with(args: RateArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.catalog_db, ARG_CATALOG_DB)?;
    let gate = CommandGate::new(config.gate_command.as_str());
    execute_rate(&config, &gate)?;
    write_report(writer, &config.event)
}

/// Screen the review through `gate` and store the rating when accepted.
pub(super) fn execute_rate(config: &RateConfig, gate: &dyn ReviewGate) -> Result<(), CliError> {
    let catalog = SqliteCatalog::open(config.catalog_db.as_std_path()).map_err(|source| {
        CliError::OpenCatalog {
            path: config.catalog_db.clone(),
            source,
        }
    })?;
    let outcome = catalog
        .record_rating(&config.event, &config.review, gate)
        .map_err(|source| CliError::UpdateCatalog {
            path: config.catalog_db.clone(),
            source,
        })?;
    match outcome {
        RecordOutcome::Stored => {
            info!(
                "stored {} star rating of {} by {}",
                config.event.rating(),
                config.event.venue(),
                config.event.user()
            );
            Ok(())
        }
        RecordOutcome::Rejected(verdict) => Err(CliError::ReviewRejected {
            venue: config.event.venue().clone(),
            verdict,
        }),
    }
}
