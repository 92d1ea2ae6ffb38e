//! Rank command implementation for the Savour CLI.

use std::collections::BTreeSet;
use std::io::Write;

use camino::Utf8PathBuf;
use chrono::Local;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use savour_core::{AttributeFlag, FacetFilter, OpenAt, SqliteCatalog, UserId};
use savour_scorer::{
    DEFAULT_TOP_N, EngineConfig, HistoryScope, Ranking, RecommendationEngine,
};
use serde::{Deserialize, Serialize};

use crate::fs::require_existing;
use crate::{
    ARG_CATALOG_DB, ARG_HISTORY_SCOPE, ARG_OPEN_AT, ARG_OPEN_NOW, ARG_TOP_N, ARG_USER, CliError,
    ENV_RANK_CATALOG_DB, ENV_RANK_USER, write_report,
};

/// CLI arguments for the `rank` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Rank the venues of a SQLite catalogue for one user. Facet \
                 options narrow the candidate batch; the user's own ratings \
                 inside that batch shape the order, and venues fall back to \
                 average-rating order when there are none. The ranking is \
                 printed as JSON.",
    about = "Rank catalogue venues for a user"
)]
#[ortho_config(prefix = "SAVOUR")]
pub(crate) struct RankArgs {
    /// Path to the SQLite catalogue.
    #[arg(long = ARG_CATALOG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) catalog_db: Option<Utf8PathBuf>,
    /// User whose ratings personalise the ranking.
    #[arg(long = ARG_USER, value_name = "key")]
    #[serde(default)]
    pub(crate) user: Option<String>,
    /// Maximum number of venues to print (default 500).
    #[arg(long = ARG_TOP_N, value_name = "count")]
    #[serde(default)]
    pub(crate) top_n: Option<usize>,
    /// Which ratings may shape the profile.
    #[arg(long = ARG_HISTORY_SCOPE, value_name = "candidate-batch|full-history")]
    #[serde(default)]
    pub(crate) history_scope: Option<HistoryScope>,
    /// Keep venues whose name contains this text.
    #[arg(long, value_name = "text")]
    #[serde(default)]
    pub(crate) name: Option<String>,
    /// Keep venues whose city contains this text.
    #[arg(long, value_name = "text")]
    #[serde(default)]
    pub(crate) city: Option<String>,
    /// Keep venues tagged with this cuisine.
    #[arg(long, value_name = "cuisine")]
    #[serde(default)]
    pub(crate) cuisine: Option<String>,
    /// Keep venues tagged with this ambience.
    #[arg(long, value_name = "ambience")]
    #[serde(default)]
    pub(crate) ambience: Option<String>,
    /// Keep venues rated at least this highly on average.
    #[arg(long, value_name = "stars")]
    #[serde(default)]
    pub(crate) min_rating: Option<f64>,
    /// Keep venues in exactly this price tier.
    #[arg(long, value_name = "tier")]
    #[serde(default)]
    pub(crate) price_tier: Option<u8>,
    /// Keep venues offering this amenity. Repeat for several.
    #[arg(long = "require", value_name = "flag")]
    #[serde(default)]
    pub(crate) require: Vec<AttributeFlag>,
    /// Keep venues open at this weekday and time, e.g. "friday 19:30".
    #[arg(long = ARG_OPEN_AT, value_name = "day HH:MM", conflicts_with = "open_now")]
    #[serde(default)]
    pub(crate) open_at: Option<String>,
    /// Keep venues open at the current local time.
    #[arg(long = ARG_OPEN_NOW)]
    #[serde(default)]
    pub(crate) open_now: bool,
}

impl RankArgs {
    pub(crate) fn into_config(self) -> Result<RankConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RankConfig::try_from(merged)
    }
}

/// Resolved `rank` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RankConfig {
    /// Path to the SQLite catalogue.
    pub(crate) catalog_db: Utf8PathBuf,
    /// User being ranked for.
    pub(crate) user: UserId,
    /// Engine settings.
    pub(crate) engine: EngineConfig,
    /// Facets narrowing the candidate batch.
    pub(crate) filter: FacetFilter,
}

impl RankConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.catalog_db, ARG_CATALOG_DB)
    }
}

fn resolve_open_at(raw: Option<&str>, open_now: bool) -> Result<Option<OpenAt>, CliError> {
    if open_now {
        return Ok(Some(OpenAt::from_datetime(Local::now().naive_local())));
    }
    raw.map(|text| {
        text.parse().map_err(|source| CliError::InvalidOpenAt {
            field: ARG_OPEN_AT,
            source,
        })
    })
    .transpose()
}

impl TryFrom<RankArgs> for RankConfig {
    type Error = CliError;

    fn try_from(args: RankArgs) -> Result<Self, Self::Error> {
        let catalog_db = args.catalog_db.ok_or(CliError::MissingArgument {
            field: ARG_CATALOG_DB,
            env: ENV_RANK_CATALOG_DB,
        })?;
        let raw_user = args.user.ok_or(CliError::MissingArgument {
            field: ARG_USER,
            env: ENV_RANK_USER,
        })?;
        let user = UserId::new(raw_user).map_err(|source| CliError::InvalidIdentifier {
            field: ARG_USER,
            source,
        })?;

        let engine = EngineConfig {
            scope: args.history_scope.unwrap_or_default(),
            top_n: args.top_n.unwrap_or(DEFAULT_TOP_N),
            ..EngineConfig::default()
        };
        engine.validate()?;

        let filter = FacetFilter {
            name: args.name,
            city: args.city,
            cuisine: args.cuisine,
            ambience: args.ambience,
            min_rating: args.min_rating,
            price_tier: args.price_tier,
            required_flags: args.require.into_iter().collect::<BTreeSet<_>>(),
            open_at: resolve_open_at(args.open_at.as_deref(), args.open_now)?,
        };

        Ok(Self {
            catalog_db,
            user,
            engine,
            filter,
        })
    }
}

#[derive(Serialize)]
struct RankReport<'a> {
    user: &'a UserId,
    #[serde(flatten)]
    ranking: &'a Ranking,
}

pub(super) fn run_rank(args: RankArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_rank_with(args, &mut stdout)
}

pub(super) fn run_rank_with(args: RankArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = resolve_rank_config(args)?;
    let ranking = execute_rank(&config)?;
    write_report(
        writer,
        &RankReport {
            user: &config.user,
            ranking: &ranking,
        },
    )
}

fn resolve_rank_config(args: RankArgs) -> Result<RankConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

pub(super) fn execute_rank(config: &RankConfig) -> Result<Ranking, CliError> {
    let catalog = SqliteCatalog::open(config.catalog_db.as_std_path()).map_err(|source| {
        CliError::OpenCatalog {
            path: config.catalog_db.clone(),
            source,
        }
    })?;
    let engine = RecommendationEngine::new(config.engine.clone())?;
    let ranking = engine
        .rank_from_sources(&config.user, &config.filter, &catalog, &catalog)
        .map_err(|source| CliError::Rank { source })?;
    info!(
        "ranked {} venues for {} using {}",
        ranking.len(),
        config.user,
        ranking.strategy()
    );
    Ok(ranking)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RankConfig, CliError> {
    let merged = RankArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RankConfig::try_from(merged)
}
