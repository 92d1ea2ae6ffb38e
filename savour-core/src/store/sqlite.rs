//! SQLite-backed venue catalogue and rating history.

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};
use thiserror::Error;

use crate::{
    AttributeFlag, CandidateSource, FacetFilter, RatingEvent, RatingHistorySource, ReviewGate,
    ReviewVerdict, SourceError, UserId, VenueId, VenueRecord, Vocabulary,
};

const CREATE_TABLES_SQL: &str = "
    CREATE TABLE IF NOT EXISTS venues (
        seq INTEGER PRIMARY KEY,
        venue_id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        city TEXT NOT NULL,
        average_rating REAL NOT NULL,
        review_count INTEGER NOT NULL,
        price_tier INTEGER,
        flags TEXT NOT NULL,
        cuisines TEXT NOT NULL,
        ambiences TEXT NOT NULL,
        opening_hours TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS ratings (
        seq INTEGER PRIMARY KEY,
        user_id TEXT NOT NULL,
        venue_id TEXT NOT NULL REFERENCES venues (venue_id),
        rating REAL NOT NULL,
        rated_at INTEGER NOT NULL,
        review_text TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS ratings_by_user ON ratings (user_id);";

const SELECT_VENUES_SQL: &str = "SELECT venue_id, name, city, average_rating, review_count,
        price_tier, flags, cuisines, ambiences, opening_hours
     FROM venues
     WHERE (?1 IS NULL OR average_rating >= ?1)
       AND (?2 IS NULL OR price_tier = ?2)
     ORDER BY seq";

const SELECT_RATINGS_SQL: &str =
    "SELECT user_id, venue_id, rating, rated_at FROM ratings ORDER BY rated_at, seq";

/// Errors raised by [`SqliteCatalog`].
#[derive(Debug, Error)]
pub enum SqliteCatalogError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Preparing or executing a statement failed.
    #[error("failed to {operation}: {source}")]
    Query {
        /// Description of the failed operation.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A JSON column could not be encoded or decoded.
    #[error("failed to read {column} for venue {venue}: {source}")]
    Json {
        /// Venue key of the affected row.
        venue: String,
        /// Column name.
        column: &'static str,
        /// JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A stored row violated a domain invariant.
    #[error("stored row for {key} is invalid: {reason}")]
    InvalidRow {
        /// Key of the affected row.
        key: String,
        /// Human-readable reason.
        reason: String,
    },
    /// A rating referenced a venue that is not in the catalogue.
    #[error("venue {venue} is not in the catalogue")]
    UnknownVenue {
        /// Referenced venue.
        venue: VenueId,
    },
}

/// Outcome of [`SqliteCatalog::record_rating`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The review passed the gate and the rating was stored.
    Stored,
    /// The gate refused the review; nothing was stored.
    Rejected(ReviewVerdict),
}

/// Venue catalogue and rating history persisted in SQLite.
pub struct SqliteCatalog {
    connection: Connection,
    cuisines: Option<Vocabulary>,
    ambiences: Option<Vocabulary>,
}

impl fmt::Debug for SqliteCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteCatalog")
            .field("cuisines", &self.cuisines.as_ref().map(Vocabulary::len))
            .field("ambiences", &self.ambiences.as_ref().map(Vocabulary::len))
            .finish_non_exhaustive()
    }
}

impl SqliteCatalog {
    /// Open an existing catalogue for reading and writing.
    ///
    /// # Errors
    /// Returns [`SqliteCatalogError::OpenDatabase`] when the file cannot be
    /// opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteCatalogError> {
        let path = path.as_ref();
        let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
            .map_err(|source| SqliteCatalogError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_connection(connection))
    }

    /// Open or create a catalogue file and ensure its tables exist.
    ///
    /// # Errors
    /// Returns [`SqliteCatalogError`] when the file cannot be opened or the
    /// tables cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, SqliteCatalogError> {
        let path = path.as_ref();
        let connection =
            Connection::open(path).map_err(|source| SqliteCatalogError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;
        let catalog = Self::from_connection(connection);
        catalog.initialise()?;
        Ok(catalog)
    }

    /// Create an empty, initialised in-memory catalogue.
    ///
    /// # Errors
    /// Returns [`SqliteCatalogError`] when SQLite refuses the schema.
    pub fn open_in_memory() -> Result<Self, SqliteCatalogError> {
        let connection =
            Connection::open_in_memory().map_err(|source| SqliteCatalogError::OpenDatabase {
                path: PathBuf::from(":memory:"),
                source,
            })?;
        let catalog = Self::from_connection(connection);
        catalog.initialise()?;
        Ok(catalog)
    }

    const fn from_connection(connection: Connection) -> Self {
        Self {
            connection,
            cuisines: None,
            ambiences: None,
        }
    }

    /// Restrict stored cuisine and ambience tags to known vocabularies.
    ///
    /// Unknown tags are dropped on insert with a warning.
    #[must_use]
    pub fn with_vocabularies(mut self, cuisines: Vocabulary, ambiences: Vocabulary) -> Self {
        self.cuisines = Some(cuisines);
        self.ambiences = Some(ambiences);
        self
    }

    /// Create the catalogue tables when missing.
    ///
    /// # Errors
    /// Returns [`SqliteCatalogError::Query`] when SQLite refuses the schema.
    pub fn initialise(&self) -> Result<(), SqliteCatalogError> {
        self.connection
            .execute_batch(CREATE_TABLES_SQL)
            .map_err(|source| SqliteCatalogError::Query {
                operation: "create catalogue tables",
                source,
            })
    }

    /// Insert or replace a venue.
    ///
    /// # Errors
    /// Returns [`SqliteCatalogError`] when encoding or writing the row fails.
    pub fn insert_venue(&self, venue: &VenueRecord) -> Result<(), SqliteCatalogError> {
        let cuisines = screen_tags(&venue.id, "cuisine", self.cuisines.as_ref(), &venue.cuisines);
        let ambiences =
            screen_tags(&venue.id, "ambience", self.ambiences.as_ref(), &venue.ambiences);
        let flags: BTreeMap<&str, bool> = venue
            .flags
            .iter()
            .map(|(flag, set)| (flag.as_str(), *set))
            .collect();

        self.connection
            .execute(
                "INSERT INTO venues (venue_id, name, city, average_rating, review_count,
                    price_tier, flags, cuisines, ambiences, opening_hours)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT (venue_id) DO UPDATE SET
                    name = excluded.name,
                    city = excluded.city,
                    average_rating = excluded.average_rating,
                    review_count = excluded.review_count,
                    price_tier = excluded.price_tier,
                    flags = excluded.flags,
                    cuisines = excluded.cuisines,
                    ambiences = excluded.ambiences,
                    opening_hours = excluded.opening_hours",
                params![
                    venue.id.as_str(),
                    venue.name,
                    venue.city,
                    venue.average_rating,
                    venue.review_count,
                    venue.price_tier,
                    encode_json(&venue.id, "flags", &flags)?,
                    encode_json(&venue.id, "cuisines", &cuisines)?,
                    encode_json(&venue.id, "ambiences", &ambiences)?,
                    encode_json(&venue.id, "opening_hours", &venue.hours)?,
                ],
            )
            .map_err(|source| SqliteCatalogError::Query {
                operation: "insert venue",
                source,
            })?;
        Ok(())
    }

    /// Store a rating after screening its review text through `gate`.
    ///
    /// # Errors
    /// Returns [`SqliteCatalogError::UnknownVenue`] when the rated venue is not
    /// catalogued, or [`SqliteCatalogError::Query`] when the write fails.
    pub fn record_rating(
        &self,
        event: &RatingEvent,
        review_text: &str,
        gate: &dyn ReviewGate,
    ) -> Result<RecordOutcome, SqliteCatalogError> {
        if !self.contains_venue(event.venue())? {
            return Err(SqliteCatalogError::UnknownVenue {
                venue: event.venue().clone(),
            });
        }
        let verdict = gate.classify(review_text);
        if !verdict.is_accepted() {
            debug!(
                "rejected {verdict} review from {} for {}",
                event.user(),
                event.venue()
            );
            return Ok(RecordOutcome::Rejected(verdict));
        }
        self.connection
            .execute(
                "INSERT INTO ratings (user_id, venue_id, rating, rated_at, review_text)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    event.user().as_str(),
                    event.venue().as_str(),
                    event.rating(),
                    event.timestamp(),
                    review_text,
                ],
            )
            .map_err(|source| SqliteCatalogError::Query {
                operation: "insert rating",
                source,
            })?;
        Ok(RecordOutcome::Stored)
    }

    fn contains_venue(&self, venue: &VenueId) -> Result<bool, SqliteCatalogError> {
        self.connection
            .query_row(
                "SELECT 1 FROM venues WHERE venue_id = ?1 LIMIT 1",
                [venue.as_str()],
                |_| Ok(()),
            )
            .optional()
            .map(|row| row.is_some())
            .map_err(|source| SqliteCatalogError::Query {
                operation: "look up venue",
                source,
            })
    }

    /// Load every venue matching `filter`, in insertion order.
    ///
    /// # Errors
    /// Returns [`SqliteCatalogError`] when a query fails or a row is corrupt.
    pub fn venues(&self, filter: &FacetFilter) -> Result<Vec<VenueRecord>, SqliteCatalogError> {
        let mut statement = self
            .connection
            .prepare_cached(SELECT_VENUES_SQL)
            .map_err(|source| SqliteCatalogError::Query {
                operation: "prepare venue query",
                source,
            })?;
        let mut rows = statement
            .query(params![filter.min_rating, filter.price_tier])
            .map_err(|source| SqliteCatalogError::Query {
                operation: "query venues",
                source,
            })?;

        let mut venues = Vec::new();
        while let Some(row) = rows.next().map_err(|source| SqliteCatalogError::Query {
            operation: "read venue row",
            source,
        })? {
            let venue = venue_from_row(row)?;
            if filter.matches(&venue) {
                venues.push(venue);
            }
        }
        Ok(venues)
    }

    /// Load every stored rating ordered by time, then insertion.
    ///
    /// # Errors
    /// Returns [`SqliteCatalogError`] when a query fails or a row is corrupt.
    pub fn ratings(&self) -> Result<Vec<RatingEvent>, SqliteCatalogError> {
        let mut statement = self
            .connection
            .prepare_cached(SELECT_RATINGS_SQL)
            .map_err(|source| SqliteCatalogError::Query {
                operation: "prepare rating query",
                source,
            })?;
        let mut rows = statement
            .query([])
            .map_err(|source| SqliteCatalogError::Query {
                operation: "query ratings",
                source,
            })?;

        let mut events = Vec::new();
        while let Some(row) = rows.next().map_err(|source| SqliteCatalogError::Query {
            operation: "read rating row",
            source,
        })? {
            events.push(rating_from_row(row)?);
        }
        Ok(events)
    }
}

impl CandidateSource for SqliteCatalog {
    fn fetch_candidates(&self, filter: &FacetFilter) -> Result<Vec<VenueRecord>, SourceError> {
        self.venues(filter)
            .map_err(|err| SourceError::backend("fetch candidates", err))
    }
}

impl RatingHistorySource for SqliteCatalog {
    fn fetch_rating_history(&self) -> Result<Vec<RatingEvent>, SourceError> {
        self.ratings()
            .map_err(|err| SourceError::backend("fetch rating history", err))
    }
}

fn screen_tags(
    venue: &VenueId,
    kind: &str,
    vocabulary: Option<&Vocabulary>,
    tags: &[String],
) -> Vec<String> {
    let Some(vocabulary) = vocabulary else {
        return tags.to_vec();
    };
    let (known, unknown) = vocabulary.partition(tags);
    if !unknown.is_empty() {
        warn!("dropping unknown {kind} tags {unknown:?} for venue {venue}");
    }
    known
}

fn encode_json<T: serde::Serialize>(
    venue: &VenueId,
    column: &'static str,
    value: &T,
) -> Result<String, SqliteCatalogError> {
    serde_json::to_string(value).map_err(|source| SqliteCatalogError::Json {
        venue: venue.to_string(),
        column,
        source,
    })
}

fn decode_json<T: serde::de::DeserializeOwned>(
    venue: &str,
    column: &'static str,
    raw: &str,
) -> Result<T, SqliteCatalogError> {
    serde_json::from_str(raw).map_err(|source| SqliteCatalogError::Json {
        venue: venue.to_owned(),
        column,
        source,
    })
}

fn read_column<T: rusqlite::types::FromSql>(
    row: &Row<'_>,
    index: usize,
) -> Result<T, SqliteCatalogError> {
    row.get(index).map_err(|source| SqliteCatalogError::Query {
        operation: "decode column",
        source,
    })
}

fn venue_from_row(row: &Row<'_>) -> Result<VenueRecord, SqliteCatalogError> {
    let key: String = read_column(row, 0)?;
    let id = VenueId::new(key.clone()).map_err(|err| invalid_row(&key, err))?;
    let raw_flags: BTreeMap<String, bool> = decode_json(&key, "flags", &read_column::<String>(row, 6)?)?;
    let mut flags = BTreeMap::new();
    for (name, set) in raw_flags {
        let flag: AttributeFlag = name.parse().map_err(|reason| invalid_row(&key, reason))?;
        flags.insert(flag, set);
    }

    Ok(VenueRecord {
        id,
        name: read_column(row, 1)?,
        city: read_column(row, 2)?,
        average_rating: read_column(row, 3)?,
        review_count: read_column(row, 4)?,
        price_tier: read_column(row, 5)?,
        flags,
        cuisines: decode_json(&key, "cuisines", &read_column::<String>(row, 7)?)?,
        ambiences: decode_json(&key, "ambiences", &read_column::<String>(row, 8)?)?,
        hours: decode_json(&key, "opening_hours", &read_column::<String>(row, 9)?)?,
    })
}

fn rating_from_row(row: &Row<'_>) -> Result<RatingEvent, SqliteCatalogError> {
    let user_key: String = read_column(row, 0)?;
    let venue_key: String = read_column(row, 1)?;
    let key = format!("{user_key}/{venue_key}");
    let user = UserId::new(user_key).map_err(|err| invalid_row(&key, err))?;
    let venue = VenueId::new(venue_key).map_err(|err| invalid_row(&key, err))?;
    RatingEvent::new(user, venue, read_column(row, 2)?, read_column(row, 3)?)
        .map_err(|err| invalid_row(&key, err))
}

fn invalid_row(key: &str, reason: impl fmt::Display) -> SqliteCatalogError {
    SqliteCatalogError::InvalidRow {
        key: key.to_owned(),
        reason: reason.to_string(),
    }
}
