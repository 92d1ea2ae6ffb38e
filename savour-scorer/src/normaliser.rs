//! Batch-relative z-score normalisation.
//!
//! Statistics are computed over the candidate batch alone, never over the
//! full catalogue. The same venue can therefore map to different feature
//! vectors in different requests; scores are only comparable within one
//! batch.

use std::collections::HashMap;

use log::debug;
use savour_core::{FeatureSchema, FieldTreatment, VenueField, VenueId, VenueRecord};

use crate::SchemaMismatch;

/// Mean and sample standard deviation of one normalised column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStatistics {
    mean: f64,
    std_dev: f64,
}

impl ColumnStatistics {
    /// Column mean over the batch.
    #[must_use]
    pub const fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation (`n - 1` denominator). Zero for batches of
    /// fewer than two records.
    #[must_use]
    pub const fn std_dev(&self) -> f64 {
        self.std_dev
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "column statistics are floating-point by definition"
    )]
    fn of(values: &[f64]) -> Self {
        let count = values.iter().fold(0.0, |n, _| n + 1.0);
        if count < 1.0 {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
            };
        }
        let mean = values.iter().sum::<f64>() / count;
        if count < 2.0 {
            return Self { mean, std_dev: 0.0 };
        }
        let squares: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
        Self {
            mean,
            std_dev: (squares / (count - 1.0)).sqrt(),
        }
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "z-score is a floating-point rescale"
    )]
    fn standardise(self, value: f64) -> f64 {
        if self.std_dev > 0.0 && self.std_dev.is_finite() {
            (value - self.mean) / self.std_dev
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnTransform {
    Standardise(ColumnStatistics),
    Passthrough,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Column {
    field: VenueField,
    transform: ColumnTransform,
}

/// Per-column transforms derived from one candidate batch.
///
/// Besides normalising the batch itself, the statistics can project venues
/// outside the batch onto the same scale, which the full-history scope uses
/// for rated venues that are not candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStatistics {
    columns: Vec<Column>,
    shape: Vec<String>,
}

impl BatchStatistics {
    /// Number of feature columns.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.columns.len()
    }

    /// Statistics of a normalised column, or `None` when the field is passed
    /// through or not a column at all.
    #[must_use]
    pub fn column(&self, field: VenueField) -> Option<ColumnStatistics> {
        self.columns
            .iter()
            .find(|column| column.field == field)
            .and_then(|column| match column.transform {
                ColumnTransform::Standardise(stats) => Some(stats),
                ColumnTransform::Passthrough => None,
            })
    }

    /// Map a record onto this batch's feature scale.
    ///
    /// # Errors
    /// Returns [`SchemaMismatch`] when the record's optional fields differ
    /// from the batch, or a column value is missing or non-finite.
    pub fn project(&self, record: &VenueRecord) -> Result<Vec<f64>, SchemaMismatch> {
        ensure_shape(&self.shape, record)?;
        let raw = raw_row(self.columns.iter().map(|column| column.field), record)?;
        Ok(self.transform(raw))
    }

    fn transform(&self, raw: Vec<f64>) -> Vec<f64> {
        raw.into_iter()
            .zip(&self.columns)
            .map(|(value, column)| match column.transform {
                ColumnTransform::Standardise(stats) => stats.standardise(value),
                ColumnTransform::Passthrough => value,
            })
            .collect()
    }
}

/// Normalised feature vectors for one candidate batch, in batch order.
///
/// # Examples
/// ```
/// use savour_core::{FeatureSchema, VenueId, VenueRecord};
/// use savour_scorer::FeatureMatrix;
///
/// let batch: Vec<_> = [("a", 4.5, 100), ("b", 3.0, 10)]
///     .into_iter()
///     .map(|(key, rating, count)| {
///         VenueRecord::new(VenueId::new(key).unwrap(), rating, count)
///             .with_price_tier(2)
///             .with_all_flags(false)
///     })
///     .collect();
/// let matrix = FeatureMatrix::from_batch(&FeatureSchema::reference(), &batch).unwrap();
/// assert_eq!(matrix.len(), 2);
/// assert_eq!(matrix.dimension(), 17);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    venues: Vec<VenueId>,
    rows: Vec<Vec<f64>>,
    index: HashMap<VenueId, usize>,
    statistics: BatchStatistics,
}

impl FeatureMatrix {
    /// Validate a batch against `schema` and normalise it.
    ///
    /// Every record must carry the same optional fields, a value for each
    /// schema column, and finite numbers throughout. Venue ids must be
    /// unique within the batch. A column whose batch standard deviation is
    /// zero maps to `0.0` for every record.
    ///
    /// # Errors
    /// Returns [`SchemaMismatch`] describing the first offending record.
    pub fn from_batch(
        schema: &FeatureSchema,
        batch: &[VenueRecord],
    ) -> Result<Self, SchemaMismatch> {
        let fields: Vec<_> = schema.columns().copied().collect();
        let shape = batch.first().map(record_shape).unwrap_or_default();
        let mut index = HashMap::with_capacity(batch.len());
        let mut raw_rows = Vec::with_capacity(batch.len());
        for (position, record) in batch.iter().enumerate() {
            ensure_shape(&shape, record)?;
            if index.insert(record.id.clone(), position).is_some() {
                return Err(SchemaMismatch::DuplicateVenue {
                    venue: record.id.clone(),
                });
            }
            raw_rows.push(raw_row(fields.iter().map(|d| d.field), record)?);
        }

        let columns: Vec<Column> = fields
            .iter()
            .enumerate()
            .map(|(position, descriptor)| Column {
                field: descriptor.field,
                transform: match descriptor.treatment {
                    FieldTreatment::Normalised => {
                        let values: Vec<f64> = raw_rows
                            .iter()
                            .filter_map(|row| row.get(position).copied())
                            .collect();
                        ColumnTransform::Standardise(ColumnStatistics::of(&values))
                    }
                    FieldTreatment::Passthrough | FieldTreatment::Excluded => {
                        ColumnTransform::Passthrough
                    }
                },
            })
            .collect();
        let statistics = BatchStatistics { columns, shape };
        let rows = raw_rows
            .into_iter()
            .map(|raw| statistics.transform(raw))
            .collect();
        debug!(
            "normalised {} venues into {} columns (schema v{})",
            batch.len(),
            statistics.dimension(),
            schema.version()
        );
        Ok(Self {
            venues: batch.iter().map(|record| record.id.clone()).collect(),
            rows,
            index,
            statistics,
        })
    }

    /// Number of venues in the batch.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.venues.len()
    }

    /// Whether the batch was empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    /// Width of every row.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.statistics.dimension()
    }

    /// Statistics the batch was normalised with.
    #[must_use]
    pub const fn statistics(&self) -> &BatchStatistics {
        &self.statistics
    }

    /// Feature vector of a venue in the batch.
    #[must_use]
    pub fn row(&self, venue: &VenueId) -> Option<&[f64]> {
        self.index
            .get(venue)
            .and_then(|&position| self.rows.get(position))
            .map(Vec::as_slice)
    }

    /// Iterate over `(venue, features)` pairs in batch order.
    pub fn rows(&self) -> impl Iterator<Item = (&VenueId, &[f64])> + '_ {
        self.venues
            .iter()
            .zip(self.rows.iter().map(Vec::as_slice))
    }
}

fn record_shape(record: &VenueRecord) -> Vec<String> {
    let mut shape = Vec::new();
    if record.price_tier.is_some() {
        shape.push(VenueField::PriceTier.to_string());
    }
    shape.extend(record.flag_set().map(|flag| flag.as_str().to_owned()));
    shape
}

fn ensure_shape(expected: &[String], record: &VenueRecord) -> Result<(), SchemaMismatch> {
    let found = record_shape(record);
    if found == expected {
        Ok(())
    } else {
        Err(SchemaMismatch::FieldSetDiffers {
            venue: record.id.clone(),
            expected: expected.to_vec(),
            found,
        })
    }
}

fn raw_row(
    fields: impl Iterator<Item = VenueField>,
    record: &VenueRecord,
) -> Result<Vec<f64>, SchemaMismatch> {
    fields.map(|field| raw_value(field, record)).collect()
}

fn raw_value(field: VenueField, record: &VenueRecord) -> Result<f64, SchemaMismatch> {
    let value = field
        .raw_value(record)
        .ok_or_else(|| SchemaMismatch::MissingField {
            venue: record.id.clone(),
            field,
        })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SchemaMismatch::NonFiniteValue {
            venue: record.id.clone(),
            field,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use savour_core::{AttributeFlag, FieldDescriptor};

    use super::*;
    use crate::test_fixtures::{id, venue};

    fn approx(actual: f64, expected: f64) -> bool {
        #[expect(clippy::float_arithmetic, reason = "tolerance check")]
        let delta = (actual - expected).abs();
        delta < 1e-9
    }

    fn continuous_only() -> FeatureSchema {
        FeatureSchema::new(
            7,
            vec![
                FieldDescriptor::new(VenueField::AverageRating, FieldTreatment::Normalised),
                FieldDescriptor::new(VenueField::ReviewCount, FieldTreatment::Normalised),
            ],
        )
        .expect("valid schema")
    }

    #[rstest]
    fn uses_sample_standard_deviation() {
        let batch = vec![venue("a", 4.5, 100), venue("b", 3.0, 10)];
        let matrix = FeatureMatrix::from_batch(&continuous_only(), &batch).expect("normalise");
        let stats = matrix
            .statistics()
            .column(VenueField::AverageRating)
            .expect("normalised column");
        assert!(approx(stats.mean(), 3.75));
        assert!(approx(stats.std_dev(), 0.75_f64.hypot(0.75)));
        let a = matrix.row(&id("a")).expect("row a");
        let b = matrix.row(&id("b")).expect("row b");
        assert!(approx(a.first().copied().unwrap_or_default(), std::f64::consts::FRAC_1_SQRT_2));
        assert!(approx(b.first().copied().unwrap_or_default(), -std::f64::consts::FRAC_1_SQRT_2));
    }

    #[rstest]
    fn constant_column_maps_to_zero() {
        let batch = vec![venue("a", 4.0, 10), venue("b", 4.0, 30), venue("c", 4.0, 50)];
        let matrix = FeatureMatrix::from_batch(&continuous_only(), &batch).expect("normalise");
        for (_, row) in matrix.rows() {
            assert_eq!(row.first().copied(), Some(0.0));
        }
    }

    #[rstest]
    fn single_record_normalises_to_zero() {
        let batch = vec![venue("solo", 4.8, 900)];
        let matrix = FeatureMatrix::from_batch(&continuous_only(), &batch).expect("normalise");
        assert_eq!(matrix.row(&id("solo")), Some([0.0, 0.0].as_slice()));
    }

    #[rstest]
    fn passthrough_columns_keep_raw_scale() {
        let batch = vec![
            venue("a", 4.0, 10).with_flag(AttributeFlag::Delivery, true),
            venue("b", 3.0, 20),
        ];
        let matrix =
            FeatureMatrix::from_batch(&FeatureSchema::reference(), &batch).expect("normalise");
        let row = matrix.row(&id("a")).expect("row a");
        assert_eq!(row.get(2).copied(), Some(2.0));
        let delivery = 3 + AttributeFlag::ALL
            .iter()
            .position(|flag| *flag == AttributeFlag::Delivery)
            .expect("delivery is a flag");
        assert_eq!(row.get(delivery).copied(), Some(1.0));
    }

    #[rstest]
    fn rejects_duplicate_venues() {
        let batch = vec![venue("a", 4.0, 10), venue("a", 3.0, 20)];
        let err = FeatureMatrix::from_batch(&continuous_only(), &batch).expect_err("duplicate");
        assert_eq!(err, SchemaMismatch::DuplicateVenue { venue: id("a") });
    }

    #[rstest]
    fn rejects_non_finite_values() {
        let batch = vec![venue("a", 4.0, 10), venue("b", f64::NAN, 20)];
        let err = FeatureMatrix::from_batch(&continuous_only(), &batch).expect_err("nan");
        assert_eq!(
            err,
            SchemaMismatch::NonFiniteValue {
                venue: id("b"),
                field: VenueField::AverageRating,
            }
        );
    }

    #[rstest]
    fn rejects_heterogeneous_field_sets() {
        let mut odd = venue("b", 3.0, 20);
        odd.flags.remove(&AttributeFlag::Parking);
        let batch = vec![venue("a", 4.0, 10), odd];
        let err = FeatureMatrix::from_batch(&continuous_only(), &batch).expect_err("shape");
        assert!(matches!(err, SchemaMismatch::FieldSetDiffers { venue, .. } if venue == id("b")));
    }

    #[rstest]
    fn rejects_missing_schema_columns() {
        let bare = VenueRecord::new(id("bare"), 4.0, 10);
        let err = FeatureMatrix::from_batch(&FeatureSchema::reference(), &[bare])
            .expect_err("missing price tier");
        assert_eq!(
            err,
            SchemaMismatch::MissingField {
                venue: id("bare"),
                field: VenueField::PriceTier,
            }
        );
    }

    #[rstest]
    fn projects_outside_records_onto_batch_scale() {
        let batch = vec![venue("a", 4.0, 10), venue("b", 2.0, 30)];
        let matrix = FeatureMatrix::from_batch(&continuous_only(), &batch).expect("normalise");
        let outside = matrix
            .statistics()
            .project(&venue("c", 3.0, 20))
            .expect("project");
        assert_eq!(outside, vec![0.0, 0.0]);
    }

    #[rstest]
    fn empty_batch_yields_empty_matrix() {
        let matrix = FeatureMatrix::from_batch(&continuous_only(), &[]).expect("normalise");
        assert!(matrix.is_empty());
        assert_eq!(matrix.dimension(), 2);
    }
}
