//! Versioned description of how venue fields become feature columns.
//!
//! Each [`FieldDescriptor`] pairs a [`VenueField`] with a
//! [`FieldTreatment`]. Continuous fields may be z-score normalised; flags and
//! the price tier pass through on their raw scale. The resulting vector is
//! deliberately mixed-scale.
//!
//! # Examples
//! ```
//! use savour_core::{FeatureSchema, FieldTreatment, VenueField};
//!
//! let schema = FeatureSchema::reference();
//! let mut columns = schema.columns();
//! let first = columns.next().expect("at least one column");
//! assert_eq!(first.field, VenueField::AverageRating);
//! assert_eq!(first.treatment, FieldTreatment::Normalised);
//! assert_eq!(schema.dimension(), 17);
//! ```

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::{AttributeFlag, VenueRecord};

/// A venue attribute the schema can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VenueField {
    /// Display name. Never a feature.
    Name,
    /// City. Never a feature.
    City,
    /// Mean star rating.
    AverageRating,
    /// Review count.
    ReviewCount,
    /// Integer price tier.
    PriceTier,
    /// One amenity flag.
    Flag(AttributeFlag),
    /// Cuisine tags. Never a feature.
    Cuisines,
    /// Ambience tags. Never a feature.
    Ambiences,
    /// Weekly opening hours. Never a feature.
    OpeningHours,
}

impl VenueField {
    /// Whether the field is numeric and may be z-score normalised.
    pub const fn is_continuous(self) -> bool {
        matches!(self, Self::AverageRating | Self::ReviewCount)
    }

    /// Whether the field can yield a numeric feature value at all.
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::AverageRating | Self::ReviewCount | Self::PriceTier | Self::Flag(_)
        )
    }

    /// Read the raw numeric value of this field from a record.
    ///
    /// Returns `None` for non-numeric fields and for values the record does
    /// not carry (an unknown flag or a missing price tier).
    pub fn raw_value(self, record: &VenueRecord) -> Option<f64> {
        match self {
            Self::AverageRating => Some(record.average_rating),
            Self::ReviewCount => Some(f64::from(record.review_count)),
            Self::PriceTier => record.price_tier.map(f64::from),
            Self::Flag(flag) => record.flag(flag).map(|set| if set { 1.0 } else { 0.0 }),
            Self::Name | Self::City | Self::Cuisines | Self::Ambiences | Self::OpeningHours => {
                None
            }
        }
    }
}

impl fmt::Display for VenueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::City => f.write_str("city"),
            Self::AverageRating => f.write_str("average_rating"),
            Self::ReviewCount => f.write_str("review_count"),
            Self::PriceTier => f.write_str("price_tier"),
            Self::Flag(flag) => f.write_str(flag.as_str()),
            Self::Cuisines => f.write_str("cuisines"),
            Self::Ambiences => f.write_str("ambiences"),
            Self::OpeningHours => f.write_str("opening_hours"),
        }
    }
}

/// How a field contributes to the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldTreatment {
    /// Rescaled to `(value - batch_mean) / batch_std`.
    Normalised,
    /// Copied through on its raw scale.
    Passthrough,
    /// Left out of the feature vector.
    Excluded,
}

/// One entry of a [`FeatureSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    /// Source field.
    pub field: VenueField,
    /// Treatment applied to the field.
    pub treatment: FieldTreatment,
}

impl FieldDescriptor {
    /// Pair a field with its treatment.
    pub const fn new(field: VenueField, treatment: FieldTreatment) -> Self {
        Self { field, treatment }
    }
}

/// Errors returned by [`FeatureSchema::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A field appeared more than once.
    #[error("field {field} is listed more than once")]
    DuplicateField {
        /// Repeated field.
        field: VenueField,
    },
    /// A non-continuous field was marked for normalisation.
    #[error("field {field} is not continuous and cannot be normalised")]
    NotNormalisable {
        /// Offending field.
        field: VenueField,
    },
    /// A non-numeric field was marked as a feature.
    #[error("field {field} is not numeric and must be excluded")]
    NotNumeric {
        /// Offending field.
        field: VenueField,
    },
    /// Every field was excluded.
    #[error("schema must contain at least one feature column")]
    NoColumns,
}

/// Ordered field descriptors plus a version tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    version: u32,
    fields: Vec<FieldDescriptor>,
}

impl FeatureSchema {
    /// Version tag of [`FeatureSchema::reference`].
    pub const REFERENCE_VERSION: u32 = 1;

    /// Validate and construct a schema.
    ///
    /// # Errors
    /// Returns [`SchemaError`] when a field repeats, a treatment does not suit
    /// its field, or no feature column remains.
    pub fn new(version: u32, fields: Vec<FieldDescriptor>) -> Result<Self, SchemaError> {
        let mut seen = BTreeSet::new();
        for descriptor in &fields {
            if !seen.insert(descriptor.field) {
                return Err(SchemaError::DuplicateField {
                    field: descriptor.field,
                });
            }
            validate_treatment(*descriptor)?;
        }
        if !fields
            .iter()
            .any(|d| d.treatment != FieldTreatment::Excluded)
        {
            return Err(SchemaError::NoColumns);
        }
        Ok(Self { version, fields })
    }

    /// The reference layout: both continuous fields normalised, the price
    /// tier and every flag passed through, identity, tags and hours excluded.
    pub fn reference() -> Self {
        let mut fields = vec![
            FieldDescriptor::new(VenueField::AverageRating, FieldTreatment::Normalised),
            FieldDescriptor::new(VenueField::ReviewCount, FieldTreatment::Normalised),
            FieldDescriptor::new(VenueField::PriceTier, FieldTreatment::Passthrough),
        ];
        fields.extend(
            AttributeFlag::ALL
                .into_iter()
                .map(|flag| FieldDescriptor::new(VenueField::Flag(flag), FieldTreatment::Passthrough)),
        );
        fields.extend(
            [
                VenueField::Name,
                VenueField::City,
                VenueField::Cuisines,
                VenueField::Ambiences,
                VenueField::OpeningHours,
            ]
            .into_iter()
            .map(|field| FieldDescriptor::new(field, FieldTreatment::Excluded)),
        );
        Self {
            version: Self::REFERENCE_VERSION,
            fields,
        }
    }

    /// Schema version tag.
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Every descriptor, excluded ones included.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Descriptors that produce a feature column, in column order.
    pub fn columns(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.fields
            .iter()
            .filter(|d| d.treatment != FieldTreatment::Excluded)
    }

    /// Width of a feature vector under this schema.
    pub fn dimension(&self) -> usize {
        self.columns().count()
    }

    /// Column names in order, for diagnostics.
    pub fn column_names(&self) -> Vec<String> {
        self.columns().map(|d| d.field.to_string()).collect()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::reference()
    }
}

const fn validate_treatment(descriptor: FieldDescriptor) -> Result<(), SchemaError> {
    let field = descriptor.field;
    match descriptor.treatment {
        FieldTreatment::Excluded => Ok(()),
        FieldTreatment::Normalised if !field.is_continuous() => {
            Err(SchemaError::NotNormalisable { field })
        }
        FieldTreatment::Normalised | FieldTreatment::Passthrough if !field.is_numeric() => {
            Err(SchemaError::NotNumeric { field })
        }
        FieldTreatment::Normalised | FieldTreatment::Passthrough => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VenueId;
    use rstest::rstest;

    #[rstest]
    fn reference_orders_continuous_fields_first() {
        let names = FeatureSchema::reference().column_names();
        assert_eq!(names.first().map(String::as_str), Some("average_rating"));
        assert_eq!(names.get(1).map(String::as_str), Some("review_count"));
        assert_eq!(names.get(2).map(String::as_str), Some("price_tier"));
        assert_eq!(names.last().map(String::as_str), Some("parking"));
    }

    #[rstest]
    fn reference_excludes_identity_tags_and_hours() {
        let schema = FeatureSchema::reference();
        assert!(schema.columns().all(|d| !matches!(
            d.field,
            VenueField::Name | VenueField::City | VenueField::OpeningHours
        )));
        assert!(schema.fields().contains(&FieldDescriptor::new(
            VenueField::OpeningHours,
            FieldTreatment::Excluded
        )));
        assert_eq!(schema.dimension(), 3 + AttributeFlag::ALL.len());
    }

    #[rstest]
    fn duplicate_fields_are_rejected() {
        let descriptor = FieldDescriptor::new(VenueField::ReviewCount, FieldTreatment::Normalised);
        assert_eq!(
            FeatureSchema::new(2, vec![descriptor, descriptor]),
            Err(SchemaError::DuplicateField {
                field: VenueField::ReviewCount
            })
        );
    }

    #[rstest]
    #[case(VenueField::PriceTier, FieldTreatment::Normalised, SchemaError::NotNormalisable { field: VenueField::PriceTier })]
    #[case(VenueField::Name, FieldTreatment::Passthrough, SchemaError::NotNumeric { field: VenueField::Name })]
    #[case(VenueField::Cuisines, FieldTreatment::Normalised, SchemaError::NotNormalisable { field: VenueField::Cuisines })]
    #[case(VenueField::OpeningHours, FieldTreatment::Passthrough, SchemaError::NotNumeric { field: VenueField::OpeningHours })]
    fn unsuitable_treatments_are_rejected(
        #[case] field: VenueField,
        #[case] treatment: FieldTreatment,
        #[case] expected: SchemaError,
    ) {
        let err = FeatureSchema::new(2, vec![FieldDescriptor::new(field, treatment)]).unwrap_err();
        assert_eq!(err, expected);
    }

    #[rstest]
    fn all_excluded_is_rejected() {
        let fields = vec![FieldDescriptor::new(VenueField::Name, FieldTreatment::Excluded)];
        assert_eq!(FeatureSchema::new(2, fields), Err(SchemaError::NoColumns));
    }

    #[rstest]
    fn raw_values_encode_flags_as_unit() {
        let venue = VenueRecord::new(VenueId::new("v").unwrap(), 4.0, 12)
            .with_flag(AttributeFlag::Delivery, true)
            .with_flag(AttributeFlag::Alcohol, false);
        assert_eq!(
            VenueField::Flag(AttributeFlag::Delivery).raw_value(&venue),
            Some(1.0)
        );
        assert_eq!(
            VenueField::Flag(AttributeFlag::Alcohol).raw_value(&venue),
            Some(0.0)
        );
        assert_eq!(VenueField::Flag(AttributeFlag::Parking).raw_value(&venue), None);
        assert_eq!(VenueField::PriceTier.raw_value(&venue), None);
        assert_eq!(VenueField::ReviewCount.raw_value(&venue), Some(12.0));
    }
}
