//! Series records and typed metadata values
//!
//! A [`SeriesRecord`] is immutable once constructed: edits always produce a
//! new record, and the revision overlays are pure copy-with-override
//! functions. The core never sees wire JSON; metadata values are the tagged
//! [`MetaValue`] union, decoded once at the adapter boundary.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Metadata key holding the primary series name.
pub const KEY_PRIMARY_NAME: &str = "PrimName";
/// Metadata key holding the human-readable description (search field).
pub const KEY_DESCRIPTION: &str = "Description";
/// Metadata key stamped by the store on every successful create/replace.
pub const KEY_LAST_MODIFIED: &str = "LastModifiedTimeStamp";
/// Metadata key tagging how a revision-tracked snapshot was selected.
pub const KEY_REVISION_TYPE: &str = "RevisionSeriesType";
/// Metadata key holding the timestamp of the selected vintage.
pub const KEY_VINTAGE_TIMESTAMP: &str = "VintageTimeStamp";
/// Metadata key holding the requested release index.
pub const KEY_NTH_RELEASE: &str = "NthRelease";

/// Revision type tag for the current snapshot of a tracked series.
pub const REVISION_TYPE_CURRENT: &str = "current";
/// Revision type tag for a point-in-time vintage snapshot.
pub const REVISION_TYPE_VINTAGE: &str = "vintage";
/// Revision type tag for an n-th release snapshot.
pub const REVISION_TYPE_NTH: &str = "nth";

/// Typed metadata value.
///
/// One explicit kind per wire shape; conversion from JSON happens in the
/// adapter codec, never here.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    StrList(Vec<String>),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            MetaValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

}

/// Metadata map: string key to typed value, keys unique, iteration stable.
pub type Metadata = BTreeMap<String, MetaValue>;

/// One time series: metadata, values, optional dates, optional per-value
/// metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRecord {
    pub metadata: Metadata,
    /// Observations; NaN marks a missing value.
    pub values: Vec<f64>,
    /// Calendar dates, index-aligned with `values` when present.
    pub dates: Option<Vec<NaiveDate>>,
    /// Per-point metadata, index-aligned with `values` when present.
    pub per_value_metadata: Option<Vec<Option<Metadata>>>,
}

impl SeriesRecord {
    pub fn new(metadata: Metadata, values: Vec<f64>) -> Self {
        Self {
            metadata,
            values,
            dates: None,
            per_value_metadata: None,
        }
    }

    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Self {
        self.dates = Some(dates);
        self
    }

    pub fn with_per_value_metadata(mut self, pvm: Vec<Option<Metadata>>) -> Self {
        self.per_value_metadata = Some(pvm);
        self
    }

    /// Checks the structural invariants: a primary name is present and the
    /// optional parallel sequences are index-aligned with `values`.
    pub fn validate(&self) -> Result<()> {
        match self.metadata.get(KEY_PRIMARY_NAME) {
            Some(MetaValue::Str(name)) if !name.is_empty() => {}
            _ => return Err(Error::MissingPrimaryName),
        }
        if let Some(dates) = &self.dates {
            if dates.len() != self.values.len() {
                return Err(Error::InvalidRecord(format!(
                    "{} dates for {} values",
                    dates.len(),
                    self.values.len()
                )));
            }
        }
        if let Some(pvm) = &self.per_value_metadata {
            if pvm.len() != self.values.len() {
                return Err(Error::InvalidRecord(format!(
                    "{} per-value metadata entries for {} values",
                    pvm.len(),
                    self.values.len()
                )));
            }
        }
        Ok(())
    }

    pub fn primary_name(&self) -> Option<&str> {
        self.metadata.get(KEY_PRIMARY_NAME).and_then(MetaValue::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.metadata.get(KEY_DESCRIPTION).and_then(MetaValue::as_str)
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.metadata
            .get(KEY_LAST_MODIFIED)
            .and_then(MetaValue::as_timestamp)
    }

    /// Returns a new record with `overlay` written over this record's
    /// metadata (overlay wins on key collisions). The receiver is untouched.
    pub fn with_overlay(&self, overlay: Metadata) -> SeriesRecord {
        let mut merged = self.metadata.clone();
        merged.extend(overlay);
        SeriesRecord {
            metadata: merged,
            values: self.values.clone(),
            dates: self.dates.clone(),
            per_value_metadata: self.per_value_metadata.clone(),
        }
    }

    /// Returns a new record with `base` merged beneath this record's
    /// metadata (this record's keys win on collisions).
    pub fn merged_under(&self, base: &Metadata) -> SeriesRecord {
        let mut merged = base.clone();
        merged.extend(self.metadata.clone());
        SeriesRecord {
            metadata: merged,
            values: self.values.clone(),
            dates: self.dates.clone(),
            per_value_metadata: self.per_value_metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Metadata {
        let mut meta = Metadata::new();
        meta.insert(
            KEY_PRIMARY_NAME.to_string(),
            MetaValue::Str(name.to_string()),
        );
        meta
    }

    #[test]
    fn test_validate_requires_primary_name() {
        let record = SeriesRecord::new(Metadata::new(), vec![1.0]);
        assert!(matches!(
            record.validate(),
            Err(Error::MissingPrimaryName)
        ));
    }

    #[test]
    fn test_validate_rejects_date_length_mismatch() {
        let record = SeriesRecord::new(named("s1"), vec![1.0, 2.0])
            .with_dates(vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()]);
        assert!(matches!(record.validate(), Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn test_validate_rejects_per_value_metadata_mismatch() {
        let record =
            SeriesRecord::new(named("s1"), vec![1.0, 2.0]).with_per_value_metadata(vec![None]);
        assert!(matches!(record.validate(), Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn test_overlay_wins_on_collision() {
        let mut meta = named("s1");
        meta.insert(
            KEY_DESCRIPTION.to_string(),
            MetaValue::Str("old".to_string()),
        );
        let record = SeriesRecord::new(meta, vec![1.0]);

        let mut overlay = Metadata::new();
        overlay.insert(
            KEY_DESCRIPTION.to_string(),
            MetaValue::Str("new".to_string()),
        );
        let overlaid = record.with_overlay(overlay);

        assert_eq!(overlaid.description(), Some("new"));
        // original untouched
        assert_eq!(record.description(), Some("old"));
    }

    #[test]
    fn test_merged_under_keeps_own_keys() {
        let mut meta = named("s1");
        meta.insert(
            KEY_DESCRIPTION.to_string(),
            MetaValue::Str("own".to_string()),
        );
        let record = SeriesRecord::new(meta, vec![1.0]);

        let mut base = Metadata::new();
        base.insert(
            KEY_DESCRIPTION.to_string(),
            MetaValue::Str("shared".to_string()),
        );
        base.insert("Region".to_string(), MetaValue::Str("pl".to_string()));
        let merged = record.merged_under(&base);

        assert_eq!(merged.description(), Some("own"));
        assert_eq!(
            merged.metadata.get("Region"),
            Some(&MetaValue::Str("pl".to_string()))
        );
    }
}
