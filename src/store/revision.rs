//! Revision ledger: vintages and releases
//!
//! A revision-tracked series keeps two independent views over the same
//! history. Vintages answer "what did we know as of calendar time T";
//! releases answer "what was the k-th published update regardless of when
//! it landed". Client tooling tells the two apart by the explicit type tag
//! overlaid on the snapshot metadata, not by shape, so both views are
//! preserved verbatim.

use crate::model::{
    MetaValue, Metadata, SeriesRecord, KEY_NTH_RELEASE, KEY_REVISION_TYPE, KEY_VINTAGE_TIMESTAMP,
    REVISION_TYPE_CURRENT, REVISION_TYPE_NTH, REVISION_TYPE_VINTAGE,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// One full snapshot as it was known as of `timestamp`.
#[derive(Debug, Clone)]
pub struct Vintage {
    pub timestamp: DateTime<Utc>,
    pub label: Option<String>,
    pub record: SeriesRecord,
}

impl Vintage {
    pub fn new(timestamp: DateTime<Utc>, label: Option<&str>, record: SeriesRecord) -> Self {
        Self {
            timestamp,
            label: label.map(str::to_string),
            record,
        }
    }
}

/// A vintage's timestamp and display label, as listed to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VintageStamp {
    pub timestamp: DateTime<Utc>,
    pub label: Option<String>,
}

/// Revision history for one series.
///
/// Read-only after construction; ledgers are seeded at startup.
#[derive(Debug, Clone)]
pub struct RevisionLedger {
    /// Base metadata shared by every snapshot. Per-vintage record metadata
    /// wins on key collisions.
    metadata: Metadata,
    /// Ordered by strictly increasing timestamp.
    vintages: Vec<Vintage>,
    /// Ordered by release number; indexing independent of vintages.
    releases: Vec<SeriesRecord>,
}

impl RevisionLedger {
    /// Builds a ledger, checking the structural invariants: both sequences
    /// non-empty and vintage timestamps strictly increasing. Duplicate
    /// timestamps are rejected because the complete-history view keys one
    /// snapshot per timestamp.
    pub fn new(
        metadata: Metadata,
        vintages: Vec<Vintage>,
        releases: Vec<SeriesRecord>,
    ) -> Result<Self> {
        if vintages.is_empty() {
            return Err(Error::InvalidRecord(
                "revision ledger needs at least one vintage".to_string(),
            ));
        }
        if releases.is_empty() {
            return Err(Error::InvalidRecord(
                "revision ledger needs at least one release".to_string(),
            ));
        }
        for pair in vintages.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(Error::InvalidRecord(format!(
                    "vintage timestamps must be strictly increasing: {} after {}",
                    pair[1].timestamp, pair[0].timestamp
                )));
            }
        }
        Ok(Self {
            metadata,
            vintages,
            releases,
        })
    }

    /// The latest vintage's timestamp.
    pub fn latest_timestamp(&self) -> DateTime<Utc> {
        // non-empty by construction
        self.vintages[self.vintages.len() - 1].timestamp
    }

    /// Current snapshot: the latest vintage, tagged as `current`.
    pub fn current(&self) -> SeriesRecord {
        let latest = &self.vintages[self.vintages.len() - 1];
        self.snapshot(&latest.record, REVISION_TYPE_CURRENT, latest.timestamp)
    }

    /// Point-in-time snapshot: the latest vintage whose timestamp is at or
    /// before `at`. A request earlier than the first vintage falls back to
    /// the first vintage instead of failing.
    pub fn at_vintage(&self, at: DateTime<Utc>) -> SeriesRecord {
        let chosen = self
            .vintages
            .iter()
            .rev()
            .find(|v| v.timestamp <= at)
            .unwrap_or(&self.vintages[0]);
        self.snapshot(&chosen.record, REVISION_TYPE_VINTAGE, chosen.timestamp)
    }

    /// Timestamps and labels of every vintage, in order.
    pub fn vintage_stamps(&self) -> Vec<VintageStamp> {
        self.vintages
            .iter()
            .map(|v| VintageStamp {
                timestamp: v.timestamp,
                label: v.label.clone(),
            })
            .collect()
    }

    /// The n-th release snapshot, tagged `nth` with the requested index.
    ///
    /// Out-of-range high indexes clamp to the last release rather than
    /// erroring.
    pub fn release(&self, nth: usize) -> SeriesRecord {
        let clamped = nth.min(self.releases.len() - 1);
        let mut record = self.releases[clamped].merged_under(&self.metadata);
        record.metadata.insert(
            KEY_REVISION_TYPE.to_string(),
            MetaValue::Str(REVISION_TYPE_NTH.to_string()),
        );
        record
            .metadata
            .insert(KEY_NTH_RELEASE.to_string(), MetaValue::Int(nth as i64));
        record
    }

    /// One snapshot per vintage, keyed by the vintage's timestamp.
    pub fn complete_history(&self) -> BTreeMap<DateTime<Utc>, SeriesRecord> {
        self.vintages
            .iter()
            .map(|v| {
                (
                    v.timestamp,
                    self.snapshot(&v.record, REVISION_TYPE_VINTAGE, v.timestamp),
                )
            })
            .collect()
    }

    fn snapshot(
        &self,
        record: &SeriesRecord,
        revision_type: &str,
        timestamp: DateTime<Utc>,
    ) -> SeriesRecord {
        let mut tags = Metadata::new();
        tags.insert(
            KEY_REVISION_TYPE.to_string(),
            MetaValue::Str(revision_type.to_string()),
        );
        tags.insert(
            KEY_VINTAGE_TIMESTAMP.to_string(),
            MetaValue::Timestamp(timestamp),
        );
        record.merged_under(&self.metadata).with_overlay(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KEY_PRIMARY_NAME;
    use chrono::TimeZone;

    fn record(value: f64) -> SeriesRecord {
        let mut meta = Metadata::new();
        meta.insert(
            KEY_PRIMARY_NAME.to_string(),
            MetaValue::Str("rev1".to_string()),
        );
        SeriesRecord::new(meta, vec![value])
    }

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    fn ledger() -> RevisionLedger {
        RevisionLedger::new(
            Metadata::new(),
            vec![
                Vintage::new(ts(1), Some("first estimate"), record(1.0)),
                Vintage::new(ts(10), None, record(2.0)),
                Vintage::new(ts(20), Some("final"), record(3.0)),
            ],
            vec![record(1.0), record(3.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_vintages_rejected() {
        let result = RevisionLedger::new(Metadata::new(), vec![], vec![record(1.0)]);
        assert!(matches!(result, Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn test_out_of_order_vintages_rejected() {
        let result = RevisionLedger::new(
            Metadata::new(),
            vec![
                Vintage::new(ts(10), None, record(1.0)),
                Vintage::new(ts(1), None, record(2.0)),
            ],
            vec![record(1.0)],
        );
        assert!(matches!(result, Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn test_duplicate_vintage_timestamps_rejected() {
        // a duplicate would collapse to one complete-history entry
        let result = RevisionLedger::new(
            Metadata::new(),
            vec![
                Vintage::new(ts(5), None, record(1.0)),
                Vintage::new(ts(5), None, record(2.0)),
            ],
            vec![record(1.0)],
        );
        assert!(matches!(result, Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn test_at_vintage_picks_latest_at_or_before() {
        let snap = ledger().at_vintage(ts(15));
        assert_eq!(snap.values, vec![2.0]);
        assert_eq!(
            snap.metadata.get(KEY_VINTAGE_TIMESTAMP),
            Some(&MetaValue::Timestamp(ts(10)))
        );
    }

    #[test]
    fn test_at_vintage_falls_back_to_first() {
        let before_all = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let snap = ledger().at_vintage(before_all);
        assert_eq!(snap.values, vec![1.0]);
        assert_eq!(
            snap.metadata.get(KEY_VINTAGE_TIMESTAMP),
            Some(&MetaValue::Timestamp(ts(1)))
        );
    }

    #[test]
    fn test_release_clamps_high_index() {
        let snap = ledger().release(99);
        assert_eq!(snap.values, vec![3.0]);
        // The tag records the requested index, not the clamped one.
        assert_eq!(
            snap.metadata.get(KEY_NTH_RELEASE),
            Some(&MetaValue::Int(99))
        );
    }

    #[test]
    fn test_release_in_range() {
        let snap = ledger().release(0);
        assert_eq!(snap.values, vec![1.0]);
        assert_eq!(
            snap.metadata.get(KEY_REVISION_TYPE),
            Some(&MetaValue::Str(REVISION_TYPE_NTH.to_string()))
        );
    }

    #[test]
    fn test_complete_history_one_entry_per_vintage() {
        let history = ledger().complete_history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[&ts(1)].values, vec![1.0]);
        assert_eq!(history[&ts(20)].values, vec![3.0]);
    }

    #[test]
    fn test_vintage_metadata_precedence_over_shared() {
        let mut shared = Metadata::new();
        shared.insert(
            "Description".to_string(),
            MetaValue::Str("shared".to_string()),
        );

        let mut own = record(5.0);
        own.metadata.insert(
            "Description".to_string(),
            MetaValue::Str("override".to_string()),
        );

        let ledger = RevisionLedger::new(
            shared,
            vec![
                Vintage::new(ts(1), None, record(1.0)),
                Vintage::new(ts(2), None, own),
            ],
            vec![record(1.0)],
        )
        .unwrap();

        let history = ledger.complete_history();
        assert_eq!(
            history[&ts(1)].metadata.get("Description"),
            Some(&MetaValue::Str("shared".to_string()))
        );
        assert_eq!(
            history[&ts(2)].metadata.get("Description"),
            Some(&MetaValue::Str("override".to_string()))
        );
    }
}
