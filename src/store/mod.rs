//! In-memory series store with revision/vintage semantics
//!
//! The store owns every piece of mutable state: current records, revision
//! ledgers, the browse tree, and the listing tables. All of it sits behind
//! one exclusive lock; every operation (including multi-name reads such as
//! listing resolution) runs inside a single critical section so a traversal
//! never observes the store mutated midway. Contention is short-lived
//! because critical sections are pure in-memory computation.

pub mod browse;
pub mod revision;
pub mod seed;

use crate::capabilities::Capabilities;
use crate::clock::StampClock;
use crate::model::{MetaValue, Metadata, SeriesRecord, KEY_LAST_MODIFIED};
use crate::{Error, Result};
use browse::{Listing, ListingGroup, ListingRow, ResolvedGroup, ResolvedListing, ResolvedRow, TreeNode};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use revision::{RevisionLedger, VintageStamp};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Error string reported inside a batch for a name that does not resolve.
pub const ERR_SERIES_NOT_FOUND: &str = "Series could not be found!";

/// Listing reference that newly created series are registered into so they
/// become browsable.
pub const CATCH_ALL_REFERENCE: &str = "uncategorized";

const CATCH_ALL_GROUP: &str = "Uncategorized";

/// Per-item outcome inside a batch load: a payload or an error string,
/// never both. A bad name never fails the whole batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchItem<T> {
    Payload(T),
    Error(String),
}

impl<T> BatchItem<T> {
    pub fn payload(&self) -> Option<&T> {
        match self {
            BatchItem::Payload(p) => Some(p),
            BatchItem::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            BatchItem::Payload(_) => None,
            BatchItem::Error(e) => Some(e),
        }
    }
}

#[derive(Default)]
struct Inner {
    /// Current record per series, keyed by lowercased primary name.
    records: BTreeMap<String, SeriesRecord>,
    /// Revision ledgers, keyed by lowercased primary name. A name lives in
    /// exactly one of the two maps.
    ledgers: BTreeMap<String, RevisionLedger>,
    /// Root of the browse tree.
    root: Vec<TreeNode>,
    /// Node-reference table for children references.
    node_refs: BTreeMap<String, Vec<TreeNode>>,
    /// Listing table for series references.
    listings: BTreeMap<String, Listing>,
}

impl Inner {
    /// Revision-aware lookup: tracked names resolve to the current vintage
    /// snapshot, plain names to their stored record.
    fn resolve(&self, name: &str) -> Option<SeriesRecord> {
        let key = name.to_lowercase();
        if let Some(ledger) = self.ledgers.get(&key) {
            return Some(ledger.current());
        }
        self.records.get(&key).cloned()
    }

    fn register_in_catch_all(&mut self, name: &str) {
        let listing = self
            .listings
            .entry(CATCH_ALL_REFERENCE.to_string())
            .or_default();
        if listing.groups.is_empty() {
            listing.groups.push(ListingGroup::new(CATCH_ALL_GROUP, vec![]));
        }
        listing.groups[0].rows.push(ListingRow::new(&[name]));
    }
}

/// The provider's process-wide state, constructed once at startup and
/// passed by handle to every request handler.
pub struct SeriesStore {
    clock: StampClock,
    inner: Mutex<Inner>,
}

impl SeriesStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            clock: StampClock::new(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Creates a store populated with the demo dataset.
    pub fn seeded() -> Result<Self> {
        let store = Self::new();
        seed::populate(&store)?;
        Ok(store)
    }

    /// Static capability flags for session negotiation.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    // ------------------------------------------------------------------
    // Seeding hooks. Ledger population is read-only at request time, so
    // these run at startup (and in tests) only.
    // ------------------------------------------------------------------

    /// Inserts a record directly, stamping its last-modified timestamp but
    /// skipping catch-all registration. Seed data lands in its curated
    /// listings instead.
    pub fn register_series(&self, mut record: SeriesRecord) -> Result<DateTime<Utc>> {
        record.validate()?;
        let name = record
            .primary_name()
            .ok_or(Error::MissingPrimaryName)?
            .to_string();
        let stamp = self.clock.now();
        record
            .metadata
            .insert(KEY_LAST_MODIFIED.to_string(), MetaValue::Timestamp(stamp));
        let mut inner = self.inner.lock();
        inner.records.insert(name.to_lowercase(), record);
        Ok(stamp)
    }

    pub fn register_ledger(&self, name: &str, ledger: RevisionLedger) {
        let mut inner = self.inner.lock();
        inner.ledgers.insert(name.to_lowercase(), ledger);
    }

    pub fn set_browse_root(&self, nodes: Vec<TreeNode>) {
        self.inner.lock().root = nodes;
    }

    pub fn register_node_ref(&self, reference: &str, nodes: Vec<TreeNode>) {
        self.inner
            .lock()
            .node_refs
            .insert(reference.to_string(), nodes);
    }

    pub fn register_listing(&self, reference: &str, listing: Listing) {
        self.inner
            .lock()
            .listings
            .insert(reference.to_string(), listing);
    }

    // ------------------------------------------------------------------
    // Series operations
    // ------------------------------------------------------------------

    /// Case-insensitive exact-match lookup. Revision-tracked names resolve
    /// to their current vintage snapshot with ledger metadata merged in.
    pub fn get(&self, name: &str) -> Result<SeriesRecord> {
        let inner = self.inner.lock();
        inner
            .resolve(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Batch metadata-only load; per-item soft failures.
    pub fn load_meta(&self, names: &[String]) -> Vec<BatchItem<Metadata>> {
        let inner = self.inner.lock();
        names
            .iter()
            .map(|name| match inner.resolve(name) {
                Some(record) => BatchItem::Payload(record.metadata),
                None => BatchItem::Error(ERR_SERIES_NOT_FOUND.to_string()),
            })
            .collect()
    }

    /// Batch full-series load; per-item soft failures.
    pub fn load_series(&self, names: &[String]) -> Vec<BatchItem<SeriesRecord>> {
        let inner = self.inner.lock();
        names
            .iter()
            .map(|name| match inner.resolve(name) {
                Some(record) => BatchItem::Payload(record),
                None => BatchItem::Error(ERR_SERIES_NOT_FOUND.to_string()),
            })
            .collect()
    }

    /// Insert-or-replace with optimistic concurrency.
    ///
    /// The caller presents the last-modified timestamp it last observed;
    /// a diverging write wins only when `force` is set, otherwise
    /// contention is rejected, never merged. On success the new stamp is
    /// returned, strictly greater than any stamp issued before.
    pub fn create_or_replace(
        &self,
        mut record: SeriesRecord,
        expected_last_modified: Option<DateTime<Utc>>,
        force: bool,
    ) -> Result<DateTime<Utc>> {
        record.validate()?;
        let name = record
            .primary_name()
            .ok_or(Error::MissingPrimaryName)?
            .to_string();
        let key = name.to_lowercase();

        let mut inner = self.inner.lock();
        if inner.ledgers.contains_key(&key) {
            return Err(Error::RevisionReadOnly(name));
        }

        let stamp = self.clock.now();
        record
            .metadata
            .insert(KEY_LAST_MODIFIED.to_string(), MetaValue::Timestamp(stamp));

        match inner.records.get(&key).map(|existing| existing.last_modified()) {
            None => {
                inner.records.insert(key, record);
                inner.register_in_catch_all(&name);
                info!(series = %name, "created series");
                Ok(stamp)
            }
            Some(stored) => {
                let stored = stored.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
                if force {
                    inner.records.insert(key, record);
                    info!(series = %name, forced = true, "replaced series");
                    return Ok(stamp);
                }
                match expected_last_modified {
                    None => Err(Error::AlreadyExists(name)),
                    Some(expected) if expected == stored => {
                        inner.records.insert(key, record);
                        info!(series = %name, "replaced series");
                        Ok(stamp)
                    }
                    Some(expected) => Err(Error::LastModifiedMismatch {
                        expected,
                        actual: stored,
                    }),
                }
            }
        }
    }

    /// Removes a series and prunes it from every listing row. A row left
    /// with no names is dropped from its group; an emptied group stays in
    /// place.
    pub fn delete(&self, name: &str) -> Result<()> {
        let key = name.to_lowercase();
        let mut inner = self.inner.lock();
        if inner.ledgers.contains_key(&key) {
            return Err(Error::RevisionReadOnly(name.to_string()));
        }
        if inner.records.remove(&key).is_none() {
            return Err(Error::NotFound(name.to_string()));
        }
        for listing in inner.listings.values_mut() {
            for group in &mut listing.groups {
                for row in &mut group.rows {
                    // same canonicalization as the record keys
                    row.names.retain(|n| n.to_lowercase() != key);
                }
                group.rows.retain(|row| !row.names.is_empty());
            }
        }
        info!(series = %name, "deleted series");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Revision operations (read-only)
    // ------------------------------------------------------------------

    /// Snapshot as known at `timestamp`; requests earlier than the first
    /// vintage fall back to the first vintage.
    pub fn load_at_vintage(&self, name: &str, timestamp: DateTime<Utc>) -> Result<SeriesRecord> {
        let inner = self.inner.lock();
        inner
            .ledgers
            .get(&name.to_lowercase())
            .map(|ledger| ledger.at_vintage(timestamp))
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Ordered (timestamp, label) pairs for every recorded vintage.
    pub fn load_vintage_timestamps(&self, name: &str) -> Result<Vec<VintageStamp>> {
        let inner = self.inner.lock();
        inner
            .ledgers
            .get(&name.to_lowercase())
            .map(|ledger| ledger.vintage_stamps())
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// The n-th release; out-of-range indexes clamp to the last release.
    pub fn load_release(&self, name: &str, nth: usize) -> Result<SeriesRecord> {
        let inner = self.inner.lock();
        inner
            .ledgers
            .get(&name.to_lowercase())
            .map(|ledger| ledger.release(nth))
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// One snapshot per vintage, keyed by vintage timestamp.
    pub fn load_complete_history(
        &self,
        name: &str,
    ) -> Result<BTreeMap<DateTime<Utc>, SeriesRecord>> {
        let inner = self.inner.lock();
        inner
            .ledgers
            .get(&name.to_lowercase())
            .map(|ledger| ledger.complete_history())
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    // ------------------------------------------------------------------
    // Browse / listing / search
    // ------------------------------------------------------------------

    /// Root node list for an absent/empty reference, otherwise an exact-key
    /// lookup in the node-reference table.
    pub fn load_tree(&self, reference: Option<&str>) -> Result<Vec<TreeNode>> {
        let inner = self.inner.lock();
        match reference.filter(|r| !r.is_empty()) {
            None => Ok(inner.root.clone()),
            Some(key) => inner
                .node_refs
                .get(key)
                .cloned()
                .ok_or_else(|| Error::NotFound(key.to_string())),
        }
    }

    /// Resolves a listing reference: every row's names are looked up under
    /// the same lock and attached as index-aligned entity metadata. Missing
    /// names become `None` slots; a listing never fails because one
    /// constituent series is gone.
    pub fn list_series(&self, reference: &str) -> Result<ResolvedListing> {
        let inner = self.inner.lock();
        let listing = inner
            .listings
            .get(reference)
            .ok_or_else(|| Error::NotFound(reference.to_string()))?;

        let groups = listing
            .groups
            .iter()
            .map(|group| ResolvedGroup {
                name: group.name.clone(),
                rows: group
                    .rows
                    .iter()
                    .map(|row| ResolvedRow {
                        indentation: row.indentation,
                        emphasis: row.emphasis,
                        space_above: row.space_above,
                        names: row.names.clone(),
                        entities: row
                            .names
                            .iter()
                            .map(|name| inner.resolve(name).map(|record| record.metadata))
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Ok(ResolvedListing {
            aspects: listing.aspects.clone(),
            groups,
        })
    }

    /// Case-insensitive substring match of `query` against the description
    /// field, over both plain and revision-tracked series. Zero matches
    /// report `NotFound`.
    pub fn search(&self, query: &str) -> Result<Vec<Metadata>> {
        let needle = query.to_lowercase();
        let inner = self.inner.lock();

        let mut hits: Vec<Metadata> = Vec::new();
        for record in inner.records.values() {
            if matches_description(record, &needle) {
                hits.push(record.metadata.clone());
            }
        }
        for ledger in inner.ledgers.values() {
            let current = ledger.current();
            if matches_description(&current, &needle) {
                hits.push(current.metadata);
            }
        }

        debug!(query = %query, hits = hits.len(), "search");
        if hits.is_empty() {
            Err(Error::NotFound(query.to_string()))
        } else {
            Ok(hits)
        }
    }
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_description(record: &SeriesRecord, lowercase_needle: &str) -> bool {
    record
        .description()
        .is_some_and(|d| d.to_lowercase().contains(lowercase_needle))
}
