//! Integration tests for the series store: optimistic concurrency,
//! case-insensitive lookup, and delete pruning.

use vintagedb::model::{MetaValue, Metadata, SeriesRecord, KEY_DESCRIPTION, KEY_PRIMARY_NAME};
use vintagedb::store::{SeriesStore, CATCH_ALL_REFERENCE};
use vintagedb::Error;

/// Helper to build a candidate record
fn candidate(name: &str, description: &str) -> SeriesRecord {
    let mut meta = Metadata::new();
    meta.insert(
        KEY_PRIMARY_NAME.to_string(),
        MetaValue::Str(name.to_string()),
    );
    meta.insert(
        KEY_DESCRIPTION.to_string(),
        MetaValue::Str(description.to_string()),
    );
    SeriesRecord::new(meta, vec![1.0, 2.0, 3.0])
}

#[test]
fn test_optimistic_concurrency_cycle() {
    let store = SeriesStore::new();

    let t0 = store
        .create_or_replace(candidate("s1", "first"), None, false)
        .unwrap();

    // Presenting the observed timestamp succeeds and yields a newer stamp
    let t1 = store
        .create_or_replace(candidate("s1", "second"), Some(t0), false)
        .unwrap();
    assert!(t1 > t0, "replace must yield a strictly newer timestamp");

    // Replaying the stale timestamp is rejected
    let result = store.create_or_replace(candidate("s1", "third"), Some(t0), false);
    match result.unwrap_err() {
        Error::LastModifiedMismatch { expected, actual } => {
            assert_eq!(expected, t0);
            assert_eq!(actual, t1);
        }
        e => panic!("Expected LastModifiedMismatch, got: {:?}", e),
    }

    // Force always wins, no timestamp needed
    let t2 = store
        .create_or_replace(candidate("s1", "forced"), None, true)
        .unwrap();
    assert!(t2 > t1);
    assert_eq!(store.get("s1").unwrap().description(), Some("forced"));
}

#[test]
fn test_create_without_expected_conflicts_on_existing() {
    let store = SeriesStore::new();
    store
        .create_or_replace(candidate("s1", "first"), None, false)
        .unwrap();

    let result = store.create_or_replace(candidate("s1", "second"), None, false);
    assert!(matches!(result, Err(Error::AlreadyExists(_))));
    assert_eq!(store.get("s1").unwrap().description(), Some("first"));
}

#[test]
fn test_create_stamps_last_modified() {
    let store = SeriesStore::new();
    let stamp = store
        .create_or_replace(candidate("s1", "first"), None, false)
        .unwrap();
    assert_eq!(store.get("s1").unwrap().last_modified(), Some(stamp));
}

#[test]
fn test_created_series_lands_in_catch_all_listing() {
    let store = SeriesStore::new();
    store
        .create_or_replace(candidate("fresh0001", "fresh"), None, false)
        .unwrap();

    let listing = store.list_series(CATCH_ALL_REFERENCE).unwrap();
    assert_eq!(listing.groups.len(), 1);
    assert_eq!(listing.groups[0].rows.len(), 1);
    assert_eq!(listing.groups[0].rows[0].names, vec!["fresh0001"]);
    assert!(listing.groups[0].rows[0].entities[0].is_some());
}

#[test]
fn test_get_is_case_insensitive() {
    let store = SeriesStore::new();
    store
        .create_or_replace(candidate("MySeries", "cased"), None, false)
        .unwrap();

    let record = store.get("mySERIES").unwrap();
    // The stored record keeps the original spelling
    assert_eq!(record.primary_name(), Some("MySeries"));
}

#[test]
fn test_get_unknown_name_not_found() {
    let store = SeriesStore::new();
    assert!(matches!(store.get("nope"), Err(Error::NotFound(_))));
}

#[test]
fn test_missing_primary_name_rejected() {
    let store = SeriesStore::new();
    let record = SeriesRecord::new(Metadata::new(), vec![1.0]);
    let result = store.create_or_replace(record, None, false);
    assert!(matches!(result, Err(Error::MissingPrimaryName)));
}

#[test]
fn test_revision_tracked_series_read_only() {
    let store = SeriesStore::seeded().unwrap();

    let result = store.create_or_replace(candidate("plgdp0001", "edited"), None, true);
    assert!(matches!(result, Err(Error::RevisionReadOnly(_))));

    let result = store.delete("plgdp0001");
    assert!(matches!(result, Err(Error::RevisionReadOnly(_))));
}

#[test]
fn test_delete_prunes_listing_rows() {
    let store = SeriesStore::seeded().unwrap();

    // The tourism listing references pltour0001 in a single-name row and in
    // a two-name comparison row.
    store.delete("pltour0001").unwrap();

    let listing = store.list_series("tourism").unwrap();
    let rows = &listing.groups[0].rows;
    assert_eq!(rows.len(), 2, "the emptied single-name row is removed");
    for row in rows {
        assert!(!row.names.iter().any(|n| n == "pltour0001"));
    }
    // The comparison row survives with its remaining name
    assert_eq!(rows[1].names, vec!["pltour0003"]);

    assert!(matches!(store.get("pltour0001"), Err(Error::NotFound(_))));
}

#[test]
fn test_delete_prunes_rows_for_unicode_cased_names() {
    let store = SeriesStore::new();
    store
        .create_or_replace(candidate("ÜBERSCHUSS", "surplus"), None, false)
        .unwrap();

    // Deleting with a differently cased spelling removes the record and
    // must not leave the name dangling in the catch-all listing.
    store.delete("überschuss").unwrap();
    assert!(matches!(store.get("ÜBERSCHUSS"), Err(Error::NotFound(_))));

    let listing = store.list_series(CATCH_ALL_REFERENCE).unwrap();
    assert!(listing.groups[0].rows.is_empty());
}

#[test]
fn test_delete_keeps_emptied_group() {
    let store = SeriesStore::new();
    store
        .create_or_replace(candidate("solo", "alone"), None, false)
        .unwrap();
    store.delete("solo").unwrap();

    let listing = store.list_series(CATCH_ALL_REFERENCE).unwrap();
    assert_eq!(listing.groups.len(), 1, "emptied group is left in place");
    assert!(listing.groups[0].rows.is_empty());
}

#[test]
fn test_delete_unknown_name_not_found() {
    let store = SeriesStore::new();
    assert!(matches!(store.delete("ghost"), Err(Error::NotFound(_))));
}

#[test]
fn test_batch_meta_reports_per_item_failures() {
    let store = SeriesStore::seeded().unwrap();
    let items = store.load_meta(&["pltour0001".to_string(), "ghost".to_string()]);

    assert_eq!(items.len(), 2);
    assert!(items[0].payload().is_some());
    assert_eq!(items[1].error(), Some("Series could not be found!"));
}
