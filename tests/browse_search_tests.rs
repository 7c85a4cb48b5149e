//! Integration tests for the browse tree, listing resolution, and search.

use vintagedb::model::{MetaValue, Metadata, SeriesRecord, KEY_DESCRIPTION, KEY_PRIMARY_NAME};
use vintagedb::store::browse::{Listing, ListingGroup, ListingRow, NodeKind};
use vintagedb::store::SeriesStore;
use vintagedb::Error;

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
    SeriesRecord::new(meta, vec![1.0])
}

#[test]
fn test_tree_root_without_reference() {
    let store = SeriesStore::seeded().unwrap();

    let root = store.load_tree(None).unwrap();
    assert_eq!(root.len(), 3);
    assert_eq!(root[0].title, "Tourism");
    assert!(matches!(root[0].kind, NodeKind::ChildrenRef(_)));
    assert!(matches!(root[1].kind, NodeKind::Children(_)));
    assert!(matches!(root[2].kind, NodeKind::SeriesRef(_)));

    // Empty reference behaves like no reference
    let also_root = store.load_tree(Some("")).unwrap();
    assert_eq!(also_root.len(), 3);
}

#[test]
fn test_tree_reference_lookup() {
    let store = SeriesStore::seeded().unwrap();

    let branch = store.load_tree(Some("tourism-branch")).unwrap();
    assert_eq!(branch.len(), 1);
    assert_eq!(branch[0].title, "Accommodation statistics");
    match &branch[0].kind {
        NodeKind::SeriesRef(reference) => assert_eq!(reference, "tourism"),
        other => panic!("Expected series reference, got: {:?}", other),
    }
}

#[test]
fn test_tree_unknown_reference_not_found() {
    let store = SeriesStore::seeded().unwrap();
    assert!(matches!(
        store.load_tree(Some("no-such-branch")),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_listing_resolution_with_display_hints() {
    let store = SeriesStore::seeded().unwrap();

    let listing = store.list_series("tourism").unwrap();
    assert_eq!(
        listing.aspects.as_deref(),
        Some(&["Monthly".to_string()][..])
    );
    assert_eq!(listing.groups.len(), 1);
    assert_eq!(listing.groups[0].name, "Accommodation");

    let rows = &listing.groups[0].rows;
    assert_eq!(rows.len(), 3);
    assert!(rows[0].emphasis);
    assert_eq!(rows[1].indentation, 1);
    assert!(rows[2].space_above);

    // The comparison row resolves both names side by side
    assert_eq!(rows[2].names, vec!["pltour0001", "pltour0003"]);
    assert_eq!(rows[2].entities.len(), 2);
    assert!(rows[2].entities.iter().all(Option::is_some));
}

#[test]
fn test_listing_missing_name_yields_null_slot() {
    let store = SeriesStore::new();
    store
        .create_or_replace(candidate("present", "here"), None, false)
        .unwrap();
    store.register_listing(
        "mixed",
        Listing {
            aspects: None,
            groups: vec![ListingGroup::new(
                "Mixed",
                vec![ListingRow::new(&["missing", "present"])],
            )],
        },
    );

    let listing = store.list_series("mixed").unwrap();
    let row = &listing.groups[0].rows[0];
    assert_eq!(row.entities.len(), 2);
    assert!(row.entities[0].is_none(), "missing name becomes a null slot");
    assert!(row.entities[1].is_some());
}

#[test]
fn test_listing_unknown_reference_not_found() {
    let store = SeriesStore::seeded().unwrap();
    assert!(matches!(
        store.list_series("no-such-listing"),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_listing_resolves_revision_tracked_names() {
    let store = SeriesStore::seeded().unwrap();

    let listing = store.list_series("gdp").unwrap();
    let row = &listing.groups[0].rows[0];
    let meta = row.entities[0].as_ref().unwrap();
    assert_eq!(
        meta.get(KEY_PRIMARY_NAME),
        Some(&MetaValue::Str("plgdp0001".to_string()))
    );
}

#[test]
fn test_search_is_case_insensitive_substring() {
    let store = SeriesStore::seeded().unwrap();

    // "Total" appears in two tourism descriptions and the GDP description
    let hits = store.search("TOTAL").unwrap();
    assert_eq!(hits.len(), 3);

    let hits = store.search("nights").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(
        hits[0].get(KEY_PRIMARY_NAME),
        Some(&MetaValue::Str("pltour0002".to_string()))
    );
}

#[test]
fn test_search_covers_revision_tracked_series() {
    let store = SeriesStore::seeded().unwrap();

    let hits = store.search("gross domestic").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(
        hits[0].get(KEY_PRIMARY_NAME),
        Some(&MetaValue::Str("plgdp0001".to_string()))
    );
}

#[test]
fn test_search_zero_matches_not_found() {
    let store = SeriesStore::seeded().unwrap();
    assert!(matches!(store.search("trade"), Err(Error::NotFound(_))));
}
