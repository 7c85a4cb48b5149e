//! Demo dataset seeded at startup
//!
//! The store is volatile, so the reference provider ships a small dataset:
//! three plain tourism series, one revision-tracked GDP series, and a
//! browse tree with curated listings. The catch-all listing starts empty
//! and collects series created through the edit path.

use super::browse::{Listing, ListingGroup, ListingRow, TreeNode};
use super::revision::{RevisionLedger, Vintage};
use super::{SeriesStore, CATCH_ALL_REFERENCE};
use crate::model::{
    MetaValue, Metadata, SeriesRecord, KEY_DESCRIPTION, KEY_PRIMARY_NAME, KEY_VINTAGE_TIMESTAMP,
};
use crate::Result;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Populates `store` with the demo dataset.
pub fn populate(store: &SeriesStore) -> Result<()> {
    seed_tourism(store)?;
    seed_gdp(store)?;
    seed_browse(store);
    Ok(())
}

fn series_meta(name: &str, description: &str, extra: &[(&str, MetaValue)]) -> Metadata {
    let mut meta = Metadata::new();
    meta.insert(
        KEY_PRIMARY_NAME.to_string(),
        MetaValue::Str(name.to_string()),
    );
    meta.insert(
        KEY_DESCRIPTION.to_string(),
        MetaValue::Str(description.to_string()),
    );
    meta.insert("Region".to_string(), MetaValue::Str("pl".to_string()));
    for (key, value) in extra {
        meta.insert(key.to_string(), value.clone());
    }
    meta
}

fn monthly_dates(count: usize) -> Vec<NaiveDate> {
    (0..count)
        .filter_map(|i| NaiveDate::from_ymd_opt(2024, 1 + i as u32, 1))
        .collect()
}

fn seed_tourism(store: &SeriesStore) -> Result<()> {
    let monthly = ("Frequency", MetaValue::Str("monthly".to_string()));

    store.register_series(
        SeriesRecord::new(
            series_meta(
                "pltour0001",
                "Arrivals, Total",
                &[monthly.clone(), ("Unit", MetaValue::Str("persons".to_string()))],
            ),
            vec![118_400.0, 121_900.0, 149_300.0, f64::NAN, 173_200.0, 181_600.0],
        )
        .with_dates(monthly_dates(6)),
    )?;

    store.register_series(
        SeriesRecord::new(
            series_meta(
                "pltour0002",
                "Nights spent, Total",
                &[monthly.clone(), ("Unit", MetaValue::Str("nights".to_string()))],
            ),
            vec![289_100.0, 301_500.0, 362_800.0, 355_400.0, 401_900.0, 420_300.0],
        )
        .with_dates(monthly_dates(6)),
    )?;

    store.register_series(
        SeriesRecord::new(
            series_meta(
                "pltour0003",
                "Occupancy rate, Hotels",
                &[monthly, ("Unit", MetaValue::Str("percent".to_string()))],
            ),
            vec![41.2, 43.8, 52.1, 50.6, 57.9, 61.3],
        )
        .with_dates(monthly_dates(6)),
    )?;

    Ok(())
}

fn gdp_vintage_record(
    values: Vec<f64>,
    quarters: usize,
    stamped: DateTime<Utc>,
) -> SeriesRecord {
    let dates = (0..quarters)
        .filter_map(|q| NaiveDate::from_ymd_opt(2024, 1 + 3 * q as u32, 1))
        .collect();
    let per_value = (0..values.len())
        .map(|_| {
            let mut point = Metadata::new();
            point.insert(
                KEY_VINTAGE_TIMESTAMP.to_string(),
                MetaValue::Timestamp(stamped),
            );
            Some(point)
        })
        .collect();
    SeriesRecord::new(Metadata::new(), values)
        .with_dates(dates)
        .with_per_value_metadata(per_value)
}

fn seed_gdp(store: &SeriesStore) -> Result<()> {
    let shared = series_meta(
        "plgdp0001",
        "Gross Domestic Product, Total",
        &[
            ("Frequency", MetaValue::Str("quarterly".to_string())),
            ("Unit", MetaValue::Str("million PLN".to_string())),
        ],
    );

    let first = Utc.with_ymd_and_hms(2024, 4, 30, 8, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2024, 5, 30, 8, 0, 0).unwrap();
    let third = Utc.with_ymd_and_hms(2024, 7, 31, 8, 0, 0).unwrap();

    // Q1 appears in the first vintage and is revised in the second; Q2
    // arrives with the third vintage. The releases group values by "what
    // became known together": release 0 is the first Q1 estimate, release 1
    // the revised Q1 together with Q2.
    let vintages = vec![
        Vintage::new(
            first,
            Some("Q1 first estimate"),
            gdp_vintage_record(vec![812_300.0], 1, first),
        ),
        Vintage::new(
            second,
            Some("Q1 revised"),
            gdp_vintage_record(vec![815_700.0], 1, second),
        ),
        Vintage::new(
            third,
            Some("Q2 first estimate"),
            gdp_vintage_record(vec![815_700.0, 831_400.0], 2, third),
        ),
    ];
    let releases = vec![
        gdp_vintage_record(vec![812_300.0], 1, first),
        gdp_vintage_record(vec![815_700.0, 831_400.0], 2, third),
    ];

    store.register_ledger("plgdp0001", RevisionLedger::new(shared, vintages, releases)?);
    Ok(())
}

fn seed_browse(store: &SeriesStore) {
    store.register_listing(
        "tourism",
        Listing {
            aspects: Some(vec!["Monthly".to_string()]),
            groups: vec![ListingGroup::new(
                "Accommodation",
                vec![
                    ListingRow::new(&["pltour0001"]).emphasized(),
                    ListingRow::new(&["pltour0002"]).indented(1),
                    // side-by-side comparison columns
                    ListingRow::new(&["pltour0001", "pltour0003"]).spaced(),
                ],
            )],
        },
    );

    store.register_listing(
        "gdp",
        Listing {
            aspects: None,
            groups: vec![ListingGroup::new(
                "National accounts",
                vec![ListingRow::new(&["plgdp0001"]).emphasized()],
            )],
        },
    );

    store.register_listing(CATCH_ALL_REFERENCE, Listing::default());

    // Two root paths share the tourism branch through the same reference.
    store.register_node_ref(
        "tourism-branch",
        vec![TreeNode::series_ref("Accommodation statistics", "tourism")],
    );
    store.set_browse_root(vec![
        TreeNode::children_ref("Tourism", "tourism-branch"),
        TreeNode::group(
            "Economy",
            vec![
                TreeNode::series_ref("Gross domestic product", "gdp"),
                TreeNode::children_ref("Travel industry", "tourism-branch"),
            ],
        ),
        TreeNode::series_ref("Uncategorized", CATCH_ALL_REFERENCE),
    ]);
}
