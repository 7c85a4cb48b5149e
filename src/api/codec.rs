//! Wire JSON codec
//!
//! The single typed-decoding module at the adapter boundary. All pattern
//! matching on JSON value kinds happens here; the core only ever sees the
//! tagged [`MetaValue`] union. NaN observations serialize as JSON null,
//! calendar dates as `YYYY-MM-DD`, instants as RFC 3339.

use crate::model::{MetaValue, Metadata, SeriesRecord};
use crate::store::browse::{NodeKind, ResolvedListing, TreeNode};
use crate::store::revision::VintageStamp;
use crate::store::BatchItem;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Serialization(format!("invalid timestamp '{}': {}", raw, e)))
}

fn encode_meta_value(value: &MetaValue) -> Value {
    match value {
        MetaValue::Int(i) => Value::from(*i),
        MetaValue::Float(f) => {
            serde_json::Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null)
        }
        MetaValue::Str(s) => Value::String(s.clone()),
        MetaValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
        MetaValue::Timestamp(ts) => Value::String(encode_timestamp(*ts)),
        MetaValue::StrList(items) => {
            Value::Array(items.iter().map(|s| Value::String(s.clone())).collect())
        }
    }
}

/// Infers the metadata kind from the JSON shape: whole numbers become
/// integers, `YYYY-MM-DD` strings calendar dates, RFC 3339 strings
/// instants, string arrays string-lists. Everything else is rejected.
fn decode_meta_value(key: &str, value: &Value) -> Result<MetaValue> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(MetaValue::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(MetaValue::Float(f))
            } else {
                Err(Error::Serialization(format!(
                    "metadata key '{}' holds an unrepresentable number",
                    key
                )))
            }
        }
        Value::String(s) => {
            if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
                Ok(MetaValue::Date(date))
            } else if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                Ok(MetaValue::Timestamp(ts.with_timezone(&Utc)))
            } else {
                Ok(MetaValue::Str(s.clone()))
            }
        }
        Value::Array(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => list.push(s.clone()),
                    other => {
                        return Err(Error::Serialization(format!(
                            "metadata key '{}' holds a non-string array element: {}",
                            key, other
                        )))
                    }
                }
            }
            Ok(MetaValue::StrList(list))
        }
        other => Err(Error::Serialization(format!(
            "metadata key '{}' holds an unsupported value kind: {}",
            key, other
        ))),
    }
}

pub fn encode_metadata(meta: &Metadata) -> Map<String, Value> {
    meta.iter()
        .map(|(key, value)| (key.clone(), encode_meta_value(value)))
        .collect()
}

pub fn decode_metadata(map: &Map<String, Value>) -> Result<Metadata> {
    map.iter()
        .map(|(key, value)| Ok((key.clone(), decode_meta_value(key, value)?)))
        .collect()
}

fn encode_values(values: &[f64]) -> Vec<Value> {
    values
        .iter()
        .map(|v| {
            if v.is_nan() {
                Value::Null
            } else {
                serde_json::Number::from_f64(*v).map(Value::Number).unwrap_or(Value::Null)
            }
        })
        .collect()
}

/// Full series on the wire.
#[derive(Debug, Serialize)]
pub struct WireSeries {
    pub metadata: Map<String, Value>,
    pub values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_value_metadata: Option<Vec<Option<Map<String, Value>>>>,
}

impl WireSeries {
    pub fn from_record(record: &SeriesRecord) -> Self {
        Self {
            metadata: encode_metadata(&record.metadata),
            values: encode_values(&record.values),
            dates: record
                .dates
                .as_ref()
                .map(|dates| dates.iter().map(|d| d.format(DATE_FORMAT).to_string()).collect()),
            per_value_metadata: record.per_value_metadata.as_ref().map(|pvm| {
                pvm.iter()
                    .map(|point| point.as_ref().map(encode_metadata))
                    .collect()
            }),
        }
    }
}

/// Incoming series payload for create/replace.
#[derive(Debug, Deserialize)]
pub struct WireSeriesInput {
    pub metadata: Map<String, Value>,
    /// Observations; null marks a missing value.
    pub values: Vec<Option<f64>>,
    #[serde(default)]
    pub dates: Option<Vec<String>>,
    #[serde(default)]
    pub per_value_metadata: Option<Vec<Option<Map<String, Value>>>>,
}

impl WireSeriesInput {
    pub fn into_record(self) -> Result<SeriesRecord> {
        let metadata = decode_metadata(&self.metadata)?;
        let values = self
            .values
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        let mut record = SeriesRecord::new(metadata, values);
        if let Some(dates) = self.dates {
            let mut parsed = Vec::with_capacity(dates.len());
            for raw in &dates {
                parsed.push(NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
                    Error::Serialization(format!("invalid date '{}': {}", raw, e))
                })?);
            }
            record = record.with_dates(parsed);
        }
        if let Some(pvm) = self.per_value_metadata {
            let mut decoded = Vec::with_capacity(pvm.len());
            for point in &pvm {
                decoded.push(match point {
                    Some(map) => Some(decode_metadata(map)?),
                    None => None,
                });
            }
            record = record.with_per_value_metadata(decoded);
        }
        Ok(record)
    }
}

/// Per-item batch outcome: payload or error string, never both.
pub fn encode_batch<T, F>(items: Vec<BatchItem<T>>, encode: F) -> Vec<Value>
where
    F: Fn(T) -> Value,
{
    items
        .into_iter()
        .map(|item| match item {
            BatchItem::Payload(payload) => encode(payload),
            BatchItem::Error(message) => {
                let mut map = Map::new();
                map.insert("error".to_string(), Value::String(message));
                Value::Object(map)
            }
        })
        .collect()
}

/// Browse node on the wire: exactly one of the three shapes is present.
#[derive(Debug, Serialize)]
pub struct WireNode {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<WireNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_reference: Option<String>,
}

impl WireNode {
    pub fn from_node(node: &TreeNode) -> Self {
        let mut wire = Self {
            title: node.title.clone(),
            children: None,
            children_reference: None,
            series_reference: None,
        };
        match &node.kind {
            NodeKind::Children(children) => {
                wire.children = Some(children.iter().map(WireNode::from_node).collect());
            }
            NodeKind::ChildrenRef(reference) => {
                wire.children_reference = Some(reference.clone());
            }
            NodeKind::SeriesRef(reference) => {
                wire.series_reference = Some(reference.clone());
            }
        }
        wire
    }
}

#[derive(Debug, Serialize)]
pub struct WireListing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspects: Option<Vec<String>>,
    pub groups: Vec<WireListingGroup>,
}

#[derive(Debug, Serialize)]
pub struct WireListingGroup {
    pub name: String,
    pub rows: Vec<WireListingRow>,
}

#[derive(Debug, Serialize)]
pub struct WireListingRow {
    pub indentation: u32,
    pub emphasis: bool,
    pub space_above: bool,
    pub names: Vec<String>,
    /// Index-aligned with `names`; null for a name that did not resolve.
    pub entities: Vec<Option<Map<String, Value>>>,
}

impl WireListing {
    pub fn from_listing(listing: &ResolvedListing) -> Self {
        Self {
            aspects: listing.aspects.clone(),
            groups: listing
                .groups
                .iter()
                .map(|group| WireListingGroup {
                    name: group.name.clone(),
                    rows: group
                        .rows
                        .iter()
                        .map(|row| WireListingRow {
                            indentation: row.indentation,
                            emphasis: row.emphasis,
                            space_above: row.space_above,
                            names: row.names.clone(),
                            entities: row
                                .entities
                                .iter()
                                .map(|meta| meta.as_ref().map(encode_metadata))
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WireVintageStamp {
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl WireVintageStamp {
    pub fn from_stamp(stamp: &VintageStamp) -> Self {
        Self {
            timestamp: encode_timestamp(stamp.timestamp),
            label: stamp.label.clone(),
        }
    }
}

/// Complete history keyed by RFC 3339 vintage timestamp; keys sort
/// chronologically because every stamp is UTC with a fixed layout.
pub fn encode_history(history: &BTreeMap<DateTime<Utc>, SeriesRecord>) -> Map<String, Value> {
    history
        .iter()
        .map(|(ts, record)| {
            (
                encode_timestamp(*ts),
                serde_json::to_value(WireSeries::from_record(record)).unwrap_or(Value::Null),
            )
        })
        .collect()
}
