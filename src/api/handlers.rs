//! HTTP handlers
//!
//! Thin adapter layer: each handler resolves its query parameters, calls
//! exactly one store operation, and serializes the result. All typed JSON
//! conversion is delegated to the codec module.

use crate::api::codec::{
    self, WireListing, WireNode, WireSeries, WireSeriesInput, WireVintageStamp,
};
use crate::api::ApiState;
use crate::Error;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

fn error_response(err: Error) -> Response {
    let status = match &err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_conflict() => StatusCode::CONFLICT,
        e if e.is_bad_request() => StatusCode::BAD_REQUEST,
        Error::Serialization(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

/// Comma-separated list of series names.
#[derive(Debug, Deserialize)]
pub struct NamesQuery {
    pub names: String,
}

impl NamesQuery {
    fn split(&self) -> Vec<String> {
        self.names
            .split(',')
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct VintageQuery {
    pub name: String,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseQuery {
    pub name: String,
    pub nth: usize,
}

#[derive(Debug, Deserialize)]
pub struct ReferenceQuery {
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

/// Create/replace request: the candidate record plus the
/// optimistic-concurrency controls.
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub series: WireSeriesInput,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub force_replace: bool,
}

pub async fn get_capabilities(State(state): State<ApiState>) -> Response {
    Json(state.store.capabilities()).into_response()
}

pub async fn load_series(
    State(state): State<ApiState>,
    Query(query): Query<NamesQuery>,
) -> Response {
    let items = state.store.load_series(&query.split());
    let body = codec::encode_batch(items, |record| {
        serde_json::to_value(WireSeries::from_record(&record)).unwrap_or(Value::Null)
    });
    Json(body).into_response()
}

pub async fn load_meta(
    State(state): State<ApiState>,
    Query(query): Query<NamesQuery>,
) -> Response {
    let items = state.store.load_meta(&query.split());
    let body = codec::encode_batch(items, |meta| Value::Object(codec::encode_metadata(&meta)));
    Json(body).into_response()
}

pub async fn load_vintage(
    State(state): State<ApiState>,
    Query(query): Query<VintageQuery>,
) -> Response {
    let timestamp = match codec::decode_timestamp(&query.timestamp) {
        Ok(ts) => ts,
        Err(e) => return error_response(e),
    };
    match state.store.load_at_vintage(&query.name, timestamp) {
        Ok(record) => Json(WireSeries::from_record(&record)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn load_vintage_timestamps(
    State(state): State<ApiState>,
    Query(query): Query<NameQuery>,
) -> Response {
    match state.store.load_vintage_timestamps(&query.name) {
        Ok(stamps) => {
            let body: Vec<WireVintageStamp> =
                stamps.iter().map(WireVintageStamp::from_stamp).collect();
            Json(body).into_response()
        }
        Err(e) => error_response(e),
    }
}

pub async fn load_release(
    State(state): State<ApiState>,
    Query(query): Query<ReleaseQuery>,
) -> Response {
    match state.store.load_release(&query.name, query.nth) {
        Ok(record) => Json(WireSeries::from_record(&record)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn load_complete_history(
    State(state): State<ApiState>,
    Query(query): Query<NameQuery>,
) -> Response {
    match state.store.load_complete_history(&query.name) {
        Ok(history) => Json(codec::encode_history(&history)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn create_series(
    State(state): State<ApiState>,
    Json(request): Json<CreateRequest>,
) -> Response {
    let expected = match &request.last_modified {
        Some(raw) => match codec::decode_timestamp(raw) {
            Ok(ts) => Some(ts),
            Err(e) => return error_response(e),
        },
        None => None,
    };
    let record = match request.series.into_record() {
        Ok(record) => record,
        Err(e) => return error_response(e),
    };
    match state
        .store
        .create_or_replace(record, expected, request.force_replace)
    {
        Ok(stamp) => Json(serde_json::json!({
            "last_modified": codec::encode_timestamp(stamp)
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn remove_series(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Response {
    match state.store.delete(&name) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn load_tree(
    State(state): State<ApiState>,
    Query(query): Query<ReferenceQuery>,
) -> Response {
    match state.store.load_tree(query.reference.as_deref()) {
        Ok(nodes) => {
            let body: Vec<WireNode> = nodes.iter().map(WireNode::from_node).collect();
            Json(body).into_response()
        }
        Err(e) => error_response(e),
    }
}

pub async fn list_series(
    State(state): State<ApiState>,
    Query(query): Query<ReferenceQuery>,
) -> Response {
    let Some(reference) = query.reference.filter(|r| !r.is_empty()) else {
        return error_response(Error::NotFound("missing listing reference".to_string()));
    };
    match state.store.list_series(&reference) {
        Ok(listing) => Json(WireListing::from_listing(&listing)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn search_series(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match state.store.search(&query.query) {
        Ok(hits) => {
            let body: Vec<Value> = hits
                .iter()
                .map(|meta| Value::Object(codec::encode_metadata(meta)))
                .collect();
            Json(body).into_response()
        }
        Err(e) => error_response(e),
    }
}
