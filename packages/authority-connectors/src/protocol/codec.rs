//! Request construction for each protocol revision.

use serde_json::{json, Map, Value};

use super::Protocol;
use crate::traits::transport::HttpRequest;

/// Optional language hints. Only the newest protocol honors them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryHints {
    /// Sent as the query's `lang` field.
    pub process_lang: Option<String>,
    /// Sent as the `Accept-Language` header.
    pub accept_lang: Option<String>,
}

/// Build the POST request for a single query.
pub fn build_query(protocol: Protocol, endpoint: &str, key: &str, hints: &QueryHints) -> HttpRequest {
    match protocol {
        Protocol::Draft => draft_query(endpoint, key, hints),
        Protocol::Legacy => legacy_query(endpoint, key),
    }
}

/// `{"queries": [{"query": ..., "lang": ...}]}` as JSON.
fn draft_query(endpoint: &str, key: &str, hints: &QueryHints) -> HttpRequest {
    let mut query = Map::new();
    query.insert("query".into(), Value::String(key.to_string()));
    if let Some(lang) = &hints.process_lang {
        query.insert("lang".into(), Value::String(lang.clone()));
    }
    let body = json!({ "queries": [Value::Object(query)] });

    let mut request = HttpRequest::post(endpoint)
        .header("Content-Type", "application/json")
        .body(body.to_string());
    if let Some(lang) = &hints.accept_lang {
        request = request.header("Accept-Language", lang.clone());
    }
    request
}

/// `queries=<url-encoded {"q0": {"query": ...}}>` as a form body.
fn legacy_query(endpoint: &str, key: &str) -> HttpRequest {
    let queries = json!({ "q0": { "query": key } });
    HttpRequest::post(endpoint)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(format!("queries={}", urlencoding::encode(&queries.to_string())))
}
