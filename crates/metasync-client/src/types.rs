//! Wire types for the catalog REST API.
//!
//! These mirror the remote request/response structures and exist purely
//! for (de)serialization at the HTTP boundary; the engine works with the
//! core crate's types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Response of the collection listing endpoint.
#[derive(Debug, Deserialize)]
pub struct CollectionList {
    #[serde(default)]
    pub value: Vec<CollectionRecord>,
}

/// One collection as listed by the account endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionRecord {
    /// Stable opaque identifier.
    pub name: String,
    /// Human-readable name.
    #[serde(rename = "friendlyName")]
    pub friendly_name: String,
}

/// Discovery query request.
#[derive(Debug, Serialize)]
pub struct SearchRequest {
    pub keywords: String,
    pub filter: Value,
    pub limit: usize,
    pub offset: usize,
}

impl SearchRequest {
    /// Match-all query restricted to one collection id.
    pub fn match_all_in_collection(collection_id: &str, limit: usize, offset: usize) -> Self {
        Self {
            keywords: "*".to_string(),
            filter: json!({
                "and": [
                    { "or": [ { "collectionId": collection_id } ] }
                ]
            }),
            limit,
            offset,
        }
    }
}

/// Discovery query response.
#[derive(Debug, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub value: Vec<SearchHit>,
}

/// One entity summary from a discovery query.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "qualifiedName", default)]
    pub qualified_name: String,
}

/// Error envelope returned by the catalog on failures.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
