//! Seam to the remote data catalog.
//!
//! The engine talks to the catalog exclusively through [`CatalogApi`]; the
//! HTTP implementation lives in the client crate, and tests substitute an
//! in-memory double. Authentication and transport concerns stay entirely
//! behind this trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::entity::EntityEnvelope;

/// A named collection visible to the caller's credentials.
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    /// Stable opaque identifier.
    pub name: String,
    /// Human-readable name matched against the sheet's `CollectionName`.
    pub friendly_name: String,
}

/// Summary of an entity as returned by search.
#[derive(Debug, Clone)]
pub struct EntitySummary {
    pub id: String,
    pub name: String,
    pub qualified_name: String,
}

/// Errors surfaced by catalog collaborators.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Request(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid catalog response: {0}")]
    InvalidResponse(String),
}

/// Narrow interface over the remote catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// List every collection visible to the caller.
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, CatalogError>;

    /// Match-all search restricted to one collection id, all pages exhausted.
    async fn search_by_collection(
        &self,
        collection_id: &str,
    ) -> Result<Vec<EntitySummary>, CatalogError>;

    /// Fetch an entity, attributes and referred entities included.
    async fn get_entity_by_guid(&self, guid: &str) -> Result<EntityEnvelope, CatalogError>;

    /// Idempotent upsert of a full entity payload.
    async fn create_or_update(&self, payload: &Value) -> Result<(), CatalogError>;
}

/// Resolve a collection's friendly name to its stable identifier.
///
/// The match is case-insensitive and exact; the first match wins. `None`
/// means "no entities to update", never an error.
pub async fn resolve_collection_id<C: CatalogApi + ?Sized>(
    catalog: &C,
    friendly_name: &str,
) -> Result<Option<String>, CatalogError> {
    let wanted = friendly_name.to_lowercase();
    let collections = catalog.list_collections().await?;
    Ok(collections
        .into_iter()
        .find(|c| c.friendly_name.to_lowercase() == wanted)
        .map(|c| c.name))
}
