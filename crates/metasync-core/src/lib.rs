//! Metasync Core
//!
//! Data model and reconciliation engine for aligning asset metadata held in
//! an external CSV sheet with entities in a remote data catalog.
//!
//! The crate is organized around a small set of collaborators, each behind a
//! narrow trait so that remote services can be swapped for test doubles:
//!
//! - [`dataset`] loads the CSV sheet into a [`dataset::RowSet`] and persists
//!   it back (backup first, then overwrite).
//! - [`enrich`] improves short or missing descriptions through a
//!   [`enrich::DescriptionGenerator`], falling back deterministically when
//!   the generator fails.
//! - [`catalog`] defines the [`catalog::CatalogApi`] seam to the remote
//!   catalog (collection listing, search, entity fetch, upsert).
//! - [`engine`] drives the per-collection, per-asset merge and commit loop.
//! - [`sanitize`] normalizes payloads so no NaN sentinel reaches the wire.

pub mod catalog;
pub mod dataset;
pub mod engine;
pub mod enrich;
pub mod entity;
pub mod record;
pub mod sanitize;

pub use dataset::RowSet;
pub use engine::{ReconcileEngine, RunSummary};
pub use enrich::Enricher;
pub use entity::{CatalogEntity, EntityEnvelope};
pub use record::AssetRecord;

/// Errors surfaced by the core crate.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The dataset file is structurally unusable (missing columns, bad shape).
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Filesystem failure while reading or writing the dataset.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parse or write failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Remote catalog failure that escaped per-asset isolation.
    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),

    /// Invalid configuration detected before any remote call.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, SyncError>;
