//! Reconciliation engine.
//!
//! Drives the per-collection, per-asset merge loop: resolve the collection,
//! query its entities, subset to the ones the sheet knows about, then merge
//! description and owner into a freshly fetched entity, sanitize, and
//! commit. Each asset passes through an explicit stage sequence so a
//! failure is terminal for that asset only; sibling assets, the group, and
//! the run all carry on.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, warn};

use crate::catalog::{resolve_collection_id, CatalogApi, CatalogError, EntitySummary};
use crate::dataset::RowSet;
use crate::entity::{
    referred_name, referred_qualified_name, set_referred_description, EntityEnvelope,
};
use crate::record::AssetRecord;
use crate::sanitize::sanitize;

/// Stage at which an asset's update can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStage {
    Fetch,
    MergeDescription,
    MergeOwner,
    Sanitize,
    Commit,
    ColumnPropagation,
}

impl fmt::Display for AssetStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetStage::Fetch => "fetch",
            AssetStage::MergeDescription => "merge-description",
            AssetStage::MergeOwner => "merge-owner",
            AssetStage::Sanitize => "sanitize",
            AssetStage::Commit => "commit",
            AssetStage::ColumnPropagation => "column-propagation",
        };
        f.write_str(name)
    }
}

/// Terminal result of one asset's pass through the engine.
#[derive(Debug)]
pub enum AssetOutcome {
    /// The asset merge ran to completion (or was simulated in dry-run).
    Updated {
        owner_set: bool,
        columns_updated: usize,
        /// Column propagation failure, isolated from the asset's own commit.
        column_error: Option<String>,
    },
    /// The asset failed at `stage`; siblings are unaffected.
    Failed { stage: AssetStage, message: String },
}

/// Aggregate counts for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub collections_processed: usize,
    /// Groups skipped because no collection id resolved or the catalog
    /// query failed; never fatal to the run.
    pub collections_skipped: usize,
    /// Remote entities whose qualified name matched a sheet row.
    pub assets_matched: usize,
    pub assets_updated: usize,
    pub assets_failed: usize,
    pub owners_set: usize,
    pub columns_updated: usize,
    pub column_failures: usize,
}

/// Orchestrates reconciliation against one catalog.
pub struct ReconcileEngine<C> {
    catalog: C,
    dry_run: bool,
}

impl<C: CatalogApi> ReconcileEngine<C> {
    pub fn new(catalog: C, dry_run: bool) -> Self {
        Self { catalog, dry_run }
    }

    /// Reconcile every collection named in the sheet, one at a time.
    ///
    /// The row set is read-only for the whole run; all mutation happens on
    /// locally fetched entities.
    pub async fn run(&self, rows: &RowSet) -> RunSummary {
        let mut summary = RunSummary::default();
        for collection in rows.collection_names() {
            if let Err(e) = self
                .reconcile_collection(&collection, rows, &mut summary)
                .await
            {
                warn!(collection = %collection, error = %e, "collection skipped after catalog error");
                summary.collections_skipped += 1;
            }
        }
        summary
    }

    async fn reconcile_collection(
        &self,
        collection: &str,
        rows: &RowSet,
        summary: &mut RunSummary,
    ) -> Result<(), CatalogError> {
        let Some(collection_id) = resolve_collection_id(&self.catalog, collection).await? else {
            info!(collection = %collection, "no matching collection id; skipping group");
            summary.collections_skipped += 1;
            return Ok(());
        };
        debug!(collection = %collection, id = %collection_id, "collection resolved");

        let entities = self.catalog.search_by_collection(&collection_id).await?;
        info!(
            collection = %collection,
            entities = entities.len(),
            "collection queried"
        );

        let group: Vec<AssetRecord<'_>> = rows
            .records()
            .filter(|r| r.collection_name() == collection)
            .collect();
        let known_fqns: HashSet<&str> = group.iter().map(|r| r.asset_fqn()).collect();

        // Subset merge: entities the sheet does not mention are never
        // fetched, mutated, or committed.
        let to_update: Vec<&EntitySummary> = entities
            .iter()
            .filter(|e| known_fqns.contains(e.qualified_name.as_str()))
            .collect();
        info!(
            collection = %collection,
            matched = to_update.len(),
            "assets to update"
        );

        summary.collections_processed += 1;
        summary.assets_matched += to_update.len();

        for entity in to_update {
            match self.update_asset(entity, &group).await {
                AssetOutcome::Updated {
                    owner_set,
                    columns_updated,
                    column_error,
                } => {
                    summary.assets_updated += 1;
                    if owner_set {
                        summary.owners_set += 1;
                    }
                    summary.columns_updated += columns_updated;
                    if let Some(error) = column_error {
                        summary.column_failures += 1;
                        warn!(asset = %entity.name, error = %error, "column propagation failed");
                    }
                    info!(asset = %entity.name, id = %entity.id, "asset updated");
                }
                AssetOutcome::Failed { stage, message } => {
                    summary.assets_failed += 1;
                    warn!(
                        asset = %entity.name,
                        id = %entity.id,
                        stage = %stage,
                        error = %message,
                        "asset update failed"
                    );
                }
            }
        }
        Ok(())
    }

    /// Run one asset through fetch, merge, sanitize, commit, and column
    /// propagation. Every failure is contained in the returned outcome.
    pub async fn update_asset(
        &self,
        entity: &EntitySummary,
        group: &[AssetRecord<'_>],
    ) -> AssetOutcome {
        info!(asset = %entity.name, id = %entity.id, "updating metadata");

        // Fresh read; the search summary is never reused as the payload.
        let mut envelope = match self.catalog.get_entity_by_guid(&entity.id).await {
            Ok(envelope) => envelope,
            Err(e) => {
                return AssetOutcome::Failed {
                    stage: AssetStage::Fetch,
                    message: e.to_string(),
                }
            }
        };

        let Some(row) = group
            .iter()
            .find(|r| r.asset_fqn() == entity.qualified_name)
        else {
            return AssetOutcome::Failed {
                stage: AssetStage::MergeDescription,
                message: format!("no sheet row with FQN {}", entity.qualified_name),
            };
        };

        // Last writer wins: the sheet's description replaces whatever the
        // catalog holds.
        envelope.entity.set_user_description(row.description());
        debug!(asset = %entity.name, description = row.description(), "description merged");

        let owner_set = match row.owner_id() {
            Some(owner) => {
                envelope.entity.set_owner(owner);
                debug!(asset = %entity.name, owner = owner, "owner merged");
                true
            }
            None => {
                // Absence means "no opinion": existing contacts stay as fetched.
                debug!(asset = %entity.name, "no owner in sheet; contacts left untouched");
                false
            }
        };

        let payload = match envelope.to_payload() {
            Ok(payload) => sanitize(payload),
            Err(e) => {
                return AssetOutcome::Failed {
                    stage: AssetStage::Sanitize,
                    message: e.to_string(),
                }
            }
        };

        if self.dry_run {
            info!(asset = %entity.name, "dry run: entity update would be committed");
        } else if let Err(e) = self.catalog.create_or_update(&payload).await {
            return AssetOutcome::Failed {
                stage: AssetStage::Commit,
                message: e.to_string(),
            };
        }

        let (columns_updated, column_error) =
            self.propagate_columns(&mut envelope, entity, group).await;

        AssetOutcome::Updated {
            owner_set,
            columns_updated,
            column_error,
        }
    }

    /// Merge sheet descriptions into the envelope's referred entities and
    /// commit the result. Failures here never undo the asset's own commit.
    async fn propagate_columns(
        &self,
        envelope: &mut EntityEnvelope,
        entity: &EntitySummary,
        group: &[AssetRecord<'_>],
    ) -> (usize, Option<String>) {
        if envelope.referred_entities.is_empty() {
            debug!(asset = %entity.name, "no referred entities found");
            return (0, None);
        }

        let column_rows: Vec<&AssetRecord<'_>> = group
            .iter()
            .filter(|r| r.is_column() && r.parent_asset_fqn() == entity.qualified_name)
            .collect();
        if column_rows.is_empty() {
            debug!(asset = %entity.name, "no columns in scope");
            return (0, None);
        }

        let mut merged = 0;
        for referred in envelope.referred_entities.values_mut() {
            let Some(name) = referred_name(referred).map(str::to_string) else {
                continue;
            };
            let Some(row) = column_rows.iter().find(|r| r.asset_name() == name) else {
                continue;
            };
            info!(
                column = referred_qualified_name(referred).unwrap_or(&name),
                "updating column description"
            );
            set_referred_description(referred, row.description());
            merged += 1;
        }
        if merged == 0 {
            return (0, None);
        }

        if self.dry_run {
            info!(asset = %entity.name, columns = merged, "dry run: column updates would be committed");
            return (merged, None);
        }

        let payload = match envelope.to_payload() {
            Ok(payload) => sanitize(payload),
            Err(e) => return (0, Some(e.to_string())),
        };
        match self.catalog.create_or_update(&payload).await {
            Ok(()) => (merged, None),
            Err(e) => (0, Some(e.to_string())),
        }
    }
}
