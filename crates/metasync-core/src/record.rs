//! Row model for the external asset sheet.
//!
//! Columns are resolved by header name, order-insensitive. A [`AssetRecord`]
//! is a borrowed view over one row of a [`crate::dataset::RowSet`]; the raw
//! cells stay owned by the row set so untouched columns round-trip through
//! the writer unchanged.

use crate::{Result, SyncError};

/// Column holding the asset's display name.
pub const COL_ASSET_NAME: &str = "AssetName";
/// Column holding the fully qualified name used to match catalog entities.
pub const COL_ASSET_FQN: &str = "AssetFQN";
/// Column holding the free-text description.
pub const COL_ASSET_DESCRIPTION: &str = "AssetDescription";
/// Column naming the collection the row belongs to.
pub const COL_COLLECTION_NAME: &str = "CollectionName";
/// Column holding the optional owner identity reference.
pub const COL_OWNER_ID: &str = "OwnerId";
/// Column referencing the parent asset FQN for column-level rows.
pub const COL_PARENT_ASSET_FQN: &str = "ParentAssetFQN";
/// Column flagging column-level rows.
pub const COL_IS_COLUMN: &str = "IsColumn";

/// Every column the sheet must carry, in no particular order.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    COL_ASSET_NAME,
    COL_ASSET_FQN,
    COL_ASSET_DESCRIPTION,
    COL_COLLECTION_NAME,
    COL_OWNER_ID,
    COL_PARENT_ASSET_FQN,
    COL_IS_COLUMN,
];

/// Returns true when a cell represents "no value".
///
/// Sheets exported from pandas carry the literal string `nan` (any casing)
/// for missing cells, so both the empty cell and that sentinel count.
pub fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell.eq_ignore_ascii_case("nan")
}

/// Positions of the required columns within a sheet's header row.
#[derive(Debug, Clone, Copy)]
pub struct ColumnIndex {
    pub asset_name: usize,
    pub asset_fqn: usize,
    pub description: usize,
    pub collection_name: usize,
    pub owner_id: usize,
    pub parent_asset_fqn: usize,
    pub is_column: usize,
}

impl ColumnIndex {
    /// Resolve the required columns against a header row.
    ///
    /// Fails with the full list of missing columns so a malformed sheet is
    /// diagnosed in one pass.
    pub fn from_headers(headers: &[String]) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| find(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(SyncError::Dataset(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            asset_name: find(COL_ASSET_NAME).unwrap(),
            asset_fqn: find(COL_ASSET_FQN).unwrap(),
            description: find(COL_ASSET_DESCRIPTION).unwrap(),
            collection_name: find(COL_COLLECTION_NAME).unwrap(),
            owner_id: find(COL_OWNER_ID).unwrap(),
            parent_asset_fqn: find(COL_PARENT_ASSET_FQN).unwrap(),
            is_column: find(COL_IS_COLUMN).unwrap(),
        })
    }
}

/// Borrowed view over one sheet row.
#[derive(Debug, Clone, Copy)]
pub struct AssetRecord<'a> {
    columns: &'a ColumnIndex,
    fields: &'a [String],
}

impl<'a> AssetRecord<'a> {
    pub(crate) fn new(columns: &'a ColumnIndex, fields: &'a [String]) -> Self {
        Self { columns, fields }
    }

    fn cell(&self, index: usize) -> &'a str {
        self.fields.get(index).map(String::as_str).unwrap_or("")
    }

    /// Display name of the asset (or column) this row describes.
    pub fn asset_name(&self) -> &'a str {
        self.cell(self.columns.asset_name)
    }

    /// Fully qualified name, unique within the row's collection.
    pub fn asset_fqn(&self) -> &'a str {
        self.cell(self.columns.asset_fqn)
    }

    /// Raw description cell, possibly empty.
    pub fn description(&self) -> &'a str {
        self.cell(self.columns.description)
    }

    /// Name of the collection this row belongs to.
    pub fn collection_name(&self) -> &'a str {
        self.cell(self.columns.collection_name)
    }

    /// Owner identity reference, `None` when the cell carries no value.
    pub fn owner_id(&self) -> Option<&'a str> {
        let cell = self.cell(self.columns.owner_id).trim();
        if is_missing(cell) {
            None
        } else {
            Some(cell)
        }
    }

    /// Parent asset FQN; meaningful only for column-level rows.
    pub fn parent_asset_fqn(&self) -> &'a str {
        self.cell(self.columns.parent_asset_fqn)
    }

    /// Whether this row describes a column rather than an asset.
    ///
    /// Existing sheets mark columns with the exact string `Yes`; anything
    /// else (including `yes`, `true`, `1`) is treated as an asset row for
    /// compatibility with those sheets.
    pub fn is_column(&self) -> bool {
        self.cell(self.columns.is_column) == "Yes"
    }
}
