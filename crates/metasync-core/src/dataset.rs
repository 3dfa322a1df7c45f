//! CSV loading and persistence for the external asset sheet.
//!
//! The loader keeps every cell as the raw string it was read as, including
//! columns this tool knows nothing about, so writing the set back preserves
//! them byte for byte. The writer copies the pre-existing file to a
//! `_backup` sibling and verifies the copy before overwriting the original.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::record::{AssetRecord, ColumnIndex};
use crate::{Result, SyncError};

/// In-memory copy of the asset sheet.
#[derive(Debug, Clone)]
pub struct RowSet {
    headers: Vec<String>,
    columns: ColumnIndex,
    rows: Vec<Vec<String>>,
}

impl RowSet {
    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header row as read from the file.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Typed view over one row.
    pub fn record(&self, index: usize) -> AssetRecord<'_> {
        AssetRecord::new(&self.columns, &self.rows[index])
    }

    /// Iterate typed views over every row.
    pub fn records(&self) -> impl Iterator<Item = AssetRecord<'_>> {
        self.rows
            .iter()
            .map(move |fields| AssetRecord::new(&self.columns, fields))
    }

    /// Distinct collection names in first-seen order.
    pub fn collection_names(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for record in self.records() {
            let name = record.collection_name();
            if !seen.iter().any(|s: &String| s == name) {
                seen.push(name.to_string());
            }
        }
        seen
    }

    /// Replace the description cell of one row.
    pub fn set_description(&mut self, index: usize, text: &str) {
        let column = self.columns.description;
        self.rows[index][column] = text.to_string();
    }

    /// Build a set carrying exactly the required columns, in their
    /// canonical order. Test fixture constructor.
    #[cfg(test)]
    pub(crate) fn from_required(rows: &[[&str; 7]]) -> Self {
        let headers: Vec<String> = crate::record::REQUIRED_COLUMNS
            .iter()
            .map(|s| s.to_string())
            .collect();
        let columns = ColumnIndex::from_headers(&headers).unwrap();
        Self {
            headers,
            columns,
            rows: rows
                .iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }
}

/// Load the sheet at `path` into a [`RowSet`].
///
/// Fails when the file is unreadable or any required column is absent from
/// the header row.
pub fn load(path: &Path) -> Result<RowSet> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(String::from).collect());
    }

    debug!(path = %path.display(), rows = rows.len(), "loaded asset sheet");
    Ok(RowSet {
        headers,
        columns,
        rows,
    })
}

/// Persist `rows` back to `path`, backing up the existing file first.
///
/// The backup is a byte copy of the file as found on disk; it is written
/// and verified before the original is replaced, so a failed backup never
/// leaves the sheet half-overwritten.
pub fn write(rows: &RowSet, path: &Path) -> Result<()> {
    let backup = backup_path(path);
    let original_len = fs::metadata(path)?.len();
    let copied = fs::copy(path, &backup)?;
    if copied != original_len {
        return Err(SyncError::Dataset(format!(
            "backup at {} is incomplete ({} of {} bytes); original left untouched",
            backup.display(),
            copied,
            original_len
        )));
    }
    info!(backup = %backup.display(), "backup saved");

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&rows.headers)?;
    for row in &rows.rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(SyncError::Io)?;

    info!(path = %path.display(), rows = rows.len(), "updated sheet saved");
    Ok(())
}

/// Sibling path carrying a `_backup` suffix before the extension.
///
/// `assetinfo.csv` becomes `assetinfo_backup.csv`; an extension-less path
/// gets the suffix appended.
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_backup.{}", stem, ext.to_string_lossy()),
        None => format!("{stem}_backup"),
    };
    path.with_file_name(name)
}
