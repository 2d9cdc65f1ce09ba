//! Columnar backing store
//!
//! One column per storage key, one encoded sub-record per durable entry.
//! Columns created partway through a run are back-padded so every column
//! stays aligned with the store's entry count; a padded position reads as
//! `EntryNotFound`, not as a phantom value.
//!
//! The whole store serializes to a single file with `save`/`open`, which is
//! how one processing run's output becomes the next run's input.

use beamline_core::{BackingStore, Error, Passenger, Result, Shape, StorageKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize)]
struct Column {
    shape: Shape,
    /// One encoded passenger per entry; None where the key had not been
    /// bound yet when the entry was written
    entries: Vec<Option<Vec<u8>>>,
}

impl Column {
    fn new(shape: Shape) -> Self {
        Column {
            shape,
            entries: Vec::new(),
        }
    }
}

/// Entry-indexed, readable and writable backing store
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ColumnStore {
    columns: BTreeMap<String, Column>,
    bound: BTreeSet<String>,
    entries: u64,
}

impl ColumnStore {
    /// Create an empty store
    pub fn new() -> Self {
        ColumnStore::default()
    }

    /// Load a store previously written with `save`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let store: ColumnStore = bincode::deserialize(&bytes)?;
        info!(
            path = %path.as_ref().display(),
            entries = store.entries,
            columns = store.columns.len(),
            "opened column store"
        );
        Ok(store)
    }

    /// Serialize the whole store to one file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = bincode::serialize(self)?;
        fs::write(path.as_ref(), bytes)?;
        info!(
            path = %path.as_ref().display(),
            entries = self.entries,
            columns = self.columns.len(),
            "saved column store"
        );
        Ok(())
    }

    fn column_mut(&mut self, branch: &str, shape: Shape) -> Result<&mut Column> {
        let column = self
            .columns
            .entry(branch.to_string())
            .or_insert_with(|| Column::new(shape));
        if column.shape != shape {
            return Err(Error::TypeMismatch {
                key: branch.to_string(),
                stored: column.shape,
                requested: shape,
            });
        }
        Ok(column)
    }
}

impl BackingStore for ColumnStore {
    fn bind(&mut self, key: &StorageKey, shape: Shape) -> Result<()> {
        let branch = key.branch_name();
        self.column_mut(&branch, shape)?;
        debug!(key = %branch, shape = %shape, "bound column");
        self.bound.insert(branch);
        Ok(())
    }

    fn read_entry(&self, key: &StorageKey, entry: u64) -> Result<Passenger> {
        let branch = key.branch_name();
        let column = self
            .columns
            .get(&branch)
            .ok_or_else(|| Error::KeyUnknown(branch.clone()))?;
        let bytes = column
            .entries
            .get(entry as usize)
            .and_then(|slot| slot.as_ref())
            .ok_or(Error::EntryNotFound {
                key: branch,
                entry,
            })?;
        Ok(bincode::deserialize(bytes)?)
    }

    fn write_entry(&mut self, values: &[(&StorageKey, &Passenger)]) -> Result<()> {
        let index = self.entries as usize;
        for (key, passenger) in values {
            let branch = key.branch_name();
            let bytes = bincode::serialize(passenger)?;
            let column = self.column_mut(&branch, passenger.shape())?;
            // back-pad columns that appeared after earlier entries
            column.entries.resize(index, None);
            column.entries.push(Some(bytes));
        }
        self.entries += 1;
        debug!(entry = index, products = values.len(), "wrote durable record");
        Ok(())
    }

    fn entry_count(&self) -> u64 {
        self.entries
    }

    fn catalog(&self) -> Vec<(StorageKey, Shape)> {
        self.columns
            .iter()
            .map(|(branch, column)| (StorageKey::parse(branch), column.shape))
            .collect()
    }
}
