//! Event-library writer
//!
//! Append-only sink modeled on physics event-library output: each flushed
//! cycle becomes one framed record in the file, and nothing is ever read
//! back during the run. Attaching this store puts the bus in generation
//! mode (`is_readable` is false), so the run driver owns the event header.

use beamline_core::{BackingStore, Error, Passenger, Result, Shape, StorageKey};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Write-only backing store appending one record per event cycle
#[derive(Debug)]
pub struct LibraryWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    bound: BTreeSet<String>,
    records: u64,
}

impl LibraryWriter {
    /// Create (truncate) the output file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        info!(path = %path.display(), "created event library");
        Ok(LibraryWriter {
            writer: BufWriter::new(file),
            path,
            bound: BTreeSet::new(),
            records: 0,
        })
    }

    /// Path of the output file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records written so far
    pub fn records_written(&self) -> u64 {
        self.records
    }
}

impl BackingStore for LibraryWriter {
    fn bind(&mut self, key: &StorageKey, _shape: Shape) -> Result<()> {
        debug!(key = %key, "bound for library output");
        self.bound.insert(key.branch_name());
        Ok(())
    }

    fn read_entry(&self, _key: &StorageKey, _entry: u64) -> Result<Passenger> {
        Err(Error::WriteOnly)
    }

    fn write_entry(&mut self, values: &[(&StorageKey, &Passenger)]) -> Result<()> {
        let record: Vec<(String, &Passenger)> = values
            .iter()
            .map(|(key, passenger)| (key.branch_name(), *passenger))
            .collect();
        bincode::serialize_into(&mut self.writer, &record)?;
        self.writer.flush()?;
        self.records += 1;
        debug!(record = self.records, products = record.len(), "wrote library record");
        Ok(())
    }

    fn entry_count(&self) -> u64 {
        0
    }

    fn is_readable(&self) -> bool {
        false
    }

    fn catalog(&self) -> Vec<(StorageKey, Shape)> {
        Vec::new()
    }
}

/// Decode every record of an event-library file
///
/// Offline inspection utility; the writer itself never reads.
pub fn read_library(path: impl AsRef<Path>) -> Result<Vec<Vec<(String, Passenger)>>> {
    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);
    let mut records = Vec::new();
    loop {
        match bincode::deserialize_from::<_, Vec<(String, Passenger)>>(&mut reader) {
            Ok(record) => records.push(record),
            Err(e) => {
                // clean EOF between frames ends the file
                if let bincode::ErrorKind::Io(io) = &*e {
                    if io.kind() == ErrorKind::UnexpectedEof {
                        break;
                    }
                }
                return Err(e.into());
            }
        }
    }
    Ok(records)
}
