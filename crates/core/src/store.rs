//! Backing store abstraction
//!
//! This trait is the narrow seam between the event bus and whatever durable,
//! entry-indexed persistence layer sits behind it. The bus is agnostic to
//! the concrete store; the caller constructs one and hands it to the bus
//! (explicit dependency injection, no process-wide factory registration).
//!
//! One durable record is written per event cycle; each record carries one
//! sub-record per bound, non-dropped storage key. Whether a key is dropped
//! is the bus's concern: it simply never binds dropped keys.

use crate::error::Result;
use crate::key::StorageKey;
use crate::passenger::{Passenger, Shape};

/// Durable, entry-indexed persistence layer behind the event bus
pub trait BackingStore {
    /// Register a storage key for durable output
    ///
    /// The shape is fixed at bind time; rebinding with a different shape is
    /// an error.
    fn bind(&mut self, key: &StorageKey, shape: Shape) -> Result<()>;

    /// Retrieve the record for a key at a given entry
    ///
    /// Fails if the key is unknown, the entry is out of range, or the store
    /// is write-only.
    fn read_entry(&self, key: &StorageKey, entry: u64) -> Result<Passenger>;

    /// Flush the given passengers as one durable record
    ///
    /// The bus passes the current value of every bound, non-dropped key.
    fn write_entry(&mut self, values: &[(&StorageKey, &Passenger)]) -> Result<()>;

    /// Number of complete records available for reading
    fn entry_count(&self) -> u64;

    /// Whether this store serves reads at all
    ///
    /// Write-only sinks report false; the bus then treats cycle advance as
    /// event generation (the driver supplies the header) instead of
    /// consuming entries.
    fn is_readable(&self) -> bool {
        true
    }

    /// List every key the store knows, with its shape
    ///
    /// Used by the bus to rebuild the product catalog when a source is
    /// attached.
    fn catalog(&self) -> Vec<(StorageKey, Shape)>;
}
