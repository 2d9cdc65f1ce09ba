//! Error types for the beamline event bus
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! Every variant is fatal to the operation that raised it; nothing here is
//! retried. The pipeline model assumes correctness bugs, not transient
//! faults, so a run driver either skips the current event or aborts the run.

use crate::passenger::Shape;
use std::io;
use thiserror::Error;

/// Result type alias for event bus operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the event bus and its backing stores
#[derive(Debug, Error)]
pub enum Error {
    /// Collection name violates the reserved-separator constraint
    #[error("illegal product name '{0}': collection names must not contain '_'")]
    IllegalName(String),

    /// A storage key was published twice in one event cycle
    #[error("a product named '{collection}' (pass '{pass}') has already been produced this cycle")]
    ProductExists {
        /// Collection name of the offending product
        collection: String,
        /// Pass name of the offending product
        pass: String,
    },

    /// A publish or fetch supplied/requested a shape incompatible with the
    /// stored passenger
    #[error("type mismatch for '{key}': stored shape is {stored}, not {requested}")]
    TypeMismatch {
        /// Branch name of the storage key
        key: String,
        /// Shape already stored under the key
        stored: Shape,
        /// Shape supplied or requested by the caller
        requested: Shape,
    },

    /// Fetch or exists found zero candidates
    #[error("no product found for name '{collection}' and pass '{pass}'")]
    ProductNotFound {
        /// Collection name that was looked up
        collection: String,
        /// Pass name that was looked up (empty means "any")
        pass: String,
    },

    /// Fetch found more than one candidate without an explicit pass
    #[error(
        "multiple products found for name '{collection}' without specified pass name ({})",
        .passes.join(", ")
    )]
    ProductAmbiguous {
        /// Collection name that was looked up
        collection: String,
        /// Every pass name that produced this collection
        passes: Vec<String>,
    },

    /// A drop rule or search pattern failed to compile
    #[error("the pattern '{pattern}' is not a valid regex: {reason}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Compiler diagnostic
        reason: String,
    },

    /// Requested entry is outside the backing store's record range
    #[error("entry {entry} is out of range for key '{key}'")]
    EntryNotFound {
        /// Branch name of the storage key
        key: String,
        /// Requested entry index
        entry: u64,
    },

    /// Storage key is unknown to the backing store
    #[error("key '{0}' is not present in the backing store")]
    KeyUnknown(String),

    /// Read attempted against a write-only backing store
    #[error("backing store is write-only and cannot serve reads")]
    WriteOnly,

    /// I/O error from a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("codec error: {0}")]
    Codec(String),
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Codec(e.to_string())
    }
}
