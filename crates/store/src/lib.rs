//! Backing-store adapters for the beamline event bus
//!
//! Two concrete stores implement the `BackingStore` seam:
//! - ColumnStore: entry-indexed columns per storage key, readable and
//!   writable, with whole-store file persistence
//! - LibraryWriter: append-only event-library sink with no read path
//!
//! The bus is agnostic to which one is attached; the caller picks.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod column;
pub mod library;

pub use column::ColumnStore;
pub use library::{read_library, LibraryWriter};
