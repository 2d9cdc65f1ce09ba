//! Core types and traits for the beamline event bus
//!
//! This crate defines the foundational types used throughout the system:
//! - StorageKey: Two-part collection/pass identifier for one event product
//! - Value: Unified element enum for all event data
//! - Passenger: Tagged union over the supported storage shapes
//! - ProductTag: Catalog entry describing one distinct product
//! - EventHeader: The one product present in every event
//! - Error: Error type hierarchy
//! - BackingStore: Trait seam to the durable, entry-indexed persistence layer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod header;
pub mod key;
pub mod passenger;
pub mod store;
pub mod tag;
pub mod value;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use header::EventHeader;
pub use key::{validate_collection_name, StorageKey, SEPARATOR};
pub use passenger::{Passenger, Shape};
pub use store::BackingStore;
pub use tag::ProductTag;
pub use value::Value;
