//! Beamline: event bus and product catalog for staged event-processing
//! pipelines
//!
//! One logical event at a time flows through a linear pipeline of stages.
//! Stages fetch named, typed inputs from the [`EventBus`] and publish named,
//! typed outputs back onto it; the bus handles lazy materialization from an
//! attached backing store, multi-pass name resolution, selective
//! persistence, and write-once-per-cycle protection.
//!
//! This crate is a facade over the workspace members:
//! - `beamline-core`: keys, values, passengers, tags, errors, the
//!   [`BackingStore`] trait
//! - `beamline-bus`: the bus, catalog, resolver, and drop filter
//! - `beamline-store`: the columnar store and the event-library writer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use beamline_bus::{DropFilter, EventBus, NameResolver, ProductCatalog};
pub use beamline_core::{
    validate_collection_name, BackingStore, Error, EventHeader, Passenger, ProductTag, Result,
    Shape, StorageKey, Value, SEPARATOR,
};
pub use beamline_store::{read_library, ColumnStore, LibraryWriter};
