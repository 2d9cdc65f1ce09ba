//! Event bus for staged event-processing pipelines
//!
//! This crate provides the per-event, heterogeneous, typed key-value store
//! that pipeline stages read their inputs from and publish their outputs to:
//! - EventBus: storage slots, write-once-per-cycle tracking, lazy
//!   materialization from an attached backing store
//! - ProductCatalog: append-only registry of every distinct product
//! - NameResolver: bare-name lookup with a conservative cache
//! - DropFilter: pattern rules excluding keys from durable persistence

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bus;
pub mod catalog;
pub mod drop_filter;
pub mod resolver;

pub use bus::EventBus;
pub use catalog::ProductCatalog;
pub use drop_filter::DropFilter;
pub use resolver::NameResolver;
