//! Integration tests
//!
//! Cross-crate tests driving the bus the way a run driver would:
//! - pipeline: produce/analyze loops, multi-pass resolution, drop rules
//! - persistence: one run's output becoming the next run's input

#[path = "../common/mod.rs"]
mod common;

mod persistence;
mod pipeline;
