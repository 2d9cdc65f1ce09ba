//! Drop filter: selective exclusion from durable persistence
//!
//! A key matching any registered rule is kept in memory for the current
//! pipeline stage but never wired to durable output. Rules accumulate and
//! are compiled once at registration; matching stops at the first hit.

use crate::catalog::compile_pattern;
use beamline_core::{Result, StorageKey};
use regex::Regex;
use tracing::debug;

/// Ordered set of compiled drop rules
#[derive(Debug, Default)]
pub struct DropFilter {
    rules: Vec<Regex>,
}

impl DropFilter {
    /// Create a filter with no rules
    pub fn new() -> Self {
        DropFilter { rules: Vec::new() }
    }

    /// Compile and register one rule
    ///
    /// Rules use the same compilation as catalog searches: case-insensitive,
    /// unanchored, empty matching everything. Fails with `InvalidPattern` on
    /// malformed input; rules accumulate, never replace.
    pub fn add_rule(&mut self, pattern: &str) -> Result<()> {
        let rule = compile_pattern(pattern)?;
        debug!(pattern, "registered drop rule");
        self.rules.push(rule);
        Ok(())
    }

    /// True iff the key should be excluded from durable output
    pub fn should_drop(&self, key: &StorageKey) -> bool {
        let branch = key.branch_name();
        self.rules.iter().any(|rule| rule.is_match(&branch))
    }

    /// Number of registered rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True iff no rules are registered
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
