//! Product catalog: the authoritative registry of discoverable products
//!
//! Append-only for the duration of one attached backing-store source; the
//! bus clears and rebuilds it when a new source is attached. External
//! tooling queries it through `search`, which takes case-insensitive,
//! POSIX-extended-style patterns where an empty pattern means "match all".

use beamline_core::{Error, ProductTag, Result};
use regex::{Regex, RegexBuilder};

/// Compile one pattern, case-insensitive, empty meaning match-all
///
/// Shared by catalog searches and drop-filter rules so both sides agree on
/// the pattern dialect.
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex> {
    let effective = if pattern.is_empty() { ".*" } else { pattern };
    RegexBuilder::new(effective)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Registry of every distinct product known for the current source
#[derive(Debug, Default)]
pub struct ProductCatalog {
    tags: Vec<ProductTag>,
}

impl ProductCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        ProductCatalog { tags: Vec::new() }
    }

    /// Append a tag; called exactly once per distinct storage key
    pub fn push(&mut self, tag: ProductTag) {
        self.tags.push(tag);
    }

    /// Forget everything; used when a new source is attached
    pub fn clear(&mut self) {
        self.tags.clear();
    }

    /// All known tags, in registration order
    pub fn list(&self) -> &[ProductTag] {
        &self.tags
    }

    /// Number of known tags
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// True iff no products are known
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Exact-match membership test for one (collection, pass) key
    pub fn contains(&self, collection: &str, pass: &str) -> bool {
        self.tags
            .iter()
            .any(|t| t.collection() == collection && t.pass() == pass)
    }

    /// All tags matching the given name/pass/type patterns
    ///
    /// Patterns are unanchored and case-insensitive; an empty pattern
    /// matches everything. Fails if any pattern does not compile.
    pub fn search(
        &self,
        name_pattern: &str,
        pass_pattern: &str,
        type_pattern: &str,
    ) -> Result<Vec<ProductTag>> {
        let name_re = compile_pattern(name_pattern)?;
        let pass_re = compile_pattern(pass_pattern)?;
        let type_re = compile_pattern(type_pattern)?;

        Ok(self
            .tags
            .iter()
            .filter(|t| {
                name_re.is_match(t.collection())
                    && pass_re.is_match(t.pass())
                    && type_re.is_match(t.type_name())
            })
            .cloned()
            .collect())
    }
}
