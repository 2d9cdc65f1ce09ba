//! Bare-name resolution across processing passes
//!
//! A reader that does not specify a pass is only satisfied when the
//! collection name is unique across every pass present. Ambiguity is never
//! silently resolved: an analysis must never guess which upstream pass
//! produced a value when two passes produced one under the same name.
//!
//! Successful resolutions are cached. The cache is valid only while no new
//! storage key has been created, so the bus invalidates it wholesale on
//! every key creation (correctness over cache hit rate).

use crate::catalog::ProductCatalog;
use beamline_core::{Error, Result, StorageKey};
use std::collections::HashMap;

/// Cache-backed resolver from bare collection name to unique storage key
#[derive(Debug, Default)]
pub struct NameResolver {
    cache: HashMap<String, StorageKey>,
}

impl NameResolver {
    /// Create a resolver with an empty cache
    pub fn new() -> Self {
        NameResolver {
            cache: HashMap::new(),
        }
    }

    /// Drop every cached resolution
    ///
    /// Must run whenever a new storage key is created; a stale entry would
    /// otherwise mask a newly introduced ambiguity.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Resolve a bare collection name to its unique storage key
    ///
    /// Scans the catalog on a cache miss. Zero matches is `ProductNotFound`;
    /// more than one is `ProductAmbiguous` naming every candidate pass.
    pub fn resolve(&mut self, collection: &str, catalog: &ProductCatalog) -> Result<StorageKey> {
        if let Some(key) = self.cache.get(collection) {
            return Ok(key.clone());
        }

        let matches: Vec<_> = catalog
            .list()
            .iter()
            .filter(|t| t.collection() == collection)
            .collect();

        match matches.as_slice() {
            [] => Err(Error::ProductNotFound {
                collection: collection.to_string(),
                pass: String::new(),
            }),
            [tag] => {
                let key = StorageKey::new(tag.collection(), tag.pass());
                self.cache.insert(collection.to_string(), key.clone());
                Ok(key)
            }
            many => Err(Error::ProductAmbiguous {
                collection: collection.to_string(),
                passes: many.iter().map(|t| t.pass().to_string()).collect(),
            }),
        }
    }

    /// Number of cached resolutions
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
