//! Product tags: catalog entries for distinct products
//!
//! A product tag is created exactly once per distinct storage key, the
//! first time that key is published or discovered in an attached source,
//! and is never mutated afterward. The full tag set for the currently open
//! source is the authoritative catalog of everything discoverable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable description of one distinct event product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTag {
    collection: String,
    pass: String,
    type_name: String,
}

impl ProductTag {
    /// Create a tag from collection, pass, and type names
    pub fn new(
        collection: impl Into<String>,
        pass: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        ProductTag {
            collection: collection.into(),
            pass: pass.into(),
            type_name: type_name.into(),
        }
    }

    /// Collection name given by the producing stage
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Pass name of the processing run that produced it
    pub fn pass(&self) -> &str {
        &self.pass
    }

    /// Name of the stored shape/type
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl fmt::Display for ProductTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (pass {}) {}", self.collection, self.pass, self.type_name)
    }
}
