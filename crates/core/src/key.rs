//! Storage keys for the event bus
//!
//! A storage key identifies one distinct product in the event. It is the
//! pair of a collection name (chosen by the producing stage) and a pass name
//! (identifying which processing run produced it), rendered externally as
//! `"<collection>_<pass>"`.
//!
//! ## Contract
//!
//! - The separator `'_'` is reserved: collection names must never contain
//!   it. This is enforced at publish time; a violation is a naming error in
//!   the producing stage, not something a retry can fix.
//! - The event header is the one exception to the two-part rule: it is
//!   unique per event by construction, so its key is its collection name
//!   alone, with no pass suffix.

use crate::error::{Error, Result};
use crate::header::EventHeader;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved separator between collection and pass name
pub const SEPARATOR: char = '_';

/// Validate a collection name against the separator constraint
///
/// Called on the publish path. Lookups do not validate: a name containing
/// the separator simply never matches anything.
pub fn validate_collection_name(name: &str) -> Result<()> {
    if name.contains(SEPARATOR) {
        return Err(Error::IllegalName(name.to_string()));
    }
    Ok(())
}

/// Unique identifier for one stored product: collection name plus pass name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageKey {
    collection: String,
    pass: String,
}

impl StorageKey {
    /// Build a key from collection and pass names
    ///
    /// Does not validate the collection name; `validate_collection_name`
    /// runs on the publish path only.
    pub fn new(collection: impl Into<String>, pass: impl Into<String>) -> Self {
        StorageKey {
            collection: collection.into(),
            pass: pass.into(),
        }
    }

    /// The event-header key (single-part, no pass suffix)
    pub fn header() -> Self {
        StorageKey {
            collection: EventHeader::COLLECTION.to_string(),
            pass: String::new(),
        }
    }

    /// True iff this is the event-header key
    pub fn is_header(&self) -> bool {
        self.collection == EventHeader::COLLECTION
    }

    /// Collection name component
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Pass name component
    pub fn pass(&self) -> &str {
        &self.pass
    }

    /// Externally visible branch name: `"<collection>_<pass>"`, or the bare
    /// collection name when the pass is empty (the event header always is)
    pub fn branch_name(&self) -> String {
        if self.pass.is_empty() {
            self.collection.clone()
        } else {
            format!("{}{}{}", self.collection, SEPARATOR, self.pass)
        }
    }

    /// Recover a key from an externally visible branch name
    ///
    /// Splits at the first separator, mirroring how keys render. A name
    /// with no separator carries an empty pass, so `parse` and
    /// `branch_name` round-trip for every key.
    pub fn parse(branch: &str) -> Self {
        if branch == EventHeader::COLLECTION {
            return StorageKey::header();
        }
        match branch.split_once(SEPARATOR) {
            Some((collection, pass)) => StorageKey::new(collection, pass),
            None => StorageKey::new(branch, ""),
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.branch_name())
    }
}
