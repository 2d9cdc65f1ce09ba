//! The event bus
//!
//! One bus instance carries all data for the event currently being
//! processed. Pipeline stages fetch zero or more inputs (lazily
//! materialized from the attached backing store), compute, then publish
//! zero or more outputs (subject to the drop filter and the
//! write-once-per-cycle check).
//!
//! ## Lifecycle
//!
//! - `attach` binds one backing store and rebuilds the product catalog from
//!   its key listing; `detach` releases it and clears all per-source state.
//! - `advance` steps the entry cursor and eagerly re-derives the event
//!   header, the one product required to be present in every event.
//! - `reset_cycle` runs between events: the written-this-cycle set is
//!   cleared and every passenger is reset to its shape's default value. The
//!   catalog, resolution cache, and store binding survive.
//!
//! ## Consistency
//!
//! Every operation checks its preconditions before mutating anything, so
//! the written set, catalog, and resolution cache reflect only fully
//! completed operations even when an error propagates out.

use crate::catalog::ProductCatalog;
use crate::drop_filter::DropFilter;
use crate::resolver::NameResolver;
use beamline_core::{
    validate_collection_name, BackingStore, Error, EventHeader, Passenger, ProductTag, Result,
    Shape, StorageKey, Value,
};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Storage slot for one key: the passenger plus its materialization state
#[derive(Debug)]
struct Slot {
    passenger: Passenger,
    /// Entry index the contents were materialized at; None forces a refresh
    /// on the next fetch of a readable slot
    loaded_entry: Option<u64>,
    /// Key exists in the attached source and refreshes from it
    readable: bool,
    /// Key participates in durable flushes (created locally, not dropped)
    wired: bool,
}

/// Per-event typed key-value store with lazy materialization
///
/// Strictly single-threaded by construction: one event cycle is fully
/// processed before the next `advance`, so no locking is involved anywhere.
pub struct EventBus {
    /// Default pass name stamped on products of this processing run
    pass_name: String,
    slots: BTreeMap<StorageKey, Slot>,
    written_this_cycle: HashSet<StorageKey>,
    catalog: ProductCatalog,
    resolver: NameResolver,
    drop_filter: DropFilter,
    source: Option<Box<dyn BackingStore>>,
    /// Entry cursor into the source; None before the first advance
    entry: Option<u64>,
    header: EventHeader,
}

impl EventBus {
    /// Create a bus for a processing run with the given default pass name
    pub fn new(pass_name: impl Into<String>) -> Self {
        EventBus {
            pass_name: pass_name.into(),
            slots: BTreeMap::new(),
            written_this_cycle: HashSet::new(),
            catalog: ProductCatalog::new(),
            resolver: NameResolver::new(),
            drop_filter: DropFilter::new(),
            source: None,
            entry: None,
            header: EventHeader::default(),
        }
    }

    /// Default pass name of this processing run
    pub fn pass_name(&self) -> &str {
        &self.pass_name
    }

    /// The current event header
    pub fn event_header(&self) -> &EventHeader {
        &self.header
    }

    /// Mutable access to the header, for drivers that generate events
    pub fn event_header_mut(&mut self) -> &mut EventHeader {
        &mut self.header
    }

    /// Event number from the current header
    pub fn event_number(&self) -> i64 {
        self.header.event_number
    }

    /// Statistical weight from the current header
    pub fn event_weight(&self) -> f64 {
        self.header.weight
    }

    /// Current entry cursor, if a cycle has begun
    pub fn current_entry(&self) -> Option<u64> {
        self.entry
    }

    /// All products known for the current source
    pub fn products(&self) -> &[ProductTag] {
        self.catalog.list()
    }

    // ========================================================================
    // Source lifecycle
    // ========================================================================

    /// Bind a backing store and rebuild the catalog from its key listing
    ///
    /// Any previously attached store must be released with `detach` first;
    /// all per-source state is rebuilt here.
    pub fn attach(&mut self, source: Box<dyn BackingStore>) {
        self.slots.clear();
        self.written_this_cycle.clear();
        self.resolver.invalidate();
        self.catalog.clear();
        self.entry = None;

        // the header is always discoverable, even for an empty source
        self.catalog
            .push(ProductTag::new(EventHeader::COLLECTION, "", Shape::Single.name()));
        for (key, shape) in source.catalog() {
            if key.is_header() {
                continue;
            }
            self.catalog
                .push(ProductTag::new(key.collection(), key.pass(), shape.name()));
        }

        info!(
            entries = source.entry_count(),
            products = self.catalog.len(),
            "attached backing store"
        );
        self.source = Some(source);
    }

    /// Release the backing store and clear all per-source state
    ///
    /// Used when moving to a new input source with potentially different
    /// entry addressing. Returns the store so the caller can close or
    /// inspect it.
    pub fn detach(&mut self) -> Option<Box<dyn BackingStore>> {
        self.slots.clear();
        self.written_this_cycle.clear();
        self.resolver.invalidate();
        self.catalog.clear();
        self.entry = None;
        info!("detached backing store");
        self.source.take()
    }

    /// Register a drop rule; matching keys stay fetchable but are never
    /// flushed to durable output
    pub fn add_drop_rule(&mut self, pattern: &str) -> Result<()> {
        self.drop_filter.add_rule(pattern)
    }

    // ========================================================================
    // Cycle control
    // ========================================================================

    /// Step to the next event
    ///
    /// With a readable source attached, moves the entry cursor forward,
    /// eagerly re-derives the event header from the new entry, and returns
    /// false once the source is exhausted. Without a readable source
    /// (generation mode), only the cursor moves; the driver owns the header.
    pub fn advance(&mut self) -> Result<bool> {
        let next = self.entry.map_or(0, |e| e + 1);

        let readable = self.source.as_ref().is_some_and(|s| s.is_readable());
        if !readable {
            self.entry = Some(next);
            return Ok(true);
        }

        let source = match self.source.as_ref() {
            Some(s) => s,
            None => return Ok(true),
        };
        if next >= source.entry_count() {
            debug!(entry = next, "end of input reached");
            return Ok(false);
        }

        let key = StorageKey::header();
        let passenger = source.read_entry(&key, next)?;
        self.header = EventHeader::from_passenger(&passenger)?;
        self.entry = Some(next);

        match self.slots.get_mut(&key) {
            Some(slot) => {
                slot.passenger = passenger;
                slot.loaded_entry = Some(next);
                slot.readable = true;
            }
            None => {
                self.slots.insert(
                    key,
                    Slot {
                        passenger,
                        loaded_entry: Some(next),
                        readable: true,
                        wired: false,
                    },
                );
            }
        }

        debug!(entry = next, event = self.header.event_number, "advanced to next event");
        Ok(true)
    }

    /// Prepare for the next cycle
    ///
    /// Clears the written-this-cycle set and resets every passenger to its
    /// shape's default value. Slots, catalog registrations, the resolution
    /// cache, and the store binding all survive.
    pub fn reset_cycle(&mut self) {
        self.written_this_cycle.clear();
        for slot in self.slots.values_mut() {
            slot.passenger.clear();
            slot.loaded_entry = None;
        }
    }

    /// Flush the current cycle as one durable record
    ///
    /// Publishes the event header first if it was neither read from the
    /// source nor already produced this cycle, then hands every wired,
    /// non-dropped passenger to the store. A bus with no store attached,
    /// or a cycle with nothing wired, flushes no record at all.
    pub fn write_cycle(&mut self) -> Result<()> {
        let header_key = StorageKey::header();
        let header_from_source = self
            .slots
            .get(&header_key)
            .is_some_and(|slot| slot.readable);
        if !header_from_source && !self.written_this_cycle.contains(&header_key) {
            let passenger = self.header.to_passenger();
            self.publish(EventHeader::COLLECTION, "", passenger)?;
        }

        let store = match self.source.as_mut() {
            Some(s) => s,
            None => {
                debug!("no backing store attached; nothing flushed");
                return Ok(());
            }
        };

        let values: Vec<(&StorageKey, &Passenger)> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.wired)
            .map(|(key, slot)| (key, &slot.passenger))
            .collect();
        if values.is_empty() {
            debug!("nothing wired this cycle; no record flushed");
            return Ok(());
        }
        debug!(products = values.len(), "flushing event cycle");
        store.write_entry(&values)
    }

    // ========================================================================
    // Publish
    // ========================================================================

    /// Publish a product under an explicit pass name
    ///
    /// The first publish of a storage key allocates its slot, appends a
    /// product tag, wires the key for durable output (unless a drop rule
    /// matches), and invalidates the name-resolution cache. Later publishes
    /// must carry the same shape. A second publish of the same key within
    /// one cycle is fatal: that is the mechanism preventing a later stage
    /// from silently overwriting an earlier stage's output.
    pub fn publish(
        &mut self,
        collection: &str,
        pass: &str,
        value: impl Into<Passenger>,
    ) -> Result<()> {
        let mut passenger = value.into();

        let key = if collection == EventHeader::COLLECTION {
            StorageKey::header()
        } else {
            validate_collection_name(collection)?;
            StorageKey::new(collection, pass)
        };

        if self.written_this_cycle.contains(&key) {
            return Err(Error::ProductExists {
                collection: collection.to_string(),
                pass: key.pass().to_string(),
            });
        }

        passenger.canonicalize();
        let cursor = self.entry.unwrap_or(0);

        match self.slots.get_mut(&key) {
            Some(slot) => {
                if slot.passenger.shape() != passenger.shape() {
                    return Err(Error::TypeMismatch {
                        key: key.branch_name(),
                        stored: slot.passenger.shape(),
                        requested: passenger.shape(),
                    });
                }
                // first local publish of a source-materialized key wires it
                // for durable output, exactly like a freshly created key;
                // whether the key was fetched before being published must
                // not change what the flushed record contains
                if !slot.wired && !self.drop_filter.should_drop(&key) {
                    if let Some(store) = self.source.as_mut() {
                        store.bind(&key, passenger.shape())?;
                    }
                    slot.wired = true;
                }
                slot.passenger = passenger;
                slot.loaded_entry = Some(cursor);
            }
            None => {
                // first time this storage key has ever been created
                let dropped = self.drop_filter.should_drop(&key);
                if !dropped {
                    if let Some(store) = self.source.as_mut() {
                        store.bind(&key, passenger.shape())?;
                    }
                }
                self.catalog.push(ProductTag::new(
                    key.collection(),
                    key.pass(),
                    passenger.type_name(),
                ));
                self.resolver.invalidate();
                debug!(key = %key, shape = %passenger.shape(), dropped, "allocated passenger slot");
                self.slots.insert(
                    key.clone(),
                    Slot {
                        passenger,
                        loaded_entry: Some(cursor),
                        readable: false,
                        wired: !dropped,
                    },
                );
            }
        }

        self.written_this_cycle.insert(key);
        Ok(())
    }

    /// Publish under this run's default pass name
    pub fn publish_default(&mut self, collection: &str, value: impl Into<Passenger>) -> Result<()> {
        let pass = self.pass_name.clone();
        self.publish(collection, &pass, value)
    }

    // ========================================================================
    // Fetch
    // ========================================================================

    /// Fetch the passenger for a collection
    ///
    /// An empty pass name engages bare-name resolution: the lookup succeeds
    /// only when exactly one pass has produced the collection. Slots not yet
    /// materialized are loaded from the attached source at the current
    /// entry; already materialized slots refresh when their loaded entry is
    /// stale. Repeated fetches at the same entry return the same value.
    pub fn fetch(&mut self, collection: &str, pass: &str) -> Result<&Passenger> {
        let key = self.resolve_key(collection, pass)?;
        self.load_slot(&key, collection, pass)?;
        self.slots
            .get(&key)
            .map(|slot| &slot.passenger)
            .ok_or_else(|| Error::ProductNotFound {
                collection: collection.to_string(),
                pass: pass.to_string(),
            })
    }

    /// Fetch a single-shaped product, shape-checked
    pub fn fetch_single(&mut self, collection: &str, pass: &str) -> Result<&Value> {
        let passenger = self.fetch(collection, pass)?;
        match passenger {
            Passenger::Single(value) => Ok(value),
            other => Err(shape_error(collection, pass, other.shape(), Shape::Single)),
        }
    }

    /// Fetch a sequence-shaped product, shape-checked
    pub fn fetch_sequence(&mut self, collection: &str, pass: &str) -> Result<&[Value]> {
        let passenger = self.fetch(collection, pass)?;
        match passenger {
            Passenger::Sequence(values) => Ok(values),
            other => Err(shape_error(collection, pass, other.shape(), Shape::Sequence)),
        }
    }

    /// Fetch a mapping-shaped product, shape-checked
    pub fn fetch_mapping(
        &mut self,
        collection: &str,
        pass: &str,
    ) -> Result<&BTreeMap<String, Value>> {
        let passenger = self.fetch(collection, pass)?;
        match passenger {
            Passenger::Mapping(map) => Ok(map),
            other => Err(shape_error(collection, pass, other.shape(), Shape::Mapping)),
        }
    }

    /// True iff exactly one catalog entry matches
    ///
    /// Delegates to the same resolution rule as `fetch`; ambiguity counts
    /// as "not uniquely existing" and yields false rather than an error.
    pub fn exists(&mut self, collection: &str, pass: &str) -> bool {
        if collection == EventHeader::COLLECTION {
            // the header's key has no pass; an explicit one matches nothing
            return pass.is_empty() && self.catalog.contains(EventHeader::COLLECTION, "");
        }
        if pass.is_empty() {
            self.resolver.resolve(collection, &self.catalog).is_ok()
        } else {
            self.catalog.contains(collection, pass)
        }
    }

    /// All products matching the given name/pass/type patterns
    ///
    /// Patterns are case-insensitive and unanchored; empty matches all.
    pub fn search_products(
        &self,
        name_pattern: &str,
        pass_pattern: &str,
        type_pattern: &str,
    ) -> Result<Vec<ProductTag>> {
        self.catalog.search(name_pattern, pass_pattern, type_pattern)
    }

    /// Log a summary of materialized passengers
    ///
    /// Only slots already loaded into memory appear, so what is printed
    /// depends on when this runs; after `reset_cycle` everything is empty.
    pub fn print(&self, verbosity: i32) {
        info!(
            passengers = self.slots.len(),
            products = self.catalog.len(),
            "event bus contents"
        );
        if verbosity > 1 {
            for (key, slot) in &self.slots {
                info!(
                    key = %key,
                    shape = %slot.passenger.shape(),
                    len = slot.passenger.len(),
                    wired = slot.wired,
                    "passenger"
                );
            }
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Compute the storage key for a lookup, through the resolver when no
    /// pass is given
    fn resolve_key(&mut self, collection: &str, pass: &str) -> Result<StorageKey> {
        if collection == EventHeader::COLLECTION {
            return Ok(StorageKey::header());
        }
        if !pass.is_empty() {
            return Ok(StorageKey::new(collection, pass));
        }
        self.resolver.resolve(collection, &self.catalog)
    }

    /// Ensure the slot for a key is materialized and current
    fn load_slot(&mut self, key: &StorageKey, collection: &str, pass: &str) -> Result<()> {
        let cursor = self.entry.unwrap_or(0);

        if let Some(slot) = self.slots.get_mut(key) {
            if slot.readable && slot.loaded_entry != Some(cursor) {
                if let Some(store) = self.source.as_ref() {
                    slot.passenger = store.read_entry(key, cursor)?;
                    slot.loaded_entry = Some(cursor);
                }
            }
            return Ok(());
        }

        let store = match self.source.as_ref() {
            Some(s) => s,
            None => {
                // nothing loaded and no source: no hope of finding it
                return Err(Error::ProductNotFound {
                    collection: collection.to_string(),
                    pass: pass.to_string(),
                });
            }
        };

        let passenger = match store.read_entry(key, cursor) {
            Ok(p) => p,
            Err(Error::KeyUnknown(_)) | Err(Error::EntryNotFound { .. }) | Err(Error::WriteOnly) => {
                return Err(Error::ProductNotFound {
                    collection: collection.to_string(),
                    pass: pass.to_string(),
                });
            }
            Err(e) => return Err(e),
        };
        debug!(key = %key, entry = cursor, "materialized passenger from source");
        self.slots.insert(
            key.clone(),
            Slot {
                passenger,
                loaded_entry: Some(cursor),
                readable: true,
                wired: false,
            },
        );
        Ok(())
    }
}

fn shape_error(collection: &str, pass: &str, stored: Shape, requested: Shape) -> Error {
    let key = if collection == EventHeader::COLLECTION {
        StorageKey::header()
    } else {
        StorageKey::new(collection, pass)
    };
    Error::TypeMismatch {
        key: key.branch_name(),
        stored,
        requested,
    }
}
