//! Passengers: in-memory values stored on the event bus
//!
//! A passenger is the value currently held for one storage key, tagged with
//! one of a closed set of shapes: a single object, an ordered sequence, or a
//! name-to-value mapping. The shape is fixed the first time a key is
//! created; later writes under the same key must carry the same shape.
//!
//! The shape set being a plain enum means every read/write/clear site
//! matches exhaustively and a mismatch surfaces as an error value, never as
//! a silent conversion.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Discriminant for the closed set of supported passenger shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    /// One individual object
    Single,
    /// Ordered sequence of elements, canonically sorted before storage
    Sequence,
    /// Name-to-value mapping
    Mapping,
}

impl Shape {
    /// Shape name as recorded in product tags
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Single => "single",
            Shape::Sequence => "sequence",
            Shape::Mapping => "mapping",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// In-memory value for one storage key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Passenger {
    /// One individual object
    Single(Value),
    /// Ordered sequence of elements
    Sequence(Vec<Value>),
    /// Name-to-value mapping
    Mapping(BTreeMap<String, Value>),
}

impl Passenger {
    /// Shape tag of this passenger
    pub fn shape(&self) -> Shape {
        match self {
            Passenger::Single(_) => Shape::Single,
            Passenger::Sequence(_) => Shape::Sequence,
            Passenger::Mapping(_) => Shape::Mapping,
        }
    }

    /// Type name recorded in the product catalog
    pub fn type_name(&self) -> &'static str {
        self.shape().name()
    }

    /// Sort sequence contents into the canonical order
    ///
    /// Single and mapping passengers are stored as-is (mappings are already
    /// ordered by key).
    pub fn canonicalize(&mut self) {
        match self {
            Passenger::Sequence(values) => values.sort_by(|a, b| a.canonical_cmp(b)),
            Passenger::Single(_) | Passenger::Mapping(_) => {}
        }
    }

    /// Reset the contained value to the shape's default, keeping the shape
    ///
    /// Runs between event cycles. The slot and its catalog registration
    /// survive; only the contents are emptied.
    pub fn clear(&mut self) {
        match self {
            Passenger::Single(value) => *value = Value::Null,
            Passenger::Sequence(values) => values.clear(),
            Passenger::Mapping(map) => map.clear(),
        }
    }

    /// Number of contained elements (1 for a single object)
    pub fn len(&self) -> usize {
        match self {
            Passenger::Single(_) => 1,
            Passenger::Sequence(values) => values.len(),
            Passenger::Mapping(map) => map.len(),
        }
    }

    /// True iff the contained value is the shape's default
    pub fn is_empty(&self) -> bool {
        match self {
            Passenger::Single(value) => value.is_null(),
            Passenger::Sequence(values) => values.is_empty(),
            Passenger::Mapping(map) => map.is_empty(),
        }
    }

    /// Get the contained object if single-shaped
    pub fn as_single(&self) -> Option<&Value> {
        match self {
            Passenger::Single(value) => Some(value),
            _ => None,
        }
    }

    /// Get the contained elements if sequence-shaped
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Passenger::Sequence(values) => Some(values),
            _ => None,
        }
    }

    /// Get the contained map if mapping-shaped
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Passenger::Mapping(map) => Some(map),
            _ => None,
        }
    }
}

impl From<Value> for Passenger {
    fn from(value: Value) -> Self {
        Passenger::Single(value)
    }
}

impl From<Vec<Value>> for Passenger {
    fn from(values: Vec<Value>) -> Self {
        Passenger::Sequence(values)
    }
}

impl From<BTreeMap<String, Value>> for Passenger {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Passenger::Mapping(map)
    }
}
