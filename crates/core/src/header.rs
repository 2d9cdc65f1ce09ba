//! The event header, the one product present in every event
//!
//! The header rides the bus like any other passenger but its storage key is
//! its collection name alone (no pass suffix), because it is unique per
//! event by construction. It is re-derived eagerly on every cycle advance.

use crate::error::{Error, Result};
use crate::passenger::Passenger;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-event bookkeeping record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventHeader {
    /// Event number within the run
    pub event_number: i64,
    /// Run number this event belongs to
    pub run: i32,
    /// Unix timestamp of event creation, seconds
    pub timestamp: i64,
    /// Statistical weight of the event
    pub weight: f64,
}

impl Default for EventHeader {
    fn default() -> Self {
        EventHeader {
            event_number: 0,
            run: 0,
            timestamp: 0,
            weight: 1.0,
        }
    }
}

impl EventHeader {
    /// Collection name, used verbatim as the header's storage key
    pub const COLLECTION: &'static str = "EventHeader";

    /// Render the header as a single-shaped passenger for the bus
    pub fn to_passenger(&self) -> Passenger {
        let mut fields = BTreeMap::new();
        fields.insert("event_number".to_string(), Value::Int(self.event_number));
        fields.insert("run".to_string(), Value::Int(i64::from(self.run)));
        fields.insert("timestamp".to_string(), Value::Int(self.timestamp));
        fields.insert("weight".to_string(), Value::Float(self.weight));
        Passenger::Single(Value::Record(fields))
    }

    /// Rebuild a header from its passenger form
    ///
    /// Fails with a codec error if the passenger does not carry a header
    /// record; the header is the one product the bus always requires.
    pub fn from_passenger(passenger: &Passenger) -> Result<Self> {
        let record = passenger
            .as_single()
            .and_then(Value::as_record)
            .ok_or_else(|| Error::Codec("event header passenger is not a record".to_string()))?;

        let int_field = |name: &str| -> Result<i64> {
            record
                .get(name)
                .and_then(Value::as_int)
                .ok_or_else(|| Error::Codec(format!("event header missing field '{name}'")))
        };

        let weight = record
            .get("weight")
            .and_then(Value::as_float)
            .ok_or_else(|| Error::Codec("event header missing field 'weight'".to_string()))?;

        Ok(EventHeader {
            event_number: int_field("event_number")?,
            run: int_field("run")? as i32,
            timestamp: int_field("timestamp")?,
            weight,
        })
    }
}
