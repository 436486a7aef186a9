//! The record abstraction stored by a [`ClassList`](super::ClassList).
//!
//! A record is a plain value with a fixed set of named fields. Records are
//! never edited in place by a collection: field updates rebuild the record
//! from its serialised fields so that every record-level invariant runs again.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Debug;

use crate::models::RecordError;

/// Field map used to build or update a record by field name.
pub type Fields = Map<String, Value>;

/// A value that can live in a [`ClassList`](super::ClassList).
pub trait Record: Clone + Debug + PartialEq + Serialize + DeserializeOwned {
    /// Every kind this record type can take. The first entry is the default
    /// kind used when a collection is created without one.
    const KINDS: &'static [&'static str];

    /// Prefix for generated names, e.g. `"New Parameter"`.
    const DEFAULT_NAME: &'static str;

    /// The kind of this particular value.
    fn kind(&self) -> &'static str;

    /// The display name, if the record carries one.
    fn name(&self) -> Option<&str>;

    /// Every text field as `(field, value)`; list fields yield one pair per entry.
    fn text_fields(&self) -> Vec<(&'static str, &str)>;

    /// Replace `old` by `new` in `field` (every matching entry for list
    /// fields). Returns whether anything changed.
    fn replace_text(&mut self, field: &str, old: &str, new: &str) -> bool;

    /// Check (and normalise) the record's own invariants.
    fn validated(self) -> Result<Self, RecordError> {
        Ok(self)
    }

    /// Hook run by `set_fields` and `update_with` after the edited record is
    /// built, before validation. `overrides` holds only the fields the caller
    /// supplied or changed.
    fn reconcile(&mut self, _previous: &Self, _overrides: &Fields) {}

    /// Deserialise a record of `kind` from a field map without validating it.
    fn parse_fields(kind: &str, fields: Fields) -> Result<Self, RecordError> {
        serde_json::from_value(Value::Object(fields)).map_err(|err| RecordError::InvalidFields {
            kind: kind.to_string(),
            message: err.to_string(),
        })
    }

    /// Build a validated record of `kind` from a field map.
    fn from_fields(kind: &str, fields: Fields) -> Result<Self, RecordError> {
        Self::parse_fields(kind, fields)?.validated()
    }

    /// Serialise the record into a field map.
    fn to_fields(&self) -> Result<Fields, RecordError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(RecordError::InvalidFields {
                kind: self.kind().to_string(),
                message: "record did not serialise to an object".to_string(),
            }),
            Err(err) => Err(RecordError::InvalidFields {
                kind: self.kind().to_string(),
                message: err.to_string(),
            }),
        }
    }
}

/// Case-insensitive name comparison used by every lookup in the crate.
pub fn names_match(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}
