//! ClassList implementation
//!
//! Storage is a plain insertion-ordered `Vec`; the collections held by a
//! project are small enough that a linear, case-insensitive name scan is
//! cheaper than keeping a second index in sync.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use thiserror::Error;

use crate::classlist::record::{names_match, Fields, Record};
use crate::models::RecordError;

/// Errors raised by a [`ClassList`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollectionError {
    #[error("expected records of kind \"{expected}\", but found \"{found}\"")]
    WrongKind { expected: String, found: String },

    #[error("unknown record kind \"{kind}\"; expected one of: {expected}")]
    UnknownKind { kind: String, expected: String },

    #[error("the record kind of this collection is not yet known, so a record cannot be built from fields")]
    KindNotKnown,

    #[error("input contains records with the same value of the name field: {}", .names.join(", "))]
    DuplicateNames { names: Vec<String> },

    #[error("no record named \"{name}\" in the collection")]
    NameNotFound { name: String },

    #[error("record is not in the collection")]
    RecordNotFound,

    #[error("index {index} is out of range for a collection of {len} records")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// An ordered collection of records of one kind, addressed by name or position.
///
/// Two collections are equal when they hold the same kind and equal records
/// in the same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    try_from = "RawClassList<T>",
    bound(serialize = "T: Record", deserialize = "T: Record")
)]
pub struct ClassList<T> {
    data: Vec<T>,

    /// Kind shared by every record, once known
    class_handle: Option<String>,

    /// Counter behind generated default names
    #[serde(skip)]
    name_counter: usize,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Record"))]
struct RawClassList<T> {
    data: Vec<T>,
    #[serde(default)]
    class_handle: Option<String>,
}

impl<T: Record> TryFrom<RawClassList<T>> for ClassList<T> {
    type Error = CollectionError;

    fn try_from(raw: RawClassList<T>) -> Result<Self, Self::Error> {
        let mut list = match raw.class_handle {
            Some(kind) => Self::of_kind(&kind)?,
            None => Self::new(),
        };
        list.extend(raw.data)?;
        Ok(list)
    }
}

impl<T: PartialEq> PartialEq for ClassList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.class_handle == other.class_handle && self.data == other.data
    }
}

impl<T: Record> Default for ClassList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> ClassList<T> {
    /// Create an empty collection whose kind is fixed by the first record
    /// inserted. Record types with a single kind know it immediately.
    pub fn new() -> Self {
        let class_handle = match T::KINDS {
            [only] => Some(only.to_string()),
            _ => None,
        };
        Self {
            data: Vec::new(),
            class_handle,
            name_counter: 0,
        }
    }

    /// Create an empty collection declared up front to hold `kind`.
    pub fn of_kind(kind: &str) -> Result<Self, CollectionError> {
        let kind = T::KINDS
            .iter()
            .find(|candidate| **candidate == kind)
            .ok_or_else(|| CollectionError::UnknownKind {
                kind: kind.to_string(),
                expected: T::KINDS.join(", "),
            })?;
        Ok(Self {
            data: Vec::new(),
            class_handle: Some(kind.to_string()),
            name_counter: 0,
        })
    }

    /// Create a collection from existing records.
    ///
    /// # Errors
    ///
    /// Fails if the records are of mixed kinds or share a name.
    pub fn from_records(records: Vec<T>) -> Result<Self, CollectionError> {
        let mut list = Self::new();
        list.extend(records)?;
        Ok(list)
    }

    /// Build from records already known to be valid, of `kind` and uniquely
    /// named.
    pub(crate) fn from_trusted(kind: &str, data: Vec<T>) -> Self {
        Self {
            data,
            class_handle: Some(kind.to_string()),
            name_counter: 0,
        }
    }

    /// Kind shared by every record, or `None` while still undetermined.
    pub fn class_handle(&self) -> Option<&str> {
        self.class_handle.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Record at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    /// Record named `name` (ignoring case), if any.
    pub fn get_by_name(&self, name: &str) -> Option<&T> {
        self.position(name).map(|index| &self.data[index])
    }

    /// Whether a record is named `name` (ignoring case).
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.data
            .iter()
            .position(|record| record.name().is_some_and(|n| names_match(n, name)))
    }

    /// Append a record.
    ///
    /// # Errors
    ///
    /// * [`CollectionError::WrongKind`] if the record's kind differs from the
    ///   collection's
    /// * [`CollectionError::DuplicateNames`] if the name is already taken
    pub fn append(&mut self, record: T) -> Result<(), CollectionError> {
        let at = self.data.len();
        self.insert(at, record)
    }

    /// Build a record of the collection's kind from `fields` and append it.
    ///
    /// A missing `name` is filled with a generated default name.
    pub fn append_fields(&mut self, fields: Fields) -> Result<(), CollectionError> {
        let record = self.build(fields)?;
        self.append(record)
    }

    /// Insert a record at `index`; indices past the end append.
    pub fn insert(&mut self, index: usize, record: T) -> Result<(), CollectionError> {
        self.check_kind(&record)?;
        let record = record.validated()?;
        let duplicates = duplicate_names(self.data.iter().chain(std::iter::once(&record)));
        if !duplicates.is_empty() {
            return Err(CollectionError::DuplicateNames { names: duplicates });
        }

        if self.class_handle.is_none() {
            self.class_handle = Some(record.kind().to_string());
        }
        let index = index.min(self.data.len());
        self.data.insert(index, record);
        Ok(())
    }

    /// Build a record from `fields` and insert it at `index`.
    pub fn insert_fields(&mut self, index: usize, fields: Fields) -> Result<(), CollectionError> {
        let record = self.build(fields)?;
        self.insert(index, record)
    }

    /// Remove and return the record named `name` (ignoring case).
    pub fn remove(&mut self, name: &str) -> Result<T, CollectionError> {
        let index = self
            .position(name)
            .ok_or_else(|| CollectionError::NameNotFound {
                name: name.to_string(),
            })?;
        Ok(self.data.remove(index))
    }

    /// Remove and return the first record equal to `record`.
    pub fn remove_record(&mut self, record: &T) -> Result<T, CollectionError> {
        let index = self
            .data
            .iter()
            .position(|candidate| candidate == record)
            .ok_or(CollectionError::RecordNotFound)?;
        Ok(self.data.remove(index))
    }

    /// Remove and return the record at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<T, CollectionError> {
        self.check_index(index)?;
        Ok(self.data.remove(index))
    }

    /// Number of records named `name` (ignoring case); at most one.
    pub fn count(&self, name: &str) -> usize {
        self.data
            .iter()
            .filter(|record| record.name().is_some_and(|n| names_match(n, name)))
            .count()
    }

    /// Number of records equal to `record`.
    pub fn count_record(&self, record: &T) -> usize {
        self.data.iter().filter(|candidate| *candidate == record).count()
    }

    /// Position of the record named `name`; 1-based when `offset` is set,
    /// which is the convention of the numerical engine.
    pub fn index(&self, name: &str, offset: bool) -> Result<usize, CollectionError> {
        self.position(name)
            .map(|index| index + usize::from(offset))
            .ok_or_else(|| CollectionError::NameNotFound {
                name: name.to_string(),
            })
    }

    /// Position of the first record equal to `record`.
    pub fn index_of_record(&self, record: &T, offset: bool) -> Result<usize, CollectionError> {
        self.data
            .iter()
            .position(|candidate| candidate == record)
            .map(|index| index + usize::from(offset))
            .ok_or(CollectionError::RecordNotFound)
    }

    /// Append every record, or none of them.
    ///
    /// Kinds and names are checked against the combined collection, so a new
    /// record can collide with an existing one or with another new one.
    pub fn extend<I>(&mut self, records: I) -> Result<(), CollectionError>
    where
        I: IntoIterator<Item = T>,
    {
        let records = records
            .into_iter()
            .map(Record::validated)
            .collect::<Result<Vec<T>, RecordError>>()?;
        let expected = self
            .class_handle
            .clone()
            .or_else(|| records.first().map(|record| record.kind().to_string()));
        if let Some(expected) = &expected {
            if let Some(bad) = records.iter().find(|record| record.kind() != expected) {
                return Err(CollectionError::WrongKind {
                    expected: expected.clone(),
                    found: bad.kind().to_string(),
                });
            }
        }

        let duplicates = duplicate_names(self.data.iter().chain(records.iter()));
        if !duplicates.is_empty() {
            return Err(CollectionError::DuplicateNames { names: duplicates });
        }

        self.class_handle = expected;
        self.data.extend(records);
        Ok(())
    }

    /// Replace the record at `index` with one rebuilt from its own fields
    /// overridden by `overrides`.
    ///
    /// The record is reconstructed rather than edited, so every record-level
    /// invariant is checked again.
    pub fn set_fields(&mut self, index: usize, overrides: Fields) -> Result<(), CollectionError> {
        self.check_index(index)?;
        let previous = &self.data[index];
        let mut fields = previous.to_fields()?;
        for (key, value) in &overrides {
            fields.insert(key.clone(), value.clone());
        }

        let mut rebuilt = T::parse_fields(previous.kind(), fields)?;
        rebuilt.reconcile(previous, &overrides);
        let rebuilt = rebuilt.validated()?;
        self.replace_at(index, rebuilt)
    }

    /// Typed counterpart of [`set_fields`](Self::set_fields): edit a copy of
    /// the record at `index` and swap it in once it validates.
    ///
    /// Fields the closure changed count as supplied, so the record reacts to
    /// the edit the same way it would to `set_fields` with those fields.
    pub fn update_with<F>(&mut self, index: usize, edit: F) -> Result<(), CollectionError>
    where
        F: FnOnce(&mut T),
    {
        self.check_index(index)?;
        let previous = &self.data[index];
        let mut edited = previous.clone();
        edit(&mut edited);

        let before = previous.to_fields()?;
        let mut changed = edited.to_fields()?;
        changed.retain(|key, value| before.get(key) != Some(value));
        edited.reconcile(previous, &changed);

        let edited = edited.validated()?;
        self.replace_at(index, edited)
    }

    fn replace_at(&mut self, index: usize, record: T) -> Result<(), CollectionError> {
        self.check_kind(&record)?;
        let duplicates = duplicate_names(
            self.data
                .iter()
                .enumerate()
                .filter(|(position, _)| *position != index)
                .map(|(_, existing)| existing)
                .chain(std::iter::once(&record)),
        );
        if !duplicates.is_empty() {
            return Err(CollectionError::DuplicateNames { names: duplicates });
        }
        self.data[index] = record;
        Ok(())
    }

    /// Names of every named record, in order.
    pub fn get_names(&self) -> Vec<String> {
        self.data
            .iter()
            .filter_map(|record| record.name().map(str::to_string))
            .collect()
    }

    /// Every `(index, field)` pair whose text field equals `value`, ignoring
    /// case. List fields match when any entry does.
    pub fn get_all_matches(&self, value: &str) -> Vec<(usize, &'static str)> {
        let mut matches = Vec::new();
        for (index, record) in self.data.iter().enumerate() {
            for (field, text) in record.text_fields() {
                if names_match(text, value) && !matches.contains(&(index, field)) {
                    matches.push((index, field));
                }
            }
        }
        matches
    }

    /// Remove every record; the kind is kept.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Rewrite every record through `convert` and retag the collection as
    /// `kind`. Used when a project switches record shape.
    pub(crate) fn convert_all<F>(&mut self, kind: &str, convert: F)
    where
        F: FnMut(T) -> T,
    {
        let records = std::mem::take(&mut self.data);
        self.data = records.into_iter().map(convert).collect();
        self.class_handle = Some(kind.to_string());
    }

    /// Direct access for reference rewrites that cannot change a name.
    pub(crate) fn records_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    fn build(&mut self, mut fields: Fields) -> Result<T, CollectionError> {
        let kind = self
            .class_handle
            .clone()
            .ok_or(CollectionError::KindNotKnown)?;

        let has_name = fields
            .get("name")
            .and_then(|name| name.as_str())
            .is_some_and(|name| !name.is_empty());
        if !has_name && !T::DEFAULT_NAME.is_empty() {
            let name = self.next_default_name();
            fields.insert("name".to_string(), name.into());
        }

        Ok(T::from_fields(&kind, fields)?)
    }

    fn next_default_name(&mut self) -> String {
        loop {
            self.name_counter += 1;
            let candidate = format!("{} {}", T::DEFAULT_NAME, self.name_counter);
            if !self.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn check_kind(&self, record: &T) -> Result<(), CollectionError> {
        match &self.class_handle {
            Some(expected) if expected != record.kind() => Err(CollectionError::WrongKind {
                expected: expected.clone(),
                found: record.kind().to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn check_index(&self, index: usize) -> Result<(), CollectionError> {
        if index >= self.data.len() {
            return Err(CollectionError::IndexOutOfRange {
                index,
                len: self.data.len(),
            });
        }
        Ok(())
    }
}

/// Names that appear more than once (ignoring case), each reported once.
fn duplicate_names<'a, T: Record + 'a>(records: impl IntoIterator<Item = &'a T>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut duplicates: Vec<String> = Vec::new();
    for name in records.into_iter().filter_map(|record| record.name()) {
        let folded = name.to_lowercase();
        if seen.contains(&folded) {
            if !duplicates.iter().any(|dup| names_match(dup, name)) {
                duplicates.push(name.to_string());
            }
        } else {
            seen.push(folded);
        }
    }
    duplicates
}

impl<T: Record> Index<usize> for ClassList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl<T: Record> Index<&str> for ClassList<T> {
    type Output = T;

    /// Look a record up by name, ignoring case.
    ///
    /// # Panics
    ///
    /// Panics if no record has that name. Use [`ClassList::get_by_name`]
    /// when the name may be absent.
    fn index(&self, name: &str) -> &Self::Output {
        match self.get_by_name(name) {
            Some(record) => record,
            None => panic!("no record named \"{}\" in the collection", name),
        }
    }
}

impl<'a, T: Record> IntoIterator for &'a ClassList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<T: Record> fmt::Display for ClassList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.class_handle.as_deref().unwrap_or("(unknown kind)");
        writeln!(f, "{} [{} records]", kind, self.data.len())?;
        for (index, record) in self.data.iter().enumerate() {
            writeln!(f, "  {:>3}  {}", index + 1, record.name().unwrap_or("-"))?;
        }
        Ok(())
    }
}
