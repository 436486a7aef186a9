//! Guarded access to one collection of a project.

use std::ops::Deref;

use crate::classlist::{ClassList, CollectionError, Fields, Record};
use crate::project::{CollectionId, Project, ProjectError};

/// A mutable handle on one collection of a [`Project`]
///
/// Mirrors the mutating operations of [`ClassList`], but each one runs as a
/// project transaction: the project is revalidated after the change and
/// left untouched if either the collection or the project rejects it.
/// Reading goes through `Deref` to the collection.
pub struct CollectionMut<'a, T: Record> {
    project: &'a mut Project,
    id: CollectionId,
    view: fn(&Project) -> &ClassList<T>,
    select: fn(&mut Project) -> &mut ClassList<T>,
}

impl<'a, T: Record> CollectionMut<'a, T> {
    pub(crate) fn new(
        project: &'a mut Project,
        id: CollectionId,
        view: fn(&Project) -> &ClassList<T>,
        select: fn(&mut Project) -> &mut ClassList<T>,
    ) -> Self {
        Self {
            project,
            id,
            view,
            select,
        }
    }

    /// The collection this handle changes.
    pub fn id(&self) -> CollectionId {
        self.id
    }

    fn apply<R, F>(&mut self, op: F) -> Result<R, ProjectError>
    where
        F: FnOnce(&mut ClassList<T>) -> Result<R, CollectionError>,
    {
        let id = self.id;
        let select = self.select;
        self.project.transact(id.as_str(), |candidate| {
            op(select(candidate)).map_err(|source| ProjectError::Collection {
                collection: id,
                source,
            })
        })
    }

    pub fn append(&mut self, record: T) -> Result<(), ProjectError> {
        self.apply(|list| list.append(record))
    }

    /// Build a record of the collection's kind from `fields` and append it.
    pub fn append_fields(&mut self, fields: Fields) -> Result<(), ProjectError> {
        self.apply(|list| list.append_fields(fields))
    }

    pub fn insert(&mut self, index: usize, record: T) -> Result<(), ProjectError> {
        self.apply(|list| list.insert(index, record))
    }

    pub fn insert_fields(&mut self, index: usize, fields: Fields) -> Result<(), ProjectError> {
        self.apply(|list| list.insert_fields(index, fields))
    }

    /// Remove the record named `name` (ignoring case).
    pub fn remove(&mut self, name: &str) -> Result<T, ProjectError> {
        self.apply(|list| list.remove(name))
    }

    pub fn remove_record(&mut self, record: &T) -> Result<T, ProjectError> {
        self.apply(|list| list.remove_record(record))
    }

    pub fn remove_at(&mut self, index: usize) -> Result<T, ProjectError> {
        self.apply(|list| list.remove_at(index))
    }

    pub fn extend<I>(&mut self, records: I) -> Result<(), ProjectError>
    where
        I: IntoIterator<Item = T>,
    {
        self.apply(|list| list.extend(records))
    }

    /// Rebuild the record at `index` with some fields overridden. A change of
    /// name is propagated to every field referencing the old name.
    pub fn set_fields(&mut self, index: usize, fields: Fields) -> Result<(), ProjectError> {
        self.apply(|list| list.set_fields(index, fields))
    }

    /// Edit a copy of the record at `index`; see [`ClassList::update_with`].
    pub fn update_with<F>(&mut self, index: usize, edit: F) -> Result<(), ProjectError>
    where
        F: FnOnce(&mut T),
    {
        self.apply(|list| list.update_with(index, edit))
    }

    pub fn clear(&mut self) -> Result<(), ProjectError> {
        self.apply(|list| {
            list.clear();
            Ok(())
        })
    }
}

impl<T: Record> Deref for CollectionMut<'_, T> {
    type Target = ClassList<T>;

    fn deref(&self) -> &ClassList<T> {
        (self.view)(&*self.project)
    }
}
