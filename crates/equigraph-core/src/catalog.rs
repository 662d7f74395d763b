//! Subject catalog interface consumed by the engine.
//!
//! The course catalog is an external collaborator: subjects are created and
//! deleted there, never by the engine. The engine only needs to check
//! existence and resolve display data for ordered group output.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::graph::{Subject, SubjectId};

/// Read-side contract of the course-catalog layer.
pub trait SubjectCatalog: Send + Sync {
    /// Returns true when a subject with this id exists.
    fn subject_exists(&self, id: SubjectId) -> bool;

    /// Resolves a subject's record (name, owning institution) by id.
    fn resolve_subject(&self, id: SubjectId) -> Option<Subject>;
}

pub(crate) fn ensure_exists<C: SubjectCatalog + ?Sized>(catalog: &C, id: SubjectId) -> Result<()> {
    if catalog.subject_exists(id) {
        Ok(())
    } else {
        Err(Error::SubjectNotFound(id))
    }
}

/// Thread-safe in-memory catalog for embedders and tests.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    subjects: RwLock<HashMap<SubjectId, Subject>>,
}

impl InMemoryCatalog {
    /// Creates a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a subject record.
    pub fn upsert(&self, subject: Subject) {
        self.subjects.write().insert(subject.id(), subject);
    }

    /// Removes a subject record, returning it if it existed.
    pub fn remove(&self, id: SubjectId) -> Option<Subject> {
        self.subjects.write().remove(&id)
    }

    /// Returns the number of catalogued subjects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subjects.read().len()
    }

    /// True when the catalog holds no subjects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.read().is_empty()
    }
}

impl SubjectCatalog for InMemoryCatalog {
    fn subject_exists(&self, id: SubjectId) -> bool {
        self.subjects.read().contains_key(&id)
    }

    fn resolve_subject(&self, id: SubjectId) -> Option<Subject> {
        self.subjects.read().get(&id).cloned()
    }
}
