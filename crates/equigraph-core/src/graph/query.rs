//! Group query engine: equivalence tests and cycle membership.
//!
//! Queries do not assume the degree invariant, they verify it: equivalence
//! is defined as bidirectional nonzero-length reachability, and membership
//! as a closed successor walk, both bounded so a corrupted shape degrades to
//! a negative answer instead of an unbounded traversal.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::catalog::{ensure_exists, SubjectCatalog};
use crate::error::{Error, Result};

use super::store::{GraphStore, StageView};
use super::types::{validate_stage, Subject, SubjectId};

/// Read half of the engine: cycle-membership tests and group enumeration.
pub struct QueryEngine<S, C> {
    store: Arc<S>,
    catalog: Arc<C>,
    max_walk: usize,
}

impl<S: GraphStore, C: SubjectCatalog> QueryEngine<S, C> {
    /// Creates a query engine over the given store and catalog.
    ///
    /// `max_walk` bounds every traversal (worst-case cost is the group
    /// size, so any bound above the largest expected group is safe).
    pub fn new(store: Arc<S>, catalog: Arc<C>, max_walk: usize) -> Self {
        Self {
            store,
            catalog,
            max_walk: max_walk.max(1),
        }
    }

    /// True when `a` and `b` lie on the same equivalence cycle at `stage`:
    /// a nonzero-length directed path exists from `a` to `b` and another
    /// from `b` to `a`, both using only `stage`-tagged edges.
    ///
    /// Subjects at different stages are never comparable; a missing path is
    /// `Ok(false)`, not an error.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidStage`] for an empty stage tag and
    /// [`Error::SubjectNotFound`] when either subject is unknown.
    pub fn are_equivalent_by_cycle(
        &self,
        a: SubjectId,
        b: SubjectId,
        stage: &str,
    ) -> Result<bool> {
        let stage = validate_stage(stage)?;
        ensure_exists(self.catalog.as_ref(), a)?;
        ensure_exists(self.catalog.as_ref(), b)?;

        let view = self.store.stage_view(stage);
        Ok(reaches(&view, a, b, self.max_walk) && reaches(&view, b, a, self.max_walk))
    }

    /// Returns the full membership of `subject`'s group at `stage`,
    /// including the subject itself, sorted by name then id.
    ///
    /// An isolated subject yields a single-element vector (itself).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidStage`] for an empty stage tag and
    /// [`Error::SubjectNotFound`] when the subject (or a group member) is
    /// unknown to the catalog.
    pub fn group_members(&self, subject: SubjectId, stage: &str) -> Result<Vec<Subject>> {
        let stage = validate_stage(stage)?;
        ensure_exists(self.catalog.as_ref(), subject)?;

        let view = self.store.stage_view(stage);
        let ids = cycle_of(&view, subject, self.max_walk);

        let mut members = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self
                .catalog
                .resolve_subject(id)
                .ok_or(Error::SubjectNotFound(id))?;
            members.push(record);
        }
        members.sort_by(|x, y| x.name().cmp(y.name()).then(x.id().cmp(&y.id())));
        Ok(members)
    }
}

/// True when a nonzero-length directed path `from → … → to` exists.
///
/// Breadth-first over successors; a zero-length "path" never counts, so
/// `reaches(view, s, s, …)` is true only when `s` lies on a cycle.
fn reaches(view: &StageView, from: SubjectId, to: SubjectId, max_walk: usize) -> bool {
    let mut visited: HashSet<SubjectId> = HashSet::new();
    let mut queue: VecDeque<SubjectId> = VecDeque::new();
    queue.push_back(from);

    let mut expanded = 0usize;
    while let Some(current) = queue.pop_front() {
        if expanded >= max_walk {
            break;
        }
        expanded += 1;

        for &next in view.successors(current) {
            if next == to {
                return true;
            }
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    false
}

/// Walks successors from `subject` and returns the members of its cycle in
/// walk order, or just `subject` itself when the walk does not close back
/// into it (isolated subject, or a shape that is not a simple cycle).
fn cycle_of(view: &StageView, subject: SubjectId, max_walk: usize) -> Vec<SubjectId> {
    let mut members = vec![subject];
    let mut seen: HashSet<SubjectId> = HashSet::new();
    seen.insert(subject);

    let mut current = subject;
    for _ in 0..max_walk {
        let Some(&next) = view.successors(current).first() else {
            break;
        };
        if next == subject {
            return members;
        }
        if !seen.insert(next) {
            break;
        }
        members.push(next);
        current = next;
    }
    vec![subject]
}
