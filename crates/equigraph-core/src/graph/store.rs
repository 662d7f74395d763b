//! Graph store adapter: the transactional contract over stage-tagged
//! equivalence edges, plus the in-memory reference implementation.
//!
//! Topology mutations are read-decide-write: they read a small neighborhood,
//! decide a write set from it, and submit the whole set at once. The store
//! contract makes that safe without holding a lock across the decision —
//! every neighborhood read carries a version fingerprint, and a write batch
//! is rejected wholesale if any fingerprint it was derived from went stale.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{Error, Result};

use super::types::{EquivalenceEdge, SubjectId};

/// The local neighborhood of one subject at one stage, read atomically.
///
/// `version` is the subject's commit counter at this stage; a later
/// [`WriteBatch`] expecting this version is rejected if any commit touched
/// the subject in between. On a healthy stage `outgoing` and `incoming` hold
/// at most one edge each; the vectors exist so that callers can detect a
/// corrupted shape instead of silently acting on it.
#[derive(Debug, Clone)]
pub struct Neighborhood {
    /// The subject this neighborhood belongs to.
    pub subject: SubjectId,
    /// Outgoing stage-tagged edges of the subject.
    pub outgoing: Vec<EquivalenceEdge>,
    /// Incoming stage-tagged edges of the subject.
    pub incoming: Vec<EquivalenceEdge>,
    /// Commit counter of (subject, stage) at read time.
    pub version: u64,
}

impl Neighborhood {
    /// True when the subject has no edge at this stage.
    #[must_use]
    pub fn is_isolated(&self) -> bool {
        self.outgoing.is_empty() && self.incoming.is_empty()
    }

    /// True when the subject participates in any group at this stage.
    #[must_use]
    pub fn is_grouped(&self) -> bool {
        !self.is_isolated()
    }
}

/// An atomic multi-edge write against one stage.
///
/// Either every delete and create in the batch is applied, or none is. The
/// batch carries the version fingerprints its decision was based on; a stale
/// fingerprint fails the whole batch with [`Error::TxnConflict`].
#[derive(Debug, Clone)]
pub struct WriteBatch {
    stage: String,
    expected: Vec<(SubjectId, u64)>,
    deletes: Vec<(SubjectId, SubjectId)>,
    creates: Vec<(SubjectId, SubjectId)>,
}

impl WriteBatch {
    /// Creates an empty batch for the given stage.
    #[must_use]
    pub fn for_stage(stage: &str) -> Self {
        Self {
            stage: stage.to_string(),
            expected: Vec::new(),
            deletes: Vec::new(),
            creates: Vec::new(),
        }
    }

    /// Records the neighborhood this batch's decision was derived from
    /// (builder pattern).
    #[must_use]
    pub fn expect(mut self, neighborhood: &Neighborhood) -> Self {
        self.expected.push((neighborhood.subject, neighborhood.version));
        self
    }

    /// Schedules deletion of the `from → to` edge (builder pattern).
    #[must_use]
    pub fn delete_edge(mut self, from: SubjectId, to: SubjectId) -> Self {
        self.deletes.push((from, to));
        self
    }

    /// Schedules creation of a `from → to` edge (builder pattern).
    #[must_use]
    pub fn create_edge(mut self, from: SubjectId, to: SubjectId) -> Self {
        self.creates.push((from, to));
        self
    }

    /// Returns the stage this batch writes to.
    #[must_use]
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// True when the batch contains no writes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.creates.is_empty()
    }
}

/// A consistent read-only snapshot of one stage's edge set.
///
/// Captured under a single read lock, so concurrent commits never produce a
/// torn view: readers see the stage either before or after a batch, never in
/// between.
#[derive(Debug, Clone, Default)]
pub struct StageView {
    outgoing: HashMap<SubjectId, Vec<SubjectId>>,
    incoming: HashMap<SubjectId, Vec<SubjectId>>,
    edge_count: usize,
}

impl StageView {
    /// Returns the subjects this subject has an edge to.
    #[must_use]
    pub fn successors(&self, subject: SubjectId) -> &[SubjectId] {
        self.outgoing.get(&subject).map_or(&[], Vec::as_slice)
    }

    /// Returns the subjects that have an edge to this subject.
    #[must_use]
    pub fn predecessors(&self, subject: SubjectId) -> &[SubjectId] {
        self.incoming.get(&subject).map_or(&[], Vec::as_slice)
    }

    /// Returns the number of edges in this stage.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// True when the stage decomposes into disjoint simple directed cycles
    /// plus isolated subjects: every subject with any edge has exactly one
    /// outgoing and one incoming edge, and following successors from it
    /// leads back to it.
    #[must_use]
    pub fn decomposes_into_cycles(&self) -> bool {
        for (&subject, targets) in &self.outgoing {
            if targets.len() != 1 || self.predecessors(subject).len() != 1 {
                return false;
            }
        }
        for (&subject, sources) in &self.incoming {
            if sources.len() != 1 || self.successors(subject).len() != 1 {
                return false;
            }
        }

        let mut visited: HashSet<SubjectId> = HashSet::new();
        for &start in self.outgoing.keys() {
            if visited.contains(&start) {
                continue;
            }
            let mut current = start;
            for _ in 0..=self.edge_count {
                visited.insert(current);
                let Some(&next) = self.successors(current).first() else {
                    return false;
                };
                if next == start {
                    break;
                }
                if visited.contains(&next) {
                    // Walked into another component's cycle: not a simple
                    // cycle through `start`.
                    return false;
                }
                current = next;
            }
        }
        true
    }
}

/// Transactional storage contract for stage-tagged equivalence edges.
///
/// Implementations must honor three guarantees:
///
/// 1. [`neighborhood`](GraphStore::neighborhood) reads one subject's in/out
///    edges atomically, together with a version fingerprint that changes on
///    every committed write touching that subject at that stage.
/// 2. [`apply`](GraphStore::apply) applies a batch all-or-nothing, rejecting
///    it with [`Error::TxnConflict`] when any expected fingerprint is stale.
///    A rejected or aborted batch leaves no partial edge writes behind.
/// 3. [`stage_view`](GraphStore::stage_view) returns a consistent snapshot
///    for readers, which may run concurrently with mutations.
///
/// The fingerprint check stands in for serializable isolation: an adapter
/// backed by a transactional graph database can discharge it with the
/// database's own conflict detection, but a non-transactional backend must
/// implement it — without it, concurrent splices silently corrupt cycles.
pub trait GraphStore: Send + Sync {
    /// Reads the in/out edges of `subject` at `stage` with their version.
    fn neighborhood(&self, subject: SubjectId, stage: &str) -> Neighborhood;

    /// Atomically applies a write batch, or rejects it without effect.
    fn apply(&self, batch: WriteBatch) -> Result<()>;

    /// Captures a consistent snapshot of one stage's edge set.
    fn stage_view(&self, stage: &str) -> StageView;
}

/// In-memory graph store with bidirectional (subject, stage) indexing and
/// per-(subject, stage) commit counters.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    inner: RwLock<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    /// All edges indexed by store-assigned id.
    edges: HashMap<u64, EquivalenceEdge>,
    /// Outgoing edges: (source, stage) -> edge ids.
    outgoing: HashMap<(SubjectId, String), Vec<u64>>,
    /// Incoming edges: (target, stage) -> edge ids.
    incoming: HashMap<(SubjectId, String), Vec<u64>>,
    /// Secondary index: stage -> edge ids, for snapshot capture.
    by_stage: HashMap<String, Vec<u64>>,
    /// Commit counters: (subject, stage) -> version.
    versions: HashMap<(SubjectId, String), u64>,
    next_edge_id: u64,
}

impl StoreInner {
    fn version(&self, subject: SubjectId, stage: &str) -> u64 {
        self.versions
            .get(&(subject, stage.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn edges_at(
        &self,
        index: &HashMap<(SubjectId, String), Vec<u64>>,
        subject: SubjectId,
        stage: &str,
    ) -> Vec<EquivalenceEdge> {
        index
            .get(&(subject, stage.to_string()))
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.edges.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolves a (from, to) delete request to a concrete edge id.
    fn find_edge(&self, from: SubjectId, to: SubjectId, stage: &str) -> Option<u64> {
        self.outgoing
            .get(&(from, stage.to_string()))?
            .iter()
            .find(|id| self.edges.get(*id).is_some_and(|e| e.to() == to))
            .copied()
    }

    fn remove_edge(&mut self, edge_id: u64) {
        let Some(edge) = self.edges.remove(&edge_id) else {
            return;
        };
        let stage = edge.stage().to_string();
        if let Some(ids) = self.outgoing.get_mut(&(edge.from(), stage.clone())) {
            ids.retain(|&id| id != edge_id);
        }
        if let Some(ids) = self.incoming.get_mut(&(edge.to(), stage.clone())) {
            ids.retain(|&id| id != edge_id);
        }
        if let Some(ids) = self.by_stage.get_mut(&stage) {
            ids.retain(|&id| id != edge_id);
        }
    }
}

impl InMemoryGraphStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of edges across all stages.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.read().edges.len()
    }

    /// Returns the number of edges tagged with the given stage.
    #[must_use]
    pub fn stage_edge_count(&self, stage: &str) -> usize {
        self.inner
            .read()
            .by_stage
            .get(stage)
            .map_or(0, Vec::len)
    }
}

impl GraphStore for InMemoryGraphStore {
    fn neighborhood(&self, subject: SubjectId, stage: &str) -> Neighborhood {
        let inner = self.inner.read();
        Neighborhood {
            subject,
            outgoing: inner.edges_at(&inner.outgoing, subject, stage),
            incoming: inner.edges_at(&inner.incoming, subject, stage),
            version: inner.version(subject, stage),
        }
    }

    fn apply(&self, batch: WriteBatch) -> Result<()> {
        let mut inner = self.inner.write();
        let stage = batch.stage.clone();

        for &(subject, expected) in &batch.expected {
            let current = inner.version(subject, &stage);
            if current != expected {
                return Err(Error::TxnConflict(format!(
                    "subject {subject} at stage '{stage}' moved from v{expected} to v{current}"
                )));
            }
        }

        // Resolve every delete before touching anything, so a stale request
        // rejects the batch with the store unchanged.
        let mut delete_ids = Vec::with_capacity(batch.deletes.len());
        for &(from, to) in &batch.deletes {
            let id = inner.find_edge(from, to, &stage).ok_or_else(|| {
                Error::TxnConflict(format!(
                    "edge {from} -> {to} at stage '{stage}' no longer exists"
                ))
            })?;
            delete_ids.push(id);
        }
        for &(from, to) in &batch.creates {
            if inner.find_edge(from, to, &stage).is_some() && !batch.deletes.contains(&(from, to)) {
                return Err(Error::TxnConflict(format!(
                    "edge {from} -> {to} at stage '{stage}' already exists"
                )));
            }
        }

        for id in delete_ids {
            inner.remove_edge(id);
        }

        // One timestamp per batch: all edges of a splice share the instant
        // their transaction committed.
        let created_at = Utc::now();
        for &(from, to) in &batch.creates {
            inner.next_edge_id += 1;
            let id = inner.next_edge_id;
            let edge = EquivalenceEdge::new(id, from, to, &stage, created_at);
            inner.outgoing.entry((from, stage.clone())).or_default().push(id);
            inner.incoming.entry((to, stage.clone())).or_default().push(id);
            inner.by_stage.entry(stage.clone()).or_default().push(id);
            inner.edges.insert(id, edge);
        }

        let mut touched: HashSet<SubjectId> = HashSet::new();
        for &(from, to) in batch.deletes.iter().chain(batch.creates.iter()) {
            touched.insert(from);
            touched.insert(to);
        }
        for subject in touched {
            *inner.versions.entry((subject, stage.clone())).or_insert(0) += 1;
        }

        Ok(())
    }

    fn stage_view(&self, stage: &str) -> StageView {
        let inner = self.inner.read();
        let mut view = StageView::default();
        if let Some(ids) = inner.by_stage.get(stage) {
            for edge in ids.iter().filter_map(|id| inner.edges.get(id)) {
                view.outgoing.entry(edge.from()).or_default().push(edge.to());
                view.incoming.entry(edge.to()).or_default().push(edge.from());
                view.edge_count += 1;
            }
        }
        view
    }
}
