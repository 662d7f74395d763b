//! Core types for the equivalence-group graph.
//!
//! Subjects are owned by the external course catalog; the engine only links
//! them with stage-tagged [`EquivalenceEdge`]s. Within one stage the edge set
//! decomposes into disjoint simple directed cycles plus isolated subjects,
//! and every mutation preserves that shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Identifier of a subject (course) in the catalog.
pub type SubjectId = u64;

/// A subject (course) as known to the catalog layer.
///
/// # Example
///
/// ```rust
/// use equigraph_core::Subject;
/// use serde_json::json;
/// use std::collections::HashMap;
///
/// let mut props = HashMap::new();
/// props.insert("area".to_string(), json!("mathematics"));
///
/// let subject = Subject::new(1, "Algebra I", 77).with_properties(props);
/// assert_eq!(subject.id(), 1);
/// assert_eq!(subject.institution_id(), 77);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subject {
    id: SubjectId,
    name: String,
    institution_id: u64,
    properties: HashMap<String, Value>,
}

impl Subject {
    /// Creates a subject record with the given id, name, and owning
    /// institution.
    #[must_use]
    pub fn new(id: SubjectId, name: &str, institution_id: u64) -> Self {
        Self {
            id,
            name: name.to_string(),
            institution_id,
            properties: HashMap::new(),
        }
    }

    /// Adds free-form properties such as area or level (builder pattern).
    #[must_use]
    pub fn with_properties(mut self, properties: HashMap<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    /// Returns the subject id.
    #[must_use]
    pub fn id(&self) -> SubjectId {
        self.id
    }

    /// Returns the subject name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning institution's id.
    #[must_use]
    pub fn institution_id(&self) -> u64 {
        self.institution_id
    }

    /// Returns all properties of this subject.
    #[must_use]
    pub fn properties(&self) -> &HashMap<String, Value> {
        &self.properties
    }

    /// Returns a specific property value, if it exists.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// A directed equivalence edge between two subjects at a curriculum stage.
///
/// Two edges with different stages are structurally independent, even when
/// they connect the same pair of subjects. Edges are created and deleted by
/// the topology engine, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EquivalenceEdge {
    id: u64,
    from: SubjectId,
    to: SubjectId,
    stage: String,
    created_at: DateTime<Utc>,
}

impl EquivalenceEdge {
    pub(crate) fn new(
        id: u64,
        from: SubjectId,
        to: SubjectId,
        stage: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            from,
            to,
            stage: stage.to_string(),
            created_at,
        }
    }

    /// Returns the store-assigned edge id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the source subject id.
    #[must_use]
    pub fn from(&self) -> SubjectId {
        self.from
    }

    /// Returns the target subject id.
    #[must_use]
    pub fn to(&self) -> SubjectId {
        self.to
    }

    /// Returns the stage tag this edge belongs to.
    #[must_use]
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Returns the commit timestamp of this edge.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Outcome of a successful `add_equivalence` mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOutcome {
    /// A brand-new two-subject group was created.
    pub pair_created: bool,
    /// The target was spliced into the source's existing cycle.
    pub spliced: bool,
}

/// How a subject was detached from its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalKind {
    /// The group had exactly two members; both of its edges were deleted and
    /// the surviving partner ends up isolated as well.
    Pair,
    /// The group had three or more members; the cycle was closed back up
    /// with a direct predecessor-to-successor edge.
    Cycle,
}

/// Report of a successful `remove_from_group` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRemoval {
    /// Whether a pair dissolved or a larger cycle was repaired.
    pub kind: RemovalKind,
    /// The subject that was detached.
    pub removed_id: SubjectId,
    /// The subject that had an edge into the removed one.
    pub predecessor_id: SubjectId,
    /// The subject the removed one had an edge to.
    pub successor_id: SubjectId,
}

/// Validates a stage tag, returning its trimmed form.
pub(crate) fn validate_stage(stage: &str) -> Result<&str> {
    let trimmed = stage.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidStage);
    }
    Ok(trimmed)
}
