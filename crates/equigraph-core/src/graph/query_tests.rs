//! Tests for the group query engine.

use std::sync::Arc;

use crate::catalog::InMemoryCatalog;
use crate::error::Error;

use super::query::QueryEngine;
use super::retry::RetryPolicy;
use super::store::{GraphStore, InMemoryGraphStore, WriteBatch};
use super::topology::TopologyEngine;
use super::types::{Subject, SubjectId};

struct Fixture {
    store: Arc<InMemoryGraphStore>,
    topology: TopologyEngine<InMemoryGraphStore, InMemoryCatalog>,
    query: QueryEngine<InMemoryGraphStore, InMemoryCatalog>,
}

fn fixture_with_subjects(names: &[(SubjectId, &str)]) -> Fixture {
    let store = Arc::new(InMemoryGraphStore::new());
    let catalog = Arc::new(InMemoryCatalog::new());
    for &(id, name) in names {
        catalog.upsert(Subject::new(id, name, 10 + id));
    }
    Fixture {
        store: Arc::clone(&store),
        topology: TopologyEngine::new(
            Arc::clone(&store),
            Arc::clone(&catalog),
            RetryPolicy::default(),
        ),
        query: QueryEngine::new(store, catalog, 10_000),
    }
}

#[test]
fn test_pair_is_equivalent_both_ways() {
    let f = fixture_with_subjects(&[(1, "Algebra I"), (2, "Matemática 1")]);
    f.topology.add_equivalence(1, 2, "19").unwrap();

    assert!(f.query.are_equivalent_by_cycle(1, 2, "19").unwrap());
    assert!(f.query.are_equivalent_by_cycle(2, 1, "19").unwrap());
}

#[test]
fn test_stage_mismatch_is_never_equivalent() {
    let f = fixture_with_subjects(&[(1, "Algebra I"), (2, "Matemática 1")]);
    f.topology.add_equivalence(1, 2, "19").unwrap();

    assert!(!f.query.are_equivalent_by_cycle(1, 2, "20").unwrap());
}

#[test]
fn test_unrelated_groups_are_not_equivalent() {
    let f = fixture_with_subjects(&[(1, "A"), (2, "B"), (3, "C"), (4, "D")]);
    f.topology.add_equivalence(1, 2, "19").unwrap();
    f.topology.add_equivalence(3, 4, "19").unwrap();

    assert!(!f.query.are_equivalent_by_cycle(1, 3, "19").unwrap());
    assert!(!f.query.are_equivalent_by_cycle(2, 4, "19").unwrap());
}

#[test]
fn test_isolated_subjects_are_not_equivalent() {
    let f = fixture_with_subjects(&[(1, "A"), (2, "B")]);
    assert!(!f.query.are_equivalent_by_cycle(1, 2, "19").unwrap());
}

#[test]
fn test_self_equivalence_mirrors_cycle_membership() {
    let f = fixture_with_subjects(&[(1, "A"), (2, "B"), (3, "C")]);
    f.topology.add_equivalence(1, 2, "19").unwrap();

    // On a cycle there is a nonzero-length path back to yourself.
    assert!(f.query.are_equivalent_by_cycle(1, 1, "19").unwrap());
    // Isolated subjects have none.
    assert!(!f.query.are_equivalent_by_cycle(3, 3, "19").unwrap());
}

#[test]
fn test_unknown_subject_is_not_found() {
    let f = fixture_with_subjects(&[(1, "A")]);
    assert!(matches!(
        f.query.are_equivalent_by_cycle(1, 9, "19"),
        Err(Error::SubjectNotFound(9))
    ));
    assert!(matches!(
        f.query.group_members(9, "19"),
        Err(Error::SubjectNotFound(9))
    ));
}

#[test]
fn test_empty_stage_rejected() {
    let f = fixture_with_subjects(&[(1, "A"), (2, "B")]);
    assert!(matches!(
        f.query.are_equivalent_by_cycle(1, 2, " "),
        Err(Error::InvalidStage)
    ));
    assert!(matches!(
        f.query.group_members(1, ""),
        Err(Error::InvalidStage)
    ));
}

#[test]
fn test_group_members_isolated_returns_self() {
    let f = fixture_with_subjects(&[(1, "Algebra I")]);
    let members = f.query.group_members(1, "19").unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id(), 1);
}

#[test]
fn test_group_members_sorted_by_name() {
    let f = fixture_with_subjects(&[(1, "Cálculo"), (2, "Algebra I"), (3, "Matemática 1")]);
    f.topology.add_equivalence(1, 2, "19").unwrap();
    f.topology.add_equivalence(1, 3, "19").unwrap();

    let members = f.query.group_members(1, "19").unwrap();
    let names: Vec<&str> = members.iter().map(Subject::name).collect();
    assert_eq!(names, vec!["Algebra I", "Cálculo", "Matemática 1"]);

    // Same group from any member's perspective.
    let from_2 = f.query.group_members(2, "19").unwrap();
    assert_eq!(members, from_2);
}

#[test]
fn test_group_members_ties_broken_by_id() {
    let f = fixture_with_subjects(&[(5, "Algebra"), (2, "Algebra")]);
    f.topology.add_equivalence(5, 2, "19").unwrap();

    let members = f.query.group_members(5, "19").unwrap();
    let ids: Vec<SubjectId> = members.iter().map(Subject::id).collect();
    assert_eq!(ids, vec![2, 5]);
}

#[test]
fn test_reachability_does_not_assume_cycle_shape() {
    // A one-way edge is reachable in one direction only, so the
    // bidirectional check stays false even on this corrupted shape.
    let f = fixture_with_subjects(&[(1, "A"), (2, "B")]);
    let n1 = f.store.neighborhood(1, "19");
    f.store
        .apply(WriteBatch::for_stage("19").expect(&n1).create_edge(1, 2))
        .unwrap();

    assert!(!f.query.are_equivalent_by_cycle(1, 2, "19").unwrap());
    assert!(!f.query.are_equivalent_by_cycle(2, 1, "19").unwrap());
}

#[test]
fn test_group_members_on_unclosed_walk_returns_self() {
    // A lasso (1 → 2 → 3 → 2) never closes back into 1.
    let f = fixture_with_subjects(&[(1, "A"), (2, "B"), (3, "C")]);
    let n1 = f.store.neighborhood(1, "19");
    f.store
        .apply(
            WriteBatch::for_stage("19")
                .expect(&n1)
                .create_edge(1, 2)
                .create_edge(2, 3)
                .create_edge(3, 2),
        )
        .unwrap();

    let members = f.query.group_members(1, "19").unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id(), 1);
}

#[test]
fn test_walk_bound_caps_traversal() {
    let f = fixture_with_subjects(&[(1, "A"), (2, "B"), (3, "C"), (4, "D")]);
    f.topology.add_equivalence(1, 2, "19").unwrap();
    f.topology.add_equivalence(1, 3, "19").unwrap();
    f.topology.add_equivalence(1, 4, "19").unwrap();

    let store = Arc::clone(&f.store);
    let catalog = Arc::new(InMemoryCatalog::new());
    for (id, name) in [(1, "A"), (2, "B"), (3, "C"), (4, "D")] {
        catalog.upsert(Subject::new(id, name, 10));
    }
    let bounded = QueryEngine::new(store, catalog, 1);

    // One expansion cannot prove both directions across a 4-cycle.
    assert!(!bounded.are_equivalent_by_cycle(2, 3, "19").unwrap());
    // Membership degrades to the subject itself instead of walking forever.
    assert_eq!(bounded.group_members(1, "19").unwrap().len(), 1);
}
