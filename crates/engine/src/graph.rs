//! In-memory relationship multigraph.
//!
//! The graph is built once from ALL records before any engine pass runs:
//! missing-reciprocal detection is only correct with global knowledge of
//! existing edges, so streaming construction is not supported.
//!
//! # Invariants
//!
//! 1. **Additive, order-preserving accumulation:** `add_edges` appends in
//!    input order and never deduplicates. Duplicate targets are resolved at
//!    edge-insertion time by [`EdgeUpdates`] set semantics.
//! 2. **Deterministic iteration:** both maps are BTree-backed so every
//!    downstream report and preview is stable across runs.

use std::collections::{BTreeMap, BTreeSet};

use crate::kind::RelKind;

/// Directed multigraph: person name → kind → ordered target-name list.
#[derive(Debug, Default, Clone)]
pub struct RelationGraph {
    edges: BTreeMap<String, BTreeMap<RelKind, Vec<String>>>,
    records: BTreeSet<String>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as owning a record file. Targets that only ever appear on
    /// the right side of an edge stay unmarked.
    pub fn add_record(&mut self, name: &str) {
        self.records.insert(name.to_string());
    }

    /// Append edges for `(from, kind)` in input order, duplicates included.
    pub fn add_edges<I>(&mut self, from: &str, kind: RelKind, targets: I)
    where
        I: IntoIterator<Item = String>,
    {
        let list = self
            .edges
            .entry(from.to_string())
            .or_default()
            .entry(kind)
            .or_default();
        list.extend(targets);
    }

    /// Targets of `(name, kind)`, empty if the person or kind is absent.
    pub fn targets(&self, name: &str, kind: RelKind) -> &[String] {
        self.edges
            .get(name)
            .and_then(|kinds| kinds.get(&kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_edge(&self, from: &str, kind: RelKind, to: &str) -> bool {
        self.targets(from, kind).iter().any(|t| t == to)
    }

    pub fn has_record(&self, name: &str) -> bool {
        self.records.contains(name)
    }

    /// People with at least one outgoing edge, in sorted order.
    pub fn people(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    /// All `(person, kind, targets)` entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, RelKind, &[String])> {
        self.edges.iter().flat_map(|(person, kinds)| {
            kinds
                .iter()
                .map(move |(kind, targets)| (person.as_str(), *kind, targets.as_slice()))
        })
    }

    pub fn person_count(&self) -> usize {
        self.edges.len()
    }

    /// Fold an update set into the graph, skipping edges already present.
    /// Returns the subset that was actually added, so fixed-point drivers
    /// can detect quiescence.
    pub fn apply(&mut self, updates: &EdgeUpdates) -> EdgeUpdates {
        let mut added = EdgeUpdates::new();
        for (person, kind, name) in updates.edges() {
            if !self.has_edge(person, kind, name) {
                self.add_edges(person, kind, [name.to_string()]);
                added.add(person, kind, name);
            }
        }
        added
    }
}

/// Accumulated edge additions: person → kind → set(target).
///
/// Set semantics — this is where duplicate targets from the multigraph
/// collapse. Produced by the reciprocity and sibling-inference engines and
/// consumed by the header write-back and by [`RelationGraph::apply`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EdgeUpdates {
    map: BTreeMap<String, BTreeMap<RelKind, BTreeSet<String>>>,
}

impl EdgeUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `person` gaining `kind: name`. Returns false if already queued.
    pub fn add(&mut self, person: &str, kind: RelKind, name: &str) -> bool {
        self.map
            .entry(person.to_string())
            .or_default()
            .entry(kind)
            .or_default()
            .insert(name.to_string())
    }

    /// Union `other` into `self`.
    pub fn merge(&mut self, other: EdgeUpdates) {
        for (person, kinds) in other.map {
            let entry = self.map.entry(person).or_default();
            for (kind, names) in kinds {
                entry.entry(kind).or_default().extend(names);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of people gaining at least one edge.
    pub fn person_count(&self) -> usize {
        self.map.len()
    }

    /// Total number of queued edges.
    pub fn edge_count(&self) -> usize {
        self.map
            .values()
            .flat_map(|kinds| kinds.values())
            .map(BTreeSet::len)
            .sum()
    }

    /// `(person, kind → names)` entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<RelKind, BTreeSet<String>>)> {
        self.map.iter().map(|(person, kinds)| (person.as_str(), kinds))
    }

    /// Flattened `(person, kind, name)` triples in sorted order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, RelKind, &str)> {
        self.map.iter().flat_map(|(person, kinds)| {
            kinds.iter().flat_map(move |(kind, names)| {
                names
                    .iter()
                    .map(move |name| (person.as_str(), *kind, name.as_str()))
            })
        })
    }

    /// The queued kinds-to-names map for one person, if any.
    pub fn for_person(&self, person: &str) -> Option<&BTreeMap<RelKind, BTreeSet<String>>> {
        self.map.get(person)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(entries: &[(&str, RelKind, &[&str])]) -> RelationGraph {
        let mut g = RelationGraph::new();
        for (from, kind, targets) in entries {
            g.add_record(from);
            g.add_edges(from, *kind, targets.iter().map(|s| s.to_string()));
        }
        g
    }

    #[test]
    fn accumulation_preserves_order_and_duplicates() {
        let mut g = RelationGraph::new();
        g.add_edges("A", RelKind::Child, ["B".to_string(), "C".to_string()]);
        g.add_edges("A", RelKind::Child, ["B".to_string()]);
        assert_eq!(g.targets("A", RelKind::Child), ["B", "C", "B"]);
    }

    #[test]
    fn targets_of_unknown_person_is_empty() {
        let g = RelationGraph::new();
        assert!(g.targets("Nobody", RelKind::Parent).is_empty());
        assert!(!g.has_record("Nobody"));
    }

    #[test]
    fn apply_skips_existing_edges() {
        let mut g = graph(&[("A", RelKind::Parent, &["P"])]);
        let mut updates = EdgeUpdates::new();
        updates.add("A", RelKind::Parent, "P");
        updates.add("A", RelKind::Parent, "Q");

        let added = g.apply(&updates);
        assert_eq!(added.edge_count(), 1);
        assert!(g.has_edge("A", RelKind::Parent, "Q"));
        assert_eq!(g.targets("A", RelKind::Parent), ["P", "Q"]);

        // Second application is a no-op.
        let added = g.apply(&updates);
        assert!(added.is_empty());
    }

    #[test]
    fn updates_are_set_semantic() {
        let mut u = EdgeUpdates::new();
        assert!(u.add("A", RelKind::Child, "B"));
        assert!(!u.add("A", RelKind::Child, "B"));
        assert_eq!(u.edge_count(), 1);
        assert_eq!(u.person_count(), 1);
    }

    #[test]
    fn merge_unions() {
        let mut a = EdgeUpdates::new();
        a.add("A", RelKind::Child, "B");
        let mut b = EdgeUpdates::new();
        b.add("A", RelKind::Child, "C");
        b.add("D", RelKind::Parent, "E");
        a.merge(b);
        assert_eq!(a.edge_count(), 3);
        assert_eq!(a.person_count(), 2);
    }
}
