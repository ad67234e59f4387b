//! Missing-reciprocal detection.
//!
//! For every edge `(A, kind, B)` whose kind has a reciprocal, the inverse
//! edge `(B, reciprocal(kind), A)` must exist. This pass reports the ones
//! that don't. It deliberately does NOT filter on whether `B` owns a record:
//! existence filtering belongs to the name resolver at materialization time,
//! and the fixer warns at write-back time instead.

use crate::graph::{EdgeUpdates, RelationGraph};
use crate::kind::ReciprocalMap;

/// Compute the missing-edge set for `graph` under `reciprocal`.
///
/// Result shape: target person → kind to add → set(source person).
pub fn missing_reciprocals(graph: &RelationGraph, reciprocal: &ReciprocalMap) -> EdgeUpdates {
    let mut missing = EdgeUpdates::new();

    for (person, kind, targets) in graph.iter() {
        let Some(inverse) = reciprocal.of(kind) else {
            continue; // alias, or a kind outside the mapping
        };
        for target in targets {
            if !graph.has_edge(target, inverse, person) {
                missing.add(target, inverse, person);
            }
        }
    }

    missing
}
