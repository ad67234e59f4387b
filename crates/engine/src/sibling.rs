//! Parent inference across sibling pairs.
//!
//! If A and B are siblings, their parent sets must converge: every parent of
//! A is a parent of B and vice versa, and each gained parent gains the
//! matching child edge. One pass handles direct sibling pairs only; clique
//! convergence comes from iterating the pass to a fixed point.

use crate::graph::{EdgeUpdates, RelationGraph};
use crate::kind::RelKind;

/// Iteration guard for [`infer_to_fixed_point`]. Parent sets only ever grow
/// toward the clique union, so real data converges in a handful of rounds;
/// the cap bounds pathological input.
pub const SIBLING_ITERATION_CAP: usize = 16;

/// One inference pass over direct sibling pairs.
///
/// For each person P and sibling S, the symmetric difference of their parent
/// sets becomes updates: a parent of P missing from S yields
/// `(S, parent, p)` and `(p, child, S)`, and mirrored for S's parents.
pub fn infer_sibling_parents(graph: &RelationGraph) -> EdgeUpdates {
    let mut inferred = EdgeUpdates::new();

    for person in graph.people() {
        let siblings = graph.targets(person, RelKind::Sibling);
        let parents = graph.targets(person, RelKind::Parent);

        for sibling in siblings {
            let sibling_parents = graph.targets(sibling, RelKind::Parent);

            for parent in parents {
                if !sibling_parents.iter().any(|p| p == parent) {
                    inferred.add(sibling, RelKind::Parent, parent);
                    inferred.add(parent, RelKind::Child, sibling);
                }
            }
            for parent in sibling_parents {
                if !parents.iter().any(|p| p == parent) {
                    inferred.add(person, RelKind::Parent, parent);
                    inferred.add(parent, RelKind::Child, person);
                }
            }
        }
    }

    inferred
}

/// Drive [`infer_sibling_parents`] to a fixed point.
///
/// Each round's output is folded into `graph`; the loop stops when a round
/// adds nothing new or `cap` rounds have run. Returns the union of all edges
/// actually added plus the number of rounds executed.
pub fn infer_to_fixed_point(graph: &mut RelationGraph, cap: usize) -> (EdgeUpdates, usize) {
    let mut all = EdgeUpdates::new();
    let mut rounds = 0;

    while rounds < cap {
        let pass = infer_sibling_parents(graph);
        rounds += 1;

        let added = graph.apply(&pass);
        if added.is_empty() {
            break;
        }
        all.merge(added);
    }

    (all, rounds)
}
