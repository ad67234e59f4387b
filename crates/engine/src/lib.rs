//! `kingraph-engine` — Relationship-graph consistency engine.
//!
//! Pure engine crate: receives pre-parsed relationship data, returns
//! missing-edge sets and name resolutions. No file or database dependencies.

pub mod graph;
pub mod kind;
pub mod reciprocity;
pub mod resolve;
pub mod sibling;

pub use graph::{EdgeUpdates, RelationGraph};
pub use kind::{RelKind, ReciprocalMap};
pub use reciprocity::missing_reciprocals;
pub use resolve::{Resolution, ResolutionTier, Resolver};
pub use sibling::{infer_sibling_parents, infer_to_fixed_point, SIBLING_ITERATION_CAP};
