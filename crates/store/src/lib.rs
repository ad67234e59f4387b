//! `kingraph-store` — SQLite materializer and consistency auditor.
//!
//! Edges are stored by target *name string*, not foreign key, so references
//! to not-yet-created people stay representable and auditable. All joins go
//! through `name_lower`; the derived `person_<hex>` id is an opaque storage
//! detail and never a basis for equality.

pub mod audit;
pub mod db;
pub mod error;

pub use db::{person_id, BuildCounts, Edge, PersonEntry, Store};
pub use error::StoreError;
