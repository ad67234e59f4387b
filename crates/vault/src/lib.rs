//! `kingraph-vault` — person-record parsing and vault folder I/O.
//!
//! A vault is a flat folder of markdown records, one per person, keyed by
//! display name (`<Name>.md`). Each record carries a marker-delimited header
//! of `kind: value` relationship lines followed by free-form body text.

pub mod error;
pub mod record;
pub mod vault;

pub use error::VaultError;
pub use record::{apply_updates, parse_record, ParsedRecord};
pub use vault::{
    build_graph, create_stub, read_vault, record_path, write_updates, PersonRecord,
    VaultWarning,
};
