// Materialized family-graph store using SQLite

use std::fs;
use std::path::Path;

use rusqlite::{params, Connection};
use sha2::{Digest, Sha256};

use kingraph_engine::RelKind;

use crate::error::StoreError;

pub const SCHEMA_VERSION: &str = "1";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS people (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    name_lower TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS relationships (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_id TEXT NOT NULL,
    to_name TEXT NOT NULL,           -- target NAME, not a foreign key
    relationship_type TEXT NOT NULL,
    FOREIGN KEY (from_id) REFERENCES people(id)
);

CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT
);

CREATE INDEX IF NOT EXISTS idx_name_lower ON people(name_lower);
CREATE INDEX IF NOT EXISTS idx_from_id ON relationships(from_id);
CREATE INDEX IF NOT EXISTS idx_rel_type ON relationships(relationship_type);
-- Backs edge idempotence: rebuilding over the same source adds no rows.
CREATE UNIQUE INDEX IF NOT EXISTS idx_rel_unique
    ON relationships(from_id, to_name, relationship_type);
"#;

/// Derived storage id: `person_` + first 12 hex chars of SHA-256 of the
/// display name. Deterministic and opaque; equality always goes through
/// `name_lower`, never through this id.
pub fn person_id(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    let hex: String = digest[..6].iter().map(|b| format!("{b:02x}")).collect();
    format!("person_{hex}")
}

/// One resolved edge ready for materialization.
#[derive(Debug, Clone)]
pub struct Edge {
    pub kind: RelKind,
    pub target: String,
}

/// One person with their resolved edges (aliases included, as alias rows).
#[derive(Debug, Clone)]
pub struct PersonEntry {
    pub name: String,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildCounts {
    pub people: usize,
    pub edges_inserted: usize,
    /// Edges already present with identical (source, target, kind).
    pub edges_skipped: usize,
}

#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Create a fresh store at `path`, replacing any existing file.
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
            }
        }
        if path.exists() {
            fs::remove_file(path).map_err(|e| StoreError::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Open an existing store. A missing file is an error, not an empty
    /// store — audit tooling must never silently report a clean slate.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.is_file() {
            return Err(StoreError::Missing(path.to_path_buf()));
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// In-memory store with schema applied.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Persist people and edges in one transaction, then stamp metadata.
    /// Entities upsert by id; edges dedupe against the unique index; empty
    /// target names are skipped. Any failure rolls the whole run back.
    pub fn materialize(&mut self, people: &[PersonEntry]) -> Result<BuildCounts, StoreError> {
        let tx = self.conn.transaction()?;
        let mut counts = BuildCounts::default();

        {
            let mut upsert = tx.prepare(
                "INSERT OR REPLACE INTO people (id, name, name_lower) VALUES (?1, ?2, ?3)",
            )?;
            for person in people {
                upsert.execute(params![
                    person_id(&person.name),
                    person.name,
                    person.name.to_lowercase()
                ])?;
                counts.people += 1;
            }

            let mut insert = tx.prepare(
                "INSERT OR IGNORE INTO relationships (from_id, to_name, relationship_type)
                 VALUES (?1, ?2, ?3)",
            )?;
            for person in people {
                let from_id = person_id(&person.name);
                for edge in &person.edges {
                    if edge.target.trim().is_empty() {
                        continue;
                    }
                    let inserted =
                        insert.execute(params![from_id, edge.target, edge.kind.as_str()])?;
                    if inserted > 0 {
                        counts.edges_inserted += 1;
                    } else {
                        counts.edges_skipped += 1;
                    }
                }
            }

            let mut meta = tx.prepare(
                "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            )?;
            meta.execute(params!["build_time", chrono::Utc::now().to_rfc3339()])?;
            meta.execute(params!["schema_version", SCHEMA_VERSION])?;
            meta.execute(params!["encrypted", "false"])?; // encryption is a stub
        }

        tx.commit()?;
        Ok(counts)
    }

    /// Metadata value for `key`, if present.
    pub fn metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM metadata WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}
