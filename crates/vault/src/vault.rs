//! Vault folder reading, write-back, and stub creation.
//!
//! Reading is skip-and-warn: one unreadable record never aborts the batch.
//! Records are returned in filename order so every downstream report is
//! stable.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use kingraph_engine::{RelKind, RelationGraph};

use crate::error::VaultError;
use crate::record::{apply_updates, parse_record, ParsedRecord};

/// One person record loaded from the vault. The display name is the
/// filename stem.
#[derive(Debug, Clone)]
pub struct PersonRecord {
    pub name: String,
    pub path: PathBuf,
    pub record: ParsedRecord,
}

/// A record skipped while reading the vault.
#[derive(Debug, Clone)]
pub struct VaultWarning {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for VaultWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped {}: {}", self.path.display(), self.message)
    }
}

/// Read every `*.md` record in `dir` (non-recursive), in filename order.
pub fn read_vault(dir: &Path) -> Result<(Vec<PersonRecord>, Vec<VaultWarning>), VaultError> {
    if !dir.is_dir() {
        return Err(VaultError::MissingFolder(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|e| VaultError::List {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "md") && path.is_file())
        .collect();
    paths.sort();

    let mut records = Vec::with_capacity(paths.len());
    let mut warnings = Vec::new();

    for path in paths {
        let stem = path.file_stem().and_then(|s| s.to_str()).map(str::to_string);
        let Some(name) = stem else {
            warnings.push(VaultWarning {
                path,
                message: "filename is not valid UTF-8".to_string(),
            });
            continue;
        };
        match fs::read_to_string(&path) {
            Ok(content) => {
                let record = parse_record(&content);
                records.push(PersonRecord { name, path, record });
            }
            Err(e) => warnings.push(VaultWarning {
                path,
                message: e.to_string(),
            }),
        }
    }

    Ok((records, warnings))
}

/// Build the relationship graph from loaded records. Aliases are carried on
/// the records themselves and never become graph edges.
pub fn build_graph(records: &[PersonRecord]) -> RelationGraph {
    let mut graph = RelationGraph::new();
    for rec in records {
        graph.add_record(&rec.name);
        for (kind, names) in &rec.record.relationships {
            graph.add_edges(&rec.name, *kind, names.iter().cloned());
        }
    }
    graph
}

/// The record path for a display name.
pub fn record_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.md"))
}

/// Merge relationship updates into one record file.
pub fn write_updates(
    path: &Path,
    updates: &BTreeMap<RelKind, BTreeSet<String>>,
) -> Result<(), VaultError> {
    let content = fs::read_to_string(path).map_err(|e| VaultError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let merged = apply_updates(&content, updates);
    fs::write(path, merged).map_err(|e| VaultError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Placeholder body for records created by the orphan fixer.
fn stub_content(name: &str) -> String {
    format!(
        "---\n# TODO: add relationships for {name}\n---\n# {name}\n#people\n\n\
         ### Photo\n\n### About Me\n- Born on\n- Died on\n- Location\n\
         - Maiden Name\n- Nickname\n- Gender\n"
    )
}

/// Create a placeholder record for `name`. Returns false (and writes
/// nothing) if the record already exists.
pub fn create_stub(dir: &Path, name: &str) -> Result<bool, VaultError> {
    let path = record_path(dir, name);
    if path.exists() {
        return Ok(false);
    }
    fs::write(&path, stub_content(name)).map_err(|e| VaultError::Write {
        path,
        message: e.to_string(),
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn reads_records_in_filename_order() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "Cara.md", "---\nparent: [[Ada]]\n---\n");
        write(tmp.path(), "Ada.md", "body only\n");
        write(tmp.path(), "notes.txt", "ignored\n");

        let (records, warnings) = read_vault(tmp.path()).unwrap();
        assert!(warnings.is_empty());
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Ada", "Cara"]);
        assert_eq!(
            records[1].record.relationships[&RelKind::Parent],
            ["Ada"]
        );
    }

    #[test]
    fn missing_folder_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_vault(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, VaultError::MissingFolder(_)));
    }

    #[test]
    fn unreadable_record_is_skipped_with_warning() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "Ada.md", "fine\n");
        fs::write(tmp.path().join("Bad.md"), [0xff, 0xfe, 0x00]).unwrap();

        let (records, warnings) = read_vault(tmp.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].path.ends_with("Bad.md"));
    }

    #[test]
    fn graph_covers_records_and_edges() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "Ada.md", "---\nchild: [[Ben]]\nalias: [Addie]\n---\n");
        write(tmp.path(), "Ben.md", "no header\n");

        let (records, _) = read_vault(tmp.path()).unwrap();
        let graph = build_graph(&records);
        assert!(graph.has_record("Ada"));
        assert!(graph.has_record("Ben"));
        assert!(graph.has_edge("Ada", RelKind::Child, "Ben"));
        // Aliases are not graph edges.
        assert!(graph.targets("Ada", RelKind::Alias).is_empty());
    }

    #[test]
    fn write_updates_merges_into_file() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "Ben.md", "---\nparent: [[Ada]]\n---\nbody\n");

        let mut updates = BTreeMap::new();
        updates.insert(
            RelKind::Sibling,
            BTreeSet::from(["Cara".to_string()]),
        );
        let path = record_path(tmp.path(), "Ben");
        write_updates(&path, &updates).unwrap();

        let rec = parse_record(&fs::read_to_string(&path).unwrap());
        assert_eq!(rec.relationships[&RelKind::Parent], ["Ada"]);
        assert_eq!(rec.relationships[&RelKind::Sibling], ["Cara"]);
        assert_eq!(rec.body, "body\n");
    }

    #[test]
    fn stub_is_created_once() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(create_stub(tmp.path(), "Ghost").unwrap());
        assert!(!create_stub(tmp.path(), "Ghost").unwrap());

        let content = fs::read_to_string(record_path(tmp.path(), "Ghost")).unwrap();
        assert!(content.contains("# Ghost"));
        // A stub parses as an empty-relationship record.
        let rec = parse_record(&content);
        assert!(rec.relationships.is_empty());
    }
}
