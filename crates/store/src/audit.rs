//! Read-only structural checks over the materialized store.
//!
//! Every check returns data for reporting and mutates nothing; repair is the
//! reciprocity/inference engines' job, invoked explicitly with confirmation.
//! Alias rows are excluded throughout: an alias is a name annotation, not a
//! graph edge, so it neither counts as a connection nor dangles.

use serde::Serialize;

use crate::db::Store;
use crate::error::StoreError;

/// Entity with no outgoing and no incoming edges at all.
#[derive(Debug, Clone, Serialize)]
pub struct OrphanEntry {
    pub id: String,
    pub name: String,
}

/// Entity that references others but is never referenced back.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingOnlyEntry {
    pub id: String,
    pub name: String,
    pub distinct_targets: i64,
}

/// Edge whose target matches no known entity (case-insensitively).
#[derive(Debug, Clone, Serialize)]
pub struct DanglingEdge {
    pub from_name: String,
    pub to_name: String,
    pub kind: String,
}

/// Dangling targets rolled up with reference counts.
#[derive(Debug, Clone, Serialize)]
pub struct DanglingTarget {
    pub to_name: String,
    pub kind: String,
    pub reference_count: i64,
}

/// Parent/child edge whose mandated reciprocal is absent.
#[derive(Debug, Clone, Serialize)]
pub struct OneWayEdge {
    pub person: String,
    pub other: String,
    pub missing: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateEntry {
    pub id: String,
    pub name: String,
}

/// A normalized name carried by more than one distinct id.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub name_lower: String,
    pub entries: Vec<DuplicateEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total_people: i64,
    pub people_with_edges: i64,
    pub people_without_edges: i64,
    /// Row count per relationship type, alias included.
    pub kind_counts: Vec<(String, i64)>,
    pub relationship_count: i64,
    pub alias_count: i64,
}

/// All audit categories in one pass, for reporting or `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub stats: StoreStats,
    pub orphans: Vec<OrphanEntry>,
    pub outgoing_only: Vec<OutgoingOnlyEntry>,
    pub dangling: Vec<DanglingEdge>,
    pub one_way: Vec<OneWayEdge>,
    pub duplicates: Vec<DuplicateGroup>,
}

pub fn orphans(store: &Store) -> Result<Vec<OrphanEntry>, StoreError> {
    let mut stmt = store.conn().prepare(
        "SELECT p.id, p.name
         FROM people p
         WHERE NOT EXISTS (
             SELECT 1 FROM relationships r
             WHERE r.from_id = p.id AND r.relationship_type != 'alias'
         )
         AND NOT EXISTS (
             SELECT 1 FROM relationships r
             WHERE LOWER(r.to_name) = p.name_lower AND r.relationship_type != 'alias'
         )
         ORDER BY p.name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(OrphanEntry {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}

pub fn outgoing_only(store: &Store) -> Result<Vec<OutgoingOnlyEntry>, StoreError> {
    let mut stmt = store.conn().prepare(
        "SELECT p.id, p.name, COUNT(DISTINCT r.to_name)
         FROM people p
         JOIN relationships r ON r.from_id = p.id AND r.relationship_type != 'alias'
         WHERE NOT EXISTS (
             SELECT 1 FROM relationships r2
             WHERE LOWER(r2.to_name) = p.name_lower AND r2.relationship_type != 'alias'
         )
         GROUP BY p.id, p.name
         ORDER BY p.name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(OutgoingOnlyEntry {
            id: row.get(0)?,
            name: row.get(1)?,
            distinct_targets: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}

pub fn dangling_edges(store: &Store) -> Result<Vec<DanglingEdge>, StoreError> {
    let mut stmt = store.conn().prepare(
        "SELECT p.name, r.to_name, r.relationship_type
         FROM relationships r
         JOIN people p ON r.from_id = p.id
         WHERE r.relationship_type != 'alias'
         AND NOT EXISTS (
             SELECT 1 FROM people p2 WHERE LOWER(r.to_name) = p2.name_lower
         )
         ORDER BY p.name, r.to_name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(DanglingEdge {
            from_name: row.get(0)?,
            to_name: row.get(1)?,
            kind: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Dangling targets grouped by (name, kind), most-referenced first.
pub fn dangling_rollup(store: &Store) -> Result<Vec<DanglingTarget>, StoreError> {
    let mut stmt = store.conn().prepare(
        "SELECT r.to_name, r.relationship_type, COUNT(*) AS refs
         FROM relationships r
         WHERE r.relationship_type != 'alias'
         AND NOT EXISTS (
             SELECT 1 FROM people p WHERE LOWER(r.to_name) = p.name_lower
         )
         GROUP BY r.to_name, r.relationship_type
         ORDER BY refs DESC, r.to_name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(DanglingTarget {
            to_name: row.get(0)?,
            kind: row.get(1)?,
            reference_count: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Distinct dangling target names, sorted — the stub-creation work list.
pub fn dangling_target_names(store: &Store) -> Result<Vec<String>, StoreError> {
    let mut stmt = store.conn().prepare(
        "SELECT DISTINCT r.to_name
         FROM relationships r
         WHERE r.relationship_type != 'alias'
         AND NOT EXISTS (
             SELECT 1 FROM people p WHERE LOWER(r.to_name) = p.name_lower
         )
         ORDER BY r.to_name",
    )?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Parent/child edges with a known target but no reciprocal edge back.
pub fn one_way_parent_child(store: &Store) -> Result<Vec<OneWayEdge>, StoreError> {
    let mut stmt = store.conn().prepare(
        "SELECT p1.name, r.to_name, 'parent->child missing' AS missing
         FROM relationships r
         JOIN people p1 ON r.from_id = p1.id
         JOIN people p2 ON LOWER(r.to_name) = p2.name_lower
         WHERE r.relationship_type = 'parent'
         AND NOT EXISTS (
             SELECT 1 FROM relationships r2
             WHERE r2.from_id = p2.id
             AND r2.relationship_type = 'child'
             AND LOWER(r2.to_name) = p1.name_lower
         )
         UNION ALL
         SELECT p1.name, r.to_name, 'child->parent missing' AS missing
         FROM relationships r
         JOIN people p1 ON r.from_id = p1.id
         JOIN people p2 ON LOWER(r.to_name) = p2.name_lower
         WHERE r.relationship_type = 'child'
         AND NOT EXISTS (
             SELECT 1 FROM relationships r2
             WHERE r2.from_id = p2.id
             AND r2.relationship_type = 'parent'
             AND LOWER(r2.to_name) = p1.name_lower
         )
         ORDER BY 1, 2",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(OneWayEdge {
            person: row.get(0)?,
            other: row.get(1)?,
            missing: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}

pub fn duplicate_identities(store: &Store) -> Result<Vec<DuplicateGroup>, StoreError> {
    let mut stmt = store.conn().prepare(
        "SELECT name_lower, COUNT(*) AS n
         FROM people
         GROUP BY name_lower
         HAVING n > 1
         ORDER BY n DESC, name_lower",
    )?;
    let lowers: Vec<String> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    let mut groups = Vec::with_capacity(lowers.len());
    let mut entry_stmt = store
        .conn()
        .prepare("SELECT id, name FROM people WHERE name_lower = ?1 ORDER BY id")?;
    for name_lower in lowers {
        let entries: Vec<DuplicateEntry> = entry_stmt
            .query_map(rusqlite::params![name_lower], |row| {
                Ok(DuplicateEntry {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        groups.push(DuplicateGroup { name_lower, entries });
    }
    Ok(groups)
}

pub fn stats(store: &Store) -> Result<StoreStats, StoreError> {
    let conn = store.conn();
    let total_people: i64 = conn.query_row("SELECT COUNT(*) FROM people", [], |r| r.get(0))?;
    let people_with_edges: i64 = conn.query_row(
        "SELECT COUNT(DISTINCT from_id) FROM relationships WHERE relationship_type != 'alias'",
        [],
        |r| r.get(0),
    )?;

    let mut stmt = conn.prepare(
        "SELECT relationship_type, COUNT(*)
         FROM relationships
         GROUP BY relationship_type
         ORDER BY relationship_type",
    )?;
    let kind_counts: Vec<(String, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<_, _>>()?;

    let alias_count = kind_counts
        .iter()
        .find(|(kind, _)| kind == "alias")
        .map_or(0, |(_, n)| *n);
    let relationship_count: i64 = kind_counts
        .iter()
        .filter(|(kind, _)| kind != "alias")
        .map(|(_, n)| *n)
        .sum();

    Ok(StoreStats {
        total_people,
        people_with_edges,
        people_without_edges: total_people - people_with_edges,
        kind_counts,
        relationship_count,
        alias_count,
    })
}

pub fn full_report(store: &Store) -> Result<AuditReport, StoreError> {
    Ok(AuditReport {
        stats: stats(store)?,
        orphans: orphans(store)?,
        outgoing_only: outgoing_only(store)?,
        dangling: dangling_edges(store)?,
        one_way: one_way_parent_child(store)?,
        duplicates: duplicate_identities(store)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Edge, PersonEntry, Store};
    use kingraph_engine::RelKind;

    fn seeded(entries: &[(&str, &[(RelKind, &str)])]) -> Store {
        let mut store = Store::open_in_memory().unwrap();
        let people: Vec<PersonEntry> = entries
            .iter()
            .map(|(name, edges)| PersonEntry {
                name: name.to_string(),
                edges: edges
                    .iter()
                    .map(|(kind, target)| Edge {
                        kind: *kind,
                        target: target.to_string(),
                    })
                    .collect(),
            })
            .collect();
        store.materialize(&people).unwrap();
        store
    }

    #[test]
    fn orphan_has_no_edges_either_way() {
        let store = seeded(&[
            ("Ada", &[(RelKind::Child, "Ben")]),
            ("Ben", &[(RelKind::Parent, "Ada")]),
            ("Loner", &[]),
        ]);
        let found = orphans(&store).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Loner");
    }

    #[test]
    fn alias_rows_do_not_rescue_an_orphan() {
        // An alias-only record is still an orphan: aliases aren't edges.
        let store = seeded(&[("Loner", &[(RelKind::Alias, "Lone")])]);
        let found = orphans(&store).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn incoming_match_is_case_insensitive() {
        let store = seeded(&[
            ("Ada", &[(RelKind::Child, "ben")]),
            ("Ben", &[]),
        ]);
        // "ben" reaches Ben despite the case difference.
        assert!(orphans(&store).unwrap().iter().all(|o| o.name != "Ben"));
    }

    #[test]
    fn outgoing_only_counts_distinct_targets() {
        let store = seeded(&[
            ("Ada", &[(RelKind::Child, "Ben"), (RelKind::Child, "Cara")]),
            ("Ben", &[]),
            ("Cara", &[]),
        ]);
        let found = outgoing_only(&store).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Ada");
        assert_eq!(found[0].distinct_targets, 2);
    }

    #[test]
    fn dangling_reference_is_reported_with_source_and_kind() {
        let store = seeded(&[("Ada", &[(RelKind::Child, "Jon Smth")])]);
        let edges = dangling_edges(&store).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from_name, "Ada");
        assert_eq!(edges[0].to_name, "Jon Smth");
        assert_eq!(edges[0].kind, "child");

        let rollup = dangling_rollup(&store).unwrap();
        assert_eq!(rollup[0].reference_count, 1);
        assert_eq!(dangling_target_names(&store).unwrap(), ["Jon Smth"]);
    }

    #[test]
    fn alias_rows_never_dangle() {
        let store = seeded(&[("Ada", &[(RelKind::Alias, "The Matriarch")])]);
        assert!(dangling_edges(&store).unwrap().is_empty());
        assert!(dangling_target_names(&store).unwrap().is_empty());
    }

    #[test]
    fn one_way_parent_child_both_directions() {
        let store = seeded(&[
            ("Ada", &[(RelKind::Child, "Ben")]),
            ("Ben", &[]),
            ("Cara", &[(RelKind::Parent, "Ada")]),
        ]);
        let found = one_way_parent_child(&store).unwrap();
        let issues: Vec<(&str, &str)> = found
            .iter()
            .map(|e| (e.person.as_str(), e.missing.as_str()))
            .collect();
        assert!(issues.contains(&("Ada", "child->parent missing")));
        assert!(issues.contains(&("Cara", "parent->child missing")));
    }

    #[test]
    fn reciprocated_pair_passes_audit() {
        let store = seeded(&[
            ("Ada", &[(RelKind::Child, "Ben")]),
            ("Ben", &[(RelKind::Parent, "Ada")]),
        ]);
        assert!(one_way_parent_child(&store).unwrap().is_empty());
    }

    #[test]
    fn duplicate_identities_group_by_name_lower() {
        let store = seeded(&[("Ada Smith", &[]), ("ada smith", &[])]);
        let groups = duplicate_identities(&store).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name_lower, "ada smith");
        assert_eq!(groups[0].entries.len(), 2);
    }

    #[test]
    fn stats_split_aliases_from_relationships() {
        let store = seeded(&[
            ("Ada", &[(RelKind::Child, "Ben"), (RelKind::Alias, "Addie")]),
            ("Ben", &[]),
        ]);
        let s = stats(&store).unwrap();
        assert_eq!(s.total_people, 2);
        assert_eq!(s.people_with_edges, 1);
        assert_eq!(s.people_without_edges, 1);
        assert_eq!(s.relationship_count, 1);
        assert_eq!(s.alias_count, 1);
    }

    #[test]
    fn full_report_is_serializable() {
        let store = seeded(&[("Ada", &[(RelKind::Child, "Ghost")])]);
        let report = full_report(&store).unwrap();
        let json = serde_json::to_value(&report);
        assert!(json.is_ok());
    }
}
