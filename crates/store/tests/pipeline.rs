//! End-to-end pipeline: vault records → graph → resolution → store → audit.

use std::fs;
use std::path::Path;

use kingraph_engine::{
    infer_to_fixed_point, missing_reciprocals, ReciprocalMap, RelKind, Resolver,
    ResolutionTier, SIBLING_ITERATION_CAP,
};
use kingraph_store::{audit, Edge, PersonEntry, Store};
use kingraph_vault::{build_graph, read_vault, record};

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

/// Resolve every record's non-alias targets and shape them for the store,
/// the way the database builder does.
fn resolve_entries(records: &[kingraph_vault::PersonRecord]) -> Vec<PersonEntry> {
    let resolver = Resolver::new(records.iter().map(|r| r.name.clone()));
    records
        .iter()
        .map(|rec| {
            let mut edges = Vec::new();
            for (kind, names) in &rec.record.relationships {
                for name in names {
                    let resolution = resolver.resolve(name);
                    edges.push(Edge {
                        kind: *kind,
                        target: resolution.resolved,
                    });
                }
            }
            for alias in &rec.record.aliases {
                edges.push(Edge {
                    kind: RelKind::Alias,
                    target: alias.clone(),
                });
            }
            PersonEntry {
                name: rec.name.clone(),
                edges,
            }
        })
        .collect()
}

#[test]
fn fixer_scenario_writes_reciprocal_back() {
    // A lists B as parent; B's record is empty. The fixer must conclude
    // missing[B][child] = {A} and the write-back must add the line.
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "A.md", "---\nparent: [[B]]\n---\n");
    write(tmp.path(), "B.md", "# B\n");

    let (records, warnings) = read_vault(tmp.path()).unwrap();
    assert!(warnings.is_empty());
    let mut graph = build_graph(&records);

    let mut updates = missing_reciprocals(&graph, &ReciprocalMap::family());
    let (inferred, _) = infer_to_fixed_point(&mut graph, SIBLING_ITERATION_CAP);
    updates.merge(inferred);

    let kinds = updates.for_person("B").unwrap();
    let sources = kinds.get(&RelKind::Child).unwrap();
    assert_eq!(sources.iter().collect::<Vec<_>>(), [&"A".to_string()]);

    for (person, kinds) in updates.iter() {
        let path = tmp.path().join(format!("{person}.md"));
        assert!(path.is_file(), "fixer target {person} should exist here");
        kingraph_vault::vault::write_updates(&path, kinds).unwrap();
    }

    let b = record::parse_record(&fs::read_to_string(tmp.path().join("B.md")).unwrap());
    assert_eq!(b.relationships[&RelKind::Child], ["A"]);
}

#[test]
fn build_then_audit_surfaces_unresolved_target() {
    let tmp = tempfile::tempdir().unwrap();
    write(
        tmp.path(),
        "Ada.md",
        "---\nchild: [[Ben]]\nwife: [[Jon Smth]]\nalias: [Addie]\n---\n",
    );
    write(tmp.path(), "Ben.md", "---\nparent: [[ada]]\n---\n");

    let (records, _) = read_vault(tmp.path()).unwrap();

    // Resolver tiers: exact for Ben, case correction for "ada",
    // unresolved-kept for the typo with no close candidate.
    let resolver = Resolver::new(records.iter().map(|r| r.name.clone()));
    assert_eq!(resolver.resolve("Ben").tier, ResolutionTier::Exact);
    assert_eq!(resolver.resolve("ada").tier, ResolutionTier::CaseInsensitive);
    assert_eq!(resolver.resolve("ada").resolved, "Ada");
    assert_eq!(resolver.resolve("Jon Smth").tier, ResolutionTier::Unresolved);

    let entries = resolve_entries(&records);
    let db_path = tmp.path().join("graph/kingraph.db");
    let mut store = Store::create(&db_path).unwrap();
    let counts = store.materialize(&entries).unwrap();
    assert_eq!(counts.people, 2);
    // child, wife, parent, alias
    assert_eq!(counts.edges_inserted, 4);

    // The unresolved edge was kept and now dangles.
    let dangling = audit::dangling_edges(&store).unwrap();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].to_name, "Jon Smth");

    // Ada↔Ben are reciprocated (case-insensitively), so no one-way issues.
    assert!(audit::one_way_parent_child(&store).unwrap().is_empty());
    assert!(audit::duplicate_identities(&store).unwrap().is_empty());

    // Rebuilding over the same records is idempotent.
    let mut store = Store::create(&db_path).unwrap();
    store.materialize(&entries).unwrap();
    let counts = store.materialize(&entries).unwrap();
    assert_eq!(counts.edges_inserted, 0);
}

#[test]
fn sibling_clique_converges_through_the_pipeline() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "A.md", "---\nsibling: [[B]]\nparent: [[P]]\n---\n");
    write(tmp.path(), "B.md", "---\nsibling: [[A]]\n---\n");
    write(tmp.path(), "P.md", "---\nchild: [[A]]\n---\n");

    let (records, _) = read_vault(tmp.path()).unwrap();
    let mut graph = build_graph(&records);
    let (inferred, rounds) = infer_to_fixed_point(&mut graph, SIBLING_ITERATION_CAP);
    assert!(rounds < SIBLING_ITERATION_CAP);

    assert!(inferred
        .for_person("B")
        .and_then(|k| k.get(&RelKind::Parent))
        .is_some_and(|s| s.contains("P")));
    assert!(inferred
        .for_person("P")
        .and_then(|k| k.get(&RelKind::Child))
        .is_some_and(|s| s.contains("B")));
}
