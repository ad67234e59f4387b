// Kingraph CLI - genealogy vault consistency and database operations
//
// Four batch entry points over a vault of person records:
//   fix     - repair missing reciprocal edges, infer parents from siblings
//   build   - materialize the vault into the SQLite store
//   check   - gate on dangling references / duplicate identities
//   orphans - diagnose disconnected people, optionally create stub records

mod config;
mod exit_codes;
mod report;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use kingraph_engine::{
    infer_to_fixed_point, missing_reciprocals, ReciprocalMap, RelKind, ResolutionTier,
    Resolver, SIBLING_ITERATION_CAP,
};
use kingraph_store::{audit, Edge, PersonEntry, Store, StoreError};
use kingraph_vault::{build_graph, create_stub, read_vault, record_path, write_updates, VaultError};

use config::Locations;
use exit_codes::{
    EXIT_DEFECTS, EXIT_ERROR, EXIT_STORE_MISSING, EXIT_STORE_WRITE, EXIT_SUCCESS, EXIT_USAGE,
    EXIT_VAULT, EXIT_WRITEBACK,
};

/// Bounded-preview size for warning lists and update summaries.
const PREVIEW_LIMIT: usize = 10;
/// One-way relationship lists run long on messy vaults; show more of them.
const ONE_WAY_PREVIEW_LIMIT: usize = 20;

#[derive(Parser)]
#[command(name = "kingraph")]
#[command(about = "Genealogy vault graph maintenance (headless, batch)")]
#[command(version)]
struct Cli {
    /// Vault folder of person records (overrides kingraph.toml)
    #[arg(long, global = true, value_name = "DIR")]
    people_dir: Option<PathBuf>,

    /// SQLite store path (overrides kingraph.toml)
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add missing reciprocal relationships and infer parents from siblings
    #[command(after_help = "\
Reads every record, computes the missing-edge set, shows a preview, and only
writes headers back after confirmation. Targets without a record file are
skipped with a warning; use 'kingraph orphans' to create stubs for them.

Examples:
  kingraph fix
  kingraph fix --yes
  kingraph --people-dir Family fix")]
    Fix {
        /// Apply without prompting
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Build the SQLite store from the vault
    #[command(after_help = "\
Recreates the store file from scratch: parses every record, resolves each
relationship target against the known people (exact, case-insensitive, then
fuzzy at 0.85), and reports what could not be resolved. Unresolved targets
are kept verbatim so 'kingraph check' can surface them.

Examples:
  kingraph build
  kingraph build --db out/family.db
  KINGRAPH_ENCRYPTION_KEY=secret kingraph build   # key is read but unused")]
    Build {
        /// Reserved: store encryption is not implemented, the key is ignored
        #[arg(long, env = "KINGRAPH_ENCRYPTION_KEY", hide_env_values = true)]
        encryption_key: Option<String>,
    },

    /// Check an existing store for dangling references and duplicates
    #[command(after_help = "\
Exit code 13 means defects were found; 0 means the store is consistent.
Suitable as a CI gate after 'kingraph build'.

Examples:
  kingraph check
  kingraph check --json")]
    Check {
        /// Emit the report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Diagnose disconnected people; optionally create stub records
    #[command(after_help = "\
Reports orphans, outgoing-only people, dangling references, and one-way
parent/child relationships, then offers to create a placeholder record for
every dangling target.

Examples:
  kingraph orphans
  kingraph orphans --list
  kingraph orphans --create-stubs")]
    Orphans {
        /// Create stub records for all missing people without prompting
        #[arg(long, conflicts_with_all = ["list", "json"])]
        create_stubs: bool,

        /// Only list missing people, never prompt
        #[arg(long, conflicts_with = "json")]
        list: bool,

        /// Emit the full audit report as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

struct CliError {
    code: u8,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn error(message: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: message.into(), hint: None }
    }

    fn vault(err: VaultError) -> Self {
        let hint = match &err {
            VaultError::MissingFolder(_) => {
                Some("set --people-dir or [vault] people_dir in kingraph.toml".to_string())
            }
            _ => None,
        };
        Self { code: EXIT_VAULT, message: err.to_string(), hint }
    }

    fn store_open(err: StoreError) -> Self {
        match err {
            StoreError::Missing(_) => Self {
                code: EXIT_STORE_MISSING,
                message: err.to_string(),
                hint: Some("run 'kingraph build' first".to_string()),
            },
            other => Self::error(other.to_string()),
        }
    }

    fn store_write(err: StoreError) -> Self {
        Self { code: EXIT_STORE_WRITE, message: err.to_string(), hint: None }
    }

    fn writeback(err: VaultError) -> Self {
        Self { code: EXIT_WRITEBACK, message: err.to_string(), hint: None }
    }

    fn io(err: std::io::Error) -> Self {
        Self::error(err.to_string())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);
    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let locations = config::resolve(cli.people_dir, cli.db)
        .map_err(|message| CliError { code: EXIT_USAGE, message, hint: None })?;

    match cli.command {
        Commands::Fix { yes } => cmd_fix(&locations, yes),
        Commands::Build { encryption_key } => cmd_build(&locations, encryption_key),
        Commands::Check { json } => cmd_check(&locations, json),
        Commands::Orphans { create_stubs, list, json } => {
            cmd_orphans(&locations, create_stubs, list, json)
        }
    }
}

// ---------------------------------------------------------------------------
// fix
// ---------------------------------------------------------------------------

fn cmd_fix(locations: &Locations, yes: bool) -> Result<(), CliError> {
    let (records, warnings) = read_vault(&locations.people_dir).map_err(CliError::vault)?;
    println!(
        "Read {} records from {}",
        records.len(),
        locations.people_dir.display()
    );
    if !warnings.is_empty() {
        println!("{} records skipped:", warnings.len());
        report::print_preview(&warnings, PREVIEW_LIMIT, |w| w.to_string());
    }

    let mut graph = build_graph(&records);

    // Reciprocals are computed against the graph as authored; inference then
    // folds its own output in while iterating to a fixed point.
    let mut updates = missing_reciprocals(&graph, &ReciprocalMap::family());
    let reciprocal_count = updates.edge_count();
    let (inferred, rounds) = infer_to_fixed_point(&mut graph, SIBLING_ITERATION_CAP);
    let inferred_count = inferred.edge_count();
    updates.merge(inferred);

    println!("Missing reciprocal relationships: {reciprocal_count}");
    println!("Inferred sibling parent/child relationships: {inferred_count} ({rounds} pass(es))");

    if updates.is_empty() {
        println!("Nothing to fix; all relationships are complete.");
        return Ok(());
    }

    println!();
    println!(
        "{} updates across {} people:",
        updates.edge_count(),
        updates.person_count()
    );
    let people: Vec<(&str, &BTreeMap<RelKind, BTreeSet<String>>)> = updates.iter().collect();
    report::print_preview(&people, PREVIEW_LIMIT, |(person, kinds)| {
        let parts: Vec<String> = kinds
            .iter()
            .map(|(kind, names)| {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                format!("{kind}: {}", names.join(", "))
            })
            .collect();
        format!("{person} will get {}", parts.join("; "))
    });

    if !yes {
        println!();
        if !report::confirm("Apply these changes? (y/n): ").map_err(CliError::io)? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let mut updated = 0usize;
    let mut missing_files: Vec<String> = Vec::new();
    for (person, kinds) in updates.iter() {
        let path = record_path(&locations.people_dir, person);
        if !path.is_file() {
            missing_files.push(person.to_string());
            continue;
        }
        write_updates(&path, kinds).map_err(CliError::writeback)?;
        updated += 1;
    }

    println!("Updated {updated} records");
    if !missing_files.is_empty() {
        println!(
            "{} referenced people have no record file; their reciprocals were not written:",
            missing_files.len()
        );
        report::print_preview(&missing_files, PREVIEW_LIMIT, |name| name.clone());
        println!("  (use 'kingraph orphans' after a rebuild to create stubs)");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

fn cmd_build(locations: &Locations, encryption_key: Option<String>) -> Result<(), CliError> {
    let (records, warnings) = read_vault(&locations.people_dir).map_err(CliError::vault)?;
    if records.is_empty() {
        return Err(CliError {
            code: EXIT_VAULT,
            message: format!("no records found in {}", locations.people_dir.display()),
            hint: Some("the vault folder must contain one .md file per person".to_string()),
        });
    }
    println!("Parsed {} records", records.len());
    if !warnings.is_empty() {
        println!("{} records skipped:", warnings.len());
        report::print_preview(&warnings, PREVIEW_LIMIT, |w| w.to_string());
    }

    let resolver = Resolver::new(records.iter().map(|r| r.name.clone()));
    let mut resolution_warnings: Vec<String> = Vec::new();
    let mut entries: Vec<PersonEntry> = Vec::with_capacity(records.len());

    for rec in &records {
        let mut edges = Vec::new();
        for (kind, names) in &rec.record.relationships {
            for raw in names {
                let resolution = resolver.resolve(raw);
                match resolution.tier {
                    ResolutionTier::Exact => {}
                    ResolutionTier::CaseInsensitive => resolution_warnings.push(format!(
                        "'{}' -> {kind} -> '{raw}' (case mismatch, using '{}')",
                        rec.name, resolution.resolved
                    )),
                    ResolutionTier::Fuzzy => resolution_warnings.push(format!(
                        "'{}' -> {kind} -> '{raw}' (fuzzy matched to '{}')",
                        rec.name, resolution.resolved
                    )),
                    ResolutionTier::Unresolved => resolution_warnings.push(format!(
                        "'{}' -> {kind} -> '{raw}' (not found; edge kept, will dangle)",
                        rec.name
                    )),
                }
                edges.push(Edge { kind: *kind, target: resolution.resolved });
            }
        }
        // Aliases are stored as-is; they are annotations, not references.
        for alias in &rec.record.aliases {
            edges.push(Edge { kind: RelKind::Alias, target: alias.clone() });
        }
        entries.push(PersonEntry { name: rec.name.clone(), edges });
    }

    if !resolution_warnings.is_empty() {
        println!("{} relationship resolution warnings:", resolution_warnings.len());
        report::print_preview(&resolution_warnings, PREVIEW_LIMIT, |w| w.clone());
    }

    let mut store = Store::create(&locations.db_path).map_err(CliError::store_write)?;
    let counts = store.materialize(&entries).map_err(CliError::store_write)?;

    println!("Store written: {}", locations.db_path.display());
    println!(
        "  {} people, {} relationships ({} already present)",
        counts.people, counts.edges_inserted, counts.edges_skipped
    );
    if let Ok(meta) = fs::metadata(&locations.db_path) {
        println!("  {} bytes", meta.len());
    }

    if encryption_key.as_deref().is_some_and(|key| !key.is_empty()) {
        println!("note: store encryption is not implemented; the key was ignored");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

fn cmd_check(locations: &Locations, json: bool) -> Result<(), CliError> {
    let store = Store::open(&locations.db_path).map_err(CliError::store_open)?;

    let dangling = audit::dangling_rollup(&store).map_err(|e| CliError::error(e.to_string()))?;
    let duplicates =
        audit::duplicate_identities(&store).map_err(|e| CliError::error(e.to_string()))?;
    let stats = audit::stats(&store).map_err(|e| CliError::error(e.to_string()))?;
    let ok = dangling.is_empty() && duplicates.is_empty();

    if json {
        #[derive(serde::Serialize)]
        struct CheckReport<'a> {
            ok: bool,
            dangling: &'a [audit::DanglingTarget],
            duplicates: &'a [audit::DuplicateGroup],
            stats: &'a audit::StoreStats,
        }
        let rendered = serde_json::to_string_pretty(&CheckReport {
            ok,
            dangling: &dangling,
            duplicates: &duplicates,
            stats: &stats,
        })
        .map_err(|e| CliError::error(e.to_string()))?;
        println!("{rendered}");
    } else {
        if !dangling.is_empty() {
            println!("Dangling relationship targets (no matching record):");
            for target in &dangling {
                let plural = if target.reference_count == 1 { "" } else { "s" };
                println!(
                    "  - '{}' ({}, {} reference{plural})",
                    target.to_name, target.kind, target.reference_count
                );
            }
            println!();
        }
        if !duplicates.is_empty() {
            println!("Duplicate people entries:");
            for group in &duplicates {
                println!("  '{}' appears {} times:", group.name_lower, group.entries.len());
                for entry in &group.entries {
                    println!("    - {} (id {})", entry.name, entry.id);
                }
            }
            println!();
        }
        if ok {
            println!("Consistency check passed:");
            println!("  - all relationships point to known people");
            println!("  - no duplicate identities");
        }
        println!();
        println!("Statistics:");
        println!("  - {} people", stats.total_people);
        println!("  - {} relationships", stats.relationship_count);
        println!("  - {} aliases", stats.alias_count);
    }

    if ok {
        Ok(())
    } else {
        Err(CliError {
            code: EXIT_DEFECTS,
            message: if json {
                String::new()
            } else {
                format!(
                    "{} dangling target(s), {} duplicate identit{}",
                    dangling.len(),
                    duplicates.len(),
                    if duplicates.len() == 1 { "y" } else { "ies" }
                )
            },
            hint: if json {
                None
            } else {
                Some("fix the vault ('kingraph fix', 'kingraph orphans') and rebuild".to_string())
            },
        })
    }
}

// ---------------------------------------------------------------------------
// orphans
// ---------------------------------------------------------------------------

fn cmd_orphans(
    locations: &Locations,
    create_stubs: bool,
    list: bool,
    json: bool,
) -> Result<(), CliError> {
    let store = Store::open(&locations.db_path).map_err(CliError::store_open)?;
    let as_cli_error = |e: StoreError| CliError::error(e.to_string());

    if json {
        let full = audit::full_report(&store).map_err(as_cli_error)?;
        let rendered =
            serde_json::to_string_pretty(&full).map_err(|e| CliError::error(e.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }

    let stats = audit::stats(&store).map_err(as_cli_error)?;
    println!("Statistics:");
    println!("  - {} people, {} with relationships, {} without",
        stats.total_people, stats.people_with_edges, stats.people_without_edges);
    for (kind, count) in &stats.kind_counts {
        println!("  - {kind}: {count}");
    }

    let orphans = audit::orphans(&store).map_err(as_cli_error)?;
    println!();
    println!("Orphaned people (no connections at all): {}", orphans.len());
    report::print_preview(&orphans, PREVIEW_LIMIT, |o| format!("{} (id {})", o.name, o.id));

    let outgoing = audit::outgoing_only(&store).map_err(as_cli_error)?;
    println!();
    println!("Outgoing-only people (never referenced back): {}", outgoing.len());
    report::print_preview(&outgoing, PREVIEW_LIMIT, |o| {
        format!("{} -> references {} people", o.name, o.distinct_targets)
    });

    let dangling = audit::dangling_edges(&store).map_err(as_cli_error)?;
    println!();
    println!("Dangling references (target has no record): {}", dangling.len());
    report::print_preview(&dangling, PREVIEW_LIMIT, |e| {
        format!("{} -> {} -> '{}'", e.from_name, e.kind, e.to_name)
    });

    let one_way = audit::one_way_parent_child(&store).map_err(as_cli_error)?;
    println!();
    println!("One-way parent/child relationships: {}", one_way.len());
    report::print_preview(&one_way, ONE_WAY_PREVIEW_LIMIT, |e| {
        format!("{} -> {}: {}", e.person, e.other, e.missing)
    });

    let targets = audit::dangling_target_names(&store).map_err(as_cli_error)?;
    println!();
    if targets.is_empty() {
        println!("No missing records to create.");
        return Ok(());
    }
    println!(
        "{} people are referenced in relationships but have no record",
        targets.len()
    );

    if list {
        print_missing_list(&targets);
        return Ok(());
    }
    if create_stubs {
        return create_all_stubs(locations, &targets);
    }

    println!();
    println!("Options:");
    println!("  1. create stub records for ALL missing people");
    println!("  2. list them and decide later");
    println!("  3. exit");
    match report::read_choice("Choose (1/2/3): ").map_err(CliError::io)?.as_str() {
        "1" => create_all_stubs(locations, &targets),
        "2" => {
            print_missing_list(&targets);
            Ok(())
        }
        _ => {
            println!("Exiting.");
            Ok(())
        }
    }
}

fn print_missing_list(targets: &[String]) {
    println!();
    println!("Missing people (referenced but no record exists):");
    for (i, name) in targets.iter().enumerate() {
        println!("{:3}. {}", i + 1, name);
    }
    println!();
    println!("Total: {} missing people", targets.len());
}

fn create_all_stubs(locations: &Locations, targets: &[String]) -> Result<(), CliError> {
    let mut created = 0usize;
    for name in targets {
        if create_stub(&locations.people_dir, name).map_err(CliError::writeback)? {
            created += 1;
        }
    }
    println!("Created {created} stub records in {}", locations.people_dir.display());
    println!("Edit them, then rerun 'kingraph build' and 'kingraph check'.");
    Ok(())
}
