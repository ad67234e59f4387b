//! Record header parsing and write-back.
//!
//! Header grammar, tolerant by design (malformed or legacy records are body,
//! never an error):
//!
//! ```text
//! ---
//! parent: [[Ada Smith]]
//! child: [[[Ben Smith]], [[Cara Smith]]]
//! alias: [Benny, Big Ben]
//! ---
//! free-form body
//! ```
//!
//! Each recognized kind appears on at most one logical line; the first wins.
//! Wiki links tolerate repeated brackets (`[[Name]]` and `[[[Name]]]` parse
//! the same). `alias` is a plain bracketed comma-separated list of bare
//! names, kept as raw strings and never name-resolved.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use kingraph_engine::RelKind;

/// One record split into header, typed relationships, aliases, and body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecord {
    /// Raw header text between the markers, if a header block was found.
    pub header: Option<String>,
    /// Graph-kind relationships, target names in header order.
    pub relationships: BTreeMap<RelKind, Vec<String>>,
    /// Raw alias strings, untouched.
    pub aliases: Vec<String>,
    pub body: String,
}

/// Split `content` into header text and the remainder.
///
/// The header must start at the very beginning of the document. An absent or
/// unterminated marker pair means the whole document is body.
fn split_header(content: &str) -> Option<(&str, &str)> {
    let re = Regex::new(r"(?s)\A---\n(.*?)\n---\n?(.*)\z").unwrap();
    let caps = re.captures(content)?;
    Some((caps.get(1).unwrap().as_str(), caps.get(2).unwrap().as_str()))
}

/// Extract wiki-link-wrapped names from a relationship value.
/// `[[Name]]` and `[[[Name]]]` are accepted equally; names are trimmed.
fn extract_names(value: &str) -> Vec<String> {
    let re = Regex::new(r"\[\[+([^\]]+)\]+").unwrap();
    re.captures_iter(value)
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Extract bare alias names from a plain bracketed list.
fn extract_aliases(value: &str) -> Vec<String> {
    value
        .trim()
        .trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split one header line into a kind token and its value, if it is a
/// recognized relationship line.
fn split_kind_line(line: &str) -> Option<(RelKind, &str)> {
    let (token, value) = line.split_once(':')?;
    let kind = RelKind::parse(token.trim())?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some((kind, value))
}

/// Parse one record's raw text.
pub fn parse_record(content: &str) -> ParsedRecord {
    let Some((header, body)) = split_header(content) else {
        return ParsedRecord {
            header: None,
            relationships: BTreeMap::new(),
            aliases: Vec::new(),
            body: content.to_string(),
        };
    };

    let mut relationships: BTreeMap<RelKind, Vec<String>> = BTreeMap::new();
    let mut aliases = Vec::new();

    for line in header.lines() {
        let Some((kind, value)) = split_kind_line(line) else {
            continue;
        };
        if kind.is_alias() {
            if aliases.is_empty() {
                aliases = extract_aliases(value);
            }
        } else if !relationships.contains_key(&kind) {
            let names = extract_names(value);
            if !names.is_empty() {
                relationships.insert(kind, names);
            }
        }
    }

    ParsedRecord {
        header: Some(header.to_string()),
        relationships,
        aliases,
        body: body.to_string(),
    }
}

/// Render a relationship line: `kind: [[A]]` or `kind: [[[A]], [[B]]]`.
fn format_relationship_line(kind: RelKind, names: &[String]) -> String {
    if names.len() == 1 {
        format!("{kind}: [[{}]]", names[0])
    } else {
        let links: Vec<String> = names.iter().map(|n| format!("[[{n}]]")).collect();
        format!("{kind}: [{}]", links.join(", "))
    }
}

/// Merge `updates` into a record's header — the parser's inverse.
///
/// Existing relationship lines keep their position and order; new names
/// append after the existing ones (sorted, skipping names already present).
/// Kinds with no existing line are appended in canonical order before the
/// closing marker. Unrecognized header lines (alias included) and the body
/// pass through untouched. A record without a header gains one.
pub fn apply_updates(
    content: &str,
    updates: &BTreeMap<RelKind, BTreeSet<String>>,
) -> String {
    match split_header(content) {
        Some((header, body)) => {
            let lines: Vec<&str> = header.lines().collect();

            // First line per kind; later duplicates stay untouched.
            let mut line_of: BTreeMap<RelKind, usize> = BTreeMap::new();
            for (i, line) in lines.iter().enumerate() {
                if let Some((kind, _)) = split_kind_line(line) {
                    line_of.entry(kind).or_insert(i);
                }
            }

            let mut out: Vec<String> = Vec::with_capacity(lines.len() + updates.len());
            for (i, line) in lines.iter().enumerate() {
                match split_kind_line(line) {
                    Some((kind, value))
                        if !kind.is_alias()
                            && line_of.get(&kind) == Some(&i)
                            && updates.contains_key(&kind) =>
                    {
                        let mut names = extract_names(value);
                        for new in &updates[&kind] {
                            if !names.iter().any(|n| n == new) {
                                names.push(new.clone());
                            }
                        }
                        out.push(format_relationship_line(kind, &names));
                    }
                    _ => out.push((*line).to_string()),
                }
            }

            for kind in RelKind::GRAPH_KINDS {
                if line_of.contains_key(&kind) {
                    continue;
                }
                if let Some(new) = updates.get(&kind) {
                    let names: Vec<String> = new.iter().cloned().collect();
                    if !names.is_empty() {
                        out.push(format_relationship_line(kind, &names));
                    }
                }
            }

            format!("---\n{}\n---\n{}", out.join("\n"), body)
        }
        None => {
            let mut out: Vec<String> = Vec::new();
            for kind in RelKind::GRAPH_KINDS {
                if let Some(new) = updates.get(&kind) {
                    let names: Vec<String> = new.iter().cloned().collect();
                    if !names.is_empty() {
                        out.push(format_relationship_line(kind, &names));
                    }
                }
            }
            format!("---\n{}\n---\n{}", out.join("\n"), content)
        }
    }
}
