//! Name resolution against the known-person set.
//!
//! Resolution tiers, first match wins:
//! 1. exact string match
//! 2. case-insensitive exact match (case correction)
//! 3. best fuzzy candidate at similarity ≥ 0.85 (typo correction)
//! 4. unresolved — the raw string is kept so the edge stays auditable
//!
//! No input is ever dropped, and resolution is deterministic for a fixed
//! known-name set: candidates are scanned in sorted order and ties keep the
//! first candidate.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

/// Minimum similarity for a fuzzy correction.
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionTier {
    Exact,
    CaseInsensitive,
    Fuzzy,
    Unresolved,
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::CaseInsensitive => write!(f, "case-insensitive"),
            Self::Fuzzy => write!(f, "fuzzy"),
            Self::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Outcome of resolving one raw target name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub raw: String,
    /// The known name matched, or the raw string verbatim when unresolved.
    pub resolved: String,
    pub tier: ResolutionTier,
}

/// Resolver over a fixed set of known display names.
pub struct Resolver {
    /// Sorted for deterministic fuzzy scans.
    names: Vec<String>,
    exact: BTreeSet<String>,
    /// lowercase → display name; on case-fold collisions the sorted-first
    /// display name wins, deterministically.
    by_lower: BTreeMap<String, String>,
}

impl Resolver {
    pub fn new<I>(known: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let exact: BTreeSet<String> = known.into_iter().collect();
        let names: Vec<String> = exact.iter().cloned().collect();
        let mut by_lower = BTreeMap::new();
        for name in &names {
            by_lower
                .entry(name.to_lowercase())
                .or_insert_with(|| name.clone());
        }
        Self { names, exact, by_lower }
    }

    pub fn resolve(&self, raw: &str) -> Resolution {
        if self.exact.contains(raw) {
            return Resolution {
                raw: raw.to_string(),
                resolved: raw.to_string(),
                tier: ResolutionTier::Exact,
            };
        }

        if let Some(display) = self.by_lower.get(&raw.to_lowercase()) {
            return Resolution {
                raw: raw.to_string(),
                resolved: display.clone(),
                tier: ResolutionTier::CaseInsensitive,
            };
        }

        if let Some(best) = self.best_fuzzy(raw) {
            return Resolution {
                raw: raw.to_string(),
                resolved: best,
                tier: ResolutionTier::Fuzzy,
            };
        }

        Resolution {
            raw: raw.to_string(),
            resolved: raw.to_string(),
            tier: ResolutionTier::Unresolved,
        }
    }

    /// Single best candidate at or above the threshold, or None.
    fn best_fuzzy(&self, raw: &str) -> Option<String> {
        let raw_chars: Vec<char> = raw.chars().collect();
        let mut best: Option<(f64, &String)> = None;

        for name in &self.names {
            let name_chars: Vec<char> = name.chars().collect();
            let max_len = raw_chars.len().max(name_chars.len());
            if max_len == 0 {
                continue;
            }
            // d ≤ (1 - threshold) · max_len  ⟺  similarity ≥ threshold
            let allowed = ((1.0 - SIMILARITY_THRESHOLD) * max_len as f64).floor() as usize;
            let Some(dist) = levenshtein_within(&raw_chars, &name_chars, allowed) else {
                continue;
            };
            let similarity = 1.0 - dist as f64 / max_len as f64;
            // Strict > keeps the sorted-first candidate on ties.
            if best.map_or(true, |(s, _)| similarity > s) {
                best = Some((similarity, name));
            }
        }

        best.map(|(_, name)| name.clone())
    }
}

/// Levenshtein distance with an early-exit cap.
///
/// Returns `Some(d)` when the true distance `d` is at most `max_dist`,
/// `None` otherwise. Two-row DP; once a full row's minimum exceeds the cap
/// the distance can only grow, so the scan bails.
fn levenshtein_within(a: &[char], b: &[char], max_dist: usize) -> Option<usize> {
    if a.len().abs_diff(b.len()) > max_dist {
        return None;
    }
    if b.is_empty() {
        return Some(a.len()); // a.len() ≤ max_dist via the length guard
    }

    let n = b.len();
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for j in 1..=n {
            let cost = usize::from(*ca != b[j - 1]);
            let d = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
            curr[j] = d;
            row_min = row_min.min(d);
        }

        if row_min > max_dist {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    (prev[n] <= max_dist).then_some(prev[n])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(names: &[&str]) -> Resolver {
        Resolver::new(names.iter().map(|s| s.to_string()))
    }

    #[test]
    fn exact_match_wins() {
        let r = resolver(&["Jon Smith", "Jane Smith"]);
        let res = r.resolve("Jon Smith");
        assert_eq!(res.tier, ResolutionTier::Exact);
        assert_eq!(res.resolved, "Jon Smith");
    }

    #[test]
    fn case_mismatch_corrects_not_fuzzes() {
        let r = resolver(&["Jon Smith"]);
        let res = r.resolve("jon smith");
        assert_eq!(res.tier, ResolutionTier::CaseInsensitive);
        assert_eq!(res.resolved, "Jon Smith");
    }

    #[test]
    fn close_typo_resolves_fuzzy() {
        // One trailing insertion on a 9-char name: similarity 0.9.
        let r = resolver(&["Jon Smith"]);
        let res = r.resolve("Jon Smithh");
        assert_eq!(res.tier, ResolutionTier::Fuzzy);
        assert_eq!(res.resolved, "Jon Smith");
    }

    #[test]
    fn far_string_stays_unresolved_and_kept() {
        let r = resolver(&["Alice Cooper", "Bob Dylan"]);
        let res = r.resolve("Jon Smth");
        assert_eq!(res.tier, ResolutionTier::Unresolved);
        assert_eq!(res.resolved, "Jon Smth");
    }

    #[test]
    fn empty_known_set_is_unresolved() {
        let r = resolver(&[]);
        assert_eq!(r.resolve("Anyone").tier, ResolutionTier::Unresolved);
    }

    #[test]
    fn threshold_is_inclusive() {
        // 20 chars, distance 3: similarity exactly 0.85.
        let known = "aaaaaaaaaaaaaaaaaaaa";
        let input = "aaaaaaaaaaaaaaaaabbb";
        let r = resolver(&[known]);
        assert_eq!(r.resolve(input).tier, ResolutionTier::Fuzzy);

        // Distance 4: just below.
        let input = "aaaaaaaaaaaaaaaabbbb";
        assert_eq!(r.resolve(input).tier, ResolutionTier::Unresolved);
    }

    #[test]
    fn ties_break_toward_sorted_first() {
        // Both candidates are distance 1 from the input.
        let r = resolver(&["abcdefghiY", "abcdefghiX"]);
        let res = r.resolve("abcdefghiZ");
        assert_eq!(res.tier, ResolutionTier::Fuzzy);
        assert_eq!(res.resolved, "abcdefghiX");
    }

    #[test]
    fn resolution_is_deterministic() {
        let r = resolver(&["Jon Smith", "Jon Smyth", "Jane Smith"]);
        let a = r.resolve("Jon Smitth");
        let b = r.resolve("Jon Smitth");
        assert_eq!(a, b);
    }

    #[test]
    fn levenshtein_cap_short_circuits() {
        let a: Vec<char> = "abcdef".chars().collect();
        let b: Vec<char> = "uvwxyz".chars().collect();
        assert_eq!(levenshtein_within(&a, &b, 2), None);
        assert_eq!(levenshtein_within(&a, &b, 6), Some(6));
        assert_eq!(levenshtein_within(&a, &a, 0), Some(0));
    }
}
