use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A typed relationship edge kind.
///
/// `Alias` is not a graph edge to another person — it is a name-equivalence
/// annotation local to one record. It never participates in reciprocity or
/// inference and is never name-resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelKind {
    Parent,
    Child,
    Wife,
    Husband,
    Sibling,
    Alias,
}

impl RelKind {
    /// Kinds that form graph edges between people, in canonical header order.
    pub const GRAPH_KINDS: [RelKind; 5] = [
        RelKind::Parent,
        RelKind::Child,
        RelKind::Wife,
        RelKind::Husband,
        RelKind::Sibling,
    ];

    /// Parse a header kind token, case-insensitively.
    pub fn parse(token: &str) -> Option<RelKind> {
        match token.to_ascii_lowercase().as_str() {
            "parent" => Some(RelKind::Parent),
            "child" => Some(RelKind::Child),
            "wife" => Some(RelKind::Wife),
            "husband" => Some(RelKind::Husband),
            "sibling" => Some(RelKind::Sibling),
            "alias" => Some(RelKind::Alias),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelKind::Parent => "parent",
            RelKind::Child => "child",
            RelKind::Wife => "wife",
            RelKind::Husband => "husband",
            RelKind::Sibling => "sibling",
            RelKind::Alias => "alias",
        }
    }

    pub fn is_alias(&self) -> bool {
        matches!(self, RelKind::Alias)
    }
}

impl fmt::Display for RelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable kind → reciprocal-kind mapping.
///
/// Held by the reciprocity engine rather than living as module-level state,
/// so the engine is testable with alternate pairings. `Alias` has no
/// reciprocal and must never be inserted.
#[derive(Debug, Clone)]
pub struct ReciprocalMap {
    map: BTreeMap<RelKind, RelKind>,
}

impl ReciprocalMap {
    /// Build a map from pairings. Each pair `(a, b)` registers both
    /// directions; self-inverse kinds are given as `(k, k)`.
    pub fn from_pairs(pairs: &[(RelKind, RelKind)]) -> Self {
        let mut map = BTreeMap::new();
        for &(a, b) in pairs {
            map.insert(a, b);
            map.insert(b, a);
        }
        Self { map }
    }

    /// The family mapping: parent↔child, wife↔husband, sibling↔sibling.
    pub fn family() -> Self {
        Self::from_pairs(&[
            (RelKind::Parent, RelKind::Child),
            (RelKind::Wife, RelKind::Husband),
            (RelKind::Sibling, RelKind::Sibling),
        ])
    }

    /// The reciprocal of `kind`, or `None` if the mapping does not cover it.
    pub fn of(&self, kind: RelKind) -> Option<RelKind> {
        self.map.get(&kind).copied()
    }
}
