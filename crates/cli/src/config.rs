//! Project configuration.
//!
//! Locations resolve as: command-line flag > `kingraph.toml` in the working
//! directory > built-in default. The config file is optional; a malformed
//! one is a usage error, not a silent fallback.
//!
//! ```toml
//! [vault]
//! people_dir = "People"
//!
//! [store]
//! db_path = "graph/kingraph.db"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const CONFIG_FILE: &str = "kingraph.toml";
pub const DEFAULT_PEOPLE_DIR: &str = "People";
pub const DEFAULT_DB_PATH: &str = "graph/kingraph.db";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub vault: VaultSection,
    pub store: StoreSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VaultSection {
    pub people_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub db_path: Option<PathBuf>,
}

impl ProjectConfig {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load `kingraph.toml` from `dir` if present.
    pub fn load(dir: &Path) -> Result<Option<Self>, String> {
        let path = dir.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        Self::from_toml(&text)
            .map(Some)
            .map_err(|e| format!("cannot parse {}: {e}", path.display()))
    }
}

/// Resolved vault and store locations for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    pub people_dir: PathBuf,
    pub db_path: PathBuf,
}

/// Merge flags over an optional config file over defaults.
pub fn merge(
    config: Option<ProjectConfig>,
    people_flag: Option<PathBuf>,
    db_flag: Option<PathBuf>,
) -> Locations {
    let config = config.unwrap_or_default();
    Locations {
        people_dir: people_flag
            .or(config.vault.people_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PEOPLE_DIR)),
        db_path: db_flag
            .or(config.store.db_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
    }
}

/// Resolve locations for the working directory.
pub fn resolve(
    people_flag: Option<PathBuf>,
    db_flag: Option<PathBuf>,
) -> Result<Locations, String> {
    let config = ProjectConfig::load(Path::new("."))?;
    Ok(merge(config, people_flag, db_flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_is_set() {
        let loc = merge(None, None, None);
        assert_eq!(loc.people_dir, PathBuf::from(DEFAULT_PEOPLE_DIR));
        assert_eq!(loc.db_path, PathBuf::from(DEFAULT_DB_PATH));
    }

    #[test]
    fn config_file_overrides_defaults() {
        let config = ProjectConfig::from_toml(
            "[vault]\npeople_dir = \"Family\"\n[store]\ndb_path = \"out/g.db\"\n",
        )
        .unwrap();
        let loc = merge(Some(config), None, None);
        assert_eq!(loc.people_dir, PathBuf::from("Family"));
        assert_eq!(loc.db_path, PathBuf::from("out/g.db"));
    }

    #[test]
    fn flags_beat_config_file() {
        let config = ProjectConfig::from_toml("[vault]\npeople_dir = \"Family\"\n").unwrap();
        let loc = merge(Some(config), Some(PathBuf::from("Other")), None);
        assert_eq!(loc.people_dir, PathBuf::from("Other"));
        assert_eq!(loc.db_path, PathBuf::from(DEFAULT_DB_PATH));
    }

    #[test]
    fn partial_config_keeps_other_default() {
        let config = ProjectConfig::from_toml("[store]\ndb_path = \"x.db\"\n").unwrap();
        let loc = merge(Some(config), None, None);
        assert_eq!(loc.people_dir, PathBuf::from(DEFAULT_PEOPLE_DIR));
        assert_eq!(loc.db_path, PathBuf::from("x.db"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ProjectConfig::from_toml("[vault]\npeople = \"typo\"\n").is_err());
    }
}
