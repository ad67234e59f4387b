use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum StoreError {
    /// The store file does not exist (audit entry points require one).
    Missing(PathBuf),
    /// Filesystem error preparing or replacing the store file.
    Io { path: PathBuf, message: String },
    /// SQLite error. Fatal for a build run: no partial store is acceptable.
    Sqlite(rusqlite::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(path) => write!(f, "store not found: {}", path.display()),
            Self::Io { path, message } => {
                write!(f, "store file error at {}: {message}", path.display())
            }
            Self::Sqlite(e) => write!(f, "sqlite error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}
