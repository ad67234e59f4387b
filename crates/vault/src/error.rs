use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum VaultError {
    /// The vault folder does not exist or is not a directory.
    MissingFolder(PathBuf),
    /// The vault folder itself could not be listed.
    List { path: PathBuf, message: String },
    /// A record could not be written back.
    Write { path: PathBuf, message: String },
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFolder(path) => {
                write!(f, "vault folder not found: {}", path.display())
            }
            Self::List { path, message } => {
                write!(f, "cannot list vault folder {}: {message}", path.display())
            }
            Self::Write { path, message } => {
                write!(f, "cannot write record {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for VaultError {}
