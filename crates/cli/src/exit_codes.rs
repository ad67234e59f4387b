//! CLI Exit Code Registry
//!
//! Single source of truth for all CLI exit codes. Exit codes are part of the
//! shell contract — CI pipelines gate on them (`check` in particular).
//!
//! # Exit Code Ranges
//!
//! | Code | Domain    | Description                                     |
//! |------|-----------|-------------------------------------------------|
//! | 0    | Universal | Success                                         |
//! | 1    | Universal | General error (unspecified)                     |
//! | 2    | Universal | CLI usage error (bad args, bad config file)     |
//! | 10   | vault     | Vault folder missing or unreadable              |
//! | 11   | store     | Store file missing (audit entry points)         |
//! | 12   | store     | Store write failure (build aborted, no commit)  |
//! | 13   | check     | Consistency defects found                       |
//! | 14   | fix       | Record write-back failure                       |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, malformed kingraph.toml.
pub const EXIT_USAGE: u8 = 2;

/// Vault folder does not exist or cannot be listed.
pub const EXIT_VAULT: u8 = 10;

/// Store file missing where an existing store is required.
pub const EXIT_STORE_MISSING: u8 = 11;

/// Store write failure. The build transaction rolled back; no partial
/// store is left behind masquerading as complete.
pub const EXIT_STORE_WRITE: u8 = 12;

/// `check` found dangling references or duplicate identities.
/// Like `diff(1)`, a nonzero exit here means "defects exist", not "crashed".
pub const EXIT_DEFECTS: u8 = 13;

/// `fix` failed writing an updated header back to a record.
pub const EXIT_WRITEBACK: u8 = 14;
