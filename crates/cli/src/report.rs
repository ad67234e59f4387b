//! Bounded-preview reporting and interactive prompts.
//!
//! Every warning list the CLI shows is a bounded preview: the first N items
//! plus an explicit "... and M more" line. Truncation is never silent.

use std::io::{self, Write};

/// Render up to `limit` items plus a trailing remainder line.
pub fn preview_lines<T>(items: &[T], limit: usize, mut line: impl FnMut(&T) -> String) -> Vec<String> {
    let mut out: Vec<String> = items.iter().take(limit).map(&mut line).collect();
    if items.len() > limit {
        out.push(format!("... and {} more", items.len() - limit));
    }
    out
}

/// Print a bounded preview, indented.
pub fn print_preview<T>(items: &[T], limit: usize, line: impl FnMut(&T) -> String) {
    for rendered in preview_lines(items, limit, line) {
        println!("  {rendered}");
    }
}

/// Ask a y/n question on stdout and read the answer from stdin.
pub fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(buf.trim().eq_ignore_ascii_case("y"))
}

/// Show a prompt and return the trimmed line typed by the user.
pub fn read_choice(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(buf.trim().to_string())
}
