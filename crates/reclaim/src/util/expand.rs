//! Environment and home-directory expansion for cleanup target paths.

use crate::error::{ReclaimError, Result};
use std::path::PathBuf;

/// The current user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| ReclaimError::Unresolved {
        raw: "~".to_string(),
        reason: "home directory is unknown".to_string(),
    })
}

/// Expands `~`, `$VAR`, `${VAR}` and `%VAR%` references.
///
/// A path that cannot be fully expanded is an error rather than a shorter path: an unknown
/// home directory, `~user` forms and unset variables all fail.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    expand_with(raw, dirs::home_dir(), |name| std::env::var(name).ok())
}

pub(crate) fn expand_with<F>(raw: &str, home: Option<PathBuf>, lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let unresolved = |reason: String| ReclaimError::Unresolved {
        raw: raw.to_string(),
        reason,
    };
    let mut out = String::with_capacity(raw.len());

    let rest = match raw.strip_prefix('~') {
        Some(tail) if tail.is_empty() || tail.starts_with(['/', '\\']) => {
            let home = home.ok_or_else(|| unresolved("home directory is unknown".to_string()))?;
            out.push_str(&home.to_string_lossy());
            tail
        }
        Some(_) => return Err(unresolved("only ~ and ~/ are supported".to_string())),
        None => raw,
    };

    let mut chars = rest.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '%' => {
                if let Some(end) = rest[i + 1..].find('%') {
                    let name = &rest[i + 1..i + 1 + end];
                    if !name.is_empty() && is_var_name(name) {
                        let value = lookup(name).ok_or_else(|| unresolved(format!("{} is not set", name)))?;
                        out.push_str(&value);
                        for _ in 0..=end {
                            chars.next();
                        }
                        continue;
                    }
                }
                out.push(c);
            }
            '$' => {
                let tail = &rest[i + 1..];
                let (name, consumed) = if let Some(braced) = tail.strip_prefix('{') {
                    match braced.find('}') {
                        Some(end) => (&braced[..end], end + 2),
                        None => ("", 0),
                    }
                } else {
                    let len = tail
                        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                        .unwrap_or(tail.len());
                    (&tail[..len], len)
                };

                if name.is_empty() {
                    out.push(c);
                    continue;
                }

                let value = lookup(name).ok_or_else(|| unresolved(format!("{} is not set", name)))?;
                out.push_str(&value);
                for _ in 0..consumed {
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }

    Ok(PathBuf::from(out))
}

fn is_var_name(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '(' || c == ')')
}
