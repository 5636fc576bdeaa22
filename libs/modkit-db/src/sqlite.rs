//! SQLite DSN helpers.

use std::path::{Path, PathBuf};

use crate::{DbError, Result};

pub fn is_memory(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}

/// Expand a sqlite DSN into an absolute-path DSN using `base_dir`.
///
/// `sqlite::memory:` (and `sqlite://:memory:`) collapse to `sqlite::memory:`.
/// Backslashes are normalized to forward slashes.
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let rest = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| DbError::UnknownDsn(format!("expected sqlite:// DSN, got {dsn}")))?;

    let (path_str, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path_str.is_empty() {
        return Err(DbError::UnknownDsn("empty SQLite path in DSN".into()));
    }

    let mut p = PathBuf::from(path_str);
    if p.is_relative() {
        p = base_dir.join(p);
    }
    if create_dirs {
        if let Some(dir) = p.parent() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Create the parent directory of a file DSN.
pub(crate) fn ensure_parent_dir(dsn: &str) -> Result<()> {
    if is_memory(dsn) {
        return Ok(());
    }
    let Some(path) = file_path(dsn) else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Ask sqlx to create the database file when it does not exist yet.
pub(crate) fn with_create_mode(dsn: &str) -> String {
    if is_memory(dsn) || dsn.contains("mode=") {
        return dsn.to_string();
    }
    if dsn.contains('?') {
        format!("{dsn}&mode=rwc")
    } else {
        format!("{dsn}?mode=rwc")
    }
}

fn file_path(dsn: &str) -> Option<PathBuf> {
    let raw = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))?;
    let raw = raw.split('?').next().unwrap_or(raw);
    if raw.is_empty() || raw.starts_with("file:") {
        return None;
    }
    Some(PathBuf::from(raw))
}
