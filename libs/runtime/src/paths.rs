//! Home directory resolution for the server's data (database, logs).

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

/// Resolve the server home directory.
///
/// - `None` → `$HOME/<default_subdir>`
/// - `~` / `~/x` → expanded against the user's home
/// - relative paths → joined onto the current working directory
///
/// With `create = true` the directory is created if it does not exist.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let path = match configured {
        None => user_home()?.join(default_subdir),
        Some(raw) => expand(raw.trim())?,
    };

    let path = if path.is_relative() {
        std::env::current_dir()
            .context("cannot read current directory")?
            .join(path)
    } else {
        path
    };

    if create {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("cannot create home dir {}", path.display()))?;
    }
    Ok(path)
}

fn expand(raw: &str) -> Result<PathBuf> {
    if raw == "~" {
        return user_home();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(user_home()?.join(rest));
    }
    Ok(Path::new(raw).to_path_buf())
}

fn user_home() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("unable to determine the user's home directory"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absolute_path_is_kept_and_created() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("a").join("b");
        let out = resolve_home_dir(Some(target.to_string_lossy().into()), ".x", true).unwrap();
        assert_eq!(out, target);
        assert!(out.is_dir());
    }

    #[test]
    fn tilde_is_expanded() {
        let out = resolve_home_dir(Some("~/.internease-test".into()), ".x", false).unwrap();
        assert!(out.is_absolute());
        assert!(out.ends_with(".internease-test"));
    }

    #[test]
    fn relative_path_becomes_absolute() {
        let out = resolve_home_dir(Some("data/home".into()), ".x", false).unwrap();
        assert!(out.is_absolute());
        assert!(out.ends_with("data/home"));
    }

    #[test]
    fn default_subdir_under_user_home() {
        let out = resolve_home_dir(None, ".internease", false).unwrap();
        assert!(out.ends_with(".internease"));
    }
}
