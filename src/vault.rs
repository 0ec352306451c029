//! Note persistence into the configured vault directory.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Expand `~` and environment-style prefixes in a configured vault path.
pub fn resolve_vault_dir(configured: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(configured).to_string())
}

/// Write the recap note as `<vault>/<date>.md`, creating the vault directory
/// when needed. Returns the written path.
pub fn write_note(vault_dir: &PathBuf, date: &str, content: &str) -> Result<PathBuf> {
    fs::create_dir_all(vault_dir)
        .with_context(|| format!("Failed to create vault directory {}", vault_dir.display()))?;
    let path = vault_dir.join(format!("{}.md", date));
    fs::write(&path, content)
        .with_context(|| format!("Failed to write note {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_note_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let vault = dir.path().join("notes").join("daily");
        let path = write_note(&vault, "2026-02-05", "# Recap\n").unwrap();
        assert!(path.ends_with("2026-02-05.md"));
        assert_eq!(fs::read_to_string(path).unwrap(), "# Recap\n");
    }

    #[test]
    fn test_resolve_vault_dir_plain_path() {
        assert_eq!(
            resolve_vault_dir("/data/notes"),
            PathBuf::from("/data/notes")
        );
    }

    #[test]
    fn test_resolve_vault_dir_expands_tilde() {
        let resolved = resolve_vault_dir("~/notes");
        assert!(!resolved.to_string_lossy().starts_with('~'));
    }
}
