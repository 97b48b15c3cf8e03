//! Level file lookup

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chronoloop_shared::LevelConfig;

/// Per-user directory searched for levels given by relative path
pub fn levels_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("systems", "chronoloop", "chronoloop")
        .map(|dirs| dirs.data_dir().join("levels"))
}

/// Resolve `path` against the working directory first, then `fallback`
pub fn resolve(path: &Path, fallback: Option<&Path>) -> PathBuf {
    if path.exists() || path.is_absolute() {
        return path.to_path_buf();
    }
    fallback
        .map(|dir| dir.join(path))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Load a level, logging the values validation had to clamp
pub fn load(path: &Path) -> Result<(LevelConfig, Vec<String>)> {
    let path = resolve(path, levels_dir().as_deref());
    let (config, warnings) = LevelConfig::load(&path)
        .with_context(|| format!("Failed to load level {}", path.display()))?;
    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    Ok((config, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let level = dir.path().join("level.toml");
        std::fs::write(&level, "").unwrap();

        assert_eq!(resolve(&level, None), level);
    }

    #[test]
    fn test_falls_back_to_levels_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hidden-level.toml"), "").unwrap();

        let resolved = resolve(Path::new("hidden-level.toml"), Some(dir.path()));

        assert_eq!(resolved, dir.path().join("hidden-level.toml"));
    }

    #[test]
    fn test_missing_level_keeps_given_path() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve(Path::new("nowhere.toml"), Some(dir.path()));
        assert_eq!(resolved, PathBuf::from("nowhere.toml"));
    }

    #[test]
    fn test_load_reports_clamped_values() {
        let dir = tempfile::tempdir().unwrap();
        let level = dir.path().join("level.toml");
        std::fs::write(
            &level,
            "[movement]\ndash_duration = 0.1\ndash_invincibility = 0.5\n",
        )
        .unwrap();

        let (config, warnings) = load(&level).unwrap();

        assert_eq!(warnings.len(), 1);
        assert_eq!(config.movement.dash_invincibility, 0.1);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to load level"));
    }
}
