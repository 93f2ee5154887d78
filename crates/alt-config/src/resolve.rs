//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG paths → defaults.

use crate::study::StudyConfig;
use crate::validate::{validate_study, ValidationError, ValidationResult};
use std::path::{Path, PathBuf};

/// Discovered study file path.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path to the study file (or None if not found).
    pub study: Option<PathBuf>,

    /// Where the study file came from (for diagnostics).
    pub source: ConfigSource,
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "ALT_CONFIG";
pub const ENV_CONFIG_DIR: &str = "ALT_CONFIG_DIR";

/// Study file names looked up inside a config directory, in priority order.
const STUDY_FILENAMES: &[&str] = &["study.toml", "study.json"];

/// Application name for XDG directories.
const APP_NAME: &str = "alt";

/// Resolve the study file path using the standard resolution order.
///
/// 1. Explicit CLI path (taken as-is; a missing file fails at load time)
/// 2. `ALT_CONFIG` environment variable
/// 3. `ALT_CONFIG_DIR` + `study.toml` / `study.json`
/// 4. XDG config directory (`~/.config/alt/`)
/// 5. Built-in defaults (None)
pub fn resolve_config(cli_path: Option<&Path>) -> ConfigPaths {
    if let Some(path) = cli_path {
        return ConfigPaths {
            study: Some(path.to_path_buf()),
            source: ConfigSource::CliArgument,
        };
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return ConfigPaths {
                study: Some(path),
                source: ConfigSource::Environment,
            };
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        if let Some(path) = find_study_file(Path::new(&config_dir)) {
            return ConfigPaths {
                study: Some(path),
                source: ConfigSource::Environment,
            };
        }
    }

    if let Some(dir) = xdg_config_dir() {
        if let Some(path) = find_study_file(&dir) {
            return ConfigPaths {
                study: Some(path),
                source: ConfigSource::XdgConfig,
            };
        }
    }

    ConfigPaths::default()
}

fn find_study_file(dir: &Path) -> Option<PathBuf> {
    STUDY_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Get the XDG config directory for alt.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Resolve, load and validate the study configuration.
///
/// Falls back to [`StudyConfig::default`] when no file is found. An explicit
/// CLI path that does not exist is an error rather than a silent fallback.
pub fn load_study(cli_path: Option<&Path>) -> ValidationResult<(StudyConfig, ConfigPaths)> {
    let paths = resolve_config(cli_path);

    let study = match &paths.study {
        Some(path) => {
            if !path.exists() {
                return Err(ValidationError::IoError(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            StudyConfig::from_file(path)?
        }
        None => StudyConfig::default(),
    };

    validate_study(&study)?;
    Ok((study, paths))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", ConfigSource::XdgConfig), "XDG config");
        assert_eq!(
            format!("{}", ConfigSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn cli_path_wins_even_if_missing() {
        let paths = resolve_config(Some(Path::new("/nonexistent/study.toml")));
        assert_eq!(paths.source, ConfigSource::CliArgument);
        assert!(load_study(Some(Path::new("/nonexistent/study.toml"))).is_err());
    }

    #[test]
    fn find_study_prefers_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("study.json"), "{}").unwrap();
        assert_eq!(
            find_study_file(dir.path()),
            Some(dir.path().join("study.json"))
        );
        std::fs::write(dir.path().join("study.toml"), "").unwrap();
        assert_eq!(
            find_study_file(dir.path()),
            Some(dir.path().join("study.toml"))
        );
    }
}
