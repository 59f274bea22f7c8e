//! Tool configuration from `pandocmk.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[pandoc]`  | Conversion engine command                        |
//! | `[latexmk]` | Typesetting tool command and working directory   |
//! | `[retry]`   | Attempt and time budget for `--retry`            |
//! | `[watch]`   | Debounce interval for `--watch`                  |
//! | `[styles]`  | Style registry, resource folder, strict lookup   |
//! | `[view]`    | Viewer command for `--view`                      |
//!
//! The file is optional: it is looked up beside the document unless
//! `--config` names one explicitly.
//!
//! # Example
//!
//! ```toml
//! [pandoc]
//! command = ["pandoc"]
//!
//! [retry]
//! max_tries = 20
//!
//! [styles]
//! strict = false
//! ```

pub mod defaults;
mod error;
mod policy;
mod tools;

pub use error::ConfigError;
pub use policy::{RetryConfig, StylesConfig, WatchConfig};
pub use tools::{LatexmkConfig, PandocConfig, ViewConfig};

use crate::cli::Cli;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file looked up beside the document
pub const CONFIG_FILE: &str = "pandocmk.toml";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing pandocmk.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Absolute path to the config file, if one was loaded
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub pandoc: PandocConfig,

    #[serde(default)]
    pub latexmk: LatexmkConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub styles: StylesConfig,

    #[serde(default)]
    pub view: ViewConfig,
}

impl Settings {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(settings)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut settings = Self::from_str(&content)?;
        settings.config_path = Some(normalize_path(path));
        Ok(settings)
    }

    /// Locate and load the settings for a CLI invocation.
    ///
    /// An explicit `--config` must exist; the implicit `pandocmk.toml` beside
    /// the document is optional.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut settings = match &cli.config {
            Some(path) => Self::from_path(path)?,
            None => {
                let implicit = cli
                    .file
                    .parent()
                    .unwrap_or(Path::new("."))
                    .join(CONFIG_FILE);
                if implicit.is_file() {
                    Self::from_path(&implicit)?
                } else {
                    Self::default()
                }
            }
        };

        settings.update_with_cli(cli);
        settings.validate()?;
        Ok(settings)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.styles.strict, cli.strict_override().as_ref());
        self.expand_paths();
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Expand `~` and resolve relative paths against the config file's directory
    fn expand_paths(&mut self) {
        let base = self
            .config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf);

        let expand = |path: &Path| -> PathBuf {
            let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
            match &base {
                Some(base) if expanded.is_relative() => normalize_path(&base.join(expanded)),
                _ => normalize_path(&expanded),
            }
        };

        if let Some(registry) = self.styles.registry.as_deref() {
            self.styles.registry = Some(expand(registry));
        }
        self.styles.resources = expand(&self.styles.resources);
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        Self::check_command("[pandoc.command]", &self.pandoc.command)?;
        Self::check_command("[latexmk.command]", &self.latexmk.command)?;

        if self.retry.max_tries == 0 {
            bail!(ConfigError::Validation(
                "[retry.max_tries] must be at least 1".into()
            ));
        }
        if self.latexmk.workdir.is_absolute() {
            bail!(ConfigError::Validation(
                "[latexmk.workdir] must be relative to the document".into()
            ));
        }

        Ok(())
    }

    fn check_command(field: &str, command: &[String]) -> Result<()> {
        if command.is_empty() || command[0].is_empty() {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        }
        Ok(())
    }
}

/// Normalize a path to absolute, using canonicalize if the path exists
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_args_from(std::iter::once("pandocmk").chain(args.iter().copied()))
    }

    #[test]
    fn test_from_str_empty() {
        let settings = Settings::from_str("").unwrap();
        assert_eq!(settings.pandoc.command, vec!["pandoc"]);
        assert!(settings.config_path.is_none());
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = Settings::from_str("[retry\nmax_tries = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let result = Settings::from_str("[server]\nport = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_empty_command() {
        let mut settings = Settings::default();
        settings.pandoc.command.clear();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("[pandoc.command]"));
    }

    #[test]
    fn test_validate_zero_tries() {
        let mut settings = Settings::default();
        settings.retry.max_tries = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_implicit_config_beside_document() {
        let dir = TempDir::new().unwrap();
        let doc = dir.path().join("paper.md");
        fs::write(&doc, "# Title\n").unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[styles]\nstrict = false\nresources = \"res\"\n",
        )
        .unwrap();

        let settings = Settings::load(&cli(&[doc.to_str().unwrap()])).unwrap();

        assert!(!settings.styles.strict);
        assert!(settings.config_path.is_some());
        assert!(settings.styles.resources.is_absolute());
        assert!(settings.styles.resources.ends_with("res"));
    }

    #[test]
    fn test_load_without_config() {
        let dir = TempDir::new().unwrap();
        let doc = dir.path().join("paper.md");
        fs::write(&doc, "").unwrap();

        let settings = Settings::load(&cli(&[doc.to_str().unwrap()])).unwrap();
        assert!(settings.styles.strict);
        assert!(settings.config_path.is_none());
    }

    #[test]
    fn test_cli_strict_overrides_config() {
        let dir = TempDir::new().unwrap();
        let doc = dir.path().join("paper.md");
        fs::write(&doc, "").unwrap();

        let settings =
            Settings::load(&cli(&[doc.to_str().unwrap(), "--no-strict"])).unwrap();
        assert!(!settings.styles.strict);
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let doc = dir.path().join("paper.md");
        fs::write(&doc, "").unwrap();
        let missing = dir.path().join("missing.toml");

        let result = Settings::load(&cli(&[
            doc.to_str().unwrap(),
            "--config",
            missing.to_str().unwrap(),
        ]));
        assert!(result.is_err());
    }
}
