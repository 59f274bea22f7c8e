//! `[pandoc]`, `[latexmk]` and `[view]` sections.
//!
//! External programs invoked by a build.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[pandoc]` section - the conversion engine.
///
/// # Example
/// ```toml
/// [pandoc]
/// command = ["pandoc", "--quiet"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct PandocConfig {
    /// Engine command, program first.
    #[serde(default = "defaults::pandoc::command")]
    #[educe(Default = defaults::pandoc::command())]
    pub command: Vec<String>,
}

/// `[latexmk]` section - the secondary typesetting tool used by `--latexmk`.
///
/// # Example
/// ```toml
/// [latexmk]
/// command = ["latexmk"]
/// workdir = "build"
/// args = ["-interaction=nonstopmode", "-synctex=1"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct LatexmkConfig {
    #[serde(default = "defaults::latexmk::command")]
    #[educe(Default = defaults::latexmk::command())]
    pub command: Vec<String>,

    /// Working subdirectory, relative to the document's directory.
    #[serde(default = "defaults::latexmk::workdir")]
    #[educe(Default = defaults::latexmk::workdir())]
    pub workdir: PathBuf,

    /// Extra arguments placed after the engine flag.
    #[serde(default = "defaults::latexmk::args")]
    #[educe(Default = defaults::latexmk::args())]
    pub args: Vec<String>,
}

/// `[view]` section - artifact viewer.
///
/// An empty command uses the platform opener (`xdg-open`, `open`, `start`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    pub command: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::super::Settings;

    #[test]
    fn test_tools_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.pandoc.command, vec!["pandoc"]);
        assert_eq!(settings.latexmk.command, vec!["latexmk"]);
        assert_eq!(settings.latexmk.workdir.to_str(), Some("build"));
        assert!(settings.view.command.is_empty());
    }

    #[test]
    fn test_tools_config() {
        let settings: Settings = toml::from_str(
            r#"
            [pandoc]
            command = ["/opt/pandoc/bin/pandoc"]

            [latexmk]
            workdir = "out"

            [view]
            command = ["zathura", "--fork"]
        "#,
        )
        .unwrap();

        assert_eq!(settings.pandoc.command, vec!["/opt/pandoc/bin/pandoc"]);
        assert_eq!(settings.latexmk.workdir.to_str(), Some("out"));
        assert_eq!(settings.latexmk.command, vec!["latexmk"]);
        assert_eq!(settings.view.command, vec!["zathura", "--fork"]);
    }
}
