//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [pandoc] Section Defaults
// ============================================================================

pub mod pandoc {
    pub fn command() -> Vec<String> {
        vec!["pandoc".into()]
    }
}

// ============================================================================
// [latexmk] Section Defaults
// ============================================================================

pub mod latexmk {
    use std::path::PathBuf;

    pub fn command() -> Vec<String> {
        vec!["latexmk".into()]
    }

    pub fn workdir() -> PathBuf {
        "build".into()
    }

    pub fn args() -> Vec<String> {
        vec!["-interaction=nonstopmode".into(), "-synctex=1".into()]
    }
}

// ============================================================================
// [retry] Section Defaults
// ============================================================================

pub mod retry {
    pub fn max_tries() -> u32 {
        1000
    }

    /// Seconds
    pub fn max_time() -> u64 {
        600
    }

    /// Seconds
    pub fn max_wait() -> u64 {
        20
    }
}

// ============================================================================
// [watch] Section Defaults
// ============================================================================

pub mod watch {
    pub fn debounce_ms() -> u64 {
        100
    }
}

// ============================================================================
// [styles] Section Defaults
// ============================================================================

pub mod styles {
    use std::{
        env,
        path::{Path, PathBuf},
    };

    /// Resource folder of the source tree the binary was built from.
    const BUILD_RESOURCES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/resources");

    /// Resource folder (contains `templates/` and `filters/`).
    ///
    /// An installed binary looks beside itself first, then falls back to the
    /// source tree it was built from.
    pub fn resources() -> PathBuf {
        env::current_exe()
            .ok()
            .and_then(|exe| installed(&exe))
            .unwrap_or_else(|| PathBuf::from(BUILD_RESOURCES))
    }

    /// `<bin>/resources` or `<bin>/../share/pandocmk`, whichever exists.
    pub(super) fn installed(exe: &Path) -> Option<PathBuf> {
        let bin = exe.parent()?;
        [
            bin.join("resources"),
            bin.join("..").join("share").join("pandocmk"),
        ]
        .into_iter()
        .find(|dir| dir.is_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::styles;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resources_found_in_build_tree() {
        let resources = styles::resources();
        assert!(resources.join("templates").join("article.tex").is_file());
    }

    #[test]
    fn test_installed_resources_beside_binary() {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let exe = bin.join("pandocmk");
        assert_eq!(styles::installed(&exe), None);

        let share = dir.path().join("share").join("pandocmk");
        fs::create_dir_all(&share).unwrap();
        assert_eq!(styles::installed(&exe), Some(bin.join("..").join("share").join("pandocmk")));

        fs::create_dir_all(bin.join("resources")).unwrap();
        assert_eq!(styles::installed(&exe), Some(bin.join("resources")));
    }
}
