//! Option resolution.
//!
//! Builds the final [`OptionSet`] for one build from four layers, later
//! layers overriding earlier ones key by key:
//!
//! ```text
//! baseline  →  style `pandoc:` block  →  header `pandoc:` block  →  CLI
//! ```
//!
//! When the document's style resolves, the whole style is also written to
//! `<stem>.yaml` beside the document and passed to pandoc as `metadata-file`.

use crate::{
    config::{Settings, normalize_path},
    debug, log,
    metadata::{DEFAULT_STYLE, MetadataError, read_header, write_metadata_file},
    options::{OptionSet, OptionValue},
    style::{StyleEntry, StyleStore},
};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Option key carrying the materialized metadata file
pub const METADATA_FILE_KEY: &str = "metadata-file";

/// Option key carrying the bibliography
pub const BIBLIOGRAPHY_KEY: &str = "bibliography";

/// Extension probed for a bibliography given without one
const BIBLIOGRAPHY_EXT: &str = "bib";

/// Option keys naming bundled resources, and the folder each is probed in.
const RESOURCE_KEYS: &[(&str, &str)] = &[
    ("template", "templates"),
    ("filter", "filters"),
    ("lua-filter", "filters"),
];

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("style `{0}` not found in the style registry")]
    StyleNotFound(String),

    #[error("bibliography file `{0}` not found")]
    BibliographyNotFound(PathBuf),

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// Result of resolving one document.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub options: OptionSet,
    /// Style declared by the document
    pub style: String,
    /// Materialized metadata file, when the style resolved
    pub metadata_file: Option<PathBuf>,
}

/// Resolves documents against a style registry.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    store: &'a StyleStore,
    resources: &'a Path,
    strict: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a StyleStore, settings: &'a Settings) -> Self {
        Self {
            store,
            resources: &settings.styles.resources,
            strict: settings.styles.strict,
        }
    }

    /// Resolve the options for `document`, re-reading its header.
    ///
    /// `overrides` are the decoded CLI arguments.
    pub fn resolve(&self, document: &Path, overrides: &OptionSet) -> Result<Resolved, ResolveError> {
        let meta = read_header(document)?;
        let mut options = OptionSet::baseline();
        let mut metadata_file = None;

        match self.store.get(&meta.style) {
            Some(entry) => {
                debug!("style"; "using style `{}`", meta.style);
                options.merge(self.style_options(entry));

                let path = write_metadata_file(document, &Value::Mapping(entry.fragment().clone()))?;
                options.insert(
                    METADATA_FILE_KEY,
                    OptionValue::scalar(path.to_string_lossy()),
                );
                metadata_file = Some(path);
            }
            // The implicit style is optional in any registry
            None if meta.style == DEFAULT_STYLE => {
                debug!("style"; "no `{DEFAULT_STYLE}` style in registry");
            }
            None if self.strict => return Err(ResolveError::StyleNotFound(meta.style)),
            None => {
                let available: Vec<_> = self.store.names().collect();
                log!(
                    "warn";
                    "style `{}` not found (available: {}); using default options",
                    meta.style,
                    available.join(", ")
                );
            }
        }

        options.merge(OptionSet::from_yaml(&meta.pandoc));
        options.merge(overrides.clone());

        let base = document.parent().unwrap_or(Path::new("."));
        fix_bibliography(&mut options, base)?;

        Ok(Resolved {
            options,
            style: meta.style,
            metadata_file,
        })
    }

    /// Engine options of a style, with resource names resolved to paths.
    fn style_options(&self, entry: &StyleEntry) -> OptionSet {
        let Some(engine) = entry.engine_options() else {
            return OptionSet::new();
        };

        let mut options = OptionSet::from_yaml(engine);
        for &(key, folder) in RESOURCE_KEYS {
            let dir = self.resources.join(folder);
            match options.get_mut(key) {
                Some(OptionValue::Scalar(name)) => *name = probe(&dir, name),
                Some(OptionValue::List(names)) => {
                    for name in names.iter_mut() {
                        *name = probe(&dir, name);
                    }
                }
                _ => {}
            }
        }
        options
    }
}

/// Resolve a bare resource name inside `dir`, or pass it through unchanged.
fn probe(dir: &Path, name: &str) -> String {
    let candidate = dir.join(name);
    if candidate.is_file() {
        normalize_path(&candidate).to_string_lossy().into_owned()
    } else {
        debug!("style"; "`{name}` not in `{}`; passed to pandoc as is", dir.display());
        name.to_owned()
    }
}

/// Rewrite `bibliography` entries to absolute, extension-less, `/`-separated
/// paths, failing if a referenced file does not exist.
fn fix_bibliography(options: &mut OptionSet, base: &Path) -> Result<(), ResolveError> {
    match options.get_mut(BIBLIOGRAPHY_KEY) {
        Some(OptionValue::Scalar(value)) => *value = normalize_bibliography(value, base)?,
        Some(OptionValue::List(values)) => {
            for value in values.iter_mut() {
                *value = normalize_bibliography(value, base)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn normalize_bibliography(raw: &str, base: &Path) -> Result<String, ResolveError> {
    let path = base.join(raw);
    let path = if path.extension().is_some() {
        path
    } else {
        path.with_extension(BIBLIOGRAPHY_EXT)
    };

    if !path.is_file() {
        return Err(ResolveError::BibliographyNotFound(path));
    }

    let stripped = normalize_path(&path).with_extension("");
    Ok(stripped.to_string_lossy().replace('\\', "/"))
}

// ============================================================================
// Tests
// ============================================================================
