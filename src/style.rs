//! Style registry.
//!
//! A style is a named bundle of document metadata plus an optional `pandoc`
//! block of engine options. The registry is bundled into the binary
//! (`resources/styles.yaml`) unless `[styles] registry` points elsewhere, and
//! is parsed once per process.

use crate::config::{ConfigError, StylesConfig};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::{fs, path::Path, sync::OnceLock};

/// Registry compiled into the binary
const BUNDLED_REGISTRY: &str = include_str!("../resources/styles.yaml");

/// Label used in errors about the bundled registry
const BUNDLED_SOURCE: &str = "<bundled styles.yaml>";

/// Key of the engine options inside a style
pub const ENGINE_KEY: &str = "pandoc";

static STORE: OnceLock<StyleStore> = OnceLock::new();

/// One named style.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleEntry {
    fragment: Mapping,
}

impl StyleEntry {
    /// Engine options (`pandoc:` block), if the style has any.
    pub fn engine_options(&self) -> Option<&Mapping> {
        self.fragment.get(ENGINE_KEY).and_then(Value::as_mapping)
    }

    /// The whole fragment, engine options included.
    pub fn fragment(&self) -> &Mapping {
        &self.fragment
    }
}

/// Mapping from style name to [`StyleEntry`].
#[derive(Debug, Clone, Default)]
pub struct StyleStore {
    styles: IndexMap<String, StyleEntry>,
}

impl StyleStore {
    /// Process-wide store, parsed on first use.
    pub fn load(config: &StylesConfig) -> Result<&'static Self, ConfigError> {
        if let Some(store) = STORE.get() {
            return Ok(store);
        }
        let store = match &config.registry {
            Some(path) => Self::from_path(path)?,
            None => Self::bundled()?,
        };
        Ok(STORE.get_or_init(|| store))
    }

    /// Parse the registry bundled into the binary.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::parse(BUNDLED_SOURCE, BUNDLED_REGISTRY)
    }

    /// Parse a registry file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::parse(&path.display().to_string(), &text)
    }

    /// Parse registry text. `source` only labels errors.
    ///
    /// The top level must map style names to mappings; `<<` merge keys are
    /// applied so styles can extend each other.
    pub fn parse(source: &str, text: &str) -> Result<Self, ConfigError> {
        let registry_error = |err| ConfigError::Registry(source.to_owned(), err);
        let invalid = |msg: String| ConfigError::Validation(format!("{source}: {msg}"));

        let mut value: Value = serde_yaml::from_str(text).map_err(registry_error)?;
        value.apply_merge().map_err(registry_error)?;

        let mapping = match value {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping,
            _ => return Err(invalid("style registry must be a mapping".into())),
        };

        let mut styles = IndexMap::with_capacity(mapping.len());
        for (name, fragment) in mapping {
            let Value::String(name) = name else {
                return Err(invalid(format!("style name {name:?} is not a string")));
            };
            let fragment = match fragment {
                Value::Null => Mapping::new(),
                Value::Mapping(fragment) => fragment,
                _ => return Err(invalid(format!("style `{name}` must be a mapping"))),
            };
            if fragment
                .get(ENGINE_KEY)
                .is_some_and(|engine| !engine.is_mapping() && !engine.is_null())
            {
                return Err(invalid(format!("`{ENGINE_KEY}` of style `{name}` must be a mapping")));
            }
            styles.insert(name, StyleEntry { fragment });
        }

        Ok(Self { styles })
    }

    pub fn get(&self, name: &str) -> Option<&StyleEntry> {
        self.styles.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }
}
