//! Pandoc option sets.
//!
//! An [`OptionSet`] is an ordered mapping from option name to [`OptionValue`].
//! Insertion order is argument order: pandoc applies filters in the order
//! they appear on the command line, so overriding an existing key keeps the
//! key's original position.

pub mod codec;

use crate::log;
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Value of a single pandoc option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// `--key` when true, omitted when false
    Flag(bool),
    /// `--key=value`
    Scalar(String),
    /// One `--key=item` per item (e.g. `filter`)
    List(Vec<String>),
    /// Present but without value (`output: null`); never encoded
    Unset,
}

impl OptionValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a YAML value from a style or header `pandoc` block.
    ///
    /// Returns `None` for values that have no command-line form (mappings).
    pub fn from_yaml(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Unset),
            Value::Bool(b) => Some(Self::Flag(*b)),
            Value::Sequence(items) => {
                let items: Option<Vec<String>> = items.iter().map(yaml_scalar).collect();
                items.map(Self::List)
            }
            Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
            Value::Mapping(_) => None,
            other => yaml_scalar(other).map(Self::Scalar),
        }
    }
}

/// Render a YAML scalar as pandoc would read it on the command line.
fn yaml_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Ordered pandoc options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    entries: IndexMap<String, OptionValue>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hardcoded defaults every build starts from.
    pub fn baseline() -> Self {
        let mut options = Self::new();
        options.insert("from", OptionValue::scalar("markdown"));
        options.insert("to", OptionValue::scalar("latex"));
        options.insert("standalone", OptionValue::Flag(true));
        options.insert("pdf-engine", OptionValue::scalar("xelatex"));
        options.insert("output", OptionValue::Unset);
        options
    }

    /// Build an option set from a `pandoc:` YAML block.
    ///
    /// Entries without a command-line form are skipped with a warning.
    pub fn from_yaml(mapping: &Mapping) -> Self {
        let mut options = Self::new();
        for (key, value) in mapping {
            let Some(key) = key.as_str() else {
                log!("warn"; "pandoc option key {key:?} is not a string; ignored");
                continue;
            };
            match OptionValue::from_yaml(value) {
                Some(value) => options.insert(key, value),
                None => log!("warn"; "pandoc option `{key}` has no command-line form; ignored"),
            }
        }
        options
    }

    /// Insert or override a key; an existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: OptionValue) {
        self.entries.insert(key.into(), value);
    }

    /// Insert a key at the end, moving it if already present.
    pub fn push_back(&mut self, key: impl Into<String>, value: OptionValue) {
        let key = key.into();
        self.entries.shift_remove(&key);
        self.entries.insert(key, value);
    }

    /// Remove a key, preserving the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        self.entries.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut OptionValue> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Shallow merge: every key of `other` overrides this set, key by key.
    pub fn merge(&mut self, other: Self) {
        for (key, value) in other.entries {
            self.entries.insert(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Explicit `output` value, if any.
    pub fn output(&self) -> Option<&Path> {
        self.get("output").and_then(OptionValue::as_str).map(Path::new)
    }
}

impl<K: Into<String>> FromIterator<(K, OptionValue)> for OptionSet {
    fn from_iter<I: IntoIterator<Item = (K, OptionValue)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (key, value) in iter {
            options.insert(key, value);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline() {
        let options = OptionSet::baseline();
        let keys: Vec<_> = options.keys().collect();
        assert_eq!(keys, ["from", "to", "standalone", "pdf-engine", "output"]);
        assert_eq!(options.get("standalone"), Some(&OptionValue::Flag(true)));
        assert_eq!(options.get("output"), Some(&OptionValue::Unset));
        assert!(options.output().is_none());
    }

    #[test]
    fn test_insert_keeps_position() {
        let mut options = OptionSet::baseline();
        options.insert("from", OptionValue::scalar("gfm"));
        assert_eq!(options.keys().next(), Some("from"));
        assert_eq!(options.get("from").and_then(OptionValue::as_str), Some("gfm"));
    }

    #[test]
    fn test_push_back_moves_key() {
        let mut options = OptionSet::baseline();
        options.push_back("from", OptionValue::scalar("gfm"));
        assert_eq!(options.keys().last(), Some("from"));
        assert_eq!(options.len(), 5);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut options = OptionSet::baseline();
        options.remove("to");
        let keys: Vec<_> = options.keys().collect();
        assert_eq!(keys, ["from", "standalone", "pdf-engine", "output"]);
    }

    #[test]
    fn test_merge_overrides_key_by_key() {
        let mut options = OptionSet::baseline();
        let other: OptionSet = [
            ("toc", OptionValue::Flag(true)),
            ("pdf-engine", OptionValue::scalar("lualatex")),
        ]
        .into_iter()
        .collect();
        options.merge(other);

        let keys: Vec<_> = options.keys().collect();
        assert_eq!(keys, ["from", "to", "standalone", "pdf-engine", "output", "toc"]);
        assert_eq!(
            options.get("pdf-engine").and_then(OptionValue::as_str),
            Some("lualatex")
        );
    }

    #[test]
    fn test_from_yaml() {
        let mapping: Mapping = serde_yaml::from_str(
            "template: a.tex\nfilter: [one.py, two.py]\ntoc: true\ntoc-depth: 2\noutput: null\nvariables: {a: 1}\n",
        )
        .unwrap();
        let options = OptionSet::from_yaml(&mapping);

        assert_eq!(options.get("template"), Some(&OptionValue::scalar("a.tex")));
        assert_eq!(
            options.get("filter"),
            Some(&OptionValue::List(vec!["one.py".into(), "two.py".into()]))
        );
        assert_eq!(options.get("toc"), Some(&OptionValue::Flag(true)));
        assert_eq!(options.get("toc-depth"), Some(&OptionValue::scalar("2")));
        assert_eq!(options.get("output"), Some(&OptionValue::Unset));
        assert!(!options.contains_key("variables"));
    }
}
