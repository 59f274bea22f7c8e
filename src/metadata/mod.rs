//! Document metadata.
//!
//! - [`header`]: reads the YAML header at the top of a markdown file
//! - [`flatten`]: collapses nested lists inside a style fragment
//! - [`write_metadata_file`]: materializes a style next to the document

pub mod flatten;
pub mod header;

pub use header::read_header;

use serde_yaml::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Style name used when the header does not declare one
pub const DEFAULT_STYLE: &str = "default";

/// Extension of the materialized metadata file
pub const METADATA_EXT: &str = "yaml";

/// Metadata-related errors
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("IO error when accessing `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Invalid YAML header in `{0}`")]
    Yaml(PathBuf, #[source] serde_yaml::Error),

    #[error("YAML header in `{0}` is not a mapping")]
    NotMapping(PathBuf),

    #[error("`{field}` in the YAML header of `{path}` must be {expected}")]
    Field {
        path: PathBuf,
        field: &'static str,
        expected: &'static str,
    },
}

/// Path of the metadata file for a document: same stem, `.yaml` extension.
pub fn metadata_path(document: &Path) -> PathBuf {
    document.with_extension(METADATA_EXT)
}

/// Deep-flatten a style fragment and write it beside the document.
///
/// The file is overwritten on every build and never removed.
pub fn write_metadata_file(document: &Path, style: &Value) -> Result<PathBuf, MetadataError> {
    let path = metadata_path(document);

    let mut style = style.clone();
    flatten::flatten_in_place(&mut style);

    let content =
        serde_yaml::to_string(&style).map_err(|err| MetadataError::Yaml(path.clone(), err))?;
    fs::write(&path, content).map_err(|err| MetadataError::Io(path.clone(), err))?;
    Ok(path)
}
