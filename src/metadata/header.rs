//! YAML header reader.
//!
//! Only the header block is parsed; the markdown body is never handed to
//! the YAML parser (it would choke on it).
//!
//! ```text
//! %YAML 1.2          <- directives and comments before the header are skipped
//! # comment
//! ---                <- opening delimiter (`---` or `--- ...`)
//! style: article
//! pandoc:
//!   toc: true
//! ...                <- closing delimiter (`---` or `...`)
//! ```

use super::{DEFAULT_STYLE, MetadataError};
use crate::log;
use serde_yaml::{Mapping, Value};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

/// Parsed document header.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    /// Declared style, [`DEFAULT_STYLE`] when absent
    pub style: String,
    /// `pandoc:` override block
    pub pandoc: Mapping,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            style: DEFAULT_STYLE.to_owned(),
            pandoc: Mapping::new(),
        }
    }
}

impl DocumentMetadata {
    /// Interpret the YAML text of a header block.
    pub fn from_yaml(path: &Path, text: &str) -> Result<Self, MetadataError> {
        let value: Value = serde_yaml::from_str(text)
            .map_err(|err| MetadataError::Yaml(path.to_path_buf(), err))?;

        let mapping = match value {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping,
            _ => return Err(MetadataError::NotMapping(path.to_path_buf())),
        };

        let field_error = |field, expected| MetadataError::Field {
            path: path.to_path_buf(),
            field,
            expected,
        };

        let style = match mapping.get("style") {
            None | Some(Value::Null) => DEFAULT_STYLE.to_owned(),
            Some(Value::String(style)) => style.clone(),
            Some(_) => return Err(field_error("style", "a string")),
        };

        let pandoc = match mapping.get("pandoc") {
            None | Some(Value::Null) => Mapping::new(),
            Some(Value::Mapping(pandoc)) => pandoc.clone(),
            Some(_) => return Err(field_error("pandoc", "a mapping")),
        };

        Ok(Self { style, pandoc })
    }
}

/// Outcome of scanning the top of a document.
#[derive(Debug, PartialEq, Eq)]
enum Header {
    Absent,
    Unterminated,
    Block(String),
}

/// Read the header of a document.
///
/// A document without a header yields the default metadata.
pub fn read_header(path: &Path) -> Result<DocumentMetadata, MetadataError> {
    let io_err = |err| MetadataError::Io(PathBuf::from(path), err);
    let file = File::open(path).map_err(io_err)?;

    match scan(BufReader::new(file).lines()).map_err(io_err)? {
        Header::Absent => Ok(DocumentMetadata::default()),
        Header::Unterminated => {
            log!("warn"; "YAML header of `{}` is never closed; ignored", path.display());
            Ok(DocumentMetadata::default())
        }
        Header::Block(text) => DocumentMetadata::from_yaml(path, &text),
    }
}

fn is_open(line: &str) -> bool {
    line == "---" || line.starts_with("--- ")
}

fn is_close(line: &str) -> bool {
    is_open(line) || line == "..." || line.starts_with("... ")
}

/// Collect the header block, stopping at the closing delimiter.
fn scan<I>(lines: I) -> io::Result<Header>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    let mut lines = lines.into_iter();

    // Skip directives and comments until the first substantive line
    loop {
        let Some(line) = lines.next().transpose()? else {
            return Ok(Header::Absent);
        };
        if line.starts_with('%') || line.trim_start().starts_with('#') {
            continue;
        }
        if is_open(&line) {
            break;
        }
        return Ok(Header::Absent);
    }

    let mut block = String::new();
    for line in lines {
        let line = line?;
        if is_close(&line) {
            return Ok(Header::Block(block));
        }
        block.push_str(&line);
        block.push('\n');
    }

    Ok(Header::Unterminated)
}

// ============================================================================
// Tests
// ============================================================================
