//! pandocmk - a minimalistic make for pandoc.

mod build;
mod cli;
mod config;
mod logger;
mod metadata;
mod options;
mod resolve;
mod style;
mod utils;
mod view;
mod watch;

use anyhow::{Result, bail};
use build::{BuildRequest, Builder};
use cli::Cli;
use config::{Settings, normalize_path};
use options::codec;
use std::path::{Path, PathBuf};
use style::StyleStore;

/// Extension of the documents pandocmk builds
const DOCUMENT_EXT: &str = "md";

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    logger::set_verbose(cli.verbose);

    let document = check_document(&cli.file)?;
    let settings = Settings::load(&cli)?;
    if let Some(path) = &settings.config_path {
        debug!("pandocmk"; "using config `{}`", path.display());
    }
    let store = StyleStore::load(&settings.styles)?;

    if cli.draft {
        log!("warn"; "--draft is not implemented; ignored");
    }

    let overrides = codec::decode(&cli.pandoc_args);
    let request = BuildRequest::from_cli(&cli, document, overrides);
    let builder = Builder::new(&settings, store);

    if cli.watch {
        watch::watch(&builder, &request, settings.watch.debounce())
    } else {
        builder.build(&request)?;
        Ok(())
    }
}

/// The document must be an existing markdown file.
fn check_document(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        bail!("File not found: {}", path.display());
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXT) {
        bail!("Not a markdown (.{DOCUMENT_EXT}) file: {}", path.display());
    }
    Ok(normalize_path(path))
}
