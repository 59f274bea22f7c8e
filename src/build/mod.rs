//! Build orchestration.
//!
//! One build resolves the document's options, then runs the stages the
//! request asks for:
//!
//! ```text
//! resolve ─▶ [.tex] ─┬─▶ .pdf (pandoc)
//!                    └─▶ .pdf (latexmk, from the .tex)
//! ```

pub mod citation;
pub mod engine;
pub mod latexmk;
pub mod retry;

use crate::{
    cli::Cli,
    config::{ConfigError, Settings},
    debug, log,
    logger::is_verbose,
    options::OptionSet,
    resolve::{ResolveError, Resolver},
    style::StyleStore,
    view,
};
use citation::{CITEPROC, NATBIB};
use engine::{Engine, Pandoc, output_path, run_engine};
use latexmk::TexEngine;
use retry::RetryPolicy;
use std::{
    fmt, io,
    path::PathBuf,
    time::{Duration, Instant},
};
use thiserror::Error;

/// Artifact kinds a build can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Tex,
    Pdf,
}

impl OutputKind {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Tex => "tex",
            Self::Pdf => "pdf",
        }
    }

    /// Citation option required by this kind.
    pub const fn citation_mode(self) -> &'static str {
        match self {
            Self::Tex => NATBIB,
            Self::Pdf => CITEPROC,
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{kind} build failed\n{cause}")]
    Fatal { kind: OutputKind, cause: String },

    #[error("intermediate `{}` was not produced", .0.display())]
    Intermediate(PathBuf),

    #[error("expected file `{}` is missing", .0.display())]
    MissingFile(PathBuf),

    #[error("IO error when accessing `{}`", .0.display())]
    Io(PathBuf, #[source] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl BuildError {
    /// A header caught mid-edit: unreadable YAML or a mistyped field.
    ///
    /// Watch mode logs these after the first build and keeps watching. Every
    /// other error, a strict style miss or a failed `.tex` included, ends the
    /// process.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Resolve(ResolveError::Metadata(_)))
    }
}

/// What to build, frozen for the lifetime of a watch session.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub document: PathBuf,
    /// Decoded CLI engine options
    pub overrides: OptionSet,
    pub tex: bool,
    pub latexmk: bool,
    pub view: bool,
    pub timeit: bool,
    pub retry: bool,
}

impl BuildRequest {
    pub fn from_cli(cli: &Cli, document: PathBuf, overrides: OptionSet) -> Self {
        Self {
            document,
            overrides,
            tex: cli.wants_tex(),
            latexmk: cli.latexmk,
            view: cli.view,
            timeit: cli.timeit,
            retry: cli.retry,
        }
    }
}

/// Runs builds against one set of settings.
pub struct Builder<'a> {
    settings: &'a Settings,
    resolver: Resolver<'a>,
    engine: Box<dyn Engine + 'a>,
}

impl<'a> Builder<'a> {
    pub fn new(settings: &'a Settings, store: &'a StyleStore) -> Self {
        Self {
            settings,
            resolver: Resolver::new(store, settings),
            engine: Box::new(Pandoc::new(&settings.pandoc)),
        }
    }

    /// Replace the conversion engine.
    pub fn with_engine(mut self, engine: Box<dyn Engine + 'a>) -> Self {
        self.engine = engine;
        self
    }

    /// Build the request once.
    ///
    /// `Ok(None)` means a failure that was already logged.
    pub fn build(&self, request: &BuildRequest) -> Result<Option<PathBuf>, BuildError> {
        let started = Instant::now();
        let document = request.document.as_path();

        let resolved = self.resolver.resolve(document, &request.overrides)?;
        if let Some(path) = &resolved.metadata_file {
            debug!("style"; "`{}` metadata in `{}`", resolved.style, path.display());
        }
        let mut options = resolved.options;

        let tex_engine = request
            .latexmk
            .then(|| TexEngine::from_options(&options))
            .transpose()?;
        let retry = request
            .retry
            .then(|| RetryPolicy::from_config(&self.settings.retry));
        let engine = self.engine.as_ref();

        let mut tex = None;
        if request.tex {
            let stage = Instant::now();
            tex = run_engine(engine, &mut options, document, OutputKind::Tex, retry.as_ref())?;
            if tex.is_none() {
                let expected = output_path(&options, document, OutputKind::Tex);
                return Err(BuildError::Intermediate(expected));
            }
            self.report(request, "tex", stage.elapsed());
        }

        let stage = Instant::now();
        let artifact = match (tex_engine, tex) {
            (Some(tex_engine), Some(tex)) => latexmk::run(&self.settings.latexmk, tex_engine, &tex)?,
            _ => run_engine(engine, &mut options, document, OutputKind::Pdf, retry.as_ref())?,
        };

        if let Some(pdf) = &artifact {
            self.report(request, "pdf", stage.elapsed());
            if request.view {
                view::open(pdf, &self.settings.view);
            }
        }
        self.report(request, "total", started.elapsed());

        Ok(artifact)
    }

    fn report(&self, request: &BuildRequest, stage: &str, elapsed: Duration) {
        if request.timeit || is_verbose() {
            log!("pandocmk"; "{stage}: {elapsed:.2?}");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
