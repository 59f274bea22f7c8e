//! Pandoc invocation with failure classification and retry.
//!
//! Pandoc reports every failure as text. [`classify`] is the only place that
//! looks at that text; everything downstream works on [`EngineOutcome`].

use super::{BuildError, OutputKind, citation::rewrite_citation, retry::RetryPolicy};
use crate::{
    config::PandocConfig,
    debug, log,
    options::{OptionSet, OptionValue, codec},
    utils::exec::{EMPTY_FILTER, command_line, exec},
};
use anyhow::{Result, bail};
use std::{
    path::{Path, PathBuf},
    thread,
    time::Instant,
};

/// Failure signatures that indicate a broken installation, not a transient
/// condition: a missing executable (pandoc or a filter), a filter built
/// against another pandoc API, or an option pandoc does not know.
const FATAL_SIGNATURES: &[&str] = &[
    "Could not find executable",
    "invalid api version",
    "Unknown option",
];

/// Result of one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    Success(PathBuf),
    Retryable(String),
    Fatal(String),
}

/// Map engine failure text to an outcome.
pub fn classify(message: &str) -> EngineOutcome {
    if FATAL_SIGNATURES.iter().any(|sig| message.contains(sig)) {
        EngineOutcome::Fatal(message.to_owned())
    } else {
        EngineOutcome::Retryable(message.to_owned())
    }
}

impl EngineOutcome {
    fn from_result(result: Result<()>, output: PathBuf) -> Self {
        match result {
            Ok(()) => Self::Success(output),
            Err(err) => classify(&format!("{err:#}")),
        }
    }
}

/// The conversion engine, as seen by the orchestrator.
pub trait Engine {
    /// Run the engine with complete arguments; errors carry its diagnostics.
    fn invoke(&self, args: &[String]) -> Result<()>;

    /// Command line shown in verbose mode.
    fn describe(&self, args: &[String]) -> String;
}

impl<E: Engine + ?Sized> Engine for &E {
    fn invoke(&self, args: &[String]) -> Result<()> {
        (**self).invoke(args)
    }

    fn describe(&self, args: &[String]) -> String {
        (**self).describe(args)
    }
}

/// The real `pandoc` executable.
#[derive(Debug, Clone)]
pub struct Pandoc {
    command: Vec<String>,
}

impl Pandoc {
    pub fn new(config: &PandocConfig) -> Self {
        Self {
            command: config.command.clone(),
        }
    }
}

impl Engine for Pandoc {
    fn invoke(&self, args: &[String]) -> Result<()> {
        let Some(program) = self.command.first() else {
            bail!("Empty pandoc command");
        };
        if which::which(program).is_err() {
            bail!("Could not find executable `{program}`");
        }
        exec(None, &self.command, args, &EMPTY_FILTER)?;
        Ok(())
    }

    fn describe(&self, args: &[String]) -> String {
        command_line(&self.command, args)
    }
}

/// Output path for `kind`: the explicit `output` re-suffixed, or the
/// document's own stem.
pub fn output_path(options: &OptionSet, document: &Path, kind: OutputKind) -> PathBuf {
    options
        .output()
        .unwrap_or(document)
        .with_extension(kind.extension())
}

/// Produce `kind` from `document`.
///
/// Returns `Ok(None)` when the engine failed and the failure was logged
/// (immediately without `retry`, after the budget is spent with it), and
/// `Err` for failures no retry can fix.
pub fn run_engine(
    engine: &dyn Engine,
    options: &mut OptionSet,
    document: &Path,
    kind: OutputKind,
    retry: Option<&RetryPolicy>,
) -> Result<Option<PathBuf>, BuildError> {
    let output = output_path(options, document, kind);
    options.insert("output", OptionValue::scalar(output.to_string_lossy()));
    rewrite_citation(options, kind);

    let mut args = codec::encode(options);
    args.push(document.to_string_lossy().into_owned());
    debug!("pandoc"; "{}", engine.describe(&args));

    let started = Instant::now();
    let mut backoff = retry.map(RetryPolicy::backoff);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let cause = match EngineOutcome::from_result(engine.invoke(&args), output.clone()) {
            EngineOutcome::Success(path) => return Ok(Some(path)),
            EngineOutcome::Fatal(cause) => return Err(BuildError::Fatal { kind, cause }),
            EngineOutcome::Retryable(cause) => cause,
        };

        let (Some(policy), Some(backoff)) = (retry, backoff.as_mut()) else {
            log!("error"; "{kind} build failed\n{cause}");
            return Ok(None);
        };

        let elapsed = started.elapsed();
        if policy.exhausted(attempt, elapsed) {
            log!("error"; "{kind} build failed after {attempt} attempts\n{cause}");
            return Ok(None);
        }

        let wait = policy.clamp_wait(backoff.next().unwrap_or(policy.max_wait), elapsed);
        log!("retry"; "attempt {attempt} failed, retrying in {wait:.2?}");
        debug!("retry"; "{cause}");
        thread::sleep(wait);
    }
}

// ============================================================================
// Tests
// ============================================================================
