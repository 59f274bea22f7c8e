//! `--latexmk`: typeset the `.tex` intermediate with latexmk.
//!
//! latexmk litters its working directory with auxiliary files, so it runs in
//! a subdirectory (`build/` by default) beside the `.tex` file:
//!
//! ```text
//! paper.tex  ──move──▶  build/paper.tex  ──latexmk──▶  build/paper.pdf
//!                                                      build/paper.synctex.gz
//! paper.pdf, paper.synctex.gz  ◀──move────────────────────────┘
//! ```

use super::BuildError;
use crate::{
    config::{ConfigError, LatexmkConfig},
    debug, log,
    options::OptionSet,
    utils::exec::{SILENT_FILTER, command_line, exec},
};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Option key naming the TeX engine
const ENGINE_KEY: &str = "pdf-engine";

/// Extensions moved back beside the `.tex` file: the PDF and its companion.
const ARTIFACTS: &[&str] = &["pdf", "synctex.gz"];

/// TeX engines latexmk can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexEngine {
    Xelatex,
    Pdflatex,
}

impl TexEngine {
    /// Engine selected by the resolved `pdf-engine` option.
    pub fn from_options(options: &OptionSet) -> Result<Self, ConfigError> {
        match options.get(ENGINE_KEY).and_then(|value| value.as_str()) {
            Some("xelatex") => Ok(Self::Xelatex),
            Some("pdflatex") => Ok(Self::Pdflatex),
            Some(other) => Err(ConfigError::Validation(format!(
                "latexmk supports `{ENGINE_KEY}` xelatex or pdflatex, got `{other}`"
            ))),
            None => Err(ConfigError::Validation(format!(
                "latexmk requires `{ENGINE_KEY}` to be set"
            ))),
        }
    }

    pub const fn flag(self) -> &'static str {
        match self {
            Self::Xelatex => "-xelatex",
            Self::Pdflatex => "-pdf",
        }
    }
}

/// Typeset `tex` and return the relocated PDF.
///
/// A latexmk failure is logged and yields `Ok(None)`; missing files where
/// they must exist are errors.
pub fn run(
    config: &LatexmkConfig,
    engine: TexEngine,
    tex: &Path,
) -> Result<Option<PathBuf>, BuildError> {
    let (dir, name) = split(tex)?;
    let workdir = dir.join(&config.workdir);
    let staged = stage(tex, &workdir, name)?;

    let mut args = Vec::with_capacity(config.args.len() + 2);
    args.push(engine.flag().to_owned());
    args.extend(config.args.iter().cloned());
    args.push(name.to_owned());
    debug!("latexmk"; "{} (in {})", command_line(&config.command, &args), workdir.display());

    let succeeded = match exec(Some(&workdir), &config.command, &args, &SILENT_FILTER) {
        Ok(_) => true,
        Err(err) => {
            log!("error"; "latexmk failed on `{}`\n{err:#}", staged.display());
            false
        }
    };

    let mut pdf = None;
    for ext in ARTIFACTS {
        let from = staged.with_extension(ext);
        let to = tex.with_extension(ext);
        if from.is_file() {
            fs::rename(&from, &to).map_err(|err| BuildError::Io(to.clone(), err))?;
            if *ext == "pdf" {
                pdf = Some(to);
            }
        } else if succeeded {
            return Err(BuildError::MissingFile(from));
        } else {
            debug!("latexmk"; "no `{}` to relocate", from.display());
        }
    }

    Ok(pdf.filter(|_| succeeded))
}

fn split(tex: &Path) -> Result<(&Path, &str), BuildError> {
    let name = tex
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| BuildError::MissingFile(tex.to_path_buf()))?;
    let dir = tex.parent().unwrap_or(Path::new(""));
    Ok((dir, name))
}

/// Move the intermediate into the working directory, replacing a stale copy.
fn stage(tex: &Path, workdir: &Path, name: &str) -> Result<PathBuf, BuildError> {
    if !tex.is_file() {
        return Err(BuildError::MissingFile(tex.to_path_buf()));
    }
    fs::create_dir_all(workdir).map_err(|err| BuildError::Io(workdir.to_path_buf(), err))?;

    let staged = workdir.join(name);
    match fs::remove_file(&staged) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => {
            return Err(BuildError::Io(staged, err));
        }
        _ => {}
    }
    fs::rename(tex, &staged).map_err(|err| BuildError::Io(staged.clone(), err))?;
    Ok(staged)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionValue;
    use tempfile::TempDir;

    fn with_engine(engine: &str) -> OptionSet {
        let mut options = OptionSet::baseline();
        options.insert(ENGINE_KEY, OptionValue::scalar(engine));
        options
    }

    #[test]
    fn test_engine_from_options() {
        assert_eq!(TexEngine::from_options(&OptionSet::baseline()).unwrap(), TexEngine::Xelatex);
        assert_eq!(
            TexEngine::from_options(&with_engine("pdflatex")).unwrap().flag(),
            "-pdf"
        );
        assert!(matches!(
            TexEngine::from_options(&with_engine("lualatex")),
            Err(ConfigError::Validation(_))
        ));

        let mut unset = OptionSet::baseline();
        unset.insert(ENGINE_KEY, OptionValue::Unset);
        assert!(TexEngine::from_options(&unset).is_err());
    }

    #[test]
    fn test_missing_intermediate() {
        let dir = TempDir::new().unwrap();
        let config = LatexmkConfig::default();
        let result = run(&config, TexEngine::Xelatex, &dir.path().join("paper.tex"));
        assert!(matches!(result, Err(BuildError::MissingFile(_))));
    }

    /// latexmk stand-in: `sh -c <script> latexmk <flag> <file>`
    #[cfg(unix)]
    fn fake(script: &str) -> LatexmkConfig {
        LatexmkConfig {
            command: vec!["sh".into(), "-c".into(), script.into(), "latexmk".into()],
            args: vec![],
            ..LatexmkConfig::default()
        }
    }

    #[cfg(unix)]
    fn setup() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let tex = dir.path().join("paper.tex");
        fs::write(&tex, "\\documentclass{article}").unwrap();
        fs::create_dir_all(dir.path().join("build")).unwrap();
        fs::write(dir.path().join("build/paper.tex"), "stale").unwrap();
        (dir, tex)
    }

    #[cfg(unix)]
    #[test]
    fn test_run_relocates_artifacts() {
        let (dir, tex) = setup();
        let config = fake(r#"test "$1" = -xelatex && s="${2%.tex}" && touch "$s.pdf" "$s.synctex.gz""#);

        let pdf = run(&config, TexEngine::Xelatex, &tex).unwrap();
        assert_eq!(pdf, Some(dir.path().join("paper.pdf")));
        assert!(dir.path().join("paper.synctex.gz").is_file());
        assert!(!tex.exists());

        let staged = fs::read_to_string(dir.path().join("build/paper.tex")).unwrap();
        assert_eq!(staged, "\\documentclass{article}");
        assert!(!dir.path().join("build/paper.pdf").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_overwrites_previous_pdf() {
        let (dir, tex) = setup();
        fs::write(dir.path().join("paper.pdf"), "old").unwrap();
        let config = fake(r#"s="${2%.tex}"; echo new > "$s.pdf"; touch "$s.synctex.gz""#);

        run(&config, TexEngine::Pdflatex, &tex).unwrap();
        let pdf = fs::read_to_string(dir.path().join("paper.pdf")).unwrap();
        assert_eq!(pdf.trim(), "new");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_failure_is_not_fatal() {
        let (dir, tex) = setup();
        let config = fake("exit 12");

        let pdf = run(&config, TexEngine::Xelatex, &tex).unwrap();
        assert_eq!(pdf, None);
        assert!(dir.path().join("build/paper.tex").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_missing_companion_after_success() {
        let (_dir, tex) = setup();
        let config = fake(r#"touch "${2%.tex}.pdf""#);

        let result = run(&config, TexEngine::Xelatex, &tex);
        assert!(matches!(result, Err(BuildError::MissingFile(path)) if path.ends_with("build/paper.synctex.gz")));
    }
}
