//! Command-line interface definitions.
//!
//! Defines all CLI arguments using clap. pandocmk flags may appear anywhere
//! after the document path; every other argument is forwarded to pandoc.

use clap::{CommandFactory, Parser};
use std::{ffi::OsString, path::PathBuf};

const AFTER_HELP: &str = "\
Note: FILE must come first; pandoc options must be --key=value or --flag
and may be mixed with the pandocmk options.

Example:
  pandocmk paper.md --toc --tex --view --number-sections";

/// pandocmk: a minimalistic make for pandoc
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, after_help = AFTER_HELP, arg_required_else_help = true)]
pub struct Cli {
    /// Markdown document to build
    pub file: PathBuf,

    /// Open output file in a viewer
    #[arg(long)]
    pub view: bool,

    /// Monitor the input file for changes, and rebuild as needed
    #[arg(short, long)]
    pub watch: bool,

    /// Show build time
    #[arg(long, visible_alias = "time")]
    pub timeit: bool,

    /// NOT IMPLEMENTED. Choose faster LaTeX options when building a PDF
    #[arg(long)]
    pub draft: bool,

    /// Save .tex output besides .pdf
    #[arg(long)]
    pub tex: bool,

    /// Build pdf with latexmk; implies --tex
    #[arg(long)]
    pub latexmk: bool,

    /// Show debugging information
    #[arg(short, long)]
    pub verbose: bool,

    /// Stop with error if style not found (default, unless the config says otherwise)
    #[arg(short, long, overrides_with = "no_strict")]
    pub strict: bool,

    /// Warn and use default options if style not found
    #[arg(long, overrides_with = "strict")]
    pub no_strict: bool,

    /// Try again in case of error (useful with --watch)
    #[arg(short, long)]
    pub retry: bool,

    /// Config file (default: pandocmk.toml beside FILE)
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Pandoc options, forwarded as overrides
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "PANDOC OPTIONS")]
    pub pandoc_args: Vec<String>,
}

impl Cli {
    /// Parse the process arguments, letting pandoc options and pandocmk
    /// flags appear in any order.
    pub fn parse_args() -> Self {
        Self::parse_args_from(std::env::args_os())
    }

    pub fn parse_args_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::parse_from(partition(args))
    }

    /// Whether the `.tex` intermediate is produced (`--tex` or `--latexmk`).
    pub const fn wants_tex(&self) -> bool {
        self.tex || self.latexmk
    }

    /// Strict style lookup requested on the command line, if any.
    pub const fn strict_override(&self) -> Option<bool> {
        match (self.strict, self.no_strict) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

// ============================================================================
// Argument Partitioning
// ============================================================================

/// How an argument relates to the pandocmk command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Known {
    /// Not a pandocmk flag
    No,
    /// A pandocmk flag, complete as written
    Flag,
    /// A pandocmk option whose value is the next argument
    TakesNext,
}

/// Reorder arguments as `bin <pandocmk args> -- <pandoc args>`.
///
/// Flags are recognized against the clap definition of [`Cli`], so the
/// partition never drifts from what clap accepts. The first positional
/// argument is the document; anything else clap does not know goes to pandoc.
fn partition<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut command = Cli::command();
    command.build();

    let mut args = args.into_iter().map(Into::into);
    let mut own: Vec<OsString> = args.next().into_iter().collect();
    let mut forwarded = Vec::new();
    let mut has_file = false;

    while let Some(arg) = args.next() {
        let (known, dashed) = {
            let text = arg.to_string_lossy();
            (classify(&command, &text), text.starts_with('-'))
        };
        match known {
            Known::Flag => own.push(arg),
            Known::TakesNext => {
                own.push(arg);
                own.extend(args.next());
            }
            Known::No if !has_file && !dashed => {
                has_file = true;
                own.push(arg);
            }
            Known::No => forwarded.push(arg),
        }
    }

    // Without a document, let clap report the missing FILE
    if has_file && !forwarded.is_empty() {
        own.push("--".into());
        own.extend(forwarded);
    }
    own
}

fn classify(command: &clap::Command, arg: &str) -> Known {
    let takes_value = |a: &clap::Arg| a.get_action().takes_values();

    if let Some(long) = arg.strip_prefix("--") {
        let (name, inline_value) = match long.split_once('=') {
            Some((name, _)) => (name, true),
            None => (long, false),
        };
        let found = command.get_arguments().find(|a| {
            a.get_long() == Some(name)
                || a.get_all_aliases().is_some_and(|aliases| aliases.contains(&name))
        });
        return match found {
            Some(a) if takes_value(a) && !inline_value => Known::TakesNext,
            Some(_) => Known::Flag,
            None => Known::No,
        };
    }

    let Some(shorts) = arg.strip_prefix('-').filter(|s| !s.is_empty()) else {
        return Known::No;
    };
    let short = |c: char| command.get_arguments().find(|a| a.get_short() == Some(c));
    let mut chars = shorts.chars();
    match (chars.next().and_then(short), chars.as_str()) {
        (Some(a), "") if takes_value(a) => Known::TakesNext,
        (Some(a), _) if takes_value(a) => Known::Flag,
        (Some(_), rest) if rest.chars().all(|c| short(c).is_some_and(|a| !takes_value(a))) => {
            Known::Flag
        }
        _ => Known::No,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_args_from(std::iter::once("pandocmk").chain(args.iter().copied()))
    }

    #[test]
    fn test_flags() {
        let cli = parse(&["paper.md", "--view", "-w", "--time", "-v", "-r"]);
        assert_eq!(cli.file, PathBuf::from("paper.md"));
        assert!(cli.view && cli.watch && cli.timeit && cli.verbose && cli.retry);
        assert!(!cli.tex && !cli.latexmk);
        assert!(cli.strict_override().is_none());
        assert!(cli.pandoc_args.is_empty());
    }

    #[test]
    fn test_latexmk_implies_tex() {
        let cli = parse(&["paper.md", "--latexmk"]);
        assert!(!cli.tex);
        assert!(cli.wants_tex());
    }

    #[test]
    fn test_strict_flags() {
        assert_eq!(parse(&["a.md", "--strict"]).strict_override(), Some(true));
        assert_eq!(parse(&["a.md", "-s"]).strict_override(), Some(true));
        assert_eq!(parse(&["a.md", "--no-strict"]).strict_override(), Some(false));
        // Last one wins
        assert_eq!(
            parse(&["a.md", "--strict", "--no-strict"]).strict_override(),
            Some(false)
        );
    }

    #[test]
    fn test_strict_followed_by_pandoc_option() {
        let cli = parse(&["paper.md", "--strict", "--toc"]);
        assert_eq!(cli.strict_override(), Some(true));
        assert_eq!(cli.pandoc_args, vec!["--toc"]);
    }

    #[test]
    fn test_pandoc_args_forwarded() {
        let cli = parse(&["paper.md", "--tex", "--toc", "--template=x.tex", "oops"]);
        assert!(cli.tex);
        assert_eq!(cli.pandoc_args, vec!["--toc", "--template=x.tex", "oops"]);
    }

    #[test]
    fn test_own_flags_after_pandoc_options() {
        let cli = parse(&["paper.md", "--toc", "--view", "--watch", "-N", "-rv"]);
        assert!(cli.view && cli.watch && cli.retry && cli.verbose);
        assert_eq!(cli.pandoc_args, vec!["--toc", "-N"]);
    }

    #[test]
    fn test_config_value_not_forwarded() {
        let cli = parse(&["paper.md", "--toc", "--config", "my.toml", "-C", "other.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("other.toml")));
        assert_eq!(cli.pandoc_args, vec!["--toc"]);

        let cli = parse(&["paper.md", "--config=my.toml", "--number-sections"]);
        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
        assert_eq!(cli.pandoc_args, vec!["--number-sections"]);
    }

    #[test]
    fn test_flags_before_file() {
        let cli = parse(&["--tex", "paper.md", "--toc"]);
        assert!(cli.tex);
        assert_eq!(cli.file, PathBuf::from("paper.md"));
        assert_eq!(cli.pandoc_args, vec!["--toc"]);
    }

    #[test]
    fn test_missing_file_rejected() {
        let args = partition(["pandocmk", "--toc"]);
        assert!(Cli::try_parse_from(args).is_err());
    }
}
