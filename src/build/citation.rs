//! Citation mode selection.
//!
//! `natbib` leaves citations to BibTeX (needed for `.tex` output that is
//! typeset later), `citeproc` renders them inside pandoc (needed when pandoc
//! produces the PDF itself). The mode goes last on the command line so it
//! runs after every content-generating filter.

use super::OutputKind;
use crate::options::{OptionSet, OptionValue};

pub const NATBIB: &str = "natbib";
pub const CITEPROC: &str = "citeproc";

/// Replace whichever citation option is present with the mode for `kind`.
///
/// Options without a citation mode are left untouched.
pub fn rewrite_citation(options: &mut OptionSet, kind: OutputKind) {
    let enabled = |value: Option<OptionValue>| value.is_some_and(|v| v != OptionValue::Flag(false));

    let natbib = enabled(options.remove(NATBIB));
    let citeproc = enabled(options.remove(CITEPROC));

    if natbib || citeproc {
        options.push_back(kind.citation_mode(), OptionValue::Flag(true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(key: &str) -> OptionSet {
        let mut options = OptionSet::baseline();
        options.insert(key, OptionValue::Flag(true));
        options.insert("filter", OptionValue::List(vec!["a.py".into()]));
        options
    }

    #[test]
    fn test_mode_follows_kind() {
        let mut options = with(CITEPROC);
        rewrite_citation(&mut options, OutputKind::Tex);
        assert!(!options.contains_key(CITEPROC));
        assert_eq!(options.keys().last(), Some(NATBIB));

        rewrite_citation(&mut options, OutputKind::Pdf);
        assert!(!options.contains_key(NATBIB));
        assert_eq!(options.keys().last(), Some(CITEPROC));
    }

    #[test]
    fn test_idempotent_per_kind() {
        for kind in [OutputKind::Tex, OutputKind::Pdf] {
            let mut once = with(NATBIB);
            rewrite_citation(&mut once, kind);
            let mut twice = once.clone();
            rewrite_citation(&mut twice, kind);

            assert_eq!(once, twice);
            let modes = twice.keys().filter(|k| *k == NATBIB || *k == CITEPROC).count();
            assert_eq!(modes, 1);
        }
    }

    #[test]
    fn test_moved_after_filters() {
        let mut options = OptionSet::baseline();
        options.insert(CITEPROC, OptionValue::Flag(true));
        options.insert("filter", OptionValue::List(vec!["a.py".into()]));

        rewrite_citation(&mut options, OutputKind::Pdf);
        let keys: Vec<_> = options.keys().collect();
        assert_eq!(keys[keys.len() - 2..], ["filter", CITEPROC]);
    }

    #[test]
    fn test_no_citation_untouched() {
        let mut options = OptionSet::baseline();
        rewrite_citation(&mut options, OutputKind::Pdf);
        assert_eq!(options, OptionSet::baseline());
    }

    #[test]
    fn test_disabled_mode_dropped() {
        let mut options = OptionSet::baseline();
        options.insert(NATBIB, OptionValue::Flag(false));
        rewrite_citation(&mut options, OutputKind::Tex);
        assert_eq!(options, OptionSet::baseline());
    }
}
