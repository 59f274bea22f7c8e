//! Conversion between option sets and pandoc argument lists.
//!
//! Only the long form is supported: `--key=value` and `--flag`.

use super::{OptionSet, OptionValue};
use crate::log;

const PREFIX: &str = "--";

/// Encode options as pandoc arguments, in option order.
///
/// List values expand to one `--key=item` per item at the key's position.
pub fn encode(options: &OptionSet) -> Vec<String> {
    let mut args = Vec::with_capacity(options.len());
    for (key, value) in options.iter() {
        match value {
            OptionValue::Flag(true) => args.push(format!("{PREFIX}{key}")),
            OptionValue::Flag(false) | OptionValue::Unset => {}
            OptionValue::Scalar(value) => args.push(format!("{PREFIX}{key}={value}")),
            OptionValue::List(items) => {
                args.extend(items.iter().map(|item| format!("{PREFIX}{key}={item}")));
            }
        }
    }
    args
}

/// Decode command-line overrides into options.
///
/// Arguments not starting with `--` are dropped with a warning. A repeated key
/// keeps its first position and its last value.
pub fn decode<S: AsRef<str>>(args: &[S]) -> OptionSet {
    let mut options = OptionSet::new();
    for arg in args {
        let arg = arg.as_ref();
        let Some(body) = arg.strip_prefix(PREFIX).filter(|b| !b.is_empty()) else {
            log!("warn"; "option {arg} does not start with \"--\"; ignored");
            continue;
        };
        match body.split_once('=') {
            Some((key, value)) => options.insert(key, OptionValue::scalar(value)),
            None => options.insert(body, OptionValue::Flag(true)),
        }
    }
    options
}
