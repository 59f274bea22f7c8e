//! Deep flattening of nested YAML lists.
//!
//! Styles often build list fields out of reusable fragments
//! (`header-includes: [*common, extra]`), which YAML anchors turn into
//! lists of lists. Pandoc expects flat lists, so every list is collapsed
//! before the style is written out.

use serde_yaml::Value;

/// Flatten every sequence in `value`, recursively and in place.
///
/// Nested sequences are spliced into their parent at their position;
/// mappings are walked value by value; scalars are left untouched.
pub fn flatten_in_place(value: &mut Value) {
    match value {
        Value::Sequence(items) => {
            let mut flat = Vec::with_capacity(items.len());
            for item in items.drain(..) {
                splice(item, &mut flat);
            }
            *items = flat;
        }
        Value::Mapping(mapping) => {
            for (_, item) in mapping.iter_mut() {
                flatten_in_place(item);
            }
        }
        Value::Tagged(tagged) => flatten_in_place(&mut tagged.value),
        _ => {}
    }
}

/// Append `item` to `out`, expanding nested sequences.
fn splice(item: Value, out: &mut Vec<Value>) {
    match item {
        Value::Sequence(inner) => {
            for nested in inner {
                splice(nested, out);
            }
        }
        mut other => {
            flatten_in_place(&mut other);
            out.push(other);
        }
    }
}
