//! Dotted-path flattening of nested bundle declarations.
//!
//! ```yaml
//! app:
//!   frontend:
//!     scripts: app.js
//! ```
//!
//! declares the bundle `app.frontend`. A node becomes a bundle once it (or
//! one of its array entries) carries one of `scripts`, `styles`, `misc` or
//! `deps` with a bundle-shaped value. `version` and `theme` alone are not
//! enough.

use indexmap::IndexMap;
use serde_json::Value;

const BUNDLE_KEYS: [&str; 4] = ["scripts", "styles", "misc", "deps"];

/// Flatten nested declarations into `dotted.name -> [raw variant, ...]`.
///
/// The `@` prefix of a local segment moves to the front of the flattened
/// name.
pub fn flatten_bundles(data: &Value) -> IndexMap<String, Vec<Value>> {
    let mut output = IndexMap::new();
    flatten_into(data, "", &mut output);
    output
}

fn flatten_into(data: &Value, prefix: &str, output: &mut IndexMap<String, Vec<Value>>) {
    let Value::Object(map) = data else {
        return;
    };

    for (key, value) in map {
        let name = join_name(prefix, key);
        let entries: &[Value] = match value {
            Value::Array(items) => items,
            other => std::slice::from_ref(other),
        };
        for entry in entries.iter().filter(|entry| is_bundle(entry)) {
            output.entry(name.clone()).or_default().push(entry.clone());
        }
        flatten_into(value, &name, output);
    }
}

fn join_name(prefix: &str, key: &str) -> String {
    let separator = if prefix.is_empty() { "" } else { "." };
    match key.strip_prefix('@') {
        Some(local) if prefix.starts_with('@') => format!("{}{}{}", prefix, separator, local),
        Some(local) => format!("@{}{}{}", prefix, separator, local),
        None => format!("{}{}{}", prefix, separator, key),
    }
}

fn is_bundle(entry: &Value) -> bool {
    let Value::Object(map) = entry else {
        return false;
    };
    BUNDLE_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .any(|value| match value {
            Value::Object(inner) => inner.contains_key("input") || inner.contains_key("output"),
            _ => true,
        })
}
