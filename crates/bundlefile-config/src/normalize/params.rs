//! Parameters and `%name%` substitution

use super::{as_string, DocumentHost, Normalizer};
use bundlefile_core::ParameterValue;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static PARAMETER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z][\w.-]*$").expect("valid parameter name regex"));

static PARAMETER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%([^%]+)%").expect("valid parameter token regex"));

impl<H: DocumentHost + ?Sized> Normalizer<'_, H> {
    /// Keep scalar parameters with a valid name.
    ///
    /// Rejected entries are only reported in verbose mode.
    pub(super) fn normalize_parameters(
        &mut self,
        raw: Option<&Value>,
    ) -> IndexMap<String, ParameterValue> {
        let mut output = IndexMap::new();
        let Some(Value::Object(raw)) = raw else {
            return output;
        };

        self.context.enter("parameters");
        for (name, value) in raw {
            if !PARAMETER_NAME.is_match(name) {
                if self.options.verbose {
                    self.error(format!("Invalid parameter name '{}'.", name));
                }
                continue;
            }
            match ParameterValue::from_value(value) {
                Some(parameter) => {
                    output.insert(name.clone(), parameter);
                },
                None if self.options.verbose => {
                    self.error(format!(
                        "Invalid parameter value for '{}' (type '{}').",
                        name,
                        as_string(value)
                    ));
                },
                None => {},
            }
        }
        self.context.leave();
        output
    }
}

/// Replace known `%name%` tokens, `None` when nothing changed
pub fn substitute_str(input: &str, parameters: &IndexMap<String, ParameterValue>) -> Option<String> {
    if !input.contains('%') {
        return None;
    }
    let replaced = PARAMETER_TOKEN.replace_all(input, |caps: &Captures<'_>| {
        match parameters.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        }
    });
    (replaced != input).then(|| replaced.into_owned())
}

/// One substitution pass over the parameters themselves
pub fn resolve_parameters(parameters: &mut IndexMap<String, ParameterValue>) -> bool {
    let mut changed = false;
    for i in 0..parameters.len() {
        let replaced = match parameters.get_index(i) {
            Some((_, ParameterValue::Text(text))) => substitute_str(text, parameters),
            _ => None,
        };
        if let (Some(replaced), Some((_, value))) = (replaced, parameters.get_index_mut(i)) {
            *value = ParameterValue::Text(replaced);
            changed = true;
        }
    }
    changed
}

/// One substitution pass over every string of a raw value
pub fn substitute_value(value: &mut Value, parameters: &IndexMap<String, ParameterValue>) -> bool {
    match value {
        Value::String(s) => match substitute_str(s, parameters) {
            Some(replaced) => {
                *s = replaced;
                true
            },
            None => false,
        },
        Value::Array(items) => items
            .iter_mut()
            .fold(false, |changed, item| substitute_value(item, parameters) || changed),
        Value::Object(map) => map
            .values_mut()
            .fold(false, |changed, item| substitute_value(item, parameters) || changed),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> IndexMap<String, ParameterValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), ParameterValue::from(*v)))
            .collect()
    }

    #[test]
    fn test_substitute_str() {
        let parameters = params(&[("dist", "public/build"), ("_env", "prod")]);
        assert_eq!(
            substitute_str("%dist%/app.%_env%.js", &parameters).as_deref(),
            Some("public/build/app.prod.js")
        );
        assert_eq!(substitute_str("%unknown%/app.js", &parameters), None);
        assert_eq!(substitute_str("100% plain", &parameters), None);
    }

    #[test]
    fn test_parameters_reach_fixed_point() {
        let mut parameters = params(&[("a", "%b%/x"), ("b", "%c%"), ("c", "root")]);
        while resolve_parameters(&mut parameters) {}
        assert_eq!(parameters["a"].to_string(), "root/x");
        assert_eq!(parameters["b"].to_string(), "root");
    }

    #[test]
    fn test_self_reference_without_growth_terminates() {
        let mut parameters = params(&[("a", "%a%")]);
        assert!(!resolve_parameters(&mut parameters));
    }

    #[test]
    fn test_substitute_value_recurses() {
        let parameters = params(&[("dir", "assets")]);
        let mut raw = json!({
            "packages": {"app": {"scripts": ["%dir%/a.js", {"input": "%dir%/b.js"}], "version": 2}}
        });
        assert!(substitute_value(&mut raw, &parameters));
        assert!(!substitute_value(&mut raw, &parameters));
        assert_eq!(
            raw,
            json!({"packages": {"app": {"scripts": ["assets/a.js", {"input": "assets/b.js"}], "version": 2}}})
        );
    }
}
