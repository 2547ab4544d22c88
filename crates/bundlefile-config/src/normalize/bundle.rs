//! Bundle, resource and dependency normalization

use super::{as_string, ensure_array, flatten_bundles, truthy, DocumentHost, Normalizer};
use bundlefile_core::types::apply_default_theme;
use bundlefile_core::{
    AssetPath, Bundle, BundleName, BundleResult, DependencyRef, InputSpec,
    OutputSpec, ResourceSpec, Version, DEFAULT_THEME,
};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// `path.yml#name[:theme][#version]`
static EXTERNAL_DEPENDENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.*\.(?:yml|yaml|json|toml))#([\w.-]+)(?::([\w.-]+))?(?:#([\w.-]+))?$")
        .expect("valid dependency regex")
});

/// `name[:theme][#version]`
static LOCAL_DEPENDENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@?([A-Za-z][\w.-]*)(?::([\w.-]+))?(?:#([\w.-]+))?$")
        .expect("valid dependency regex")
});

impl<H: DocumentHost + ?Sized> Normalizer<'_, H> {
    /// Normalize the bundle declarations found under `key`
    pub(super) fn normalize_bundles(
        &mut self,
        key: &str,
        raw: Option<&Value>,
    ) -> BundleResult<IndexMap<String, Vec<Bundle>>> {
        let mut output: IndexMap<String, Vec<Bundle>> = IndexMap::new();
        let Some(raw) = raw.filter(|v| v.is_object()) else {
            return Ok(output);
        };

        self.context.enter(key);
        for (name, variants) in flatten_bundles(raw) {
            self.context.enter(name.as_str());
            for (i, variant) in variants.iter().enumerate() {
                self.context.enter(i.to_string());
                if let Some(bundle) = self.normalize_bundle(&name, variant)? {
                    output.entry(bundle.name.name.clone()).or_default().push(bundle);
                }
                self.context.leave();
            }
            let group = name.strip_prefix('@').unwrap_or(&name);
            if let Some(group) = output.get_mut(group) {
                apply_default_theme(group);
            }
            self.context.leave();
        }
        self.context.leave();
        Ok(output)
    }

    fn normalize_bundle(&mut self, name: &str, raw: &Value) -> BundleResult<Option<Bundle>> {
        let Value::Object(raw) = raw else {
            return Ok(None);
        };
        let Some(name) = BundleName::parse(name) else {
            self.error(format!("Invalid package name '{}'.", name));
            return Ok(None);
        };

        let mut bundle = Bundle::new(self.id, name);
        bundle.standalone = raw.get("standalone").map(truthy).unwrap_or(true);
        bundle.version = self.normalize_version(raw.get("version"));
        bundle.theme = normalize_theme(raw.get("theme"));
        bundle.scripts = self.normalize_resource("scripts", raw.get("scripts"));
        bundle.styles = self.normalize_resource("styles", raw.get("styles"));
        bundle.misc = self.normalize_resources("misc", raw.get("misc"));
        bundle.deps = self.normalize_dependencies(raw.get("deps"))?;
        bundle.declared_deps = bundle.deps.clone();
        Ok(Some(bundle))
    }

    fn normalize_version(&mut self, raw: Option<&Value>) -> Version {
        match raw {
            Some(Value::String(text)) if !text.trim().is_empty() => self.parse_version(text),
            Some(Value::Number(number)) => self.parse_version(&number.to_string()),
            _ => Version::any(),
        }
    }

    fn parse_version(&mut self, text: &str) -> Version {
        let (version, errors) = Version::parse_lenient(text);
        if !errors.is_empty() {
            self.context.enter("version");
            for error in errors {
                self.error(error.to_string());
            }
            self.context.leave();
        }
        version
    }

    /// Normalize one resource (`scripts`, `styles` or a `misc` entry)
    fn normalize_resource(&mut self, kind: &str, raw: Option<&Value>) -> Option<ResourceSpec> {
        let raw = raw.filter(|v| !v.is_null())?;

        self.context.enter(kind);
        let resource = match raw {
            Value::String(_) | Value::Array(_) => Some(ResourceSpec {
                inputs: self.normalize_inputs(Some(raw)),
                ..Default::default()
            }),
            Value::Object(map) if is_resource(map) => Some(ResourceSpec {
                inputs: self.normalize_inputs(map.get("input")),
                output: self.normalize_output(map.get("output")),
                watch: self.normalize_watch(map.get("watch")),
                auto_watch: self.normalize_auto_watch(map.get("autoWatch")),
            }),
            other => {
                self.error(format!(
                    "Invalid value '{}'. An object with an input and/or an output key is expected.",
                    as_string(other)
                ));
                None
            },
        };
        self.context.leave();
        resource
    }

    fn normalize_resources(&mut self, kind: &str, raw: Option<&Value>) -> Vec<ResourceSpec> {
        let Some(raw) = raw else {
            return Vec::new();
        };

        let mut output = Vec::new();
        self.context.enter(kind);
        for (i, entry) in ensure_array(raw).into_iter().enumerate() {
            if let Some(resource) = self.normalize_resource(&i.to_string(), Some(entry)) {
                output.push(resource);
            }
        }
        self.context.leave();
        output
    }

    fn normalize_inputs(&mut self, raw: Option<&Value>) -> Vec<InputSpec> {
        let Some(raw) = raw else {
            return Vec::new();
        };

        let mut output = Vec::new();
        self.context.enter("input");
        for (i, entry) in ensure_array(raw).into_iter().enumerate() {
            self.context.enter(i.to_string());
            let mut input = InputSpec::default();
            let files = match entry {
                Value::String(_) => vec![entry],
                Value::Array(items) => items.iter().collect(),
                Value::Object(map) => {
                    input.processors = self.normalize_input_processors(map.get("processors"));
                    map.get("files").map(ensure_array).unwrap_or_default()
                },
                other => {
                    self.error(format!("Invalid input '{}'.", as_string(other)));
                    Vec::new()
                },
            };
            for file in files {
                match self.value_as_path(file) {
                    Some(path) => input.files.push(path),
                    None if file.is_string() => {},
                    None => self.error(format!("Invalid file path '{}'.", as_string(file))),
                }
            }
            output.push(input);
            self.context.leave();
        }
        self.context.leave();
        output
    }

    /// Per-input processor overrides: a name, a list of names or `{name: options}`
    fn normalize_input_processors(&mut self, raw: Option<&Value>) -> IndexMap<String, Option<Value>> {
        let mut output = IndexMap::new();
        match raw {
            None | Some(Value::Null) => {},
            Some(Value::String(name)) if !name.trim().is_empty() => {
                output.insert(name.clone(), None);
            },
            Some(Value::Array(names)) => {
                for name in names {
                    match name.as_str().filter(|n| !n.trim().is_empty()) {
                        Some(name) => {
                            output.insert(name.to_string(), None);
                        },
                        None => self.error(format!("Invalid processor name '{}'.", as_string(name))),
                    }
                }
            },
            Some(Value::Object(map)) => {
                for (name, options) in map {
                    match options {
                        Value::Object(_) | Value::Array(_) => {
                            output.insert(name.clone(), Some(options.clone()));
                        },
                        other => {
                            output.insert(name.clone(), Some(Value::Object(Map::new())));
                            if !other.is_null() {
                                self.error(format!(
                                    "Invalid options '{}' for processor '{}'. You should define an object or null (~ in yaml).",
                                    as_string(other),
                                    name
                                ));
                            }
                        },
                    }
                }
            },
            Some(other) => {
                self.error(format!("Invalid processor name '{}'.", as_string(other)));
            },
        }
        output
    }

    /// A string output serves both environments, `dev` and `prod` fall back on each other
    fn normalize_output(&mut self, raw: Option<&Value>) -> Option<OutputSpec> {
        let raw = raw?;

        self.context.enter("output");
        let output = match raw {
            Value::Object(map) => {
                let dev = map.get("dev").and_then(|v| self.value_as_path(v));
                let prod = map.get("prod").and_then(|v| self.value_as_path(v));
                match (dev, prod) {
                    (Some(dev), Some(prod)) => Some(OutputSpec { dev, prod }),
                    (Some(path), None) | (None, Some(path)) => Some(OutputSpec::both(path)),
                    (None, None) => None,
                }
            },
            Value::Null => None,
            other => match self.value_as_path(other) {
                Some(path) => Some(OutputSpec::both(path)),
                None => {
                    self.error(format!("Invalid output '{}'.", as_string(other)));
                    None
                },
            },
        };
        self.context.leave();
        output
    }

    fn normalize_watch(&mut self, raw: Option<&Value>) -> Vec<AssetPath> {
        let Some(raw) = raw else {
            return Vec::new();
        };

        self.context.enter("watch");
        let mut output = Vec::new();
        for entry in ensure_array(raw) {
            match self.value_as_path(entry) {
                Some(path) => output.push(path),
                None => self.error(format!("Invalid watch path '{}'.", as_string(entry))),
            }
        }
        self.context.leave();
        output
    }

    fn normalize_auto_watch(&mut self, raw: Option<&Value>) -> Option<bool> {
        match raw {
            None | Some(Value::Null) => None,
            Some(Value::Bool(flag)) => Some(*flag),
            Some(other) => {
                self.context.enter("autoWatch");
                self.error(format!("Invalid autoWatch value '{}'. A boolean is expected.", as_string(other)));
                self.context.leave();
                None
            },
        }
    }

    /// Normalize the `deps` key.
    ///
    /// References into another document load that document through the host.
    fn normalize_dependencies(&mut self, raw: Option<&Value>) -> BundleResult<Vec<DependencyRef>> {
        let mut output = Vec::new();

        self.context.enter("deps");
        let entries = raw.map(ensure_array).unwrap_or_default();
        for (i, entry) in entries.into_iter().enumerate() {
            self.context.enter(i.to_string());
            let dependency = match entry.as_str().map(str::trim).filter(|s| !s.is_empty()) {
                Some(text) => self.parse_dependency(text)?,
                None => {
                    self.error(format!(
                        "Invalid dependency '{}'. A string is expected.",
                        as_string(entry)
                    ));
                    None
                },
            };
            output.extend(dependency);
            self.context.leave();
        }
        self.context.leave();
        Ok(output)
    }

    fn parse_dependency(&mut self, text: &str) -> BundleResult<Option<DependencyRef>> {
        if let Some(caps) = EXTERNAL_DEPENDENCY.captures(text) {
            let Some(path) = self.paths.resolve(&caps[1]) else {
                self.error(format!("Invalid dependency '{}'.", text));
                return Ok(None);
            };
            let Some(target) = self.host.load_document(&path.absolute)? else {
                self.error(format!("Failed to load package file '{}'.", path.absolute));
                return Ok(None);
            };
            return Ok(Some(DependencyRef {
                target,
                name: caps[2].to_string(),
                theme: dependency_theme(caps.get(3).map(|m| m.as_str())),
                version: self.dependency_version(caps.get(4).map(|m| m.as_str())),
            }));
        }

        if let Some(caps) = LOCAL_DEPENDENCY.captures(text) {
            return Ok(Some(DependencyRef {
                target: self.id,
                name: caps[1].to_string(),
                theme: dependency_theme(caps.get(2).map(|m| m.as_str())),
                version: self.dependency_version(caps.get(3).map(|m| m.as_str())),
            }));
        }

        self.error(format!(
            "Invalid dependency '{}'. Syntax error, expected 'name[:theme][#version]' or 'file.yml#name[:theme][#version]'.",
            text
        ));
        Ok(None)
    }

    fn dependency_version(&mut self, raw: Option<&str>) -> Version {
        match raw {
            Some(text) => self.parse_version(text),
            None => Version::any(),
        }
    }
}

fn is_resource(map: &Map<String, Value>) -> bool {
    map.contains_key("input") || map.contains_key("output")
}

/// Absent stays `None`, anything that is not a usable name becomes the default theme
fn normalize_theme(raw: Option<&Value>) -> Option<String> {
    raw.map(|value| match value.as_str().map(str::trim) {
        Some(theme) if !theme.is_empty() => theme.to_string(),
        _ => DEFAULT_THEME.to_string(),
    })
}

fn dependency_theme(raw: Option<&str>) -> Option<String> {
    raw.map(|theme| theme.trim().to_string())
}
