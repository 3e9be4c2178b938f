//! presets.rs - The preset registry: named scrub rules, lookup and merge.
//!
//! A `PresetRegistry` is an explicit value owned by the embedding
//! application rather than process-global state, so multiple independent
//! registries (e.g. per-tenant rule sets) can coexist without
//! cross-contamination. Presets are validated and compiled when they enter
//! the registry; lookups hand out cheap `Arc` clones of compiled rules.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{validate_specs, PresetFile, PresetSpec, ScrubPolicy};
use crate::errors::ScrubError;
use crate::sanitizers::compiler::{compile_spec, CompiledPreset};

/// Maps preset name (case-sensitive) to its compiled rule.
#[derive(Debug, Default)]
pub struct PresetRegistry {
    rules: HashMap<String, Arc<CompiledPreset>>,
}

/// The object-valued entry shape accepted by the legacy dynamic merge path.
#[derive(Deserialize)]
struct LegacyPresetEntry {
    #[serde(default)]
    description: Option<String>,
    policy: ScrubPolicy,
    chars: String,
}

impl PresetRegistry {
    /// Creates an empty registry with no presets at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry seeded with the built-in presets
    /// (`text`, `number`, `email`, `url`).
    pub fn with_builtins() -> Result<Self, ScrubError> {
        let file = PresetFile::load_default_presets()?;
        let mut registry = Self::empty();
        registry.merge(file.presets)?;
        Ok(registry)
    }

    /// Returns the compiled rule registered under `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<Arc<CompiledPreset>> {
        self.rules.get(name).map(Arc::clone)
    }

    /// Iterates over the registered preset names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Merges `specs` into the registry. Same-named entries are fully
    /// replaced; entries not mentioned are left unchanged.
    ///
    /// The merge is all-or-nothing: every spec is validated and compiled
    /// before anything is inserted, so a batch containing one bad spec
    /// leaves the registry exactly as it was. The error is also logged,
    /// since callers on the legacy surface tend to drop it.
    pub fn merge(&mut self, specs: Vec<PresetSpec>) -> Result<(), ScrubError> {
        if let Err(e) = self.try_merge(specs) {
            warn!("Preset merge rejected; registry left unchanged: {}", e);
            return Err(e);
        }
        Ok(())
    }

    fn try_merge(&mut self, specs: Vec<PresetSpec>) -> Result<(), ScrubError> {
        validate_specs(&specs)?;

        let mut compiled = Vec::with_capacity(specs.len());
        for spec in &specs {
            compiled.push(Arc::new(compile_spec(spec)?));
        }

        for rule in compiled {
            debug!("Registering preset '{}'.", rule.name);
            self.rules.insert(rule.name.clone(), rule);
        }
        Ok(())
    }

    /// Legacy dynamic merge: accepts a JSON-shaped mapping of preset name to
    /// either a bare fragment string (treated as a whitelist) or an object
    /// with `policy` and `chars` fields.
    ///
    /// A value that is not a mapping at all (null, a number, an array, ...)
    /// is the classic misuse of this surface; it is logged and rejected
    /// without touching the registry.
    pub fn merge_value(&mut self, value: &serde_json::Value) -> Result<(), ScrubError> {
        let Some(entries) = value.as_object() else {
            let err = ScrubError::InvalidPresetMapping(json_type_name(value).to_string());
            warn!("Preset merge rejected; registry left unchanged: {}", err);
            return Err(err);
        };

        let mut specs = Vec::with_capacity(entries.len());
        for (name, entry) in entries {
            let spec = match entry {
                serde_json::Value::String(chars) => {
                    PresetSpec::new(name.clone(), ScrubPolicy::Whitelist, chars.clone())
                }
                serde_json::Value::Object(_) => {
                    let legacy: LegacyPresetEntry = serde_json::from_value(entry.clone())
                        .map_err(|e| {
                            let err = ScrubError::InvalidPresetMapping(format!(
                                "entry '{name}' is malformed: {e}"
                            ));
                            warn!("Preset merge rejected; registry left unchanged: {}", err);
                            err
                        })?;
                    PresetSpec {
                        name: name.clone(),
                        description: legacy.description,
                        policy: legacy.policy,
                        chars: legacy.chars,
                    }
                }
                other => {
                    let err = ScrubError::InvalidPresetMapping(format!(
                        "entry '{}' is {}",
                        name,
                        json_type_name(other)
                    ));
                    warn!("Preset merge rejected; registry left unchanged: {}", err);
                    return Err(err);
                }
            };
            specs.push(spec);
        }

        self.merge(specs)
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
