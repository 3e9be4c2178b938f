//! engine.rs - The scrub engine: rule resolution and the removal pass.
//!
//! A `Scrubber` owns a `PresetRegistry` and exposes the per-keystroke
//! `scrub` operation. Scrubbing is total: malformed selectors degrade to the
//! default preset (or to the identity rule when even that is missing), with
//! the diagnostic carried on the outcome instead of raised at the caller.
//! An input event handler must never be interrupted by sanitization.
//!
//! License: MIT OR APACHE 2.0

use anyhow::Result;
use log::{debug, warn};
use std::sync::Arc;

use crate::config::{PresetSpec, DEFAULT_PRESET};
use crate::errors::ScrubError;
use crate::presets::PresetRegistry;
use crate::sanitizers::compiler::{get_or_compile_allow, CompiledPreset};

/// Which rule a scrub call should apply.
///
/// This replaces the older convention of sniffing a dynamically-typed
/// configuration value (bare string vs. `{type}` vs. `{allow}` object);
/// [`RuleSelector::from_value`] remains as the compatibility parser for
/// callers still holding that shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RuleSelector {
    /// Resolve the default preset (`"text"`).
    #[default]
    Default,
    /// Resolve a named preset from the registry.
    Preset(String),
    /// Build an ad-hoc whitelist from a legacy character-class fragment.
    Allow(String),
}

impl RuleSelector {
    pub fn preset(name: impl Into<String>) -> Self {
        Self::Preset(name.into())
    }

    pub fn allow(fragment: impl Into<String>) -> Self {
        Self::Allow(fragment.into())
    }

    /// Parses the legacy configuration shapes: a bare preset-name string, an
    /// object with a `type` field, or an object with an `allow` field (a
    /// non-empty `allow` wins when both are present; an empty one is treated
    /// as absent so a `type` beside it still resolves). Anything else is
    /// `Default`.
    pub fn from_value(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(name) => Self::Preset(name.clone()),
            serde_json::Value::Object(map) => {
                if let Some(fragment) = map
                    .get("allow")
                    .and_then(|v| v.as_str())
                    .filter(|f| !f.is_empty())
                {
                    Self::Allow(fragment.to_string())
                } else if let Some(name) = map.get("type").and_then(|v| v.as_str()) {
                    Self::Preset(name.to_string())
                } else {
                    Self::Default
                }
            }
            _ => Self::Default,
        }
    }
}

impl From<&str> for RuleSelector {
    fn from(name: &str) -> Self {
        Self::Preset(name.to_string())
    }
}

impl From<String> for RuleSelector {
    fn from(name: String) -> Self {
        Self::Preset(name)
    }
}

/// A non-fatal diagnostic produced while resolving a rule.
///
/// These accompany a successful outcome so the caller can decide whether to
/// surface them; they are also written to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrubWarning {
    /// The `allow` fragment did not parse or compile; the default preset was
    /// applied instead.
    InvalidAllowFragment { fragment: String, detail: String },
    /// The named preset is not in the registry; the default preset was
    /// applied instead.
    UnknownPreset { name: String },
    /// Even the default preset is missing (overridden away); nothing was
    /// removed.
    MissingDefaultPreset,
}

/// The result of one scrub call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrubOutcome {
    /// The input with every matching character removed.
    pub safe_value: String,
    /// How many characters were removed, counted in Unicode scalar values,
    /// always exactly `input.chars().count() - safe_value.chars().count()`.
    /// Callers use this to reposition an input caret after re-rendering.
    pub removed_count: usize,
    /// A non-fatal diagnostic, when resolution had to fall back.
    pub warning: Option<ScrubWarning>,
}

impl ScrubOutcome {
    fn empty() -> Self {
        Self {
            safe_value: String::new(),
            removed_count: 0,
            warning: None,
        }
    }
}

/// The scrub engine. Owns the preset registry and applies resolved rules.
#[derive(Debug)]
pub struct Scrubber {
    registry: PresetRegistry,
}

impl Scrubber {
    /// Creates a scrubber over a registry seeded with the built-in presets.
    pub fn new() -> Result<Self, ScrubError> {
        Ok(Self {
            registry: PresetRegistry::with_builtins()?,
        })
    }

    /// Creates a scrubber over a caller-built registry.
    pub fn with_registry(registry: PresetRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PresetRegistry {
        &self.registry
    }

    /// Merges presets into the registry; see [`PresetRegistry::merge`].
    pub fn set_presets(&mut self, specs: Vec<PresetSpec>) -> Result<(), ScrubError> {
        self.registry.merge(specs)
    }

    /// Legacy dynamic merge; see [`PresetRegistry::merge_value`].
    pub fn set_presets_value(&mut self, value: &serde_json::Value) -> Result<(), ScrubError> {
        self.registry.merge_value(value)
    }

    /// Scrubs `input` under the rule named by `selector`.
    ///
    /// The resolved rule is applied as one global pass: every matching
    /// character in the string is removed, nothing is substituted. This
    /// never fails and never panics; resolution problems degrade per the
    /// fallback chain and are reported on [`ScrubOutcome::warning`].
    pub fn scrub(&self, input: &str, selector: &RuleSelector) -> ScrubOutcome {
        let mut warning = None;
        let Some(rule) = self.resolve(selector, &mut warning) else {
            // Identity: no rule to apply, nothing removed.
            return ScrubOutcome {
                safe_value: input.to_string(),
                removed_count: 0,
                warning,
            };
        };

        let safe_value = rule.regex.replace_all(input, "").into_owned();
        let removed_count = input.chars().count() - safe_value.chars().count();
        ScrubOutcome {
            safe_value,
            removed_count,
            warning,
        }
    }

    /// Scrubs a dynamically-typed value. `Value::String` is scrubbed
    /// normally; any other type yields the defined fallback of an empty
    /// string with zero removed. That fallback is part of the contract, not
    /// an error path.
    pub fn scrub_value(&self, value: &serde_json::Value, selector: &RuleSelector) -> ScrubOutcome {
        match value {
            serde_json::Value::String(s) => self.scrub(s, selector),
            other => {
                debug!(
                    "scrub_value called with non-string input ({}); returning empty outcome.",
                    match other {
                        serde_json::Value::Null => "null",
                        serde_json::Value::Bool(_) => "a boolean",
                        serde_json::Value::Number(_) => "a number",
                        serde_json::Value::Array(_) => "an array",
                        _ => "an object",
                    }
                );
                ScrubOutcome::empty()
            }
        }
    }

    /// Rule resolution, first match wins:
    /// 1. a non-empty `allow` fragment (invalid fragments fall through);
    /// 2. a named preset found in the registry;
    /// 3. the default preset;
    /// 4. `None`, meaning the identity rule.
    fn resolve(
        &self,
        selector: &RuleSelector,
        warning: &mut Option<ScrubWarning>,
    ) -> Option<Arc<CompiledPreset>> {
        match selector {
            RuleSelector::Allow(fragment) if !fragment.is_empty() => {
                match get_or_compile_allow(fragment) {
                    Ok(rule) => return Some(rule),
                    Err(e) => {
                        warn!(
                            "Invalid allow fragment '{}'; falling back to preset '{}': {}",
                            fragment, DEFAULT_PRESET, e
                        );
                        *warning = Some(ScrubWarning::InvalidAllowFragment {
                            fragment: fragment.clone(),
                            detail: e.to_string(),
                        });
                    }
                }
            }
            // An empty fragment means "nothing explicitly allowed"; treating
            // it as a real whitelist would delete the whole input.
            RuleSelector::Allow(_) => {}
            RuleSelector::Preset(name) => {
                if let Some(rule) = self.registry.lookup(name) {
                    return Some(rule);
                }
                debug!("Unknown preset '{}'; falling back to '{}'.", name, DEFAULT_PRESET);
                *warning = Some(ScrubWarning::UnknownPreset { name: name.clone() });
            }
            RuleSelector::Default => {}
        }

        let fallback = self.registry.lookup(DEFAULT_PRESET);
        if fallback.is_none() {
            warn!(
                "Default preset '{}' is missing from the registry; nothing will be removed.",
                DEFAULT_PRESET
            );
            warning.get_or_insert(ScrubWarning::MissingDefaultPreset);
        }
        fallback
    }
}

/// Scrubs `input` once against the built-in presets, without keeping a
/// `Scrubber` around. Convenience entry point for one-shot callers; anything
/// invoked per keystroke should construct a [`Scrubber`] and reuse it.
pub fn scrub_once(input: &str, selector: &RuleSelector) -> Result<ScrubOutcome> {
    let scrubber = Scrubber::new()?;
    Ok(scrubber.scrub(input, selector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selector_from_value_handles_legacy_shapes() {
        assert_eq!(
            RuleSelector::from_value(&json!("number")),
            RuleSelector::preset("number")
        );
        assert_eq!(
            RuleSelector::from_value(&json!({ "type": "email" })),
            RuleSelector::preset("email")
        );
        assert_eq!(
            RuleSelector::from_value(&json!({ "allow": "0-9" })),
            RuleSelector::allow("0-9")
        );
        // A non-empty `allow` wins when both fields are present.
        assert_eq!(
            RuleSelector::from_value(&json!({ "type": "email", "allow": "0-9" })),
            RuleSelector::allow("0-9")
        );
        // An empty `allow` is treated as absent: the `type` still resolves.
        assert_eq!(
            RuleSelector::from_value(&json!({ "type": "email", "allow": "" })),
            RuleSelector::preset("email")
        );
        assert_eq!(
            RuleSelector::from_value(&json!({ "allow": "" })),
            RuleSelector::Default
        );
        assert_eq!(RuleSelector::from_value(&json!(null)), RuleSelector::Default);
        assert_eq!(RuleSelector::from_value(&json!(7)), RuleSelector::Default);
    }

    #[test]
    fn empty_allow_fragment_falls_back_to_default() {
        let scrubber = Scrubber::new().unwrap();
        let outcome = scrubber.scrub("a<b", &RuleSelector::allow(""));
        assert_eq!(outcome.safe_value, "ab");
        assert_eq!(outcome.removed_count, 1);
        assert_eq!(outcome.warning, None);
    }

    #[test]
    fn missing_default_preset_is_identity() {
        let scrubber = Scrubber::with_registry(PresetRegistry::empty());
        let outcome = scrubber.scrub("keep <everything>", &RuleSelector::Default);
        assert_eq!(outcome.safe_value, "keep <everything>");
        assert_eq!(outcome.removed_count, 0);
        assert_eq!(outcome.warning, Some(ScrubWarning::MissingDefaultPreset));
    }

    #[test]
    fn scrub_once_matches_scrubber_output() {
        let outcome = scrub_once("1a2b3", &RuleSelector::preset("number")).unwrap();
        assert_eq!(outcome.safe_value, "123");
        assert_eq!(outcome.removed_count, 2);
    }
}
