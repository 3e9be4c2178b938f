//! Configuration management for `keyscrub`.
//!
//! This module defines the core data structures for sanitization presets.
//! It handles serialization/deserialization of YAML preset files and
//! provides utilities for loading, merging, and validating them.
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::charclass::CharClass;
use crate::errors::ScrubError;

/// Maximum allowed length for a character-class fragment.
pub const MAX_FRAGMENT_LENGTH: usize = 500;

/// The name of the preset used when no selector (or an unresolvable one) is
/// supplied.
pub const DEFAULT_PRESET: &str = "text";

/// Whether a preset removes the characters it matches, or everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrubPolicy {
    /// Matching characters are removed; everything else passes through.
    Blacklist,
    /// Characters outside the class are removed.
    Whitelist,
}

/// A single named sanitization preset, as written in a preset file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PresetSpec {
    /// Unique identifier for the preset (e.g., "number").
    pub name: String,
    /// Human-readable description of what the preset allows or strips.
    #[serde(default)]
    pub description: Option<String>,
    pub policy: ScrubPolicy,
    /// The character set, in legacy class-fragment syntax (`"0-9./"`).
    pub chars: String,
}

impl PresetSpec {
    /// Convenience constructor for programmatic overrides.
    pub fn new(name: impl Into<String>, policy: ScrubPolicy, chars: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            policy,
            chars: chars.into(),
        }
    }

    /// Parses this spec's `chars` fragment into a typed class.
    pub fn char_class(&self) -> Result<CharClass, ScrubError> {
        CharClass::parse_fragment(&self.chars).map_err(|kind| ScrubError::InvalidFragment {
            fragment: self.chars.clone(),
            kind,
        })
    }
}

/// The top-level structure of a preset configuration file.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct PresetFile {
    pub presets: Vec<PresetSpec>,
}

impl PresetFile {
    /// Loads presets from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading custom presets from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read preset file {}", path.display()))?;
        let file = Self::from_yaml(&text)
            .with_context(|| format!("Failed to parse preset file {}", path.display()))?;
        info!("Loaded {} presets from file {}.", file.presets.len(), path.display());
        Ok(file)
    }

    /// Parses and validates presets from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let file: PresetFile = serde_yml::from_str(text).context("Failed to parse preset YAML")?;
        validate_specs(&file.presets)?;
        Ok(file)
    }

    /// Loads the built-in presets from the embedded configuration.
    pub fn load_default_presets() -> Result<Self> {
        debug!("Loading default presets from embedded string...");
        let default_yaml = include_str!("../config/default_presets.yaml");
        let file = Self::from_yaml(default_yaml).context("Failed to parse default presets")?;
        debug!("Loaded {} default presets.", file.presets.len());
        Ok(file)
    }
}

/// Merges user-defined presets with defaults. Same-named user entries fully
/// replace the default entry; defaults not mentioned are kept as-is.
pub fn merge_specs(defaults: Vec<PresetSpec>, user: Option<Vec<PresetSpec>>) -> Vec<PresetSpec> {
    debug!("merge_specs called. Initial default preset count: {}", defaults.len());

    let mut merged: HashMap<String, PresetSpec> = defaults
        .into_iter()
        .map(|spec| (spec.name.clone(), spec))
        .collect();

    if let Some(user_specs) = user {
        debug!("User presets provided. Merging {} entries.", user_specs.len());
        for spec in user_specs {
            merged.insert(spec.name.clone(), spec);
        }
    }

    let merged: Vec<PresetSpec> = merged.into_values().collect();
    debug!("Final total presets after merge: {}", merged.len());
    merged
}

/// Validates preset integrity (unique non-empty names, parseable fragments).
pub fn validate_specs(specs: &[PresetSpec]) -> Result<(), ScrubError> {
    let mut names = HashSet::new();
    let mut errors = Vec::new();

    for spec in specs {
        if spec.name.is_empty() {
            errors.push("A preset has an empty `name` field.".to_string());
        } else if !names.insert(spec.name.clone()) {
            errors.push(format!("Duplicate preset name found: '{}'.", spec.name));
        }

        if spec.chars.len() > MAX_FRAGMENT_LENGTH {
            errors.push(format!(
                "Preset '{}': fragment length ({}) exceeds maximum allowed ({}).",
                spec.name,
                spec.chars.len(),
                MAX_FRAGMENT_LENGTH
            ));
            continue;
        }

        if let Err(e) = spec.char_class() {
            errors.push(format!("Preset '{}': {}", spec.name, e));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ScrubError::PresetValidation(errors.join("\n")))
    }
}
