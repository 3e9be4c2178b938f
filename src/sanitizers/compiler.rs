//! compiler.rs - Manages the compilation and caching of scrub rules.
//!
//! A validated `PresetSpec` compiles into a `CompiledPreset`: a single
//! character-class regex that is applied with `replace_all` during a scrub
//! pass. Ad-hoc allow fragments arrive on every keystroke with the same
//! text, so successful compilations are memoized in a global, shared cache.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use log::debug;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::charclass::CharClass;
use crate::config::{PresetSpec, ScrubPolicy};
use crate::errors::ScrubError;

/// A preset compiled into a ready-to-apply matching rule.
///
/// The regex is a plain character class for blacklist presets and a negated
/// one for whitelist presets, so every match is exactly one character slated
/// for removal.
#[derive(Debug)]
pub struct CompiledPreset {
    /// The name of the preset this rule was compiled from, or `"allow"` for
    /// ad-hoc whitelist fragments.
    pub name: String,
    pub policy: ScrubPolicy,
    /// The compiled regular expression; matching characters are removed.
    pub regex: Regex,
}

lazy_static! {
    /// A thread-safe, global cache for compiled ad-hoc allow fragments,
    /// keyed by the fragment text itself. Fragments are short, so storing
    /// the full key is cheap and rules out collisions.
    static ref ALLOW_FRAGMENT_CACHE: RwLock<HashMap<String, Arc<CompiledPreset>>> =
        RwLock::new(HashMap::new());
}

/// Compiles a single validated spec into a `CompiledPreset`.
pub fn compile_spec(spec: &PresetSpec) -> Result<CompiledPreset, ScrubError> {
    let class = spec.char_class()?;
    compile_class(&spec.name, spec.policy, &class)
}

/// Compiles a typed class under the given policy.
pub fn compile_class(
    name: &str,
    policy: ScrubPolicy,
    class: &CharClass,
) -> Result<CompiledPreset, ScrubError> {
    let body = class.to_class_body();
    let pattern = match policy {
        ScrubPolicy::Blacklist => format!("[{body}]"),
        ScrubPolicy::Whitelist => format!("[^{body}]"),
    };
    debug!("Compiling preset '{}' with pattern '{}'", name, pattern);

    let regex = RegexBuilder::new(&pattern)
        .size_limit(10 * (1 << 20)) // 10 MB limit for compiled regex
        .build()
        .map_err(|e| ScrubError::PresetCompilationError(name.to_string(), e))?;

    Ok(CompiledPreset {
        name: name.to_string(),
        policy,
        regex,
    })
}

/// Gets a compiled whitelist rule for an ad-hoc allow fragment, compiling
/// and caching it on first use.
///
/// Returns an `Arc` to allow cheap sharing across repeated keystrokes. Only
/// successful compilations are cached; a malformed fragment is re-reported
/// on every call.
pub fn get_or_compile_allow(fragment: &str) -> Result<Arc<CompiledPreset>, ScrubError> {
    {
        let cache = ALLOW_FRAGMENT_CACHE.read().unwrap();
        if let Some(rule) = cache.get(fragment) {
            debug!("Serving compiled allow fragment '{}' from cache", fragment);
            return Ok(Arc::clone(rule));
        }
    } // Read lock is released here.

    let class = CharClass::parse_fragment(fragment).map_err(|kind| ScrubError::InvalidFragment {
        fragment: fragment.to_string(),
        kind,
    })?;
    let compiled = Arc::new(compile_class("allow", ScrubPolicy::Whitelist, &class)?);

    ALLOW_FRAGMENT_CACHE
        .write()
        .unwrap()
        .insert(fragment.to_string(), Arc::clone(&compiled));

    debug!("Compiled and cached allow fragment '{}'", fragment);
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blacklist_pattern_matches_listed_characters() {
        let spec = PresetSpec::new("text", ScrubPolicy::Blacklist, "'\"<>&/");
        let compiled = compile_spec(&spec).unwrap();
        assert!(compiled.regex.is_match("<"));
        assert!(compiled.regex.is_match("&"));
        assert!(!compiled.regex.is_match("a"));
    }

    #[test]
    fn whitelist_pattern_matches_everything_else() {
        let spec = PresetSpec::new("number", ScrubPolicy::Whitelist, "0-9");
        let compiled = compile_spec(&spec).unwrap();
        assert!(compiled.regex.is_match("a"));
        assert!(compiled.regex.is_match(" "));
        assert!(!compiled.regex.is_match("7"));
    }

    #[test]
    fn compile_class_accepts_hand_built_classes() {
        let class = CharClass::from_parts(['_'], [('a', 'z')]).unwrap();
        let compiled = compile_class("ident", ScrubPolicy::Whitelist, &class).unwrap();
        assert!(!compiled.regex.is_match("_"));
        assert!(!compiled.regex.is_match("q"));
        assert!(compiled.regex.is_match("A"));
    }

    #[test]
    fn allow_cache_returns_same_instance() {
        let first = get_or_compile_allow("0-9xyz").unwrap();
        let second = get_or_compile_allow("0-9xyz").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn distinct_fragments_get_distinct_rules() {
        let digits = get_or_compile_allow("0-9").unwrap();
        let letters = get_or_compile_allow("a-z").unwrap();
        assert!(!Arc::ptr_eq(&digits, &letters));
        assert!(digits.regex.is_match("a"));
        assert!(!letters.regex.is_match("a"));
    }

    #[test]
    fn malformed_fragment_is_not_cached() {
        assert!(get_or_compile_allow("a-9]").is_err());
        assert!(get_or_compile_allow("a-9]").is_err());
    }

    #[test]
    fn escaped_fragment_metacharacters_stay_literal() {
        let compiled = get_or_compile_allow(r"0-9\-\]").unwrap();
        assert!(!compiled.regex.is_match("-"));
        assert!(!compiled.regex.is_match("]"));
        assert!(compiled.regex.is_match("a"));
    }
}
