// keyscrub/tests/preset_config_tests.rs
//! Loading, validating, and merging preset configuration: YAML files, the
//! embedded builtins, and the all-or-nothing registry merge.

use anyhow::Result;
use std::io::Write;

use keyscrub::{
    merge_specs, PresetFile, PresetRegistry, PresetSpec, RuleSelector, ScrubPolicy, Scrubber,
};

#[test]
fn presets_load_from_yaml_text() -> Result<()> {
    let yaml = r#"
presets:
  - name: hex
    description: "Hexadecimal digits."
    policy: whitelist
    chars: "0-9A-Fa-f"
  - name: no_brackets
    policy: blacklist
    chars: "()\\[\\]{}"
"#;
    let file = PresetFile::from_yaml(yaml)?;
    assert_eq!(file.presets.len(), 2);
    assert_eq!(file.presets[0].policy, ScrubPolicy::Whitelist);

    let mut registry = PresetRegistry::with_builtins()?;
    registry.merge(file.presets)?;
    let scrubber = Scrubber::with_registry(registry);

    let outcome = scrubber.scrub("0xDEADBEEFzz", &RuleSelector::preset("hex"));
    assert_eq!(outcome.safe_value, "0DEADBEEF");

    let outcome = scrubber.scrub("f(x) = [a]{b}", &RuleSelector::preset("no_brackets"));
    assert_eq!(outcome.safe_value, "fx = ab");
    Ok(())
}

#[test]
fn presets_load_from_file() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        "presets:\n  - name: digits\n    policy: whitelist\n    chars: \"0-9\"\n"
    )?;

    let loaded = PresetFile::load_from_file(file.path())?;
    assert_eq!(loaded.presets.len(), 1);
    assert_eq!(loaded.presets[0].name, "digits");
    Ok(())
}

#[test]
fn loading_a_missing_file_reports_the_path() {
    let err = PresetFile::load_from_file("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.yaml"));
}

#[test]
fn invalid_yaml_and_invalid_fragments_are_rejected() {
    assert!(PresetFile::from_yaml("presets: 42").is_err());

    let reversed = r#"
presets:
  - name: broken
    policy: whitelist
    chars: "z-a"
"#;
    let err = PresetFile::from_yaml(reversed).unwrap_err();
    assert!(err.to_string().contains("Failed to parse preset YAML") || format!("{err:#}").contains("reversed range"));
}

#[test]
fn duplicate_names_are_rejected() {
    let yaml = r#"
presets:
  - name: twice
    policy: whitelist
    chars: "0-9"
  - name: twice
    policy: blacklist
    chars: "a-z"
"#;
    let err = PresetFile::from_yaml(yaml).unwrap_err();
    assert!(format!("{err:#}").contains("Duplicate preset name"));
}

#[test]
fn merge_specs_prefers_user_entries() {
    let defaults = PresetFile::load_default_presets().unwrap().presets;
    let user = vec![PresetSpec::new("url", ScrubPolicy::Whitelist, "a-z:/.")];

    let merged = merge_specs(defaults, Some(user));
    assert_eq!(merged.len(), 4);
    let url = merged.iter().find(|s| s.name == "url").unwrap();
    assert_eq!(url.chars, "a-z:/.");
}

#[test]
fn overridden_registries_are_independent() -> Result<()> {
    let mut strict = PresetRegistry::with_builtins()?;
    strict.merge(vec![PresetSpec::new("number", ScrubPolicy::Whitelist, "0-9")])?;
    let lenient_specs = vec![PresetSpec::new("number", ScrubPolicy::Whitelist, "0-9.,")];
    let mut lenient = PresetRegistry::with_builtins()?;
    lenient.merge(lenient_specs)?;

    let strict = Scrubber::with_registry(strict);
    let lenient = Scrubber::with_registry(lenient);

    let selector = RuleSelector::preset("number");
    assert_eq!(strict.scrub("1,2.3", &selector).safe_value, "123");
    assert_eq!(lenient.scrub("1,2.3", &selector).safe_value, "1,2.3");
    Ok(())
}

#[test]
fn a_registry_without_text_still_scrubs_named_presets() -> Result<()> {
    let mut registry = PresetRegistry::empty();
    registry.merge(vec![PresetSpec::new("number", ScrubPolicy::Whitelist, "0-9")])?;
    let scrubber = Scrubber::with_registry(registry);

    let outcome = scrubber.scrub("a1b2", &RuleSelector::preset("number"));
    assert_eq!(outcome.safe_value, "12");

    // The degenerate default-missing case: identity, never a crash.
    let outcome = scrubber.scrub("a<b", &RuleSelector::Default);
    assert_eq!(outcome.safe_value, "a<b");
    assert_eq!(outcome.removed_count, 0);
    Ok(())
}
