// keyscrub/src/lib.rs
//! # keyscrub
//!
//! `keyscrub` provides character-level sanitization for form inputs. It is a
//! small, synchronous, single-pass filter: on every keystroke the caller
//! hands over the raw string plus a rule selector, and gets back the cleaned
//! string together with the number of characters removed, so it can
//! reposition an input caret that would otherwise jump to the end after a
//! controlled re-render.
//!
//! The library is pure and stateless at the call level: each scrub call is a
//! fresh, independent match over the whole string. The only long-lived state
//! is the preset registry, an explicit value owned by the embedding
//! application.
//!
//! ## Modules
//!
//! * `config`: Defines `PresetSpec`s and `PresetFile` for specifying rule sets.
//! * `charclass`: The typed character-class model and legacy fragment parser.
//! * `sanitizers`: Compiles validated presets into ready-to-apply rules.
//! * `presets`: The `PresetRegistry`: lookup and merge of named rules.
//! * `engine`: The `Scrubber` and the per-keystroke `scrub` operation.
//! * `errors`: The crate's typed error enum.
//!
//! ## Public API
//!
//! **Configuration & Presets**
//!
//! * [`PresetSpec`]: One named rule: a policy plus a character set.
//! * [`PresetFile`]: Loads preset definitions from YAML text or files.
//! * [`PresetRegistry`]: Holds compiled presets; supports lookup and
//!   all-or-nothing merge.
//! * [`merge_specs`]: Merges default and user-defined preset lists.
//!
//! **Scrubbing**
//!
//! * [`Scrubber`]: The engine; owns a registry and applies resolved rules.
//! * [`RuleSelector`]: Which rule to apply: the default preset, a named
//!   preset, or an ad-hoc allow fragment.
//! * [`ScrubOutcome`]: Cleaned value, removed-character count, optional
//!   non-fatal warning.
//! * [`scrub_once`]: One-shot convenience over the built-in presets.
//!
//! ## Usage Example
//!
//! ```rust
//! use keyscrub::{RuleSelector, Scrubber};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let scrubber = Scrubber::new()?;
//!
//!     // Default preset: strips the markup-injection blacklist.
//!     let outcome = scrubber.scrub("Hello <world>!", &RuleSelector::Default);
//!     assert_eq!(outcome.safe_value, "Hello world!");
//!     assert_eq!(outcome.removed_count, 2);
//!
//!     // Named preset.
//!     let outcome = scrubber.scrub("+49 170 555", &RuleSelector::preset("number"));
//!     assert_eq!(outcome.safe_value, "49170555");
//!
//!     // Ad-hoc whitelist from a legacy class fragment.
//!     let outcome = scrubber.scrub("ab-123", &RuleSelector::allow("0-9./"));
//!     assert_eq!(outcome.safe_value, "123");
//!     assert_eq!(outcome.removed_count, 3);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! The scrub path is total: it never returns an error and never panics.
//! Malformed selectors degrade to the default preset (or to the identity
//! rule) and the diagnostic rides along on [`ScrubOutcome::warning`] as well
//! as the `log` facade. Configuration-time operations (loading, merging,
//! compiling presets) return [`ScrubError`].
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod charclass;
pub mod config;
pub mod engine;
pub mod errors;
pub mod presets;
pub mod sanitizers;

/// Re-exports the public configuration types and functions for managing presets.
pub use config::{
    merge_specs, validate_specs, PresetFile, PresetSpec, ScrubPolicy, DEFAULT_PRESET,
    MAX_FRAGMENT_LENGTH,
};

/// Re-exports the typed character-class model.
pub use charclass::CharClass;

/// Re-exports the custom error types for clear error reporting.
pub use errors::{FragmentErrorKind, ScrubError};

/// Re-exports the preset registry.
pub use presets::PresetRegistry;

/// Re-exports the scrub engine and its call-scoped types.
pub use engine::{scrub_once, RuleSelector, ScrubOutcome, ScrubWarning, Scrubber};

/// Re-exports the compiled-rule types for advanced usage.
pub use sanitizers::compiler::{compile_spec, CompiledPreset};
