//! errors.rs - Custom error types for the keyscrub library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//! Note that the scrub path itself is total and never returns these; they
//! surface only from configuration-time operations (parsing, compiling,
//! merging presets).
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// This enum represents all possible error types in the `keyscrub` library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions. This prevents them from
/// matching all variants exhaustively, thus avoiding breaking changes.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ScrubError {
    #[error("Invalid character class fragment '{fragment}': {kind}")]
    InvalidFragment {
        fragment: String,
        kind: FragmentErrorKind,
    },

    #[error("Failed to compile preset '{0}': {1}")]
    PresetCompilationError(String, regex::Error),

    #[error("Preset validation failed:\n{0}")]
    PresetValidation(String),

    #[error("Invalid preset mapping: expected an object of name -> preset spec, got {0}")]
    InvalidPresetMapping(String),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("A critical system error occurred: {0}")]
    AnyhowWrapper(#[from] anyhow::Error),
}

/// The specific way a character-class fragment failed to parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FragmentErrorKind {
    #[error("fragment is empty")]
    Empty,

    #[error("dangling escape at end of fragment")]
    DanglingEscape,

    #[error("unescaped ']' at position {0}")]
    UnescapedBracket(usize),

    #[error("reversed range '{0}-{1}'")]
    ReversedRange(char, char),
}
