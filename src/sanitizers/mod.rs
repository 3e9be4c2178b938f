// keyscrub/src/sanitizers/mod.rs
//! This module contains the logic for compiling preset specs into
//! ready-to-apply scrub rules.
//!
//! License: MIT OR APACHE 2.0

pub mod compiler;
