//! Configuration module for script inlining
//!
//! This module provides the `InlineScriptsConfig` struct and its type-safe builder
//! for configuring script inlining with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod minify;
pub mod types;

// Re-exports for public API
pub use builder::{InlineScriptsConfigBuilder, WithRoot};
pub use minify::{BoxError, Minify, MinifyFn, MinifyFuture};
pub use types::InlineScriptsConfig;
