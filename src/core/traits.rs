//! # Core Traits Module
//!
//! The seams of the build engine:
//!
//! - [`EngineHandle`]: receives passthrough-copy registrations from the
//!   configuration entry point
//! - [`ContentProcessor`]: turns one content format into HTML
//! - [`TemplateRenderer`]: renders template source against a JSON context
//! - [`OutputGenerator`]: writes rendered pages into the output tree

use std::path::Path;

use serde_json::Value as JsonValue;

use crate::core::error::Result;
use crate::passthrough::PassthroughRule;

/// Mutable handle through which a configuration registers engine rules.
///
/// [`crate::configure`] takes one of these and registers the `assets`
/// passthrough copy on it.
pub trait EngineHandle: std::fmt::Debug {
    /// Requests that `rule.source` be copied verbatim to `rule.target`
    /// inside the output directory.
    fn add_passthrough_copy(&mut self, rule: PassthroughRule);
}

/// Trait for content processing implementations.
pub trait ContentProcessor: Send + Sync + std::fmt::Debug {
    /// Converts `content` into HTML.
    fn process(&self, content: &str) -> Result<String>;
}

/// Trait for template rendering implementations.
pub trait TemplateRenderer: Send + Sync + std::fmt::Debug {
    /// Renders template `source` with `context`.
    ///
    /// # Arguments
    /// * `name` - Identifier used in error messages, usually the source path.
    /// * `source` - The template text.
    /// * `context` - The data available to the template.
    fn render(
        &self,
        name: &str,
        source: &str,
        context: &JsonValue,
    ) -> Result<String>;
}

/// Trait for output generation implementations.
pub trait OutputGenerator: Send + Sync + std::fmt::Debug {
    /// Writes `content` to `path`, creating parent directories as needed.
    fn generate(&self, content: &str, path: &Path) -> Result<()>;

    /// Checks that `path` is a valid destination without writing anything.
    fn validate(&self, path: &Path) -> Result<()>;
}
