//! # Error Handling for SiteForge
//!
//! This module defines the error type shared by the configuration layer and
//! the build engine. The `thiserror` crate is used to keep the variants and
//! their messages in one place.
//!
//! The configuration entry point (`siteforge::configure`) never returns an
//! error; everything below is produced while layering configuration or while
//! building a site.

use std::path::PathBuf;
use thiserror::Error;

/// A unified result type for the SiteForge library.
pub type Result<T> = std::result::Result<T, SiteForgeError>;

/// The main error type for SiteForge.
#[derive(Error, Debug)]
pub enum SiteForgeError {
    /// Error related to configuration loading or validation.
    ///
    /// Raised for unreadable or malformed config files, unknown override keys,
    /// unknown template formats and missing input directories.
    #[error("Configuration error: {message}.")]
    ConfigError {
        /// Detailed description of the configuration error.
        message: String,
        /// Optional path of the file or directory that caused the error.
        path: Option<PathBuf>,
    },

    /// Error encountered while reading a template's front matter.
    #[error("Content processing error: {message}.")]
    ContentProcessingError {
        /// Detailed description of the content processing error.
        message: String,
        /// Optional source error providing additional context, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error in output generation.
    ///
    /// Covers duplicate output paths, permalinks escaping the output
    /// directory and failed minification.
    #[error("Output generation error: {message} at {path:?}.")]
    OutputGenerationError {
        /// Description of the output generation error.
        message: String,
        /// Path associated with the error.
        path: PathBuf,
        /// Optional source error providing additional context, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error related to template rendering.
    #[error(
        "Template rendering error: {message} in template `{template}`."
    )]
    TemplateRenderingError {
        /// Description of the template rendering error.
        message: String,
        /// The template file or identifier associated with the error.
        template: String,
        /// Optional source error providing additional context, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// IO error encountered during file operations.
    #[error("File IO error at `{path:?}`: {source}")]
    IOError {
        /// Path associated with the IO error.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// General internal error.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl SiteForgeError {
    /// Creates a `ConfigError` with a specific message.
    ///
    /// # Parameters
    /// - `message`: A description of the configuration error.
    /// - `path`: Optional path of the file causing the error.
    pub fn config_error<S: Into<String>>(
        message: S,
        path: Option<PathBuf>,
    ) -> Self {
        SiteForgeError::ConfigError {
            message: message.into(),
            path,
        }
    }

    /// Creates a `ContentProcessingError` with a specific message and optional source.
    pub fn content_processing_error<S: Into<String>>(
        message: S,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        SiteForgeError::ContentProcessingError {
            message: message.into(),
            source,
        }
    }

    /// Creates an `OutputGenerationError` with a specific message, path, and optional source.
    pub fn output_generation_error<S: Into<String>>(
        message: S,
        path: PathBuf,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        SiteForgeError::OutputGenerationError {
            message: message.into(),
            path,
            source,
        }
    }

    /// Creates a `TemplateRenderingError` with a message, template name, and optional source.
    pub fn template_rendering_error<S: Into<String>>(
        message: S,
        template: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        SiteForgeError::TemplateRenderingError {
            message: message.into(),
            template,
            source,
        }
    }

    /// Wraps an IO error as an `IOError` variant with the specified path.
    pub fn io_error(path: PathBuf, source: std::io::Error) -> Self {
        SiteForgeError::IOError { path, source }
    }

    /// Creates a general internal error with a custom message.
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        SiteForgeError::InternalError(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = SiteForgeError::config_error(
            "Unknown template format 'liquid'",
            None,
        );
        assert_eq!(
            err.to_string(),
            "Configuration error: Unknown template format 'liquid'."
        );
    }

    #[test]
    fn test_io_error_keeps_path() {
        let source = std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        );
        let err =
            SiteForgeError::io_error(PathBuf::from("src/index.njk"), source);
        match err {
            SiteForgeError::IOError { path, .. } => {
                assert_eq!(path, PathBuf::from("src/index.njk"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_template_error_names_template() {
        let err = SiteForgeError::template_rendering_error(
            "Layout cycle detected",
            "base.njk".to_string(),
            None,
        );
        assert!(err.to_string().contains("`base.njk`"));
    }
}
