//! # Content Processors Module
//!
//! Processors that convert a content format into HTML. Each implements
//! [`crate::ContentProcessor`].
//!
//! ## Available Processors
//!
//! - [`markdown`]: CommonMark with tables, footnotes and strikethrough
//!
//! ## Usage
//!
//! ```rust
//! use siteforge::processors::MarkdownProcessor;
//! use siteforge::ContentProcessor;
//!
//! let processor = MarkdownProcessor::new();
//! let html = processor.process("# Hello World").unwrap();
//! assert!(html.contains("<h1>Hello World</h1>"));
//! ```

/// Markdown processing functionality.
pub mod markdown;

pub use markdown::MarkdownProcessor;
