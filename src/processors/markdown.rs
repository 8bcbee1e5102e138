//! # Markdown Processing Module
//!
//! Converts Markdown into HTML with `pulldown-cmark`. By the time a page body
//! reaches this processor it has already been through the configured
//! Markdown template engine, so template tags are gone and raw HTML is passed
//! through unchanged.

use pulldown_cmark::{html, Options as MarkdownOptions, Parser};

use crate::core::error::Result;
use crate::core::traits::ContentProcessor;

/// Processor for Markdown content.
#[derive(Debug, Clone)]
pub struct MarkdownProcessor {
    options: MarkdownOptions,
}

impl MarkdownProcessor {
    /// Creates a processor with tables, footnotes and strikethrough enabled.
    pub fn new() -> Self {
        Self {
            options: MarkdownOptions::ENABLE_TABLES
                | MarkdownOptions::ENABLE_FOOTNOTES
                | MarkdownOptions::ENABLE_STRIKETHROUGH,
        }
    }

    /// Enables table support in Markdown processing.
    pub fn with_tables(mut self, enable: bool) -> Self {
        self.options.set(MarkdownOptions::ENABLE_TABLES, enable);
        self
    }

    /// Enables strikethrough support in Markdown processing.
    pub fn with_strikethrough(mut self, enable: bool) -> Self {
        self.options.set(MarkdownOptions::ENABLE_STRIKETHROUGH, enable);
        self
    }

    /// Enables footnote support in Markdown processing.
    pub fn with_footnotes(mut self, enable: bool) -> Self {
        self.options.set(MarkdownOptions::ENABLE_FOOTNOTES, enable);
        self
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentProcessor for MarkdownProcessor {
    fn process(&self, content: &str) -> Result<String> {
        let parser = Parser::new_ext(content, self.options);
        let mut html_output = String::with_capacity(content.len() * 3 / 2);
        html::push_html(&mut html_output, parser);
        Ok(html_output)
    }
}
