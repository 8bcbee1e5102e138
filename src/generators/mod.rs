//! Output generation: where a page is written and how it is written.

/// Writes rendered pages, with optional minification.
pub mod html;

/// Maps input templates to output paths and URLs.
pub mod permalink;

pub use html::HtmlGenerator;
pub use permalink::{OutputTarget, Permalink};
