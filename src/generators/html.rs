//! # HTML Output Generation
//!
//! Writes rendered pages below the output directory. Pages are validated to
//! stay inside that directory, and `.html` files can be minified with the
//! `minify-html` crate.
//!
//! ```rust,no_run
//! use siteforge::generators::HtmlGenerator;
//! use siteforge::OutputGenerator;
//! use std::path::Path;
//!
//! let generator = HtmlGenerator::new("_site").with_minification(true);
//! generator
//!     .generate("<p>Hello   World</p>", Path::new("_site/index.html"))
//!     .unwrap();
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::trace;
use minify_html::{minify, Cfg};

use crate::core::error::{Result, SiteForgeError};
use crate::core::traits::OutputGenerator;

/// Writes pages into an output directory.
#[derive(Debug, Clone)]
pub struct HtmlGenerator {
    output_dir: PathBuf,
    minify: bool,
}

impl HtmlGenerator {
    /// Creates a generator rooted at `output_dir`.
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            minify: false,
        }
    }

    /// Enables or disables minification of `.html` output.
    pub fn with_minification(mut self, enable: bool) -> Self {
        self.minify = enable;
        self
    }

    /// The directory pages are written into.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn minify_html(&self, content: &str, path: &Path) -> Result<String> {
        let cfg = Cfg {
            minify_css: true,
            minify_js: true,
            ..Cfg::default()
        };
        String::from_utf8(minify(content.as_bytes(), &cfg)).map_err(|e| {
            SiteForgeError::output_generation_error(
                "HTML minification failed",
                path.to_path_buf(),
                Some(Box::new(e)),
            )
        })
    }
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map_or(false, |extension| extension.eq_ignore_ascii_case("html"))
}

impl OutputGenerator for HtmlGenerator {
    fn generate(&self, content: &str, path: &Path) -> Result<()> {
        self.validate(path)?;

        let output = if self.minify && is_html(path) {
            self.minify_html(content, path)?
        } else {
            content.to_string()
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SiteForgeError::io_error(parent.to_path_buf(), e)
            })?;
        }
        let file = File::create(path)
            .map_err(|e| SiteForgeError::io_error(path.to_path_buf(), e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(output.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| SiteForgeError::io_error(path.to_path_buf(), e))?;

        trace!("Wrote {} bytes to {}", output.len(), path.display());
        Ok(())
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if !path.starts_with(&self.output_dir) || path == self.output_dir {
            return Err(SiteForgeError::output_generation_error(
                "Output path is outside the output directory",
                path.to_path_buf(),
                None,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let generator = HtmlGenerator::new(temp_dir.path());
        let path = temp_dir.path().join("blog/post/index.html");

        generator.generate("<p>post</p>", &path).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "<p>post</p>");
    }

    #[test]
    fn test_minification_applies_to_html_only() {
        let temp_dir = TempDir::new().unwrap();
        let generator =
            HtmlGenerator::new(temp_dir.path()).with_minification(true);

        let page = temp_dir.path().join("index.html");
        let source = "<html>\n  <body>\n    <p>Hello</p>\n  </body>\n</html>\n";
        generator.generate(source, &page).unwrap();
        let minified = fs::read_to_string(&page).unwrap();
        assert!(minified.len() < source.len());
        assert!(minified.contains("<p>Hello"));

        let feed = temp_dir.path().join("feed.xml");
        generator.generate("<feed>\n  <id/>\n</feed>\n", &feed).unwrap();
        assert_eq!(
            fs::read_to_string(feed).unwrap(),
            "<feed>\n  <id/>\n</feed>\n"
        );
    }

    #[test]
    fn test_validate_rejects_paths_outside_output() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("_site");
        let generator = HtmlGenerator::new(&output);

        assert!(generator.validate(&output.join("index.html")).is_ok());
        assert!(generator
            .validate(&temp_dir.path().join("index.html"))
            .is_err());
        assert!(generator.validate(&output).is_err());
    }
}
