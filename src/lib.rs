// Copyright © 2024 SiteForge. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # SiteForge Library
//!
//! SiteForge declares the build configuration of a static site (where
//! templates are read from, where output goes, which template formats are
//! rendered) and ships the small engine that consumes it.
//!
//! The entry point is [`configure`]: given an [`EngineHandle`] it registers
//! the `assets` passthrough copy and returns the declared [`BuildConfig`].
//! [`SiteForge`] takes that record and builds the site.

#![doc = include_str!("../README.md")]
#![crate_name = "siteforge"]
#![crate_type = "lib"]

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info};
use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::content::Document;
use crate::core::config::ASSETS_DIR;
use crate::generators::{HtmlGenerator, OutputTarget, Permalink};
use crate::process::{
    collect_sources, copy_file, read_content, OutputClaims, PageProcessor,
};
use crate::template::TemplateFormat;

/// Configuration record, error types and engine seams.
pub mod core {
    /// The build configuration and its layering.
    pub mod config;
    /// Error types for every build stage.
    pub mod error;
    /// Traits the engine is assembled from.
    pub mod traits;
}

/// Command-line interface.
pub mod cli;

/// Front matter parsing.
pub mod content;

/// Output paths and output writing.
pub mod generators;

/// Passthrough-copy rules and the copying itself.
pub mod passthrough;

/// Source discovery and page rendering.
pub mod process;

/// Content processors.
pub mod processors;

/// Template formats and engines.
pub mod template;

pub use crate::core::config::{BuildConfig, ConfigBuilder, DirConfig};
pub use crate::core::error::{Result, SiteForgeError};
pub use crate::core::traits::{
    ContentProcessor, EngineHandle, OutputGenerator, TemplateRenderer,
};
pub use crate::passthrough::{PassthroughRegistry, PassthroughRule};

/// Declares the site's build configuration.
///
/// Registers a passthrough copy of the `assets` directory on `engine` and
/// returns the declared record. This never fails and has no other side
/// effect, so every call yields the same record.
///
/// ```
/// use siteforge::{configure, PassthroughRegistry};
///
/// let mut registry = PassthroughRegistry::new();
/// let config = configure(&mut registry);
///
/// assert!(config.passthrough_file_copy);
/// assert_eq!(config.dir.input, std::path::Path::new("src"));
/// assert_eq!(registry.rules()[0].source, std::path::Path::new("assets"));
/// ```
pub fn configure<E: EngineHandle + ?Sized>(engine: &mut E) -> BuildConfig {
    engine.add_passthrough_copy(PassthroughRule::new(ASSETS_DIR));
    BuildConfig::declared()
}

/// Summary of a finished build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Pages rendered and written.
    pub pages: usize,
    /// Files copied verbatim, from the input tree and from passthrough rules.
    pub copied: usize,
    /// Passthrough sources that did not exist.
    pub skipped_passthrough: Vec<PathBuf>,
    /// Wall-clock time of the build.
    pub duration: Duration,
}

/// The build engine: renders the input tree into the output tree.
#[derive(Debug)]
pub struct SiteForge {
    root: PathBuf,
    config: BuildConfig,
    passthrough: PassthroughRegistry,
    minify: bool,
}

impl SiteForge {
    /// Creates an engine for the project at `root` using the declared
    /// configuration.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let mut passthrough = PassthroughRegistry::new();
        let config = configure(&mut passthrough);
        Self::with_config(root, config, passthrough)
    }

    /// Creates an engine from an already resolved configuration.
    pub fn with_config<P: AsRef<Path>>(
        root: P,
        config: BuildConfig,
        passthrough: PassthroughRegistry,
    ) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config,
            passthrough,
            minify: false,
        }
    }

    /// Enables minification of HTML output.
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    /// The project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The configuration in use.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// The registered passthrough rules.
    pub fn passthrough(&self) -> &PassthroughRegistry {
        &self.passthrough
    }

    /// Absolute (root-joined) input directory.
    pub fn input_dir(&self) -> PathBuf {
        self.root.join(&self.config.dir.input)
    }

    /// Absolute (root-joined) output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.config.dir.output)
    }

    /// Absolute (root-joined) includes directory.
    pub fn includes_dir(&self) -> PathBuf {
        self.root.join(self.config.dir.includes_path())
    }

    /// Builds the site.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration, a missing input directory, front
    /// matter or template errors, two sources writing the same output
    /// path, and filesystem failures.
    pub fn build(&self) -> Result<BuildReport> {
        let started = Instant::now();
        self.config.validate()?;

        let formats = TemplateFormat::parse_list(
            self.config.template_formats.as_deref(),
        )?;
        let markdown_engine = TemplateFormat::parse_engine(
            self.config.markdown_template_engine.as_deref(),
            "markdownTemplateEngine",
        )?;
        let html_engine = TemplateFormat::parse_engine(
            self.config.html_template_engine.as_deref(),
            "htmlTemplateEngine",
        )?;

        let input = self.input_dir();
        let output = self.output_dir();
        let includes = self.includes_dir();
        if !input.is_dir() {
            return Err(SiteForgeError::config_error(
                "Input directory does not exist",
                Some(input),
            ));
        }

        info!(
            "Building {} into {}",
            input.display(),
            output.display()
        );

        let processor =
            PageProcessor::new(&includes, markdown_engine, html_engine)?;
        let generator =
            HtmlGenerator::new(&output).with_minification(self.minify);
        let mut claims = OutputClaims::new();
        let mut report = BuildReport::default();

        for source in collect_sources(&input, &[includes, output.clone()])? {
            let relative = source
                .strip_prefix(&input)
                .map_err(|e| {
                    SiteForgeError::internal_error(format!(
                        "Failed to determine relative path: {}",
                        e
                    ))
                })?
                .to_path_buf();

            match TemplateFormat::from_path(&source)
                .filter(|format| formats.contains(format))
            {
                Some(format) => {
                    if self.render_source(
                        &processor,
                        &generator,
                        &source,
                        &relative,
                        format,
                        &mut claims,
                    )? {
                        report.pages += 1;
                    }
                }
                None if self.config.passthrough_file_copy => {
                    let target = output.join(&relative);
                    claims.claim(&target, &source)?;
                    copy_file(&source, &target)?;
                    debug!("Copied {}", relative.display());
                    report.copied += 1;
                }
                None => debug!("Ignoring {}", relative.display()),
            }
        }

        if self.config.passthrough_file_copy {
            let outcome = passthrough::copy_passthrough(
                &self.root,
                &output,
                self.passthrough.rules(),
                &mut claims,
            )?;
            report.copied += outcome.files;
            report.skipped_passthrough = outcome.skipped;
        }

        report.duration = started.elapsed();
        info!(
            "Wrote {} page(s) and copied {} file(s) in {:.2?}",
            report.pages, report.copied, report.duration
        );
        Ok(report)
    }

    /// Renders one template. Returns `false` when its permalink disables
    /// output.
    fn render_source(
        &self,
        processor: &PageProcessor,
        generator: &HtmlGenerator,
        source: &Path,
        relative: &Path,
        format: TemplateFormat,
        claims: &mut OutputClaims,
    ) -> Result<bool> {
        let name = relative.display().to_string();
        let document = Document::parse(&read_content(source)?)?;
        let permalink = Permalink::from_data(&document.data)?;
        let Some(target) = OutputTarget::resolve(relative, &permalink)? else {
            debug!("Skipping {}: permalink disabled", name);
            return Ok(false);
        };

        let path = generator.output_dir().join(&target.path);
        claims.claim(&path, source)?;

        let context = self.page_context(&document, relative, &target);
        let html = processor.render_page(&name, format, &document, context)?;
        generator.generate(&html, &path)?;
        debug!("Rendered {} -> {}", name, target.url);
        Ok(true)
    }

    fn page_context(
        &self,
        document: &Document,
        relative: &Path,
        target: &OutputTarget,
    ) -> JsonMap<String, JsonValue> {
        let input_path = self.config.dir.input.join(relative);
        let output_path = self.config.dir.output.join(&target.path);

        let mut context = document.data.clone();
        let page = json!({
            "url": target.url,
            "inputPath": input_path.display().to_string(),
            "outputPath": output_path.display().to_string(),
            "fileSlug": file_slug(relative),
        });
        _ = context.insert("page".to_string(), page);
        context
    }
}

/// The file stem, or the parent directory's name for `index` files.
fn file_slug(relative: &Path) -> String {
    let stem = relative
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem != "index" {
        return stem;
    }
    relative
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
