//! # Template Rendering Module
//!
//! Template formats known to the engine and the renderers behind them:
//!
//! - `njk` renders with `minijinja`, a Jinja2/Nunjucks-compatible engine,
//!   whose loader is rooted at the includes directory so that
//!   `{% include %}` and `{% extends %}` resolve there
//! - `hbs` renders with Handlebars; every `*.hbs` file in the includes
//!   directory is registered as a partial under its file stem
//! - `md` and `html` have no engine of their own and are pre-processed by
//!   whichever engine the configuration names

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use handlebars::Handlebars;
use log::debug;
use minijinja::{path_loader, AutoEscape, Environment};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::core::error::{Result, SiteForgeError};
use crate::core::traits::TemplateRenderer;

/// A file extension the engine renders rather than copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
    /// HTML, optionally pre-processed by `htmlTemplateEngine`.
    Html,
    /// Nunjucks-style templates.
    Njk,
    /// Markdown, optionally pre-processed by `markdownTemplateEngine`.
    Md,
    /// Handlebars templates.
    Hbs,
}

impl TemplateFormat {
    /// Every known format.
    pub const ALL: [TemplateFormat; 4] = [
        TemplateFormat::Html,
        TemplateFormat::Njk,
        TemplateFormat::Md,
        TemplateFormat::Hbs,
    ];

    /// The file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            TemplateFormat::Html => "html",
            TemplateFormat::Njk => "njk",
            TemplateFormat::Md => "md",
            TemplateFormat::Hbs => "hbs",
        }
    }

    /// Looks up a format by extension, ignoring ASCII case.
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(extension))
    }

    /// The format of `path`, judged by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether this format can pre-process other formats.
    pub fn is_engine(self) -> bool {
        matches!(self, TemplateFormat::Njk | TemplateFormat::Hbs)
    }

    /// Resolves the configured format list. `None` enables every format;
    /// duplicates are dropped and unknown names are an error.
    pub fn parse_list(formats: Option<&[String]>) -> Result<Vec<Self>> {
        let Some(formats) = formats else {
            return Ok(Self::ALL.to_vec());
        };

        let mut resolved = Vec::with_capacity(formats.len());
        for name in formats {
            let format: TemplateFormat = name.parse()?;
            if !resolved.contains(&format) {
                resolved.push(format);
            }
        }
        Ok(resolved)
    }

    /// Resolves an engine name such as `markdownTemplateEngine`.
    ///
    /// Only formats that render template tags (`njk`, `hbs`) are engines.
    pub fn parse_engine(
        name: Option<&str>,
        setting: &str,
    ) -> Result<Option<Self>> {
        let Some(name) = name else {
            return Ok(None);
        };

        let format: TemplateFormat = name.parse()?;
        if !format.is_engine() {
            return Err(SiteForgeError::config_error(
                format!(
                    "{} must name a template engine (njk or hbs), got '{}'",
                    setting, name
                ),
                None,
            ));
        }
        Ok(Some(format))
    }
}

impl FromStr for TemplateFormat {
    type Err = SiteForgeError;

    fn from_str(name: &str) -> Result<Self> {
        Self::from_extension(name.trim().trim_start_matches('.')).ok_or_else(
            || {
                SiteForgeError::config_error(
                    format!("Unknown template format '{}'", name),
                    None,
                )
            },
        )
    }
}

impl fmt::Display for TemplateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Renderer for `njk` templates.
pub struct NunjucksRenderer {
    env: Environment<'static>,
}

impl fmt::Debug for NunjucksRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NunjucksRenderer").finish_non_exhaustive()
    }
}

impl NunjucksRenderer {
    /// Creates a renderer that loads included templates from `includes_dir`.
    ///
    /// Output is HTML-escaped by default; use `| safe` for trusted markup
    /// such as a layout's `content`.
    pub fn new(includes_dir: &Path) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(includes_dir));
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        Self { env }
    }
}

impl TemplateRenderer for NunjucksRenderer {
    fn render(
        &self,
        name: &str,
        source: &str,
        context: &JsonValue,
    ) -> Result<String> {
        self.env.render_str(source, context).map_err(|e| {
            SiteForgeError::template_rendering_error(
                format!("Template rendering failed: {}", e),
                name.to_string(),
                Some(Box::new(e)),
            )
        })
    }
}

/// Renderer for `hbs` templates.
pub struct HandlebarsRenderer {
    engine: Handlebars<'static>,
}

impl fmt::Debug for HandlebarsRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlebarsRenderer").finish_non_exhaustive()
    }
}

impl HandlebarsRenderer {
    /// Creates a renderer with every `*.hbs` file in `includes_dir`
    /// registered as a partial. A missing includes directory registers none.
    pub fn new(includes_dir: &Path) -> Result<Self> {
        let mut engine = Handlebars::new();
        engine.register_escape_fn(handlebars::html_escape);

        if includes_dir.is_dir() {
            let mut partials = fs::read_dir(includes_dir)
                .map_err(|e| {
                    SiteForgeError::io_error(includes_dir.to_path_buf(), e)
                })?
                .collect::<std::io::Result<Vec<_>>>()
                .map_err(|e| {
                    SiteForgeError::io_error(includes_dir.to_path_buf(), e)
                })?;
            partials.sort_by_key(|entry| entry.file_name());

            for entry in partials {
                let path = entry.path();
                if !path.is_file()
                    || TemplateFormat::from_path(&path)
                        != Some(TemplateFormat::Hbs)
                {
                    continue;
                }

                let name = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .ok_or_else(|| {
                        SiteForgeError::template_rendering_error(
                            "Invalid partial filename",
                            path.display().to_string(),
                            None,
                        )
                    })?;
                let source = fs::read_to_string(&path)
                    .map_err(|e| SiteForgeError::io_error(path.clone(), e))?;

                engine.register_partial(name, source).map_err(|e| {
                    SiteForgeError::template_rendering_error(
                        format!("Failed to register partial '{}': {}", name, e),
                        path.display().to_string(),
                        Some(Box::new(e)),
                    )
                })?;
                debug!("Registered Handlebars partial '{}'", name);
            }
        }

        Ok(Self { engine })
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(
        &self,
        name: &str,
        source: &str,
        context: &JsonValue,
    ) -> Result<String> {
        self.engine.render_template(source, context).map_err(|e| {
            SiteForgeError::template_rendering_error(
                format!("Template rendering failed: {}", e),
                name.to_string(),
                Some(Box::new(e)),
            )
        })
    }
}

/// The set of template engines available to a build.
#[derive(Debug)]
pub struct TemplateEngines {
    nunjucks: NunjucksRenderer,
    handlebars: HandlebarsRenderer,
}

impl TemplateEngines {
    /// Creates every engine against `includes_dir`.
    pub fn new(includes_dir: &Path) -> Result<Self> {
        Ok(Self {
            nunjucks: NunjucksRenderer::new(includes_dir),
            handlebars: HandlebarsRenderer::new(includes_dir)?,
        })
    }

    /// The renderer for an engine format, or `None` for `md` and `html`.
    pub fn renderer(
        &self,
        format: TemplateFormat,
    ) -> Option<&dyn TemplateRenderer> {
        match format {
            TemplateFormat::Njk => Some(&self.nunjucks),
            TemplateFormat::Hbs => Some(&self.handlebars),
            TemplateFormat::Html | TemplateFormat::Md => None,
        }
    }
}
