// Copyright © 2024 SiteForge. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Page Processing
//!
//! File helpers used across the build, source discovery, and the
//! [`PageProcessor`] that turns one template file into its final HTML:
//! body rendering through the configured engine, then the layout chain.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use serde_json::{Map as JsonMap, Value as JsonValue};
use walkdir::{DirEntry, WalkDir};

use crate::content::Document;
use crate::core::error::{Result, SiteForgeError};
use crate::core::traits::ContentProcessor;
use crate::processors::MarkdownProcessor;
use crate::template::{TemplateEngines, TemplateFormat};

/// Extensions tried, in order, for a layout named without one.
const LAYOUT_FORMATS: [TemplateFormat; 3] = [
    TemplateFormat::Njk,
    TemplateFormat::Hbs,
    TemplateFormat::Html,
];

/// Reads a UTF-8 file, attaching the path to any error.
pub fn read_content(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| SiteForgeError::io_error(path.to_path_buf(), e))
}

/// Copies `from` to `to`, creating parent directories of `to`.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| SiteForgeError::io_error(parent.to_path_buf(), e))?;
    }
    _ = fs::copy(from, to)
        .map_err(|e| SiteForgeError::io_error(from.to_path_buf(), e))?;
    Ok(())
}

/// Lexically normalises `path` by dropping `.` components, so that `src`,
/// `./src` and `src/` compare equal.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

/// Output files claimed so far in a build, each with the source that
/// writes it.
#[derive(Debug, Default)]
pub struct OutputClaims {
    written: HashMap<PathBuf, PathBuf>,
}

impl OutputClaims {
    /// Creates an empty set of claims.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `source` writes `target`.
    ///
    /// Fails with an output error when another source already claimed the
    /// same file.
    pub fn claim(&mut self, target: &Path, source: &Path) -> Result<()> {
        if let Some(previous) = self
            .written
            .insert(normalize_path(target), source.to_path_buf())
        {
            return Err(SiteForgeError::output_generation_error(
                format!(
                    "Output conflict: {} and {} both write this file",
                    previous.display(),
                    source.display()
                ),
                target.to_path_buf(),
                None,
            ));
        }
        Ok(())
    }
}

/// Converts a directory walk failure into a [`SiteForgeError::IOError`].
pub fn walk_error(error: walkdir::Error) -> SiteForgeError {
    let path = error.path().map(Path::to_path_buf).unwrap_or_default();
    SiteForgeError::io_error(path, error.into())
}

/// Lists every file below `input` in file-name order.
///
/// Hidden entries and everything below a path in `excluded` are skipped.
pub fn collect_sources(
    input: &Path,
    excluded: &[PathBuf],
) -> Result<Vec<PathBuf>> {
    let keep = |entry: &DirEntry| {
        entry.depth() == 0
            || !(is_hidden(entry)
                || excluded.iter().any(|path| entry.path() == path))
    };

    let mut sources = Vec::new();
    for entry in WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(keep)
    {
        let entry = entry.map_err(walk_error)?;
        if entry.file_type().is_file() {
            sources.push(entry.into_path());
        }
    }
    Ok(sources)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map_or(false, |name| name.starts_with('.'))
}

/// Renders template files: body first, then any layouts.
#[derive(Debug)]
pub struct PageProcessor {
    engines: TemplateEngines,
    markdown: MarkdownProcessor,
    markdown_engine: Option<TemplateFormat>,
    html_engine: Option<TemplateFormat>,
    includes_dir: PathBuf,
    layouts: RwLock<HashMap<PathBuf, Arc<Document>>>,
}

impl PageProcessor {
    /// Creates a processor whose engines and layouts live in `includes_dir`.
    pub fn new(
        includes_dir: &Path,
        markdown_engine: Option<TemplateFormat>,
        html_engine: Option<TemplateFormat>,
    ) -> Result<Self> {
        Ok(Self {
            engines: TemplateEngines::new(includes_dir)?,
            markdown: MarkdownProcessor::new(),
            markdown_engine,
            html_engine,
            includes_dir: includes_dir.to_path_buf(),
            layouts: RwLock::new(HashMap::new()),
        })
    }

    /// Renders `document` as a page of the given format.
    ///
    /// `context` holds the page's data; the rendered body is exposed to
    /// layouts as `content`.
    pub fn render_page(
        &self,
        name: &str,
        format: TemplateFormat,
        document: &Document,
        context: JsonMap<String, JsonValue>,
    ) -> Result<String> {
        let body = self.render_body(
            name,
            format,
            self.html_engine,
            &document.body,
            &JsonValue::Object(context.clone()),
        )?;
        let layout = document.layout()?.map(String::from);
        self.apply_layouts(layout, context, body)
    }

    fn render_body(
        &self,
        name: &str,
        format: TemplateFormat,
        html_engine: Option<TemplateFormat>,
        source: &str,
        context: &JsonValue,
    ) -> Result<String> {
        match format {
            TemplateFormat::Njk | TemplateFormat::Hbs => {
                self.render_with(format, name, source, context)
            }
            TemplateFormat::Md => {
                let expanded = match self.markdown_engine {
                    Some(engine) => {
                        self.render_with(engine, name, source, context)?
                    }
                    None => source.to_string(),
                };
                self.markdown.process(&expanded)
            }
            TemplateFormat::Html => match html_engine {
                Some(engine) => self.render_with(engine, name, source, context),
                None => Ok(source.to_string()),
            },
        }
    }

    fn render_with(
        &self,
        engine: TemplateFormat,
        name: &str,
        source: &str,
        context: &JsonValue,
    ) -> Result<String> {
        let renderer = self.engines.renderer(engine).ok_or_else(|| {
            SiteForgeError::internal_error(format!(
                "'{}' is not a template engine",
                engine
            ))
        })?;
        renderer.render(name, source, context)
    }

    fn apply_layouts(
        &self,
        mut layout: Option<String>,
        mut context: JsonMap<String, JsonValue>,
        mut content: String,
    ) -> Result<String> {
        let mut seen = HashSet::new();

        while let Some(layout_name) = layout {
            let (path, format) = self.resolve_layout(&layout_name)?;
            let display = path.display().to_string();
            if !seen.insert(path.clone()) {
                return Err(SiteForgeError::template_rendering_error(
                    format!("Layout cycle detected at '{}'", layout_name),
                    display,
                    None,
                ));
            }

            let document = self.load_layout(&path)?;
            for (key, value) in &document.data {
                if key != "layout" && !context.contains_key(key) {
                    _ = context.insert(key.clone(), value.clone());
                }
            }

            _ = context.insert("content".to_string(), JsonValue::String(content));
            debug!("Applying layout {}", display);
            // .html layouts fall back to njk when no HTML engine is set.
            content = self.render_body(
                &display,
                format,
                Some(self.html_engine.unwrap_or(TemplateFormat::Njk)),
                &document.body,
                &JsonValue::Object(context.clone()),
            )?;
            _ = context.remove("content");

            layout = document.layout()?.map(String::from);
        }

        Ok(content)
    }

    fn resolve_layout(&self, name: &str) -> Result<(PathBuf, TemplateFormat)> {
        let direct = self.includes_dir.join(name);
        if let Some(format) = TemplateFormat::from_path(&direct) {
            if direct.is_file() {
                return Ok((direct, format));
            }
        }

        for format in LAYOUT_FORMATS {
            let candidate = self
                .includes_dir
                .join(format!("{}.{}", name, format.extension()));
            if candidate.is_file() {
                return Ok((candidate, format));
            }
        }

        Err(SiteForgeError::template_rendering_error(
            format!(
                "Layout '{}' not found in {}",
                name,
                self.includes_dir.display()
            ),
            name.to_string(),
            None,
        ))
    }

    fn load_layout(&self, path: &Path) -> Result<Arc<Document>> {
        if let Some(document) = self.layouts.read().get(path) {
            return Ok(Arc::clone(document));
        }

        let document = Arc::new(Document::parse(&read_content(path)?)?);
        _ = self
            .layouts
            .write()
            .insert(path.to_path_buf(), Arc::clone(&document));
        Ok(document)
    }
}
