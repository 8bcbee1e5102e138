//! # Permalinks
//!
//! Every rendered template gets an output path and a URL. Without a
//! `permalink` in its front matter a template gets a directory-style URL:
//!
//! | input              | output                   | URL          |
//! |--------------------|--------------------------|--------------|
//! | `index.njk`        | `index.html`             | `/`          |
//! | `about.md`         | `about/index.html`       | `/about/`    |
//! | `blog/index.md`    | `blog/index.html`        | `/blog/`     |
//! | `blog/first.md`    | `blog/first/index.html`  | `/blog/first/` |
//!
//! `permalink: "/feed.xml"` writes exactly that file, a permalink ending in
//! `/` gets an `index.html`, and `permalink: false` writes nothing.

use std::path::{Component, Path, PathBuf};

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::core::error::{Result, SiteForgeError};

/// The `permalink` setting of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permalink {
    /// Directory-style URL derived from the input path.
    Default,
    /// No output is written.
    Disabled,
    /// Explicit path relative to the output directory.
    Path(String),
}

impl Permalink {
    /// Reads the `permalink` key of front matter data.
    pub fn from_data(data: &JsonMap<String, JsonValue>) -> Result<Self> {
        match data.get("permalink") {
            None | Some(JsonValue::Null) => Ok(Permalink::Default),
            Some(JsonValue::Bool(false)) => Ok(Permalink::Disabled),
            Some(JsonValue::String(path)) => Ok(Permalink::Path(path.clone())),
            Some(other) => Err(SiteForgeError::content_processing_error(
                format!("Invalid permalink value: {}", other),
                None,
            )),
        }
    }
}

/// Where a page ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// Site-absolute URL, always starting with `/`.
    pub url: String,
    /// Output file path relative to the output directory.
    pub path: PathBuf,
}

impl OutputTarget {
    /// Resolves the target of the template at `relative_input` (relative to
    /// the input directory). Returns `None` for `permalink: false`.
    pub fn resolve(
        relative_input: &Path,
        permalink: &Permalink,
    ) -> Result<Option<Self>> {
        match permalink {
            Permalink::Disabled => Ok(None),
            Permalink::Default => Ok(Some(Self::pretty(relative_input))),
            Permalink::Path(path) => Self::explicit(path).map(Some),
        }
    }

    fn pretty(relative_input: &Path) -> Self {
        let mut segments: Vec<String> = relative_input
            .parent()
            .map(normal_segments)
            .unwrap_or_default();

        let stem = relative_input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        if stem != "index" {
            segments.push(stem);
        }

        let mut path: PathBuf = segments.iter().collect();
        path.push("index.html");

        let url = if segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", segments.join("/"))
        };

        Self { url, path }
    }

    fn explicit(permalink: &str) -> Result<Self> {
        let trimmed = permalink.trim().trim_start_matches('/');
        let relative = Path::new(trimmed);

        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(SiteForgeError::output_generation_error(
                "Permalink must stay inside the output directory",
                PathBuf::from(permalink),
                None,
            ));
        }

        let segments = normal_segments(relative);
        let mut path: PathBuf = segments.iter().collect();
        let url = if trimmed.is_empty() || trimmed.ends_with('/') {
            path.push("index.html");
            if segments.is_empty() {
                "/".to_string()
            } else {
                format!("/{}/", segments.join("/"))
            }
        } else {
            format!("/{}", segments.join("/"))
        };

        Ok(Self { url, path })
    }
}

fn normal_segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(segment) => {
                Some(segment.to_string_lossy().into_owned())
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(input: &str, permalink: Permalink) -> Option<OutputTarget> {
        OutputTarget::resolve(Path::new(input), &permalink).unwrap()
    }

    #[test]
    fn test_pretty_urls() {
        let index = resolve("index.njk", Permalink::Default).unwrap();
        assert_eq!(index.url, "/");
        assert_eq!(index.path, PathBuf::from("index.html"));

        let about = resolve("about.md", Permalink::Default).unwrap();
        assert_eq!(about.url, "/about/");
        assert_eq!(about.path, Path::new("about").join("index.html"));

        let blog = resolve("blog/index.md", Permalink::Default).unwrap();
        assert_eq!(blog.url, "/blog/");
        assert_eq!(blog.path, Path::new("blog").join("index.html"));

        let post = resolve("blog/first.md", Permalink::Default).unwrap();
        assert_eq!(post.url, "/blog/first/");
        assert_eq!(
            post.path,
            Path::new("blog").join("first").join("index.html")
        );
    }

    #[test]
    fn test_explicit_permalinks() {
        let feed =
            resolve("feed.njk", Permalink::Path("/feed.xml".into())).unwrap();
        assert_eq!(feed.url, "/feed.xml");
        assert_eq!(feed.path, PathBuf::from("feed.xml"));

        let dir =
            resolve("x.md", Permalink::Path("/docs/start/".into())).unwrap();
        assert_eq!(dir.url, "/docs/start/");
        assert_eq!(dir.path, Path::new("docs").join("start").join("index.html"));

        let root = resolve("home.njk", Permalink::Path("/".into())).unwrap();
        assert_eq!(root.url, "/");
        assert_eq!(root.path, PathBuf::from("index.html"));
    }

    #[test]
    fn test_disabled_permalink() {
        assert_eq!(resolve("draft.md", Permalink::Disabled), None);
    }

    #[test]
    fn test_escaping_permalink_is_rejected() {
        let result = OutputTarget::resolve(
            Path::new("x.md"),
            &Permalink::Path("../outside.html".into()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_permalink_from_data() {
        let data = |value: JsonValue| match value {
            JsonValue::Object(map) => map,
            _ => JsonMap::new(),
        };

        assert_eq!(
            Permalink::from_data(&data(json!({}))).unwrap(),
            Permalink::Default
        );
        assert_eq!(
            Permalink::from_data(&data(json!({"permalink": false}))).unwrap(),
            Permalink::Disabled
        );
        assert_eq!(
            Permalink::from_data(&data(json!({"permalink": "/a/"}))).unwrap(),
            Permalink::Path("/a/".to_string())
        );
        assert!(Permalink::from_data(&data(json!({"permalink": 7}))).is_err());
    }
}
