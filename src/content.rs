//! # Content Module
//!
//! Splits a template file into its YAML front matter and its body. The front
//! matter becomes template data; the body is what gets rendered.

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::core::error::{Result, SiteForgeError};

const DELIMITER: &str = "---";

/// A template file split into data and body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Front matter data; empty when the file has none.
    pub data: JsonMap<String, JsonValue>,
    /// Everything after the closing front matter delimiter.
    pub body: String,
}

impl Document {
    /// Parses `source`, extracting front matter delimited by `---` lines.
    ///
    /// A file whose opening delimiter is never closed is treated as having
    /// no front matter.
    pub fn parse(source: &str) -> Result<Self> {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);

        let mut lines = source.split_inclusive('\n');
        let header_len = match lines.next() {
            Some(first) if first.trim_end() == DELIMITER => first.len(),
            _ => return Ok(Self::body_only(source)),
        };

        let mut offset = header_len;
        for line in lines {
            if line.trim_end() == DELIMITER {
                let data = parse_front_matter(&source[header_len..offset])?;
                return Ok(Self {
                    data,
                    body: source[offset + line.len()..].to_string(),
                });
            }
            offset += line.len();
        }

        Ok(Self::body_only(source))
    }

    fn body_only(source: &str) -> Self {
        Self {
            data: JsonMap::new(),
            body: source.to_string(),
        }
    }

    /// The `layout` named in the front matter, if any.
    ///
    /// `layout: false` and `layout: null` mean no layout.
    pub fn layout(&self) -> Result<Option<&str>> {
        match self.data.get("layout") {
            None | Some(JsonValue::Null) | Some(JsonValue::Bool(false)) => {
                Ok(None)
            }
            Some(JsonValue::String(name)) if !name.trim().is_empty() => {
                Ok(Some(name.trim()))
            }
            Some(other) => Err(SiteForgeError::content_processing_error(
                format!("Invalid layout value: {}", other),
                None,
            )),
        }
    }
}

fn parse_front_matter(yaml: &str) -> Result<JsonMap<String, JsonValue>> {
    if yaml.trim().is_empty() {
        return Ok(JsonMap::new());
    }

    let value: JsonValue = serde_yml::from_str(yaml).map_err(|e| {
        SiteForgeError::content_processing_error(
            "Failed to parse front matter",
            Some(Box::new(e)),
        )
    })?;

    match value {
        JsonValue::Object(map) => Ok(map),
        JsonValue::Null => Ok(JsonMap::new()),
        _ => Err(SiteForgeError::content_processing_error(
            "Front matter must be a mapping",
            None,
        )),
    }
}
