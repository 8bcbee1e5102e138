//! # Configuration Module
//!
//! Holds the build configuration record and the layering that refines it.
//!
//! The record itself ([`BuildConfig`]) is what [`crate::configure`] hands to
//! the build engine: directory mapping, template formats and the engines
//! used to pre-process Markdown and HTML. [`ConfigBuilder`] starts from that
//! declared record and applies, in order, a TOML file, environment variables
//! sharing a prefix, and explicit key/value overrides.
//!
//! ## Example
//!
//! ```rust,no_run
//! use siteforge::core::config::ConfigBuilder;
//! use siteforge::PassthroughRegistry;
//!
//! let mut registry = PassthroughRegistry::new();
//! let config = ConfigBuilder::new()
//!     .with_file("siteforge.toml")
//!     .with_env_prefix("SITEFORGE_")
//!     .with_override("dir.output", "public")
//!     .build(&mut registry)
//!     .unwrap();
//!
//! assert_eq!(config.dir.output, std::path::Path::new("public"));
//! ```

use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SiteForgeError};
use crate::core::traits::EngineHandle;
use crate::passthrough::PassthroughRule;
use crate::process::normalize_path;
use crate::template::TemplateFormat;

/// Directory holding source templates and pages.
pub const DEFAULT_INPUT_DIR: &str = "src";
/// Directory the generated site is written to.
pub const DEFAULT_OUTPUT_DIR: &str = "_site";
/// Fragment directory, relative to the input directory.
pub const DEFAULT_INCLUDES_DIR: &str = "includes";
/// Template formats recognised by the declared configuration.
pub const DEFAULT_TEMPLATE_FORMATS: [&str; 3] = ["html", "njk", "md"];
/// Engine used to pre-process Markdown files.
pub const DEFAULT_MARKDOWN_ENGINE: &str = "njk";
/// Directory copied verbatim into the output tree.
pub const ASSETS_DIR: &str = "assets";

/// The build configuration record.
///
/// Serializes with the keys the engine expects: `passthroughFileCopy`,
/// `markdownTemplateEngine`, `htmlTemplateEngine`, `templateFormats` and
/// `dir.{input,output,includes}`. Absent optional fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Enables passthrough copying: registered rules are honoured and
    /// non-template files in the input tree are copied unchanged.
    pub passthrough_file_copy: bool,

    /// Engine that pre-processes Markdown before conversion to HTML.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_template_engine: Option<String>,

    /// Engine that pre-processes `.html` templates. `None` keeps them as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_template_engine: Option<String>,

    /// File extensions treated as templates. `None` means every known format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_formats: Option<Vec<String>>,

    /// Directory mapping.
    pub dir: DirConfig,
}

/// Directory mapping of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirConfig {
    /// Root directory containing source templates and pages.
    pub input: PathBuf,
    /// Root directory where generated output is written.
    pub output: PathBuf,
    /// Fragment directory, always relative to `input`.
    pub includes: PathBuf,
}

impl DirConfig {
    /// Returns the includes directory joined onto the input directory.
    pub fn includes_path(&self) -> PathBuf {
        self.input.join(&self.includes)
    }
}

impl BuildConfig {
    /// The declared configuration, without any passthrough registration.
    pub fn declared() -> Self {
        Self {
            passthrough_file_copy: true,
            markdown_template_engine: Some(
                DEFAULT_MARKDOWN_ENGINE.to_string(),
            ),
            html_template_engine: None,
            template_formats: Some(
                DEFAULT_TEMPLATE_FORMATS
                    .iter()
                    .map(|format| format.to_string())
                    .collect(),
            ),
            dir: DirConfig {
                input: PathBuf::from(DEFAULT_INPUT_DIR),
                output: PathBuf::from(DEFAULT_OUTPUT_DIR),
                includes: PathBuf::from(DEFAULT_INCLUDES_DIR),
            },
        }
    }

    /// Validates format names, engine names and the directory mapping.
    ///
    /// The declared record always passes; layered values may not.
    pub fn validate(&self) -> Result<()> {
        _ = TemplateFormat::parse_list(self.template_formats.as_deref())?;
        _ = TemplateFormat::parse_engine(
            self.markdown_template_engine.as_deref(),
            "markdownTemplateEngine",
        )?;
        _ = TemplateFormat::parse_engine(
            self.html_template_engine.as_deref(),
            "htmlTemplateEngine",
        )?;

        if normalize_path(&self.dir.input)
            == normalize_path(&self.dir.output)
        {
            return Err(SiteForgeError::config_error(
                "Input and output directories must differ",
                Some(self.dir.input.clone()),
            ));
        }

        if self.dir.includes.as_os_str().is_empty()
            || self.dir.includes.components().any(|c| {
                matches!(c, Component::RootDir | Component::Prefix(_))
            })
        {
            return Err(SiteForgeError::config_error(
                "Includes directory must be a path relative to the input directory",
                Some(self.dir.includes.clone()),
            ));
        }

        Ok(())
    }
}

/// Builds a [`BuildConfig`] by layering sources over the declared record.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_file: Option<PathBuf>,
    env_prefix: Option<String>,
    overrides: Vec<(String, String)>,
}

impl ConfigBuilder {
    /// Initialises a new `ConfigBuilder` with no extra sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a TOML configuration file.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Adds a prefix for environment variables (e.g. `SITEFORGE_`).
    pub fn with_env_prefix<S: Into<String>>(
        mut self,
        prefix: S,
    ) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Adds a key/value override, applied after every other source.
    ///
    /// Unknown keys make [`ConfigBuilder::build`] fail.
    pub fn with_override<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// Produces the final configuration.
    ///
    /// The declared configuration registers its passthrough rules on
    /// `engine` first; rules listed under `passthroughCopy` in the file are
    /// registered after it.
    pub fn build<E: EngineHandle + ?Sized>(
        self,
        engine: &mut E,
    ) -> Result<BuildConfig> {
        let mut config = crate::configure(engine);

        if let Some(path) = &self.config_file {
            let file = load_from_file(path)?;
            apply_file(&mut config, file, engine);
        }

        if let Some(prefix) = &self.env_prefix {
            let vars = env::vars_os().filter_map(|(key, value)| {
                Some((key.into_string().ok()?, value.into_string().ok()?))
            });
            apply_env_vars(&mut config, prefix, vars)?;
        }

        for (key, value) in &self.overrides {
            if !apply_config_value(&mut config, key, value)? {
                return Err(SiteForgeError::config_error(
                    format!("Unknown configuration key: {}", key),
                    None,
                ));
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// On-disk form of the configuration; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigFile {
    passthrough_file_copy: Option<bool>,
    markdown_template_engine: Option<String>,
    html_template_engine: Option<String>,
    template_formats: Option<Vec<String>>,
    dir: Option<DirFile>,
    #[serde(default)]
    passthrough_copy: Vec<PassthroughEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DirFile {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    includes: Option<PathBuf>,
}

/// A `passthroughCopy` item: a bare path or a `{ from, to }` table.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PassthroughEntry {
    Path(PathBuf),
    Mapped { from: PathBuf, to: PathBuf },
}

impl From<PassthroughEntry> for PassthroughRule {
    fn from(entry: PassthroughEntry) -> Self {
        match entry {
            PassthroughEntry::Path(path) => PassthroughRule::new(path),
            PassthroughEntry::Mapped { from, to } => {
                PassthroughRule::new(from).with_target(to)
            }
        }
    }
}

fn load_from_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path).map_err(|e| {
        SiteForgeError::config_error(
            format!("Failed to read config file: {}", e),
            Some(path.to_path_buf()),
        )
    })?;

    toml::from_str(&content).map_err(|e| {
        SiteForgeError::config_error(
            format!("Failed to parse config file: {}", e),
            Some(path.to_path_buf()),
        )
    })
}

fn apply_file<E: EngineHandle + ?Sized>(
    config: &mut BuildConfig,
    file: ConfigFile,
    engine: &mut E,
) {
    if let Some(enabled) = file.passthrough_file_copy {
        config.passthrough_file_copy = enabled;
    }
    if let Some(name) = file.markdown_template_engine {
        config.markdown_template_engine = optional_engine(&name);
    }
    if let Some(name) = file.html_template_engine {
        config.html_template_engine = optional_engine(&name);
    }
    if let Some(formats) = file.template_formats {
        config.template_formats = Some(formats);
    }
    if let Some(dir) = file.dir {
        if let Some(input) = dir.input {
            config.dir.input = input;
        }
        if let Some(output) = dir.output {
            config.dir.output = output;
        }
        if let Some(includes) = dir.includes {
            config.dir.includes = includes;
        }
    }
    for entry in file.passthrough_copy {
        engine.add_passthrough_copy(entry.into());
    }
}

/// Applies every `PREFIX_KEY=value` pair in `vars`.
///
/// Variables with an unknown key are ignored so that unrelated variables
/// sharing the prefix do not break a build.
fn apply_env_vars<I>(
    config: &mut BuildConfig,
    prefix: &str,
    vars: I,
) -> Result<()>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        if let Some(stripped) = key.strip_prefix(prefix) {
            let config_key = stripped.trim_start_matches('_');
            if apply_config_value(config, config_key, &value)? {
                debug!("Applied environment override {}", key);
            } else {
                warn!("Ignoring unknown configuration variable {}", key);
            }
        }
    }
    Ok(())
}

/// Applies a single key. Returns `Ok(false)` when the key is unknown.
///
/// Keys are matched case-insensitively with `_`, `.` and `-` ignored, so
/// `dir.input`, `DIR_INPUT` and `dirInput` all name the same field.
fn apply_config_value(
    config: &mut BuildConfig,
    key: &str,
    value: &str,
) -> Result<bool> {
    let normalized: String = key
        .chars()
        .filter(|c| !matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .to_lowercase();

    match normalized.as_str() {
        "passthroughfilecopy" => {
            config.passthrough_file_copy =
                value.trim().parse().map_err(|e| {
                    SiteForgeError::config_error(
                        format!(
                            "Invalid passthrough_file_copy value '{}': {}",
                            value, e
                        ),
                        None,
                    )
                })?;
        }
        "markdowntemplateengine" => {
            config.markdown_template_engine = optional_engine(value)
        }
        "htmltemplateengine" => {
            config.html_template_engine = optional_engine(value)
        }
        "templateformats" => {
            config.template_formats = Some(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|format| !format.is_empty())
                    .map(String::from)
                    .collect(),
            );
        }
        "dirinput" => config.dir.input = PathBuf::from(value),
        "diroutput" => config.dir.output = PathBuf::from(value),
        "dirincludes" => config.dir.includes = PathBuf::from(value),
        _ => return Ok(false),
    }
    Ok(true)
}

fn optional_engine(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
