//! # Passthrough Copy
//!
//! Rules for copying files and directories from the project root into the
//! output tree without rendering them, and the registry that collects those
//! rules from a configuration.

use std::path::{Component, Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::core::error::{Result, SiteForgeError};
use crate::core::traits::EngineHandle;
use crate::process::{copy_file, normalize_path, walk_error, OutputClaims};

/// A single passthrough copy: `source` (relative to the project root) is
/// copied to `target` (relative to the output directory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassthroughRule {
    /// Path of the file or directory to copy, relative to the project root.
    pub source: PathBuf,
    /// Destination relative to the output directory.
    pub target: PathBuf,
}

impl PassthroughRule {
    /// Creates a rule that copies `source` to the same relative path in the
    /// output directory.
    pub fn new<P: AsRef<Path>>(source: P) -> Self {
        let source = source.as_ref().to_path_buf();
        Self {
            target: source.clone(),
            source,
        }
    }

    /// Copies to `target` instead of the source's own path.
    pub fn with_target<P: AsRef<Path>>(mut self, target: P) -> Self {
        self.target = target.as_ref().to_path_buf();
        self
    }
}

impl From<&str> for PassthroughRule {
    fn from(source: &str) -> Self {
        PassthroughRule::new(source)
    }
}

/// The crate's [`EngineHandle`]: an ordered, duplicate-free rule list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassthroughRegistry {
    rules: Vec<PassthroughRule>,
}

impl PassthroughRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered rules in registration order.
    pub fn rules(&self) -> &[PassthroughRule] {
        &self.rules
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rule has been registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl EngineHandle for PassthroughRegistry {
    fn add_passthrough_copy(&mut self, rule: PassthroughRule) {
        if self.rules.iter().any(|r| r.source == rule.source) {
            debug!(
                "Passthrough copy for {} already registered",
                rule.source.display()
            );
            return;
        }
        self.rules.push(rule);
    }
}

/// Result of running a set of passthrough rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyOutcome {
    /// Number of files copied.
    pub files: usize,
    /// Rule sources that did not exist and were skipped.
    pub skipped: Vec<PathBuf>,
}

/// Runs `rules`, resolving sources against `root` and targets against
/// `output_dir`. Missing sources are skipped, not errors.
///
/// Every rule is checked before anything is copied: a target must stay
/// inside `output_dir` and a source must not contain `output_dir`. Each
/// copied file is recorded in `claims`, so a file another source already
/// wrote is an output conflict.
pub fn copy_passthrough(
    root: &Path,
    output_dir: &Path,
    rules: &[PassthroughRule],
    claims: &mut OutputClaims,
) -> Result<CopyOutcome> {
    for rule in rules {
        check_rule(root, output_dir, rule)?;
    }

    let mut outcome = CopyOutcome::default();
    for rule in rules {
        let source = root.join(&rule.source);
        if !source.exists() {
            warn!(
                "Passthrough source {} does not exist, skipping",
                source.display()
            );
            outcome.skipped.push(rule.source.clone());
            continue;
        }

        let target = output_dir.join(&rule.target);
        let copied = copy_tree(&source, &target, claims)?;
        info!(
            "Copied {} file(s) from {} to {}",
            copied,
            source.display(),
            target.display()
        );
        outcome.files += copied;
    }

    Ok(outcome)
}

fn check_rule(
    root: &Path,
    output_dir: &Path,
    rule: &PassthroughRule,
) -> Result<()> {
    if rule
        .target
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(SiteForgeError::output_generation_error(
            "Passthrough target must stay inside the output directory",
            rule.target.clone(),
            None,
        ));
    }

    let source = normalize_path(&root.join(&rule.source));
    let output = normalize_path(output_dir);
    if source.is_absolute() == output.is_absolute()
        && output.starts_with(&source)
    {
        return Err(SiteForgeError::output_generation_error(
            format!(
                "Passthrough source {} contains the output directory",
                rule.source.display()
            ),
            output_dir.to_path_buf(),
            None,
        ));
    }

    Ok(())
}

/// Copies a file, or every file below a directory, to `target`, claiming
/// each output file in `claims` first.
///
/// Returns the number of files copied.
pub fn copy_tree(
    source: &Path,
    target: &Path,
    claims: &mut OutputClaims,
) -> Result<usize> {
    if source.is_file() {
        claims.claim(target, source)?;
        copy_file(source, target)?;
        return Ok(1);
    }

    let mut copied = 0;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(walk_error)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(source).map_err(|e| {
            SiteForgeError::internal_error(format!(
                "Failed to determine relative path: {}",
                e
            ))
        })?;
        let destination = target.join(relative);
        claims.claim(&destination, entry.path())?;
        copy_file(entry.path(), &destination)?;
        copied += 1;
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_rule_target_defaults_to_source() {
        let rule = PassthroughRule::new("assets");
        assert_eq!(rule.source, PathBuf::from("assets"));
        assert_eq!(rule.target, PathBuf::from("assets"));
        assert_eq!(PassthroughRule::from("assets"), rule);
    }

    #[test]
    fn test_registry_ignores_duplicate_sources() {
        let mut registry = PassthroughRegistry::new();
        registry.add_passthrough_copy(PassthroughRule::new("assets"));
        registry.add_passthrough_copy(
            PassthroughRule::new("assets").with_target("static"),
        );
        registry.add_passthrough_copy(PassthroughRule::new("fonts"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.rules()[0].target, PathBuf::from("assets"));
        assert_eq!(registry.rules()[1].source, PathBuf::from("fonts"));
    }

    #[test]
    fn test_copy_passthrough_directory_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("assets/css")).unwrap();
        fs::write(root.join("assets/css/site.css"), "body{}").unwrap();
        fs::write(root.join("assets/logo.svg"), "<svg/>").unwrap();
        fs::write(root.join("robots.txt"), "User-agent: *").unwrap();

        let rules = vec![
            PassthroughRule::new("assets"),
            PassthroughRule::new("robots.txt").with_target("meta/robots.txt"),
        ];
        let output = root.join("_site");
        let outcome =
            copy_passthrough(root, &output, &rules, &mut OutputClaims::new())
                .unwrap();

        assert_eq!(outcome.files, 3);
        assert!(outcome.skipped.is_empty());
        assert_eq!(
            fs::read_to_string(output.join("assets/css/site.css")).unwrap(),
            "body{}"
        );
        assert!(output.join("assets/logo.svg").is_file());
        assert!(output.join("meta/robots.txt").is_file());
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let rules = vec![PassthroughRule::new("assets")];

        let outcome = copy_passthrough(
            root,
            &root.join("_site"),
            &rules,
            &mut OutputClaims::new(),
        )
        .unwrap();
        assert_eq!(outcome.files, 0);
        assert_eq!(outcome.skipped, vec![PathBuf::from("assets")]);
        assert!(!root.join("_site").exists());
    }

    #[test]
    fn test_copy_tree_preserves_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("image.bin");
        let bytes = [0u8, 159, 146, 150, 255];
        fs::write(&source, bytes).unwrap();

        let target = temp_dir.path().join("out/image.bin");
        let mut claims = OutputClaims::new();
        assert_eq!(copy_tree(&source, &target, &mut claims).unwrap(), 1);
        assert_eq!(fs::read(target).unwrap(), bytes);
    }

    #[test]
    fn test_escaping_target_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("project");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("secret.txt"), "secret").unwrap();

        let rules = vec![PassthroughRule::new("secret.txt")
            .with_target("../../escaped.txt")];
        let result = copy_passthrough(
            &root,
            &root.join("_site"),
            &rules,
            &mut OutputClaims::new(),
        );

        assert!(matches!(
            result,
            Err(SiteForgeError::OutputGenerationError { .. })
        ));
        assert!(!temp_dir.path().join("escaped.txt").exists());
    }

    #[test]
    fn test_absolute_target_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.txt"), "a").unwrap();

        let rules =
            vec![PassthroughRule::new("a.txt").with_target(root.join("b.txt"))];
        assert!(copy_passthrough(
            root,
            &root.join("_site"),
            &rules,
            &mut OutputClaims::new()
        )
        .is_err());
    }

    #[test]
    fn test_source_containing_output_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("index.html"), "home").unwrap();

        let rules = vec![PassthroughRule::new(".")];
        let result = copy_passthrough(
            root,
            &root.join("_site"),
            &rules,
            &mut OutputClaims::new(),
        );

        assert!(matches!(
            result,
            Err(SiteForgeError::OutputGenerationError { .. })
        ));
        assert!(!root.join("_site").exists());
    }

    #[test]
    fn test_claimed_output_is_a_conflict() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let output = root.join("_site");
        fs::create_dir_all(root.join("assets")).unwrap();
        fs::write(root.join("assets/site.css"), "from-passthrough").unwrap();

        let mut claims = OutputClaims::new();
        claims
            .claim(
                &output.join("assets/site.css"),
                Path::new("src/assets/site.css"),
            )
            .unwrap();

        let rules = vec![PassthroughRule::new("assets")];
        let result = copy_passthrough(root, &output, &rules, &mut claims);
        assert!(matches!(
            result,
            Err(SiteForgeError::OutputGenerationError { .. })
        ));
        assert!(!output.join("assets/site.css").exists());
    }
}
