//! End-to-end tests for the `siteforge` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn siteforge() -> Command {
    let mut cmd = Command::cargo_bin("siteforge").unwrap();
    let _ = cmd.env_remove("RUST_LOG");
    cmd
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_no_subcommand_prints_help() {
    let _ = siteforge()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_config_prints_declared_configuration() {
    let temp_dir = TempDir::new().unwrap();

    let _ = siteforge()
        .args(["config", "--root"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"passthroughFileCopy\": true"))
        .stdout(predicate::str::contains("\"markdownTemplateEngine\": \"njk\""))
        .stdout(predicate::str::contains("\"includes\": \"includes\""))
        .stdout(predicate::str::contains("\"source\": \"assets\""));
}

#[test]
fn test_config_reads_project_file() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "siteforge.toml",
        "templateFormats = [\"md\"]\n[dir]\noutput = \"public\"\n",
    );

    let _ = siteforge()
        .args(["config", "--root"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"output\": \"public\""))
        .stdout(predicate::str::contains("\"njk\"").count(1));
}

#[test]
fn test_config_rejects_unknown_file_keys() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "siteforge.toml", "outputDir = \"public\"\n");

    let _ = siteforge()
        .args(["config", "--root"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_build_writes_site() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "src/index.md", "# Hello\n");
    write(root, "assets/app.js", "console.log(1);");

    let _ = siteforge()
        .args(["build", "--root"])
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1 page(s) and copied 1 file(s)"));

    assert_eq!(
        fs::read_to_string(root.join("_site/index.html")).unwrap(),
        "<h1>Hello</h1>\n"
    );
    assert_eq!(
        fs::read_to_string(root.join("_site/assets/app.js")).unwrap(),
        "console.log(1);"
    );
}

#[test]
fn test_build_output_override() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "pages/about.njk", "{{ page.fileSlug }}");

    let _ = siteforge()
        .args(["build", "--input", "pages", "--output", "public", "--root"])
        .arg(root)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(root.join("public/about/index.html")).unwrap(),
        "about"
    );
    assert!(!root.join("_site").exists());
}

#[test]
fn test_build_fails_without_input() {
    let temp_dir = TempDir::new().unwrap();

    let _ = siteforge()
        .args(["build", "--root"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Input directory does not exist"));
}
