// Copyright © 2024 SiteForge. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build script: refuses compilers older than the minimum supported version.

/// Minimum Rust version, kept in step with `rust-version` in `Cargo.toml`.
const MIN_VERSION: &str = "1.74.0";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if version_check::is_min_version(MIN_VERSION) == Some(false) {
        eprintln!(
            "'siteforge' requires Rust {} or newer; found {}.",
            MIN_VERSION,
            version_check::Version::read()
                .map_or_else(|| "unknown".to_string(), |v| v.to_string())
        );
        std::process::exit(1);
    }
}
