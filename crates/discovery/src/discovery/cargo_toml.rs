//! Discovery of Cargo packages via `Cargo.toml`.
//!
//! # Behavior for Missing `[workspace]` Section
//!
//! A `Cargo.toml` without `[workspace]` is a single-package project and
//! yields exactly one record at the root. A virtual workspace (a
//! `[workspace]` with no `[package]`) yields an aggregator record at the
//! root plus one record per member.

use crate::discovery::{existing_subdirs, read_toml_file, relative_path, resolve_glob_patterns};
use crate::error::{Error, Result};
use crate::provider::DiscoveryProvider;
use modmap_core::{PackagingKind, RawModuleRecord, Technology, commands};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use toml::Value;
use tracing::{debug, warn};

const MANIFEST: &str = "Cargo.toml";

/// Reports Cargo packages and workspace members.
#[derive(Debug, Clone, Copy, Default)]
pub struct CargoProvider;

impl DiscoveryProvider for CargoProvider {
    fn technology(&self) -> Technology {
        Technology::new(Technology::CARGO)
    }

    fn detect(&self, root: &Path) -> bool {
        root.join(MANIFEST).is_file()
    }

    fn discover(&self, root: &Path) -> Result<Vec<RawModuleRecord>> {
        let manifest_path = root.join(MANIFEST);
        if !manifest_path.exists() {
            return Err(Error::ManifestNotFound {
                path: manifest_path,
            });
        }

        let manifest: CargoToml = read_toml_file(&manifest_path)?;
        let in_workspace = manifest.workspace.is_some();
        let mut records = Vec::new();

        match (&manifest.package, &manifest.workspace) {
            (Some(_), _) => {
                records.push(self.package_record(root, root, &manifest, in_workspace));
            }
            (None, Some(_)) => records.push(self.virtual_root_record()),
            (None, None) => {
                return Err(Error::InvalidManifest {
                    path: manifest_path,
                    message: "neither [package] nor [workspace] is present".to_string(),
                });
            }
        }

        if let Some(workspace) = &manifest.workspace {
            let matched_paths = resolve_glob_patterns(root, &workspace.members, &workspace.exclude)?;
            for path in matched_paths {
                if let Some(member) = self.validate_member(&path)? {
                    records.push(self.package_record(root, &path, &member, true));
                }
            }
        }

        debug!(root = %root.display(), records = records.len(), "Cargo discovery finished");
        Ok(records)
    }

    fn default_commands(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (commands::BUILD.to_string(), "cargo build --workspace".to_string()),
            (
                commands::VERIFY.to_string(),
                "cargo clippy --workspace --all-targets && cargo test --workspace".to_string(),
            ),
            (
                commands::MODULE_TESTS.to_string(),
                "cargo test --workspace".to_string(),
            ),
            (commands::CLEAN.to_string(), "cargo clean".to_string()),
        ])
    }
}

impl CargoProvider {
    /// Parses a member manifest, tolerating broken members.
    ///
    /// # Tolerant Validation Behavior
    ///
    /// Returns `Ok(None)` for:
    /// - Directories without a `Cargo.toml` file
    /// - `Cargo.toml` files with invalid TOML syntax
    /// - `Cargo.toml` files missing a `[package]` section or package name
    ///
    /// Only I/O errors (permission issues, etc.) are propagated as `Err`.
    fn validate_member(&self, member_path: &Path) -> Result<Option<CargoToml>> {
        let manifest_path = member_path.join(MANIFEST);
        if !manifest_path.exists() {
            return Ok(None);
        }

        match read_toml_file::<CargoToml>(&manifest_path) {
            Ok(pkg) if pkg.package.as_ref().is_some_and(|p| !p.name.is_empty()) => Ok(Some(pkg)),
            Ok(_) => {
                warn!(path = %manifest_path.display(), "Skipping member without a package name");
                Ok(None)
            }
            Err(e) if e.is_parse_error() => {
                warn!(path = %manifest_path.display(), error = %e, "Skipping malformed member manifest");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn virtual_root_record(&self) -> RawModuleRecord {
        let mut record = RawModuleRecord::new(".", self.technology(), "", PackagingKind::Aggregator);
        record.descriptor_path.push(PathBuf::from(MANIFEST));
        record.commands = self.default_commands();
        record
    }

    fn package_record(
        &self,
        root: &Path,
        dir: &Path,
        manifest: &CargoToml,
        in_workspace: bool,
    ) -> RawModuleRecord {
        let name = manifest
            .package
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let rel = relative_path(root, dir);
        let executable = !manifest.bin.is_empty() || dir.join("src/main.rs").is_file();
        let kind = if executable {
            PackagingKind::Executable
        } else {
            PackagingKind::Library
        };

        let mut record = RawModuleRecord::new(rel.clone(), self.technology(), name.clone(), kind);
        record.descriptor_path.push(relative_path(root, &dir.join(MANIFEST)));
        record.source_paths = existing_subdirs(root, dir, &["src"]);
        record.test_paths = existing_subdirs(root, dir, &["tests"]);

        for (scope, deps) in [
            ("compile", &manifest.dependencies),
            ("test", &manifest.dev_dependencies),
            ("build", &manifest.build_dependencies),
        ] {
            for (key, spec) in deps {
                record = record.with_dependency(dependency_name(key, spec), scope);
            }
        }

        let target = if in_workspace {
            format!(" -p {name}")
        } else {
            String::new()
        };
        record = record
            .with_command(commands::BUILD, format!("cargo build{target}"))
            .with_command(
                commands::VERIFY,
                format!("cargo clippy{target} --all-targets && cargo test{target}"),
            )
            .with_command(commands::MODULE_TESTS, format!("cargo test{target}"))
            .with_command(commands::CLEAN, format!("cargo clean{target}"));
        if executable {
            record = record.with_command(
                commands::INSTALL,
                format!("cargo install --path {}", rel.display()),
            );
        }

        debug!(module = %name, path = %rel.display(), kind = %record.packaging_kind, "Found Cargo package");
        record
    }
}

/// The package a dependency entry refers to, honouring `package = "..."` renames.
fn dependency_name(key: &str, spec: &Value) -> String {
    spec.get("package")
        .and_then(Value::as_str)
        .unwrap_or(key)
        .to_string()
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CargoToml {
    workspace: Option<WorkspaceSection>,
    package: Option<PackageSection>,
    #[serde(default)]
    bin: Vec<Value>,
    #[serde(default)]
    dependencies: BTreeMap<String, Value>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, Value>,
    #[serde(default)]
    build_dependencies: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct WorkspaceSection {
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

#[derive(Deserialize)]
struct PackageSection {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_single_package_project() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(
            root,
            "Cargo.toml",
            r#"
[package]
name = "tool"

[dependencies]
clap = "4"

[dev-dependencies]
tempfile = "3"
"#,
        );
        write(root, "src/main.rs", "fn main() {}");

        let records = CargoProvider.discover(root).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.physical_path, PathBuf::from("."));
        assert_eq!(record.name_hint, "tool");
        assert_eq!(record.packaging_kind, PackagingKind::Executable);
        assert_eq!(record.source_paths, vec![PathBuf::from("src")]);
        assert_eq!(record.commands[commands::BUILD], "cargo build");
        assert_eq!(record.commands[commands::INSTALL], "cargo install --path .");
        let scopes: Vec<(&str, &str)> = record
            .declared_dependencies
            .iter()
            .map(|d| (d.identifier.as_str(), d.scope.as_str()))
            .collect();
        assert_eq!(scopes, vec![("clap", "compile"), ("tempfile", "test")]);
    }

    #[test]
    fn test_virtual_workspace_has_aggregator_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(
            root,
            "Cargo.toml",
            "[workspace]\nmembers = [\"crates/*\"]\nexclude = [\"crates/excluded\"]\n",
        );
        write(
            root,
            "crates/core/Cargo.toml",
            "[package]\nname = \"app-core\"\n",
        );
        write(root, "crates/core/src/lib.rs", "");
        write(
            root,
            "crates/cli/Cargo.toml",
            r#"
[package]
name = "app-cli"

[[bin]]
name = "app"
path = "src/cli.rs"

[dependencies]
core = { path = "../core", package = "app-core" }

[build-dependencies]
cc = "1"
"#,
        );
        write(
            root,
            "crates/excluded/Cargo.toml",
            "[package]\nname = \"excluded\"\n",
        );

        let records = CargoProvider.discover(root).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name_hint.as_str()).collect();
        assert_eq!(names, vec!["", "app-cli", "app-core"]);

        let root_record = &records[0];
        assert!(root_record.packaging_kind.is_aggregator());
        assert!(root_record.source_paths.is_empty());

        let cli = &records[1];
        assert_eq!(cli.physical_path, PathBuf::from("crates/cli"));
        assert_eq!(cli.packaging_kind, PackagingKind::Executable);
        assert_eq!(cli.declared_dependencies[0].identifier, "app-core");
        assert_eq!(cli.declared_dependencies[1].scope, "build");
        assert_eq!(cli.commands[commands::MODULE_TESTS], "cargo test -p app-cli");
        assert_eq!(
            cli.descriptor_path,
            vec![PathBuf::from("crates/cli/Cargo.toml")]
        );

        let core = &records[2];
        assert_eq!(core.packaging_kind, PackagingKind::Library);
        assert!(!core.commands.contains_key(commands::INSTALL));
    }

    #[test]
    fn test_malformed_member_is_skipped() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "Cargo.toml", "[workspace]\nmembers = [\"crates/*\"]\n");
        write(root, "crates/good/Cargo.toml", "[package]\nname = \"good\"\n");
        write(root, "crates/broken/Cargo.toml", "[package\nname = ");
        write(root, "crates/nameless/Cargo.toml", "[dependencies]\n");
        fs::create_dir_all(root.join("crates/empty")).unwrap();

        let records = CargoProvider.discover(root).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name_hint.as_str()).collect();
        assert_eq!(names, vec!["", "good"]);
    }

    #[test]
    fn test_malformed_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Cargo.toml", "[workspace\n");

        assert!(matches!(
            CargoProvider.discover(temp.path()),
            Err(Error::Toml { .. })
        ));
    }

    #[test]
    fn test_detect() {
        let temp = TempDir::new().unwrap();
        assert!(!CargoProvider.detect(temp.path()));
        write(temp.path(), "Cargo.toml", "[package]\nname = \"x\"\n");
        assert!(CargoProvider.detect(temp.path()));
    }
}
