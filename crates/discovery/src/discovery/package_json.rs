//! Discovery of npm/Bun/Yarn packages via `package.json`.
//!
//! Handles the `workspaces` field in both the array format and the object
//! format (with a `packages` key). Commands are derived from the `scripts`
//! each package actually defines.

use crate::discovery::{existing_subdirs, read_json_file, relative_path, resolve_glob_patterns};
use crate::error::{Error, Result};
use crate::provider::DiscoveryProvider;
use modmap_core::{PackagingKind, RawModuleRecord, Technology, commands};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

const MANIFEST: &str = "package.json";

/// Reports npm packages and workspace members.
#[derive(Debug, Clone, Copy, Default)]
pub struct NpmProvider;

impl DiscoveryProvider for NpmProvider {
    fn technology(&self) -> Technology {
        Technology::new(Technology::NPM)
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

        let package_json: PackageJson = read_json_file(&manifest_path)?;
        let patterns = match &package_json.workspaces {
            Some(WorkspacesField::Array(patterns)) => patterns.clone(),
            Some(WorkspacesField::Object { packages }) => packages.clone(),
            None => Vec::new(),
        };
        let is_workspace_root = package_json.workspaces.is_some();

        let mut records = vec![self.package_record(root, root, &package_json, is_workspace_root)];

        let matched_paths = resolve_glob_patterns(root, &patterns, &[])?;
        for path in matched_paths {
            if let Some(member) = self.validate_member(&path)? {
                records.push(self.package_record(root, &path, &member, false));
            }
        }

        debug!(root = %root.display(), records = records.len(), "npm discovery finished");
        Ok(records)
    }

    fn default_commands(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                commands::BUILD.to_string(),
                "npm run build --workspaces --if-present".to_string(),
            ),
            (
                commands::VERIFY.to_string(),
                "npm test --workspaces --if-present".to_string(),
            ),
            (
                commands::MODULE_TESTS.to_string(),
                "npm test --workspaces --if-present".to_string(),
            ),
            (commands::INSTALL.to_string(), "npm install".to_string()),
        ])
    }
}

impl NpmProvider {
    /// Parses a member manifest, tolerating broken members.
    ///
    /// # Tolerant Validation Behavior
    ///
    /// Returns `Ok(None)` for:
    /// - Directories without a `package.json` file
    /// - `package.json` files with invalid JSON syntax
    /// - `package.json` files missing a `name` field
    ///
    /// Only I/O errors (permission issues, etc.) are propagated as `Err`.
    fn validate_member(&self, member_path: &Path) -> Result<Option<PackageJson>> {
        let manifest_path = member_path.join(MANIFEST);
        if !manifest_path.exists() {
            return Ok(None);
        }

        match read_json_file::<PackageJson>(&manifest_path) {
            Ok(pkg) if pkg.name.as_deref().is_some_and(|n| !n.is_empty()) => Ok(Some(pkg)),
            Ok(_) => {
                warn!(path = %manifest_path.display(), "Skipping member without a name");
                Ok(None)
            }
            Err(e) if e.is_parse_error() => {
                warn!(path = %manifest_path.display(), error = %e, "Skipping malformed member manifest");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn package_record(
        &self,
        root: &Path,
        dir: &Path,
        package: &PackageJson,
        is_workspace_root: bool,
    ) -> RawModuleRecord {
        let name = package.name.clone().unwrap_or_default();
        let rel = relative_path(root, dir);
        let source_paths = existing_subdirs(root, dir, &["src"]);

        let kind = if is_workspace_root && source_paths.is_empty() {
            PackagingKind::Aggregator
        } else if package.bin.is_some() {
            PackagingKind::Executable
        } else {
            PackagingKind::Library
        };

        let mut record = RawModuleRecord::new(rel.clone(), self.technology(), name.clone(), kind);
        record.descriptor_path.push(relative_path(root, &dir.join(MANIFEST)));
        record.source_paths = source_paths;
        record.test_paths = existing_subdirs(root, dir, &["test", "tests", "__tests__"]);

        for (scope, deps) in [
            ("compile", &package.dependencies),
            ("test", &package.dev_dependencies),
            ("provided", &package.peer_dependencies),
        ] {
            for key in deps.keys() {
                record = record.with_dependency(key.clone(), scope);
            }
        }

        // Members run through the root's workspace flag; the root runs directly.
        let workspace_flag = if rel == Path::new(".") {
            String::new()
        } else {
            format!(" --workspace={name}")
        };
        let script = |script: &str| {
            package
                .scripts
                .contains_key(script)
                .then(|| format!("npm run {script}{workspace_flag}"))
        };

        if let Some(build) = script("build") {
            record = record.with_command(commands::BUILD, build);
        }
        if let Some(test) = script("test") {
            record = record.with_command(commands::MODULE_TESTS, test.clone());
            let verify = script("verify")
                .or_else(|| script("lint").map(|lint| format!("{lint} && {test}")))
                .unwrap_or(test);
            record = record.with_command(commands::VERIFY, verify);
        } else if let Some(verify) = script("verify") {
            record = record.with_command(commands::VERIFY, verify);
        }
        if let Some(clean) = script("clean") {
            record = record.with_command(commands::CLEAN, clean);
        }
        if record.packaging_kind == PackagingKind::Executable {
            record = record.with_command(
                commands::INSTALL,
                format!("npm install --global {}", rel.display()),
            );
        }

        debug!(module = %name, path = %rel.display(), kind = %record.packaging_kind, "Found npm package");
        record
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    name: Option<String>,
    workspaces: Option<WorkspacesField>,
    bin: Option<serde_json::Value>,
    #[serde(default)]
    scripts: BTreeMap<String, String>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    peer_dependencies: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WorkspacesField {
    Array(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}
