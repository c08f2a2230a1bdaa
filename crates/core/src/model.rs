//! Core types for modules, raw discovery records and build technologies.

use crate::paths;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Canonical command vocabulary shared by providers and defaults.
pub mod commands {
    /// Compile or package the module.
    pub const BUILD: &str = "build";
    /// Full verification: compile, lint and test.
    pub const VERIFY: &str = "verify";
    /// Run only the module's own tests.
    pub const MODULE_TESTS: &str = "module-tests";
    /// Install the module's artifact locally.
    pub const INSTALL: &str = "install";
    /// Remove build output.
    pub const CLEAN: &str = "clean";

    /// All canonical command names.
    pub const ALL: [&str; 5] = [BUILD, VERIFY, MODULE_TESTS, INSTALL, CLEAN];
}

/// Tag identifying the build technology that produced a record.
///
/// Tags are lower-case, e.g. `maven`, `cargo`, `npm`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Technology(String);

impl Technology {
    /// Maven (`pom.xml`).
    pub const MAVEN: &'static str = "maven";
    /// Gradle (`build.gradle`).
    pub const GRADLE: &'static str = "gradle";
    /// Cargo (`Cargo.toml`).
    pub const CARGO: &'static str = "cargo";
    /// Go modules (`go.mod`).
    pub const GO: &'static str = "go";
    /// Python (`pyproject.toml`).
    pub const PYTHON: &'static str = "python";
    /// npm and compatible package managers (`package.json`).
    pub const NPM: &'static str = "npm";

    /// Create a technology tag, normalizing it to lower case.
    #[must_use]
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().to_ascii_lowercase())
    }

    /// The tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Technology {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Deterministic total order over technology tags.
///
/// Listed tags rank by position; unlisted tags rank after every listed tag
/// and compare alphabetically among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechnologyOrder(Vec<Technology>);

impl TechnologyOrder {
    /// Create an order from a priority list.
    #[must_use]
    pub fn new(priority: Vec<Technology>) -> Self {
        Self(priority)
    }

    /// The priority list.
    #[must_use]
    pub fn priority(&self) -> &[Technology] {
        &self.0
    }

    fn rank(&self, technology: &Technology) -> usize {
        self.0
            .iter()
            .position(|t| t == technology)
            .unwrap_or(self.0.len())
    }

    /// Compare two tags under this order.
    #[must_use]
    pub fn compare(&self, a: &Technology, b: &Technology) -> Ordering {
        self.rank(a)
            .cmp(&self.rank(b))
            .then_with(|| a.as_str().cmp(b.as_str()))
    }

    /// Sort tags in place under this order.
    pub fn sort(&self, technologies: &mut [Technology]) {
        technologies.sort_by(|a, b| self.compare(a, b));
    }
}

impl Default for TechnologyOrder {
    fn default() -> Self {
        Self(
            [
                Technology::MAVEN,
                Technology::GRADLE,
                Technology::CARGO,
                Technology::GO,
                Technology::PYTHON,
                Technology::NPM,
            ]
            .into_iter()
            .map(Technology::new)
            .collect(),
        )
    }
}

/// How a module is packaged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PackagingKind {
    /// A grouping unit with no code of its own (e.g. a parent descriptor).
    Aggregator,
    /// A reusable library.
    Library,
    /// A runnable program or application.
    Executable,
    /// Any provider-specific classification.
    Other(String),
}

impl PackagingKind {
    /// Whether this is the no-code aggregator classification.
    #[must_use]
    pub fn is_aggregator(&self) -> bool {
        matches!(self, Self::Aggregator)
    }

    /// Canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Aggregator => "aggregator",
            Self::Library => "library",
            Self::Executable => "executable",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for PackagingKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "aggregator" | "pom" => Self::Aggregator,
            "library" | "lib" | "jar" => Self::Library,
            "executable" | "bin" | "application" => Self::Executable,
            _ => Self::Other(kind),
        }
    }
}

impl From<PackagingKind> for String {
    fn from(kind: PackagingKind) -> Self {
        match kind {
            PackagingKind::Other(kind) => kind,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for PackagingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared dependency of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// External artifact coordinate or the name of another module.
    pub identifier: String,
    /// Scope as reported by the provider, e.g. `compile` or `test`.
    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_scope() -> String {
    "compile".to_string()
}

impl Dependency {
    /// Create a dependency declaration.
    #[must_use]
    pub fn new(identifier: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            scope: scope.into(),
        }
    }
}

/// The executable string(s) registered for one canonical command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandValue {
    /// One executable string.
    Single(String),
    /// One executable string per build technology.
    PerTechnology(BTreeMap<Technology, String>),
}

/// Present on modules that share their physical path with sibling modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualModuleInfo {
    /// The shared physical path.
    #[serde(serialize_with = "paths::serialize")]
    pub physical_path: PathBuf,
    /// This module's technology.
    pub technology: Technology,
    /// Name stem shared by all siblings at the path.
    pub base_name: String,
    /// The other modules at the same path, sorted.
    pub sibling_names: Vec<String>,
}

/// The canonical unit of the module graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// Unique module name.
    pub name: String,
    /// Path relative to the project root (`.` for the root).
    #[serde(serialize_with = "paths::serialize")]
    pub physical_path: PathBuf,
    /// Technologies this module was produced under.
    pub build_technologies: Vec<Technology>,
    /// Build descriptor files.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "paths::serialize_all"
    )]
    pub descriptor_path: Vec<PathBuf>,
    /// Source directories.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "paths::serialize_all"
    )]
    pub source_paths: Vec<PathBuf>,
    /// Test directories.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "paths::serialize_all"
    )]
    pub test_paths: Vec<PathBuf>,
    /// Declared dependencies, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub declared_dependencies: Vec<Dependency>,
    /// Packaging classification.
    pub packaging_kind: PackagingKind,
    /// Canonical command name to executable string(s).
    #[serde(default)]
    pub commands: BTreeMap<String, CommandValue>,
    /// Sibling information for virtual modules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_module_info: Option<VirtualModuleInfo>,
}

impl Module {
    /// Build a module from a raw record under the given name.
    ///
    /// Commands become single-string values scoped to the record's technology.
    #[must_use]
    pub fn from_record(name: String, record: RawModuleRecord) -> Self {
        Self {
            name,
            physical_path: record.physical_path,
            build_technologies: vec![record.technology],
            descriptor_path: record.descriptor_path,
            source_paths: record.source_paths,
            test_paths: record.test_paths,
            declared_dependencies: record.declared_dependencies,
            packaging_kind: record.packaging_kind,
            commands: record
                .commands
                .into_iter()
                .map(|(command, executable)| (command, CommandValue::Single(executable)))
                .collect(),
            virtual_module_info: None,
        }
    }

    /// Whether this module is one of several siblings at its path.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.virtual_module_info.is_some()
    }

    /// Whether this module lives at the project root.
    #[must_use]
    pub fn is_at_root(&self) -> bool {
        paths::is_root(&self.physical_path)
    }

    /// Identifiers of all declared dependencies.
    pub fn dependency_identifiers(&self) -> impl Iterator<Item = &str> {
        self.declared_dependencies
            .iter()
            .map(|dep| dep.identifier.as_str())
    }
}

/// A module record as reported by one discovery provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModuleRecord {
    /// Path relative to the project root.
    #[serde(serialize_with = "paths::serialize")]
    pub physical_path: PathBuf,
    /// The reporting provider's technology.
    pub technology: Technology,
    /// Preferred module name; empty when the descriptor has none.
    #[serde(default)]
    pub name_hint: String,
    /// Build descriptor files.
    #[serde(default, serialize_with = "paths::serialize_all")]
    pub descriptor_path: Vec<PathBuf>,
    /// Source directories.
    #[serde(default, serialize_with = "paths::serialize_all")]
    pub source_paths: Vec<PathBuf>,
    /// Test directories.
    #[serde(default, serialize_with = "paths::serialize_all")]
    pub test_paths: Vec<PathBuf>,
    /// Declared dependencies.
    #[serde(default)]
    pub declared_dependencies: Vec<Dependency>,
    /// Packaging classification.
    pub packaging_kind: PackagingKind,
    /// Canonical command name to executable string.
    #[serde(default)]
    pub commands: BTreeMap<String, String>,
}

impl RawModuleRecord {
    /// Create a record with no paths, dependencies or commands.
    #[must_use]
    pub fn new(
        physical_path: impl Into<PathBuf>,
        technology: impl Into<Technology>,
        name_hint: impl Into<String>,
        packaging_kind: PackagingKind,
    ) -> Self {
        Self {
            physical_path: physical_path.into(),
            technology: technology.into(),
            name_hint: name_hint.into(),
            descriptor_path: Vec::new(),
            source_paths: Vec::new(),
            test_paths: Vec::new(),
            declared_dependencies: Vec::new(),
            packaging_kind,
            commands: BTreeMap::new(),
        }
    }

    /// Add a dependency declaration.
    #[must_use]
    pub fn with_dependency(mut self, identifier: impl Into<String>, scope: impl Into<String>) -> Self {
        self.declared_dependencies
            .push(Dependency::new(identifier, scope));
        self
    }

    /// Add a command.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>, executable: impl Into<String>) -> Self {
        self.commands.insert(command.into(), executable.into());
        self
    }

    /// Add a source path.
    #[must_use]
    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_paths.push(path.into());
        self
    }
}
