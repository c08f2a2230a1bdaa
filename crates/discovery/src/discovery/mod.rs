//! Filesystem helpers shared by the built-in providers.
//!
//! - [`resolve_glob_patterns`] expands workspace member globs
//! - [`read_json_file`] / [`read_toml_file`] parse manifests with path context
//! - [`relative_path`] and [`existing_subdirs`] produce root-relative paths
//!   for raw module records

use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use modmap_core::paths;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

pub mod cargo_toml;
pub mod package_json;

pub use cargo_toml::CargoProvider;
pub use package_json::NpmProvider;

/// Directory names never descended into while resolving members.
pub const PRUNED_DIRS: [&str; 4] = ["node_modules", ".git", "target", "dist"];

// `*` stays within one path component; `**` crosses them.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled member globs: directories must match an include and no exclude.
struct MemberGlobs {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl MemberGlobs {
    /// `!`-prefixed entries in `patterns` count as exclusions too.
    fn new(patterns: &[String], exclusions: &[String]) -> Self {
        let mut globs = Self {
            include: Vec::new(),
            exclude: exclusions.iter().filter_map(|p| compile(p)).collect(),
        };
        for pattern in patterns {
            match pattern.strip_prefix('!') {
                Some(negated) => globs.exclude.extend(compile(negated)),
                None => globs.include.extend(compile(pattern)),
            }
        }
        globs
    }

    fn selects(&self, rel: &Path) -> bool {
        let hit = |set: &[Pattern]| set.iter().any(|p| p.matches_path_with(rel, MATCH_OPTIONS));
        hit(&self.include) && !hit(&self.exclude)
    }
}

fn compile(pattern: &str) -> Option<Pattern> {
    // Members are listed as "crates/*" or "./crates/*"
    let trimmed = pattern.trim().trim_start_matches("./").trim_end_matches('/');
    Pattern::new(trimmed)
        .inspect_err(|e| warn!(pattern, error = %e, "Ignoring invalid member pattern"))
        .ok()
}

fn is_pruned(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| PRUNED_DIRS.contains(&name))
}

/// Expand workspace member globs into the directories they select.
///
/// Patterns are relative to `root`. Entries in `patterns` starting with `!`
/// and every entry in `exclusions` remove directories from the result.
/// Directories named in [`PRUNED_DIRS`] are never entered.
///
/// Returns absolute paths under `root`, sorted and deduplicated.
///
/// # Errors
///
/// Currently infallible; invalid patterns are skipped with a warning.
pub fn resolve_glob_patterns(
    root: &Path,
    patterns: &[String],
    exclusions: &[String],
) -> Result<Vec<PathBuf>> {
    let globs = MemberGlobs::new(patterns, exclusions);
    if globs.include.is_empty() {
        return Ok(Vec::new());
    }

    let members: BTreeSet<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !is_pruned(entry))
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .filter(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .is_ok_and(|rel| globs.selects(rel))
        })
        .map(DirEntry::into_path)
        .collect();

    Ok(members.into_iter().collect())
}

fn read_manifest<T>(
    path: &Path,
    operation: &str,
    parse: impl FnOnce(&str) -> Result<T>,
) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|source| Error::Io {
        source,
        path: Some(path.to_path_buf()),
        operation: operation.to_string(),
    })?;
    parse(&content)
}

/// Read and deserialize a JSON manifest.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file is unreadable, [`Error::Json`] if it
/// does not parse.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    read_manifest(path, "reading json manifest", |content| {
        serde_json::from_str(content).map_err(|source| Error::Json {
            source,
            path: Some(path.to_path_buf()),
        })
    })
}

/// Read and deserialize a TOML manifest.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file is unreadable, [`Error::Toml`] if it
/// does not parse.
pub fn read_toml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    read_manifest(path, "reading toml manifest", |content| {
        toml::from_str(content).map_err(|source| Error::Toml {
            source,
            path: Some(path.to_path_buf()),
        })
    })
}

/// `path` relative to `root`, normalized so that the root itself is `.`.
#[must_use]
pub fn relative_path(root: &Path, path: &Path) -> PathBuf {
    paths::normalize(path.strip_prefix(root).unwrap_or(path))
}

/// Root-relative paths of the `candidates` that exist as directories in `module_dir`.
#[must_use]
pub fn existing_subdirs(root: &Path, module_dir: &Path, candidates: &[&str]) -> Vec<PathBuf> {
    candidates
        .iter()
        .map(|candidate| module_dir.join(candidate))
        .filter(|dir| dir.is_dir())
        .map(|dir| relative_path(root, &dir))
        .collect()
}
