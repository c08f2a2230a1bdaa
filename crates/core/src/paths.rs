//! Normalization of module paths relative to the project root.

use serde::Serializer;
use std::path::{Component, Path, PathBuf};

/// The project root as a relative path.
pub const ROOT: &str = ".";

/// Normalize a relative module path.
///
/// `./` prefixes and empty components are removed; an empty result becomes
/// `.`. Parent components are kept as-is since providers only report paths
/// below the root.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let normalized: PathBuf = path
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect();

    if normalized.as_os_str().is_empty() {
        PathBuf::from(ROOT)
    } else {
        normalized
    }
}

/// Whether the path denotes the project root.
#[must_use]
pub fn is_root(path: &Path) -> bool {
    normalize(path) == Path::new(ROOT)
}

/// Stable, `/`-separated string form of a normalized path.
///
/// Used for grouping and for messages so that output does not depend on the
/// host separator.
#[must_use]
pub fn key(path: &Path) -> String {
    let normalized = normalize(path);
    normalized
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Last component of a path, if it has one.
#[must_use]
pub fn last_component(path: &Path) -> Option<String> {
    normalize(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// Serialize a path in its [`key`] form, so persisted artifacts use `/` on
/// every platform.
///
/// # Errors
///
/// Propagates the serializer's error.
pub fn serialize<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&key(path))
}

/// [`serialize`] for a list of paths.
///
/// # Errors
///
/// Propagates the serializer's error.
pub fn serialize_all<S: Serializer>(paths: &[PathBuf], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(paths.iter().map(|path| key(path)))
}
