//! Contains various `std::fs` wrapper functions that also contain the target path in their errors.

use crate::errors::FsPathError;
use serde::de::DeserializeOwned;
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

/// The result type for operations that can fail with [`FsPathError`].
pub type Result<T> = std::result::Result<T, FsPathError>;

/// Wrapper for [`fs::read_to_string`].
pub fn read_to_string(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|err| FsPathError::read(err, path))
}

/// Reads the JSON file and deserialize it into the provided type.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let s = read_to_string(path)?;
    serde_json::from_str(&s).map_err(|source| FsPathError::read_json(source, path))
}

/// Turns `path` into a relative path that cannot escape the directory it is later joined onto.
///
/// Root, prefix, `.` and `..` components are dropped.
pub fn sanitize_relative(path: impl AsRef<Path>) -> PathBuf {
    path.as_ref()
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            Component::Prefix(_)
            | Component::RootDir
            | Component::CurDir
            | Component::ParentDir => None,
        })
        .collect()
}
