//! Resolution of request paths under the catalog root.
//!
//! Resolution is lexical: the requested path may only descend. Absolute
//! paths and `..` components are refused rather than normalised away.
//! Symlinks inside the catalog are followed as-is.

use std::path::{Component, Path, PathBuf};

use ota_common::{AppError, AppResult};

pub fn resolve(root: &Path, requested: &str) -> AppResult<PathBuf> {
    let mut resolved = root.to_path_buf();
    for component in Path::new(requested).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(AppError::PathEscape(requested.to_string()));
            }
        }
    }
    Ok(resolved)
}
