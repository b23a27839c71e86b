//! Canonical path kinds: [`Dirent`] (a platform path to a file on this
//! host), [`Relpath`] (a rooted-nowhere, slash-separated path), and [`Uri`]
//! (an absolute URI with a canonical path component). The three are never
//! interchangeable without an explicit conversion.

mod dirent;
mod relpath;
mod uri;

pub use dirent::Dirent;
pub use relpath::Relpath;
pub use uri::Uri;

use crate::error::{ErrorKind, Result, WcError};
use std::path::{Path, PathBuf};

/// Resolves `untrusted_relpath` against `base_dirent`, rejecting any
/// resolution that would traverse out of `base_dirent` — including via a
/// symlink encountered mid-traversal. Returns `None` rather than ever
/// returning a path outside the root.
///
/// The patch engine calls this before opening any target file.
pub fn is_under_root(base_dirent: &Path, untrusted_relpath: &Relpath) -> Option<PathBuf> {
    let base = dunce_canonical(base_dirent)?;
    let mut resolved = base.clone();

    for component in untrusted_relpath.components() {
        if component == ".." || component == "." || component.is_empty() {
            return None;
        }
        resolved.push(component);
        // If an intermediate component already exists on disk, canonicalize
        // it so a symlink can't smuggle us outside `base` at any step.
        if resolved.exists() {
            let canon = match resolved.canonicalize() {
                Ok(c) => c,
                Err(_) => return None,
            };
            if !canon.starts_with(&base) {
                return None;
            }
        }
    }

    if !resolved.starts_with(&base) {
        return None;
    }
    Some(resolved)
}

fn dunce_canonical(p: &Path) -> Option<PathBuf> {
    p.canonicalize().ok()
}

/// Fails with `bad-filename` when the resolved target would escape
/// `base_dirent`. Used by callers (e.g. the patch engine's target
/// resolution) that want a `Result` instead of an `Option`.
pub fn require_under_root(base_dirent: &Path, untrusted_relpath: &Relpath) -> Result<PathBuf> {
    is_under_root(base_dirent, untrusted_relpath).ok_or_else(|| {
        WcError::new(
            ErrorKind::BadFilename,
            "path resolves outside the working copy root",
        )
        .with_path(untrusted_relpath.as_str())
    })
}
