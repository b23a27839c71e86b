//! Target resolution: turns a parsed patch's `new-filename` into an
//! absolute path inside the working copy, or a reason to skip it.

use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Result, WcError};
use crate::path::{require_under_root, Dirent, Relpath};
use crate::wc::actual;
use crate::wc::types::NodeKind;
use crate::wc::WorkingCopyDb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyFilename,
    Unversioned,
    MissingOnDisk,
    ObstructedByNonFile,
    IsDirectory,
    PathEscapesRoot,
}

#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub relpath: Relpath,
    pub abspath: PathBuf,
    pub exists_on_disk: bool,
}

#[derive(Debug, Clone)]
pub enum TargetResolution {
    Resolved(ResolvedTarget),
    Skip(SkipReason),
}

/// Resolves `new_filename` per the target-resolution procedure: strip
/// leading path components, resolve securely against `wc_root`, then
/// consult WCDB status.
pub async fn resolve_target(
    wc: &WorkingCopyDb,
    wc_root: &Path,
    new_filename: &str,
    strip_count: u32,
) -> Result<TargetResolution> {
    if new_filename.is_empty() {
        return Ok(TargetResolution::Skip(SkipReason::EmptyFilename));
    }

    let canonical = Dirent::canonicalize(new_filename);
    let mut components: Vec<&str> = canonical.as_str().split('/').filter(|s| !s.is_empty()).collect();
    if (strip_count as usize) > components.len() {
        return Err(WcError::new(
            ErrorKind::ClientPatchBadStripCount,
            format!("strip count {strip_count} exceeds {} path component(s) in {new_filename:?}", components.len()),
        ));
    }
    components.drain(0..strip_count as usize);

    let Some(relpath) = Relpath::canonicalize(&components.join("/")) else {
        return Ok(TargetResolution::Skip(SkipReason::PathEscapesRoot));
    };

    let Ok(abspath) = require_under_root(wc_root, &relpath) else {
        return Ok(TargetResolution::Skip(SkipReason::PathEscapesRoot));
    };

    let exists_on_disk = abspath.exists();

    let info = match actual::read_info(wc, relpath.as_str()).await {
        Ok(info) => Some(info),
        Err(e) if e.kind() == ErrorKind::PathNotFound => None,
        Err(e) => return Err(e),
    };

    let Some(info) = info else {
        return Ok(TargetResolution::Skip(SkipReason::Unversioned));
    };

    if info.kind == NodeKind::Directory {
        return Ok(TargetResolution::Skip(SkipReason::IsDirectory));
    }

    if !exists_on_disk {
        return Ok(TargetResolution::Skip(SkipReason::MissingOnDisk));
    }

    if abspath.is_dir() {
        return Ok(TargetResolution::Skip(SkipReason::ObstructedByNonFile));
    }

    Ok(TargetResolution::Resolved(ResolvedTarget { relpath, abspath, exists_on_disk }))
}

/// Resolution for a hunk whose `original-start == 0` (file creation): the
/// target need not exist in WCDB or on disk yet, only its parent must
/// resolve securely.
pub fn resolve_creation_target(wc_root: &Path, new_filename: &str, strip_count: u32) -> Result<TargetResolution> {
    if new_filename.is_empty() {
        return Ok(TargetResolution::Skip(SkipReason::EmptyFilename));
    }
    let canonical = Dirent::canonicalize(new_filename);
    let mut components: Vec<&str> = canonical.as_str().split('/').filter(|s| !s.is_empty()).collect();
    if (strip_count as usize) > components.len() {
        return Err(WcError::new(
            ErrorKind::ClientPatchBadStripCount,
            format!("strip count {strip_count} exceeds {} path component(s) in {new_filename:?}", components.len()),
        ));
    }
    components.drain(0..strip_count as usize);
    let Some(relpath) = Relpath::canonicalize(&components.join("/")) else {
        return Ok(TargetResolution::Skip(SkipReason::PathEscapesRoot));
    };
    let Ok(abspath) = require_under_root(wc_root, &relpath) else {
        return Ok(TargetResolution::Skip(SkipReason::PathEscapesRoot));
    };
    let exists_on_disk = abspath.exists();
    Ok(TargetResolution::Resolved(ResolvedTarget { relpath, abspath, exists_on_disk }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filename_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let res = resolve_creation_target(dir.path(), "", 0).unwrap();
        assert!(matches!(res, TargetResolution::Skip(SkipReason::EmptyFilename)));
    }

    #[test]
    fn strip_count_exceeding_components_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_creation_target(dir.path(), "a/b.txt", 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClientPatchBadStripCount);
    }

    #[test]
    fn strips_leading_components() {
        let dir = tempfile::tempdir().unwrap();
        let res = resolve_creation_target(dir.path(), "a/b/c.txt", 2).unwrap();
        match res {
            TargetResolution::Resolved(t) => assert_eq!(t.relpath.as_str(), "c.txt"),
            other => panic!("expected Resolved, got {other:?}"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn symlink_escape_is_skipped() {
        let outside = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("escape")).unwrap();
        let res = resolve_creation_target(dir.path(), "escape/evil.txt", 0).unwrap();
        assert!(matches!(res, TargetResolution::Skip(SkipReason::PathEscapesRoot)));
    }
}
