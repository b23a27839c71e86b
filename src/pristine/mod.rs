//! Content-addressed pristine store: files named by the lowercase hex of
//! their SHA-1, sharded by the first two hex characters, with
//! install-by-rename and reference-counted lifetime managed by WCDB rows.
//!
//! Layout: `<wc-root>/<admin-dir>/pristine/<xx>/<sha1>`. Files are
//! read-only regular files, grounded on the fan-out directory scheme in
//! `storage/local.rs`'s `transform_path`/`get_obj_path`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::checksum::Sha1;
use crate::error::{ErrorKind, Result, WcError};

pub struct PristineStore {
    root: PathBuf,
}

/// Present/absent agreement check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
}

impl PristineStore {
    pub fn new(admin_dir: &Path) -> Self {
        Self { root: admin_dir.join("pristine") }
    }

    fn path_for(&self, sha1: Sha1) -> PathBuf {
        self.root.join(sha1.shard()).join(sha1.to_hex())
    }

    /// Atomically renames `tempfile` into the store at `sha1`'s path. If the
    /// target already exists, the rename is still performed — the bytes are
    /// identical by definition — so this is idempotent at the filesystem
    /// level.
    pub fn install(&self, tempfile: &Path, sha1: Sha1) -> Result<()> {
        let dest = self.path_for(sha1);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(&dest, e))?;
        }
        fs::rename(tempfile, &dest).map_err(|e| io_err(&dest, e))?;
        let mut perms = fs::metadata(&dest).map_err(|e| io_err(&dest, e))?.permissions();
        perms.set_readonly(true);
        fs::set_permissions(&dest, perms).map_err(|e| io_err(&dest, e))?;
        Ok(())
    }

    /// Opens the pristine for read; fails `path-not-found` if the file is
    /// missing on disk (the WCDB row existence is checked by the caller).
    pub fn read(&self, sha1: Sha1) -> Result<fs::File> {
        let path = self.path_for(sha1);
        fs::File::open(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                WcError::new(ErrorKind::PathNotFound, "pristine file not found").with_path(path)
            } else {
                io_err(&path, e)
            }
        })
    }

    /// Whether the file exists on disk for `sha1`.
    pub fn file_exists(&self, sha1: Sha1) -> bool {
        self.path_for(sha1).is_file()
    }

    /// Removes the file for `sha1` from disk. Callers must have already
    /// confirmed no WCDB row references it (see `wc::pristine::remove`,
    /// which is the only caller that should invoke this).
    pub fn remove_file(&self, sha1: Sha1) -> Result<()> {
        let path = self.path_for(sha1);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&path, e)),
        }
    }

    pub fn path_of(&self, sha1: Sha1) -> PathBuf {
        self.path_for(sha1)
    }
}

fn io_err(path: &Path, source: io::Error) -> WcError {
    WcError::new(ErrorKind::IoWriteError, "pristine store I/O error")
        .with_path(path)
        .with_cause(source)
}
