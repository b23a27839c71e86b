//! WC_LOCK table row: one row per held lock, recursive locks covering a
//! subtree by depth rather than one row per descendant.

use crate::error::{wc_db_error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WcLock {
    pub wcid: i64,
    pub relpath: String,
    pub depth: i64,
    pub owner: String,
}

impl WcLock {
    pub fn from_row(row: &turso::Row) -> Result<Self> {
        Ok(Self {
            wcid: row.get(0).map_err(|e| wc_db_error("parse wc_lock.wcid", e))?,
            relpath: row.get(1).map_err(|e| wc_db_error("parse wc_lock.relpath", e))?,
            depth: row.get(2).map_err(|e| wc_db_error("parse wc_lock.depth", e))?,
            owner: row.get(3).map_err(|e| wc_db_error("parse wc_lock.owner", e))?,
        })
    }

    /// True when `relpath` falls at or under this lock's subtree. A depth
    /// of -1 (infinite) covers every descendant; any other depth covers
    /// only the locked path itself.
    pub fn covers(&self, relpath: &str) -> bool {
        if relpath == self.relpath {
            return true;
        }
        if self.depth != -1 {
            return false;
        }
        if self.relpath.is_empty() {
            return !relpath.is_empty();
        }
        relpath
            .strip_prefix(&self.relpath)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}
