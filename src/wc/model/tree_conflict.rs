//! TREE_CONFLICT table row: one row per conflicted child, keyed by the
//! parent directory and the child's name.

use crate::error::{wc_db_error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeConflict {
    pub wcid: i64,
    pub parent_relpath: String,
    pub child_name: String,
    pub description: String,
}

impl TreeConflict {
    pub fn from_row(row: &turso::Row) -> Result<Self> {
        Ok(Self {
            wcid: row.get(0).map_err(|e| wc_db_error("parse tree_conflict.wcid", e))?,
            parent_relpath: row
                .get(1)
                .map_err(|e| wc_db_error("parse tree_conflict.parent_relpath", e))?,
            child_name: row
                .get(2)
                .map_err(|e| wc_db_error("parse tree_conflict.child_name", e))?,
            description: row
                .get(3)
                .map_err(|e| wc_db_error("parse tree_conflict.description", e))?,
        })
    }

    pub fn child_relpath(&self) -> String {
        if self.parent_relpath.is_empty() {
            self.child_name.clone()
        } else {
            format!("{}/{}", self.parent_relpath, self.child_name)
        }
    }
}
