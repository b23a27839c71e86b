//! ACTUAL table row: per-path notes that don't belong in BASE or WORKING —
//! property overlay, text/property conflict markers, and a changelist tag.
//! Tree conflicts are tracked separately in `tree_conflict`.

use crate::error::{wc_db_error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActualNode {
    pub wcid: i64,
    pub relpath: String,
    pub properties: Option<String>,
    pub changelist: Option<String>,
    pub conflict_old: Option<String>,
    pub conflict_new: Option<String>,
    pub conflict_working: Option<String>,
    pub prop_reject: Option<String>,
}

impl ActualNode {
    pub fn from_row(row: &turso::Row) -> Result<Self> {
        Ok(Self {
            wcid: row.get(0).map_err(|e| wc_db_error("parse actual_node.wcid", e))?,
            relpath: row.get(1).map_err(|e| wc_db_error("parse actual_node.relpath", e))?,
            properties: row
                .get(2)
                .map_err(|e| wc_db_error("parse actual_node.properties", e))?,
            changelist: row
                .get(3)
                .map_err(|e| wc_db_error("parse actual_node.changelist", e))?,
            conflict_old: row
                .get(4)
                .map_err(|e| wc_db_error("parse actual_node.conflict_old", e))?,
            conflict_new: row
                .get(5)
                .map_err(|e| wc_db_error("parse actual_node.conflict_new", e))?,
            conflict_working: row
                .get(6)
                .map_err(|e| wc_db_error("parse actual_node.conflict_working", e))?,
            prop_reject: row
                .get(7)
                .map_err(|e| wc_db_error("parse actual_node.prop_reject", e))?,
        })
    }

    pub fn has_text_conflict(&self) -> bool {
        self.conflict_old.is_some() || self.conflict_new.is_some() || self.conflict_working.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_none()
            && self.changelist.is_none()
            && self.conflict_old.is_none()
            && self.conflict_new.is_none()
            && self.conflict_working.is_none()
            && self.prop_reject.is_none()
    }
}
