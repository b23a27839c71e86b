//! WORK_QUEUE table row: a serialized, not-yet-completed post-transaction
//! action, processed in insertion order.

use crate::error::{wc_db_error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItemRow {
    pub id: i64,
    pub wcid: i64,
    pub work: String,
}

impl WorkItemRow {
    pub fn from_row(row: &turso::Row) -> Result<Self> {
        Ok(Self {
            id: row.get(0).map_err(|e| wc_db_error("parse work_queue.id", e))?,
            wcid: row.get(1).map_err(|e| wc_db_error("parse work_queue.wcid", e))?,
            work: row.get(2).map_err(|e| wc_db_error("parse work_queue.work", e))?,
        })
    }
}
