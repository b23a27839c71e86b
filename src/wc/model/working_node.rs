//! WORKING table row: a local add/copy/move/replacement/deletion overlay
//! not yet committed.

use crate::checksum::Sha1;
use crate::error::{wc_db_error, Result};
use crate::wc::model::corrupt;
use crate::wc::types::{NodeKind, WorkingPresence};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkingNode {
    pub wcid: i64,
    pub relpath: String,
    pub parent_relpath: Option<String>,
    pub presence: WorkingPresence,
    pub kind: NodeKind,
    pub checksum: Option<Sha1>,
    pub symlink_target: Option<String>,
    pub copyfrom_repos_id: Option<i64>,
    pub copyfrom_relpath: Option<String>,
    pub copyfrom_revision: Option<i64>,
    pub moved_here: bool,
}

impl WorkingNode {
    pub fn from_row(row: &turso::Row) -> Result<Self> {
        let presence_str: String =
            row.get(3).map_err(|e| wc_db_error("parse working_node.presence", e))?;
        let kind_str: String = row.get(4).map_err(|e| wc_db_error("parse working_node.kind", e))?;
        let checksum_str: Option<String> =
            row.get(5).map_err(|e| wc_db_error("parse working_node.checksum", e))?;
        let moved_here: i64 =
            row.get(10).map_err(|e| wc_db_error("parse working_node.moved_here", e))?;

        Ok(Self {
            wcid: row.get(0).map_err(|e| wc_db_error("parse working_node.wcid", e))?,
            relpath: row.get(1).map_err(|e| wc_db_error("parse working_node.relpath", e))?,
            parent_relpath: row
                .get(2)
                .map_err(|e| wc_db_error("parse working_node.parent_relpath", e))?,
            presence: presence_str.parse().map_err(corrupt)?,
            kind: kind_str.parse().map_err(corrupt)?,
            checksum: checksum_str
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| wc_db_error("parse working_node.checksum hex", e))?,
            symlink_target: row
                .get(6)
                .map_err(|e| wc_db_error("parse working_node.symlink_target", e))?,
            copyfrom_repos_id: row
                .get(7)
                .map_err(|e| wc_db_error("parse working_node.copyfrom_repos_id", e))?,
            copyfrom_relpath: row
                .get(8)
                .map_err(|e| wc_db_error("parse working_node.copyfrom_relpath", e))?,
            copyfrom_revision: row
                .get(9)
                .map_err(|e| wc_db_error("parse working_node.copyfrom_revision", e))?,
            moved_here: moved_here != 0,
        })
    }

    pub fn is_copy(&self) -> bool {
        self.copyfrom_relpath.is_some()
    }
}
