//! BASE table row: the node as last synchronized with the remote
//! repository.

use crate::checksum::Sha1;
use crate::error::{wc_db_error, Result};
use crate::wc::model::corrupt;
use crate::wc::types::{BaseStatus, Depth, NodeKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseNode {
    pub wcid: i64,
    pub relpath: String,
    pub parent_relpath: Option<String>,
    pub status: BaseStatus,
    pub kind: NodeKind,
    pub revision: Option<i64>,
    pub repos_id: Option<i64>,
    pub repos_relpath: Option<String>,
    pub changed_rev: Option<i64>,
    pub changed_date: Option<i64>,
    pub changed_author: Option<String>,
    pub depth: Option<Depth>,
    pub checksum: Option<Sha1>,
    pub symlink_target: Option<String>,
    pub dav_cache: Option<String>,
    pub lock_token: Option<String>,
    pub lock_owner: Option<String>,
    pub lock_comment: Option<String>,
    pub lock_date: Option<i64>,
    pub last_mod_time: Option<i64>,
    pub translated_size: Option<i64>,
}

impl BaseNode {
    pub fn from_row(row: &turso::Row) -> Result<Self> {
        let status_str: String =
            row.get(3).map_err(|e| wc_db_error("parse base_node.status", e))?;
        let kind_str: String = row.get(4).map_err(|e| wc_db_error("parse base_node.kind", e))?;
        let depth_str: Option<String> =
            row.get(11).map_err(|e| wc_db_error("parse base_node.depth", e))?;
        let checksum_str: Option<String> =
            row.get(12).map_err(|e| wc_db_error("parse base_node.checksum", e))?;

        Ok(Self {
            wcid: row.get(0).map_err(|e| wc_db_error("parse base_node.wcid", e))?,
            relpath: row.get(1).map_err(|e| wc_db_error("parse base_node.relpath", e))?,
            parent_relpath: row
                .get(2)
                .map_err(|e| wc_db_error("parse base_node.parent_relpath", e))?,
            status: status_str.parse().map_err(corrupt)?,
            kind: kind_str.parse().map_err(corrupt)?,
            revision: row.get(5).map_err(|e| wc_db_error("parse base_node.revision", e))?,
            repos_id: row.get(6).map_err(|e| wc_db_error("parse base_node.repos_id", e))?,
            repos_relpath: row
                .get(7)
                .map_err(|e| wc_db_error("parse base_node.repos_relpath", e))?,
            changed_rev: row.get(8).map_err(|e| wc_db_error("parse base_node.changed_rev", e))?,
            changed_date: row
                .get(9)
                .map_err(|e| wc_db_error("parse base_node.changed_date", e))?,
            changed_author: row
                .get(10)
                .map_err(|e| wc_db_error("parse base_node.changed_author", e))?,
            depth: depth_str.map(|s| s.parse()).transpose().map_err(corrupt)?,
            checksum: checksum_str
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| wc_db_error("parse base_node.checksum hex", e))?,
            symlink_target: row
                .get(13)
                .map_err(|e| wc_db_error("parse base_node.symlink_target", e))?,
            dav_cache: row.get(14).map_err(|e| wc_db_error("parse base_node.dav_cache", e))?,
            lock_token: row.get(15).map_err(|e| wc_db_error("parse base_node.lock_token", e))?,
            lock_owner: row.get(16).map_err(|e| wc_db_error("parse base_node.lock_owner", e))?,
            lock_comment: row
                .get(17)
                .map_err(|e| wc_db_error("parse base_node.lock_comment", e))?,
            lock_date: row.get(18).map_err(|e| wc_db_error("parse base_node.lock_date", e))?,
            last_mod_time: row
                .get(19)
                .map_err(|e| wc_db_error("parse base_node.last_mod_time", e))?,
            translated_size: row
                .get(20)
                .map_err(|e| wc_db_error("parse base_node.translated_size", e))?,
        })
    }
}
