//! PRISTINE table row: the checksum record backing a content-addressed
//! blob in the pristine store, independent of which BASE/WORKING rows
//! reference it.

use crate::checksum::{Md5, Sha1};
use crate::error::{wc_db_error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PristineRow {
    pub sha1: Sha1,
    pub md5: Option<Md5>,
    pub size: i64,
}

impl PristineRow {
    pub fn from_row(row: &turso::Row) -> Result<Self> {
        let sha1_str: String = row.get(0).map_err(|e| wc_db_error("parse pristine.sha1", e))?;
        let md5_str: Option<String> = row.get(1).map_err(|e| wc_db_error("parse pristine.md5", e))?;

        Ok(Self {
            sha1: sha1_str.parse().map_err(|e| wc_db_error("parse pristine.sha1 hex", e))?,
            md5: md5_str
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| wc_db_error("parse pristine.md5 hex", e))?,
            size: row.get(2).map_err(|e| wc_db_error("parse pristine.size", e))?,
        })
    }
}
