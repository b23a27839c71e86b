//! REPOSITORY table row: unique (root URL, UUID) pairs, assigned a small
//! integer repos-id.

use crate::error::{wc_db_error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    pub id: i64,
    pub root_url: String,
    pub uuid: String,
}

impl Repository {
    pub fn from_row(row: &turso::Row) -> Result<Self> {
        Ok(Self {
            id: row.get::<i64>(0).map_err(|e| wc_db_error("parse repository.id", e))?,
            root_url: row
                .get::<String>(1)
                .map_err(|e| wc_db_error("parse repository.root_url", e))?,
            uuid: row.get::<String>(2).map_err(|e| wc_db_error("parse repository.uuid", e))?,
        })
    }
}
