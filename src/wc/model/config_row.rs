//! `wc_config` table row: a `(configuration, name, key) -> value` tuple
//! scoped to one working copy (`wcid`), mirroring the
//! `configuration/name/key/value` shape used for repository-level config.

use crate::error::{wc_db_error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigRow {
    pub id: i64,
    pub wcid: i64,
    pub configuration: String,
    pub name: Option<String>,
    pub key: String,
    pub value: String,
}

impl ConfigRow {
    pub fn from_row(row: &turso::Row) -> Result<Self> {
        Ok(Self {
            id: row.get::<i64>(0).map_err(|e| wc_db_error("parse wc_config.id", e))?,
            wcid: row.get::<i64>(1).map_err(|e| wc_db_error("parse wc_config.wcid", e))?,
            configuration: row
                .get::<String>(2)
                .map_err(|e| wc_db_error("parse wc_config.configuration", e))?,
            name: row.get::<Option<String>>(3).map_err(|e| wc_db_error("parse wc_config.name", e))?,
            key: row.get::<String>(4).map_err(|e| wc_db_error("parse wc_config.key", e))?,
            value: row.get::<String>(5).map_err(|e| wc_db_error("parse wc_config.value", e))?,
        })
    }
}
