//! Per-working-copy configuration (`wc_config`): settings that govern how
//! the engine treats a node but are not themselves part of the versioned
//! tree — the `miscellany` `eol-style`/`keywords` defaults consulted when a
//! target carries no recorded properties, and `auto-props` patterns.
//!
//! Follows the same `_with_conn` transaction-safety split as every other
//! WCDB module: `get`/`set` open their own connection for standalone calls;
//! `*_with_conn` variants take an existing `&DbConnection` and are the ones
//! to call from inside a `db.transaction(|txn| { .. })` closure.

use crate::error::{wc_db_error, ErrorKind, Result, WcError};
use crate::translate::EolStyle;
use crate::wc::db::DbConnection;
use crate::wc::model::ConfigRow;

pub struct Config;

const MISCELLANY: &str = "miscellany";
const AUTO_PROPS: &str = "auto-props";

impl Config {
    pub async fn get_with_conn(
        db: &DbConnection,
        wcid: i64,
        configuration: &str,
        name: Option<&str>,
        key: &str,
    ) -> Result<Option<ConfigRow>> {
        let mut rows = match name {
            Some(n) => {
                db.query(
                    "SELECT id, wcid, configuration, name, key, value FROM wc_config \
                     WHERE wcid = ?1 AND configuration = ?2 AND name = ?3 AND key = ?4",
                    (wcid, configuration, n, key),
                )
                .await?
            }
            None => {
                db.query(
                    "SELECT id, wcid, configuration, name, key, value FROM wc_config \
                     WHERE wcid = ?1 AND configuration = ?2 AND name IS NULL AND key = ?3",
                    (wcid, configuration, key),
                )
                .await?
            }
        };
        match rows.next().await.map_err(|e| wc_db_error("select wc_config", e))? {
            Some(row) => Ok(Some(ConfigRow::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Insert-or-update the `(configuration, name, key)` entry, returning
    /// the row as stored.
    pub async fn set_with_conn(
        db: &DbConnection,
        wcid: i64,
        configuration: &str,
        name: Option<&str>,
        key: &str,
        value: &str,
    ) -> Result<ConfigRow> {
        if Self::get_with_conn(db, wcid, configuration, name, key).await?.is_some() {
            match name {
                Some(n) => {
                    db.execute(
                        "UPDATE wc_config SET value = ?5 WHERE wcid = ?1 AND configuration = ?2 AND name = ?3 AND key = ?4",
                        (wcid, configuration, n, key, value),
                    )
                    .await?;
                }
                None => {
                    db.execute(
                        "UPDATE wc_config SET value = ?4 WHERE wcid = ?1 AND configuration = ?2 AND name IS NULL AND key = ?3",
                        (wcid, configuration, key, value),
                    )
                    .await?;
                }
            }
        } else {
            db.execute(
                "INSERT INTO wc_config (wcid, configuration, name, key, value) VALUES (?1, ?2, ?3, ?4, ?5)",
                (wcid, configuration, name, key, value),
            )
            .await?;
        }
        Self::get_with_conn(db, wcid, configuration, name, key)
            .await?
            .ok_or_else(|| WcError::new(ErrorKind::WcDbError, "wc_config row missing immediately after write"))
    }

    pub async fn remove_with_conn(
        db: &DbConnection,
        wcid: i64,
        configuration: &str,
        name: Option<&str>,
        key: &str,
    ) -> Result<()> {
        match name {
            Some(n) => {
                db.execute(
                    "DELETE FROM wc_config WHERE wcid = ?1 AND configuration = ?2 AND name = ?3 AND key = ?4",
                    (wcid, configuration, n, key),
                )
                .await?;
            }
            None => {
                db.execute(
                    "DELETE FROM wc_config WHERE wcid = ?1 AND configuration = ?2 AND name IS NULL AND key = ?3",
                    (wcid, configuration, key),
                )
                .await?;
            }
        }
        Ok(())
    }

    pub async fn list_all_with_conn(db: &DbConnection, wcid: i64, configuration: &str) -> Result<Vec<ConfigRow>> {
        let mut rows = db
            .query(
                "SELECT id, wcid, configuration, name, key, value FROM wc_config WHERE wcid = ?1 AND configuration = ?2",
                (wcid, configuration),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| wc_db_error("select wc_config", e))? {
            out.push(ConfigRow::from_row(&row)?);
        }
        Ok(out)
    }

    /// The configured `eol-style` default, or `EolStyle::None` if unset.
    pub async fn eol_style_with_conn(db: &DbConnection, wcid: i64) -> Result<EolStyle> {
        match Self::get_with_conn(db, wcid, MISCELLANY, None, "eol-style").await? {
            Some(row) => parse_eol_style(&row.value),
            None => Ok(EolStyle::None),
        }
    }

    /// Auto-props patterns, as `(glob, property_list)` pairs in insertion
    /// order (`key` is the glob, `value` is a `;`-separated property list,
    /// matching the format `auto-props` entries use in practice).
    pub async fn auto_props_with_conn(db: &DbConnection, wcid: i64) -> Result<Vec<(String, String)>> {
        Ok(Self::list_all_with_conn(db, wcid, AUTO_PROPS)
            .await?
            .into_iter()
            .map(|row| (row.key, row.value))
            .collect())
    }

    pub async fn get(db: &DbConnection, wcid: i64, configuration: &str, name: Option<&str>, key: &str) -> Result<Option<ConfigRow>> {
        Self::get_with_conn(db, wcid, configuration, name, key).await
    }

    pub async fn set(db: &DbConnection, wcid: i64, configuration: &str, name: Option<&str>, key: &str, value: &str) -> Result<ConfigRow> {
        Self::set_with_conn(db, wcid, configuration, name, key, value).await
    }

    pub async fn remove(db: &DbConnection, wcid: i64, configuration: &str, name: Option<&str>, key: &str) -> Result<()> {
        Self::remove_with_conn(db, wcid, configuration, name, key).await
    }

    pub async fn eol_style(db: &DbConnection, wcid: i64) -> Result<EolStyle> {
        Self::eol_style_with_conn(db, wcid).await
    }

    pub async fn auto_props(db: &DbConnection, wcid: i64) -> Result<Vec<(String, String)>> {
        Self::auto_props_with_conn(db, wcid).await
    }
}

fn parse_eol_style(value: &str) -> Result<EolStyle> {
    match value {
        "none" => Ok(EolStyle::None),
        "native" => Ok(EolStyle::Native),
        "LF" => Ok(EolStyle::FixedLf),
        "CR" => Ok(EolStyle::FixedCr),
        "CRLF" => Ok(EolStyle::FixedCrLf),
        other => Err(WcError::new(ErrorKind::IncorrectParams, format!("unrecognized eol-style: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[tokio::test]
    async fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let db = DbConnection::create(&dir.path().join("wc.db")).await.unwrap();
        Config::set(&db, 1, MISCELLANY, None, "eol-style", "native").await.unwrap();
        let row = Config::get(&db, 1, MISCELLANY, None, "eol-style").await.unwrap().unwrap();
        assert_eq!(row.value, "native");
    }

    #[tokio::test]
    async fn set_is_idempotent_update_not_duplicate_insert() {
        let dir = tempfile::tempdir().unwrap();
        let db = DbConnection::create(&dir.path().join("wc.db")).await.unwrap();
        Config::set(&db, 1, MISCELLANY, None, "eol-style", "LF").await.unwrap();
        Config::set(&db, 1, MISCELLANY, None, "eol-style", "CRLF").await.unwrap();
        let all = Config::list_all_with_conn(&db, 1, MISCELLANY).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value, "CRLF");
    }

    #[tokio::test]
    async fn eol_style_defaults_to_none_when_unset() {
        let dir = tempfile::tempdir().unwrap();
        let db = DbConnection::create(&dir.path().join("wc.db")).await.unwrap();
        assert_eq!(Config::eol_style(&db, 1).await.unwrap(), EolStyle::None);
    }

    #[tokio::test]
    async fn eol_style_rejects_unrecognized_value() {
        let dir = tempfile::tempdir().unwrap();
        let db = DbConnection::create(&dir.path().join("wc.db")).await.unwrap();
        Config::set(&db, 1, MISCELLANY, None, "eol-style", "bogus").await.unwrap();
        assert!(Config::eol_style(&db, 1).await.is_err());
    }

    #[tokio::test]
    async fn auto_props_lists_glob_to_property_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let db = DbConnection::create(&dir.path().join("wc.db")).await.unwrap();
        Config::set(&db, 1, AUTO_PROPS, None, "*.txt", "eol-style=native").await.unwrap();
        Config::set(&db, 1, AUTO_PROPS, None, "*.bin", "svn:mime-type=application/octet-stream").await.unwrap();
        let props = Config::auto_props(&db, 1).await.unwrap();
        assert_eq!(props.len(), 2);
        assert!(props.iter().any(|(glob, _)| glob == "*.txt"));
    }

    #[tokio::test]
    async fn entries_are_scoped_per_working_copy() {
        let dir = tempfile::tempdir().unwrap();
        let db = DbConnection::create(&dir.path().join("wc.db")).await.unwrap();
        Config::set(&db, 1, MISCELLANY, None, "eol-style", "LF").await.unwrap();
        assert!(Config::get(&db, 2, MISCELLANY, None, "eol-style").await.unwrap().is_none());
    }
}
