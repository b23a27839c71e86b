//! The working-copy metadata store (WCDB): a relational node store (BASE,
//! WORKING, ACTUAL rows), repository registry, locks, and work queue.
//! Every mutator below runs inside one transaction unless stated otherwise.

pub mod actual;
pub mod base;
pub mod commit;
pub mod config;
pub mod db;
pub mod lock;
pub mod model;
pub mod pristine;
pub mod queue;
pub mod types;
pub mod update;
pub mod working;

use std::path::Path;

use crate::error::{wc_db_error, ErrorKind, Result, WcError};
use crate::path::Dirent;
use db::DbConnection;
use model::Repository;

const SCHEMA_VERSION: i64 = 1;

/// Name of the per-working-copy administrative directory, rooted at the
/// working-copy root: `<wc-root>/<ADMIN_DIR_NAME>/{wc.db,pristine,tmp}`.
pub const ADMIN_DIR_NAME: &str = ".wc";

/// One open working copy: its `wc.db` connection and the cached `wcid`.
pub struct WorkingCopyDb {
    pub(crate) conn: DbConnection,
    pub wcid: i64,
    pub root_dirent: Dirent,
}

impl WorkingCopyDb {
    /// Creates a brand-new `wc.db` at `db_path`, inserts the REPOSITORY and
    /// `wc_info` rows, and seeds the BASE root row.
    pub async fn init(
        db_path: &Path,
        root_dirent: Dirent,
        repos_relpath: &str,
        repos_root_url: &str,
        repos_uuid: &str,
        initial_rev: i64,
        depth: types::Depth,
    ) -> Result<Self> {
        let conn = DbConnection::create(db_path).await?;

        let wcid: i64 = {
            let mut rows = conn
                .query(
                    "INSERT INTO wc_info (root_dirent, schema_version) VALUES (?1, ?2) RETURNING id",
                    (root_dirent.as_str(), SCHEMA_VERSION),
                )
                .await?;
            let row = rows
                .next()
                .await
                .map_err(|e| wc_db_error("insert wc_info", e))?
                .ok_or_else(|| WcError::new(ErrorKind::WcDbError, "insert wc_info returned no row"))?;
            row.get(0).map_err(|e| wc_db_error("read wc_info.id", e))?
        };

        let wc = Self { conn, wcid, root_dirent };
        let repos_id = wc.repos_register(repos_root_url, repos_uuid).await?;

        base::base_add_directory(
            &wc,
            "",
            base::BaseDirectoryFields {
                revision: initial_rev,
                repos_id,
                repos_relpath: repos_relpath.to_string(),
                changed_rev: Some(initial_rev),
                changed_date: None,
                changed_author: None,
                depth,
                dav_cache: None,
            },
        )
        .await?;

        Ok(wc)
    }

    /// Opens an existing `wc.db` at `db_path`.
    pub async fn open(db_path: &Path, root_dirent: Dirent) -> Result<Self> {
        let conn = DbConnection::connect(db_path).await?;
        let mut rows = conn
            .query("SELECT id FROM wc_info LIMIT 1", ())
            .await?;
        let row = rows
            .next()
            .await
            .map_err(|e| wc_db_error("read wc_info", e))?
            .ok_or_else(|| WcError::new(ErrorKind::NotWorkingCopy, "wc.db has no wc_info row").with_path(db_path))?;
        let wcid: i64 = row.get(0).map_err(|e| wc_db_error("read wc_info.id", e))?;
        Ok(Self { conn, wcid, root_dirent })
    }

    /// Insert-or-reuse a REPOSITORY row, idempotent by `(root_url, uuid)`.
    pub async fn repos_register(&self, root_url: &str, uuid: &str) -> Result<i64> {
        let mut rows = self
            .conn
            .query(
                "SELECT id FROM repository WHERE root_url = ?1 AND uuid = ?2",
                (root_url, uuid),
            )
            .await?;
        if let Some(row) = rows.next().await.map_err(|e| wc_db_error("select repository", e))? {
            return row.get(0).map_err(|e| wc_db_error("read repository.id", e));
        }
        drop(rows);

        let mut rows = self
            .conn
            .query(
                "INSERT INTO repository (root_url, uuid) VALUES (?1, ?2) RETURNING id",
                (root_url, uuid),
            )
            .await?;
        let row = rows
            .next()
            .await
            .map_err(|e| wc_db_error("insert repository", e))?
            .ok_or_else(|| WcError::new(ErrorKind::WcDbError, "insert repository returned no row"))?;
        row.get(0).map_err(|e| wc_db_error("read repository.id", e))
    }

    pub async fn repository(&self, repos_id: i64) -> Result<Repository> {
        let mut rows = self
            .conn
            .query("SELECT id, root_url, uuid FROM repository WHERE id = ?1", (repos_id,))
            .await?;
        let row = rows
            .next()
            .await
            .map_err(|e| wc_db_error("select repository", e))?
            .ok_or_else(|| WcError::new(ErrorKind::WcCorrupt, "repository row missing").with_row_key(repos_id.to_string()))?;
        Repository::from_row(&row)
    }
}
