//! Thin async wrapper around a `turso` connection: a relational, ACID
//! engine every WCDB mutator serializes through. Exposes a `_with_conn`
//! variant of every public entry point so a caller composing a longer
//! transaction can reuse an open connection instead of opening a new one
//! (see `wc::config` for a user of that pattern).

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{wc_db_error, ErrorKind, Result, WcError};

const SCHEMA_SQL: &str = include_str!("../../sql/wcdb_init.sql");

/// Wraps a single `turso` connection to one working copy's `wc.db` file.
pub struct DbConnection {
    _db: Arc<turso::Database>,
    conn: Arc<Mutex<turso::Connection>>,
}

impl DbConnection {
    pub async fn connect(db_path: &Path) -> Result<Self> {
        let db = turso::Builder::new_local(db_path.to_str().ok_or_else(|| {
            WcError::new(ErrorKind::IncorrectParams, "wc.db path is not valid UTF-8")
        })?)
        .build()
        .await
        .map_err(|e| wc_db_error("failed to open wc.db", e))?;
        let conn = db
            .connect()
            .map_err(|e| wc_db_error("failed to open wc.db connection", e))?;
        Ok(Self { _db: Arc::new(db), conn: Arc::new(Mutex::new(conn)) })
    }

    /// Creates a new `wc.db` at `db_path` and installs the schema. Fails if
    /// a file already exists there.
    pub async fn create(db_path: &Path) -> Result<Self> {
        if db_path.exists() {
            return Err(WcError::new(
                ErrorKind::IncorrectParams,
                "wc.db already exists",
            )
            .with_path(db_path));
        }
        let conn = Self::connect(db_path).await?;
        conn.execute_batch(SCHEMA_SQL).await?;
        Ok(conn)
    }

    pub async fn execute(&self, sql: &str, params: impl turso::IntoParams) -> Result<u64> {
        let conn = self.conn.lock().await;
        conn.execute(sql, params)
            .await
            .map_err(|e| wc_db_error(format!("execute failed: {sql}"), e))
    }

    pub async fn query(&self, sql: &str, params: impl turso::IntoParams) -> Result<turso::Rows> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(sql)
            .await
            .map_err(|e| wc_db_error(format!("prepare failed: {sql}"), e))?;
        stmt.query(params)
            .await
            .map_err(|e| wc_db_error(format!("query failed: {sql}"), e))
    }

    pub async fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(sql)
            .await
            .map_err(|e| wc_db_error("batch execute failed", e))
    }

    /// Runs `f` as a single transaction spanning every WCDB mutation it
    /// performs. Long-running sequences (commit, update, patch) open
    /// exactly one such transaction; nesting is not supported at this
    /// layer — composing callers use the bulk entry points instead.
    pub async fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: for<'a> FnOnce(
            &'a DbConnection,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<T>> + Send + 'a>>,
    {
        self.execute_batch("BEGIN").await?;
        match f(self).await {
            Ok(value) => {
                self.execute_batch("COMMIT").await?;
                Ok(value)
            }
            Err(e) => {
                // Best-effort rollback; the original error is what the
                // caller sees regardless of whether ROLLBACK itself fails.
                let _ = self.execute_batch("ROLLBACK").await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_rejects_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wc.db");
        std::fs::write(&path, b"").unwrap();
        let err = DbConnection::create(&path).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncorrectParams);
    }

    #[tokio::test]
    async fn transaction_commits_on_ok() {
        let dir = tempfile::tempdir().unwrap();
        let conn = DbConnection::create(&dir.path().join("wc.db")).await.unwrap();
        conn.transaction(|c| {
            Box::pin(async move {
                c.execute("INSERT INTO wc_info (root_dirent, schema_version) VALUES (?1, ?2)", ("/wc", 1)).await?;
                Ok(())
            })
        })
        .await
        .unwrap();

        let mut rows = conn.query("SELECT COUNT(*) FROM wc_info", ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let count: i64 = row.get(0).unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn transaction_rolls_back_on_err() {
        let dir = tempfile::tempdir().unwrap();
        let conn = DbConnection::create(&dir.path().join("wc.db")).await.unwrap();
        let result: Result<()> = conn
            .transaction(|c| {
                Box::pin(async move {
                    c.execute("INSERT INTO wc_info (root_dirent, schema_version) VALUES (?1, ?2)", ("/wc", 1)).await?;
                    Err(WcError::new(ErrorKind::WcDbError, "boom"))
                })
            })
            .await;
        assert!(result.is_err());

        let mut rows = conn.query("SELECT COUNT(*) FROM wc_info", ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let count: i64 = row.get(0).unwrap();
        assert_eq!(count, 0);
    }
}
