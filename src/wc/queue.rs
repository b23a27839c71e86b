//! `wq_add` / `wq_fetch` / `wq_completed`: append, peek-oldest, and
//! acknowledge work items. Filesystem mutation only happens after the
//! enclosing WCDB transaction commits; draining is the caller's job
//! (see `crate::workqueue`).

use crate::error::{wc_db_error, ErrorKind, Result, WcError};
use crate::wc::model::WorkItemRow;
use crate::wc::WorkingCopyDb;

pub async fn wq_add(wc: &WorkingCopyDb, work: &str) -> Result<i64> {
    let mut rows = wc
        .conn
        .query("INSERT INTO work_queue (wcid, work) VALUES (?1, ?2) RETURNING id", (wc.wcid, work))
        .await?;
    let row = rows
        .next()
        .await
        .map_err(|e| wc_db_error("insert work_queue", e))?
        .ok_or_else(|| WcError::new(ErrorKind::WcDbError, "insert work_queue returned no row"))?;
    row.get(0).map_err(|e| wc_db_error("read work_queue.id", e))
}

/// Peeks the oldest not-yet-completed work item, if any.
pub async fn wq_fetch(wc: &WorkingCopyDb) -> Result<Option<WorkItemRow>> {
    let mut rows = wc
        .conn
        .query(
            "SELECT id, wcid, work FROM work_queue WHERE wcid = ?1 ORDER BY id ASC LIMIT 1",
            (wc.wcid,),
        )
        .await?;
    match rows.next().await.map_err(|e| wc_db_error("select work_queue", e))? {
        Some(row) => Ok(Some(WorkItemRow::from_row(&row)?)),
        None => Ok(None),
    }
}

/// Acknowledges `id`, removing it from the queue. Idempotent: deleting an
/// already-absent id is not an error.
pub async fn wq_completed(wc: &WorkingCopyDb, id: i64) -> Result<()> {
    wc.conn.execute("DELETE FROM work_queue WHERE wcid = ?1 AND id = ?2", (wc.wcid, id)).await?;
    Ok(())
}
