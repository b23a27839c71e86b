//! Working-copy mutual-exclusion records. A lock has a depth (-1 means
//! the entire subtree); only one process may hold a write lock on a
//! subtree of a working copy.

use crate::error::{wc_db_error, ErrorKind, Result, WcError};
use crate::wc::model::WcLock;
use crate::wc::WorkingCopyDb;

const INFINITE_DEPTH: i64 = -1;

/// Acquires a lock at `relpath` with the given `depth` for `owner`. A
/// lock already held by `owner` on an ancestor of `relpath` is not a
/// conflict (recursive locking by the same process is permitted); a lock
/// held by a different owner anywhere overlapping is rejected.
pub async fn wclock_set(wc: &WorkingCopyDb, relpath: &str, depth: i64, owner: &str) -> Result<()> {
    let locks = all_locks(wc).await?;
    for lock in &locks {
        if lock.owner == owner {
            continue;
        }
        if lock.covers(relpath) || covers_subtree(relpath, depth, &lock.relpath) {
            return Err(WcError::new(
                ErrorKind::WcLocked,
                format!("{relpath} is locked by another owner"),
            ));
        }
    }

    wc.conn
        .execute(
            "INSERT INTO wc_lock (wcid, relpath, depth, owner) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (wcid, relpath) DO UPDATE SET depth = excluded.depth, owner = excluded.owner",
            (wc.wcid, relpath, depth, owner),
        )
        .await?;
    Ok(())
}

/// Whether acquiring a lock at `relpath` with `depth` would itself cover
/// `other` (the mirror image of `WcLock::covers`, checked before a row
/// for `relpath` exists yet).
fn covers_subtree(relpath: &str, depth: i64, other: &str) -> bool {
    if other == relpath {
        return true;
    }
    if depth != INFINITE_DEPTH {
        return false;
    }
    other.starts_with(&format!("{relpath}/")) || (relpath.is_empty() && !other.is_empty())
}

pub async fn wclock_remove(wc: &WorkingCopyDb, relpath: &str) -> Result<()> {
    wc.conn
        .execute("DELETE FROM wc_lock WHERE wcid = ?1 AND relpath = ?2", (wc.wcid, relpath))
        .await?;
    Ok(())
}

pub async fn wclocked(wc: &WorkingCopyDb, relpath: &str) -> Result<bool> {
    let locks = all_locks(wc).await?;
    Ok(locks.iter().any(|l| l.covers(relpath)))
}

async fn all_locks(wc: &WorkingCopyDb) -> Result<Vec<WcLock>> {
    let mut out = Vec::new();
    let mut rows = wc
        .conn
        .query("SELECT wcid, relpath, depth, owner FROM wc_lock WHERE wcid = ?1", (wc.wcid,))
        .await?;
    while let Some(row) = rows.next().await.map_err(|e| wc_db_error("select wc_lock", e))? {
        out.push(WcLock::from_row(&row)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Dirent;
    use crate::wc::types::Depth;

    async fn test_wc(dir: &std::path::Path) -> WorkingCopyDb {
        WorkingCopyDb::init(
            &dir.join("wc.db"),
            Dirent::from(dir),
            "",
            "https://example.com/repo",
            "11111111-1111-1111-1111-111111111111",
            0,
            Depth::Infinity,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn same_owner_recursive_lock_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        wclock_set(&wc, "", INFINITE_DEPTH, "alice").await.unwrap();
        wclock_set(&wc, "dir", INFINITE_DEPTH, "alice").await.unwrap();
        assert!(wclocked(&wc, "dir/sub").await.unwrap());
    }

    #[tokio::test]
    async fn different_owner_overlapping_lock_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        wclock_set(&wc, "dir", INFINITE_DEPTH, "alice").await.unwrap();
        let err = wclock_set(&wc, "dir/sub", 0, "bob").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WcLocked);
    }

    #[tokio::test]
    async fn infinite_depth_lock_at_root_covers_everything() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        wclock_set(&wc, "", INFINITE_DEPTH, "alice").await.unwrap();
        assert!(wclocked(&wc, "anything/deep/here").await.unwrap());
        let err = wclock_set(&wc, "other", 0, "bob").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WcLocked);
    }

    #[tokio::test]
    async fn removed_lock_no_longer_covers() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        wclock_set(&wc, "dir", INFINITE_DEPTH, "alice").await.unwrap();
        wclock_remove(&wc, "dir").await.unwrap();
        assert!(!wclocked(&wc, "dir/sub").await.unwrap());
    }
}
