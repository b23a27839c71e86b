//! BASE row operations: the node as last synchronized with the remote
//! repository.

use crate::checksum::Sha1;
use crate::error::{wc_db_error, ErrorKind, Result, WcError};
use crate::wc::model::BaseNode;
use crate::wc::types::{BaseStatus, Depth, NodeKind};
use crate::wc::WorkingCopyDb;

pub struct BaseDirectoryFields {
    pub revision: i64,
    pub repos_id: i64,
    pub repos_relpath: String,
    pub changed_rev: Option<i64>,
    pub changed_date: Option<i64>,
    pub changed_author: Option<String>,
    pub depth: Depth,
    pub dav_cache: Option<String>,
}

pub struct BaseFileFields {
    pub revision: i64,
    pub repos_id: i64,
    pub repos_relpath: String,
    pub changed_rev: Option<i64>,
    pub changed_date: Option<i64>,
    pub changed_author: Option<String>,
    pub checksum: Sha1,
}

pub struct BaseSymlinkFields {
    pub revision: i64,
    pub repos_id: i64,
    pub repos_relpath: String,
    pub changed_rev: Option<i64>,
    pub changed_date: Option<i64>,
    pub changed_author: Option<String>,
    pub symlink_target: String,
}

async fn require_parent(wc: &WorkingCopyDb, relpath: &str) -> Result<()> {
    if relpath.is_empty() {
        return Ok(());
    }
    let parent = relpath.rsplit_once('/').map(|(p, _)| p).unwrap_or("");
    let mut rows = wc
        .conn
        .query(
            "SELECT 1 FROM base_node WHERE wcid = ?1 AND relpath = ?2
             UNION SELECT 1 FROM working_node WHERE wcid = ?1 AND relpath = ?2",
            (wc.wcid, parent),
        )
        .await?;
    if rows.next().await.map_err(|e| wc_db_error("check parent row", e))?.is_none() {
        return Err(WcError::new(
            ErrorKind::IncorrectParams,
            format!("base_add: parent row missing for {relpath}"),
        ));
    }
    Ok(())
}

async fn replace_row(
    wc: &WorkingCopyDb,
    relpath: &str,
    status: BaseStatus,
    kind: NodeKind,
    revision: Option<i64>,
    repos_id: Option<i64>,
    repos_relpath: Option<&str>,
    changed_rev: Option<i64>,
    changed_date: Option<i64>,
    changed_author: Option<&str>,
    depth: Option<Depth>,
    checksum: Option<&str>,
    symlink_target: Option<&str>,
    dav_cache: Option<&str>,
) -> Result<()> {
    let parent_relpath = relpath.rsplit_once('/').map(|(p, _)| p);
    wc.conn
        .execute(
            "INSERT INTO base_node (
                wcid, relpath, parent_relpath, status, kind, revision, repos_id,
                repos_relpath, changed_rev, changed_date, changed_author, depth,
                checksum, symlink_target, dav_cache
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)
            ON CONFLICT (wcid, relpath) DO UPDATE SET
                parent_relpath = excluded.parent_relpath,
                status = excluded.status,
                kind = excluded.kind,
                revision = excluded.revision,
                repos_id = excluded.repos_id,
                repos_relpath = excluded.repos_relpath,
                changed_rev = excluded.changed_rev,
                changed_date = excluded.changed_date,
                changed_author = excluded.changed_author,
                depth = excluded.depth,
                checksum = excluded.checksum,
                symlink_target = excluded.symlink_target,
                dav_cache = excluded.dav_cache",
            (
                wc.wcid,
                relpath,
                parent_relpath,
                status.as_str(),
                kind.as_str(),
                revision,
                repos_id,
                repos_relpath,
                changed_rev,
                changed_date,
                changed_author,
                depth.map(Depth::as_str),
                checksum,
                symlink_target,
                dav_cache,
            ),
        )
        .await?;
    Ok(())
}

pub async fn base_add_directory(wc: &WorkingCopyDb, relpath: &str, fields: BaseDirectoryFields) -> Result<()> {
    require_parent(wc, relpath).await?;
    replace_row(
        wc,
        relpath,
        BaseStatus::Normal,
        NodeKind::Directory,
        Some(fields.revision),
        Some(fields.repos_id),
        Some(&fields.repos_relpath),
        fields.changed_rev,
        fields.changed_date,
        fields.changed_author.as_deref(),
        Some(fields.depth),
        None,
        None,
        fields.dav_cache.as_deref(),
    )
    .await
}

pub async fn base_add_file(wc: &WorkingCopyDb, relpath: &str, fields: BaseFileFields) -> Result<()> {
    require_parent(wc, relpath).await?;
    let checksum = fields.checksum.to_hex();
    replace_row(
        wc,
        relpath,
        BaseStatus::Normal,
        NodeKind::File,
        Some(fields.revision),
        Some(fields.repos_id),
        Some(&fields.repos_relpath),
        fields.changed_rev,
        fields.changed_date,
        fields.changed_author.as_deref(),
        None,
        Some(&checksum),
        None,
        None,
    )
    .await
}

pub async fn base_add_symlink(wc: &WorkingCopyDb, relpath: &str, fields: BaseSymlinkFields) -> Result<()> {
    require_parent(wc, relpath).await?;
    replace_row(
        wc,
        relpath,
        BaseStatus::Normal,
        NodeKind::Symlink,
        Some(fields.revision),
        Some(fields.repos_id),
        Some(&fields.repos_relpath),
        fields.changed_rev,
        fields.changed_date,
        fields.changed_author.as_deref(),
        None,
        None,
        Some(&fields.symlink_target),
        None,
    )
    .await
}

pub async fn base_add_absent_node(
    wc: &WorkingCopyDb,
    relpath: &str,
    kind: NodeKind,
    revision: i64,
    repos_id: i64,
    repos_relpath: &str,
    status: BaseStatus,
) -> Result<()> {
    require_parent(wc, relpath).await?;
    replace_row(
        wc,
        relpath,
        status,
        kind,
        Some(revision),
        Some(repos_id),
        Some(repos_relpath),
        None,
        None,
        None,
        None,
        None,
        None,
        None,
    )
    .await
}

/// Deletes the BASE row. Referenced pristine text is not removed here;
/// reference counting happens in `wc::pristine::remove`.
pub async fn base_remove(wc: &WorkingCopyDb, relpath: &str) -> Result<()> {
    wc.conn
        .execute("DELETE FROM base_node WHERE wcid = ?1 AND relpath = ?2", (wc.wcid, relpath))
        .await?;
    Ok(())
}

pub async fn base_get_info(wc: &WorkingCopyDb, relpath: &str) -> Result<BaseNode> {
    let mut rows = wc
        .conn
        .query(
            "SELECT wcid, relpath, parent_relpath, status, kind, revision, repos_id,
                    repos_relpath, changed_rev, changed_date, changed_author, depth,
                    checksum, symlink_target, dav_cache, lock_token, lock_owner,
                    lock_comment, lock_date, last_mod_time, translated_size
             FROM base_node WHERE wcid = ?1 AND relpath = ?2",
            (wc.wcid, relpath),
        )
        .await?;
    let row = rows
        .next()
        .await
        .map_err(|e| wc_db_error("select base_node", e))?
        .ok_or_else(|| WcError::new(ErrorKind::PathNotFound, format!("no BASE row for {relpath}")))?;
    BaseNode::from_row(&row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Dirent;

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
    async fn add_file_then_get_info_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        let repos_id = wc.repos_register("https://example.com/repo", "11111111-1111-1111-1111-111111111111").await.unwrap();
        base_add_file(
            &wc,
            "readme.txt",
            BaseFileFields {
                revision: 3,
                repos_id,
                repos_relpath: "readme.txt".into(),
                changed_rev: Some(3),
                changed_date: None,
                changed_author: Some("alice".into()),
                checksum: Sha1::of(b"hello"),
            },
        )
        .await
        .unwrap();

        let info = base_get_info(&wc, "readme.txt").await.unwrap();
        assert_eq!(info.revision, Some(3));
        assert_eq!(info.kind, NodeKind::File);
        assert_eq!(info.checksum, Some(Sha1::of(b"hello")));
    }

    #[tokio::test]
    async fn add_without_parent_row_fails() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        let repos_id = wc.repos_register("https://example.com/repo", "11111111-1111-1111-1111-111111111111").await.unwrap();
        let err = base_add_file(
            &wc,
            "missing-dir/file.txt",
            BaseFileFields {
                revision: 1,
                repos_id,
                repos_relpath: "missing-dir/file.txt".into(),
                changed_rev: None,
                changed_date: None,
                changed_author: None,
                checksum: Sha1::of(b"x"),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncorrectParams);
    }

    #[tokio::test]
    async fn remove_then_get_info_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        let repos_id = wc.repos_register("https://example.com/repo", "11111111-1111-1111-1111-111111111111").await.unwrap();
        base_add_file(
            &wc,
            "f.txt",
            BaseFileFields {
                revision: 1,
                repos_id,
                repos_relpath: "f.txt".into(),
                changed_rev: None,
                changed_date: None,
                changed_author: None,
                checksum: Sha1::of(b"x"),
            },
        )
        .await
        .unwrap();
        base_remove(&wc, "f.txt").await.unwrap();
        let err = base_get_info(&wc, "f.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathNotFound);
    }
}
