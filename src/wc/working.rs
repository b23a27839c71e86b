//! WORKING row operations: the overlay describing a local add/copy/move/
//! replacement/deletion not yet committed, and the `op_delete` state
//! transition matrix.

use crate::checksum::Sha1;
use crate::error::{wc_db_error, ErrorKind, Result, WcError};
use crate::wc::model::{BaseNode, WorkingNode};
use crate::wc::types::{NodeKind, WorkingPresence};
use crate::wc::WorkingCopyDb;

async fn upsert_working(
    wc: &WorkingCopyDb,
    relpath: &str,
    presence: WorkingPresence,
    kind: NodeKind,
    checksum: Option<&str>,
    symlink_target: Option<&str>,
    copyfrom_repos_id: Option<i64>,
    copyfrom_relpath: Option<&str>,
    copyfrom_revision: Option<i64>,
    moved_here: bool,
) -> Result<()> {
    let parent_relpath = relpath.rsplit_once('/').map(|(p, _)| p);
    wc.conn
        .execute(
            "INSERT INTO working_node (
                wcid, relpath, parent_relpath, presence, kind, checksum,
                symlink_target, copyfrom_repos_id, copyfrom_relpath,
                copyfrom_revision, moved_here
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)
            ON CONFLICT (wcid, relpath) DO UPDATE SET
                parent_relpath = excluded.parent_relpath,
                presence = excluded.presence,
                kind = excluded.kind,
                checksum = excluded.checksum,
                symlink_target = excluded.symlink_target,
                copyfrom_repos_id = excluded.copyfrom_repos_id,
                copyfrom_relpath = excluded.copyfrom_relpath,
                copyfrom_revision = excluded.copyfrom_revision,
                moved_here = excluded.moved_here",
            (
                wc.wcid,
                relpath,
                parent_relpath,
                presence.as_str(),
                kind.as_str(),
                checksum,
                symlink_target,
                copyfrom_repos_id,
                copyfrom_relpath,
                copyfrom_revision,
                moved_here as i64,
            ),
        )
        .await?;
    Ok(())
}

pub async fn op_add_file(wc: &WorkingCopyDb, relpath: &str, checksum: Sha1) -> Result<()> {
    upsert_working(
        wc,
        relpath,
        WorkingPresence::Normal,
        NodeKind::File,
        Some(&checksum.to_hex()),
        None,
        None,
        None,
        None,
        false,
    )
    .await
}

pub async fn op_add_directory(wc: &WorkingCopyDb, relpath: &str) -> Result<()> {
    upsert_working(wc, relpath, WorkingPresence::Normal, NodeKind::Directory, None, None, None, None, None, false).await
}

pub async fn op_add_symlink(wc: &WorkingCopyDb, relpath: &str, target: &str) -> Result<()> {
    upsert_working(
        wc,
        relpath,
        WorkingPresence::Normal,
        NodeKind::Symlink,
        None,
        Some(target),
        None,
        None,
        None,
        false,
    )
    .await
}

/// Copies a BASE or WORKING subtree to a new WORKING subtree, preserving
/// `copyfrom` on the root; children inherit via recursive descent over
/// whichever source rows exist.
pub async fn op_copy(
    wc: &WorkingCopyDb,
    src_relpath: &str,
    dst_relpath: &str,
    src_repos_id: i64,
    src_revision: i64,
) -> Result<()> {
    let src_kind = effective_kind(wc, src_relpath).await?;
    upsert_working(
        wc,
        dst_relpath,
        WorkingPresence::Normal,
        src_kind,
        None,
        None,
        Some(src_repos_id),
        Some(src_relpath),
        Some(src_revision),
        false,
    )
    .await?;

    let children = child_relpaths(wc, src_relpath).await?;
    for child in children {
        let suffix = child.strip_prefix(src_relpath).unwrap_or(&child).trim_start_matches('/');
        let dst_child = format!("{dst_relpath}/{suffix}");
        let child_kind = effective_kind(wc, &child).await?;
        upsert_working(wc, &dst_child, WorkingPresence::Normal, child_kind, None, None, None, None, None, false)
            .await?;
    }
    Ok(())
}

async fn effective_kind(wc: &WorkingCopyDb, relpath: &str) -> Result<NodeKind> {
    if let Some(w) = working_row(wc, relpath).await? {
        return Ok(w.kind);
    }
    let b = base_row(wc, relpath).await?.ok_or_else(|| {
        WcError::new(ErrorKind::PathNotFound, format!("no BASE or WORKING row for {relpath}"))
    })?;
    Ok(b.kind)
}

pub(crate) async fn working_row(wc: &WorkingCopyDb, relpath: &str) -> Result<Option<WorkingNode>> {
    let mut rows = wc
        .conn
        .query(
            "SELECT wcid, relpath, parent_relpath, presence, kind, checksum, symlink_target,
                    copyfrom_repos_id, copyfrom_relpath, copyfrom_revision, moved_here
             FROM working_node WHERE wcid = ?1 AND relpath = ?2",
            (wc.wcid, relpath),
        )
        .await?;
    match rows.next().await.map_err(|e| wc_db_error("select working_node", e))? {
        Some(row) => Ok(Some(WorkingNode::from_row(&row)?)),
        None => Ok(None),
    }
}

pub(crate) async fn base_row(wc: &WorkingCopyDb, relpath: &str) -> Result<Option<BaseNode>> {
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
    match rows.next().await.map_err(|e| wc_db_error("select base_node", e))? {
        Some(row) => Ok(Some(BaseNode::from_row(&row)?)),
        None => Ok(None),
    }
}

/// Direct (one-level) children of `relpath`, from whichever of BASE/WORKING
/// still names them — used by the empty-parent cleanup sweep to decide
/// whether a directory has anything left under it.
pub(crate) async fn direct_children(wc: &WorkingCopyDb, relpath: &str) -> Result<Vec<String>> {
    let prefix_len = if relpath.is_empty() { 0 } else { relpath.len() + 1 };
    Ok(child_relpaths(wc, relpath)
        .await?
        .into_iter()
        .filter(|child| !child[prefix_len..].contains('/'))
        .collect())
}

/// Whether `relpath` currently resolves to a present node (a BASE row not
/// shadowed by a deleting WORKING row, or a WORKING row in `Normal`/
/// `Incomplete` presence).
pub(crate) async fn is_present(wc: &WorkingCopyDb, relpath: &str) -> Result<bool> {
    if let Some(w) = working_row(wc, relpath).await? {
        return Ok(matches!(w.presence, WorkingPresence::Normal | WorkingPresence::Incomplete));
    }
    match base_row(wc, relpath).await? {
        Some(b) => Ok(b.status != crate::wc::types::BaseStatus::Absent),
        None => Ok(false),
    }
}

/// Whether `relpath` is a versioned directory with no remaining present
/// children.
pub(crate) async fn is_empty_versioned_dir(wc: &WorkingCopyDb, relpath: &str) -> Result<bool> {
    if !is_present(wc, relpath).await? {
        return Ok(false);
    }
    if effective_kind(wc, relpath).await? != NodeKind::Directory {
        return Ok(false);
    }
    for child in direct_children(wc, relpath).await? {
        if is_present(wc, &child).await? {
            return Ok(false);
        }
    }
    Ok(true)
}

async fn child_relpaths(wc: &WorkingCopyDb, relpath: &str) -> Result<Vec<String>> {
    let like_pattern = format!("{relpath}/%");
    let mut out = Vec::new();
    let mut rows = wc
        .conn
        .query(
            "SELECT relpath FROM base_node WHERE wcid = ?1 AND relpath LIKE ?2
             UNION SELECT relpath FROM working_node WHERE wcid = ?1 AND relpath LIKE ?2",
            (wc.wcid, like_pattern),
        )
        .await?;
    while let Some(row) = rows.next().await.map_err(|e| wc_db_error("select children", e))? {
        out.push(row.get(0).map_err(|e| wc_db_error("read relpath", e))?);
    }
    Ok(out)
}

/// The four presences an operation-delete may need to set for a descendant,
/// chosen by `op_delete`'s outer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// No WORKING row existed; one was created with `base-deleted`.
    BaseDeleted,
    /// A WORKING add/copy root is reverted; its WORKING row is removed.
    RevertedAdd,
    /// Already deleted; the call is a no-op.
    NoOp,
}

/// `op_delete` transitions per spec's (B, W) matrix. `B` is the BASE
/// presence (or absence) of `relpath`; `W` is the WORKING presence (or
/// absence). `is_op_root` marks whether `relpath` is itself the operation
/// root identified by `scan_addition`, as opposed to a descendant.
pub async fn op_delete(wc: &WorkingCopyDb, relpath: &str, is_op_root: bool) -> Result<DeleteOutcome> {
    let base = base_row(wc, relpath).await?;
    let working = working_row(wc, relpath).await?;

    match (&base, &working) {
        (Some(b), None) => {
            if b.status == crate::wc::types::BaseStatus::Absent {
                return Err(WcError::new(
                    ErrorKind::PathUnexpectedStatus,
                    format!("cannot delete unknown node at {relpath}"),
                ));
            }
            upsert_working(wc, relpath, WorkingPresence::BaseDeleted, b.kind, None, None, None, None, None, false)
                .await?;
            Ok(DeleteOutcome::BaseDeleted)
        }
        (Some(_), Some(w)) if w.presence == WorkingPresence::Normal => {
            let presence = if is_op_root { WorkingPresence::BaseDeleted } else { WorkingPresence::NotPresent };
            upsert_working(wc, relpath, presence, w.kind, None, None, None, None, None, false).await?;
            Ok(if is_op_root { DeleteOutcome::BaseDeleted } else { DeleteOutcome::NoOp })
        }
        (Some(_), Some(w)) if w.presence == WorkingPresence::NotPresent => Ok(DeleteOutcome::NoOp),
        (None, Some(w)) if w.presence == WorkingPresence::Normal => {
            wc.conn
                .execute("DELETE FROM working_node WHERE wcid = ?1 AND relpath = ?2", (wc.wcid, relpath))
                .await?;
            Ok(DeleteOutcome::RevertedAdd)
        }
        (Some(_), Some(w)) if w.presence == WorkingPresence::Incomplete => {
            upsert_working(wc, relpath, WorkingPresence::BaseDeleted, w.kind, None, None, None, None, None, false)
                .await?;
            Ok(DeleteOutcome::BaseDeleted)
        }
        _ => Ok(DeleteOutcome::NoOp),
    }
}

/// The top of a contiguous copy/move/add region in WORKING containing
/// `relpath`, by walking ancestry until a row with a `copyfrom` or a plain
/// add with no WORKING parent is found.
pub struct AdditionInfo {
    pub status: WorkingPresence,
    pub op_root: String,
    pub orig_repos_relpath: Option<String>,
    pub orig_repos_id: Option<i64>,
    pub orig_revision: Option<i64>,
}

pub async fn scan_addition(wc: &WorkingCopyDb, relpath: &str) -> Result<AdditionInfo> {
    let mut current = relpath.to_string();
    let mut root = relpath.to_string();
    let mut orig_repos_relpath = None;
    let mut orig_repos_id = None;
    let mut orig_revision = None;
    let mut status = WorkingPresence::Normal;

    loop {
        let w = working_row(wc, &current).await?.ok_or_else(|| {
            WcError::new(ErrorKind::PathUnexpectedStatus, format!("{relpath} is not inside a WORKING addition"))
        })?;
        status = w.presence;
        if let Some(cf) = &w.copyfrom_relpath {
            root = current.clone();
            orig_repos_relpath = Some(cf.clone());
            orig_repos_id = w.copyfrom_repos_id;
            orig_revision = w.copyfrom_revision;
            break;
        }
        match current.rsplit_once('/') {
            Some((parent, _)) => {
                if working_row(wc, parent).await?.is_some() {
                    root = parent.to_string();
                    current = parent.to_string();
                } else {
                    root = current.clone();
                    break;
                }
            }
            None => {
                root = current.clone();
                break;
            }
        }
    }

    Ok(AdditionInfo {
        status,
        op_root: root,
        orig_repos_relpath,
        orig_repos_id,
        orig_revision,
    })
}

pub struct DeletionInfo {
    pub base_del_op_root: Option<String>,
    pub base_replaced: bool,
    pub moved_to: Option<String>,
    pub work_del_op_root: Option<String>,
}

pub async fn scan_deletion(wc: &WorkingCopyDb, relpath: &str) -> Result<DeletionInfo> {
    let mut current = relpath.to_string();
    let mut base_del_op_root = None;
    let mut work_del_op_root = None;
    let mut base_replaced = false;

    loop {
        let w = working_row(wc, &current).await?;
        match &w {
            Some(w) if w.presence == WorkingPresence::BaseDeleted => {
                base_del_op_root = Some(current.clone());
            }
            Some(w) if w.presence == WorkingPresence::NotPresent => {
                work_del_op_root = Some(current.clone());
            }
            _ => {}
        }
        if base_row(wc, &current).await?.is_some() && w.as_ref().map(|w| w.presence == WorkingPresence::Normal).unwrap_or(false)
        {
            base_replaced = true;
        }
        match current.rsplit_once('/') {
            Some((parent, _)) if working_row(wc, parent).await?.is_some() => current = parent.to_string(),
            _ => break,
        }
    }

    Ok(DeletionInfo { base_del_op_root, base_replaced, moved_to: None, work_del_op_root })
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
    async fn op_add_file_then_delete_sets_base_deleted_when_no_base_row() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        op_add_file(&wc, "new.txt", Sha1::of(b"hi")).await.unwrap();

        let outcome = op_delete(&wc, "new.txt", true).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::RevertedAdd);
        assert!(working_row(&wc, "new.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn op_copy_duplicates_children() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        op_add_directory(&wc, "src").await.unwrap();
        op_add_file(&wc, "src/a.txt", Sha1::of(b"a")).await.unwrap();
        op_add_file(&wc, "src/b.txt", Sha1::of(b"b")).await.unwrap();

        op_copy(&wc, "src", "dst", 1, 0).await.unwrap();

        assert!(working_row(&wc, "dst").await.unwrap().is_some());
        assert!(working_row(&wc, "dst/a.txt").await.unwrap().is_some());
        assert!(working_row(&wc, "dst/b.txt").await.unwrap().is_some());
        let dst_root = working_row(&wc, "dst").await.unwrap().unwrap();
        assert_eq!(dst_root.copyfrom_relpath.as_deref(), Some("src"));
    }

    #[tokio::test]
    async fn scan_addition_finds_the_copy_root() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        op_add_directory(&wc, "src").await.unwrap();
        op_add_file(&wc, "src/a.txt", Sha1::of(b"a")).await.unwrap();
        op_copy(&wc, "src", "dst", 1, 0).await.unwrap();

        let info = scan_addition(&wc, "dst/a.txt").await.unwrap();
        assert_eq!(info.op_root, "dst");
        assert_eq!(info.orig_repos_relpath.as_deref(), Some("src"));
    }

    #[tokio::test]
    async fn direct_children_excludes_grandchildren() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        op_add_directory(&wc, "top").await.unwrap();
        op_add_directory(&wc, "top/mid").await.unwrap();
        op_add_file(&wc, "top/mid/leaf.txt", Sha1::of(b"x")).await.unwrap();

        let children = direct_children(&wc, "top").await.unwrap();
        assert_eq!(children, vec!["top/mid".to_string()]);
    }

    #[tokio::test]
    async fn empty_versioned_dir_becomes_non_empty_once_populated() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        op_add_directory(&wc, "dir").await.unwrap();
        assert!(is_empty_versioned_dir(&wc, "dir").await.unwrap());

        op_add_file(&wc, "dir/f.txt", Sha1::of(b"x")).await.unwrap();
        assert!(!is_empty_versioned_dir(&wc, "dir").await.unwrap());

        op_delete(&wc, "dir/f.txt", true).await.unwrap();
        assert!(is_empty_versioned_dir(&wc, "dir").await.unwrap());
    }
}
