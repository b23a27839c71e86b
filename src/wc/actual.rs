//! ACTUAL row operations and effective-node derivation (read_info).

use crate::checksum::Sha1;
use crate::error::{wc_db_error, ErrorKind, Result, WcError};
use crate::wc::model::{ActualNode, TreeConflict};
use crate::wc::types::{Depth, NodeKind};
use crate::wc::working::{base_row, working_row};
use crate::wc::WorkingCopyDb;

/// The status the user sees for a path: WORKING wins if present, else BASE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveInfo {
    pub relpath: String,
    pub kind: NodeKind,
    pub revision: Option<i64>,
    pub checksum: Option<Sha1>,
    pub depth: Option<Depth>,
    /// Both a BASE and a WORKING row exist.
    pub base_shadowed: bool,
    /// Any conflict marker set in ACTUAL.
    pub conflicted: bool,
}

pub async fn read_info(wc: &WorkingCopyDb, relpath: &str) -> Result<EffectiveInfo> {
    let working = working_row(wc, relpath).await?;
    let base = base_row(wc, relpath).await?;

    let (kind, revision, checksum, depth) = if let Some(w) = &working {
        (w.kind, None, w.checksum.clone(), None)
    } else if let Some(b) = &base {
        (b.kind, b.revision, b.checksum.clone(), b.depth)
    } else {
        return Err(WcError::new(ErrorKind::PathNotFound, format!("no BASE or WORKING row for {relpath}")));
    };

    let actual = actual_row(wc, relpath).await?;
    if actual.is_some() && working.is_none() && base.is_none() {
        return Err(WcError::new(ErrorKind::WcCorrupt, format!("ACTUAL row at {relpath} has no BASE or WORKING row")));
    }
    let conflicted = actual.as_ref().map(|a| a.has_text_conflict() || a.prop_reject.is_some()).unwrap_or(false)
        || tree_conflict_at(wc, relpath).await?.is_some();

    Ok(EffectiveInfo {
        relpath: relpath.to_string(),
        kind,
        revision,
        checksum,
        depth,
        base_shadowed: working.is_some() && base.is_some(),
        conflicted,
    })
}

async fn actual_row(wc: &WorkingCopyDb, relpath: &str) -> Result<Option<ActualNode>> {
    let mut rows = wc
        .conn
        .query(
            "SELECT wcid, relpath, properties, changelist, conflict_old, conflict_new,
                    conflict_working, prop_reject
             FROM actual_node WHERE wcid = ?1 AND relpath = ?2",
            (wc.wcid, relpath),
        )
        .await?;
    match rows.next().await.map_err(|e| wc_db_error("select actual_node", e))? {
        Some(row) => Ok(Some(ActualNode::from_row(&row)?)),
        None => Ok(None),
    }
}

async fn tree_conflict_at(wc: &WorkingCopyDb, relpath: &str) -> Result<Option<TreeConflict>> {
    let (parent, name) = relpath.rsplit_once('/').unwrap_or(("", relpath));
    let mut rows = wc
        .conn
        .query(
            "SELECT wcid, parent_relpath, child_name, description
             FROM tree_conflict WHERE wcid = ?1 AND parent_relpath = ?2 AND child_name = ?3",
            (wc.wcid, parent, name),
        )
        .await?;
    match rows.next().await.map_err(|e| wc_db_error("select tree_conflict", e))? {
        Some(row) => Ok(Some(TreeConflict::from_row(&row)?)),
        None => Ok(None),
    }
}

pub async fn op_set_props(wc: &WorkingCopyDb, relpath: &str, properties: Option<&str>) -> Result<()> {
    upsert_actual_field(wc, relpath, "properties", properties).await
}

pub async fn op_set_changelist(wc: &WorkingCopyDb, relpath: &str, changelist: Option<&str>) -> Result<()> {
    upsert_actual_field(wc, relpath, "changelist", changelist).await
}

/// Clears all conflict markers at `relpath`, marking it resolved.
pub async fn op_mark_resolved(wc: &WorkingCopyDb, relpath: &str) -> Result<()> {
    wc.conn
        .execute(
            "UPDATE actual_node SET conflict_old = NULL, conflict_new = NULL,
                    conflict_working = NULL, prop_reject = NULL
             WHERE wcid = ?1 AND relpath = ?2",
            (wc.wcid, relpath),
        )
        .await?;
    let (parent, name) = relpath.rsplit_once('/').unwrap_or(("", relpath));
    wc.conn
        .execute(
            "DELETE FROM tree_conflict WHERE wcid = ?1 AND parent_relpath = ?2 AND child_name = ?3",
            (wc.wcid, parent, name),
        )
        .await?;
    prune_empty_actual(wc, relpath).await
}

pub async fn op_set_tree_conflict(wc: &WorkingCopyDb, parent_relpath: &str, child_name: &str, description: &str) -> Result<()> {
    wc.conn
        .execute(
            "INSERT INTO tree_conflict (wcid, parent_relpath, child_name, description)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (wcid, parent_relpath, child_name) DO UPDATE SET description = excluded.description",
            (wc.wcid, parent_relpath, child_name, description),
        )
        .await?;
    Ok(())
}

pub async fn read_conflicts(wc: &WorkingCopyDb, relpath: &str) -> Result<Vec<TreeConflict>> {
    let mut out = Vec::new();
    let mut rows = wc
        .conn
        .query(
            "SELECT wcid, parent_relpath, child_name, description
             FROM tree_conflict WHERE wcid = ?1 AND parent_relpath = ?2",
            (wc.wcid, relpath),
        )
        .await?;
    while let Some(row) = rows.next().await.map_err(|e| wc_db_error("select tree_conflict", e))? {
        out.push(TreeConflict::from_row(&row)?);
    }
    Ok(out)
}

async fn upsert_actual_field(wc: &WorkingCopyDb, relpath: &str, column: &str, value: Option<&str>) -> Result<()> {
    let sql = format!(
        "INSERT INTO actual_node (wcid, relpath, {column}) VALUES (?1, ?2, ?3)
         ON CONFLICT (wcid, relpath) DO UPDATE SET {column} = excluded.{column}"
    );
    wc.conn.execute(&sql, (wc.wcid, relpath, value)).await?;
    prune_empty_actual(wc, relpath).await
}

/// An ACTUAL row with every column null carries no information; delete it
/// rather than leave an empty row behind.
async fn prune_empty_actual(wc: &WorkingCopyDb, relpath: &str) -> Result<()> {
    if let Some(a) = actual_row(wc, relpath).await? {
        if a.is_empty() {
            wc.conn
                .execute("DELETE FROM actual_node WHERE wcid = ?1 AND relpath = ?2", (wc.wcid, relpath))
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Dirent;
    use crate::wc::working;

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
    async fn working_row_wins_over_base_and_reports_base_shadowed() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        let repos_id = wc.repos_register("https://example.com/repo", "11111111-1111-1111-1111-111111111111").await.unwrap();
        crate::wc::base::base_add_file(
            &wc,
            "f.txt",
            crate::wc::base::BaseFileFields {
                revision: 1,
                repos_id,
                repos_relpath: "f.txt".into(),
                changed_rev: Some(1),
                changed_date: None,
                changed_author: None,
                checksum: Sha1::of(b"old"),
            },
        )
        .await
        .unwrap();
        working::op_add_file(&wc, "f.txt", Sha1::of(b"new")).await.unwrap();

        let info = read_info(&wc, "f.txt").await.unwrap();
        assert_eq!(info.checksum, Some(Sha1::of(b"new")));
        assert!(info.base_shadowed);
        assert!(info.revision.is_none());
    }

    #[tokio::test]
    async fn tree_conflict_marks_path_conflicted_until_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        working::op_add_file(&wc, "dir/f.txt", Sha1::of(b"x")).await.unwrap();
        op_set_tree_conflict(&wc, "dir", "f.txt", "local edit, incoming delete").await.unwrap();

        let info = read_info(&wc, "dir/f.txt").await.unwrap();
        assert!(info.conflicted);
        assert_eq!(read_conflicts(&wc, "dir").await.unwrap().len(), 1);

        op_mark_resolved(&wc, "dir/f.txt").await.unwrap();
        let info = read_info(&wc, "dir/f.txt").await.unwrap();
        assert!(!info.conflicted);
        assert!(read_conflicts(&wc, "dir").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn setting_then_clearing_props_prunes_the_actual_row() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        working::op_add_file(&wc, "f.txt", Sha1::of(b"x")).await.unwrap();

        op_set_props(&wc, "f.txt", Some("svn:eol-style=native")).await.unwrap();
        assert!(actual_row(&wc, "f.txt").await.unwrap().is_some());

        op_set_props(&wc, "f.txt", None).await.unwrap();
        assert!(actual_row(&wc, "f.txt").await.unwrap().is_none());
    }
}
