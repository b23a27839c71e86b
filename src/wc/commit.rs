//! `global_commit`: promotes WORKING into BASE, clearing ACTUAL.

use crate::checksum::Sha1;
use crate::error::Result;
use crate::wc::model::WorkingNode;
use crate::wc::types::NodeKind;
use crate::wc::WorkingCopyDb;

pub struct CommitFields {
    pub new_revision: i64,
    pub new_date: Option<i64>,
    pub new_author: Option<String>,
    pub new_checksum: Option<Sha1>,
    pub new_dav_cache: Option<String>,
    pub keep_changelist: bool,
}

/// Promotes the WORKING row at `relpath` into BASE and clears ACTUAL,
/// retaining the changelist column iff `keep_changelist`.
pub async fn global_commit(wc: &WorkingCopyDb, relpath: &str, fields: CommitFields) -> Result<()> {
    let working = match crate::wc::working::working_row(wc, relpath).await? {
        Some(w) => w,
        None => return Ok(()),
    };

    write_base_from_working(wc, relpath, &working, &fields).await?;
    wc.conn
        .execute("DELETE FROM working_node WHERE wcid = ?1 AND relpath = ?2", (wc.wcid, relpath))
        .await?;

    if fields.keep_changelist {
        wc.conn
            .execute(
                "UPDATE actual_node SET properties = NULL, conflict_old = NULL, conflict_new = NULL,
                        conflict_working = NULL, prop_reject = NULL
                 WHERE wcid = ?1 AND relpath = ?2",
                (wc.wcid, relpath),
            )
            .await?;
    } else {
        wc.conn
            .execute("DELETE FROM actual_node WHERE wcid = ?1 AND relpath = ?2", (wc.wcid, relpath))
            .await?;
    }
    Ok(())
}

async fn write_base_from_working(
    wc: &WorkingCopyDb,
    relpath: &str,
    working: &WorkingNode,
    fields: &CommitFields,
) -> Result<()> {
    let repos_id = working.copyfrom_repos_id;
    let repos_relpath = working.copyfrom_relpath.clone().unwrap_or_else(|| relpath.to_string());
    let checksum = fields
        .new_checksum
        .clone()
        .or_else(|| working.checksum.clone())
        .map(|c| c.to_hex());

    let parent_relpath = relpath.rsplit_once('/').map(|(p, _)| p);
    wc.conn
        .execute(
            "INSERT INTO base_node (
                wcid, relpath, parent_relpath, status, kind, revision, repos_id,
                repos_relpath, changed_rev, changed_date, changed_author, checksum,
                symlink_target, dav_cache
            ) VALUES (?1,?2,?3,'normal',?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)
            ON CONFLICT (wcid, relpath) DO UPDATE SET
                parent_relpath = excluded.parent_relpath,
                status = 'normal',
                kind = excluded.kind,
                revision = excluded.revision,
                repos_id = excluded.repos_id,
                repos_relpath = excluded.repos_relpath,
                changed_rev = excluded.changed_rev,
                changed_date = excluded.changed_date,
                changed_author = excluded.changed_author,
                checksum = excluded.checksum,
                symlink_target = excluded.symlink_target,
                dav_cache = excluded.dav_cache",
            (
                wc.wcid,
                relpath,
                parent_relpath,
                kind_str(working.kind),
                fields.new_revision,
                repos_id,
                repos_relpath,
                fields.new_revision,
                fields.new_date,
                fields.new_author.as_deref(),
                checksum,
                working.symlink_target.as_deref(),
                fields.new_dav_cache.as_deref(),
            ),
        )
        .await?;
    Ok(())
}

fn kind_str(kind: NodeKind) -> &'static str {
    kind.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Dirent;
    use crate::wc::types::Depth;
    use crate::wc::{actual, working, WorkingCopyDb};

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
    async fn commit_promotes_working_into_base_and_clears_actual() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        working::op_add_file(&wc, "f.txt", Sha1::of(b"v1")).await.unwrap();
        actual::op_set_props(&wc, "f.txt", Some("svn:eol-style=native")).await.unwrap();

        global_commit(
            &wc,
            "f.txt",
            CommitFields {
                new_revision: 5,
                new_date: None,
                new_author: Some("bob".into()),
                new_checksum: None,
                new_dav_cache: None,
                keep_changelist: false,
            },
        )
        .await
        .unwrap();

        assert!(working::working_row(&wc, "f.txt").await.unwrap().is_none());
        let info = actual::read_info(&wc, "f.txt").await.unwrap();
        assert_eq!(info.revision, Some(5));
        assert!(!info.base_shadowed);
    }

    #[tokio::test]
    async fn commit_on_path_with_no_working_row_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        global_commit(
            &wc,
            "nope.txt",
            CommitFields {
                new_revision: 1,
                new_date: None,
                new_author: None,
                new_checksum: None,
                new_dav_cache: None,
                keep_changelist: false,
            },
        )
        .await
        .unwrap();
        assert!(working::base_row(&wc, "nope.txt").await.unwrap().is_none());
    }
}
