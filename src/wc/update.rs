//! Bulk field updates: recording a remote update, relocating the
//! repository root, and recording on-disk size/mtime.

use crate::error::Result;
use crate::wc::WorkingCopyDb;

/// Replaces the BASE row's revision and change metadata wholesale, as
/// delivered by a remote update (not a local commit).
pub async fn global_update(
    wc: &WorkingCopyDb,
    relpath: &str,
    new_revision: i64,
    new_checksum: Option<&str>,
    changed_rev: Option<i64>,
    changed_date: Option<i64>,
    changed_author: Option<&str>,
) -> Result<()> {
    wc.conn
        .execute(
            "UPDATE base_node SET revision = ?3, checksum = COALESCE(?4, checksum),
                    changed_rev = ?5, changed_date = ?6, changed_author = ?7
             WHERE wcid = ?1 AND relpath = ?2",
            (wc.wcid, relpath, new_revision, new_checksum, changed_rev, changed_date, changed_author),
        )
        .await?;
    Ok(())
}

/// Rewrites the REPOSITORY row's root URL for every node rooted there —
/// the repository was moved, not the working copy's content.
pub async fn global_relocate(wc: &WorkingCopyDb, repos_id: i64, new_root_url: &str) -> Result<()> {
    wc.conn
        .execute("UPDATE repository SET root_url = ?2 WHERE id = ?1", (repos_id, new_root_url))
        .await?;
    Ok(())
}

/// Records on-disk size and mtime, as observed by the caller after writing
/// a translated working file, for later `base_get_info` callers that want
/// to skip a stat() when nothing has changed.
pub async fn global_record_fileinfo(
    wc: &WorkingCopyDb,
    relpath: &str,
    last_mod_time: i64,
    translated_size: i64,
) -> Result<()> {
    wc.conn
        .execute(
            "UPDATE base_node SET last_mod_time = ?3, translated_size = ?4
             WHERE wcid = ?1 AND relpath = ?2",
            (wc.wcid, relpath, last_mod_time, translated_size),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Sha1;
    use crate::path::Dirent;
    use crate::wc::base::{base_add_file, BaseFileFields};
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
    async fn global_update_rewrites_revision_and_change_metadata() {
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
                changed_rev: Some(1),
                changed_date: None,
                changed_author: Some("alice".into()),
                checksum: Sha1::of(b"old"),
            },
        )
        .await
        .unwrap();

        let new_checksum = Sha1::of(b"new").to_hex();
        global_update(&wc, "f.txt", 7, Some(&new_checksum), Some(7), Some(1000), Some("bob")).await.unwrap();

        let info = crate::wc::base::base_get_info(&wc, "f.txt").await.unwrap();
        assert_eq!(info.revision, Some(7));
        assert_eq!(info.changed_author.as_deref(), Some("bob"));
        assert_eq!(info.checksum, Some(Sha1::of(b"new")));
    }

    #[tokio::test]
    async fn global_relocate_rewrites_repository_root_url() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        let repos_id = wc.repos_register("https://example.com/repo", "11111111-1111-1111-1111-111111111111").await.unwrap();

        global_relocate(&wc, repos_id, "https://example.com/moved").await.unwrap();

        let repo = wc.repository(repos_id).await.unwrap();
        assert_eq!(repo.root_url, "https://example.com/moved");
    }

    #[tokio::test]
    async fn global_record_fileinfo_updates_size_and_mtime() {
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

        global_record_fileinfo(&wc, "f.txt", 123456, 42).await.unwrap();

        let info = crate::wc::base::base_get_info(&wc, "f.txt").await.unwrap();
        assert_eq!(info.last_mod_time, Some(123456));
        assert_eq!(info.translated_size, Some(42));
    }
}
