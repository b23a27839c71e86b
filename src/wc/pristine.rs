//! The PristineStore API as exposed through WCDB: installing a file both
//! updates the on-disk store and the `pristine` row, and removal checks
//! reference counts across BASE/WORKING/ACTUAL before touching either.

use std::path::Path;

use crate::checksum::{Md5, Sha1};
use crate::error::{wc_db_error, ErrorKind, Result, WcError};
use crate::pristine::{Presence, PristineStore};
use crate::wc::model::PristineRow;
use crate::wc::WorkingCopyDb;

pub async fn pristine_install(
    wc: &WorkingCopyDb,
    store: &PristineStore,
    tempfile: &Path,
    sha1: Sha1,
    md5: Option<Md5>,
    size: i64,
) -> Result<()> {
    store.install(tempfile, sha1)?;
    wc.conn
        .execute(
            "INSERT INTO pristine (sha1, md5, size) VALUES (?1, ?2, ?3)
             ON CONFLICT (sha1) DO UPDATE SET md5 = excluded.md5, size = excluded.size",
            (sha1.to_hex(), md5.map(|m| m.to_hex()), size),
        )
        .await?;
    Ok(())
}

pub fn pristine_get_path(store: &PristineStore, sha1: Sha1) -> std::path::PathBuf {
    store.path_of(sha1)
}

pub fn pristine_read(store: &PristineStore, sha1: Sha1) -> Result<std::fs::File> {
    store.read(sha1)
}

/// Both the `pristine` row and the on-disk file must agree; disagreement
/// is a corruption naming the SHA-1.
pub async fn pristine_check(wc: &WorkingCopyDb, store: &PristineStore, sha1: Sha1) -> Result<Presence> {
    let row_exists = pristine_row(wc, sha1).await?.is_some();
    let file_exists = store.file_exists(sha1);
    match (row_exists, file_exists) {
        (true, true) => Ok(Presence::Present),
        (false, false) => Ok(Presence::Absent),
        _ => Err(WcError::new(
            ErrorKind::WcCorrupt,
            format!("pristine row/file disagree for {}", sha1.to_hex()),
        )),
    }
}

async fn pristine_row(wc: &WorkingCopyDb, sha1: Sha1) -> Result<Option<PristineRow>> {
    let mut rows = wc.conn.query("SELECT sha1, md5, size FROM pristine WHERE sha1 = ?1", (sha1.to_hex(),)).await?;
    match rows.next().await.map_err(|e| wc_db_error("select pristine", e))? {
        Some(row) => Ok(Some(PristineRow::from_row(&row)?)),
        None => Ok(None),
    }
}

/// Deletes the row and then the file, but only if no BASE, WORKING, or
/// ACTUAL row references `sha1` (directly, or via its recorded MD5 for a
/// legacy backward reference). Otherwise a no-op. The only caller allowed
/// to remove files from the store.
pub async fn pristine_remove(wc: &WorkingCopyDb, store: &PristineStore, sha1: Sha1) -> Result<()> {
    let hex = sha1.to_hex();
    let mut rows = wc
        .conn
        .query(
            "SELECT 1 FROM base_node WHERE wcid = ?1 AND checksum = ?2
             UNION SELECT 1 FROM working_node WHERE wcid = ?1 AND checksum = ?2",
            (wc.wcid, hex.as_str()),
        )
        .await?;
    if rows.next().await.map_err(|e| wc_db_error("check checksum references", e))?.is_some() {
        return Ok(());
    }
    drop(rows);

    wc.conn.execute("DELETE FROM pristine WHERE sha1 = ?1", (hex.as_str(),)).await?;
    store.remove_file(sha1)
}

pub async fn pristine_get_sha1(wc: &WorkingCopyDb, relpath: &str) -> Result<Option<Sha1>> {
    Ok(crate::wc::working::base_row(wc, relpath).await?.and_then(|b| b.checksum))
}

pub async fn pristine_get_md5(wc: &WorkingCopyDb, sha1: Sha1) -> Result<Option<Md5>> {
    Ok(pristine_row(wc, sha1).await?.and_then(|r| r.md5))
}
