//! The work queue: a durable FIFO of opaque, self-describing filesystem
//! mutations, applied after the WCDB transaction that enqueued them has
//! committed. Each item is serialized as tagged JSON and must be
//! idempotent with respect to repeated execution on any prefix of its
//! intended effect.

use std::fs;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use serde::{Deserialize, Serialize};

use crate::error::{io_write_error, ErrorKind, Result, WcError};
use crate::notify::{ContentState, Notification, Notify, NotifyAction};
use crate::wc::{queue, WorkingCopyDb};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum WorkItem {
    InstallFile { from_tmp: String, to_abspath: String, exec_bit: bool, translated: bool },
    RemoveFile { abspath: String },
    SetExecutable { abspath: String, bit: bool },
    SetReadonly { abspath: String, bit: bool },
    RecordFileinfo { abspath: String },
    PostcommitRename { from: String, to: String },
    PrejInstall { abspath: String, content: String },
    Notify { abspath: String, action: NotifyAction, content_state: ContentState },
}

impl WorkItem {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| WcError::new(ErrorKind::WcDbError, "serialize work item").with_cause(e))
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| WcError::new(ErrorKind::WcCorrupt, "corrupt work item").with_cause(e))
    }

    /// Performs the filesystem effect. Every variant is safe to run again
    /// on an already-applied prefix: installs and removals tolerate the
    /// target already being in the desired state.
    pub fn apply(&self, notify: &dyn Notify) -> Result<()> {
        match self {
            WorkItem::InstallFile { from_tmp, to_abspath, exec_bit, translated: _ } => {
                let from = Path::new(from_tmp);
                let to = Path::new(to_abspath);
                if from.exists() {
                    if let Some(parent) = to.parent() {
                        fs::create_dir_all(parent).map_err(|e| io_write_error(to, e))?;
                    }
                    fs::rename(from, to).map_err(|e| io_write_error(to, e))?;
                }
                if *exec_bit {
                    set_executable(to, true)?;
                }
                Ok(())
            }
            WorkItem::RemoveFile { abspath } => {
                let path = Path::new(abspath);
                match fs::remove_file(path) {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(io_write_error(path, e)),
                }
            }
            WorkItem::SetExecutable { abspath, bit } => set_executable(Path::new(abspath), *bit),
            WorkItem::SetReadonly { abspath, bit } => {
                let path = Path::new(abspath);
                if !path.exists() {
                    return Ok(());
                }
                let mut perms = fs::metadata(path).map_err(|e| io_write_error(path, e))?.permissions();
                perms.set_readonly(*bit);
                fs::set_permissions(path, perms).map_err(|e| io_write_error(path, e))
            }
            WorkItem::RecordFileinfo { abspath: _ } => Ok(()),
            WorkItem::PostcommitRename { from, to } => {
                let from_path = Path::new(from);
                let to_path = Path::new(to);
                if from_path.exists() {
                    fs::rename(from_path, to_path).map_err(|e| io_write_error(to_path, e))?;
                }
                Ok(())
            }
            WorkItem::PrejInstall { abspath, content } => {
                let path = Path::new(abspath);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| io_write_error(path, e))?;
                }
                fs::write(path, content).map_err(|e| io_write_error(path, e))
            }
            WorkItem::Notify { abspath, action, content_state } => {
                notify.notify(&Notification {
                    abspath: abspath.clone(),
                    action: *action,
                    content_state: *content_state,
                    hunk: None,
                });
                Ok(())
            }
        }
    }
}

#[cfg(unix)]
fn set_executable(path: &Path, bit: bool) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let mut perms = fs::metadata(path).map_err(|e| io_write_error(path, e))?.permissions();
    let mode = perms.mode();
    perms.set_mode(if bit { mode | 0o111 } else { mode & !0o111 });
    fs::set_permissions(path, perms).map_err(|e| io_write_error(path, e))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path, _bit: bool) -> Result<()> {
    Ok(())
}

pub async fn enqueue(wc: &WorkingCopyDb, item: &WorkItem) -> Result<i64> {
    queue::wq_add(wc, &item.to_json()?).await
}

/// Drains the queue oldest-first, applying each item and acknowledging it
/// before moving to the next. An item that fails non-transiently halts
/// the drain; items already acknowledged are not retried, so a second
/// drain of the same (now-shorter) queue is a no-op.
pub async fn drain(wc: &WorkingCopyDb, notify: &dyn Notify) -> Result<()> {
    loop {
        let Some(row) = queue::wq_fetch(wc).await? else {
            return Ok(());
        };
        let item = WorkItem::from_json(&row.work)?;
        item.apply(notify)?;
        queue::wq_completed(wc, row.id).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_file_json_round_trips() {
        let item = WorkItem::InstallFile {
            from_tmp: "/tmp/x".into(),
            to_abspath: "/wc/foo".into(),
            exec_bit: true,
            translated: false,
        };
        let json = item.to_json().unwrap();
        let back = WorkItem::from_json(&json).unwrap();
        assert_eq!(item, back);
    }

    #[test]
    fn remove_missing_file_is_a_noop() {
        let item = WorkItem::RemoveFile { abspath: "/nonexistent/path/x".into() };
        item.apply(&crate::notify::NullNotify).unwrap();
    }

    #[test]
    fn install_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("tmp-upload");
        let to = dir.path().join("target.txt");
        fs::write(&from, b"hello").unwrap();

        let item = WorkItem::InstallFile {
            from_tmp: from.to_str().unwrap().into(),
            to_abspath: to.to_str().unwrap().into(),
            exec_bit: false,
            translated: false,
        };
        item.apply(&crate::notify::NullNotify).unwrap();
        assert_eq!(fs::read(&to).unwrap(), b"hello");
        assert!(!from.exists());
    }

    #[test]
    fn replaying_install_after_completion_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("tmp-upload");
        let to = dir.path().join("target.txt");
        fs::write(&from, b"hello").unwrap();

        let item = WorkItem::InstallFile {
            from_tmp: from.to_str().unwrap().into(),
            to_abspath: to.to_str().unwrap().into(),
            exec_bit: false,
            translated: false,
        };
        item.apply(&crate::notify::NullNotify).unwrap();
        // Replaying after the source has already been consumed: the
        // destination is left untouched rather than erroring.
        item.apply(&crate::notify::NullNotify).unwrap();
        assert_eq!(fs::read(&to).unwrap(), b"hello");
    }
}
