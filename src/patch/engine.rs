//! Orchestrates target resolution, fuzzy placement, application, and
//! post-processing for one parsed patch against one working copy.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::checksum::Sha1;
use crate::error::{io_write_error, ErrorKind, Result};
use crate::notify::{ContentState, HunkDetails, Notification, Notify, NotifyAction};
use crate::translate::{EolStyle, KeywordValues};
use crate::wc::types::WorkingPresence;
use crate::wc::{base, working, WorkingCopyDb};
use crate::workqueue::{enqueue, WorkItem};

use super::apply::{apply_hunks, reject_text};
use super::hunk::{Hunk, HunkLine};
use super::parse::ParsedPatch;
use super::place::place_hunk;
use super::target::{resolve_target, ResolvedTarget, SkipReason, TargetResolution};

/// Invoked at the suspension points named in the concurrency model: once
/// per top-level target, and once per hunk during placement.
pub trait Cancellation {
    fn is_cancelled(&self) -> bool;
}

pub struct NeverCancelled;
impl Cancellation for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

pub struct PatchOptions<'a> {
    pub strip_count: u32,
    pub reverse: bool,
    pub ignore_whitespace: bool,
    pub dry_run: bool,
    pub eol_style: Option<EolStyle>,
    pub keywords: Option<&'a KeywordValues>,
}

impl Default for PatchOptions<'_> {
    fn default() -> Self {
        PatchOptions {
            strip_count: 0,
            reverse: false,
            ignore_whitespace: false,
            dry_run: false,
            eol_style: None,
            keywords: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    Skipped { relpath: Option<String>, reason: SkipReason },
    Cancelled,
    Applied {
        relpath: String,
        hunks_applied: usize,
        hunks_rejected: usize,
        had_rejects: bool,
        deleted: bool,
    },
}

/// Applies one parsed (single-file) patch to the working copy rooted at
/// `wc_root`. `admin_dir` is the `<wc-root>/.wc` (or similar) administrative
/// directory used for temp space.
pub async fn apply_patch_to_target(
    wc: &WorkingCopyDb,
    wc_root: &Path,
    admin_dir: &Path,
    parsed: &ParsedPatch,
    opts: &PatchOptions<'_>,
    notify: &dyn Notify,
    cancellation: &dyn Cancellation,
) -> Result<TargetOutcome> {
    if cancellation.is_cancelled() {
        return Ok(TargetOutcome::Cancelled);
    }

    let effective_old_name = if opts.reverse { &parsed.new_filename } else { &parsed.old_filename };
    let effective_new_name = if opts.reverse { &parsed.old_filename } else { &parsed.new_filename };
    let hunks: Vec<Hunk> = if opts.reverse {
        parsed.hunks.iter().map(reverse_hunk).collect()
    } else {
        parsed.hunks.clone()
    };
    let is_creation = hunks.first().is_some_and(|h| h.is_creation());

    let resolution = if is_creation {
        super::target::resolve_creation_target(wc_root, effective_new_name, opts.strip_count)?
    } else {
        resolve_target(wc, wc_root, effective_new_name, opts.strip_count).await?
    };

    let target = match resolution {
        TargetResolution::Skip(reason) => {
            debug!(?reason, filename = effective_new_name.as_str(), "skipping patch target");
            notify.notify(&Notification {
                abspath: effective_new_name.clone(),
                action: NotifyAction::Skip,
                content_state: ContentState::Unknown,
                hunk: None,
            });
            return Ok(TargetOutcome::Skipped { relpath: None, reason });
        }
        TargetResolution::Resolved(t) => t,
    };

    let original_bytes = if target.exists_on_disk {
        fs::read(&target.abspath).map_err(|e| io_write_error(&target.abspath, e))?
    } else {
        Vec::new()
    };
    let original_size = original_bytes.len() as u64;
    let target_lines = split_lines(&original_bytes);
    let had_trailing_newline = if is_creation { true } else { original_bytes.last() == Some(&b'\n') };

    let mut placements = Vec::with_capacity(hunks.len());
    let mut accepted_ranges: Vec<(u32, u32)> = Vec::new();
    for hunk in &hunks {
        if cancellation.is_cancelled() {
            return Ok(TargetOutcome::Cancelled);
        }
        let placement = place_hunk(
            &target_lines,
            hunk,
            opts.ignore_whitespace,
            opts.keywords,
            target.exists_on_disk,
            &accepted_ranges,
        );
        if let Some(p) = placement {
            trace!(matched_line = p.matched_line, fuzz = p.fuzz, "hunk placed");
            accepted_ranges.push((p.matched_line, p.matched_line + hunk.original_length));
        }
        placements.push(placement);
    }

    let result = apply_hunks(&target_lines, &hunks, &placements);
    if result.short_read {
        warn!(relpath = target.relpath.as_str(), "target shorter than hunks expected; skipping");
        notify.notify(&Notification {
            abspath: target.relpath.as_str().to_string(),
            action: NotifyAction::Skip,
            content_state: ContentState::Missing,
            hunk: None,
        });
        return Ok(TargetOutcome::Skipped { relpath: Some(target.relpath.as_str().to_string()), reason: SkipReason::MissingOnDisk });
    }

    for (idx, placement) in placements.iter().enumerate() {
        let hunk = &hunks[idx];
        let (action, content_state, matched_line, fuzz) = match placement {
            Some(p) => (NotifyAction::PatchAppliedHunk, ContentState::Merged, p.matched_line, p.fuzz),
            None => (NotifyAction::PatchRejectedHunk, ContentState::Conflicted, 0, 0),
        };
        notify.notify(&Notification {
            abspath: target.relpath.as_str().to_string(),
            action,
            content_state,
            hunk: Some(HunkDetails {
                original_start: hunk.original_start,
                original_length: hunk.original_length,
                modified_start: hunk.modified_start,
                modified_length: hunk.modified_length,
                matched_line,
                fuzz,
            }),
        });
    }

    let patched_text = render_patched_text(&result.patched_lines, had_trailing_newline, opts.eol_style, opts.keywords);
    let patched_size = patched_text.len() as u64;

    let locally_deleted = matches!(
        working::working_row(wc, target.relpath.as_str()).await?,
        Some(w) if w.presence == WorkingPresence::BaseDeleted
    );
    let outcome = classify(original_size, patched_size, locally_deleted);
    apply_postprocess(
        wc,
        admin_dir,
        &target,
        outcome,
        &patched_text,
        opts.dry_run,
        notify,
    )
    .await?;

    if !result.rejected.is_empty() {
        let reject_path = reject_path_for(&target.abspath);
        let text = reject_text(effective_old_name, effective_new_name, &hunks, &result.rejected);
        if !opts.dry_run {
            enqueue(wc, &WorkItem::PrejInstall { abspath: reject_path.to_string_lossy().into_owned(), content: text }).await?;
        }
    }

    Ok(TargetOutcome::Applied {
        relpath: target.relpath.as_str().to_string(),
        hunks_applied: placements.iter().filter(|p| p.is_some()).count(),
        hunks_rejected: result.rejected.len(),
        had_rejects: !result.rejected.is_empty(),
        deleted: outcome == PostProcess::Delete,
    })
}

/// Swaps a hunk's original/modified sides: `Added`↔`Removed` lines, and
/// the original/modified start/length pairs. Applying the result where
/// the forward hunk would have applied reconstructs the pre-patch state.
fn reverse_hunk(hunk: &Hunk) -> Hunk {
    let lines = hunk
        .lines
        .iter()
        .map(|l| match l {
            HunkLine::Context(s) => HunkLine::Context(s.clone()),
            HunkLine::Removed(s) => HunkLine::Added(s.clone()),
            HunkLine::Added(s) => HunkLine::Removed(s.clone()),
        })
        .collect();
    Hunk {
        original_start: hunk.modified_start,
        original_length: hunk.modified_length,
        modified_start: hunk.original_start,
        modified_length: hunk.original_length,
        lines,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PostProcess {
    Delete,
    SkipUnchanged,
    Replacement,
    Addition,
    Modification,
}

/// `locally_deleted` distinguishes the two ways a target can have no
/// prior content (`original_size == 0`): a node the working copy still
/// tracks but has recorded as locally deleted (`WorkingPresence::BaseDeleted`)
/// gets `Replacement`, while a node absent from the working copy entirely
/// gets `Addition`.
fn classify(original_size: u64, patched_size: u64, locally_deleted: bool) -> PostProcess {
    match (original_size, patched_size, locally_deleted) {
        (w, 0, _) if w > 0 => PostProcess::Delete,
        (0, 0, false) => PostProcess::SkipUnchanged,
        (0, p, true) if p > 0 => PostProcess::Replacement,
        (0, p, false) if p > 0 => PostProcess::Addition,
        _ => PostProcess::Modification,
    }
}

async fn apply_postprocess(
    wc: &WorkingCopyDb,
    admin_dir: &Path,
    target: &ResolvedTarget,
    outcome: PostProcess,
    patched_text: &[u8],
    dry_run: bool,
    notify: &dyn Notify,
) -> Result<()> {
    let relpath = target.relpath.as_str();
    match outcome {
        PostProcess::SkipUnchanged => {
            notify.notify(&Notification {
                abspath: relpath.to_string(),
                action: NotifyAction::Skip,
                content_state: ContentState::Unknown,
                hunk: None,
            });
        }
        PostProcess::Delete => {
            if !dry_run {
                working::op_delete(wc, relpath, true).await?;
                enqueue(wc, &WorkItem::RemoveFile { abspath: target.abspath.to_string_lossy().into_owned() }).await?;
            }
            notify.notify(&Notification {
                abspath: relpath.to_string(),
                action: NotifyAction::Delete,
                content_state: ContentState::Changed,
                hunk: None,
            });
        }
        PostProcess::Addition | PostProcess::Replacement => {
            if !dry_run {
                ensure_versioned_ancestors(wc, relpath).await?;
                working::op_add_file(wc, relpath, Sha1::of(patched_text)).await?;
                write_via_work_queue(wc, admin_dir, target, patched_text).await?;
            }
            notify.notify(&Notification {
                abspath: relpath.to_string(),
                action: NotifyAction::Add,
                content_state: ContentState::Changed,
                hunk: None,
            });
        }
        PostProcess::Modification => {
            if !dry_run {
                write_via_work_queue(wc, admin_dir, target, patched_text).await?;
            }
            notify.notify(&Notification {
                abspath: relpath.to_string(),
                action: NotifyAction::Patch,
                content_state: ContentState::Changed,
                hunk: None,
            });
        }
    }
    Ok(())
}

async fn write_via_work_queue(wc: &WorkingCopyDb, admin_dir: &Path, target: &ResolvedTarget, patched_text: &[u8]) -> Result<()> {
    let tmp_dir = admin_dir.join("tmp");
    fs::create_dir_all(&tmp_dir).map_err(|e| io_write_error(&tmp_dir, e))?;
    let tmp_name = format!("patch-{}", Sha1::of(target.relpath.as_str().as_bytes()).to_hex());
    let tmp_path = tmp_dir.join(tmp_name);
    fs::write(&tmp_path, patched_text).map_err(|e| io_write_error(&tmp_path, e))?;
    enqueue(
        wc,
        &WorkItem::InstallFile {
            from_tmp: tmp_path.to_string_lossy().into_owned(),
            to_abspath: target.abspath.to_string_lossy().into_owned(),
            exec_bit: false,
            translated: true,
        },
    )
    .await?;
    Ok(())
}

/// Walks `relpath`'s ancestor chain, versioning (via `base_add_directory`'s
/// prerequisite, `op_add_directory`) any directory not yet known to WCDB.
/// Stops and fails if an existing ancestor is a file rather than a
/// directory — that case is the caller's responsibility to have already
/// ruled out via target resolution.
async fn ensure_versioned_ancestors(wc: &WorkingCopyDb, relpath: &str) -> Result<()> {
    let Some((parent, _)) = relpath.rsplit_once('/') else {
        return Ok(());
    };
    let mut segments: Vec<&str> = parent.split('/').collect();
    let mut built = Vec::new();
    let mut ancestors = Vec::new();
    while !segments.is_empty() {
        built.extend(segments.drain(..1));
        ancestors.push(built.join("/"));
    }
    for ancestor in ancestors {
        let has_working = working::working_row(wc, &ancestor).await?.is_some();
        let has_base = match base::base_get_info(wc, &ancestor).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::PathNotFound => false,
            Err(e) => return Err(e),
        };
        if !has_working && !has_base {
            working::op_add_directory(wc, &ancestor).await?;
        }
    }
    Ok(())
}

/// After a multi-target patch document has been applied, walks each
/// deletion's parent chain and schedules any directory left with no
/// present children for deletion too, promoting upward until a
/// non-empty ancestor or the working-copy root is reached.
pub async fn cleanup_empty_ancestors(
    wc: &WorkingCopyDb,
    wc_root: &Path,
    deleted_relpaths: &[String],
    notify: &dyn Notify,
) -> Result<()> {
    for deleted in deleted_relpaths {
        let mut current = deleted.as_str();
        loop {
            let Some((parent, _)) = current.rsplit_once('/') else {
                break;
            };
            if parent.is_empty() {
                break;
            }
            if !working::is_empty_versioned_dir(wc, parent).await? {
                break;
            }
            working::op_delete(wc, parent, true).await?;
            let abspath = wc_root.join(parent);
            if abspath.is_dir() {
                let _ = fs::remove_dir(&abspath);
            }
            notify.notify(&Notification {
                abspath: parent.to_string(),
                action: NotifyAction::Delete,
                content_state: ContentState::Changed,
                hunk: None,
            });
            current = parent;
        }
    }
    Ok(())
}

fn reject_path_for(abspath: &Path) -> PathBuf {
    let mut s = abspath.to_string_lossy().into_owned();
    s.push('.');
    s.push_str(crate::wc::ADMIN_DIR_NAME.trim_start_matches('.'));
    s.push_str(".rej");
    PathBuf::from(s)
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    if text.is_empty() {
        return Vec::new();
    }
    let mut lines: Vec<String> = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l).to_string()).collect();
    if text.ends_with('\n') {
        lines.pop();
    }
    lines
}

/// Joins `lines` back into a byte stream, re-appending the trailing
/// newline the source stream had (tracked separately by the caller,
/// since [`split_lines`] discards that information once the text is a
/// line array) before keyword expansion and EOL normalization.
fn render_patched_text(lines: &[String], trailing_newline: bool, eol_style: Option<EolStyle>, keywords: Option<&KeywordValues>) -> Vec<u8> {
    let mut joined = lines.join("\n");
    if trailing_newline && !lines.is_empty() {
        joined.push('\n');
    }
    if let Some(kw) = keywords {
        joined = crate::translate::expand_keywords(&joined, kw);
    }
    let bytes = joined.into_bytes();
    match eol_style {
        Some(style) => crate::translate::normalize_eol(&bytes, style, true).unwrap_or(bytes),
        None => bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_matches_post_processing_table() {
        assert_eq!(classify(10, 0, true), PostProcess::Delete);
        assert_eq!(classify(0, 0, false), PostProcess::SkipUnchanged);
        assert_eq!(classify(0, 5, true), PostProcess::Replacement);
        assert_eq!(classify(0, 5, false), PostProcess::Addition);
        assert_eq!(classify(4, 6, true), PostProcess::Modification);
    }

    #[test]
    fn split_lines_drops_trailing_empty_from_final_newline() {
        assert_eq!(split_lines(b"a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines(b"a\nb"), vec!["a", "b"]);
        assert_eq!(split_lines(b""), Vec::<String>::new());
    }

    #[test]
    fn render_patched_text_reemits_a_tracked_trailing_newline() {
        let lines = vec!["A".to_string(), "X".to_string(), "Y".to_string(), "D".to_string()];
        assert_eq!(render_patched_text(&lines, true, None, None), b"A\nX\nY\nD\n".to_vec());
        assert_eq!(render_patched_text(&lines, false, None, None), b"A\nX\nY\nD".to_vec());
    }

    #[test]
    fn render_patched_text_of_empty_lines_never_emits_a_bare_newline() {
        assert_eq!(render_patched_text(&[], true, None, None), Vec::<u8>::new());
    }

    #[test]
    fn reverse_hunk_swaps_added_removed_and_original_modified_ranges() {
        let hunk = Hunk {
            original_start: 2,
            original_length: 1,
            modified_start: 2,
            modified_length: 1,
            lines: vec![HunkLine::Context("ctx".into()), HunkLine::Removed("old".into()), HunkLine::Added("new".into())],
        };
        let reversed = reverse_hunk(&hunk);
        assert_eq!(reversed.original_start, hunk.modified_start);
        assert_eq!(reversed.original_length, hunk.modified_length);
        assert_eq!(reversed.modified_start, hunk.original_start);
        assert_eq!(reversed.modified_length, hunk.original_length);
        assert_eq!(
            reversed.lines,
            vec![HunkLine::Context("ctx".into()), HunkLine::Added("old".into()), HunkLine::Removed("new".into())]
        );
    }

    async fn test_wc(dir: &Path) -> WorkingCopyDb {
        WorkingCopyDb::init(
            &dir.join("wc.db"),
            crate::path::Dirent::from(dir),
            "",
            "https://example.com/repo",
            "11111111-1111-1111-1111-111111111111",
            0,
            crate::wc::types::Depth::Infinity,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn cleanup_empty_ancestors_promotes_upward_to_but_not_past_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        working::op_add_directory(&wc, "a").await.unwrap();
        working::op_add_directory(&wc, "a/b").await.unwrap();
        working::op_add_file(&wc, "a/b/f.txt", Sha1::of(b"x")).await.unwrap();
        working::op_delete(&wc, "a/b/f.txt", true).await.unwrap();

        let notify = crate::notify::RecordingNotify::new();
        cleanup_empty_ancestors(&wc, dir.path(), &["a/b/f.txt".to_string()], &notify).await.unwrap();

        assert!(!working::is_present(&wc, "a/b").await.unwrap());
        assert!(!working::is_present(&wc, "a").await.unwrap());
        let events = notify.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].abspath, "a/b");
        assert_eq!(events[1].abspath, "a");
    }

    #[tokio::test]
    async fn cleanup_empty_ancestors_stops_at_a_non_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let wc = test_wc(dir.path()).await;
        working::op_add_directory(&wc, "a").await.unwrap();
        working::op_add_file(&wc, "a/keep.txt", Sha1::of(b"keep")).await.unwrap();
        working::op_add_directory(&wc, "a/b").await.unwrap();
        working::op_add_file(&wc, "a/b/f.txt", Sha1::of(b"x")).await.unwrap();
        working::op_delete(&wc, "a/b/f.txt", true).await.unwrap();

        let notify = crate::notify::NullNotify;
        cleanup_empty_ancestors(&wc, dir.path(), &["a/b/f.txt".to_string()], &notify).await.unwrap();

        assert!(!working::is_present(&wc, "a/b").await.unwrap());
        assert!(working::is_present(&wc, "a").await.unwrap());
    }
}
