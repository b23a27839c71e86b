//! CLI entry point: `clap` subcommands wired straight onto the WCDB/patch
//! engine operations, each one thin enough to read as "open the working
//! copy, call the operation, print what happened".

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::checksum::Sha1;
use crate::error::{io_write_error, ErrorKind, Result, WcError};
use crate::notify::{Notification, Notify, NotifyAction};
use crate::patch::{self, PatchOptions};
use crate::translate::EolStyle;
use crate::wc::types::Depth;
use crate::wc::{actual, commit, config::Config, lock, working, WorkingCopyDb};
use crate::workqueue;

#[derive(Parser, Debug)]
#[command(about = "Working-copy engine CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Create a new working copy rooted at the current directory")]
    Checkout(CheckoutArgs),
    #[command(about = "Show the effective status of a path")]
    Status(StatusArgs),
    #[command(about = "Promote a WORKING row into BASE")]
    Commit(CommitArgs),
    #[command(about = "Record a remote update against a BASE row")]
    Update(UpdateArgs),
    #[command(about = "Apply a unified-diff patch file to the working copy")]
    Patch(PatchArgs),
    #[command(about = "Acquire a working-copy lock")]
    Lock(LockArgs),
    #[command(about = "Release a working-copy lock")]
    Unlock(UnlockArgs),
    #[command(about = "Drain leftover work-queue items and release a stale lock")]
    Cleanup(CleanupArgs),
    #[command(about = "Schedule a file for addition")]
    Add(AddArgs),
    #[command(about = "Schedule a copy of a versioned path")]
    Copy(CopyArgs),
    #[command(about = "Schedule a move (copy + delete) of a versioned path")]
    Move(MoveArgs),
    #[command(about = "Schedule a versioned path for deletion")]
    Remove(RemoveArgs),
    #[command(about = "Revert a local addition")]
    Revert(RevertArgs),
}

#[derive(Parser, Debug)]
struct CheckoutArgs {
    /// Root URL of the repository this working copy tracks.
    repos_root_url: String,
    /// Repository UUID.
    repos_uuid: String,
    #[arg(long, default_value = "0")]
    initial_revision: i64,
    #[arg(long, default_value = "infinity")]
    depth: Depth,
}

#[derive(Parser, Debug)]
struct StatusArgs {
    path: PathBuf,
}

#[derive(Parser, Debug)]
struct CommitArgs {
    path: PathBuf,
    #[arg(long)]
    revision: i64,
    #[arg(long)]
    author: Option<String>,
}

#[derive(Parser, Debug)]
struct UpdateArgs {
    path: PathBuf,
    #[arg(long)]
    revision: i64,
    #[arg(long)]
    changed_author: Option<String>,
}

#[derive(Parser, Debug)]
struct PatchArgs {
    /// Path to a unified-diff file, possibly covering multiple targets.
    patch_file: PathBuf,
    #[arg(short = 'p', long = "strip", default_value = "0")]
    strip_count: u32,
    #[arg(short = 'R', long)]
    reverse: bool,
    #[arg(long)]
    ignore_whitespace: bool,
    #[arg(long)]
    dry_run: bool,
}

#[derive(Parser, Debug)]
struct LockArgs {
    path: PathBuf,
    #[arg(long)]
    recursive: bool,
    #[arg(long, default_value = "cli")]
    owner: String,
}

#[derive(Parser, Debug)]
struct UnlockArgs {
    path: PathBuf,
}

#[derive(Parser, Debug)]
struct CleanupArgs {
    #[arg(long, default_value = "")]
    lock_path: String,
}

#[derive(Parser, Debug)]
struct AddArgs {
    path: PathBuf,
}

#[derive(Parser, Debug)]
struct CopyArgs {
    src: PathBuf,
    dst: PathBuf,
}

#[derive(Parser, Debug)]
struct MoveArgs {
    src: PathBuf,
    dst: PathBuf,
}

#[derive(Parser, Debug)]
struct RemoveArgs {
    path: PathBuf,
}

#[derive(Parser, Debug)]
struct RevertArgs {
    path: PathBuf,
}

/// Colored, one-line-per-event terminal adapter for [`Notify`].
pub struct TerminalNotify;

impl Notify for TerminalNotify {
    fn notify(&self, notification: &Notification) {
        let line = match notification.action {
            NotifyAction::Skip => format!("{} {}", "skip".yellow(), notification.abspath),
            NotifyAction::Delete => format!("{} {}", "D".red(), notification.abspath),
            NotifyAction::Add => format!("{} {}", "A".green(), notification.abspath),
            NotifyAction::Patch => format!("{} {}", "U".cyan(), notification.abspath),
            NotifyAction::PatchAppliedHunk => {
                let hunk = notification.hunk.as_ref();
                format!(
                    "{} {} hunk @@ -{},{} +{},{} @@{}",
                    "applied".green(),
                    notification.abspath,
                    hunk.map(|h| h.original_start).unwrap_or_default(),
                    hunk.map(|h| h.original_length).unwrap_or_default(),
                    hunk.map(|h| h.modified_start).unwrap_or_default(),
                    hunk.map(|h| h.modified_length).unwrap_or_default(),
                    hunk.filter(|h| h.fuzz > 0).map(|h| format!(" (fuzz {})", h.fuzz)).unwrap_or_default(),
                )
            }
            NotifyAction::PatchRejectedHunk => {
                let hunk = notification.hunk.as_ref();
                format!(
                    "{} {} hunk @@ -{},{} +{},{} @@",
                    "rejected".red(),
                    notification.abspath,
                    hunk.map(|h| h.original_start).unwrap_or_default(),
                    hunk.map(|h| h.original_length).unwrap_or_default(),
                    hunk.map(|h| h.modified_start).unwrap_or_default(),
                    hunk.map(|h| h.modified_length).unwrap_or_default(),
                )
            }
        };
        println!("{line}");
    }
}

/// Synchronous entry point, mirroring the `#[tokio::main]` wrapper pattern.
#[tokio::main]
pub async fn parse(args: Option<&[&str]>) -> Result<()> {
    parse_async(args).await
}

pub async fn run() -> Result<()> {
    parse_async(None).await
}

pub async fn parse_async(args: Option<&[&str]>) -> Result<()> {
    let cli = match args {
        Some(args) => Cli::try_parse_from(args)
            .map_err(|e| WcError::new(ErrorKind::IncorrectParams, e.to_string()))?,
        None => Cli::parse(),
    };

    match cli.command {
        Commands::Checkout(a) => checkout(a).await,
        Commands::Status(a) => status(a).await,
        Commands::Commit(a) => commit_cmd(a).await,
        Commands::Update(a) => update_cmd(a).await,
        Commands::Patch(a) => patch_cmd(a).await,
        Commands::Lock(a) => lock_cmd(a).await,
        Commands::Unlock(a) => unlock_cmd(a).await,
        Commands::Cleanup(a) => cleanup_cmd(a).await,
        Commands::Add(a) => add_cmd(a).await,
        Commands::Copy(a) => copy_cmd(a).await,
        Commands::Move(a) => move_cmd(a).await,
        Commands::Remove(a) => remove_cmd(a).await,
        Commands::Revert(a) => revert_cmd(a).await,
    }
}

/// Walks upward from `start` looking for `<dir>/<ADMIN_DIR_NAME>/wc.db`.
fn find_wc_root(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(crate::wc::ADMIN_DIR_NAME).join("wc.db").is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(WcError::new(ErrorKind::NotWorkingCopy, "no working copy found above the current directory"));
        }
    }
}

async fn open_here() -> Result<(WorkingCopyDb, PathBuf, PathBuf)> {
    let cwd = env::current_dir().map_err(|e| io_write_error(".", e))?;
    let wc_root = find_wc_root(&cwd)?;
    let admin_dir = wc_root.join(crate::wc::ADMIN_DIR_NAME);
    let wc = WorkingCopyDb::open(&admin_dir.join("wc.db"), crate::path::Dirent::from(wc_root.as_path())).await?;
    Ok((wc, wc_root, admin_dir))
}

/// Converts a CLI-supplied path (absolute or cwd-relative) into a
/// working-copy relpath, rejecting anything that resolves outside
/// `wc_root`.
fn relpath_for(wc_root: &Path, path: &Path) -> Result<crate::path::Relpath> {
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_err(|e| io_write_error(".", e))?.join(path)
    };
    let abs = fs::canonicalize(&abs).unwrap_or(abs);
    let wc_root = fs::canonicalize(wc_root).unwrap_or_else(|_| wc_root.to_path_buf());
    let rel = abs.strip_prefix(&wc_root).map_err(|_| {
        WcError::new(ErrorKind::BadFilename, format!("{} is not inside the working copy", path.display()))
    })?;
    crate::path::Relpath::canonicalize(&rel.to_string_lossy()).ok_or_else(|| {
        WcError::new(ErrorKind::BadFilename, format!("{} is not a valid working-copy path", path.display()))
    })
}

async fn checkout(args: CheckoutArgs) -> Result<()> {
    let cwd = env::current_dir().map_err(|e| io_write_error(".", e))?;
    let admin_dir = cwd.join(crate::wc::ADMIN_DIR_NAME);
    fs::create_dir_all(&admin_dir).map_err(|e| io_write_error(&admin_dir, e))?;
    WorkingCopyDb::init(
        &admin_dir.join("wc.db"),
        crate::path::Dirent::from(cwd.as_path()),
        "",
        &args.repos_root_url,
        &args.repos_uuid,
        args.initial_revision,
        args.depth,
    )
    .await?;
    println!("{} working copy at {}", "Checked out".green(), cwd.display());
    Ok(())
}

async fn status(args: StatusArgs) -> Result<()> {
    let (wc, wc_root, _admin) = open_here().await?;
    let relpath = relpath_for(&wc_root, &args.path)?;
    let info = actual::read_info(&wc, relpath.as_str()).await?;
    let marker = if info.conflicted {
        "C".red()
    } else if info.base_shadowed {
        "M".yellow()
    } else {
        " ".normal()
    };
    println!("{marker} {}", relpath.as_str());
    Ok(())
}

async fn commit_cmd(args: CommitArgs) -> Result<()> {
    let (wc, wc_root, _admin) = open_here().await?;
    let relpath = relpath_for(&wc_root, &args.path)?;
    commit::global_commit(
        &wc,
        relpath.as_str(),
        commit::CommitFields {
            new_revision: args.revision,
            new_date: None,
            new_author: args.author,
            new_checksum: None,
            new_dav_cache: None,
            keep_changelist: false,
        },
    )
    .await?;
    println!("{} {} at r{}", "Committed".green(), relpath.as_str(), args.revision);
    Ok(())
}

async fn update_cmd(args: UpdateArgs) -> Result<()> {
    let (wc, wc_root, _admin) = open_here().await?;
    let relpath = relpath_for(&wc_root, &args.path)?;
    crate::wc::update::global_update(
        &wc,
        relpath.as_str(),
        args.revision,
        None,
        Some(args.revision),
        None,
        args.changed_author.as_deref(),
    )
    .await?;
    println!("{} {} to r{}", "Updated".green(), relpath.as_str(), args.revision);
    Ok(())
}

async fn patch_cmd(args: PatchArgs) -> Result<()> {
    let (wc, wc_root, admin_dir) = open_here().await?;
    let document = fs::read_to_string(&args.patch_file).map_err(|e| io_write_error(&args.patch_file, e))?;

    let eol_style = Config::eol_style(&wc.conn, wc.wcid).await.unwrap_or(EolStyle::None);
    let opts = PatchOptions {
        strip_count: args.strip_count,
        reverse: args.reverse,
        ignore_whitespace: args.ignore_whitespace,
        dry_run: args.dry_run,
        eol_style: Some(eol_style),
        keywords: None,
    };

    let notify = TerminalNotify;
    let cancellation = crate::patch::NeverCancelled;
    let mut applied = 0usize;
    let mut skipped = 0usize;
    let mut deleted_relpaths = Vec::new();
    for chunk in patch::split_document(&document) {
        let parsed = patch::parse(&chunk)
            .map_err(|e| WcError::new(ErrorKind::BadFilename, format!("failed to parse patch chunk: {e}")))?;
        match patch::apply_patch_to_target(&wc, &wc_root, &admin_dir, &parsed, &opts, &notify, &cancellation).await? {
            crate::patch::TargetOutcome::Applied { relpath, deleted, .. } => {
                applied += 1;
                if deleted {
                    deleted_relpaths.push(relpath);
                }
            }
            crate::patch::TargetOutcome::Skipped { .. } => skipped += 1,
            crate::patch::TargetOutcome::Cancelled => break,
        }
    }
    if !args.dry_run {
        patch::cleanup_empty_ancestors(&wc, &wc_root, &deleted_relpaths, &notify).await?;
    }
    println!("{applied} target(s) patched, {skipped} skipped");
    Ok(())
}

async fn lock_cmd(args: LockArgs) -> Result<()> {
    let (wc, wc_root, _admin) = open_here().await?;
    let relpath = relpath_for(&wc_root, &args.path)?;
    let depth = if args.recursive { -1 } else { 0 };
    lock::wclock_set(&wc, relpath.as_str(), depth, &args.owner).await?;
    println!("{} {}", "Locked".green(), relpath.as_str());
    Ok(())
}

async fn unlock_cmd(args: UnlockArgs) -> Result<()> {
    let (wc, wc_root, _admin) = open_here().await?;
    let relpath = relpath_for(&wc_root, &args.path)?;
    lock::wclock_remove(&wc, relpath.as_str()).await?;
    println!("{} {}", "Unlocked".green(), relpath.as_str());
    Ok(())
}

async fn cleanup_cmd(args: CleanupArgs) -> Result<()> {
    let (wc, _wc_root, _admin) = open_here().await?;
    workqueue::drain(&wc, &TerminalNotify).await?;
    if !args.lock_path.is_empty() {
        lock::wclock_remove(&wc, &args.lock_path).await?;
    }
    println!("{}", "Cleanup complete".green());
    Ok(())
}

async fn add_cmd(args: AddArgs) -> Result<()> {
    let (wc, wc_root, _admin) = open_here().await?;
    let relpath = relpath_for(&wc_root, &args.path)?;
    let abspath = wc_root.join(relpath.as_str());
    if abspath.is_dir() {
        working::op_add_directory(&wc, relpath.as_str()).await?;
    } else {
        let bytes = fs::read(&abspath).map_err(|e| io_write_error(&abspath, e))?;
        working::op_add_file(&wc, relpath.as_str(), Sha1::of(&bytes)).await?;
    }
    println!("{} {}", "A".green(), relpath.as_str());
    Ok(())
}

/// The `(repos_id, revision)` to record as `copyfrom` on a copy/move's
/// destination: the source's own BASE identity if it has one, else the
/// working copy's sole registered repository at revision 0 (copying an
/// uncommitted addition).
async fn copyfrom_origin(wc: &WorkingCopyDb, src: &str) -> Result<(i64, i64)> {
    if let Some(b) = working::base_row(wc, src).await? {
        if let Some(repos_id) = b.repos_id {
            return Ok((repos_id, b.revision.unwrap_or(0)));
        }
    }
    Ok((wc.repos_register("", "").await?, 0))
}

async fn copy_cmd(args: CopyArgs) -> Result<()> {
    let (wc, wc_root, _admin) = open_here().await?;
    let src = relpath_for(&wc_root, &args.src)?;
    let dst = relpath_for(&wc_root, &args.dst)?;
    let (repos_id, revision) = copyfrom_origin(&wc, src.as_str()).await?;
    working::op_copy(&wc, src.as_str(), dst.as_str(), repos_id, revision).await?;
    println!("{} {} -> {}", "A".green(), src.as_str(), dst.as_str());
    Ok(())
}

async fn move_cmd(args: MoveArgs) -> Result<()> {
    let (wc, wc_root, _admin) = open_here().await?;
    let src = relpath_for(&wc_root, &args.src)?;
    let dst = relpath_for(&wc_root, &args.dst)?;
    let (repos_id, revision) = copyfrom_origin(&wc, src.as_str()).await?;
    working::op_copy(&wc, src.as_str(), dst.as_str(), repos_id, revision).await?;
    working::op_delete(&wc, src.as_str(), true).await?;
    println!("{} {} -> {}", "R".yellow(), src.as_str(), dst.as_str());
    Ok(())
}

async fn remove_cmd(args: RemoveArgs) -> Result<()> {
    let (wc, wc_root, _admin) = open_here().await?;
    let relpath = relpath_for(&wc_root, &args.path)?;
    working::op_delete(&wc, relpath.as_str(), true).await?;
    println!("{} '{}'", "rm".bright_yellow(), relpath.as_str());
    Ok(())
}

async fn revert_cmd(args: RevertArgs) -> Result<()> {
    let (wc, wc_root, _admin) = open_here().await?;
    let relpath = relpath_for(&wc_root, &args.path)?;
    let addition = working::scan_addition(&wc, relpath.as_str()).await?;
    working::op_delete(&wc, &addition.op_root, true).await?;
    actual::op_mark_resolved(&wc, relpath.as_str()).await?;
    println!("{} {}", "Reverted".green(), relpath.as_str());
    Ok(())
}

/// Verifies the CLI builds without panicking.
#[test]
fn verify_cli() {
    use clap::CommandFactory;

    Cli::command().debug_assert()
}
