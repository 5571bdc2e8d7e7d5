use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::io::IoError;

/// How backups are kept after each successful save
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackupPolicy {
    /// Directory holding one sub-directory of backups per document
    pub root: PathBuf,
    /// Skip the backup while the newest one is younger than this. Zero never skips.
    pub interval: Duration,
    /// Keep at most this many backups per document. Zero keeps all of them.
    pub max_count: usize,
}

impl BackupPolicy {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            interval: Duration::from_secs(60),
            max_count: 100,
        }
    }
}

/// 64-bit FNV-1a, stable across runs and platforms
pub fn stable_hash(text: &str) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    text.bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    })
}

/// Where the backups of `file_path` live under `root`.
///
/// A file that is itself a backup keeps its backups next to it, so restoring
/// an old backup and editing it does not start a fresh backup series.
pub fn backup_directory(file_path: &Path, root: &Path) -> Option<PathBuf> {
    let file_name = file_path.file_name()?.to_string_lossy();

    if let Some(dir) = file_path.parent()
        && dir.parent() == Some(root)
    {
        return Some(dir.to_path_buf());
    }

    let hash = stable_hash(&file_path.to_string_lossy());
    Some(root.join(format!("{file_name}_{hash}")))
}

/// Copy `file_path` into its backup directory, rotating old backups.
///
/// Returns the new backup's path, or `None` when the newest backup is still
/// within `policy.interval` of `now`.
pub fn create_backup(
    file_path: &Path,
    policy: &BackupPolicy,
    now: SystemTime,
) -> Result<Option<PathBuf>, IoError> {
    let dir = backup_directory(file_path, &policy.root).ok_or(IoError::NoFilePath)?;
    fs::create_dir_all(&dir)?;

    let existing = existing_backups(&dir, file_path)?;

    if let Some(newest) = existing.last() {
        if !policy.interval.is_zero() {
            let modified = fs::metadata(newest)?.modified()?;
            if modified + policy.interval >= now {
                log::debug!(
                    "skipping backup of {}: newest backup is too recent",
                    file_path.display()
                );
                return Ok(None);
            }
        }

        if policy.max_count > 0 && existing.len() >= policy.max_count {
            let excess = existing.len() - policy.max_count + 1;
            for old in &existing[..excess] {
                fs::remove_file(old)?;
                log::info!("removed old backup {}", old.display());
            }
        }
    }

    let target = unique_path(&dir, &backup_file_name(file_path, now));
    fs::copy(file_path, &target)?;
    log::info!("backed up {} to {}", file_path.display(), target.display());

    Ok(Some(target))
}

/// Files in `dir` other than `file_path` itself, oldest first
fn existing_backups(dir: &Path, file_path: &Path) -> Result<Vec<PathBuf>, IoError> {
    // A document opened from its own backup directory is not one of its backups
    let own = fs::canonicalize(file_path).ok();

    let mut backups = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_own = path == file_path || (own.is_some() && fs::canonicalize(&path).ok() == own);
        if !path.is_file() || is_own {
            continue;
        }
        let modified = fs::metadata(&path)?.modified()?;
        backups.push((modified, path));
    }
    // Equal timestamps fall back to the name, which embeds the backup time
    backups.sort();
    Ok(backups.into_iter().map(|(_, path)| path).collect())
}

/// `dir/name`, or `dir/<stem>_<n>.<ext>` when a backup made in the same
/// millisecond already took that name
fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let target = dir.join(name);
    if !target.exists() {
        return target;
    }
    let name = Path::new(name);
    let stem = name.file_stem().unwrap_or_default().to_string_lossy();
    let ext = name.extension().map(|ext| format!(".{}", ext.to_string_lossy()));
    (1..)
        .map(|n| dir.join(format!("{stem}_{n}{}", ext.as_deref().unwrap_or_default())))
        .find(|candidate| !candidate.exists())
        .unwrap_or(target)
}

/// `<stem>_<yyyy-MM-dd_HH-mm-ss-fff>[.<ext>]`
fn backup_file_name(file_path: &Path, now: SystemTime) -> String {
    let stem = file_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stamp = DateTime::<Local>::from(now).format("%Y-%m-%d_%H-%M-%S-%3f");

    match file_path.extension() {
        Some(ext) => format!("{stem}_{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{stamp}"),
    }
}
