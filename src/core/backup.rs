//! One-time sibling backups taken before the first write to a file.
//!
//! The backup of `src/foo.f90` lives next to it as `src/foo.f90.orig`
//! (suffix configurable). It is created at most once: if it already exists
//! it is left untouched, so it always holds the content from before the
//! first mutation. Backups are never deleted here.

use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use tracing::info;

use crate::infra::{io::FileError, paths::ResolvedPath};

/// Default suffix appended to the original file name.
pub const DEFAULT_BACKUP_SUFFIX: &str = ".orig";

/// What `ensure_backup` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// A fresh copy was written.
    Created { rel: String, backup_rel: String },
    /// A backup from an earlier write was kept as is.
    Reused { backup_rel: String },
}

impl BackupOutcome {
    /// One-line report fragment for the caller.
    pub fn message(&self) -> String {
        match self {
            BackupOutcome::Created { rel, backup_rel } => {
                format!("Copied '{rel}' to '{backup_rel}'.")
            }
            BackupOutcome::Reused { backup_rel } => {
                format!("Backup already exists at '{backup_rel}'.")
            }
        }
    }
}

/// Sibling backup path: the file name with `suffix` appended.
pub fn backup_path_for(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Create the backup for `target` unless one already exists.
///
/// The copy carries the original bytes, permissions and modification time.
/// Any failure is reported as `FileError::Backup` and the caller must not
/// go on to write the target.
pub fn ensure_backup(target: &ResolvedPath, suffix: &str) -> Result<BackupOutcome, FileError> {
    let backup = backup_path_for(&target.path, suffix);
    let backup_rel = format!("{}{suffix}", target.rel);

    if backup.exists() {
        return Ok(BackupOutcome::Reused { backup_rel });
    }

    copy_preserving(&target.path, &backup).map_err(|source| {
        // Do not leave a partial copy that would later be mistaken for a
        // good backup.
        let _ = fs::remove_file(&backup);
        FileError::Backup {
            rel: target.rel.clone(),
            source,
        }
    })?;

    info!(file = %target.rel, backup = %backup_rel, "created backup");
    Ok(BackupOutcome::Created {
        rel: target.rel.clone(),
        backup_rel,
    })
}

/// `fs::copy` keeps permissions; the modification time is copied by hand.
fn copy_preserving(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to)?;
    let modified = fs::metadata(from)?.modified()?;
    let dest = File::options().write(true).open(to)?;
    dest.set_modified(modified)?;
    dest.sync_all()
}
