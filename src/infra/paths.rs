//! Bound-root path resolution.
//!
//! Every file-scoped operation resolves its user-supplied path through a
//! [`BoundRoot`]. Relative paths are joined onto the root, `~` is expanded,
//! `.`/`..` are folded lexically, and the deepest existing ancestor is
//! canonicalized so a symlink cannot smuggle the target outside the root.
//! Containment is checked on the lexical form before anything touches the
//! filesystem.

use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

/// Path-safety and existence failures.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("Requested path {requested} is outside the allowed root {root}")]
    OutsideRoot { requested: PathBuf, root: PathBuf },

    #[error("File '{rel}' does not exist.")]
    NotFound { rel: String },

    #[error("Path '{rel}' is not a regular file.")]
    NotAFile { rel: String },

    #[error("Project root {path} is not a usable directory: {source}")]
    Root { path: PathBuf, source: io::Error },
}

/// A resolved path that is known to live inside the bound root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Absolute path inside the root.
    pub path: PathBuf,
    /// Root-relative display form (`/`-separated).
    pub rel: String,
}

/// The directory outside which path resolution is refused.
#[derive(Debug, Clone)]
pub struct BoundRoot {
    root: PathBuf,
}

impl BoundRoot {
    /// Bind to `dir`, which must exist and be a directory.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, PathError> {
        let dir = dir.as_ref();
        let root = dunce::canonicalize(dir).map_err(|source| PathError::Root {
            path: dir.to_path_buf(),
            source,
        })?;
        if !root.is_dir() {
            return Err(PathError::Root {
                path: dir.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }
        Ok(Self { root })
    }

    /// Canonical root directory.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve `requested` and require that it stays inside the root.
    /// An empty request resolves to the root itself.
    pub fn resolve(&self, requested: &str) -> Result<ResolvedPath, PathError> {
        let trimmed = requested.trim();
        let trimmed = if trimmed.is_empty() { "." } else { trimmed };
        let expanded = shellexpand::tilde(trimmed);

        let candidate = Path::new(expanded.as_ref());
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };

        // Lexical check first: `../../etc/passwd` never reaches the disk.
        let lexical = normalize_lexically(&joined);
        if !lexical.starts_with(&self.root) {
            return Err(self.outside(lexical));
        }

        let resolved = canonicalize_existing_prefix(&lexical);
        if !resolved.starts_with(&self.root) {
            return Err(self.outside(resolved));
        }

        debug!(requested = trimmed, resolved = %resolved.display(), "resolved path");
        Ok(ResolvedPath {
            rel: self.relative(&resolved),
            path: resolved,
        })
    }

    /// Resolve and require an existing regular file.
    pub fn existing_file(&self, requested: &str) -> Result<ResolvedPath, PathError> {
        let resolved = self.resolve(requested)?;
        if !resolved.path.exists() {
            return Err(PathError::NotFound { rel: resolved.rel });
        }
        if !resolved.path.is_file() {
            return Err(PathError::NotAFile { rel: resolved.rel });
        }
        Ok(resolved)
    }

    /// Root-relative display string for a path inside the root.
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        if rel.as_os_str().is_empty() {
            return ".".to_string();
        }
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn outside(&self, requested: PathBuf) -> PathError {
        PathError::OutsideRoot {
            requested,
            root: self.root.clone(),
        }
    }
}

/// Fold `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the deepest existing ancestor and re-append the rest, so
/// paths of files that do not exist yet still resolve through symlinks.
fn canonicalize_existing_prefix(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut tail: Vec<std::ffi::OsString> = Vec::new();

    loop {
        if let Ok(canon) = dunce::canonicalize(&existing) {
            let mut out = canon;
            for part in tail.iter().rev() {
                out.push(part);
            }
            return out;
        }
        match (existing.file_name().map(|n| n.to_os_string()), existing.parent()) {
            (Some(name), Some(parent)) => {
                tail.push(name);
                existing = parent.to_path_buf();
            }
            _ => return path.to_path_buf(),
        }
    }
}
