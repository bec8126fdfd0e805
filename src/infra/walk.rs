//! Filepath: src/infra/walk.rs
//! Gitignore-aware source walker.
//! - Respects .gitignore, .git/info/exclude, and global gitignore
//!   (also outside a git repository)
//! - Extra ignore globs from configuration (early prune + late filter)
//! - Case-insensitive extension filter (`.f90`, `.F`, ...)
//! - Deterministic ordering for stable reports and tests
//!
//! Backed by ripgrep's `ignore` crate and `globset`.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use tracing::debug;

/// Extensions treated as Fortran sources when nothing else is configured.
pub const FORTRAN_EXTENSIONS: &[&str] = &[".f", ".for", ".f90", ".f95", ".f03", ".f08"];

/// Invalid ignore glob in configuration
#[derive(Debug, thiserror::Error)]
#[error("Invalid ignore pattern '{pattern}': {source}")]
pub struct WalkError
{
    pattern: String,
    source: globset::Error,
}

/// Walker over the files of one tree, filtered by ignore rules and extension.
pub struct FileWalker
{
    /// Compiled set of additional ignore patterns
    ignore_patterns: GlobSet,

    /// Lowercased extensions with leading dot; empty keeps every file
    extensions: Vec<String>,
}

impl FileWalker
{
    /// Build a walker with additional ignore patterns (e.g. "build/**").
    /// Patterns match on root-relative paths.
    pub fn new(additional_ignores: &[String]) -> Result<Self, WalkError>
    {
        let mut builder = GlobSetBuilder::new();

        for pattern in additional_ignores
        {
            let glob = Glob::new(pattern).map_err(|source| WalkError {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }

        let ignore_patterns = builder
            .build()
            .map_err(|source| WalkError {
                pattern: additional_ignores.join(", "),
                source,
            })?;

        Ok(Self {
            ignore_patterns,
            extensions: Vec::new(),
        })
    }

    /// Keep only files whose extension is in `exts` (dot optional, any case).
    pub fn with_extensions<S: AsRef<str>>(
        mut self,
        exts: &[S],
    ) -> Self
    {
        self.extensions = exts
            .iter()
            .map(|e| normalize_extension(e.as_ref()))
            .filter(|e| e.len() > 1)
            .collect();
        self
    }

    /// Whether `path` passes the extension filter.
    pub fn matches_extension(
        &self,
        path: &Path,
    ) -> bool
    {
        if self
            .extensions
            .is_empty()
        {
            return true;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .is_some_and(|e| {
                self.extensions
                    .contains(&e)
            })
    }

    fn build_walk(
        &self,
        root: &Path,
    ) -> WalkBuilder
    {
        let mut b = WalkBuilder::new(root);

        // Hidden files are visited like any other; ignore files decide.
        b.hidden(false);
        b.git_ignore(true);
        b.git_global(true);
        b.git_exclude(true);
        b.require_git(false);

        // Early directory pruning on the root-relative path.
        let extra = self
            .ignore_patterns
            .clone();
        let base = root.to_path_buf();
        b.filter_entry(move |ent: &DirEntry| {
            let is_dir = ent
                .file_type()
                .is_some_and(|ft| ft.is_dir());
            if !is_dir
            {
                return true;
            }

            let rel = ent
                .path()
                .strip_prefix(&base)
                .unwrap_or(ent.path());
            !(extra.is_match(rel) || extra.is_match(rel.join("")))
        });

        b
    }

    /// Traverse files under `root`; returns a **sorted** list of paths.
    pub fn walk_files<P: AsRef<Path>>(
        &self,
        root: P,
    ) -> Vec<PathBuf>
    {
        let root_path = root.as_ref();

        let mut out: Vec<PathBuf> = self
            .build_walk(root_path)
            .build()
            .filter_map(|res| match res
            {
                Ok(entry) => Some(entry),
                Err(err) =>
                {
                    debug!(error = %err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| {
                entry
                    .file_type()
                    .is_some_and(|ft| ft.is_file())
            })
            .map(|entry| entry.into_path())
            .filter(|abs| self.matches_extension(abs))
            // Late file-level filter on the relative path
            .filter(|abs| {
                let rel = abs
                    .strip_prefix(root_path)
                    .unwrap_or(abs);
                !self
                    .ignore_patterns
                    .is_match(rel)
            })
            .collect();

        out.sort();
        out
    }
}

/// `F90` → `.f90`, `.For` → `.for`
fn normalize_extension(ext: &str) -> String
{
    let trimmed = ext
        .trim()
        .trim_start_matches('.');
    format!(".{}", trimmed.to_ascii_lowercase())
}
