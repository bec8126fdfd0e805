//! Listing of the Fortran sources under the bound root.

use std::{fs, path::Path};

use crate::infra::{
    paths::BoundRoot,
    walk::{FileWalker, WalkError},
};

/// Count lines the way `str::lines` would: a final unterminated line counts.
fn count_lines(path: &Path) -> Option<usize> {
    let bytes = fs::read(path).ok()?;
    let newlines = memchr::memchr_iter(b'\n', &bytes).count();
    let tail = usize::from(!bytes.is_empty() && bytes.last() != Some(&b'\n'));
    Some(newlines + tail)
}

/// `Fortran sources:` followed by `<rel> (<N> lines)`, at most `max_files`.
pub fn list_sources(
    root: &BoundRoot,
    extensions: &[String],
    ignore_patterns: &[String],
    max_files: usize,
) -> Result<String, WalkError> {
    let files = FileWalker::new(ignore_patterns)?
        .with_extensions(extensions)
        .walk_files(root.path());

    if files.is_empty() {
        return Ok(format!("No Fortran sources found under {}", root.path().display()));
    }

    let shown = max_files.max(1).min(files.len());
    let mut out = vec!["Fortran sources:".to_string()];
    for path in &files[..shown] {
        let rel = root.relative(path);
        match count_lines(path) {
            Some(n) => out.push(format!("{rel} ({n} lines)")),
            None => out.push(format!("{rel} (unreadable)")),
        }
    }
    if files.len() > shown {
        out.push(format!("... and {} more", files.len() - shown));
    }

    Ok(out.join("\n"))
}
