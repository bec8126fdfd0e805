//! Line-range reads with fixed-width line numbers.

pub mod target;

pub use target::{ReadTarget, TargetError};

use tracing::debug;

use crate::infra::{
    io::{FileError, read_source, split_lines},
    paths::BoundRoot,
    snippet::format_numbered_snippet,
};

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error("start_line must be >= 1 (got 0).")]
    ZeroStart,

    #[error("end_line ({end}) is before start_line ({start}).")]
    Reversed { start: usize, end: usize },

    #[error("start_line {start} is out of range: '{rel}' has {len} line(s).")]
    OutOfRange { start: usize, rel: String, len: usize },
}

/// Render lines `start..=end` of a file (defaults: whole file, end clamped).
pub fn read_lines(
    root: &BoundRoot,
    file_path: &str,
    start: Option<usize>,
    end: Option<usize>,
    width: usize,
) -> Result<String, ReadError> {
    let start = start.unwrap_or(1);
    if start == 0 {
        return Err(ReadError::ZeroStart);
    }
    if let Some(end) = end
        && end < start
    {
        return Err(ReadError::Reversed { start, end });
    }

    let resolved = root.existing_file(file_path).map_err(FileError::from)?;
    let text = read_source(&resolved.path).map_err(|source| FileError::Read {
        rel: resolved.rel.clone(),
        source,
    })?;
    let lines = split_lines(&text);
    let len = lines.len();

    if len == 0 {
        return Ok(format!("# {} (empty file)", resolved.rel));
    }
    if start > len {
        return Err(ReadError::OutOfRange {
            start,
            rel: resolved.rel,
            len,
        });
    }

    let end = end.unwrap_or(len).min(len);
    debug!(file = %resolved.rel, start, end, "reading lines");

    let snippet = format_numbered_snippet(&lines[start - 1..end], start, width);
    Ok(format!("# {} (lines {start}-{end} of {len})\n{snippet}", resolved.rel))
}
