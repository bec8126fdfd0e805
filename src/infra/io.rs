//! File reading, line buffering and atomic rewrites.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::infra::paths::PathError;

/// I/O failures, always naming the root-relative file.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Failed to read '{rel}': {source}")]
    Read { rel: String, source: io::Error },

    #[error("Failed to write '{rel}': {source}")]
    Write { rel: String, source: io::Error },

    #[error("Failed to create backup file for '{rel}': {source}")]
    Backup { rel: String, source: io::Error },
}

/// Read a file as text, dropping invalid UTF-8 sequences instead of failing.
///
/// Only for read-only reports; anything that writes the text back uses
/// [`read_source_strict`].
pub fn read_source(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).replace('\u{FFFD}', ""),
    })
}

/// Read a file that is about to be rewritten; invalid UTF-8 is an error so
/// untouched bytes can never be lost on the way back out.
pub fn read_source_strict(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "not valid UTF-8 (invalid byte at offset {}); refusing to rewrite it",
                e.utf8_error().valid_up_to()
            ),
        )
    })
}

/// Split file text into lines (LF or CRLF), dropping terminators.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Line storage the edit protocols work on.
///
/// Plain `String`s for pure computations, [`SourceLine`]s when the result
/// is written back and every untouched line must keep its terminator.
pub trait EditLine {
    fn text(&self) -> &str;

    /// A line that did not exist in the original file.
    fn fresh(text: String) -> Self;
}

impl EditLine for String {
    fn text(&self) -> &str {
        self
    }

    fn fresh(text: String) -> Self {
        text
    }
}

/// One line of a file plus the terminator it was read with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub text: String,

    /// `\n`, `\r\n`, `""` for an unterminated last line, `None` when new.
    pub ending: Option<&'static str>,
}

impl EditLine for SourceLine {
    fn text(&self) -> &str {
        &self.text
    }

    fn fresh(text: String) -> Self {
        Self { text, ending: None }
    }
}

/// Owned line array plus what is needed to write it back faithfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    pub lines: Vec<SourceLine>,

    /// Whether the original ended with a line terminator.
    pub trailing_newline: bool,

    /// First terminator seen; used when no neighbour has one.
    pub default_ending: &'static str,
}

impl LineBuffer {
    pub fn parse(text: &str) -> Self {
        let bytes = text.as_bytes();
        let default_ending = match memchr::memchr(b'\n', bytes) {
            Some(pos) if pos > 0 && bytes[pos - 1] == b'\r' => "\r\n",
            _ => "\n",
        };

        let lines = text
            .split_inclusive('\n')
            .map(|piece| {
                let (text, ending) = if let Some(t) = piece.strip_suffix("\r\n") {
                    (t, "\r\n")
                } else if let Some(t) = piece.strip_suffix('\n') {
                    (t, "\n")
                } else {
                    (piece, "")
                };
                SourceLine {
                    text: text.to_string(),
                    ending: Some(ending),
                }
            })
            .collect();

        Self {
            lines,
            trailing_newline: text.ends_with('\n'),
            default_ending,
        }
    }

    /// Join every line with its own terminator. New lines (and a formerly
    /// last line that is no longer last) borrow the nearest neighbour's.
    /// The final line is terminated only if the original's was.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let last = self.lines.len().saturating_sub(1);

        for (i, line) in self.lines.iter().enumerate() {
            out.push_str(&line.text);
            if i < last || self.trailing_newline {
                out.push_str(own_ending(line).unwrap_or_else(|| self.neighbour_ending(i)));
            }
        }
        out
    }

    fn neighbour_ending(&self, index: usize) -> &'static str {
        let before = self.lines[..index].iter().rev();
        let after = self.lines[index + 1..].iter();
        before
            .chain(after)
            .find_map(own_ending)
            .unwrap_or(self.default_ending)
    }
}

fn own_ending(line: &SourceLine) -> Option<&'static str> {
    line.ending.filter(|e| !e.is_empty())
}

/// Replace `path` with `data` via a same-directory temp file and rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    // Prefer same-dir tempfile so the final rename stays on one filesystem
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    // Preserve original permissions when the target already exists
    let perms = fs::metadata(path).map(|m| m.permissions()).ok();

    let tmp = tempfile::NamedTempFile::new_in(dir)?;

    // Write the content fully before anything is renamed
    let mut file = tmp.as_file();
    file.write_all(data)?;
    file.sync_all()?;

    if let Some(perms) = perms {
        fs::set_permissions(tmp.path(), perms)?;
    }

    // Atomically replace the destination
    tmp.persist(path).map_err(|e| e.error)?;

    // fsync parent dir to make the rename durable on Unix
    #[cfg(unix)]
    {
        if let Ok(parent_file) = fs::File::open(dir) {
            let _ = parent_file.sync_all();
        }
    }

    debug!(path = %path.display(), bytes = data.len(), "atomic write complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn texts(buf: &LineBuffer) -> Vec<&str> {
        buf.lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn round_trips_lf_with_trailing_newline() {
        let text = "a\nb\n\nc\n";
        let buf = LineBuffer::parse(text);
        assert_eq!(texts(&buf), vec!["a", "b", "", "c"]);
        assert!(buf.trailing_newline);
        assert_eq!(buf.default_ending, "\n");
        assert_eq!(buf.render(), text);
    }

    #[test]
    fn round_trips_without_trailing_newline() {
        let text = "a\nb";
        assert_eq!(LineBuffer::parse(text).render(), text);
    }

    #[test]
    fn keeps_crlf_style() {
        let text = "a\r\nb\r\n";
        let buf = LineBuffer::parse(text);
        assert_eq!(texts(&buf), vec!["a", "b"]);
        assert_eq!(buf.default_ending, "\r\n");
        assert_eq!(buf.render(), text);
    }

    #[test]
    fn mixed_endings_survive_an_edit_elsewhere() {
        let mut buf = LineBuffer::parse("a\r\nb\nc\n");
        buf.lines[2] = SourceLine::fresh("C".to_string());
        assert_eq!(buf.render(), "a\r\nb\nC\n");
    }

    #[test]
    fn new_lines_borrow_the_neighbouring_ending() {
        let mut buf = LineBuffer::parse("a\r\nb\n");
        buf.lines.insert(1, SourceLine::fresh("x".to_string()));
        assert_eq!(buf.render(), "a\r\nx\r\nb\n");

        let mut buf = LineBuffer::parse("a\r\nb\n");
        buf.lines.insert(0, SourceLine::fresh("x".to_string()));
        assert_eq!(buf.render(), "x\r\na\r\nb\n");
    }

    #[test]
    fn appending_after_unterminated_last_line() {
        let mut buf = LineBuffer::parse("a\r\nb");
        buf.lines.push(SourceLine::fresh("c".to_string()));
        assert_eq!(buf.render(), "a\r\nb\r\nc");
    }

    #[test]
    fn empty_text_has_no_lines() {
        let buf = LineBuffer::parse("");
        assert!(buf.lines.is_empty());
        assert_eq!(buf.render(), "");
    }

    #[test]
    fn lossy_read_drops_invalid_bytes() {
        let tmp = TempDir::new().unwrap();
        let p = tmp.path().join("x.f");
        fs::write(&p, b"ab\xffcd\n").unwrap();
        assert_eq!(read_source(&p).unwrap(), "abcd\n");
    }

    #[test]
    fn strict_read_rejects_invalid_bytes() {
        let tmp = TempDir::new().unwrap();
        let p = tmp.path().join("x.f");
        fs::write(&p, b"! caf\xe9\n").unwrap();
        let err = read_source_strict(&p).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("offset 5"));

        fs::write(&p, "! café\n").unwrap();
        assert_eq!(read_source_strict(&p).unwrap(), "! café\n");
    }

    #[test]
    fn atomic_write_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let p = tmp.path().join("x.f90");
        fs::write(&p, "old\n").unwrap();
        write_atomic(&p, b"new\n").unwrap();
        assert_eq!(fs::read_to_string(&p).unwrap(), "new\n");
    }
}
