//! Safe in-place editing of files under the bound root.
//!
//! Two edit protocols share one pipeline:
//! - line directives: 1-based insert/delete instructions, all numbered
//!   against the original content and applied all-or-nothing
//! - block replace: swap an inclusive line range for new text, or insert
//!   before a line when `end_line == start_line - 1`
//!
//! Pipeline per call: resolve inside the root, check the file, take the
//! one-time backup, read, apply on an owned line buffer, write atomically.
//! In dry-run mode the backup and the write are skipped and a unified diff
//! of the would-be change is returned instead.

use std::{fs, sync::LazyLock};

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use similar::TextDiff;
use tracing::{debug, info, instrument};

use crate::{
    core::backup::{BackupOutcome, ensure_backup},
    infra::{
        io::{EditLine, FileError, LineBuffer, SourceLine, read_source, read_source_strict, split_lines, write_atomic},
        paths::{BoundRoot, PathError, ResolvedPath},
    },
};

/// `LINE +text` / `LINE -text`
static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s*([+-])").unwrap_or_else(|_| panic!("Invalid directive regex"))
});

/// Line-directive operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LineOp {
    /// Insert the text before the numbered line
    Insert,
    /// Remove the numbered line
    Delete,
}

/// One insert/delete instruction keyed by a 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LineDirective {
    /// 1-based line number in the original file.
    pub line: usize,
    /// `insert` or `delete`.
    pub operation: LineOp,
    /// Inserted text, or for deletes the expected current line (empty skips the check).
    #[serde(default)]
    pub content: String,
}

impl LineDirective {
    pub fn insert(line: usize, content: impl Into<String>) -> Self {
        Self {
            line,
            operation: LineOp::Insert,
            content: content.into(),
        }
    }

    pub fn delete(line: usize, content: impl Into<String>) -> Self {
        Self {
            line,
            operation: LineOp::Delete,
            content: content.into(),
        }
    }
}

/// Replace `[start_line, end_line]` (1-based, inclusive) with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReplace {
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
}

impl BlockReplace {
    /// `end_line == start_line - 1` inserts without deleting.
    pub fn is_insertion(&self) -> bool {
        self.start_line.checked_sub(1) == Some(self.end_line)
    }
}

/// Validation and state-mismatch failures of the edit protocols.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("No edit directives were supplied.")]
    NoDirectives,

    #[error(
        "Invalid directive on script line {number}: '{text}'. Expected '<line> + <text>' or '<line> - <text>'."
    )]
    Syntax { number: usize, text: String },

    #[error("Line numbers must be positive integers (directive {position} uses {line}).")]
    NonPositiveLine { position: usize, line: usize },

    #[error("Cannot delete line {line}: the file has {len} line(s).")]
    DeleteOutOfRange { line: usize, len: usize },

    #[error("Cannot insert at line {line}: the file has {len} line(s), so the last valid insert position is {}.", .len + 1)]
    InsertOutOfRange { line: usize, len: usize },

    #[error("Line {line} is deleted more than once.")]
    DuplicateDelete { line: usize },

    #[error("Line {line} content mismatch. Expected: '{expected}'. Found: '{found}'.")]
    Mismatch {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("start_line must be >= 1 (got {start}).")]
    BlockStart { start: usize },

    #[error("end_line ({end}) must be >= start_line - 1 ({}).", .start - 1)]
    BlockOrder { start: usize, end: usize },

    #[error("start_line {start} is out of range: the file has {len} line(s).")]
    BlockStartOutOfRange { start: usize, len: usize },

    #[error("end_line {end} is out of range: the file has {len} line(s).")]
    BlockEndOutOfRange { end: usize, len: usize },
}

/// Anything a mutating call can fail with.
#[derive(Debug, thiserror::Error)]
pub enum MutateError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

impl From<PathError> for MutateError {
    fn from(err: PathError) -> Self {
        MutateError::File(FileError::Path(err))
    }
}

/// Parse a directive script: one `LINE +|- [text]` per non-blank line.
pub fn parse_directives(script: &str) -> Result<Vec<LineDirective>, EditError> {
    let mut out = Vec::new();

    for (idx, raw) in split_lines(script).iter().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let syntax = || EditError::Syntax {
            number: idx + 1,
            text: raw.clone(),
        };

        let caps = DIRECTIVE_RE.captures(raw).ok_or_else(syntax)?;
        let (Some(num), Some(op), Some(all)) = (caps.get(1), caps.get(2), caps.get(0)) else {
            return Err(syntax());
        };
        let line = num.as_str().parse::<usize>().map_err(|_| syntax())?;
        let operation = if op.as_str() == "+" { LineOp::Insert } else { LineOp::Delete };

        out.push(LineDirective {
            line,
            operation,
            content: directive_payload(&raw[all.end()..]).to_string(),
        });
    }

    if out.is_empty() {
        return Err(EditError::NoDirectives);
    }
    Ok(out)
}

/// Drop the single separator after the operator, keeping indentation.
fn directive_payload(rest: &str) -> &str {
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(' ' | '\t'), None) => "",
        (Some(' ' | '\t'), Some(c)) if !c.is_whitespace() => &rest[1..],
        _ => rest,
    }
}

/// Checks that need no file content.
pub fn check_directive_shape(directives: &[LineDirective]) -> Result<(), EditError> {
    if directives.is_empty() {
        return Err(EditError::NoDirectives);
    }
    for (i, d) in directives.iter().enumerate() {
        if d.line == 0 {
            return Err(EditError::NonPositiveLine {
                position: i + 1,
                line: d.line,
            });
        }
    }
    Ok(())
}

/// Validate every directive against `lines`, then apply all of them.
///
/// Returns `(additions, removals)`. On error `lines` is untouched.
pub fn apply_directives<L: EditLine>(
    lines: &mut Vec<L>,
    directives: &[LineDirective],
) -> Result<(usize, usize), EditError> {
    check_directive_shape(directives)?;
    let len = lines.len();

    let mut deleted = Vec::new();
    for d in directives {
        match d.operation {
            LineOp::Delete => {
                if d.line > len {
                    return Err(EditError::DeleteOutOfRange { line: d.line, len });
                }
                if deleted.contains(&d.line) {
                    return Err(EditError::DuplicateDelete { line: d.line });
                }
                deleted.push(d.line);

                let found = lines[d.line - 1].text();
                if !d.content.is_empty() && found != d.content {
                    return Err(EditError::Mismatch {
                        line: d.line,
                        expected: d.content.clone(),
                        found: found.to_string(),
                    });
                }
            }
            LineOp::Insert => {
                if d.line > len + 1 {
                    return Err(EditError::InsertOutOfRange { line: d.line, len });
                }
            }
        }
    }

    // Descending line, deletes first; same-line inserts run in reverse input
    // order so they land in input order.
    let mut order: Vec<(usize, &LineDirective)> = directives.iter().enumerate().collect();
    order.sort_by(|(ia, a), (ib, b)| {
        b.line
            .cmp(&a.line)
            .then_with(|| op_rank(a.operation).cmp(&op_rank(b.operation)))
            .then_with(|| ib.cmp(ia))
    });

    let (mut added, mut removed) = (0, 0);
    for (_, d) in order {
        match d.operation {
            LineOp::Delete => {
                lines.remove(d.line - 1);
                removed += 1;
            }
            LineOp::Insert => {
                lines.insert(d.line - 1, L::fresh(d.content.clone()));
                added += 1;
            }
        }
    }

    Ok((added, removed))
}

fn op_rank(op: LineOp) -> u8 {
    match op {
        LineOp::Delete => 0,
        LineOp::Insert => 1,
    }
}

/// Checks that need no file content.
pub fn check_block_shape(block: &BlockReplace) -> Result<(), EditError> {
    if block.start_line == 0 {
        return Err(EditError::BlockStart { start: 0 });
    }
    if block.end_line < block.start_line - 1 {
        return Err(EditError::BlockOrder {
            start: block.start_line,
            end: block.end_line,
        });
    }
    Ok(())
}

/// Splice the block into `lines`. Returns `(removed, inserted)`.
pub fn apply_block<L: EditLine>(lines: &mut Vec<L>, block: &BlockReplace) -> Result<(usize, usize), EditError> {
    check_block_shape(block)?;
    let len = lines.len();

    if block.start_line > len + 1 {
        return Err(EditError::BlockStartOutOfRange {
            start: block.start_line,
            len,
        });
    }
    if !block.is_insertion() && block.end_line > len {
        return Err(EditError::BlockEndOutOfRange {
            end: block.end_line,
            len,
        });
    }

    let start = block.start_line - 1;
    let end = if block.is_insertion() { start } else { block.end_line };
    let replacement = split_lines(&block.text);
    let inserted = replacement.len();
    let removed = lines
        .splice(start..end, replacement.into_iter().map(L::fresh))
        .count();

    Ok((removed, inserted))
}

/// Applies edits to files inside one bound root.
#[derive(Debug, Clone)]
pub struct FileMutator<'a> {
    root: &'a BoundRoot,
    backup_suffix: &'a str,
    dry_run: bool,
}

impl<'a> FileMutator<'a> {
    pub fn new(root: &'a BoundRoot, backup_suffix: &'a str) -> Self {
        Self {
            root,
            backup_suffix,
            dry_run: false,
        }
    }

    /// Validate and diff only; no backup, no write.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn root(&self) -> &BoundRoot {
        self.root
    }

    /// Apply a batch of line directives.
    #[instrument(skip(self, directives), fields(count = directives.len()))]
    pub fn edit_lines(&self, file_path: &str, directives: &[LineDirective]) -> Result<String, MutateError> {
        check_directive_shape(directives)?;

        self.mutate_existing(file_path, |lines, rel| {
            let (added, removed) = apply_directives(lines, directives)?;
            Ok(format!(
                "Applied {added} addition(s) and {removed} removal(s) to '{rel}'."
            ))
        })
    }

    /// Replace or insert a contiguous block.
    #[instrument(skip(self, block), fields(start = block.start_line, end = block.end_line))]
    pub fn replace_block(&self, file_path: &str, block: &BlockReplace) -> Result<String, MutateError> {
        check_block_shape(block)?;

        self.mutate_existing(file_path, |lines, rel| {
            let (removed, inserted) = apply_block(lines, block)?;
            Ok(if block.is_insertion() {
                format!(
                    "Inserted {inserted} line(s) before line {} of '{rel}'.",
                    block.start_line
                )
            } else {
                format!(
                    "Replaced lines {}-{} of '{rel}' ({removed} line(s) removed, {inserted} line(s) inserted).",
                    block.start_line, block.end_line
                )
            })
        })
    }

    /// Write `content` verbatim, creating the file (and parents) if needed.
    /// Existing files are backed up first.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub fn write_whole(&self, file_path: &str, content: &str) -> Result<String, MutateError> {
        let target = self.root.resolve(file_path)?;
        let existed = target.path.exists();
        if existed && !target.path.is_file() {
            return Err(PathError::NotAFile { rel: target.rel }.into());
        }

        if self.dry_run {
            let old = if existed {
                read_source(&target.path).map_err(|source| read_err(&target, source))?
            } else {
                String::new()
            };
            return Ok(dry_run_report(&target.rel, &old, content));
        }

        let backup = if existed {
            Some(ensure_backup(&target, self.backup_suffix)?)
        } else {
            None
        };

        if let Some(parent) = target.path.parent() {
            fs::create_dir_all(parent).map_err(|source| write_err(&target, source))?;
        }
        write_atomic(&target.path, content.as_bytes()).map_err(|source| write_err(&target, source))?;
        info!(file = %target.rel, bytes = content.len(), "wrote file");

        let wrote = format!("Wrote {} bytes to '{}'", content.len(), target.rel);
        Ok(with_backup(backup.as_ref(), wrote))
    }

    /// Shared pipeline for edits of an existing file.
    fn mutate_existing<F>(&self, file_path: &str, apply: F) -> Result<String, MutateError>
    where
        F: FnOnce(&mut Vec<SourceLine>, &str) -> Result<String, EditError>,
    {
        let target = self.root.existing_file(file_path)?;

        let backup = if self.dry_run {
            None
        } else {
            Some(ensure_backup(&target, self.backup_suffix)?)
        };

        let original = read_source_strict(&target.path).map_err(|source| read_err(&target, source))?;
        let mut buffer = LineBuffer::parse(&original);
        let summary = apply(&mut buffer.lines, &target.rel)?;
        let updated = buffer.render();

        if self.dry_run {
            debug!(file = %target.rel, "dry run, nothing written");
            return Ok(format!("{summary}\n{}", dry_run_report(&target.rel, &original, &updated)));
        }

        write_atomic(&target.path, updated.as_bytes()).map_err(|source| write_err(&target, source))?;
        info!(file = %target.rel, "applied edit");

        Ok(with_backup(backup.as_ref(), summary))
    }
}

fn with_backup(backup: Option<&BackupOutcome>, report: String) -> String {
    match backup {
        Some(b) => format!("{}\n{report}", b.message()),
        None => report,
    }
}

fn read_err(target: &ResolvedPath, source: std::io::Error) -> FileError {
    FileError::Read {
        rel: target.rel.clone(),
        source,
    }
}

fn write_err(target: &ResolvedPath, source: std::io::Error) -> FileError {
    FileError::Write {
        rel: target.rel.clone(),
        source,
    }
}

/// Unified diff of a change that was not written.
pub fn dry_run_report(rel: &str, old: &str, new: &str) -> String {
    if old == new {
        return format!("Dry run: '{rel}' would be unchanged.");
    }
    let before = format!("a/{rel}");
    let after = format!("b/{rel}");
    let diff = TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&before, &after)
        .to_string();
    format!("Dry run: no changes written to '{rel}'.\n{diff}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lines(src: &[&str]) -> Vec<String> {
        src.iter().map(|s| s.to_string()).collect()
    }

    fn setup(content: &str) -> (TempDir, BoundRoot) {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.f90"), content).unwrap();
        let root = BoundRoot::new(tmp.path()).unwrap();
        (tmp, root)
    }

    #[test]
    fn parses_script_lines() {
        let d = parse_directives("3 - old line\n\n4 +    indented\n5 +\n 7+x").unwrap();
        assert_eq!(
            d,
            vec![
                LineDirective::delete(3, "old line"),
                LineDirective::insert(4, "    indented"),
                LineDirective::insert(5, ""),
                LineDirective::insert(7, "x"),
            ]
        );
    }

    #[test]
    fn payload_separator_rules() {
        assert_eq!(directive_payload(" "), "");
        assert_eq!(directive_payload(" call x()"), "call x()");
        assert_eq!(directive_payload("  call x()"), "  call x()");
        assert_eq!(directive_payload(""), "");
    }

    #[test]
    fn bad_script_names_the_line() {
        let err = parse_directives("1 + ok\nnope\n").unwrap_err();
        assert_eq!(
            err,
            EditError::Syntax {
                number: 2,
                text: "nope".into()
            }
        );
        assert_eq!(parse_directives("  \n").unwrap_err(), EditError::NoDirectives);
    }

    #[test]
    fn delete_then_insert_is_order_independent() {
        let base = lines(&["1", "2", "3", "4", "old", "6"]);
        let a = [LineDirective::delete(5, "old"), LineDirective::insert(5, "new")];
        let b = [LineDirective::insert(5, "new"), LineDirective::delete(5, "old")];

        let mut x = base.clone();
        let mut y = base.clone();
        assert_eq!(apply_directives(&mut x, &a).unwrap(), (1, 1));
        apply_directives(&mut y, &b).unwrap();
        assert_eq!(x, y);
        assert_eq!(x, lines(&["1", "2", "3", "4", "new", "6"]));
    }

    #[test]
    fn line_numbers_refer_to_original_content() {
        let mut buf = lines(&["a", "b", "c"]);
        let d = [
            LineDirective::insert(1, "top"),
            LineDirective::delete(2, "b"),
            LineDirective::insert(4, "tail"),
        ];
        apply_directives(&mut buf, &d).unwrap();
        assert_eq!(buf, lines(&["top", "a", "c", "tail"]));
    }

    #[test]
    fn same_line_inserts_keep_input_order() {
        let mut buf = lines(&["x"]);
        let d = [LineDirective::insert(1, "one"), LineDirective::insert(1, "two")];
        apply_directives(&mut buf, &d).unwrap();
        assert_eq!(buf, lines(&["one", "two", "x"]));
    }

    #[test]
    fn failures_leave_buffer_untouched() {
        let base = lines(&["a", "b"]);

        let mut buf = base.clone();
        let err = apply_directives(&mut buf, &[LineDirective::insert(1, "z"), LineDirective::delete(2, "B")])
            .unwrap_err();
        assert!(matches!(err, EditError::Mismatch { line: 2, .. }));
        assert_eq!(buf, base);

        let err = apply_directives(&mut buf, &[LineDirective::delete(3, "")]).unwrap_err();
        assert_eq!(err, EditError::DeleteOutOfRange { line: 3, len: 2 });

        let err = apply_directives(&mut buf, &[LineDirective::insert(4, "")]).unwrap_err();
        assert_eq!(err.to_string(), "Cannot insert at line 4: the file has 2 line(s), so the last valid insert position is 3.");

        let err = apply_directives(&mut buf, &[LineDirective::insert(0, "")]).unwrap_err();
        assert!(matches!(err, EditError::NonPositiveLine { .. }));

        let err = apply_directives(&mut buf, &[LineDirective::delete(1, ""), LineDirective::delete(1, "")])
            .unwrap_err();
        assert_eq!(err, EditError::DuplicateDelete { line: 1 });
        assert_eq!(buf, base);
    }

    #[test]
    fn block_replace_round_trip() {
        let mut buf = lines(&["1", "2", "3", "4", "5"]);
        let block = BlockReplace {
            start_line: 3,
            end_line: 3,
            text: "x\ny\n".into(),
        };
        assert_eq!(apply_block(&mut buf, &block).unwrap(), (1, 2));
        assert_eq!(buf, lines(&["1", "2", "x", "y", "4", "5"]));
    }

    #[test]
    fn block_pure_insertion_at_end() {
        let mut buf = lines(&["1", "2"]);
        let block = BlockReplace {
            start_line: 3,
            end_line: 2,
            text: "3".into(),
        };
        assert_eq!(apply_block(&mut buf, &block).unwrap(), (0, 1));
        assert_eq!(buf, lines(&["1", "2", "3"]));
    }

    #[test]
    fn block_range_errors() {
        let mut buf = lines(&["1", "2"]);
        let bad = |s, e| BlockReplace {
            start_line: s,
            end_line: e,
            text: String::new(),
        };
        assert_eq!(apply_block(&mut buf, &bad(0, 0)).unwrap_err(), EditError::BlockStart { start: 0 });
        assert_eq!(
            apply_block(&mut buf, &bad(3, 1)).unwrap_err(),
            EditError::BlockOrder { start: 3, end: 1 }
        );
        assert_eq!(
            apply_block(&mut buf, &bad(4, 3)).unwrap_err(),
            EditError::BlockStartOutOfRange { start: 4, len: 2 }
        );
        assert_eq!(
            apply_block(&mut buf, &bad(1, 3)).unwrap_err(),
            EditError::BlockEndOutOfRange { end: 3, len: 2 }
        );
        // Empty replacement is a pure deletion.
        assert_eq!(apply_block(&mut buf, &bad(1, 1)).unwrap(), (1, 0));
        assert_eq!(buf, lines(&["2"]));
    }

    #[test]
    fn backup_once_keeps_original_content() {
        let (tmp, root) = setup("a\nb\nc\n");
        let m = FileMutator::new(&root, ".orig");

        let first = m.edit_lines("a.f90", &[LineDirective::delete(2, "b")]).unwrap();
        assert_eq!(
            first,
            "Copied 'a.f90' to 'a.f90.orig'.\nApplied 0 addition(s) and 1 removal(s) to 'a.f90'."
        );
        let second = m.edit_lines("a.f90", &[LineDirective::insert(1, "z")]).unwrap();
        assert!(second.starts_with("Backup already exists at 'a.f90.orig'."));

        assert_eq!(fs::read_to_string(tmp.path().join("a.f90")).unwrap(), "z\na\nc\n");
        assert_eq!(fs::read_to_string(tmp.path().join("a.f90.orig")).unwrap(), "a\nb\nc\n");
    }

    #[test]
    fn crlf_and_missing_final_newline_survive() {
        let (tmp, root) = setup("a\r\nb");
        let m = FileMutator::new(&root, ".orig");
        let block = BlockReplace {
            start_line: 2,
            end_line: 1,
            text: "mid".into(),
        };
        m.replace_block("a.f90", &block).unwrap();
        assert_eq!(fs::read_to_string(tmp.path().join("a.f90")).unwrap(), "a\r\nmid\r\nb");
    }

    #[test]
    fn dry_run_writes_nothing() {
        let (tmp, root) = setup("a\nb\n");
        let m = FileMutator::new(&root, ".orig").with_dry_run(true);
        let out = m.edit_lines("a.f90", &[LineDirective::delete(1, "a")]).unwrap();
        assert!(out.contains("-a"));
        assert!(out.contains("Dry run: no changes written to 'a.f90'."));
        assert!(!tmp.path().join("a.f90.orig").exists());
        assert_eq!(fs::read_to_string(tmp.path().join("a.f90")).unwrap(), "a\nb\n");
    }

    #[test]
    fn path_escape_is_rejected_before_io() {
        let (_tmp, root) = setup("x\n");
        let m = FileMutator::new(&root, ".orig");
        let err = m.write_whole("../../etc/passwd", "oops").unwrap_err();
        assert!(err.to_string().contains("outside the allowed root"));
        let err = m.edit_lines("../escape.f90", &[LineDirective::insert(1, "x")]).unwrap_err();
        assert!(matches!(err, MutateError::File(FileError::Path(PathError::OutsideRoot { .. }))));
    }

    #[test]
    fn write_whole_creates_then_backs_up() {
        let (tmp, root) = setup("x\n");
        let m = FileMutator::new(&root, ".orig");

        let created = m.write_whole("new/dir/b.f90", "program p\nend\n").unwrap();
        assert_eq!(created, "Wrote 14 bytes to 'new/dir/b.f90'");
        assert!(!tmp.path().join("new/dir/b.f90.orig").exists());

        let replaced = m.write_whole("a.f90", "y\n").unwrap();
        assert_eq!(replaced, "Copied 'a.f90' to 'a.f90.orig'.\nWrote 2 bytes to 'a.f90'");
    }

    #[test]
    fn shape_errors_do_not_create_backup() {
        let (tmp, root) = setup("x\n");
        let m = FileMutator::new(&root, ".orig");
        assert!(m.edit_lines("a.f90", &[]).is_err());
        let block = BlockReplace {
            start_line: 0,
            end_line: 0,
            text: String::new(),
        };
        assert!(m.replace_block("a.f90", &block).is_err());
        assert!(!tmp.path().join("a.f90.orig").exists());
    }

    #[test]
    fn non_utf8_file_is_refused_and_left_intact() {
        let tmp = TempDir::new().unwrap();
        let original = b"! caf\xe9 comment\nprogram p\n  x = 1\nend program p\n";
        fs::write(tmp.path().join("legacy.f"), original).unwrap();
        let root = BoundRoot::new(tmp.path()).unwrap();
        let m = FileMutator::new(&root, ".orig");

        let block = BlockReplace {
            start_line: 3,
            end_line: 3,
            text: "  x = 2".into(),
        };
        let err = m.replace_block("legacy.f", &block).unwrap_err();
        assert!(matches!(err, MutateError::File(FileError::Read { ref rel, .. }) if rel == "legacy.f"));
        assert!(err.to_string().contains("not valid UTF-8"));
        assert_eq!(fs::read(tmp.path().join("legacy.f")).unwrap(), original);

        let err = m.edit_lines("legacy.f", &[LineDirective::insert(1, "! x")]).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read 'legacy.f'"));
        assert_eq!(fs::read(tmp.path().join("legacy.f")).unwrap(), original);
    }

    #[test]
    fn mixed_line_endings_outside_the_edit_are_kept() {
        let (tmp, root) = setup("a\r\nb\nc\n");
        let m = FileMutator::new(&root, ".orig");

        m.edit_lines("a.f90", &[LineDirective::delete(3, "c"), LineDirective::insert(3, "C")])
            .unwrap();
        assert_eq!(fs::read_to_string(tmp.path().join("a.f90")).unwrap(), "a\r\nb\nC\n");
    }

    #[test]
    fn huge_end_line_is_an_error_not_a_panic() {
        let mut buf = lines(&["1", "2"]);
        let block = BlockReplace {
            start_line: 1,
            end_line: usize::MAX,
            text: String::new(),
        };
        assert!(!block.is_insertion());
        assert_eq!(
            apply_block(&mut buf, &block).unwrap_err(),
            EditError::BlockEndOutOfRange { end: usize::MAX, len: 2 }
        );

        let block = BlockReplace {
            start_line: usize::MAX,
            end_line: 0,
            text: String::new(),
        };
        assert_eq!(
            check_block_shape(&block).unwrap_err(),
            EditError::BlockOrder { start: usize::MAX, end: 0 }
        );
        assert_eq!(buf, lines(&["1", "2"]));
    }
}
