//! Insert a new subroutine or function into an existing source file.
//!
//! The insertion point is computed from the entity tree: right after a
//! named sibling callable, or at the end of the parent scope (module,
//! program or file root). A missing `contains` section is synthesized for
//! module/program parents. The result goes through the whole-file write
//! path, so the usual one-time backup applies.

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    core::{
        edit::{FileMutator, MutateError},
        symbols::{Entity, EntityKind},
    },
    infra::io::{EditLine, FileError, LineBuffer, read_source_strict, split_lines},
    parsers::fortran_parser::FortranParser,
};

/// Kinds that can be inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CallableKind {
    Subroutine,
    Function,
}

impl CallableKind {
    pub fn entity_kind(self) -> EntityKind {
        match self {
            CallableKind::Subroutine => EntityKind::Subroutine,
            CallableKind::Function => EntityKind::Function,
        }
    }
}

/// What to insert and where.
#[derive(Debug, Clone)]
pub struct CallableRequest {
    pub kind: CallableKind,
    pub name: String,
    /// Module or program that should own the callable; file root when `None`.
    pub parent: Option<String>,
    /// Existing sibling callable to insert after.
    pub append_after: Option<String>,
    /// Full source text of the new callable.
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InsertError {
    #[error("Parent module/program '{0}' not found.")]
    ParentNotFound(String),

    #[error("Parent '{name}' is a {kind}, expected module or program.")]
    ParentNotScope { name: String, kind: EntityKind },

    #[error("{kind} '{name}' already exists in {parent}.")]
    Duplicate {
        kind: &'static str,
        name: String,
        parent: String,
    },

    #[error("Callable '{name}' not found in {parent}.")]
    SiblingNotFound { name: String, parent: String },

    #[error("callable_content must include the new Fortran code.")]
    EmptyBody,

    #[error(transparent)]
    Mutate(#[from] MutateError),
}

impl From<FileError> for InsertError {
    fn from(err: FileError) -> Self {
        InsertError::Mutate(MutateError::File(err))
    }
}

/// The new line list and the summary to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionPlan<L> {
    pub lines: Vec<L>,
    pub summary: String,
}

/// Compute the new line list without touching the filesystem.
pub fn plan_insertion<L: EditLine>(
    root: &Entity,
    mut lines: Vec<L>,
    request: &CallableRequest,
) -> Result<InsertionPlan<L>, InsertError> {
    let parent = match request.parent.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        None => root,
        Some(name) => {
            let found = root
                .find(name, None)
                .ok_or_else(|| InsertError::ParentNotFound(name.to_string()))?;
            if !found.kind.is_scope() {
                return Err(InsertError::ParentNotScope {
                    name: name.to_string(),
                    kind: found.kind,
                });
            }
            found
        }
    };
    let parent_desc = parent.describe();

    let kind = request.kind.entity_kind();
    if parent.direct_child(&request.name, &[kind]).is_some() {
        return Err(InsertError::Duplicate {
            kind: kind.title(),
            name: request.name.clone(),
            parent: parent_desc,
        });
    }

    let sibling = request.append_after.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let index = match sibling {
        Some(after) => {
            let target = parent
                .children
                .iter()
                .find(|c| c.kind.is_callable() && c.is_named(after))
                .ok_or_else(|| InsertError::SiblingNotFound {
                    name: after.to_string(),
                    parent: parent_desc.clone(),
                })?;
            (target.last_index() + 1).min(lines.len())
        }
        None => {
            let end = if parent.is_root() {
                lines.len()
            } else {
                parent.end_index.unwrap_or(lines.len()).min(lines.len())
            };
            end + ensure_contains(&mut lines, parent, end)
        }
    };

    let body = split_lines(&request.body);
    if body.is_empty() || request.body.trim().is_empty() {
        return Err(InsertError::EmptyBody);
    }
    splice_with_separators(&mut lines, index, body);

    let location = match sibling {
        Some(after) => format!("after '{after}' in {parent_desc}"),
        None => format!("at the end of {parent_desc}"),
    };
    let summary = format!("Inserted {} '{}' {location}.", kind, request.name);
    debug!(index, %summary, "planned insertion");

    Ok(InsertionPlan { lines, summary })
}

/// Add `contains` plus a blank line at `at` when the scope has none.
/// Returns how many lines were added.
fn ensure_contains<L: EditLine>(lines: &mut Vec<L>, parent: &Entity, at: usize) -> usize {
    if !parent.kind.is_scope() {
        return 0;
    }
    let end = parent.end_index.unwrap_or(lines.len()).min(lines.len());
    let has_contains = lines
        .get(parent.start_index..end)
        .unwrap_or_default()
        .iter()
        .any(|l| l.text().trim().to_ascii_lowercase().starts_with("contains"));
    if has_contains {
        return 0;
    }

    let at = at.min(lines.len());
    lines.splice(at..at, [L::fresh("contains".to_string()), L::fresh(String::new())]);
    2
}

/// Insert `block` at `index`, padding with blank lines so it never touches
/// non-blank neighbours.
fn splice_with_separators<L: EditLine>(lines: &mut Vec<L>, index: usize, mut block: Vec<String>) {
    let non_blank = |s: &str| !s.trim().is_empty();

    if index > 0
        && lines.get(index - 1).is_some_and(|l| non_blank(l.text()))
        && block.first().is_some_and(|l| non_blank(l.as_str()))
    {
        block.insert(0, String::new());
    }
    if lines.get(index).is_some_and(|l| non_blank(l.text()))
        && block.last().is_some_and(|l| non_blank(l.as_str()))
    {
        block.push(String::new());
    }

    lines.splice(index..index, block.into_iter().map(L::fresh));
}

/// Parse `file_path`, insert the callable and write the file back.
///
/// Untouched lines keep their own terminators; the file must be valid
/// UTF-8.
#[instrument(skip(mutator, request), fields(name = %request.name))]
pub fn insert_callable(
    mutator: &FileMutator<'_>,
    file_path: &str,
    request: &CallableRequest,
) -> Result<String, InsertError> {
    let target = mutator.root().existing_file(file_path).map_err(FileError::from)?;
    let text = read_source_strict(&target.path).map_err(|source| FileError::Read {
        rel: target.rel.clone(),
        source,
    })?;

    let tree = FortranParser::parse(&text);
    let mut buffer = LineBuffer::parse(&text);
    let plan = plan_insertion(&tree.root, std::mem::take(&mut buffer.lines), request)?;
    buffer.lines = plan.lines;

    let written = mutator.write_whole(file_path, &buffer.render())?;
    Ok(format!("{written}\n{}", plan.summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::paths::BoundRoot;
    use std::fs;
    use tempfile::TempDir;

    const MODULE_SRC: &str = "\
module physics
  implicit none
contains
  subroutine step()
  end subroutine step
end module physics
";

    fn request(name: &str, parent: Option<&str>, after: Option<&str>) -> CallableRequest {
        CallableRequest {
            kind: CallableKind::Subroutine,
            name: name.to_string(),
            parent: parent.map(str::to_string),
            append_after: after.map(str::to_string),
            body: format!("subroutine {name}()\nend subroutine {name}"),
        }
    }

    fn plan(src: &str, req: &CallableRequest) -> Result<InsertionPlan<String>, InsertError> {
        let tree = FortranParser::parse(src);
        plan_insertion(&tree.root, tree.lines, req)
    }

    #[test]
    fn appends_after_sibling() {
        let p = plan(MODULE_SRC, &request("drift", Some("physics"), Some("step"))).unwrap();
        assert_eq!(
            p.lines,
            vec![
                "module physics",
                "  implicit none",
                "contains",
                "  subroutine step()",
                "  end subroutine step",
                "",
                "subroutine drift()",
                "end subroutine drift",
                "",
                "end module physics",
            ]
        );
        assert_eq!(p.summary, "Inserted subroutine 'drift' after 'step' in module physics.");
    }

    #[test]
    fn synthesizes_contains_when_missing() {
        let src = "module m\n  integer :: x\nend module m\n";
        let p = plan(src, &request("s", Some("m"), None)).unwrap();
        assert_eq!(
            p.lines,
            vec![
                "module m",
                "  integer :: x",
                "contains",
                "",
                "subroutine s()",
                "end subroutine s",
                "",
                "end module m",
            ]
        );
        assert_eq!(p.summary, "Inserted subroutine 's' at the end of module m.");
    }

    #[test]
    fn root_insertion_goes_to_file_end() {
        let p = plan("program p\nend program p\n", &request("util", None, None)).unwrap();
        assert_eq!(p.lines[2], "");
        assert_eq!(p.lines[3], "subroutine util()");
        assert_eq!(p.lines.len(), 5);
        assert!(p.summary.ends_with("at the end of file root."));
    }

    #[test]
    fn duplicate_guard() {
        let err = plan(MODULE_SRC, &request("STEP", Some("physics"), None)).unwrap_err();
        assert_eq!(err.to_string(), "Subroutine 'STEP' already exists in module physics.");

        // A function of the same name is not a duplicate of a subroutine.
        let mut req = request("step", Some("physics"), None);
        req.kind = CallableKind::Function;
        assert!(plan(MODULE_SRC, &req).is_ok());
    }

    #[test]
    fn parent_and_sibling_errors() {
        let err = plan(MODULE_SRC, &request("x", Some("nowhere"), None)).unwrap_err();
        assert_eq!(err.to_string(), "Parent module/program 'nowhere' not found.");

        let err = plan(MODULE_SRC, &request("x", Some("step"), None)).unwrap_err();
        assert_eq!(err.to_string(), "Parent 'step' is a subroutine, expected module or program.");

        let err = plan(MODULE_SRC, &request("x", Some("physics"), Some("ghost"))).unwrap_err();
        assert_eq!(err.to_string(), "Callable 'ghost' not found in module physics.");

        let mut empty = request("x", Some("physics"), None);
        empty.body = "  \n".into();
        assert!(matches!(plan(MODULE_SRC, &empty).unwrap_err(), InsertError::EmptyBody));
    }

    #[test]
    fn sibling_must_be_a_callable() {
        let src = "\
program main
contains
  subroutine helper()
  end subroutine helper
end program main
module helper_mod
end module helper_mod
";
        let err = plan(src, &request("x", None, Some("main"))).unwrap_err();
        assert_eq!(err.to_string(), "Callable 'main' not found in file root.");

        let p = plan(src, &request("x", Some("main"), Some("HELPER"))).unwrap();
        assert_eq!(p.lines[4], "");
        assert_eq!(p.lines[5], "subroutine x()");
        assert!(p.summary.ends_with("after 'HELPER' in program main."));
    }

    #[test]
    fn insertion_keeps_crlf_lines_byte_for_byte() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("crlf.f90");
        let src = MODULE_SRC.replace('\n', "\r\n");
        fs::write(&path, &src).unwrap();
        let root = BoundRoot::new(tmp.path()).unwrap();
        let mutator = FileMutator::new(&root, ".orig");

        insert_callable(&mutator, "crlf.f90", &request("kick", Some("physics"), Some("step"))).unwrap();
        let updated = fs::read_to_string(&path).unwrap();
        assert!(updated.starts_with(&src[..src.find("end module").unwrap()]));
        assert!(updated.contains("\r\nsubroutine kick()\r\nend subroutine kick\r\n"));
        assert!(!updated.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn non_utf8_source_is_not_rewritten() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("legacy.f");
        let bytes = b"! \xe9t\xe9\nmodule m\ncontains\nend module m\n";
        fs::write(&path, bytes).unwrap();
        let root = BoundRoot::new(tmp.path()).unwrap();
        let mutator = FileMutator::new(&root, ".orig");

        let err = insert_callable(&mutator, "legacy.f", &request("s", Some("m"), None)).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read 'legacy.f'"));
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn insert_writes_with_backup_and_duplicate_leaves_file_alone() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("phys.f90");
        fs::write(&path, MODULE_SRC).unwrap();
        let root = BoundRoot::new(tmp.path()).unwrap();
        let mutator = FileMutator::new(&root, ".orig");

        let out = insert_callable(&mutator, "phys.f90", &request("kick", Some("physics"), None)).unwrap();
        assert!(out.starts_with("Copied 'phys.f90' to 'phys.f90.orig'.\nWrote "));
        assert!(out.ends_with("Inserted subroutine 'kick' at the end of module physics."));

        let updated = fs::read_to_string(&path).unwrap();
        assert!(updated.ends_with("end subroutine kick\n\nend module physics\n"));

        let err = insert_callable(&mutator, "phys.f90", &request("kick", Some("physics"), None)).unwrap_err();
        assert!(matches!(err, InsertError::Duplicate { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), updated);
    }
}
