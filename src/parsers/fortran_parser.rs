//! Filepath: src/parsers/fortran_parser.rs
//! ------------------------------------------------------------------
//! Shallow structural parser for Fortran-like sources.
//! Goals:
//!   - Recognize program/module/subroutine/function openers and
//!     their `end` terminators, nothing else.
//!   - Build a containment tree with a stack; children are
//!     attached to their parent when they close, which keeps
//!     them in file order.
//!   - Never fail: malformed or half-written files still yield
//!     a closed tree.
//!
//! Notes:
//!   - Comments are stripped first (quote-aware), so a keyword
//!     inside `! ...` is invisible.
//!   - Terminators must span the whole line (`end`, `end
//!     subroutine`, `endsubroutine foo`); `end if`, `enddo` and
//!     friends are not terminators. This is a deliberate departure
//!     from prefix matching, where `end if` would close the
//!     enclosing routine. A bare `end` closes whatever is on top
//!     of the stack.
//!   - Unterminated blocks are closed at end of file.
//! ------------------------------------------------------------------

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::trace;

use crate::{
    core::symbols::{Entity, EntityKind},
    infra::io::split_lines,
    parsers::sanitize::sanitize,
};

/// Build a case-insensitive regex from a compile-time constant pattern.
///
/// # Panics
///
/// Panics if the pattern is invalid. Both patterns below are constants
/// exercised by the tests in this module.
fn build_re(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|_| panic!("Invalid regex pattern: {pattern}"))
}

/// `<keyword> <identifier>` anywhere on the line.
static DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(r"(program|module|subroutine|function)\s+([A-Za-z_][A-Za-z0-9_]*)")
});

/// `end`, optionally followed by a keyword and then a name.
static TERMINATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(r"^end\s*(?:(program|module|subroutine|function)(?:\s+[A-Za-z_][A-Za-z0-9_]*)?)?$")
});

/// Parse result: the containment tree and the original lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTree {
    pub root: Entity,
    pub lines: Vec<String>,
}

/// What a single sanitized line means structurally.
#[derive(Debug, PartialEq, Eq)]
enum LineClass<'a> {
    /// Nothing left after stripping the comment.
    Blank,
    /// `contains` section marker.
    Contains,
    /// A recognized `end` line.
    Terminator,
    /// `end`-prefixed but not one of ours (`end if`, `enddo`, ...).
    OtherEnd,
    /// Opens a new entity.
    Declaration { kind: EntityKind, name: &'a str },
    /// Anything else.
    Statement,
}

/// Stateless entry point for the entity tree builder.
pub struct FortranParser;

impl FortranParser {
    /// Build the entity tree for `text`.
    pub fn parse(text: &str) -> SourceTree {
        let lines = split_lines(text);
        let total = lines.len();

        // Stack of open entities; index 0 is always the root.
        let mut stack: Vec<Entity> = vec![Entity::root()];

        for (index, line) in lines.iter().enumerate() {
            match classify(sanitize(line)) {
                LineClass::Terminator if stack.len() > 1 => {
                    close_top(&mut stack, index + 1, index);
                }
                LineClass::Declaration { kind, name } => {
                    trace!(line = index + 1, %kind, name, "open entity");
                    stack.push(Entity::open(kind, name, index));
                }
                _ => {}
            }
        }

        // Implicit repair: anything still open ends at end of file.
        while stack.len() > 1 {
            let start = stack.last().map_or(0, |e| e.start_index);
            close_top(&mut stack, total, total.saturating_sub(1).max(start));
        }

        let root = stack.pop().unwrap_or_else(Entity::root);
        SourceTree { root, lines }
    }
}

/// Pop the innermost entity, record its end and attach it to its parent.
fn close_top(stack: &mut Vec<Entity>, end_line: usize, end_index: usize) {
    if stack.len() < 2 {
        return;
    }
    let Some(mut done) = stack.pop() else { return };
    done.end_line = Some(end_line);
    done.end_index = Some(end_index);
    trace!(name = %done.name, end_line, "close entity");

    if let Some(parent) = stack.last_mut() {
        parent.children.push(done);
    }
}

/// Classify one sanitized (comment-stripped, trimmed) line.
fn classify(stripped: &str) -> LineClass<'_> {
    if stripped.is_empty() {
        return LineClass::Blank;
    }

    let lowered = stripped.to_ascii_lowercase();
    if lowered.starts_with("contains") {
        return LineClass::Contains;
    }

    // `end`-prefixed lines are never declarations.
    if lowered.starts_with("end") {
        return if TERMINATOR_RE.is_match(stripped) {
            LineClass::Terminator
        } else {
            LineClass::OtherEnd
        };
    }

    // Last match wins: `integer function f(x)` or `pure recursive subroutine s`.
    let Some(caps) = DECLARATION_RE.captures_iter(stripped).last() else {
        return LineClass::Statement;
    };
    let (Some(keyword), Some(name)) = (caps.get(1), caps.get(2)) else {
        return LineClass::Statement;
    };
    let Ok(kind) = keyword.as_str().parse::<EntityKind>() else {
        return LineClass::Statement;
    };

    // `module procedure foo` and similar are not module openers.
    if kind == EntityKind::Module && !stripped[name.end()..].trim().is_empty() {
        return LineClass::Statement;
    }

    LineClass::Declaration {
        kind,
        name: name.as_str(),
    }
}
