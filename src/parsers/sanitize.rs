//! Filepath: src/parsers/sanitize.rs
//! Comment stripping for a single physical source line.
//!
//! The `!` marker starts an end-of-line comment unless it sits inside a
//! single- or double-quoted literal. Each quote kind only toggles while
//! the other kind is closed, so `"it's"` and `'say "hi"'` both survive.

/// End-of-line comment marker.
pub const COMMENT_MARKER: char = '!';

/// Return `line` truncated at the first unquoted comment marker.
///
/// Total over all inputs; an unterminated literal simply swallows the
/// rest of the line.
pub fn strip_comment(line: &str) -> &str {
    let mut in_single = false;
    let mut in_double = false;

    for (idx, ch) in line.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            COMMENT_MARKER if !in_single && !in_double => return &line[..idx],
            _ => {}
        }
    }

    line
}

/// Strip the comment and surrounding whitespace in one step.
pub fn sanitize(line: &str) -> &str {
    strip_comment(line).trim()
}
