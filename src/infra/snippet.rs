//! Fixed-width line-numbered snippets.

/// Default prefix width; holds line numbers up to 99,999 without drift.
pub const DEFAULT_WIDTH: usize = 5;

/// Render `lines` with zero-padded numbers starting at `start_line`.
///
/// Each output line is `{number:0width$}: {text}`; lines are joined with
/// `\n` and the text is left verbatim.
pub fn format_numbered_snippet<S: AsRef<str>>(lines: &[S], start_line: usize, width: usize) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("{:0width$}: {}", start_line + i, line.as_ref()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_and_numbers() {
        let out = format_numbered_snippet(&["program p", "end"], 9, DEFAULT_WIDTH);
        assert_eq!(out, "00009: program p\n00010: end");
    }

    #[test]
    fn empty_input_is_empty() {
        let lines: [&str; 0] = [];
        assert_eq!(format_numbered_snippet(&lines, 1, DEFAULT_WIDTH), "");
    }

    #[test]
    fn width_is_configurable_and_text_verbatim() {
        let out = format_numbered_snippet(&["  x = 'a: b'  "], 1, 3);
        assert_eq!(out, "001:   x = 'a: b'  ");
    }
}
