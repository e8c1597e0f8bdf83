//! Source snippet rendering for diagnostics.
//!
//! Errors point into the source with a byte offset; this module turns the
//! offset into a short, single-line excerpt with the offending region marked
//! by a caret. Long lines are clipped around the error position with
//! ellipses.

use memchr::{memchr, memrchr};

/// How many bytes of context to keep on each side of the error position.
const CONTEXT_BYTES: usize = 18;

/// Rendered snippet: the excerpt line and the aligned caret line below it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSnippet {
    pub text: String,
    pub caret: String,
}

/// Render the line around `position`, clipped to a window, with a `^`
/// marker aligned under the error byte.
pub fn source_snippet(source: &str, position: usize) -> RenderedSnippet {
    let bytes = source.as_bytes();
    let position = position.min(source.len());

    let line_start = memrchr(b'\n', &bytes[..position]).map(|i| i + 1).unwrap_or(0);
    let line_end = memchr(b'\n', &bytes[position..])
        .map(|i| position + i)
        .unwrap_or(source.len());

    let mut window_start = position.saturating_sub(CONTEXT_BYTES).max(line_start);
    let mut window_end = (position + CONTEXT_BYTES).min(line_end);

    // Clamp to character boundaries so slicing cannot split a code point
    while window_start < position && !source.is_char_boundary(window_start) {
        window_start += 1;
    }
    while window_end > position && !source.is_char_boundary(window_end) {
        window_end -= 1;
    }

    let clipped_left = window_start > line_start;
    let clipped_right = window_end < line_end;

    let mut text = String::new();
    if clipped_left {
        text.push('…');
    }
    text.push_str(&source[window_start..window_end]);
    if clipped_right {
        text.push('…');
    }

    // The caret aligns by character count, counting the ellipsis prefix
    let prefix_chars =
        source[window_start..position.min(window_end)].chars().count() + usize::from(clipped_left);
    let mut caret = " ".repeat(prefix_chars);
    caret.push('^');

    RenderedSnippet { text, caret }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_line_is_kept_whole() {
        let s = source_snippet("2 + #x", 4);
        assert_eq!(s.text, "2 + #x");
        assert_eq!(s.caret, "    ^");
    }

    #[test]
    fn long_line_is_clipped_with_ellipses() {
        let source = format!("{}#{}", "a".repeat(50), "b".repeat(50));
        let s = source_snippet(&source, 50);
        assert!(s.text.starts_with('…'));
        assert!(s.text.ends_with('…'));
        assert!(s.text.contains('#'));
        // Caret lands on the '#'
        let caret_col = s.caret.chars().count() - 1;
        assert_eq!(s.text.chars().nth(caret_col), Some('#'));
    }

    #[test]
    fn position_past_end_is_clamped() {
        let s = source_snippet("x+1", 99);
        assert_eq!(s.text, "x+1");
        assert_eq!(s.caret, "   ^");
    }

    #[test]
    fn snippet_stays_on_error_line() {
        let s = source_snippet("first\nsec#nd\nthird", 9);
        assert_eq!(s.text, "sec#nd");
        assert_eq!(s.caret, "   ^");
    }
}
