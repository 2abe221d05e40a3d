// Free-text cleanup for process names, command lines and the GPU name

/// Replaces a field that is empty after sanitizing.
pub const PLACEHOLDER: &str = "unknown";

/// Keeps printable ASCII, `\n`, `\r`, `\t` and every non-ASCII character; drops other control
/// characters and DEL. The result is cut to `max_chars` characters. Returns `None` when nothing
/// is left.
///
/// Quotes, backslashes and the kept whitespace controls are escaped by the JSON serializer.
pub fn sanitize_text(input: &str, max_chars: usize) -> Option<String> {
    let out: String = input
        .chars()
        .filter(|c| keep(*c))
        .take(max_chars)
        .collect();
    if out.is_empty() { None } else { Some(out) }
}

fn keep(c: char) -> bool {
    matches!(c, ' '..='~' | '\n' | '\r' | '\t') || !c.is_ascii()
}

/// Scheduler state as a single printable letter, `?` otherwise.
pub fn sanitize_state(state: char) -> char {
    if state.is_ascii_graphic() && state != '"' && state != '\\' {
        state
    } else {
        '?'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_control_characters_but_keeps_whitespace_escapes() {
        assert_eq!(
            sanitize_text("a\u{1}b\u{7f}c\td\n", 64).as_deref(),
            Some("abc\td\n")
        );
    }

    #[test]
    fn keeps_non_ascii() {
        assert_eq!(sanitize_text("café ✓", 64).as_deref(), Some("café ✓"));
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(sanitize_text("ééééé", 3).as_deref(), Some("ééé"));
    }

    #[test]
    fn empty_after_cleanup_is_none() {
        assert_eq!(sanitize_text("\u{0}\u{1b}", 64), None);
        assert_eq!(sanitize_text("", 64), None);
    }

    #[test]
    fn state_falls_back_to_question_mark() {
        assert_eq!(sanitize_state('R'), 'R');
        assert_eq!(sanitize_state('\0'), '?');
        assert_eq!(sanitize_state('"'), '?');
    }
}
