//! Display-title to filename conversion.

/// Longest file name Linux accepts, in bytes.
const NAME_MAX: usize = 255;

/// Turns a display title into a single safe path component.
///
/// NUL, `/`, `\` and control characters become `_` (runs collapse to one),
/// surrounding spaces, dots and underscores are trimmed, and the result is cut
/// to at most `NAME_MAX - reserve` bytes on a char boundary so an extension of
/// `reserve` bytes still fits. Returns `None` when nothing usable remains.
pub fn sanitize_title(title: &str, reserve: usize) -> Option<String> {
    let mut out = String::with_capacity(title.len());
    let mut last_was_sub = false;
    for c in title.chars() {
        if c == '/' || c == '\\' || c.is_control() {
            if !last_was_sub {
                out.push('_');
            }
            last_was_sub = true;
        } else {
            out.push(c);
            last_was_sub = false;
        }
    }

    let trimmed = out.trim_matches(|c: char| c == ' ' || c == '.' || c == '_');
    let limit = NAME_MAX.saturating_sub(reserve);
    let mut end = trimmed.len().min(limit);
    while end > 0 && !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    // Cutting can expose a trailing space or dot again.
    let cut = trimmed[..end].trim_end_matches([' ', '.']);
    if cut.is_empty() {
        None
    } else {
        Some(cut.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_become_underscores() {
        assert_eq!(sanitize_title("AC/DC \\ Live", 0).unwrap(), "AC_DC _ Live");
        assert_eq!(sanitize_title("a//b", 0).unwrap(), "a_b");
    }

    #[test]
    fn control_chars_and_nul() {
        assert_eq!(sanitize_title("tab\there\0x", 0).unwrap(), "tab_here_x");
    }

    #[test]
    fn surrounding_dots_and_spaces_trimmed() {
        assert_eq!(sanitize_title("  ..My Title..  ", 0).unwrap(), "My Title");
        assert!(sanitize_title(" .. ", 0).is_none());
        assert!(sanitize_title("/", 0).is_none());
    }

    #[test]
    fn keeps_room_for_extension_on_char_boundary() {
        let long = "é".repeat(200); // 400 bytes
        let s = sanitize_title(&long, 4).unwrap();
        assert!(s.len() <= 251);
        assert!(s.chars().all(|c| c == 'é'));
        assert_eq!(s.len(), 250);
    }
}
