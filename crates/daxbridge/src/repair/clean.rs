//! Removal of non-query content from model output.

/// Drop trailing commentary and surrounding markdown fences.
pub fn clean(text: &str) -> String {
    strip_fences(&truncate_at_note(text))
}

/// Cut the text at the first line starting with `note:` (any case).
///
/// That line and everything after it are dropped and trailing whitespace of
/// the rest is trimmed. Without such a line the text is returned unchanged.
pub fn truncate_at_note(text: &str) -> String {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if is_note_line(line) {
            return text[..offset].trim_end().to_string();
        }
        offset += line.len();
    }
    text.to_string()
}

fn is_note_line(line: &str) -> bool {
    line.trim_start()
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("note:"))
}

/// Remove a leading fence line (optionally with a language tag) and a
/// trailing fence line, repeatedly, then trim.
///
/// Without a fence at either end the text is returned unchanged.
pub fn strip_fences(text: &str) -> String {
    let mut current = text;
    let mut stripped = false;

    loop {
        let trimmed = current.trim();
        let first_end = trimmed.find('\n').unwrap_or(trimmed.len());
        if is_fence_line(&trimmed[..first_end]) {
            current = &trimmed[first_end..];
            stripped = true;
            continue;
        }
        let last_start = trimmed.rfind('\n').map_or(0, |i| i + 1);
        if is_fence_line(&trimmed[last_start..]) {
            current = &trimmed[..last_start];
            stripped = true;
            continue;
        }
        return if stripped {
            trimmed.to_string()
        } else {
            text.to_string()
        };
    }
}

fn is_fence_line(line: &str) -> bool {
    line.trim().strip_prefix("```").is_some_and(|tag| {
        tag.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#' | '.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_at_note() {
        let text = "EVALUATE Sales  \n\nNote: this sums the amounts.\nMore prose";
        assert_eq!(truncate_at_note(text), "EVALUATE Sales");
        assert_eq!(truncate_at_note("NOTE: nothing to see"), "");
        assert_eq!(truncate_at_note("  note:indented"), "");
    }

    #[test]
    fn test_truncate_without_note_is_noop() {
        let text = "EVALUATE Sales\n-- a notable comment  \n";
        assert_eq!(truncate_at_note(text), text);
        assert_eq!(truncate_at_note("x // note: inline"), "x // note: inline");
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```dax\nEVALUATE Sales\n```"), "EVALUATE Sales");
        assert_eq!(strip_fences("```\nEVALUATE Sales\n```\n"), "EVALUATE Sales");
        assert_eq!(strip_fences("```DAX\n```\nEVALUATE T\n```"), "EVALUATE T");
        assert_eq!(strip_fences("```"), "");
    }

    #[test]
    fn test_strip_fences_without_fence_is_noop() {
        let text = "  EVALUATE Sales\n";
        assert_eq!(strip_fences(text), text);
        let inline = "```dax EVALUATE Sales```";
        assert_eq!(strip_fences(inline), inline);
    }

    #[test]
    fn test_clean_combined() {
        let text = "```dax\nEVALUATE Sales\n```\nNote: totals include tax.";
        assert_eq!(clean(text), "EVALUATE Sales");
    }
}
