//! Light structural scanning of DAX text.
//!
//! Not a parser: the scanner only knows enough to skip string literals,
//! bracketed names and quoted table names, find function calls with their
//! matching parentheses, and split argument lists at top-level commas.
//! Literals never span lines; an unterminated one ends at the newline.

use once_cell::sync::Lazy;
use regex::Regex;

static COLUMN_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:'(?:[^'\n]|'')+'|[A-Za-z_][A-Za-z0-9_]*)?\[(?:[^\]\n]|\]\])+\]$").unwrap()
});

/// A function call found in the text. Offsets are byte positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call<'a> {
    /// Function name as written.
    pub name: &'a str,
    /// Offset of the first byte of the name.
    pub start: usize,
    /// Offset of the opening parenthesis.
    pub open: usize,
    /// Offset of the matching closing parenthesis.
    pub close: usize,
}

impl<'a> Call<'a> {
    /// Text between the parentheses.
    pub fn args<'t>(&self, text: &'t str) -> &'t str {
        &text[self.open + 1..self.close]
    }

    /// Offset just past the closing parenthesis.
    pub fn end(&self) -> usize {
        self.close + 1
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

/// Bytes that continue an identifier. `.` is included for names like
/// `PERCENTILE.INC` and for `Col.[Attr]` access.
pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// If a literal starts at `i`, the offset just past it.
fn literal_end(bytes: &[u8], i: usize) -> Option<usize> {
    let close = match bytes[i] {
        b'"' => b'"',
        b'\'' => b'\'',
        b'[' => b']',
        _ => return None,
    };
    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\n' => return Some(j),
            b if b == close => {
                // Doubled closer is an escape.
                if bytes.get(j + 1) == Some(&close) {
                    j += 2;
                    continue;
                }
                return Some(j + 1);
            }
            _ => j += 1,
        }
    }
    Some(bytes.len())
}

/// Offsets of bytes outside literals, in order.
pub fn code_positions(text: &str) -> impl Iterator<Item = usize> + '_ {
    let bytes = text.as_bytes();
    let mut i = 0;
    std::iter::from_fn(move || {
        while i < bytes.len() {
            if let Some(end) = literal_end(bytes, i) {
                i = end;
                continue;
            }
            let at = i;
            i += 1;
            return Some(at);
        }
        None
    })
}

/// Offset of the parenthesis matching the one at `open`.
pub fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        if let Some(end) = literal_end(bytes, i) {
            i = end;
            continue;
        }
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// The call whose name starts exactly at `pos`, if any.
///
/// The name must not continue an identifier and must be followed directly
/// by `(` with a matching `)`.
pub fn call_at(text: &str, pos: usize) -> Option<Call<'_>> {
    let bytes = text.as_bytes();
    if pos >= bytes.len() || !is_ident_start(bytes[pos]) {
        return None;
    }
    if pos > 0 && is_ident_byte(bytes[pos - 1]) {
        return None;
    }
    let mut j = pos;
    while j < bytes.len() && is_ident_byte(bytes[j]) {
        j += 1;
    }
    let close = matching_paren(text, j)?;
    Some(Call {
        name: &text[pos..j],
        start: pos,
        open: j,
        close,
    })
}

/// Every call in the text, outer before inner, ordered by start offset.
pub fn find_calls(text: &str) -> Vec<Call<'_>> {
    code_positions(text)
        .filter_map(|pos| call_at(text, pos))
        .collect()
}

/// Offsets of a keyword outside literals, ignoring case, on identifier
/// boundaries.
pub fn keyword_positions(text: &str, keyword: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let len = keyword.len();
    code_positions(text)
        .filter(|&pos| {
            text.get(pos..pos + len)
                .is_some_and(|w| w.eq_ignore_ascii_case(keyword))
                && (pos == 0 || !is_ident_byte(bytes[pos - 1]))
                && bytes.get(pos + len).is_none_or(|&b| !is_ident_byte(b))
        })
        .collect()
}

/// The call spanning all of `text` (ignoring surrounding whitespace).
///
/// Returned offsets are relative to the trimmed text, which is returned too.
pub fn sole_call(text: &str) -> Option<(&str, Call<'_>)> {
    let trimmed = text.trim();
    let call = call_at(trimmed, 0)?;
    (call.end() == trimmed.len()).then_some((trimmed, call))
}

/// Split an argument list at top-level commas. An empty list yields nothing.
pub fn split_args(args: &str) -> Vec<&str> {
    if args.trim().is_empty() {
        return Vec::new();
    }
    let bytes = args.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(end) = literal_end(bytes, i) {
            i = end;
            continue;
        }
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&args[start..]);
    parts
}

/// The value of a string literal spanning all of `text`, unescaped.
pub fn string_literal(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let bytes = trimmed.as_bytes();
    if bytes.first() != Some(&b'"') {
        return None;
    }
    let end = literal_end(bytes, 0)?;
    if end != bytes.len() || end < 2 || bytes[end - 1] != b'"' {
        return None;
    }
    Some(trimmed[1..end - 1].replace("\"\"", "\""))
}

/// True for `Table[Col]`, `'Table Name'[Col]` and `[Col]`.
pub fn is_column_reference(text: &str) -> bool {
    COLUMN_REFERENCE.is_match(text)
}

/// The last bracketed name of a column reference.
pub fn bracketed_name(reference: &str) -> Option<&str> {
    let open = reference.rfind('[')?;
    reference[open + 1..].strip_suffix(']')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_are_skipped() {
        let text = r#"x "a(b" 'T (1)'[c)] y"#;
        let code: String = code_positions(text).map(|i| text.as_bytes()[i] as char).collect();
        assert_eq!(code, "x   y");
    }

    #[test]
    fn test_find_calls_nested() {
        let text = "SUM(YEAR(T[D]))";
        let calls = find_calls(text);
        let names: Vec<_> = calls.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["SUM", "YEAR"]);
        assert_eq!(calls[1].args(text), "T[D]");
        assert_eq!(calls[0].end(), text.len());
    }

    #[test]
    fn test_call_requires_boundary_and_paren() {
        assert!(call_at("FISCALYEAR(x)", 6).is_none());
        assert!(call_at("YEAR (x)", 0).is_none());
        assert!(call_at("YEAR(x", 0).is_none());
        assert_eq!(call_at("YEAR(x)", 0).map(|c| c.name), Some("YEAR"));
    }

    #[test]
    fn test_split_args_top_level_only() {
        let args = r#"T[A], "x, y", SUM(T[B], 1), 'a,b'[c]"#;
        let parts: Vec<_> = split_args(args).into_iter().map(str::trim).collect();
        assert_eq!(parts, vec!["T[A]", r#""x, y""#, "SUM(T[B], 1)", "'a,b'[c]"]);
        assert!(split_args("  ").is_empty());
    }

    #[test]
    fn test_keyword_positions() {
        let text = "EVALUATE x \"EVALUATE\" evaluate REEVALUATE";
        assert_eq!(keyword_positions(text, "EVALUATE"), vec![0, 22]);
    }

    #[test]
    fn test_column_reference_shapes() {
        assert!(is_column_reference("Sales[Date]"));
        assert!(is_column_reference("'Date Table'[Order Date]"));
        assert!(is_column_reference("[Date]"));
        assert!(is_column_reference("'O''Brien'[x]]y]"));
        assert!(!is_column_reference("Sales[Date].[Year]"));
        assert!(!is_column_reference("TODAY()"));
        assert!(!is_column_reference("Sales"));
        assert!(!is_column_reference("Sales[Date] + 1"));
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal(r#" "Year" "#), Some("Year".to_string()));
        assert_eq!(string_literal(r#""a""b""#), Some("a\"b".to_string()));
        assert_eq!(string_literal(r#""open"#), None);
        assert_eq!(string_literal("Year"), None);
    }

    #[test]
    fn test_sole_call_and_bracketed_name() {
        let (trimmed, call) = sole_call("  ADDCOLUMNS(a, b) ").unwrap();
        assert_eq!(call.args(trimmed), "a, b");
        assert!(sole_call("ADDCOLUMNS(a) + 1").is_none());
        assert_eq!(bracketed_name("'Date'[Year]"), Some("Year"));
    }
}
