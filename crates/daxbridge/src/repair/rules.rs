//! Rewrite rules for known generation defects.

use tracing::debug;

use crate::schema::DatePart;

use super::scan::{
    bracketed_name, call_at, find_calls, is_column_reference, keyword_positions, sole_call,
    split_args, string_literal,
};

/// A named rewrite. Returns `None` when the rule does not apply.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Stable rule name, used in logs.
    pub name: &'static str,
    /// The rewrite itself.
    pub rewrite: fn(&str) -> Option<String>,
}

/// Rules in application order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "date-part-call",
        rewrite: rewrite_date_part_calls,
    },
    Rule {
        name: "redundant-addcolumns",
        rewrite: remove_redundant_addcolumns,
    },
];

/// Apply every rule until none changes the text.
///
/// Every rewrite removes at least one function call and adds none, so the
/// loop terminates.
pub fn normalize(raw: &str) -> String {
    let mut text = raw.to_string();
    loop {
        let mut changed = false;
        for rule in RULES {
            if let Some(rewritten) = (rule.rewrite)(&text) {
                debug!(rule = rule.name, "repair rule applied");
                text = rewritten;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    text
}

/// `YEAR(col)` → `col.[Year]`, likewise for `MONTH` and `QUARTER`.
///
/// Only calls whose whole argument is a column reference are rewritten.
pub fn rewrite_date_part_calls(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for call in find_calls(text) {
        if call.start < last {
            continue;
        }
        let Some(part) = DatePart::ALL
            .into_iter()
            .find(|p| p.function_name().eq_ignore_ascii_case(call.name))
        else {
            continue;
        };
        let column = call.args(text).trim();
        if !is_column_reference(column) {
            continue;
        }

        out.push_str(&text[last..call.start]);
        out.push_str(column);
        out.push_str(".[");
        out.push_str(part.attribute());
        out.push(']');
        last = call.end();
    }

    if last == 0 {
        return None;
    }
    out.push_str(&text[last..]);
    Some(out)
}

/// Collapse `EVALUATE CALCULATETABLE(ADDCOLUMNS(SUMMARIZECOLUMNS(<inner>),
/// "<Name>", <expr>))` to `EVALUATE SUMMARIZECOLUMNS(<inner>)` when `<inner>`
/// already produces `<Name>`.
///
/// Every matching statement is rewritten in one scan.
pub fn remove_redundant_addcolumns(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for pos in keyword_positions(text, "EVALUATE") {
        if pos < last {
            continue;
        }
        if !text[..pos].chars().next_back().is_none_or(char::is_whitespace) {
            continue;
        }
        let after = pos + "EVALUATE".len();
        let body = after + (text[after..].len() - text[after..].trim_start().len());
        if body == after {
            continue;
        }

        let Some(wrapper) = call_at(text, body) else {
            continue;
        };
        if !wrapper.name.eq_ignore_ascii_case("CALCULATETABLE") {
            continue;
        }
        let Some(inner) = redundant_inner(wrapper.args(text)) else {
            continue;
        };

        out.push_str(&text[last..pos]);
        out.push_str("EVALUATE\nSUMMARIZECOLUMNS(");
        out.push_str(inner);
        out.push(')');
        last = wrapper.end();
    }

    if last == 0 {
        return None;
    }
    out.push_str(&text[last..]);
    Some(out)
}

/// The `SUMMARIZECOLUMNS` arguments inside a redundant `ADDCOLUMNS` wrapper.
fn redundant_inner(wrapper_args: &str) -> Option<&str> {
    let [only] = split_args(wrapper_args)[..] else {
        return None;
    };
    let (add_text, add) = sole_call(only)?;
    if !add.name.eq_ignore_ascii_case("ADDCOLUMNS") {
        return None;
    }

    let [table, name, _expr] = split_args(add.args(add_text))[..] else {
        return None;
    };
    let (summarize_text, summarize) = sole_call(table)?;
    if !summarize.name.eq_ignore_ascii_case("SUMMARIZECOLUMNS") {
        return None;
    }
    let name = string_literal(name)?;

    let inner = summarize.args(summarize_text);
    produced_names(inner)
        .iter()
        .any(|n| n.eq_ignore_ascii_case(&name))
        .then_some(inner)
}

/// Output column names of a `SUMMARIZECOLUMNS` argument list: group-by
/// columns (including `Col.[Attr]`) by their last bracketed name, plus named
/// expressions.
fn produced_names(args: &str) -> Vec<String> {
    let args = split_args(args);
    let mut names = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].trim();
        if let Some(name) = string_literal(arg) {
            names.push(name);
            i += 2;
            continue;
        }
        let grouped = is_column_reference(arg)
            || arg
                .rsplit_once(".[")
                .is_some_and(|(base, attr)| is_column_reference(base) && attr.ends_with(']'));
        if grouped {
            if let Some(name) = bracketed_name(arg) {
                names.push(name.replace("]]", "]"));
            }
        }
        i += 1;
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_parts_rewritten() {
        let text = "EVALUATE SUMMARIZECOLUMNS(YEAR(Sales[OrderDate]), month( 'Date Table'[Date] ), Quarter([D]))";
        assert_eq!(
            rewrite_date_part_calls(text).unwrap(),
            "EVALUATE SUMMARIZECOLUMNS(Sales[OrderDate].[Year], 'Date Table'[Date].[Month], [D].[Quarter])"
        );
    }

    #[test]
    fn test_date_part_non_column_argument_untouched() {
        assert!(rewrite_date_part_calls("YEAR(TODAY())").is_none());
        assert!(rewrite_date_part_calls("YEAR(Sales[Date] + 1)").is_none());
        assert!(rewrite_date_part_calls("FISCALYEAR(Sales[Date])").is_none());
        assert!(rewrite_date_part_calls(r#""YEAR(Sales[Date])""#).is_none());
    }

    #[test]
    fn test_date_part_inside_other_call() {
        assert_eq!(
            rewrite_date_part_calls("FILTER(T, YEAR(T[D]) = 2024)").unwrap(),
            "FILTER(T, T[D].[Year] = 2024)"
        );
    }

    #[test]
    fn test_redundant_wrapper_removed() {
        let text = r#"EVALUATE CALCULATETABLE(ADDCOLUMNS(SUMMARIZECOLUMNS('Date'[Year], "Total", SUM(Sales[Amount])), "Year", YEAR('Date'[Date])))"#;
        assert_eq!(
            remove_redundant_addcolumns(text).unwrap(),
            "EVALUATE\nSUMMARIZECOLUMNS('Date'[Year], \"Total\", SUM(Sales[Amount]))"
        );
    }

    #[test]
    fn test_wrapper_kept_when_name_is_new() {
        let text = r#"EVALUATE CALCULATETABLE(ADDCOLUMNS(SUMMARIZECOLUMNS('Date'[Year]), "Month", 1))"#;
        assert!(remove_redundant_addcolumns(text).is_none());
    }

    #[test]
    fn test_wrapper_with_filter_argument_kept() {
        let text = r#"EVALUATE CALCULATETABLE(ADDCOLUMNS(SUMMARIZECOLUMNS(T[Year]), "Year", 1), T[X] = 1)"#;
        assert!(remove_redundant_addcolumns(text).is_none());
    }

    #[test]
    fn test_wrapper_prefix_and_suffix_preserved() {
        let text = "DEFINE MEASURE T[M] = 1\nEVALUATE CALCULATETABLE(ADDCOLUMNS(SUMMARIZECOLUMNS(T[Year], \"M\", [M]), \"m\", [M]))\nORDER BY T[Year]";
        assert_eq!(
            remove_redundant_addcolumns(text).unwrap(),
            "DEFINE MEASURE T[M] = 1\nEVALUATE\nSUMMARIZECOLUMNS(T[Year], \"M\", [M])\nORDER BY T[Year]"
        );
    }

    #[test]
    fn test_every_redundant_wrapper_removed_in_one_scan() {
        let statement = "EVALUATE CALCULATETABLE(ADDCOLUMNS(SUMMARIZECOLUMNS(T[Year]), \"Year\", 1))\n";
        let text = statement.repeat(20);
        let rewritten = remove_redundant_addcolumns(&text).unwrap();
        assert_eq!(rewritten, "EVALUATE\nSUMMARIZECOLUMNS(T[Year])\n".repeat(20));
        assert!(!rewritten.contains("CALCULATETABLE"));
    }

    #[test]
    fn test_normalize_handles_many_statements() {
        let text = concat!(
            "EVALUATE CALCULATETABLE(ADDCOLUMNS(SUMMARIZECOLUMNS(T[D].[Year]), ",
            "\"Year\", YEAR(T[D])))\n"
        )
        .repeat(40);
        let once = normalize(&text);
        assert_eq!(once, "EVALUATE\nSUMMARIZECOLUMNS(T[D].[Year])\n".repeat(40));
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_normalize_runs_to_fixed_point() {
        let text = r#"EVALUATE CALCULATETABLE(ADDCOLUMNS(SUMMARIZECOLUMNS(Sales[Date].[Year], "Total", SUM(Sales[Amount])), "Year", YEAR(Sales[Date])))"#;
        let once = normalize(text);
        assert_eq!(
            once,
            "EVALUATE\nSUMMARIZECOLUMNS(Sales[Date].[Year], \"Total\", SUM(Sales[Amount]))"
        );
        assert_eq!(normalize(&once), once);
    }
}
