//! Helpers for building XPath 1.0 expressions.
//!
//! XPath 1.0 has no `lower-case()`, so case-insensitive matching goes through
//! `translate()` with explicit alphabets. Latin and Cyrillic are covered.

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZЁЙЦУКЕНГШЩЗХЪФЫВАПРОЛДЖЭЯЧСМИТЬБЮ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyzёйцукенгшщзхъфывапролджэячсмитьбю";

/// Quote a string as an XPath literal, splitting on quotes when it holds both kinds
pub fn literal(s: &str) -> String {
    if !s.contains('"') {
        return format!("\"{}\"", s);
    }
    if !s.contains('\'') {
        return format!("'{}'", s);
    }
    let parts: Vec<String> = s.split('"').map(|p| format!("\"{}\"", p)).collect();
    format!("concat({})", parts.join(", '\"', "))
}

/// `translate(expr, UPPER, LOWER)`
pub fn fold(expr: &str) -> String {
    format!("translate({}, \"{}\", \"{}\")", expr, UPPER, LOWER)
}

/// Predicate body testing that `expr`, lower-cased, contains `needle` lower-cased
pub fn contains_folded(expr: &str, needle: &str) -> String {
    format!("contains({}, {})", fold(expr), literal(&needle.to_lowercase()))
}

/// Make an absolute expression relative to the context node.
///
/// Only the leading `/` of each top-level union branch is rewritten; bars
/// inside string literals, predicates and parentheses are left alone.
pub fn relative(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len() + 4);
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut branch_start = true;

    for c in expr.chars() {
        if branch_start && !c.is_whitespace() {
            if c == '/' {
                out.push('.');
            }
            branch_start = false;
        }
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '[' | '(' => depth += 1,
                ']' | ')' => depth = depth.saturating_sub(1),
                '|' if depth == 0 => branch_start = true,
                _ => {}
            },
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_quoting() {
        assert_eq!(literal("abc"), "\"abc\"");
        assert_eq!(literal("a\"b"), "'a\"b'");
        assert_eq!(literal("a\"b'c"), "concat(\"a\", '\"', \"b'c\")");
    }

    #[test]
    fn test_contains_folded_lowercases_needle() {
        let expr = contains_folded(".", "Python Разработчик");
        assert!(expr.contains("\"python разработчик\""));
        assert!(expr.starts_with("contains(translate(., "));
    }

    #[test]
    fn test_relative_handles_unions() {
        assert_eq!(relative("//a | //b"), ".//a | .//b");
        assert_eq!(relative(".//a"), ".//a");
        assert_eq!(relative("//a|//b"), ".//a|.//b");
    }

    #[test]
    fn test_relative_ignores_bars_inside_literals_and_predicates() {
        assert_eq!(
            relative(r#"//div[contains(., "a | //b")] | //label[@x='c | //d']"#),
            r#".//div[contains(., "a | //b")] | .//label[@x='c | //d']"#
        );
        assert_eq!(relative("//a[//b | //c]"), ".//a[//b | //c]");
    }
}
