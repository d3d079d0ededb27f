//! Heuristic limits checked before any operation is sent to the endpoint
//!
//! The checks work on normalized query text rather than a parsed document, so they apply equally
//! to synthesized operations and to operations written by hand. Depth counts braces, complexity
//! counts fields that open a selection set or an argument list, and disabled resolvers are found
//! by a case-insensitive substring search. A disabled name therefore also matches inside aliases
//! and string literals.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::errors::ValidationError;

/// The limits applied to every operation of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Limits {
    pub max_depth: u32,
    pub max_complexity: u32,
    pub disabled_resolvers: BTreeSet<String>,
}

/// The scores of an accepted operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryMetrics {
    pub depth: usize,
    pub complexity: usize,
}

#[allow(clippy::expect_used)]
fn block_comment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("regex pattern compiles"))
}

#[allow(clippy::expect_used)]
fn line_comment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"#[^\r\n]*").expect("regex pattern compiles"))
}

#[allow(clippy::expect_used)]
fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("regex pattern compiles"))
}

#[allow(clippy::expect_used)]
fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\w+\s*[{(]").expect("regex pattern compiles"))
}

/// Strip comments and collapse whitespace. Only used for measuring; the original text is sent.
pub fn sanitize(text: &str) -> String {
    let text = block_comment_pattern().replace_all(text, " ");
    let text = line_comment_pattern().replace_all(&text, "");
    whitespace_pattern()
        .replace_all(&text, " ")
        .trim()
        .to_string()
}

/// The number of fields that open a selection set or take arguments
pub fn complexity(sanitized: &str) -> usize {
    field_pattern().find_iter(sanitized).count()
}

/// The deepest brace nesting. Unbalanced closing braces are tolerated.
pub fn depth(sanitized: &str) -> usize {
    let mut current: i64 = 0;
    let mut max: i64 = 0;
    for c in sanitized.chars() {
        match c {
            '{' => {
                current += 1;
                max = max.max(current);
            }
            '}' => current -= 1,
            _ => {}
        }
    }
    usize::try_from(max).unwrap_or_default()
}

/// The first disabled resolver mentioned anywhere in the text, ignoring case
fn disabled_resolver<'a>(sanitized: &str, disabled: &'a BTreeSet<String>) -> Option<&'a str> {
    let haystack = sanitized.to_lowercase();
    disabled
        .iter()
        .map(String::as_str)
        .filter(|name| !name.is_empty())
        .find(|name| haystack.contains(&name.to_lowercase()))
}

/// Check an operation against the limits: complexity first, then depth, then disabled resolvers
pub fn validate(text: &str, limits: &Limits) -> Result<QueryMetrics, ValidationError> {
    let sanitized = sanitize(text);

    let complexity = complexity(&sanitized);
    if complexity > limits.max_complexity as usize {
        let error = ValidationError::Complexity {
            score: complexity,
            max: limits.max_complexity,
        };
        warn!("Rejected operation: {error}");
        return Err(error);
    }

    let depth = depth(&sanitized);
    if depth > limits.max_depth as usize {
        let error = ValidationError::Depth {
            depth,
            max: limits.max_depth,
        };
        warn!("Rejected operation: {error}");
        return Err(error);
    }

    if let Some(name) = disabled_resolver(&sanitized, &limits.disabled_resolvers) {
        let error = ValidationError::DisabledResolver(name.to_string());
        warn!("Rejected operation: {error}");
        return Err(error);
    }

    Ok(QueryMetrics { depth, complexity })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn limits(max_depth: u32, max_complexity: u32, disabled: &[&str]) -> Limits {
        Limits {
            max_depth,
            max_complexity,
            disabled_resolvers: disabled.iter().map(|name| name.to_string()).collect(),
        }
    }

    #[rstest]
    #[case("{ a { b { c } } }", 3)]
    #[case("{ countries { name code emoji } }", 2)]
    #[case("query { ping }", 1)]
    #[case("ping", 0)]
    #[case("} } { a }", 0)]
    #[case("{ a { b } } } }", 2)]
    fn measures_depth(#[case] query: &str, #[case] expected: usize) {
        assert_eq!(depth(&sanitize(query)), expected);
    }

    #[rstest]
    #[case("{ countries { name code emoji } }", 1)]
    #[case("query { countries { name } }", 2)]
    #[case("query ($code: ID!) { country(code: $code) { name } }", 2)]
    #[case("{ ping }", 0)]
    #[case("{ a { b { c { d } } } }", 3)]
    fn measures_complexity(#[case] query: &str, #[case] expected: usize) {
        assert_eq!(complexity(&sanitize(query)), expected);
    }

    #[rstest]
    #[case("query {\n  countries # all of them\n  { name }\n}", "query { countries { name } }")]
    #[case("/* leading */ { a /* inline\n comment */ }", "{ a }")]
    #[case("\t{\n\n  a\r\n}\n", "{ a }")]
    #[case("# only a comment", "")]
    #[case("//**/*", "/ *")]
    #[case("{ a } # /* not a block", "{ a }")]
    fn sanitizes(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(sanitize(text), expected);
    }

    #[rstest]
    #[case("query {\n  countries # all of them\n  { name }\n}")]
    #[case("/* a */ # b /* c \n */ d")]
    #[case("/#x\n*/ { a }")]
    #[case("  { a {\t b } }  ")]
    #[case("")]
    fn sanitize_is_idempotent(#[case] text: &str) {
        let once = sanitize(text);
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn comments_do_not_count() {
        let query = "{ ping # countries { name }\n /* continents { code } */ }";
        let sanitized = sanitize(query);

        assert_eq!(complexity(&sanitized), 0);
        assert_eq!(depth(&sanitized), 1);
    }

    #[test]
    fn accepts_operation_within_limits() {
        let metrics = validate("query { countries { name } }", &limits(10, 100, &[])).unwrap();

        assert_eq!(
            metrics,
            QueryMetrics {
                depth: 2,
                complexity: 2
            }
        );
    }

    #[test]
    fn complexity_is_checked_first() {
        let error = validate("{ a { b { c { d } } } }", &limits(1, 1, &["a"])).unwrap_err();

        assert_eq!(error, ValidationError::Complexity { score: 3, max: 1 });
        assert_eq!(
            error.to_string(),
            "Query complexity 3 exceeds the maximum of 1"
        );
    }

    #[test]
    fn depth_is_checked_before_disabled_resolvers() {
        let error = validate("{ a { b { c } } }", &limits(2, 100, &["a"])).unwrap_err();

        assert_eq!(error, ValidationError::Depth { depth: 3, max: 2 });
    }

    #[rstest]
    #[case("query { country(code: \"FR\") { name } }")]
    #[case("query { COUNTRY { name } }")]
    #[case("query { c: country(code: \"FR\") { name } }")]
    #[case("query { search(text: \"my country\") { name } }")]
    fn disabled_resolver_matches_case_insensitive_substrings(#[case] query: &str) {
        let error = validate(query, &limits(10, 100, &["country"])).unwrap_err();

        assert_eq!(error, ValidationError::DisabledResolver("country".to_string()));
    }

    #[test]
    fn disabled_resolver_inside_comment_is_ignored() {
        assert!(validate("{ ping } # country", &limits(10, 100, &["country"])).is_ok());
    }

    #[test]
    fn empty_disabled_name_matches_nothing() {
        assert!(validate("{ ping }", &limits(10, 100, &[""])).is_ok());
    }
}
