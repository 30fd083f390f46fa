//! Rewrite rules: when an import matches, how to redirect it.
//!
//! A [`Rule`] pairs a [`MatchSpec`] (regular expressions tested against the
//! request, the base directory, and the early-resolved module identity) with
//! a [`Rewrite`] describing the redirected candidate(s). The rewrite is
//! either a declarative template with `<name>` placeholder tokens or an
//! escape-hatch function computing candidate requests itself.

use crate::placeholder::PlaceholderContext;
use regex_lite::Regex;
use std::fmt;
use std::sync::Arc;

/// Match patterns for a rule. Unset fields match anything.
#[derive(Debug, Clone, Default)]
pub struct MatchSpec {
    /// Tested against the import request string.
    pub request: Option<Regex>,
    /// Tested against the normalized base directory.
    pub base: Option<Regex>,
    /// Tested against the early-resolved module identity.
    pub module: Option<Regex>,
}

impl MatchSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_request(mut self, pattern: Regex) -> Self {
        self.request = Some(pattern);
        self
    }

    #[must_use]
    pub fn with_base(mut self, pattern: Regex) -> Self {
        self.base = Some(pattern);
        self
    }

    #[must_use]
    pub fn with_module(mut self, pattern: Regex) -> Self {
        self.module = Some(pattern);
        self
    }
}

/// Substitution helper handed to function-form rewrites. Replaces raw
/// (non-bracketed) placeholder names in the pattern with their values.
pub type SubstituteFn = fn(&str, &PlaceholderContext) -> String;

/// Function-form rewrite: receives the rule-local placeholder context and a
/// substitution helper, returns candidate request strings.
pub type RewriteFn = Arc<dyn Fn(&PlaceholderContext, SubstituteFn) -> Vec<String> + Send + Sync>;

/// How a matching rule rewrites the import.
#[derive(Clone)]
pub enum Rewrite {
    /// Declarative templates with `<name>` placeholder tokens. Unset fields
    /// keep the original request/base.
    Template {
        request: Option<String>,
        base: Option<String>,
    },
    /// Escape hatch: compute candidate requests from the placeholder
    /// context. Candidates are resolved against the *original* base.
    Function(RewriteFn),
}

impl Rewrite {
    /// Template rewrite; `None` fields keep the original value.
    #[must_use]
    pub fn template(request: Option<&str>, base: Option<&str>) -> Self {
        Self::Template {
            request: request.map(str::to_string),
            base: base.map(str::to_string),
        }
    }

    /// Function rewrite.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&PlaceholderContext, SubstituteFn) -> Vec<String> + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }
}

impl fmt::Debug for Rewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template { request, base } => f
                .debug_struct("Template")
                .field("request", request)
                .field("base", base)
                .finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// A single redirect rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub matches: MatchSpec,
    pub rewrite: Rewrite,
    /// Prepend the module identity to the outcome when this rule wins.
    pub append: bool,
}

impl Rule {
    #[must_use]
    pub fn new(matches: MatchSpec, rewrite: Rewrite) -> Self {
        Self {
            matches,
            rewrite,
            append: false,
        }
    }

    #[must_use]
    pub fn with_append(mut self) -> Self {
        self.append = true;
        self
    }
}

/// A rule with match fields defaulted, ready for evaluation.
#[derive(Debug, Clone)]
pub(crate) struct NormalizedRule {
    pub request: Regex,
    pub base: Regex,
    pub module: Regex,
    pub rewrite: Rewrite,
    pub append: bool,
}

fn match_any() -> Regex {
    // The pattern is a literal; compilation cannot fail.
    Regex::new("(?s).*").unwrap()
}

/// Filter the rule list down to applicable rules and fill unset match fields
/// with a match-anything pattern. Order is preserved.
///
/// A rule declaring neither a request nor a base pattern is silently
/// inapplicable, never an error.
pub(crate) fn normalize(rules: &[Rule]) -> Vec<NormalizedRule> {
    rules
        .iter()
        .filter(|rule| rule.matches.request.is_some() || rule.matches.base.is_some())
        .map(|rule| NormalizedRule {
            request: rule.matches.request.clone().unwrap_or_else(match_any),
            base: rule.matches.base.clone().unwrap_or_else(match_any),
            module: rule.matches.module.clone().unwrap_or_else(match_any),
            rewrite: rule.rewrite.clone(),
            append: rule.append,
        })
        .collect()
}

/// Whether any rule depends on the early-resolved module identity, either
/// through a `module` match pattern or the `append` flag.
///
/// When this returns false the external resolver is never invoked up front.
#[must_use]
pub(crate) fn needs_module_identity(rules: &[Rule]) -> bool {
    rules
        .iter()
        .any(|rule| rule.matches.module.is_some() || rule.append)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_rule(pattern: &str) -> Rule {
        Rule::new(
            MatchSpec::new().with_request(Regex::new(pattern).unwrap()),
            Rewrite::template(Some("./other.css"), None),
        )
    }

    #[test]
    fn test_normalize_drops_unkeyed_rules() {
        let rules = vec![
            request_rule(r"\.css$"),
            // Neither request nor base: inapplicable.
            Rule::new(MatchSpec::new(), Rewrite::template(Some("./x.css"), None)),
            Rule::new(
                MatchSpec::new().with_module(Regex::new("lodash").unwrap()),
                Rewrite::template(Some("./x.css"), None),
            ),
        ];

        let normalized = normalize(&rules);
        assert_eq!(normalized.len(), 1);
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let normalized = normalize(&[request_rule(r"\.css$")]);
        let rule = &normalized[0];

        assert!(rule.request.is_match("./style.css"));
        assert!(!rule.request.is_match("./style.svg"));
        // Defaulted fields match anything, including the empty module identity.
        assert!(rule.base.is_match("components/Button"));
        assert!(rule.module.is_match(""));
    }

    #[test]
    fn test_normalize_preserves_order() {
        let rules = vec![request_rule("a"), request_rule("b"), request_rule("c")];
        let normalized = normalize(&rules);
        let patterns: Vec<&str> = normalized.iter().map(|r| r.request.as_str()).collect();
        assert_eq!(patterns, ["a", "b", "c"]);
    }

    #[test]
    fn test_needs_module_identity() {
        assert!(!needs_module_identity(&[request_rule("a")]));

        let with_module = Rule::new(
            MatchSpec::new()
                .with_request(Regex::new("a").unwrap())
                .with_module(Regex::new("lodash").unwrap()),
            Rewrite::template(Some("./x.css"), None),
        );
        assert!(needs_module_identity(&[with_module]));

        let with_append = request_rule("a").with_append();
        assert!(needs_module_identity(&[with_append]));
    }

    #[test]
    fn test_needs_module_identity_scans_unfiltered_list() {
        // The gate scans the original list, including rules the normalizer
        // would drop.
        let dropped_but_append = Rule::new(
            MatchSpec::new(),
            Rewrite::template(Some("./x.css"), None),
        )
        .with_append();
        assert!(needs_module_identity(&[dropped_but_append]));
    }

    #[test]
    fn test_rewrite_debug_for_function_form() {
        let rewrite = Rewrite::function(|_, _| vec!["./a.css".to_string()]);
        assert_eq!(format!("{rewrite:?}"), "Function(..)");
    }
}
