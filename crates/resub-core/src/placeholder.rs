//! Placeholder names and template substitution.
//!
//! Templates reference placeholders as bracketed tokens (`<root>`,
//! `<request:1>`) plus the bare root shorthand `~`. Function-form rewrites
//! receive the same values under their raw names.
//!
//! Fixed entries are built once per resolution call: `request`, `root`,
//! `base`, `id` (file name of the request), `basename` (leaf segment of the
//! base). Capture-group entries (`request:N`, `base:N`, `module:N`, group 0
//! being the whole match) are merged per rule, into a clone of the fixed
//! context. A rule only ever sees its own captures, regardless of how the
//! concurrent evaluations interleave.

use regex_lite::Captures;
use resub_util::paths::last_segment;
use std::collections::BTreeMap;

/// Named string values available to a rule's templates and functions.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderContext {
    entries: BTreeMap<String, String>,
}

impl PlaceholderContext {
    /// Build the fixed entries for one resolution call.
    pub(crate) fn fixed(request: &str, root: &str, base: &str) -> Self {
        let mut ctx = Self::default();
        ctx.set("request", request);
        ctx.set("root", root);
        ctx.set("base", base);
        ctx.set("id", last_segment(request));
        ctx.set("basename", last_segment(base));
        ctx
    }

    /// Look up a placeholder value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Insert or overwrite a placeholder.
    pub fn set(&mut self, name: &str, value: &str) {
        self.entries.insert(name.to_string(), value.to_string());
    }

    /// Iterate entries in deterministic (sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merge one match's capture groups as `field:index` entries. Groups
    /// that did not participate in the match become empty strings.
    pub(crate) fn merge_captures(&mut self, field: &str, captures: &Captures<'_>) {
        for index in 0..captures.len() {
            let value = captures.get(index).map_or("", |m| m.as_str());
            self.set(&format!("{field}:{index}"), value);
        }
    }
}

/// Replace raw placeholder names in `pattern` with their values.
///
/// This is the helper handed to function-form rewrites. Longer names are
/// substituted first so `request:1` is never shadowed by `request`.
#[must_use]
pub fn substitute(pattern: &str, ctx: &PlaceholderContext) -> String {
    let mut keys: Vec<&str> = ctx.entries.keys().map(String::as_str).collect();
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

    let mut out = pattern.to_string();
    for key in keys {
        if out.contains(key) {
            out = out.replace(key, &ctx.entries[key]);
        }
    }
    out
}

/// Replace bracketed `<name>` tokens and the root shorthand `~` in a
/// template.
pub(crate) fn substitute_wrapped(template: &str, ctx: &PlaceholderContext, root: &str) -> String {
    let mut out = template.replace('~', root);

    let mut keys: Vec<&str> = ctx.entries.keys().map(String::as_str).collect();
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

    for key in keys {
        let token = format!("<{key}>");
        if out.contains(&token) {
            out = out.replace(&token, &ctx.entries[key]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex_lite::Regex;

    fn ctx() -> PlaceholderContext {
        PlaceholderContext::fixed("./style.css", "/xxx", "components/Button")
    }

    #[test]
    fn test_fixed_entries() {
        let ctx = ctx();
        assert_eq!(ctx.get("request"), Some("./style.css"));
        assert_eq!(ctx.get("root"), Some("/xxx"));
        assert_eq!(ctx.get("base"), Some("components/Button"));
        assert_eq!(ctx.get("id"), Some("style.css"));
        assert_eq!(ctx.get("basename"), Some("Button"));
        assert_eq!(ctx.get("module"), None);
    }

    #[test]
    fn test_id_strips_directories() {
        let ctx = PlaceholderContext::fixed("./assets/icon.svg", "/xxx", "components/Button");
        assert_eq!(ctx.get("id"), Some("icon.svg"));
    }

    #[test]
    fn test_merge_captures() {
        let mut ctx = ctx();
        let re = Regex::new(r"\./([\w]*)\.css").unwrap();
        let caps = re.captures("./style.css").unwrap();
        ctx.merge_captures("request", &caps);

        assert_eq!(ctx.get("request:0"), Some("./style.css"));
        assert_eq!(ctx.get("request:1"), Some("style"));
    }

    #[test]
    fn test_merge_captures_missing_group_is_empty() {
        let mut ctx = ctx();
        let re = Regex::new(r"(a)|(b)").unwrap();
        let caps = re.captures("a").unwrap();
        ctx.merge_captures("request", &caps);

        assert_eq!(ctx.get("request:1"), Some("a"));
        assert_eq!(ctx.get("request:2"), Some(""));
    }

    #[test]
    fn test_substitute_wrapped() {
        let mut ctx = ctx();
        let re = Regex::new(r"components/([\w]*)$").unwrap();
        ctx.merge_captures("base", &re.captures("components/Button").unwrap());

        let out = substitute_wrapped("<root>/custom/components/<base:1>", &ctx, "/xxx");
        assert_eq!(out, "/xxx/custom/components/Button");
    }

    #[test]
    fn test_substitute_wrapped_root_shorthand() {
        let out = substitute_wrapped("~/custom/svgs/<id>", &ctx(), "/xxx");
        assert_eq!(out, "/xxx/custom/svgs/style.css");
    }

    #[test]
    fn test_substitute_wrapped_longer_keys_first() {
        let mut ctx = ctx();
        let re = Regex::new(r"\./([\w]*)\.css").unwrap();
        ctx.merge_captures("request", &re.captures("./style.css").unwrap());

        let out = substitute_wrapped("./<request:1>.css", &ctx, "/xxx");
        assert_eq!(out, "./style.css");
    }

    #[test]
    fn test_substitute_raw_names() {
        let out = substitute("root/custom/id", &ctx());
        assert_eq!(out, "/xxx/custom/style.css");
    }

    #[test]
    fn test_substitute_leaves_unknown_text() {
        let out = substitute("no placeholders here", &ctx());
        // `base` does not occur, and unknown words are untouched.
        assert_eq!(out, "no placeholders here");
    }
}
