//! Declarative rule configuration.
//!
//! Template-form rules can live in project configuration instead of code:
//!
//! ```json
//! {
//!   "rules": [
//!     {
//!       "match": { "request": "\\./([\\w]*)\\.css", "base": "components/([\\w]*)$" },
//!       "use": { "request": "./<request:1>.css", "base": "<root>/custom/components/<base:1>" },
//!       "append": false
//!     }
//!   ]
//! }
//! ```
//!
//! Match fields are regex source strings; an entry whose pattern fails to
//! compile is dropped with a warning, mirroring the runtime rule
//! normalizer's silently-inapplicable semantics. Function-form rewrites are
//! not expressible declaratively.

use crate::rules::{MatchSpec, Rewrite, Rule};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A set of declarative redirect rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedirectConfig {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// One declarative rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(rename = "match", default)]
    pub matches: MatchConfig,
    #[serde(rename = "use", default)]
    pub rewrite: TemplateConfig,
    #[serde(default)]
    pub append: bool,
}

/// Regex source strings for a rule's match fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchConfig {
    pub request: Option<String>,
    pub base: Option<String>,
    pub module: Option<String>,
}

/// Template strings for a rule's rewrite.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub request: Option<String>,
    pub base: Option<String>,
}

impl RedirectConfig {
    /// Parse a config document from JSON.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Compile into runtime rules, dropping entries with invalid patterns.
    #[must_use]
    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
            .into_iter()
            .filter_map(RuleConfig::compile)
            .collect()
    }
}

impl RuleConfig {
    fn compile(self) -> Option<Rule> {
        let mut matches = MatchSpec::new();
        matches.request = compile_pattern(self.matches.request.as_deref())?;
        matches.base = compile_pattern(self.matches.base.as_deref())?;
        matches.module = compile_pattern(self.matches.module.as_deref())?;

        let rewrite = Rewrite::template(self.rewrite.request.as_deref(), self.rewrite.base.as_deref());
        let rule = Rule::new(matches, rewrite);
        Some(if self.append { rule.with_append() } else { rule })
    }
}

/// Compile an optional pattern source. `Ok(None)`-style: outer `None` means
/// the whole rule is dropped, inner `None` means the field was unset.
fn compile_pattern(source: Option<&str>) -> Option<Option<Regex>> {
    match source {
        None => Some(None),
        Some(source) => match Regex::new(source) {
            Ok(pattern) => Some(Some(pattern)),
            Err(error) => {
                warn!(pattern = source, error = %error, "dropping redirect rule with invalid pattern");
                None
            }
        },
    }
}
