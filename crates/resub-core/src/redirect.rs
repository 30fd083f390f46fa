//! The redirect pipeline.
//!
//! Control flow for one call: normalize rules → decide early resolution →
//! build the placeholder context → filter rules by match → generate and
//! resolve candidates concurrently → filter by existence → answer via the
//! fallback chain. Any internal error degrades to returning the original
//! request, so a misconfigured rule never blocks the surrounding build;
//! only strict mode turns "nothing found" into a hard failure.

use crate::error::RedirectError;
use crate::placeholder::{self, PlaceholderContext};
use crate::resolver::{EarlyResolver, FallbackResolver, ModuleResolver, ResolveFailure};
use crate::rules::{self, NormalizedRule, Rewrite, Rule};
use futures::future::join_all;
use resub_util::fs::FileSystem;
use resub_util::paths::{force_relative, is_absolute_spec, lexical_resolve, sep_to_unix};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Diagnostics sink for rule authors. Receives one line per call.
pub type ExplainSink = Box<dyn Fn(&str) + Send + Sync>;

/// Per-call options for [`Redirector::resolve`].
#[derive(Debug, Clone)]
pub struct RedirectRequest {
    /// The import string to rewrite.
    pub request: String,
    /// Directory the request originates from. Platform separators and a
    /// trailing slash are tolerated.
    pub base: String,
    /// Project root for root-anchored templates.
    pub root: String,
    /// Escalate "nothing found" to a hard error instead of falling back.
    pub strict: bool,
    /// Opaque options forwarded to resolver collaborators.
    pub import_options: serde_json::Value,
}

impl RedirectRequest {
    /// Build a request with the root defaulted to the process working
    /// directory.
    #[must_use]
    pub fn new(request: impl Into<String>, base: impl Into<String>) -> Self {
        let root = std::env::current_dir()
            .map_or_else(|_| ".".to_string(), |p| p.to_string_lossy().into_owned());
        Self {
            request: request.into(),
            base: base.into(),
            root,
            strict: false,
            import_options: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    #[must_use]
    pub fn with_strict(mut self) -> Self {
        self.strict = true;
        self
    }

    #[must_use]
    pub fn with_import_options(mut self, options: serde_json::Value) -> Self {
        self.import_options = options;
        self
    }
}

/// A resolved candidate path awaiting filesystem verification, tagged with
/// the append flag of the rule that produced it.
#[derive(Debug, Clone)]
struct Candidate {
    path: String,
    append: bool,
}

/// Rule-driven import redirection.
///
/// Collaborators are fixed at construction; [`resolve`](Self::resolve) is
/// then deterministic given its inputs and the filesystem state.
pub struct Redirector {
    resolver: Arc<dyn ModuleResolver>,
    fs: Arc<dyn FileSystem>,
    early: Option<Arc<dyn EarlyResolver>>,
    fallback: Option<Arc<dyn FallbackResolver>>,
    explain: Option<ExplainSink>,
}

impl Redirector {
    #[must_use]
    pub fn new(resolver: Arc<dyn ModuleResolver>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            resolver,
            fs,
            early: None,
            fallback: None,
            explain: None,
        }
    }

    /// Override the early module-identity resolution.
    #[must_use]
    pub fn with_early_resolver(mut self, early: Arc<dyn EarlyResolver>) -> Self {
        self.early = Some(early);
        self
    }

    /// Consult `fallback` when no redirected candidate exists on disk.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackResolver>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Emit the placeholder context through `sink` before rule evaluation.
    #[must_use]
    pub fn with_explain<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.explain = Some(Box::new(sink));
        self
    }

    /// Rewrite `req.request` according to `rules`.
    ///
    /// Returns the redirected path(s) whose candidates exist on disk, the
    /// fallback resolver's answer, or `[request]` untouched. The list is
    /// never empty. Internal failures are logged and degrade to the
    /// pass-through outcome; only strict mode produces an error.
    pub async fn resolve(
        &self,
        rules: &[Rule],
        req: &RedirectRequest,
    ) -> Result<Vec<String>, RedirectError> {
        match self.run(rules, req).await {
            Ok(paths) => Ok(paths),
            Err(err @ RedirectError::NotFound { .. }) => Err(err),
            Err(err) => {
                warn!(error = %err, request = %req.request, "import redirect degraded to pass-through");
                Ok(vec![req.request.clone()])
            }
        }
    }

    async fn run(
        &self,
        rules_list: &[Rule],
        req: &RedirectRequest,
    ) -> Result<Vec<String>, RedirectError> {
        let base = sep_to_unix(&req.base);
        let root = req.root.as_str();
        let ctx = PlaceholderContext::fixed(&req.request, root, &base);

        self.emit_explain(&ctx, root);

        // Resolve the module identity up front only when some rule depends
        // on it; rule sets without `module` patterns or `append` flags never
        // hit the resolver here.
        let module = if rules::needs_module_identity(rules_list) {
            Some(self.resolve_module_identity(req, &base).await?)
        } else {
            None
        };

        let normalized = rules::normalize(rules_list);
        let module_value = module.as_deref().unwrap_or("");
        let matching: Vec<&NormalizedRule> = normalized
            .iter()
            .filter(|rule| {
                rule.request.is_match(&req.request)
                    && rule.base.is_match(&base)
                    && rule.module.is_match(module_value)
            })
            .collect();
        debug!(
            matched = matching.len(),
            total = rules_list.len(),
            request = %req.request,
            "evaluating redirect rules"
        );

        // One future per matching rule; join_all keeps rule-list order, so
        // completion order cannot reorder or mis-attribute candidates.
        let candidate_sets = join_all(
            matching
                .into_iter()
                .map(|rule| self.candidates_for(rule, &ctx, req, &base, module.as_deref())),
        )
        .await;
        let candidates: Vec<Candidate> = candidate_sets.into_iter().flatten().collect();

        let existing: Vec<&Candidate> = candidates
            .iter()
            .filter(|candidate| self.fs.exists(Path::new(&candidate.path)))
            .collect();

        if !existing.is_empty() {
            let prepend_module = existing.iter().any(|candidate| candidate.append);
            let mut outcome = Vec::with_capacity(existing.len() + 1);
            if prepend_module {
                outcome.push(module.unwrap_or_default());
            }
            outcome.extend(existing.into_iter().map(|candidate| candidate.path.clone()));
            return Ok(outcome);
        }

        if req.strict {
            return Err(RedirectError::NotFound {
                request: req.request.clone(),
            });
        }

        if let Some(fallback) = &self.fallback {
            let answer = fallback.resolve(&req.request, &base, &req.import_options);
            if !answer.is_empty() {
                return Ok(answer);
            }
        }

        // The surrounding engine decides what to do with the untouched
        // request.
        Ok(vec![req.request.clone()])
    }

    /// Early-resolve the original request, once per call.
    async fn resolve_module_identity(
        &self,
        req: &RedirectRequest,
        base: &str,
    ) -> Result<String, RedirectError> {
        let identity = match &self.early {
            Some(early) => {
                early
                    .resolve(&req.request, base, &req.import_options)
                    .await?
            }
            None => self.resolve_one(&req.request, base, &req.root).await?,
        };
        Ok(identity)
    }

    /// Generate and resolve this rule's candidates against a rule-local
    /// placeholder context.
    async fn candidates_for(
        &self,
        rule: &NormalizedRule,
        base_ctx: &PlaceholderContext,
        req: &RedirectRequest,
        base: &str,
        module: Option<&str>,
    ) -> Vec<Candidate> {
        let mut ctx = base_ctx.clone();
        if let Some(caps) = rule.request.captures(&req.request) {
            ctx.merge_captures("request", &caps);
        }
        if let Some(caps) = rule.base.captures(base) {
            ctx.merge_captures("base", &caps);
        }
        if let Some(module) = module {
            if let Some(caps) = rule.module.captures(module) {
                ctx.merge_captures("module", &caps);
            }
        }

        let root = req.root.as_str();
        match &rule.rewrite {
            Rewrite::Function(compute) => {
                let requests = compute(&ctx, placeholder::substitute);
                // Function-form candidates resolve against the original base.
                let resolved = join_all(
                    requests
                        .iter()
                        .map(|request| self.try_candidate(request, base, root, rule.append)),
                )
                .await;
                resolved.into_iter().flatten().collect()
            }
            Rewrite::Template {
                request: request_template,
                base: base_template,
            } => {
                let custom_request = request_template.as_deref().map_or_else(
                    || req.request.clone(),
                    |template| placeholder::substitute_wrapped(template, &ctx, root),
                );
                let custom_base = base_template.as_deref().map_or_else(
                    || base.to_string(),
                    |template| placeholder::substitute_wrapped(template, &ctx, root),
                );
                // A rewritten base is anchored (base-relative, then
                // root-relative) before it becomes the basedir.
                let basedir = if custom_base == base {
                    custom_base
                } else {
                    lexical_resolve(&lexical_resolve(root, base), &custom_base)
                };
                self.try_candidate(&custom_request, &basedir, root, rule.append)
                    .await
                    .into_iter()
                    .collect()
            }
        }
    }

    /// Resolve one candidate; a resolver rejection drops this candidate and
    /// nothing else.
    async fn try_candidate(
        &self,
        request: &str,
        basedir: &str,
        root: &str,
        append: bool,
    ) -> Option<Candidate> {
        match self.resolve_one(request, basedir, root).await {
            Ok(path) => Some(Candidate { path, append }),
            Err(failure) => {
                debug!(error = %failure, "candidate failed to resolve");
                None
            }
        }
    }

    /// Resolve a single (request, basedir, root) triple. Absolute requests
    /// pass through; relative ones go to the external resolver.
    async fn resolve_one(
        &self,
        request: &str,
        basedir: &str,
        root: &str,
    ) -> Result<String, ResolveFailure> {
        if is_absolute_spec(request) {
            return Ok(request.to_string());
        }
        self.resolver
            .resolve(&force_relative(request), &lexical_resolve(root, basedir))
            .await
    }

    fn emit_explain(&self, ctx: &PlaceholderContext, root: &str) {
        let Some(sink) = &self.explain else {
            return;
        };
        sink("");
        sink("Import redirect:");
        sink(&format!("~: {root}"));
        for name in ["request", "root", "base", "id", "basename"] {
            sink(&format!("{name}: {}", ctx.get(name).unwrap_or_default()));
        }
        sink("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::PathResolver;
    use crate::rules::MatchSpec;
    use regex_lite::Regex;
    use resub_util::fs::MemoryFileSystem;
    use std::sync::Mutex;

    fn redirector(fs: MemoryFileSystem) -> Redirector {
        Redirector::new(Arc::new(PathResolver), Arc::new(fs))
    }

    #[test]
    fn test_request_defaults() {
        let req = RedirectRequest::new("./a.css", "src");
        assert!(!req.strict);
        assert!(req.import_options.is_null());
        assert!(!req.root.is_empty());
    }

    #[tokio::test]
    async fn test_explain_emits_context_before_rules() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink_lines = Arc::clone(&lines);

        let fs = MemoryFileSystem::seeded(["/xxx/custom/components/Button/style.css"]);
        let redirector = redirector(fs).with_explain(move |line: &str| {
            sink_lines.lock().unwrap().push(line.to_string());
        });

        let rule = Rule::new(
            MatchSpec::new()
                .with_base(Regex::new(r"components/([\w]*)$").unwrap())
                .with_request(Regex::new(r"\./([\w]*)\.css").unwrap()),
            Rewrite::template(Some("./<request:1>.css"), Some("<root>/custom/components/<base:1>/")),
        );
        let req = RedirectRequest::new("./style.css", "components/Button/").with_root("/xxx/");

        redirector.resolve(&[rule], &req).await.unwrap();

        let lines = lines.lock().unwrap();
        assert_eq!(
            *lines,
            [
                "",
                "Import redirect:",
                "~: /xxx/",
                "request: ./style.css",
                "root: /xxx/",
                "base: components/Button",
                "id: style.css",
                "basename: Button",
                "",
            ]
        );
    }

    #[tokio::test]
    async fn test_no_rules_passes_through() {
        let redirector = redirector(MemoryFileSystem::new());
        let req = RedirectRequest::new("./a.css", "src").with_root("/xxx");
        let out = redirector.resolve(&[], &req).await.unwrap();
        assert_eq!(out, ["./a.css"]);
    }
}
