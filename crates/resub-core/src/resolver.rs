//! Resolver collaborators.
//!
//! The pipeline prepares and verifies candidate paths; actual module
//! resolution (extension probing, `node_modules`-style search, whatever the
//! surrounding engine does) stays behind the [`ModuleResolver`] seam.

use async_trait::async_trait;
use resub_util::paths::lexical_resolve;
use thiserror::Error;

/// A candidate could not be resolved by the external algorithm.
#[derive(Error, Debug, Clone)]
#[error("cannot resolve `{request}` from `{basedir}`: {message}")]
pub struct ResolveFailure {
    pub request: String,
    pub basedir: String,
    pub message: String,
}

impl ResolveFailure {
    #[must_use]
    pub fn new(
        request: impl Into<String>,
        basedir: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            request: request.into(),
            basedir: basedir.into(),
            message: message.into(),
        }
    }
}

/// External module-resolution algorithm.
///
/// `request` is a relative specifier (the pipeline forces a leading `./`
/// where needed); `basedir` is the absolute directory to resolve from.
#[async_trait]
pub trait ModuleResolver: Send + Sync {
    async fn resolve(&self, request: &str, basedir: &str) -> Result<String, ResolveFailure>;
}

/// Override for the early module-identity resolution.
///
/// By default the pipeline early-resolves the original request through its
/// [`ModuleResolver`]; configuring one of these replaces that step.
#[async_trait]
pub trait EarlyResolver: Send + Sync {
    async fn resolve(
        &self,
        request: &str,
        base: &str,
        import_options: &serde_json::Value,
    ) -> Result<String, ResolveFailure>;
}

/// User-supplied fallback consulted when no redirected candidate exists.
pub trait FallbackResolver: Send + Sync {
    fn resolve(&self, request: &str, base: &str, import_options: &serde_json::Value)
        -> Vec<String>;
}

impl<F> FallbackResolver for F
where
    F: Fn(&str, &str, &serde_json::Value) -> Vec<String> + Send + Sync,
{
    fn resolve(
        &self,
        request: &str,
        base: &str,
        import_options: &serde_json::Value,
    ) -> Vec<String> {
        self(request, base, import_options)
    }
}

/// Lexical-join resolver: joins the request onto the basedir and normalizes,
/// without touching the filesystem.
///
/// Candidate existence is verified downstream by the pipeline, so this is
/// sufficient wherever the engine's own resolver is not available. The test
/// suites run against it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver;

#[async_trait]
impl ModuleResolver for PathResolver {
    async fn resolve(&self, request: &str, basedir: &str) -> Result<String, ResolveFailure> {
        Ok(lexical_resolve(basedir, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_path_resolver_joins_and_normalizes() {
        let resolver = PathResolver;
        let resolved = resolver
            .resolve("./testB1.js", "/xxx/some/directory")
            .await
            .unwrap();
        assert_eq!(resolved, "/xxx/some/directory/testB1.js");

        let resolved = resolver
            .resolve("../sibling.css", "/xxx/some/directory")
            .await
            .unwrap();
        assert_eq!(resolved, "/xxx/some/sibling.css");
    }

    #[test]
    fn test_resolve_failure_display() {
        let failure = ResolveFailure::new("./missing.css", "/xxx", "not found");
        assert_eq!(
            failure.to_string(),
            "cannot resolve `./missing.css` from `/xxx`: not found"
        );
    }

    #[test]
    fn test_closure_as_fallback_resolver() {
        let fallback =
            |request: &str, _base: &str, _opts: &serde_json::Value| vec![request.to_string()];
        let out = FallbackResolver::resolve(&fallback, "./a.css", "base", &serde_json::Value::Null);
        assert_eq!(out, ["./a.css"]);
    }
}
