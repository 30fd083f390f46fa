use crate::resolver::ResolveFailure;
use thiserror::Error;

/// Errors surfaced by the redirect pipeline.
///
/// Only `NotFound` (strict mode) ever reaches callers of
/// [`Redirector::resolve`](crate::Redirector::resolve); everything else is
/// degraded to a pass-through outcome so a misconfigured rule never blocks a
/// build.
#[derive(Error, Debug)]
pub enum RedirectError {
    /// Strict mode was enabled and no redirected candidate exists on disk.
    #[error("no redirected path found for `{request}`")]
    NotFound { request: String },

    /// Early module resolution of the original request failed.
    #[error("early module resolution failed: {0}")]
    EarlyResolution(#[from] ResolveFailure),
}
