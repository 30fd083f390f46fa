#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

//! Rule-driven import redirection for asset build pipelines.
//!
//! Given an import request, the directory it came from, and an ordered list
//! of rewrite rules, [`Redirector::resolve`] computes redirected candidate
//! paths from regex captures and placeholder templates, verifies them
//! against the filesystem, and returns the first matching path(s) that
//! exist. When nothing exists it falls back to a user resolver or the
//! untouched request.
//!
//! ```no_run
//! use resub_core::{
//!     MatchSpec, RedirectRequest, Redirector, Regex, Rewrite, Rule, PathResolver,
//! };
//! use resub_util::fs::OsFileSystem;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), resub_core::RedirectError> {
//! let redirector = Redirector::new(Arc::new(PathResolver), Arc::new(OsFileSystem));
//! let rule = Rule::new(
//!     MatchSpec::new().with_request(Regex::new(r"\.css$").unwrap()),
//!     Rewrite::template(Some("./<id>"), Some("<root>/themes/custom/<basename>")),
//! );
//! let _paths = redirector
//!     .resolve(
//!         std::slice::from_ref(&rule),
//!         &RedirectRequest::new("./style.css", "components/Button"),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod placeholder;
pub mod redirect;
pub mod resolver;
pub mod rules;

/// The regex type rule patterns are built from.
pub use regex_lite::Regex;

pub use config::{MatchConfig, RedirectConfig, RuleConfig, TemplateConfig};
pub use error::RedirectError;
pub use placeholder::{substitute, PlaceholderContext};
pub use redirect::{ExplainSink, RedirectRequest, Redirector};
pub use resolver::{
    EarlyResolver, FallbackResolver, ModuleResolver, PathResolver, ResolveFailure,
};
pub use rules::{MatchSpec, Rewrite, RewriteFn, Rule, SubstituteFn};
