#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Shared utilities for resub.
//!
//! This crate provides pure helper functions with no logging/tracing dependencies.
//! Logging is handled by the core crate to keep these helpers lightweight.

pub mod fs;
pub mod paths;
