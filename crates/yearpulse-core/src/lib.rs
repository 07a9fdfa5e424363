//! Core types, configuration, and error handling for yearpulse.
//!
//! This crate provides the shared foundation used by all other yearpulse crates:
//! - [`PulseError`] — unified error type using `thiserror`
//! - [`PulseConfig`] — configuration loaded from `.yearpulse.toml`
//! - [`RunContext`] — the resolved settings handed to one analysis run

mod config;
mod error;

pub use config::{
    default_ignored_domains, GitHubConfig, IdentityConfig, PulseConfig, ReportConfig, RunContext,
    REPORT_SUFFIX,
};
pub use error::PulseError;
