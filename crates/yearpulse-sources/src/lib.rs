//! Data sources for yearpulse: the local git history and the GitHub
//! issues API.
//!
//! Both are thin collaborators that hand raw records to
//! `yearpulse-metrics`; neither performs any aggregation.

pub mod git;
pub mod github;
