//! Yearly community-health metrics.
//!
//! Turns raw commit log lines and issue records into per-year accumulators,
//! then derives one summary per year: commit volume, contributor counts,
//! bus factor, elephant factor, and issue lifecycle statistics.

pub mod bucket;
pub mod commits;
pub mod concentration;
pub mod identity;
pub mod issues;
pub mod report;
