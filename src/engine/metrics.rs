//! Respond-loop timings.
//!
//! Collected for every top-level call; [`crate::Kernel::respond`] throws them
//! away and [`crate::Kernel::respond_verbose`] turns them into a
//! [`crate::ResponseDetails`].

use super::wildcard::MatchPath;
use std::time::Duration;

/// One top-level call.
#[derive(Debug, Default, Clone)]
pub struct RespondMetrics {
    /// Total elapsed time, sentence splitting and history updates included.
    pub total: Duration,
    /// One entry per non-empty sentence, in input order.
    pub sentences: Vec<SentenceMetrics>,
}

/// One sentence of a top-level call.
#[derive(Debug, Clone)]
pub struct SentenceMetrics {
    /// The sentence as submitted (before substitution).
    pub input: String,
    /// Path of the rule that answered it; `None` when nothing matched or the
    /// recursion guard tripped.
    pub path: Option<MatchPath>,
    pub output: String,
    /// Match plus evaluation, nested re-entries included.
    pub duration: Duration,
}

/// Outcome of a top-level call with its timings.
#[derive(Debug, Clone)]
pub struct RespondResult {
    pub response: String,
    pub metrics: RespondMetrics,
}
