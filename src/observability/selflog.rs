//! Internal diagnostics for the enrichment pipeline.
//!
//! Enrichment must never fail a log call or an exchange, so recoverable
//! problems (an unreadable environment variable, a body that fails mid-read,
//! a failing sink) are reported here.

use std::fmt::Display;

/// Target used for self-log records.
pub const SELFLOG_TARGET: &str = "log_enricher::selflog";

/// Report a non-fatal internal error about `subject` (a variable name, a
/// request path, an event template).
pub fn report(context: &str, subject: &str, error: &dyn Display) {
    tracing::warn!(target: SELFLOG_TARGET, subject = %subject, error = %error, "{}", context);
    crate::observability::metrics::record_selflog();
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_carries_subject() {
        let ((), diagnostics) = capture::diagnostics(|| {
            report("Failed to read a tracked environment variable value", "APP_ENV", &"denied");
        });

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0]["subject"], "APP_ENV");
        assert_eq!(diagnostics[0]["error"], "denied");
        assert_eq!(diagnostics[0]["message"], "Failed to read a tracked environment variable value");
    }
}
