//! Tests for the retry coordinator stacked on the executor.
//!
//! Test organization:
//! - retry_behavior.rs: which failures are retried and how often
//! - retry_events.rs: retry notifications and log-facing counts

mod retry_events;
