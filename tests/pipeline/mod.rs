//! Tests for optimistic lead moves over the client stack.
//!
//! Test organization:
//! - board_moves.rs: apply, confirm and roll back as seen by subscribers
//! - board_rules.rs: terminal-state rule and loading

mod board_moves;
