//! Core infrastructure for the CRM API client.
//!
//! This crate provides the pieces every layer of the client shares:
//! - [`ApiError`], the classified failure returned by every call
//! - An event system so callers can observe attempts, retries and fallbacks

pub mod error;
pub mod events;

pub use error::{ApiError, ErrorContext, ErrorKind};
pub use events::{BoxedEventListener, ClientEvent, EventListener, EventListeners, FnListener};
