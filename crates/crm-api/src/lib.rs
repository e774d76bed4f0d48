//! Resilient client for the CRM REST API.
//!
//! `crm-api` puts the layers of this workspace together:
//!
//! - [`executor`]: one HTTP attempt with a timeout and error classification
//! - [`retry`]: fixed-delay retries of UNKNOWN failures
//! - [`endpoints`]: the endpoint catalog and primary/fallback calls
//! - [`pipeline`]: the optimistic lead board
//!
//! [`ApiClient`] wires them in that order over a `reqwest` transport.
//!
//! ## Example
//!
//! ```rust,no_run
//! use crm_api::{ApiClient, ApiClientConfig, Method};
//! use crm_api::pipeline::LeadStatus;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::builder()
//!     .config(ApiClientConfig::from_env()?)
//!     .bearer_token("token")
//!     .build()?;
//!
//! let invoices = client.fetch_list("invoices", "list").await?;
//! let created = client
//!     .call_with_fallback("customers", "create", Method::Post, Some(json!({"name": "Ada"})))
//!     .await?;
//!
//! let board = client.board();
//! board.load().await?;
//! board.move_lead(7, LeadStatus::Contacted).await;
//! # let _ = (invoices, created);
//! # Ok(())
//! # }
//! ```

pub use crm_api_core as core;
pub use crm_api_endpoints as endpoints;
pub use crm_api_executor as executor;
pub use crm_api_pipeline as pipeline;
pub use crm_api_retry as retry;

pub use client::{ApiClient, ApiClientBuilder, RequestStack};
pub use config::{ApiClientConfig, ConfigError};
pub use crm_api_core::{ApiError, ErrorKind};
pub use crm_api_endpoints::{resolve, Endpoint};
pub use crm_api_executor::{Method, RequestDescriptor};

mod client;
mod config;
