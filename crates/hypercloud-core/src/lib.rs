//! # hypercloud-core
//!
//! Authenticated request core for the Hypercloud REST API.
//!
//! This crate obtains OAuth2 client-credentials tokens, sends authenticated JSON
//! requests, retries once when the server rejects a stale token, and classifies
//! the final HTTP status into a stable error taxonomy.
//!
//! ## Modules
//!
//! - [`token`] - Token acquisition, caching and the expired-sentinel fallback
//! - [`dispatch`] - One authenticated HTTP exchange that never fails
//! - [`retry`] - The one-shot reauthentication rule
//! - [`error`] - Error types and status classification
//! - [`config`] - Credentials and client configuration
//! - [`client`] - HTTP settings and the public [`HypercloudClient`]

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod retry;
pub mod token;

// Re-export commonly used types
pub use client::{parse_method, ClientConfig, HypercloudClient, HypercloudClientBuilder};
pub use config::HypercloudConfig;
pub use dispatch::RequestOutcome;
pub use error::{ApiError, Error, ErrorKind, Result};
pub use reqwest::{Method, StatusCode};
pub use serde_json::Value;
