//! REST API module for BIGSdb databases.
//!
//! This module provides the `ApiClient` for the public (unauthenticated)
//! resources, the payload builder for authenticated uploads, and the
//! `ApiError` taxonomy shared by the whole crate.

pub mod client;
pub mod error;
pub mod payload;

pub use client::{ApiClient, ApiResponse, HttpMethod};
pub use error::ApiError;
pub use payload::{Payload, UploadSources};
