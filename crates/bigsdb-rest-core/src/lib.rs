//! Core library for talking to BIGSdb REST databases.
//!
//! This crate provides:
//! - `api`: the public REST client, request payloads and the error taxonomy
//! - `auth`: credential stores, the operator seam and the token lifecycle manager
//! - `catalog` / `alleles`: scheme listing and allele FASTA downloads
//! - `config`: the explicit client configuration
//! - `models`: serde types for the API's JSON documents

pub mod alleles;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, ApiResponse, HttpMethod, Payload};
pub use auth::{
    Credential, CredentialKind, CredentialStore, FileCredentialStore, KeyringCredentialStore,
    MemoryCredentialStore, Operator, TerminalOperator, TokenManager,
};
pub use config::ClientConfig;
