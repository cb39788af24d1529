//! Authentication module for OAuth 1.0a access to BIGSdb.
//!
//! This module provides:
//! - `Credential` / `CredentialStore`: the three token tiers and where they live
//! - `Operator`: the interactive seam for verification codes
//! - `TokenManager`: escalation from request to access to session tokens,
//!   with a single automatic renewal when a session token has expired.
//!   Requests are signed (HMAC-SHA1) through `reqwest-oauth1`.
//!
//! Session tokens expire server-side after 12 hours; access tokens do not
//! expire but may be revoked.

pub mod credentials;
pub mod lifecycle;
pub mod operator;

pub use credentials::{
    Credential, CredentialKind, CredentialStore, FileCredentialStore, KeyringCredentialStore,
    MemoryCredentialStore,
};
pub use lifecycle::TokenManager;
pub use operator::{Operator, TerminalOperator};
