//! Client module for the remote authentication service.
//!
//! This module provides the `AuthClient` for exchanging credentials for a
//! bearer token at the password-grant token endpoint, plus the companion
//! verification and registration calls exposed by the same service.

pub mod client;
pub mod error;

pub use client::{AuthClient, Credentials, TokenEndpoint, TokenResponse, TokenVerifier, DEFAULT_BASE_URL};
pub use error::{AuthError, AUTH_FAILED_MESSAGE, TRANSPORT_FAILURE_MESSAGE};
