//! Core library for authfront.
//!
//! Everything except drawing lives here: the token endpoint client, the
//! injected session store, the login form and its submission flow, the
//! protected page, the two-route router and configuration.

pub mod api;
pub mod auth;
pub mod config;
pub mod login;
pub mod protected;
pub mod router;

pub use api::{AuthClient, AuthError, Credentials};
pub use auth::SessionStore;
pub use config::Config;
pub use login::{LoginOutcome, LoginPage};
pub use protected::{ProtectedPage, VerifyStatus};
pub use router::{Navigator, Route, Router};
