//! The protected page.
//!
//! The page guards itself: it opens only when the session store holds a
//! token and otherwise sends the router back to the login route. Once open
//! it asks the server whether the token is still accepted. The answer is
//! shown but never clears the stored token; only an explicit logout does.

use anyhow::Result;
use tracing::{debug, info};

use crate::api::{AuthError, TokenVerifier, AUTH_FAILED_MESSAGE};
use crate::auth::SessionStore;
use crate::router::{Navigator, Route};

/// Result of asking the server about the stored token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyStatus {
    Checking,
    Valid,
    Rejected(String),
    Unreachable,
}

impl VerifyStatus {
    pub fn label(&self) -> String {
        match self {
            VerifyStatus::Checking => "Checking token...".to_string(),
            VerifyStatus::Valid => "Token is valid".to_string(),
            VerifyStatus::Rejected(detail) => format!("Token rejected: {}", detail),
            VerifyStatus::Unreachable => "Could not reach server".to_string(),
        }
    }
}

impl From<Result<(), AuthError>> for VerifyStatus {
    fn from(result: Result<(), AuthError>) -> Self {
        match result {
            Ok(()) => VerifyStatus::Valid,
            Err(AuthError::Rejected { detail, .. }) => {
                VerifyStatus::Rejected(detail.unwrap_or_else(|| AUTH_FAILED_MESSAGE.to_string()))
            }
            Err(_) => VerifyStatus::Unreachable,
        }
    }
}

/// A verification request handed out by [`ProtectedPage::begin_check`].
#[derive(Debug, Clone)]
pub struct VerifyCheck {
    pub generation: u64,
    pub token: String,
}

#[derive(Debug)]
pub struct ProtectedPage {
    token: String,
    status: VerifyStatus,
    generation: u64,
}

impl ProtectedPage {
    /// Open the page from the stored token, or redirect to login when there is none.
    pub fn open<S, N>(store: &S, navigator: &mut N) -> Result<Option<Self>>
    where
        S: SessionStore + ?Sized,
        N: Navigator + ?Sized,
    {
        match store.load()? {
            Some(token) => Ok(Some(Self {
                token,
                status: VerifyStatus::Checking,
                generation: 0,
            })),
            None => {
                debug!("No stored token, redirecting to login");
                navigator.navigate(Route::Login);
                Ok(None)
            }
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn status(&self) -> &VerifyStatus {
        &self.status
    }

    /// Start a new verification; earlier ones in flight become stale.
    pub fn begin_check(&mut self) -> VerifyCheck {
        self.generation += 1;
        self.status = VerifyStatus::Checking;
        VerifyCheck {
            generation: self.generation,
            token: self.token.clone(),
        }
    }

    /// Record the answer for `generation`. Returns false for a stale answer.
    pub fn finish_check(&mut self, generation: u64, status: VerifyStatus) -> bool {
        if generation != self.generation {
            return false;
        }
        debug!(?status, "Token check finished");
        self.status = status;
        true
    }

    /// Check the token against `verifier` and wait for the answer.
    pub async fn verify<V: TokenVerifier + ?Sized>(&mut self, verifier: &V) -> &VerifyStatus {
        let check = self.begin_check();
        let status = VerifyStatus::from(verifier.verify_token(&check.token).await);
        self.finish_check(check.generation, status);
        &self.status
    }

    /// Clear the stored token and go back to the login route.
    pub fn logout<S, N>(self, store: &S, navigator: &mut N) -> Result<()>
    where
        S: SessionStore + ?Sized,
        N: Navigator + ?Sized,
    {
        store.clear()?;
        info!("Logged out");
        navigator.navigate(Route::Login);
        Ok(())
    }
}
