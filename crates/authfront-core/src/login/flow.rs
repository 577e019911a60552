use tracing::{debug, error, info, warn};

use crate::api::{AuthError, Credentials, TokenEndpoint, TRANSPORT_FAILURE_MESSAGE};
use crate::auth::SessionStore;
use crate::router::{Navigator, Route};

use super::form::{LoginForm, Submission, SubmissionId, SubmitError};

/// How one submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The endpoint issued a token
    Authenticated { token: String },
    /// The endpoint answered with a non-success status
    Rejected { message: String },
    /// No verdict could be read: network failure or malformed response
    Failed { message: String },
}

impl LoginOutcome {
    /// The error text to display, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            LoginOutcome::Authenticated { .. } => None,
            LoginOutcome::Rejected { message } | LoginOutcome::Failed { message } => {
                Some(message.as_str())
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, LoginOutcome::Authenticated { .. })
    }
}

impl From<Result<String, AuthError>> for LoginOutcome {
    fn from(result: Result<String, AuthError>) -> Self {
        match result {
            Ok(token) => LoginOutcome::Authenticated { token },
            Err(e) if e.is_rejection() => LoginOutcome::Rejected {
                message: e.user_message(),
            },
            Err(e) => LoginOutcome::Failed {
                message: e.user_message(),
            },
        }
    }
}

/// Send the credentials to the endpoint once and classify the answer.
pub async fn exchange_credentials<E>(endpoint: &E, credentials: &Credentials) -> LoginOutcome
where
    E: TokenEndpoint + ?Sized,
{
    let result = endpoint
        .request_token(credentials)
        .await
        .map(|response| response.access_token);

    if let Err(ref e) = result {
        warn!(error = %e, username = %credentials.username, "Login failed");
    }
    LoginOutcome::from(result)
}

/// The login page: form state plus what happens when a submission ends.
#[derive(Debug, Default)]
pub struct LoginPage {
    form: LoginForm,
}

impl LoginPage {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            form: LoginForm::new(username),
        }
    }

    pub fn form(&self) -> &LoginForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut LoginForm {
        &mut self.form
    }

    /// Validate and mark a submission in flight.
    pub fn begin(&mut self) -> Result<Submission, SubmitError> {
        self.form.begin_submit()
    }

    /// Apply the outcome of submission `id`.
    ///
    /// On success the token is written to `store` and the navigator is sent to
    /// the protected route. A failed store write is reported like a transport
    /// failure and does not navigate. Returns the outcome that was applied, or
    /// `None` for a stale completion.
    pub fn complete<S, N>(
        &mut self,
        id: SubmissionId,
        outcome: LoginOutcome,
        store: &S,
        navigator: &mut N,
    ) -> Option<LoginOutcome>
    where
        S: SessionStore + ?Sized,
        N: Navigator + ?Sized,
    {
        // Nothing is persisted for a completion that is no longer current
        if !self.form.is_current(id) {
            debug!(?id, "Ignoring stale login completion");
            return None;
        }

        let outcome = match outcome {
            LoginOutcome::Authenticated { token } => match store.save(&token) {
                Ok(()) => LoginOutcome::Authenticated { token },
                Err(e) => {
                    error!(error = %e, "Failed to save session");
                    LoginOutcome::Failed {
                        message: TRANSPORT_FAILURE_MESSAGE.to_string(),
                    }
                }
            },
            other => other,
        };

        self.form.finish(id, &outcome);

        if outcome.is_authenticated() {
            info!(username = %self.form.username(), "Login successful");
            navigator.navigate(Route::Protected);
        }
        Some(outcome)
    }

    /// Run one whole submission: validate, exchange, persist, navigate.
    pub async fn submit<E, S, N>(
        &mut self,
        endpoint: &E,
        store: &S,
        navigator: &mut N,
    ) -> Result<LoginOutcome, SubmitError>
    where
        E: TokenEndpoint + ?Sized,
        S: SessionStore + ?Sized,
        N: Navigator + ?Sized,
    {
        let submission = self.begin()?;
        let outcome = exchange_credentials(endpoint, &submission.credentials).await;
        // The id was just issued, so the completion cannot be stale
        Ok(self
            .complete(submission.id, outcome.clone(), store, navigator)
            .unwrap_or(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TokenResponse, AUTH_FAILED_MESSAGE};
    use crate::auth::MemorySessionStore;
    use crate::login::VALIDATION_MESSAGE;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    /// What the fake endpoint answers with
    enum Reply {
        Token(&'static str),
        Status(u16, &'static str),
        InvalidBody,
    }

    struct FakeEndpoint {
        reply: Reply,
        requests: Mutex<Vec<Credentials>>,
    }

    impl FakeEndpoint {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<Credentials> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl TokenEndpoint for FakeEndpoint {
        async fn request_token(&self, credentials: &Credentials) -> Result<TokenResponse, AuthError> {
            self.requests.lock().unwrap().push(credentials.clone());
            match self.reply {
                Reply::Token(token) => Ok(TokenResponse {
                    access_token: token.to_string(),
                    token_type: Some("bearer".to_string()),
                }),
                Reply::Status(code, body) => Err(AuthError::from_status(
                    StatusCode::from_u16(code).unwrap(),
                    body,
                )),
                Reply::InvalidBody => Err(AuthError::InvalidResponse("not json".to_string())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        visits: Vec<Route>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&mut self, route: Route) {
            self.visits.push(route);
        }
    }

    fn page(username: &str, password: &str) -> LoginPage {
        let mut page = LoginPage::new(username);
        page.form_mut().set_password(password);
        page
    }

    #[tokio::test]
    async fn test_empty_fields_issue_no_request() {
        for (u, p) in [("", ""), ("alice", ""), ("", "secret")] {
            let endpoint = FakeEndpoint::new(Reply::Token("abc123"));
            let store = MemorySessionStore::new();
            let mut nav = RecordingNavigator::default();
            let mut page = page(u, p);

            let err = page.submit(&endpoint, &store, &mut nav).await.unwrap_err();
            assert_eq!(err, SubmitError::Validation);
            assert_eq!(page.form().error(), Some(VALIDATION_MESSAGE));
            assert!(endpoint.requests().is_empty());
            assert!(nav.visits.is_empty());
        }
    }

    #[tokio::test]
    async fn test_valid_fields_issue_exactly_one_request() {
        let endpoint = FakeEndpoint::new(Reply::Status(401, ""));
        let store = MemorySessionStore::new();
        let mut nav = RecordingNavigator::default();
        let mut page = page("alice", "  secret ");

        page.submit(&endpoint, &store, &mut nav).await.unwrap();
        assert_eq!(endpoint.requests(), vec![Credentials::new("alice", "  secret ")]);
    }

    #[tokio::test]
    async fn test_success_stores_token_and_navigates_once() {
        let endpoint = FakeEndpoint::new(Reply::Token("abc123"));
        let store = MemorySessionStore::new();
        let mut nav = RecordingNavigator::default();
        let mut page = page("alice", "secret");

        let outcome = page.submit(&endpoint, &store, &mut nav).await.unwrap();
        assert!(outcome.is_authenticated());
        assert_eq!(store.load().unwrap().as_deref(), Some("abc123"));
        assert_eq!(nav.visits, vec![Route::Protected]);
        assert!(!page.form().is_loading());
        assert_eq!(page.form().error(), None);
    }

    #[tokio::test]
    async fn test_later_success_overwrites_token() {
        let store = MemorySessionStore::new();
        store.save("old").unwrap();
        let endpoint = FakeEndpoint::new(Reply::Token("new"));
        let mut nav = RecordingNavigator::default();

        page("alice", "secret")
            .submit(&endpoint, &store, &mut nav)
            .await
            .unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_rejection_shows_server_detail() {
        let endpoint =
            FakeEndpoint::new(Reply::Status(401, r#"{"detail": "Invalid credentials"}"#));
        let store = MemorySessionStore::new();
        let mut nav = RecordingNavigator::default();
        let mut page = page("alice", "wrong");

        let outcome = page.submit(&endpoint, &store, &mut nav).await.unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::Rejected {
                message: "Invalid credentials".to_string()
            }
        );
        assert_eq!(page.form().error(), Some("Invalid credentials"));
        assert_eq!(store.write_count(), 0);
        assert!(nav.visits.is_empty());
    }

    #[tokio::test]
    async fn test_rejection_without_body_uses_generic_message() {
        for body in ["", "<html>Bad Gateway</html>"] {
            let endpoint = FakeEndpoint::new(Reply::Status(502, body));
            let store = MemorySessionStore::new();
            let mut nav = RecordingNavigator::default();
            let mut page = page("alice", "secret");

            page.submit(&endpoint, &store, &mut nav).await.unwrap();
            assert_eq!(page.form().error(), Some(AUTH_FAILED_MESSAGE));
            assert!(!page.form().is_loading());
        }
    }

    #[tokio::test]
    async fn test_malformed_success_uses_transport_message() {
        let endpoint = FakeEndpoint::new(Reply::InvalidBody);
        let store = MemorySessionStore::new();
        let mut nav = RecordingNavigator::default();
        let mut page = page("alice", "secret");

        page.submit(&endpoint, &store, &mut nav).await.unwrap();
        assert_eq!(page.form().error(), Some(TRANSPORT_FAILURE_MESSAGE));
        assert!(!page.form().is_loading());
        assert!(nav.visits.is_empty());
    }

    #[test]
    fn test_complete_ignores_stale_submission() {
        let store = MemorySessionStore::new();
        let mut nav = RecordingNavigator::default();
        let mut page = page("alice", "secret");

        let first = page.begin().unwrap();
        let failed = LoginOutcome::Failed {
            message: TRANSPORT_FAILURE_MESSAGE.to_string(),
        };
        page.complete(first.id, failed, &store, &mut nav).unwrap();

        let second = page.begin().unwrap();
        let late = LoginOutcome::Authenticated {
            token: "stale".to_string(),
        };
        assert_eq!(page.complete(first.id, late, &store, &mut nav), None);
        assert_eq!(store.write_count(), 0);
        assert!(nav.visits.is_empty());
        assert!(page.form().is_loading());

        let fresh = LoginOutcome::Authenticated {
            token: "fresh".to_string(),
        };
        page.complete(second.id, fresh, &store, &mut nav).unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("fresh"));
        assert_eq!(nav.visits, vec![Route::Protected]);
    }

    #[test]
    fn test_stale_success_keeps_stored_token() {
        let store = MemorySessionStore::new();
        store.save("current").unwrap();
        let mut nav = RecordingNavigator::default();
        let mut page = page("alice", "secret");

        let first = page.begin().unwrap();
        let failed = LoginOutcome::Failed {
            message: TRANSPORT_FAILURE_MESSAGE.to_string(),
        };
        page.complete(first.id, failed, &store, &mut nav).unwrap();
        let _second = page.begin().unwrap();

        let late = LoginOutcome::Authenticated {
            token: "stale".to_string(),
        };
        assert_eq!(page.complete(first.id, late, &store, &mut nav), None);
        assert_eq!(store.load().unwrap().as_deref(), Some("current"));
        assert_eq!(store.write_count(), 1);
        assert!(nav.visits.is_empty());
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: Result<String, AuthError> = Ok("tok".to_string());
        assert!(LoginOutcome::from(ok).is_authenticated());

        let rejected: Result<String, AuthError> =
            Err(AuthError::from_status(StatusCode::UNAUTHORIZED, ""));
        assert_eq!(
            LoginOutcome::from(rejected).message(),
            Some(AUTH_FAILED_MESSAGE)
        );
    }
}
