use thiserror::Error;
use tracing::debug;

use crate::api::Credentials;

use super::LoginOutcome;

/// Shown when either field is left empty
pub const VALIDATION_MESSAGE: &str = "Username and password are required";

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Identifies one submission so a late completion can be told apart from
/// the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionId(u64);

/// A submission that passed validation and is now in flight.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: SubmissionId,
    pub credentials: Credentials,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("{}", VALIDATION_MESSAGE)]
    Validation,

    #[error("A login request is already in flight")]
    InFlight,
}

/// Username, password, error text and the in-flight submission.
#[derive(Debug, Default)]
pub struct LoginForm {
    username: String,
    password: String,
    error: Option<String>,
    in_flight: Option<SubmissionId>,
    next_id: u64,
}

impl LoginForm {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while a submission is in flight
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn set_username(&mut self, value: impl Into<String>) {
        self.username = value.into();
    }

    pub fn set_password(&mut self, value: impl Into<String>) {
        self.password = value.into();
    }

    /// Append a typed character; returns false if it was refused.
    pub fn push_username_char(&mut self, c: char) -> bool {
        let accepted = can_add_username_char(self.username.chars().count(), c);
        if accepted {
            self.username.push(c);
        }
        accepted
    }

    pub fn push_password_char(&mut self, c: char) -> bool {
        let accepted = can_add_password_char(self.password.chars().count(), c);
        if accepted {
            self.password.push(c);
        }
        accepted
    }

    pub fn pop_username_char(&mut self) {
        self.username.pop();
    }

    pub fn pop_password_char(&mut self) {
        self.password.pop();
    }

    /// Plain emptiness check; whitespace-only values pass.
    pub fn validate(&mut self) -> bool {
        if self.username.is_empty() || self.password.is_empty() {
            self.error = Some(VALIDATION_MESSAGE.to_string());
            return false;
        }
        self.error = None;
        true
    }

    /// Start a submission. Rejected while another one is in flight, or when
    /// validation fails.
    pub fn begin_submit(&mut self) -> Result<Submission, SubmitError> {
        if self.in_flight.is_some() {
            return Err(SubmitError::InFlight);
        }
        if !self.validate() {
            return Err(SubmitError::Validation);
        }

        self.next_id += 1;
        let id = SubmissionId(self.next_id);
        self.in_flight = Some(id);

        Ok(Submission {
            id,
            credentials: Credentials::new(self.username.clone(), self.password.clone()),
        })
    }

    /// True if `id` is the submission in flight
    pub fn is_current(&self, id: SubmissionId) -> bool {
        self.in_flight == Some(id)
    }

    /// Apply the outcome of submission `id`. Returns false, changing nothing,
    /// if `id` is not the submission in flight.
    pub fn finish(&mut self, id: SubmissionId, outcome: &LoginOutcome) -> bool {
        if !self.is_current(id) {
            debug!(?id, current = ?self.in_flight, "Ignoring stale login completion");
            return false;
        }
        self.in_flight = None;

        match outcome.message() {
            Some(message) => self.error = Some(message.to_string()),
            None => {
                self.error = None;
                self.password.clear();
            }
        }
        true
    }
}

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(username: &str, password: &str) -> LoginForm {
        let mut form = LoginForm::new(username);
        form.set_password(password);
        form
    }

    #[test]
    fn test_validation_requires_both_fields() {
        for (u, p) in [("", ""), ("alice", ""), ("", "secret")] {
            let mut form = filled(u, p);
            assert_eq!(form.begin_submit().unwrap_err(), SubmitError::Validation);
            assert_eq!(form.error(), Some(VALIDATION_MESSAGE));
            assert!(!form.is_loading());
        }
    }

    #[test]
    fn test_whitespace_counts_as_filled() {
        let mut form = filled(" ", "\u{3000}");
        let submission = form.begin_submit().unwrap();
        assert_eq!(submission.credentials.username, " ");
        assert!(form.is_loading());
    }

    #[test]
    fn test_begin_submit_clears_previous_error() {
        let mut form = filled("alice", "");
        assert!(form.begin_submit().is_err());
        form.set_password("secret");
        form.begin_submit().unwrap();
        assert_eq!(form.error(), None);
    }

    #[test]
    fn test_second_submit_rejected_while_in_flight() {
        let mut form = filled("alice", "secret");
        let first = form.begin_submit().unwrap();
        assert_eq!(form.begin_submit().unwrap_err(), SubmitError::InFlight);

        let outcome = LoginOutcome::Rejected {
            message: "Invalid credentials".to_string(),
        };
        assert!(form.finish(first.id, &outcome));
        assert!(!form.is_loading());
        assert!(form.begin_submit().is_ok());
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let mut form = filled("alice", "secret");
        let first = form.begin_submit().unwrap();
        let failed = LoginOutcome::Failed {
            message: "boom".to_string(),
        };
        assert!(form.finish(first.id, &failed));

        let second = form.begin_submit().unwrap();
        assert!(!form.is_current(first.id));
        assert!(form.is_current(second.id));
        // A duplicate completion for the first submission arrives late
        assert!(!form.finish(first.id, &failed));
        assert!(form.is_loading());
        assert_eq!(form.error(), None);

        let ok = LoginOutcome::Authenticated {
            token: "abc".to_string(),
        };
        assert!(form.finish(second.id, &ok));
        assert!(!form.is_loading());
    }

    #[test]
    fn test_success_clears_password_only() {
        let mut form = filled("alice", "secret");
        let submission = form.begin_submit().unwrap();
        let ok = LoginOutcome::Authenticated {
            token: "abc".to_string(),
        };
        form.finish(submission.id, &ok);
        assert_eq!(form.username(), "alice");
        assert_eq!(form.password(), "");
    }

    #[test]
    fn test_can_add_username_char() {
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(49, 'z'));
        assert!(!can_add_username_char(50, 'a'));
        assert!(!can_add_username_char(0, '\x00'));
        assert!(!can_add_username_char(0, '\n'));
        assert!(!can_add_username_char(0, '\t'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\r'));
    }

    #[test]
    fn test_push_and_pop_chars() {
        let mut form = LoginForm::default();
        for c in "bob".chars() {
            assert!(form.push_username_char(c));
        }
        assert!(!form.push_username_char('\n'));
        form.pop_username_char();
        assert_eq!(form.username(), "bo");

        assert!(form.push_password_char('é'));
        form.pop_password_char();
        form.pop_password_char();
        assert_eq!(form.password(), "");
    }
}
