//! The login page.
//!
//! `LoginForm` owns the transient form state and the in-flight guard;
//! `LoginPage` drives a submission through the token endpoint, persists the
//! token and navigates on success.
//!
//! ```text
//! Idle -> Validating -> Submitting -> { Authenticated, Rejected, Failed } -> Idle
//! ```

pub mod flow;
pub mod form;

pub use flow::{exchange_credentials, LoginOutcome, LoginPage};
pub use form::{
    can_add_password_char, can_add_username_char, LoginForm, Submission, SubmissionId,
    SubmitError, VALIDATION_MESSAGE,
};
