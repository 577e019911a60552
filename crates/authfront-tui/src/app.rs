//! Application state management for the authfront TUI.
//!
//! This module contains the `App` struct that owns the router, both pages,
//! the injected session store, and the channel background requests report
//! back on.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use authfront_core::api::{AuthClient, TRANSPORT_FAILURE_MESSAGE};
use authfront_core::auth::SessionStore;
use authfront_core::login::{exchange_credentials, LoginOutcome, LoginPage, SubmissionId, SubmitError};
use authfront_core::protected::{ProtectedPage, VerifyStatus};
use authfront_core::router::{Navigator, Route, Router};
use authfront_core::Config;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// At most one login and one token check are ever outstanding.
const CHANNEL_BUFFER_SIZE: usize = 8;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Running,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Username,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Username,
            LoginFocus::Button => LoginFocus::Password,
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from background requests.
enum BackgroundResult {
    /// A login submission finished
    Login(SubmissionId, LoginOutcome),
    /// A token check finished (generation, status)
    TokenCheck(u64, VerifyStatus),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    /// Where `config` is written back; the user config file when unset
    config_path: Option<PathBuf>,
    pub client: AuthClient,
    store: Box<dyn SessionStore + Send>,

    // Routing and pages
    pub router: Router,
    pub login: LoginPage,
    pub login_focus: LoginFocus,
    pub protected: Option<ProtectedPage>,
    pub signed_in_at: Option<DateTime<Local>>,

    pub state: AppState,
    pub status_message: Option<String>,

    results_tx: mpsc::Sender<BackgroundResult>,
    results_rx: mpsc::Receiver<BackgroundResult>,
}

impl App {
    /// Create a new application instance starting at `start`
    pub fn new(
        config: Config,
        client: AuthClient,
        store: Box<dyn SessionStore + Send>,
        start: Route,
    ) -> Self {
        let username = config.initial_username();
        let login_focus = if username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        let (results_tx, results_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Self {
            config,
            config_path: None,
            client,
            store,
            router: Router::new(start),
            login: LoginPage::new(username),
            login_focus,
            protected: None,
            signed_in_at: None,
            state: AppState::Running,
            status_message: None,
            results_tx,
            results_rx,
        }
    }

    /// Write the config to `path` instead of the user config file
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn route(&self) -> Route {
        self.router.current()
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Start a login submission in the background.
    ///
    /// Validation failures show on the form right away; a submit while
    /// another one is in flight is dropped.
    pub fn submit_login(&mut self) {
        let submission = match self.login.begin() {
            Ok(s) => s,
            Err(SubmitError::InFlight) => {
                debug!("Login already in flight, ignoring submit");
                return;
            }
            Err(SubmitError::Validation) => return,
        };

        let client = self.client.clone();
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let outcome = exchange_credentials(&client, &submission.credentials).await;
            if tx
                .send(BackgroundResult::Login(submission.id, outcome))
                .await
                .is_err()
            {
                warn!("App dropped before login finished");
            }
        });
    }

    fn finish_login(&mut self, id: SubmissionId, outcome: LoginOutcome) {
        let username = self.login.form().username().to_string();
        let applied = self
            .login
            .complete(id, outcome, self.store.as_ref(), &mut self.router);

        if matches!(applied, Some(ref o) if o.is_authenticated()) {
            self.signed_in_at = Some(Local::now());
            self.config.last_username = Some(username);
            let saved = match self.config_path {
                Some(ref path) => self.config.save_to(path),
                None => self.config.save(),
            };
            if let Err(e) = saved {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    // =========================================================================
    // Protected page
    // =========================================================================

    /// Ask the server about the stored token in the background.
    pub fn check_token(&mut self) {
        let Some(page) = self.protected.as_mut() else {
            return;
        };
        let check = page.begin_check();
        let client = self.client.clone();
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let status = VerifyStatus::from(client.verify_token(&check.token).await);
            if tx
                .send(BackgroundResult::TokenCheck(check.generation, status))
                .await
                .is_err()
            {
                warn!("App dropped before token check finished");
            }
        });
    }

    pub fn logout(&mut self) {
        let Some(page) = self.protected.take() else {
            return;
        };
        match page.logout(self.store.as_ref(), &mut self.router) {
            Ok(()) => {
                self.signed_in_at = None;
                self.status_message = None;
            }
            Err(e) => {
                error!(error = %e, "Failed to clear session");
                self.status_message = Some(TRANSPORT_FAILURE_MESSAGE.to_string());
                // Still signed in; put the page back
                self.protected = ProtectedPage::open(self.store.as_ref(), &mut self.router)
                    .ok()
                    .flatten();
            }
        }
    }

    // =========================================================================
    // Event loop hooks
    // =========================================================================

    /// Set up whichever page the router just switched to.
    pub fn sync_route(&mut self) -> Result<()> {
        while let Some(route) = self.router.take_change() {
            debug!(%route, "Entering route");
            match route {
                Route::Login => {
                    self.protected = None;
                    self.login_focus = if self.login.form().username().is_empty() {
                        LoginFocus::Username
                    } else {
                        LoginFocus::Password
                    };
                }
                Route::Protected => {
                    match ProtectedPage::open(self.store.as_ref(), &mut self.router) {
                        Ok(page) => self.protected = page,
                        Err(e) => {
                            warn!(error = %e, "Failed to read session, redirecting to login");
                            self.protected = None;
                            self.status_message = Some(TRANSPORT_FAILURE_MESSAGE.to_string());
                            self.router.navigate(Route::Login);
                        }
                    }
                    if self.protected.is_some() {
                        self.check_token();
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply results from finished background requests
    pub fn check_background_tasks(&mut self) -> Result<()> {
        while let Ok(result) = self.results_rx.try_recv() {
            match result {
                BackgroundResult::Login(id, outcome) => self.finish_login(id, outcome),
                BackgroundResult::TokenCheck(generation, status) => {
                    if let Some(page) = self.protected.as_mut() {
                        page.finish_check(generation, status);
                    }
                }
            }
        }
        self.sync_route()
    }
}
