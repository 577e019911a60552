//! Line-mode commands that run without the full-screen UI.

use std::io::{self, Write};

use anyhow::Result;
use tracing::warn;

use authfront_core::api::{AuthClient, Credentials};
use authfront_core::auth::SessionStore;
use authfront_core::login::{LoginOutcome, LoginPage, SubmitError};
use authfront_core::router::{Route, Router};
use authfront_core::Config;

/// Prompt for credentials and run the same login flow as the form.
pub async fn login(
    config: &mut Config,
    client: &AuthClient,
    store: &dyn SessionStore,
) -> Result<()> {
    println!("\n=== authfront login ===\n");

    let username = prompt_username(config.last_username.as_deref())?;
    let password = prompt_password()?;

    let mut page = LoginPage::new(username.clone());
    page.form_mut().set_password(password);
    let mut router = Router::new(Route::Login);

    println!("\nAuthenticating...");

    match page.submit(client, store, &mut router).await {
        Ok(LoginOutcome::Authenticated { .. }) => {
            config.last_username = Some(username);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            println!("Login successful!\n");
            Ok(())
        }
        Ok(outcome) => {
            let message = outcome.message().unwrap_or_default().to_string();
            anyhow::bail!(message)
        }
        Err(SubmitError::Validation) | Err(SubmitError::InFlight) => {
            let message = page.form().error().unwrap_or_default().to_string();
            anyhow::bail!(message)
        }
    }
}

/// Create an account with the service's registration endpoint.
pub async fn register(config: &Config, client: &AuthClient) -> Result<()> {
    println!("\n=== authfront register ===\n");

    let username = prompt_username(config.last_username.as_deref())?;
    let password = prompt_password()?;

    match client.register(&Credentials::new(username.clone(), password)).await {
        Ok(()) => {
            println!("Registered {}.", username);
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Registration failed");
            anyhow::bail!(e.user_message())
        }
    }
}

/// Remove the stored token.
pub fn logout(store: &dyn SessionStore) -> Result<()> {
    store.clear()?;
    println!("Logged out.");
    Ok(())
}

fn prompt_username(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim_end_matches(['\r', '\n']);

    Ok(match last {
        Some(last) if input.is_empty() => last.to_string(),
        _ => input.to_string(),
    })
}

fn prompt_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    Ok(password)
}
