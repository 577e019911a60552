//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes for whichever route is showing.

use crossterm::event::{KeyCode, KeyEvent};

use authfront_core::router::Route;

use crate::app::{App, AppState, LoginFocus};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    match app.route() {
        Route::Login => handle_login_input(app, key),
        Route::Protected => handle_protected_input(app, key),
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Quitting;
            return true;
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = app.login_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = app.login_focus.prev();
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            LoginFocus::Password => app.login_focus = LoginFocus::Button,
            // Outcome arrives through check_background_tasks
            LoginFocus::Button => app.submit_login(),
        },
        KeyCode::Backspace => {
            let form = app.login.form_mut();
            match app.login_focus {
                LoginFocus::Username => form.pop_username_char(),
                LoginFocus::Password => form.pop_password_char(),
                LoginFocus::Button => {}
            }
        }
        KeyCode::Char(c) => {
            let form = app.login.form_mut();
            match app.login_focus {
                LoginFocus::Username => {
                    form.push_username_char(c);
                }
                LoginFocus::Password => {
                    form.push_password_char(c);
                }
                // Ignore character input on button
                LoginFocus::Button => {}
            }
        }
        _ => {}
    }
    false
}

fn handle_protected_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
            app.state = AppState::Quitting;
            return true;
        }
        KeyCode::Char('l') | KeyCode::Char('L') => app.logout(),
        KeyCode::Char('r') | KeyCode::Char('R') => app.check_token(),
        _ => {}
    }
    false
}
