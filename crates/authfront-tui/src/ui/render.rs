use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use authfront_core::protected::VerifyStatus;
use authfront_core::router::Route;

use crate::app::{App, LoginFocus};

use super::styles;

/// Width of the text inside an input field
const FIELD_WIDTH: usize = 24;

/// Width of the login dialog
const LOGIN_WIDTH: u16 = 46;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Page
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    match app.route() {
        Route::Login => render_login(frame, app, chunks[1]),
        Route::Protected => render_protected(frame, app, chunks[1]),
    }
    render_status_bar(frame, app, chunks[2]);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  authfront";
    let location = format!("{}  ", app.route().path());

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + location.len()),
        )),
        Span::styled(location, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.route() {
        Route::Login => "[Tab] next field | [Enter] submit | [Esc] quit",
        Route::Protected => "[r]echeck | [l]ogout | [q]uit",
    };

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => String::new(),
    };
    let right_text = format!(" {} ", shortcuts);
    let padding_len = (area.width as usize)
        .saturating_sub(left_text.len())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::error_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

/// One labelled input line: `Username: [value▌    ]`
fn field_line<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    // Keep the tail visible once the value outgrows the field
    let shown: String = {
        let count = value.chars().count();
        value.chars().skip(count.saturating_sub(FIELD_WIDTH - 1)).collect()
    };
    let cursor = if focused { "▌" } else { "" };
    let padded = format!("{:<width$}", format!("{}{}", shown, cursor), width = FIELD_WIDTH);

    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{:<10}[", label), styles::muted_style()),
        Span::styled(padded, style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let form = app.login.form();
    let height = if form.error().is_some() { 12 } else { 10 };
    let area = centered_rect_fixed(LOGIN_WIDTH, height, area);

    frame.render_widget(Clear, area);

    let password_masked = "*".repeat(form.password().chars().count());
    let mut lines = vec![
        Line::from(""),
        field_line(
            "Username:",
            form.username().to_string(),
            app.login_focus == LoginFocus::Username,
        ),
        Line::from(""),
        field_line(
            "Password:",
            password_masked,
            app.login_focus == LoginFocus::Password,
        ),
        Line::from(""),
    ];

    let loading = form.is_loading();
    let button_focused = app.login_focus == LoginFocus::Button;
    let label = if loading {
        "Logging in..."
    } else if button_focused {
        "▶ Login ◀"
    } else {
        "Login"
    };
    let inner_width = (LOGIN_WIDTH as usize).saturating_sub(6);
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled(
            format!("{:^width$}", label, width = inner_width),
            styles::button_style(button_focused, loading),
        ),
    ]));

    if let Some(error) = form.error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .title(Span::styled(" Login ", styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_protected(frame: &mut Frame, app: &App, area: Rect) {
    let area = centered_rect_fixed(60, 10, area);
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from("")];

    match app.protected {
        Some(ref page) => {
            let status = page.status();
            let status_style = match status {
                VerifyStatus::Checking => styles::muted_style(),
                VerifyStatus::Valid => styles::success_style(),
                VerifyStatus::Rejected(_) | VerifyStatus::Unreachable => styles::error_style(),
            };

            let username = app.login.form().username();
            let greeting = if username.is_empty() {
                "  You are signed in.".to_string()
            } else {
                format!("  You are signed in as {}.", username)
            };
            lines.push(Line::from(Span::styled(greeting, styles::list_item_style())));

            if let Some(at) = app.signed_in_at {
                lines.push(Line::from(Span::styled(
                    format!("  Signed in at {}", at.format("%Y-%m-%d %H:%M:%S")),
                    styles::muted_style(),
                )));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("  Session: ", styles::muted_style()),
                Span::styled(status.label(), status_style),
            ]));
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("  Press ", styles::muted_style()),
                Span::styled("[L]", styles::help_key_style()),
                Span::styled(" to log out, ", styles::muted_style()),
                Span::styled("[R]", styles::help_key_style()),
                Span::styled(" to check again", styles::muted_style()),
            ]));
        }
        None => {
            lines.push(Line::from(Span::styled(
                "  Redirecting to login...",
                styles::muted_style(),
            )));
        }
    }

    let block = Block::default()
        .title(Span::styled(" Protected ", styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use authfront_core::api::AuthClient;
    use authfront_core::auth::{MemorySessionStore, SessionStore};
    use authfront_core::login::VALIDATION_MESSAGE;
    use authfront_core::Config;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn test_app(store: MemorySessionStore, start: Route) -> App {
        let client = AuthClient::new("http://127.0.0.1:9").unwrap();
        App::new(Config::default(), client, Box::new(store), start)
    }

    #[test]
    fn test_login_page_masks_password() {
        let mut app = test_app(MemorySessionStore::new(), Route::Login);
        app.login.form_mut().set_username("alice");
        app.login.form_mut().set_password("hunter2");

        let text = screen(&app);
        assert!(text.contains("Username:"));
        assert!(text.contains("alice"));
        assert!(text.contains("*******"));
        assert!(!text.contains("hunter2"));
        assert!(text.contains("Login"));
    }

    #[test]
    fn test_login_page_shows_validation_error() {
        let mut app = test_app(MemorySessionStore::new(), Route::Login);
        app.login.form_mut().validate();

        let text = screen(&app);
        assert!(text.contains(VALIDATION_MESSAGE));
    }

    #[test]
    fn test_button_label_while_loading() {
        let mut app = test_app(MemorySessionStore::new(), Route::Login);
        app.login.form_mut().set_username("alice");
        app.login.form_mut().set_password("secret");
        app.login.begin().unwrap();

        let text = screen(&app);
        assert!(text.contains("Logging in..."));
    }

    #[test]
    fn test_protected_page_shows_status() {
        let store = MemorySessionStore::new();
        store.save("abc123").unwrap();
        let mut app = test_app(store.clone(), Route::Protected);
        app.protected = authfront_core::ProtectedPage::open(&store, &mut app.router).unwrap();

        let text = screen(&app);
        assert!(text.contains("/protected"));
        assert!(text.contains("Checking token..."));
        assert!(!text.contains("abc123"));
    }
}
