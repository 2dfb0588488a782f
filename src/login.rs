use ratatui::crossterm::event::{KeyCode, KeyEvent};
use tracing::trace;

use crate::catalog::Credentials;
use crate::inputter::{InputResult, Inputter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

/// What the form wants done after a key press.
#[derive(Debug, PartialEq)]
pub enum FormAction {
    None,
    Submit(Credentials),
}

pub struct LoginForm {
    username: Inputter,
    password: Inputter,
    focus: LoginField,
    username_error: Option<&'static str>,
    password_error: Option<&'static str>,
    failure: Option<String>,
    pending: bool,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            username: Inputter::default(),
            password: Inputter::masked(),
            focus: LoginField::Username,
            username_error: None,
            password_error: None,
            failure: None,
            pending: false,
        }
    }
}

impl LoginForm {
    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_prev(),
            KeyCode::Esc => self.reset(),
            KeyCode::Enter => match self.focus {
                LoginField::Username => self.focus_next(),
                LoginField::Password => return self.submit(),
            },
            _ => {
                let field = match self.focus {
                    LoginField::Username => &mut self.username,
                    LoginField::Password => &mut self.password,
                };
                if field.read(key) == InputResult::Edited {
                    // Editing a field clears its validation message.
                    match self.focus {
                        LoginField::Username => self.username_error = None,
                        LoginField::Password => self.password_error = None,
                    }
                }
            }
        }
        FormAction::None
    }

    /// Validate the form and hand out the credentials to exchange.
    pub fn submit(&mut self) -> FormAction {
        if self.pending {
            trace!("Login already in flight, ignoring submit");
            return FormAction::None;
        }
        self.username_error = self.username.is_blank().then_some("Username is required");
        self.password_error = self.password.is_blank().then_some("Password is required");
        if self.username_error.is_some() || self.password_error.is_some() {
            return FormAction::None;
        }

        self.failure = None;
        self.pending = true;
        FormAction::Submit(Credentials {
            username: self.username.value().trim().to_string(),
            password: self.password.value().to_string(),
        })
    }

    pub fn login_failed(&mut self, reason: impl Into<String>) {
        self.pending = false;
        self.failure = Some(reason.into());
    }

    pub fn login_succeeded(&mut self) {
        *self = Self::default();
    }

    pub fn reset(&mut self) {
        let pending = self.pending;
        *self = Self::default();
        self.pending = pending;
    }

    pub fn focus(&self) -> LoginField {
        self.focus
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn username(&self) -> &Inputter {
        &self.username
    }

    pub fn password(&self) -> &Inputter {
        &self.password
    }

    pub fn username_error(&self) -> Option<&'static str> {
        self.username_error
    }

    pub fn password_error(&self) -> Option<&'static str> {
        self.password_error
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    fn focus_next(&mut self) {
        self.focus = match self.focus {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }

    fn focus_prev(&mut self) {
        // Two fields, previous is next.
        self.focus_next();
    }
}
