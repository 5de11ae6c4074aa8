use iced::{
    widget::{button, column, row, text, text_input, Space},
    Element, Length,
};

use crate::utils::is_valid_email;

pub struct SignInView {
    pub email: String,
    pub password: String,
    pub status_message: String,
    pub is_busy: bool,
}

impl Default for SignInView {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            status_message: "Sign in to download media files".to_string(),
            is_busy: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SignInMessage {
    EmailChanged(String),
    PasswordChanged(String),
    SignInPressed,
    ForgotPasswordPressed,
}

impl SignInView {
    pub fn update(&mut self, message: SignInMessage) {
        match message {
            SignInMessage::EmailChanged(email) => {
                self.email = email;
            }
            SignInMessage::PasswordChanged(password) => {
                self.password = password;
            }
            SignInMessage::SignInPressed | SignInMessage::ForgotPasswordPressed => {
                // Will be handled by the app
            }
        }
    }

    /// Checks done before any request is sent.
    pub fn validate(&self, needs_password: bool) -> Result<(), String> {
        if !is_valid_email(&self.email) {
            return Err("Enter a valid email address".to_string());
        }
        if needs_password && self.password.is_empty() {
            return Err("Enter your password".to_string());
        }
        Ok(())
    }

    pub fn view(&self) -> Element<'_, SignInMessage> {
        let idle = !self.is_busy;

        column![
            text("Sign In").size(32),
            Space::new().height(Length::Fixed(20.0)),
            text("Email:").size(16),
            text_input("you@example.org", &self.email)
                .on_input(SignInMessage::EmailChanged)
                .padding(10),
            text("Password:").size(16),
            text_input("Password", &self.password)
                .on_input(SignInMessage::PasswordChanged)
                .on_submit(SignInMessage::SignInPressed)
                .secure(true)
                .padding(10),
            Space::new().height(Length::Fixed(10.0)),
            text(&self.status_message).size(14),
            Space::new().height(Length::Fixed(20.0)),
            row![
                button("Sign In")
                    .on_press_maybe(idle.then_some(SignInMessage::SignInPressed))
                    .padding([10, 20]),
                button("Forgot password")
                    .on_press_maybe(idle.then_some(SignInMessage::ForgotPasswordPressed))
                    .padding([10, 20]),
            ]
            .spacing(10),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_checks_email_before_password() {
        let mut view = SignInView::default();
        view.update(SignInMessage::EmailChanged("nobody".to_string()));
        assert_eq!(view.validate(true), Err("Enter a valid email address".to_string()));

        view.update(SignInMessage::EmailChanged("pm@example.org".to_string()));
        assert_eq!(view.validate(true), Err("Enter your password".to_string()));
        assert_eq!(view.validate(false), Ok(()));

        view.update(SignInMessage::PasswordChanged("secret".to_string()));
        assert_eq!(view.validate(true), Ok(()));
    }
}
