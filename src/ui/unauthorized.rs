use iced::{
    widget::{button, column, text, Space},
    Element, Length,
};

use super::checkbox::{ERROR_COLOR, MUTED_COLOR};
use crate::domain::UserRole;

/// Shown to signed-in users whose roles do not allow downloads.
pub struct UnauthorizedPage<'a> {
    pub user_email: Option<&'a str>,
    pub required_roles: &'a [UserRole],
}

impl<'a> UnauthorizedPage<'a> {
    pub fn required_roles_line(&self) -> Option<String> {
        if self.required_roles.is_empty() {
            return None;
        }
        let roles: Vec<&str> = self.required_roles.iter().map(UserRole::as_str).collect();
        Some(format!("Required roles: {}", roles.join(", ")))
    }

    pub fn view<Message: Clone + 'a>(self, go_back: Message, sign_out: Message) -> Element<'a, Message> {
        let mut content = column![
            text("Access Denied").size(32).color(ERROR_COLOR),
            Space::new().height(Length::Fixed(10.0)),
            text("You don't have permission to access this page.").size(16),
        ]
        .spacing(10);

        if let Some(line) = self.required_roles_line() {
            content = content.push(text(line).size(14).color(MUTED_COLOR));
        }
        if let Some(email) = self.user_email {
            content = content.push(text(format!("Signed in as: {}", email)).size(14));
        }

        content
            .push(Space::new().height(Length::Fixed(20.0)))
            .push(
                button("Go Back")
                    .on_press(go_back)
                    .padding([10, 20])
                    .width(Length::Fill),
            )
            .push(
                button("Sign Out")
                    .on_press(sign_out)
                    .padding([10, 20])
                    .width(Length::Fill),
            )
            .padding(20)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_required_roles_in_order() {
        let page = UnauthorizedPage {
            user_email: Some("viewer@example.org"),
            required_roles: &[UserRole::Admin, UserRole::ProjectManager],
        };
        assert_eq!(
            page.required_roles_line().as_deref(),
            Some("Required roles: ADMIN, PROJECT_MANAGER")
        );
    }

    #[test]
    fn no_roles_no_line() {
        let page = UnauthorizedPage {
            user_email: None,
            required_roles: &[],
        };
        assert_eq!(page.required_roles_line(), None);
    }
}
