use std::path::PathBuf;
use std::time::Duration;

use iced::{Subscription, Task};
use tracing::{info, warn};

use crate::api::{AuthClient, AuthUser, Session, StorageClient, SupabaseConfig};
use crate::application::{DownloadCoordinator, DownloadOutcome};
use crate::domain::{DownloadState, UserRole};
use crate::ui::sign_in::{SignInMessage, SignInView};
use crate::ui::unauthorized::UnauthorizedPage;
use crate::ui::{DownloadMessage, DownloadView};

/// Roles allowed to download media files.
pub const DOWNLOAD_ROLES: &[UserRole] = &[
    UserRole::Admin,
    UserRole::ProjectManager,
    UserRole::Translator,
];

const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    SignIn,
    Downloads,
    Unauthorized,
}

pub struct DownloadApp {
    auth: AuthClient,
    storage: StorageClient,
    coordinator: DownloadCoordinator<StorageClient>,
    session: Option<Session>,
    screen: Screen,
    sign_in: SignInView,
    view: DownloadView,
    download_state: DownloadState,
    // A request_download future is still running
    download_pending: bool,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new(SupabaseConfig::from_env())
    }
}

impl DownloadApp {
    pub fn new(config: SupabaseConfig) -> Self {
        let storage = StorageClient::new(config.clone());

        Self {
            auth: AuthClient::new(config),
            coordinator: DownloadCoordinator::new(storage.clone()),
            storage,
            session: None,
            screen: Screen::SignIn,
            sign_in: SignInView::default(),
            view: DownloadView::default(),
            download_state: DownloadState::default(),
            download_pending: false,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    fn start_session(&mut self, session: Session) {
        self.coordinator.cancel();
        self.coordinator =
            DownloadCoordinator::new(self.storage.clone().with_access_token(&session.access_token));
        self.download_state = self.coordinator.state();
        self.route(&session.user);
        self.session = Some(session);
    }

    fn route(&mut self, user: &AuthUser) {
        self.screen = if user.has_any_role(DOWNLOAD_ROLES) {
            Screen::Downloads
        } else {
            warn!(user_id = %user.id, "user lacks a download role");
            Screen::Unauthorized
        };
    }

    fn refresh_user(&mut self) -> Task<Message> {
        let Some(session) = &self.session else {
            return Task::none();
        };
        let auth = self.auth.clone();
        let access_token = session.access_token.clone();
        Task::perform(
            async move {
                auth.current_user(&access_token)
                    .await
                    .map_err(|e| e.to_string())
            },
            Message::UserRefreshed,
        )
    }

    fn end_session(&mut self) -> Task<Message> {
        self.coordinator.cancel();
        self.screen = Screen::SignIn;
        self.sign_in = SignInView::default();

        match self.session.take() {
            Some(session) => {
                let auth = self.auth.clone();
                Task::perform(
                    async move {
                        auth.sign_out(&session.access_token)
                            .await
                            .map_err(|e| e.to_string())
                    },
                    Message::SignedOut,
                )
            }
            None => Task::none(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    SignIn(SignInMessage),
    SignedIn(Result<Session, String>),
    UserRefreshed(Result<AuthUser, String>),
    PasswordResetRequested(Result<(), String>),
    Download(DownloadMessage),
    DownloadFinished(DownloadOutcome),
    FolderSelected(Option<PathBuf>),
    /// Leave the unauthorized page after re-reading the user's roles
    GoBack,
    SignOut,
    SignedOut(Result<(), String>),
    /// Pull the latest coordinator state into the view
    Refresh,
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::SignIn(msg) => {
            app.sign_in.update(msg.clone());

            match msg {
                SignInMessage::SignInPressed => {
                    if let Err(e) = app.sign_in.validate(true) {
                        app.sign_in.status_message = e;
                        return Task::none();
                    }
                    app.sign_in.is_busy = true;
                    app.sign_in.status_message = "Signing in...".to_string();

                    let auth = app.auth.clone();
                    let email = app.sign_in.email.trim().to_string();
                    let password = app.sign_in.password.clone();
                    return Task::perform(
                        async move {
                            auth.sign_in(&email, &password)
                                .await
                                .map_err(|e| e.to_string())
                        },
                        Message::SignedIn,
                    );
                }
                SignInMessage::ForgotPasswordPressed => {
                    if let Err(e) = app.sign_in.validate(false) {
                        app.sign_in.status_message = e;
                        return Task::none();
                    }
                    app.sign_in.is_busy = true;

                    let auth = app.auth.clone();
                    let email = app.sign_in.email.trim().to_string();
                    return Task::perform(
                        async move { auth.reset_password(&email).await.map_err(|e| e.to_string()) },
                        Message::PasswordResetRequested,
                    );
                }
                _ => {}
            }
        }
        Message::SignedIn(result) => {
            app.sign_in.is_busy = false;
            app.sign_in.password.clear();
            match result {
                Ok(session) => app.start_session(session),
                Err(e) => {
                    app.sign_in.status_message = format!("Sign in failed: {}", e);
                }
            }
        }
        Message::PasswordResetRequested(result) => {
            app.sign_in.is_busy = false;
            app.sign_in.status_message = match result {
                Ok(()) => "Check your email for a password reset link".to_string(),
                Err(e) => format!("Password reset failed: {}", e),
            };
        }
        Message::Download(msg) => {
            app.view.update(msg.clone());

            match msg {
                DownloadMessage::DownloadPressed => {
                    if !app.view.validate() {
                        return Task::none();
                    }
                    let file = app.view.media_file();
                    let coordinator = app.coordinator.clone();
                    app.download_pending = true;

                    return Task::perform(
                        async move { coordinator.request_download(file).await },
                        Message::DownloadFinished,
                    );
                }
                DownloadMessage::CancelPressed => {
                    app.coordinator.cancel();
                }
                DownloadMessage::DismissErrorPressed => {
                    app.coordinator.clear_error();
                    app.download_state = app.coordinator.state();
                }
                DownloadMessage::ChooseFolderPressed => {
                    let current = app.storage.download_dir();
                    return Task::perform(
                        async move {
                            rfd::AsyncFileDialog::new()
                                .set_directory(&current)
                                .pick_folder()
                                .await
                                .map(|handle| handle.path().to_path_buf())
                        },
                        Message::FolderSelected,
                    );
                }
                DownloadMessage::SignOutPressed => {
                    return app.end_session();
                }
                _ => {}
            }
        }
        Message::DownloadFinished(outcome) => {
            // A rejected request says nothing about the one still running.
            if outcome != DownloadOutcome::Busy {
                app.download_pending = false;
            }
            app.download_state = app.coordinator.state();
            app.view.status_message = match outcome {
                DownloadOutcome::Completed(path) => format!("Saved: {}", path.display()),
                DownloadOutcome::Failed(e) => format!("Download failed: {}", e),
                DownloadOutcome::Busy => "Another download is still running".to_string(),
                DownloadOutcome::Cancelled => "Download cancelled".to_string(),
            };
        }
        Message::FolderSelected(Some(dir)) => {
            info!(dir = %dir.display(), "download folder changed");
            app.storage.set_download_dir(dir);
        }
        Message::FolderSelected(None) => {
            // User cancelled dialog
        }
        Message::UserRefreshed(Ok(user)) => {
            // Same access token, so the coordinator and any transfer it runs stay.
            app.route(&user);
            if let Some(session) = app.session.as_mut() {
                session.user = user;
            }
        }
        Message::UserRefreshed(Err(e)) => {
            warn!("could not refresh user: {}", e);
            return app.end_session();
        }
        Message::GoBack => {
            return app.refresh_user();
        }
        Message::SignOut => {
            return app.end_session();
        }
        Message::SignedOut(result) => {
            if let Err(e) = result {
                warn!("sign out request failed: {}", e);
            }
        }
        Message::Refresh => {
            app.download_state = app.coordinator.state();
        }
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    match app.screen {
        Screen::SignIn => app.sign_in.view().map(Message::SignIn),
        Screen::Downloads => app
            .view
            .view(&app.download_state, &app.storage.download_dir())
            .map(Message::Download),
        Screen::Unauthorized => UnauthorizedPage {
            user_email: app
                .session
                .as_ref()
                .and_then(|session| session.user.email.as_deref()),
            required_roles: DOWNLOAD_ROLES,
        }
        .view(Message::GoBack, Message::SignOut),
    }
}

/// Poll the coordinator while something is happening; the delayed resets
/// change state without any message of their own.
pub fn subscription(app: &DownloadApp) -> Subscription<Message> {
    if app.download_pending || !app.download_state.is_at_rest() {
        iced::time::every(REFRESH_INTERVAL).map(|_| Message::Refresh)
    } else {
        Subscription::none()
    }
}
