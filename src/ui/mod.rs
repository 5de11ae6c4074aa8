pub mod checkbox;
pub mod sign_in;
pub mod unauthorized;

use std::path::Path;

use iced::{
    widget::{button, column, progress_bar, row, text, text_input, Space},
    Element, Length,
};

use crate::domain::{DownloadPhase, DownloadState, MediaFile};
use checkbox::{CheckState, Checkbox, CheckboxSize, ERROR_COLOR};

/// Main view state
pub struct DownloadView {
    pub verse_reference: String,
    pub remote_path: String,
    pub filename: String,
    pub use_display_filename: CheckState,
    pub filename_error: Option<String>,
    pub status_message: String,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            verse_reference: String::new(),
            remote_path: String::new(),
            filename: String::new(),
            use_display_filename: CheckState::Checked,
            filename_error: None,
            status_message: "Enter a remote path to download".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadMessage {
    VerseReferenceChanged(String),
    RemotePathChanged(String),
    FilenameChanged(String),
    UseDisplayFilenameToggled(CheckState),
    ChooseFolderPressed,
    DownloadPressed,
    CancelPressed,
    DismissErrorPressed,
    SignOutPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::VerseReferenceChanged(reference) => {
                self.verse_reference = reference;
            }
            DownloadMessage::RemotePathChanged(path) => {
                self.remote_path = path;
            }
            DownloadMessage::FilenameChanged(filename) => {
                self.filename = filename;
                self.filename_error = None;
            }
            DownloadMessage::UseDisplayFilenameToggled(state) => {
                self.use_display_filename = state;
                self.filename_error = None;
            }
            _ => {
                // Will be handled by the app
            }
        }
    }

    /// Descriptor for the file described by the form.
    pub fn media_file(&self) -> MediaFile {
        let remote_path = self.remote_path.trim();
        let filename = self.filename.trim();

        MediaFile {
            id: remote_path.to_string(),
            verse_reference: self.verse_reference.trim().to_string(),
            filename: (self.use_display_filename.is_checked() && !filename.is_empty())
                .then(|| filename.to_string()),
            remote_path: (!remote_path.is_empty()).then(|| remote_path.to_string()),
        }
    }

    /// A checked "Use display filename" box needs a filename to use.
    pub fn validate(&mut self) -> bool {
        self.filename_error = (self.use_display_filename.is_checked()
            && self.filename.trim().is_empty())
        .then(|| "Enter a display filename or uncheck this box".to_string());
        self.filename_error.is_none()
    }

    pub fn status_line(&self, state: &DownloadState) -> String {
        match &state.phase {
            DownloadPhase::Downloading { progress, .. } => format!("Downloading: {}%", progress),
            DownloadPhase::Completed { .. } => "Download complete".to_string(),
            DownloadPhase::Idle => self.status_message.clone(),
        }
    }

    /// Label and action of the main button. Cancel is offered only while the
    /// transfer runs; Download stays disabled until the success reset.
    pub fn primary_action(state: &DownloadState) -> (&'static str, Option<DownloadMessage>) {
        if state.is_transferring() {
            ("Cancel", Some(DownloadMessage::CancelPressed))
        } else if state.is_downloading() {
            ("Download", None)
        } else {
            ("Download", Some(DownloadMessage::DownloadPressed))
        }
    }

    pub fn view<'a>(
        &'a self,
        state: &'a DownloadState,
        download_dir: &Path,
    ) -> Element<'a, DownloadMessage> {
        let busy = state.is_downloading();

        let filename_checkbox = Checkbox::new(self.use_display_filename)
            .label("Use display filename")
            .description("Otherwise the name is taken from the remote path")
            .error(self.filename_error.as_deref())
            .disabled(busy)
            .size(CheckboxSize::Md)
            .view(DownloadMessage::UseDisplayFilenameToggled);

        let mut content = column![
            text("Media File Downloader").size(32),
            Space::new().height(Length::Fixed(20.0)),
            text("Verse reference:").size(16),
            text_input("GEN 1:1", &self.verse_reference)
                .on_input(DownloadMessage::VerseReferenceChanged)
                .padding(10),
            text("Remote path:").size(16),
            text_input("project/book/chapter/file.m4a", &self.remote_path)
                .on_input(DownloadMessage::RemotePathChanged)
                .padding(10),
            text("Display filename:").size(16),
            text_input("Optional", &self.filename)
                .on_input(DownloadMessage::FilenameChanged)
                .padding(10),
            filename_checkbox,
            row![
                text(format!("Save to: {}", download_dir.display())).size(14),
                button("Choose folder…")
                    .on_press_maybe((!busy).then_some(DownloadMessage::ChooseFolderPressed))
                    .padding([4, 10]),
            ]
            .spacing(10),
            Space::new().height(Length::Fixed(10.0)),
            progress_bar(0.0..=100.0, f32::from(state.progress())),
            text(self.status_line(state)).size(14),
        ]
        .padding(20)
        .spacing(10);

        if let Some(error) = state.error() {
            content = content.push(
                row![
                    text(error).size(14).color(ERROR_COLOR),
                    button("Dismiss")
                        .on_press(DownloadMessage::DismissErrorPressed)
                        .padding([4, 10]),
                ]
                .spacing(10),
            );
        }

        let (label, action) = Self::primary_action(state);
        let primary = button(label).on_press_maybe(action).padding([10, 20]);

        content
            .push(Space::new().height(Length::Fixed(20.0)))
            .push(
                row![
                    primary,
                    button("Sign Out")
                        .on_press(DownloadMessage::SignOutPressed)
                        .padding([10, 20]),
                ]
                .spacing(10),
            )
            .into()
    }
}
