use std::fmt;

use serde::{Deserialize, Serialize};

/// A remote audio file that can be downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaFile {
    pub id: String,
    /// Human readable reference, e.g. `GEN 1:1`.
    pub verse_reference: String,
    pub filename: Option<String>,
    pub remote_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DownloadPhase {
    #[default]
    Idle,
    Downloading {
        file_id: String,
        progress: u8,
    },
    /// The transfer finished; waiting for the delayed reset.
    Completed {
        file_id: String,
    },
}

/// Observable state of a download coordinator.
///
/// A failed download is `Idle` with `error` set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DownloadState {
    pub phase: DownloadPhase,
    pub error: Option<String>,
    /// Token of the most recently accepted request.
    pub generation: u64,
}

impl DownloadState {
    /// Stays true after a successful transfer until the delayed reset.
    pub fn is_downloading(&self) -> bool {
        matches!(
            self.phase,
            DownloadPhase::Downloading { .. } | DownloadPhase::Completed { .. }
        )
    }

    /// True only while the transfer itself is running.
    pub fn is_transferring(&self) -> bool {
        matches!(self.phase, DownloadPhase::Downloading { .. })
    }

    pub fn progress(&self) -> u8 {
        match self.phase {
            DownloadPhase::Idle => 0,
            DownloadPhase::Downloading { progress, .. } => progress,
            DownloadPhase::Completed { .. } => 100,
        }
    }

    pub fn downloading_file_id(&self) -> Option<&str> {
        match &self.phase {
            DownloadPhase::Idle => None,
            DownloadPhase::Downloading { file_id, .. } | DownloadPhase::Completed { file_id } => {
                Some(file_id.as_str())
            }
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True when nothing is in flight, no reset is pending and no error is shown.
    pub fn is_at_rest(&self) -> bool {
        self.phase == DownloadPhase::Idle && self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    ProjectManager,
    Translator,
    Viewer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::ProjectManager => "PROJECT_MANAGER",
            UserRole::Translator => "TRANSLATOR",
            UserRole::Viewer => "VIEWER",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_rest() {
        let state = DownloadState::default();
        assert!(state.is_at_rest());
        assert!(!state.is_downloading());
        assert_eq!(state.progress(), 0);
        assert_eq!(state.downloading_file_id(), None);
        assert_eq!(state.error(), None);
    }

    #[test]
    fn completed_reports_full_progress() {
        let state = DownloadState {
            phase: DownloadPhase::Completed {
                file_id: "f1".to_string(),
            },
            error: None,
            generation: 3,
        };
        assert!(state.is_downloading());
        assert!(!state.is_transferring());
        assert_eq!(state.progress(), 100);
        assert_eq!(state.downloading_file_id(), Some("f1"));
        assert!(!state.is_at_rest());
    }

    #[test]
    fn roles_use_upper_snake_case_on_the_wire() {
        let roles: Vec<UserRole> =
            serde_json::from_str(r#"["ADMIN","PROJECT_MANAGER","VIEWER"]"#).unwrap();
        assert_eq!(
            roles,
            vec![UserRole::Admin, UserRole::ProjectManager, UserRole::Viewer]
        );
        assert_eq!(UserRole::Translator.to_string(), "TRANSLATOR");
    }
}
