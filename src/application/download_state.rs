use crate::domain::{DownloadPhase, DownloadState};

/// Everything that can happen to a coordinator's state.
///
/// Actions that carry a `token` belong to one accepted request and are
/// ignored once a newer request has been accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadAction {
    Started { token: u64, file_id: String },
    /// Validation failed before anything was started.
    Rejected { message: String },
    Progress { token: u64, percent: u8 },
    Succeeded { token: u64 },
    Failed { token: u64, message: String },
    Cancelled { token: u64 },
    /// Delayed reset after a successful download.
    ResetAfterSuccess { token: u64 },
    /// Delayed error clear after a failed download.
    ExpireError { token: u64 },
    ClearError,
}

pub fn reduce(state: &DownloadState, action: DownloadAction) -> DownloadState {
    let current = |token: u64| token == state.generation;

    match action {
        DownloadAction::Started { token, file_id } => DownloadState {
            phase: DownloadPhase::Downloading {
                file_id,
                progress: 0,
            },
            error: None,
            generation: token,
        },
        DownloadAction::Rejected { message } => DownloadState {
            error: Some(message),
            ..state.clone()
        },
        DownloadAction::Progress { token, percent } if current(token) => match &state.phase {
            DownloadPhase::Downloading { file_id, .. } => DownloadState {
                phase: DownloadPhase::Downloading {
                    file_id: file_id.clone(),
                    progress: percent.min(100),
                },
                ..state.clone()
            },
            _ => state.clone(),
        },
        DownloadAction::Succeeded { token } if current(token) => match &state.phase {
            DownloadPhase::Downloading { file_id, .. } => DownloadState {
                phase: DownloadPhase::Completed {
                    file_id: file_id.clone(),
                },
                ..state.clone()
            },
            _ => state.clone(),
        },
        DownloadAction::Failed { token, message } if current(token) => DownloadState {
            phase: DownloadPhase::Idle,
            error: Some(message),
            generation: state.generation,
        },
        DownloadAction::Cancelled { token } if current(token) => DownloadState {
            phase: DownloadPhase::Idle,
            error: None,
            generation: state.generation,
        },
        DownloadAction::ResetAfterSuccess { token } if current(token) => DownloadState {
            generation: state.generation,
            ..DownloadState::default()
        },
        DownloadAction::ExpireError { token } if current(token) => DownloadState {
            error: None,
            ..state.clone()
        },
        DownloadAction::ClearError => DownloadState {
            error: None,
            ..state.clone()
        },
        // Stale token.
        _ => state.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(token: u64) -> DownloadState {
        reduce(
            &DownloadState::default(),
            DownloadAction::Started {
                token,
                file_id: "f1".to_string(),
            },
        )
    }

    #[test]
    fn start_enters_flight_and_clears_error() {
        let state = DownloadState {
            error: Some("old".to_string()),
            ..DownloadState::default()
        };
        let next = reduce(
            &state,
            DownloadAction::Started {
                token: 1,
                file_id: "f1".to_string(),
            },
        );
        assert!(next.is_downloading());
        assert_eq!(next.progress(), 0);
        assert_eq!(next.error(), None);
        assert_eq!(next.downloading_file_id(), Some("f1"));
        assert_eq!(next.generation, 1);
    }

    #[test]
    fn rejection_only_touches_error() {
        let state = started(4);
        let next = reduce(
            &state,
            DownloadAction::Rejected {
                message: "nope".to_string(),
            },
        );
        assert_eq!(next.phase, state.phase);
        assert_eq!(next.generation, 4);
        assert_eq!(next.error(), Some("nope"));
    }

    #[test]
    fn progress_is_clamped_and_trusts_the_transfer_layer() {
        let state = reduce(&started(1), DownloadAction::Progress { token: 1, percent: 60 });
        assert_eq!(state.progress(), 60);
        let state = reduce(&state, DownloadAction::Progress { token: 1, percent: 40 });
        assert_eq!(state.progress(), 40);
        let state = reduce(&state, DownloadAction::Progress { token: 1, percent: 250 });
        assert_eq!(state.progress(), 100);
    }

    #[test]
    fn success_then_reset_returns_to_rest() {
        let state = reduce(&started(2), DownloadAction::Succeeded { token: 2 });
        assert_eq!(state.progress(), 100);
        let state = reduce(&state, DownloadAction::ResetAfterSuccess { token: 2 });
        assert!(state.is_at_rest());
        assert_eq!(state.progress(), 0);
        assert_eq!(state.downloading_file_id(), None);
    }

    #[test]
    fn failure_sets_error_immediately_and_expiry_clears_only_error() {
        let state = reduce(
            &started(3),
            DownloadAction::Failed {
                token: 3,
                message: "boom".to_string(),
            },
        );
        assert!(!state.is_downloading());
        assert_eq!(state.progress(), 0);
        assert_eq!(state.downloading_file_id(), None);
        assert_eq!(state.error(), Some("boom"));

        let cleared = reduce(&state, DownloadAction::ExpireError { token: 3 });
        assert_eq!(cleared.error(), None);
        assert_eq!(cleared.phase, state.phase);
    }

    #[test]
    fn stale_tokens_are_ignored() {
        let first = reduce(&started(1), DownloadAction::Succeeded { token: 1 });
        let second = reduce(
            &first,
            DownloadAction::Started {
                token: 2,
                file_id: "f2".to_string(),
            },
        );

        for action in [
            DownloadAction::ResetAfterSuccess { token: 1 },
            DownloadAction::ExpireError { token: 1 },
            DownloadAction::Progress { token: 1, percent: 90 },
            DownloadAction::Succeeded { token: 1 },
            DownloadAction::Cancelled { token: 1 },
        ] {
            assert_eq!(reduce(&second, action), second);
        }
    }

    #[test]
    fn clear_error_without_error_is_a_no_op() {
        let state = started(5);
        assert_eq!(reduce(&state, DownloadAction::ClearError), state);
        assert_eq!(
            reduce(&DownloadState::default(), DownloadAction::ClearError),
            DownloadState::default()
        );
    }

    #[test]
    fn cancel_returns_to_rest_without_error() {
        let state = reduce(&started(6), DownloadAction::Cancelled { token: 6 });
        assert!(state.is_at_rest());
    }
}
