use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{AbortHandle, Abortable};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::download_state::{reduce, DownloadAction};
use crate::{
    domain::{AppError, DownloadState, MediaFile},
    utils::derive_filename,
};

/// Receives integer percentages (0..=100) while a transfer runs.
pub type ProgressCallback = Box<dyn Fn(u8) + Send + Sync>;

/// Moves one remote file onto the local disk.
pub trait TransferService: Send + Sync + 'static {
    type Error: std::error::Error + Send + 'static;

    /// Download `remote_path` and save it as `filename`, returning where it
    /// was written.
    fn download_audio_file(
        &self,
        remote_path: &str,
        filename: &str,
        on_progress: ProgressCallback,
    ) -> impl Future<Output = Result<PathBuf, Self::Error>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadTimings {
    /// How long a finished download stays visible before the state resets.
    pub success_reset: Duration,
    /// How long a transfer error stays visible.
    pub error_clear: Duration,
}

impl Default for DownloadTimings {
    fn default() -> Self {
        Self {
            success_reset: Duration::from_millis(1500),
            error_clear: Duration::from_millis(8000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed(PathBuf),
    Failed(AppError),
    /// Another download was already in flight; nothing changed.
    Busy,
    Cancelled,
}

#[derive(Clone)]
struct StateStore(Arc<watch::Sender<DownloadState>>);

impl StateStore {
    fn dispatch(&self, action: DownloadAction) {
        self.0.send_if_modified(|state| {
            let next = reduce(state, action);
            if next == *state {
                return false;
            }
            *state = next;
            true
        });
    }
}

struct Inner<T> {
    transfer: T,
    timings: DownloadTimings,
    store: StateStore,
    last_token: AtomicU64,
    in_flight: Mutex<Option<AbortHandle>>,
}

/// Runs one download at a time and exposes its progress as [`DownloadState`].
pub struct DownloadCoordinator<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for DownloadCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: TransferService> DownloadCoordinator<T> {
    pub fn new(transfer: T) -> Self {
        Self::with_timings(transfer, DownloadTimings::default())
    }

    pub fn with_timings(transfer: T, timings: DownloadTimings) -> Self {
        let (sender, _) = watch::channel(DownloadState::default());
        Self {
            inner: Arc::new(Inner {
                transfer,
                timings,
                store: StateStore(Arc::new(sender)),
                last_token: AtomicU64::new(0),
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> DownloadState {
        self.inner.store.0.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DownloadState> {
        self.inner.store.0.subscribe()
    }

    pub fn transfer(&self) -> &T {
        &self.inner.transfer
    }

    pub async fn request_download(&self, file: MediaFile) -> DownloadOutcome {
        let (abort_handle, abort_registration) = AbortHandle::new_pair();

        let (token, remote_path) = {
            let mut in_flight = self.lock_in_flight();
            if in_flight.is_some() {
                warn!(file_id = %file.id, "download already in progress, request rejected");
                return DownloadOutcome::Busy;
            }

            let remote_path = match file.remote_path.as_deref() {
                Some(path) if !path.is_empty() => path.to_string(),
                _ => {
                    let error = AppError::MissingRemotePath;
                    warn!(file_id = %file.id, "{}", error);
                    self.inner.store.dispatch(DownloadAction::Rejected {
                        message: error.to_string(),
                    });
                    return DownloadOutcome::Failed(error);
                }
            };

            *in_flight = Some(abort_handle);
            let token = self.inner.last_token.fetch_add(1, Ordering::SeqCst) + 1;
            self.inner.store.dispatch(DownloadAction::Started {
                token,
                file_id: file.id.clone(),
            });
            (token, remote_path)
        };

        let mut flight = FlightGuard {
            coordinator: &self.inner,
            token,
            finished: false,
        };

        let filename = derive_filename(&file, &remote_path);
        info!(file_id = %file.id, %remote_path, %filename, token, "download started");

        let on_progress: ProgressCallback = {
            let store = self.inner.store.clone();
            Box::new(move |percent| store.dispatch(DownloadAction::Progress { token, percent }))
        };

        let result = Abortable::new(
            self.inner
                .transfer
                .download_audio_file(&remote_path, &filename, on_progress),
            abort_registration,
        )
        .await;
        flight.finished = true;
        drop(flight);

        match result {
            Ok(Ok(path)) => {
                info!(file_id = %file.id, path = %path.display(), "download completed");
                self.inner.store.dispatch(DownloadAction::Succeeded { token });
                self.schedule(
                    self.inner.timings.success_reset,
                    DownloadAction::ResetAfterSuccess { token },
                );
                DownloadOutcome::Completed(path)
            }
            Ok(Err(e)) => {
                let error = AppError::transfer(&e);
                warn!(file_id = %file.id, "download failed: {}", error);
                self.inner.store.dispatch(DownloadAction::Failed {
                    token,
                    message: error.to_string(),
                });
                self.schedule(
                    self.inner.timings.error_clear,
                    DownloadAction::ExpireError { token },
                );
                DownloadOutcome::Failed(error)
            }
            Err(_aborted) => {
                info!(file_id = %file.id, "download cancelled");
                self.inner.store.dispatch(DownloadAction::Cancelled { token });
                DownloadOutcome::Cancelled
            }
        }
    }

    /// Abort the in-flight transfer. Returns `false` when nothing was running.
    pub fn cancel(&self) -> bool {
        match self.lock_in_flight().as_ref() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn clear_error(&self) {
        self.inner.store.dispatch(DownloadAction::ClearError);
    }

    fn schedule(&self, delay: Duration, action: DownloadAction) {
        let store = self.inner.store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(?action, "timer fired");
            store.dispatch(action);
        });
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Frees the in-flight slot once the transfer future is done, including when
/// the caller drops `request_download` before it resolves.
struct FlightGuard<'a, T> {
    coordinator: &'a Inner<T>,
    token: u64,
    finished: bool,
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        self.coordinator
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if !self.finished {
            debug!(token = self.token, "download future dropped before completion");
            self.coordinator
                .store
                .dispatch(DownloadAction::Cancelled { token: self.token });
        }
    }
}
