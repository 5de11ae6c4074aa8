pub mod download_coordinator;
pub mod download_state;

pub use download_coordinator::{
    DownloadCoordinator, DownloadOutcome, ProgressCallback, TransferService,
};
