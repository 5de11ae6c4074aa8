use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("No remote file path available for download")]
    MissingRemotePath,

    #[error("{0}")]
    Transfer(String),
}

impl AppError {
    /// Message shown to the user for a failed transfer. Errors without any
    /// text of their own fall back to a generic one.
    pub fn transfer(source: &impl std::fmt::Display) -> Self {
        let message = source.to_string();
        if message.trim().is_empty() {
            AppError::Transfer("Download failed".to_string())
        } else {
            AppError::Transfer(message)
        }
    }
}
