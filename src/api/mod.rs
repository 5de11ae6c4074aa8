pub mod auth;
pub mod client;
pub mod models;

pub use auth::AuthClient;
pub use client::StorageClient;
pub use models::{AuthUser, Session, SupabaseConfig};
