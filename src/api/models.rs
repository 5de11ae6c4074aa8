use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::UserRole;

/// Configuration for the hosted backend
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub media_bucket: String,
    pub download_dir: PathBuf,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            media_bucket: "media-files".to_string(),
            download_dir: dirs::download_dir().unwrap_or_else(std::env::temp_dir),
        }
    }
}

impl SupabaseConfig {
    /// Defaults overridden by `SUPABASE_URL`, `SUPABASE_ANON_KEY`,
    /// `SUPABASE_MEDIA_BUCKET` and `DOWNLOAD_DIR` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        if let Some(url) = var("SUPABASE_URL") {
            config.url = url.trim_end_matches('/').to_string();
        }
        if let Some(key) = var("SUPABASE_ANON_KEY") {
            config.anon_key = key;
        }
        if let Some(bucket) = var("SUPABASE_MEDIA_BUCKET") {
            config.media_bucket = bucket;
        }
        if let Some(dir) = var("DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(dir);
        }
        config
    }
}

/// Response from the password grant endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: u64,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

impl AuthUser {
    pub fn roles(&self) -> &[UserRole] {
        &self.app_metadata.roles
    }

    pub fn has_any_role(&self, required: &[UserRole]) -> bool {
        required.iter().any(|role| self.roles().contains(role))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub roles: Vec<UserRole>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecoverRequest<'a> {
    pub email: &'a str,
}

/// Error body returned by the auth endpoints; the field in use varies.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AuthErrorBody {
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_roles_come_from_app_metadata() {
        let session: Session = serde_json::from_str(
            r#"{
                "access_token": "jwt",
                "token_type": "bearer",
                "expires_in": 3600,
                "refresh_token": "refresh",
                "user": {
                    "id": "u1",
                    "email": "pm@example.org",
                    "app_metadata": { "provider": "email", "roles": ["PROJECT_MANAGER"] }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(session.user.roles(), &[UserRole::ProjectManager]);
        assert!(session.user.has_any_role(&[UserRole::Admin, UserRole::ProjectManager]));
        assert!(!session.user.has_any_role(&[UserRole::Admin]));
    }

    #[test]
    fn user_without_metadata_has_no_roles() {
        let user: AuthUser = serde_json::from_str(r#"{"id":"u2"}"#).unwrap();
        assert!(user.roles().is_empty());
        assert_eq!(user.email, None);
    }

    #[test]
    fn config_reads_environment_overrides() {
        temp_env::with_vars(
            [
                ("SUPABASE_URL", Some("https://project.supabase.co/")),
                ("SUPABASE_ANON_KEY", Some("anon")),
                ("SUPABASE_MEDIA_BUCKET", None),
                ("DOWNLOAD_DIR", Some("/tmp/media")),
            ],
            || {
                let config = SupabaseConfig::from_env();
                assert_eq!(config.url, "https://project.supabase.co");
                assert_eq!(config.anon_key, "anon");
                assert_eq!(config.media_bucket, "media-files");
                assert_eq!(config.download_dir, PathBuf::from("/tmp/media"));
            },
        );
    }
}
