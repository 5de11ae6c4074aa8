use reqwest::Client;
use tracing::info;
use url::Url;

use super::client::{ensure_success, ApiError, Result};
use super::models::{AuthUser, PasswordGrant, RecoverRequest, Session, SupabaseConfig};

/// Talks to the hosted auth endpoints (`/auth/v1`).
#[derive(Clone)]
pub struct AuthClient {
    config: SupabaseConfig,
    http: Client,
}

impl AuthClient {
    pub fn new(config: SupabaseConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = format!("{}/auth/v1/", self.config.url.trim_end_matches('/'));
        Ok(Url::parse(&base)?.join(path)?)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .http
            .post(self.endpoint("token?grant_type=password")?)
            .header("apikey", &self.config.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        let session: Session = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("JSON decode error: {}", e)))?;

        info!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint("logout")?)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        ensure_success(response).await?;
        info!("signed out");
        Ok(())
    }

    /// Ask the backend to email a password reset link.
    pub async fn reset_password(&self, email: &str) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint("recover")?)
            .header("apikey", &self.config.anon_key)
            .json(&RecoverRequest { email })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    pub async fn current_user(&self, access_token: &str) -> Result<AuthUser> {
        let response = self
            .http
            .get(self.endpoint("user")?)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("JSON decode error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use mockito::Matcher;
    use serde_json::json;

    fn client(url: &str) -> AuthClient {
        AuthClient::new(SupabaseConfig {
            url: url.to_string(),
            anon_key: "anon-key".to_string(),
            ..SupabaseConfig::default()
        })
    }

    #[tokio::test]
    async fn sign_in_returns_session_with_roles() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
            .match_header("apikey", "anon-key")
            .match_body(Matcher::Json(json!({
                "email": "translator@example.org",
                "password": "secret"
            })))
            .with_status(200)
            .with_body(
                json!({
                    "access_token": "jwt",
                    "refresh_token": "refresh",
                    "expires_in": 3600,
                    "user": {
                        "id": "u1",
                        "email": "translator@example.org",
                        "app_metadata": { "roles": ["TRANSLATOR"] }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let session = client(&server.url())
            .sign_in("translator@example.org", "secret")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(session.access_token, "jwt");
        assert_eq!(session.user.roles(), &[UserRole::Translator]);
    }

    #[tokio::test]
    async fn bad_credentials_surface_server_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .sign_in("translator@example.org", "wrong")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Request failed (400): Invalid login credentials");
    }

    #[tokio::test]
    async fn sign_out_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/v1/logout")
            .match_header("authorization", "Bearer jwt")
            .with_status(204)
            .create_async()
            .await;

        client(&server.url()).sign_out("jwt").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reset_password_posts_email() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/v1/recover")
            .match_body(Matcher::Json(json!({ "email": "pm@example.org" })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        client(&server.url())
            .reset_password("pm@example.org")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn current_user_reads_profile() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/auth/v1/user")
            .match_header("authorization", "Bearer jwt")
            .with_status(200)
            .with_body(r#"{"id":"u1","email":"viewer@example.org","app_metadata":{"roles":["VIEWER"]}}"#)
            .create_async()
            .await;

        let user = client(&server.url()).current_user("jwt").await.unwrap();
        assert_eq!(user.email.as_deref(), Some("viewer@example.org"));
        assert!(!user.has_any_role(&[UserRole::Admin, UserRole::Translator]));
    }
}
