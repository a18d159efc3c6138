/// Identity Toolkit (Firebase Auth) email/password adapter
///
/// API Flow:
/// 1. Sign up: POST /v1/accounts:signUp?key=.. → id token + local id
/// 2. Sign in: POST /v1/accounts:signInWithPassword?key=.. → id token + local id
///
/// Sign-out has no server call; dropping the id token ends the session.
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    backend::{firebase::failure, AuthBackend},
    error::{AppError, AppResult, AuthFailure},
    models::Identity,
};

#[derive(Clone)]
pub struct FirebaseAuth {
    http_client: HttpClient,
    api_key: String,
    auth_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    id_token: String,
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

impl FirebaseAuth {
    pub fn new(http_client: HttpClient, api_key: String, auth_url: String) -> Self {
        Self {
            http_client,
            api_key,
            auth_url,
        }
    }

    async fn password_call(&self, endpoint: &str, email: &str, password: &str) -> AppResult<Identity> {
        let url = format!("{}/v1/accounts:{}", self.auth_url.trim_end_matches('/'), endpoint);

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Auth request failed: {}", e)))?;

        if !response.status().is_success() {
            let (status, message) = failure(response).await;
            tracing::warn!(
                endpoint = %endpoint,
                status = %status,
                code = %message,
                "Authentication rejected"
            );
            return Err(AuthFailure::from_code(&message).into());
        }

        let body: PasswordResponse = response
            .json()
            .await
            .map_err(|e| AppError::Network(format!("Failed to parse auth response: {}", e)))?;

        tracing::info!(user_id = %body.local_id, endpoint = %endpoint, "Authenticated");

        Ok(Identity {
            user_id: body.local_id,
            email: body.email.unwrap_or_else(|| email.to_string()),
            id_token: body.id_token,
        })
    }
}

#[async_trait::async_trait]
impl AuthBackend for FirebaseAuth {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Identity> {
        self.password_call("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        self.password_call("signInWithPassword", email, password)
            .await
    }

    async fn sign_out(&self, identity: &Identity) -> AppResult<()> {
        tracing::info!(user_id = %identity.user_id, "Signed out");
        Ok(())
    }
}
