/// Firebase REST adapters
///
/// Talks to the managed backend over its public REST surface:
/// - Identity Toolkit for email/password accounts
/// - Firestore for the `users/<uid>` document
/// - Cloud Storage for profile pictures
///
/// Every adapter shares one `reqwest::Client` and authenticates per call with
/// the signed-in user's id token.
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::Deserialize;

use crate::config::FirebaseConfig;

pub mod auth;
pub mod firestore;
pub mod storage;
pub mod value;

pub use auth::FirebaseAuth;
pub use firestore::FirestoreStore;
pub use storage::FirebaseStorage;

/// The three adapters wired from one configuration
#[derive(Clone)]
pub struct FirebaseBackend {
    pub auth: FirebaseAuth,
    pub documents: FirestoreStore,
    pub storage: FirebaseStorage,
}

impl FirebaseBackend {
    pub fn new(http_client: HttpClient, config: &FirebaseConfig) -> Self {
        Self {
            auth: FirebaseAuth::new(
                http_client.clone(),
                config.api_key.clone(),
                config.auth_url.clone(),
            ),
            documents: FirestoreStore::new(
                http_client.clone(),
                config.firestore_url.clone(),
                config.project_id.clone(),
            ),
            storage: FirebaseStorage::new(
                http_client,
                config.storage_url.clone(),
                config.storage_bucket.clone(),
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Reads a failed response into its status and the backend's error message
async fn failure(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);
    (status, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_parses_backend_message() {
        let body = r#"{"error":{"code":400,"message":"EMAIL_EXISTS","errors":[]}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error.message, "EMAIL_EXISTS");
    }
}
