/// Firestore REST adapter for the `users/<uid>` document
///
/// API Flow:
/// - Read: GET /v1/{document}
/// - Overwrite: PATCH /v1/{document}
/// - Field update: PATCH /v1/{document}?updateMask.fieldPaths=..&currentDocument.exists=true
/// - Saved list union/removal: POST /v1/{database}/documents:commit with an
///   `appendMissingElements` / `removeAllFromArray` field transform
use reqwest::{Client as HttpClient, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::{
    backend::{
        firebase::{failure, value},
        DocumentStore,
    },
    error::{AppError, AppResult},
    models::{profile::MY_LIST_FIELD, Identity, Movie, ProfileUpdate, UserDocument},
};

const USERS_COLLECTION: &str = "users";

#[derive(Clone)]
pub struct FirestoreStore {
    http_client: HttpClient,
    firestore_url: String,
    project_id: String,
}

#[derive(Debug, Deserialize)]
struct DocumentResponse {
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirestoreStore {
    pub fn new(http_client: HttpClient, firestore_url: String, project_id: String) -> Self {
        Self {
            http_client,
            firestore_url,
            project_id,
        }
    }

    fn database_name(&self) -> String {
        format!("projects/{}/databases/(default)", self.project_id)
    }

    fn document_name(&self, user_id: &str) -> String {
        format!(
            "{}/documents/{}/{}",
            self.database_name(),
            USERS_COLLECTION,
            user_id
        )
    }

    fn url(&self, name: &str) -> String {
        format!("{}/v1/{}", self.firestore_url.trim_end_matches('/'), name)
    }

    /// Commit body applying one array transform to the saved list
    fn list_transform(&self, user_id: &str, transform: &str, movie: &Movie) -> AppResult<Value> {
        let snapshot = serde_json::to_value(movie)
            .map_err(|e| AppError::Internal(format!("Movie serialization error: {}", e)))?;

        Ok(json!({
            "writes": [{
                "transform": {
                    "document": self.document_name(user_id),
                    "fieldTransforms": [{
                        "fieldPath": MY_LIST_FIELD,
                        transform: { "values": [value::encode(&snapshot)] }
                    }]
                }
            }]
        }))
    }

    /// Sends a write and maps any rejection to a persistence error
    async fn write(&self, request: RequestBuilder, user_id: &str, action: &str) -> AppResult<()> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Persistence(format!("Firestore request failed: {}", e)))?;

        if !response.status().is_success() {
            let (status, message) = failure(response).await;
            tracing::error!(
                user_id = %user_id,
                action = %action,
                status = %status,
                message = %message,
                "Firestore write rejected"
            );
            return Err(AppError::Persistence(format!(
                "Firestore returned status {}: {}",
                status, message
            )));
        }

        tracing::debug!(user_id = %user_id, action = %action, "Firestore write committed");
        Ok(())
    }

    async fn commit_list_transform(
        &self,
        identity: &Identity,
        transform: &str,
        movie: &Movie,
    ) -> AppResult<()> {
        let body = self.list_transform(&identity.user_id, transform, movie)?;
        let url = format!("{}/documents:commit", self.url(&self.database_name()));

        let request = self
            .http_client
            .post(&url)
            .bearer_auth(&identity.id_token)
            .json(&body);

        self.write(request, &identity.user_id, transform).await
    }
}

#[async_trait::async_trait]
impl DocumentStore for FirestoreStore {
    async fn get_user(&self, identity: &Identity) -> AppResult<Option<UserDocument>> {
        let url = self.url(&self.document_name(&identity.user_id));

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&identity.id_token)
            .send()
            .await
            .map_err(|e| AppError::Persistence(format!("Firestore request failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(user_id = %identity.user_id, "No user document");
            return Ok(None);
        }

        if !response.status().is_success() {
            let (status, message) = failure(response).await;
            return Err(AppError::Persistence(format!(
                "Firestore returned status {}: {}",
                status, message
            )));
        }

        let document: DocumentResponse = response.json().await.map_err(|e| {
            AppError::Persistence(format!("Failed to parse Firestore document: {}", e))
        })?;

        let plain = value::decode_fields(&document.fields)?;
        let user = serde_json::from_value::<UserDocument>(plain).map_err(|e| {
            tracing::error!(error = %e, user_id = %identity.user_id, "Malformed user document");
            AppError::Persistence(format!("Malformed user document: {}", e))
        })?;

        tracing::debug!(
            user_id = %identity.user_id,
            saved = user.my_list.len(),
            "User document fetched"
        );

        Ok(Some(user))
    }

    async fn set_user(&self, identity: &Identity, document: &UserDocument) -> AppResult<()> {
        let plain = serde_json::to_value(document)
            .map_err(|e| AppError::Internal(format!("Document serialization error: {}", e)))?;
        let fields = match &plain {
            Value::Object(map) => value::encode_fields(map),
            _ => return Err(AppError::Internal("User document is not an object".to_string())),
        };

        let request = self
            .http_client
            .patch(self.url(&self.document_name(&identity.user_id)))
            .bearer_auth(&identity.id_token)
            .json(&json!({ "fields": fields }));

        self.write(request, &identity.user_id, "set").await
    }

    async fn update_profile(&self, identity: &Identity, update: &ProfileUpdate) -> AppResult<()> {
        let field = update.field();
        let request = self
            .http_client
            .patch(self.url(&self.document_name(&identity.user_id)))
            .query(&[
                ("updateMask.fieldPaths", field),
                ("currentDocument.exists", "true"),
            ])
            .bearer_auth(&identity.id_token)
            .json(&json!({
                "fields": { field: value::encode(&Value::from(update.value())) }
            }));

        self.write(request, &identity.user_id, field).await
    }

    async fn add_to_list(&self, identity: &Identity, movie: &Movie) -> AppResult<()> {
        self.commit_list_transform(identity, "appendMissingElements", movie)
            .await
    }

    async fn remove_from_list(&self, identity: &Identity, movie: &Movie) -> AppResult<()> {
        self.commit_list_transform(identity, "removeAllFromArray", movie)
            .await
    }
}
