/// Cloud Storage for Firebase upload adapter
///
/// Uploads with `POST /v0/b/{bucket}/o?name={key}&uploadType=media` and turns
/// the returned download token into a durable public URL.
use reqwest::{header::CONTENT_TYPE, Client as HttpClient, Url};
use serde::Deserialize;

use crate::{
    backend::{firebase::failure, BlobStore},
    error::{AppError, AppResult},
    models::Identity,
};

#[derive(Clone)]
pub struct FirebaseStorage {
    http_client: HttpClient,
    storage_url: String,
    bucket: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

impl FirebaseStorage {
    pub fn new(http_client: HttpClient, storage_url: String, bucket: String) -> Self {
        Self {
            http_client,
            storage_url,
            bucket,
        }
    }

    /// `<storage>/v0/b/<bucket>/o` with the object name as one encoded segment
    fn object_url(&self, name: Option<&str>) -> AppResult<Url> {
        let mut url = Url::parse(&self.storage_url)
            .map_err(|e| AppError::Config(format!("Invalid storage URL: {}", e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AppError::Config("Storage URL cannot be a base".to_string()))?;
            segments.pop_if_empty().extend(["v0", "b", self.bucket.as_str(), "o"]);
            if let Some(name) = name {
                segments.push(name);
            }
        }
        Ok(url)
    }

    fn download_url(&self, name: &str, token: &str) -> AppResult<String> {
        let mut url = self.object_url(Some(name))?;
        url.query_pairs_mut()
            .append_pair("alt", "media")
            .append_pair("token", token);
        Ok(url.to_string())
    }
}

#[async_trait::async_trait]
impl BlobStore for FirebaseStorage {
    async fn upload(
        &self,
        identity: &Identity,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> AppResult<String> {
        let size = bytes.len();
        let url = self.object_url(None)?;

        let response = self
            .http_client
            .post(url)
            .query(&[("name", key), ("uploadType", "media")])
            .header("Authorization", format!("Firebase {}", identity.id_token))
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Persistence(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let (status, message) = failure(response).await;
            tracing::error!(key = %key, status = %status, message = %message, "Upload rejected");
            return Err(AppError::Persistence(format!(
                "Storage returned status {}: {}",
                status, message
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to parse upload response: {}", e)))?;

        let token = uploaded
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Persistence("Upload returned no download token".to_string()))?;

        tracing::info!(key = %uploaded.name, bytes = size, "Blob uploaded");

        self.download_url(&uploaded.name, token)
    }
}
