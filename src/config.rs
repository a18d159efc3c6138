use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Movie catalog (TMDB) API key
    pub tmdb_api_key: String,

    /// Movie catalog API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Base URL for poster images
    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    /// Language requested from the catalog
    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    /// Region used for watch-provider lookups
    #[serde(default = "default_watch_region")]
    pub watch_region: String,

    /// Timeout applied to every outbound HTTP request
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Firebase web API key
    pub firebase_api_key: Option<String>,

    /// Firebase project hosting the `users` collection
    pub firebase_project_id: Option<String>,

    /// Storage bucket for profile pictures
    pub firebase_storage_bucket: Option<String>,

    #[serde(default = "default_firebase_auth_url")]
    pub firebase_auth_url: String,

    #[serde(default = "default_firestore_url")]
    pub firestore_url: String,

    #[serde(default = "default_firebase_storage_url")]
    pub firebase_storage_url: String,
}

/// Settings for the managed backend, only needed by account commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub auth_url: String,
    pub firestore_url: String,
    pub storage_url: String,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_tmdb_language() -> String {
    "en-US".to_string()
}

fn default_watch_region() -> String {
    "TH".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_firebase_auth_url() -> String {
    "https://identitytoolkit.googleapis.com".to_string()
}

fn default_firestore_url() -> String {
    "https://firestore.googleapis.com".to_string()
}

fn default_firebase_storage_url() -> String {
    "https://firebasestorage.googleapis.com".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Backend settings, failing with the name of the first missing variable
    pub fn firebase(&self) -> AppResult<FirebaseConfig> {
        fn required(value: &Option<String>, name: &str) -> AppResult<String> {
            value
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::Config(format!("{} is not set", name)))
        }

        Ok(FirebaseConfig {
            api_key: required(&self.firebase_api_key, "FIREBASE_API_KEY")?,
            project_id: required(&self.firebase_project_id, "FIREBASE_PROJECT_ID")?,
            storage_bucket: required(&self.firebase_storage_bucket, "FIREBASE_STORAGE_BUCKET")?,
            auth_url: self.firebase_auth_url.clone(),
            firestore_url: self.firestore_url.clone(),
            storage_url: self.firebase_storage_url.clone(),
        })
    }
}
