use serde::{Deserialize, Serialize};

use crate::models::Movie;

/// Field names of the per-user document
pub const USERNAME_FIELD: &str = "username";
pub const PROFILE_PICTURE_FIELD: &str = "profilePicture";
pub const MY_LIST_FIELD: &str = "myList";

/// The currently authenticated account
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
    /// Bearer token for backend calls made on the user's behalf
    pub id_token: String,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("id_token", &"<redacted>")
            .finish()
    }
}

/// The per-user document stored in the backend (`users/<uid>`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub profile_picture: String,
    #[serde(default)]
    pub my_list: Vec<Movie>,
}

impl UserDocument {
    /// Document written on sign-up
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            ..Default::default()
        }
    }
}

/// Profile fields shown to the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub user_id: String,
    pub username: String,
    /// Download URL of the profile picture, if one was uploaded
    pub profile_picture: Option<String>,
}

impl UserProfile {
    pub fn from_document(user_id: &str, document: &UserDocument) -> Self {
        let user_id = if document.user_id.is_empty() {
            user_id.to_string()
        } else {
            document.user_id.clone()
        };
        Self {
            user_id,
            username: document.username.clone(),
            profile_picture: Some(document.profile_picture.clone()).filter(|url| !url.is_empty()),
        }
    }
}

/// A single-field profile mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileUpdate {
    Username(String),
    ProfilePicture(String),
}

impl ProfileUpdate {
    pub fn field(&self) -> &'static str {
        match self {
            ProfileUpdate::Username(_) => USERNAME_FIELD,
            ProfileUpdate::ProfilePicture(_) => PROFILE_PICTURE_FIELD,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            ProfileUpdate::Username(value) | ProfileUpdate::ProfilePicture(value) => value,
        }
    }

    pub fn apply(&self, document: &mut UserDocument) {
        match self {
            ProfileUpdate::Username(value) => document.username = value.clone(),
            ProfileUpdate::ProfilePicture(value) => document.profile_picture = value.clone(),
        }
    }
}
