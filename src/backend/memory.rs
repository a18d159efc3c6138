use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    backend::{AuthBackend, BlobStore, DocumentStore},
    error::{AppError, AppResult, AuthFailure},
    models::{Identity, Movie, ProfileUpdate, UserDocument},
    services::session::is_valid_email,
};

const MIN_PASSWORD_LEN: usize = 6;

/// In-process backend with the same observable rules as the managed one.
///
/// Cloning shares the underlying state, so several sessions (or devices) can
/// mutate the same user record; the last write wins.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    /// email → (password, uid)
    accounts: HashMap<String, (String, String)>,
    documents: HashMap<String, UserDocument>,
    blobs: HashMap<String, StoredBlob>,
    reject_writes: bool,
}

/// An uploaded blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent document or blob write fail
    pub async fn reject_writes(&self, reject: bool) {
        self.inner.write().await.reject_writes = reject;
    }

    /// Snapshot of a user's document
    pub async fn document(&self, user_id: &str) -> Option<UserDocument> {
        self.inner.read().await.documents.get(user_id).cloned()
    }

    pub async fn blob(&self, key: &str) -> Option<StoredBlob> {
        self.inner.read().await.blobs.get(key).cloned()
    }

    fn identity(user_id: &str, email: &str) -> Identity {
        Identity {
            user_id: user_id.to_string(),
            email: email.to_string(),
            id_token: Uuid::new_v4().to_string(),
        }
    }

    fn check_writable(state: &MemoryState) -> AppResult<()> {
        if state.reject_writes {
            return Err(AppError::Persistence(
                "Backend rejected the write".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthBackend for MemoryBackend {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Identity> {
        if !is_valid_email(email) {
            return Err(AuthFailure::InvalidEmail.into());
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthFailure::WeakPassword.into());
        }

        let mut state = self.inner.write().await;
        let key = email.to_lowercase();
        if state.accounts.contains_key(&key) {
            return Err(AuthFailure::EmailInUse.into());
        }

        let user_id = Uuid::new_v4().simple().to_string();
        state
            .accounts
            .insert(key, (password.to_string(), user_id.clone()));

        tracing::debug!(user_id = %user_id, "Account created");
        Ok(Self::identity(&user_id, email))
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        if !is_valid_email(email) {
            return Err(AuthFailure::InvalidEmail.into());
        }

        let state = self.inner.read().await;
        match state.accounts.get(&email.to_lowercase()) {
            Some((stored, user_id)) if stored == password => Ok(Self::identity(user_id, email)),
            _ => Err(AuthFailure::WrongCredentials.into()),
        }
    }

    async fn sign_out(&self, _identity: &Identity) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryBackend {
    async fn get_user(&self, identity: &Identity) -> AppResult<Option<UserDocument>> {
        Ok(self.document(&identity.user_id).await)
    }

    async fn set_user(&self, identity: &Identity, document: &UserDocument) -> AppResult<()> {
        let mut state = self.inner.write().await;
        Self::check_writable(&state)?;
        state
            .documents
            .insert(identity.user_id.clone(), document.clone());
        Ok(())
    }

    async fn update_profile(&self, identity: &Identity, update: &ProfileUpdate) -> AppResult<()> {
        let mut state = self.inner.write().await;
        Self::check_writable(&state)?;
        let document = state.documents.get_mut(&identity.user_id).ok_or_else(|| {
            AppError::Persistence(format!("No document to update: users/{}", identity.user_id))
        })?;
        update.apply(document);
        Ok(())
    }

    async fn add_to_list(&self, identity: &Identity, movie: &Movie) -> AppResult<()> {
        let mut state = self.inner.write().await;
        Self::check_writable(&state)?;
        let document = state.documents.get_mut(&identity.user_id).ok_or_else(|| {
            AppError::Persistence(format!("No document to update: users/{}", identity.user_id))
        })?;
        if !document.my_list.contains(movie) {
            document.my_list.push(movie.clone());
        }
        Ok(())
    }

    async fn remove_from_list(&self, identity: &Identity, movie: &Movie) -> AppResult<()> {
        let mut state = self.inner.write().await;
        Self::check_writable(&state)?;
        let document = state.documents.get_mut(&identity.user_id).ok_or_else(|| {
            AppError::Persistence(format!("No document to update: users/{}", identity.user_id))
        })?;
        document.my_list.retain(|saved| saved != movie);
        Ok(())
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBackend {
    async fn upload(
        &self,
        _identity: &Identity,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> AppResult<String> {
        let mut state = self.inner.write().await;
        Self::check_writable(&state)?;
        state.blobs.insert(
            key.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("memory://{}?token={}", key, Uuid::new_v4()))
    }
}
