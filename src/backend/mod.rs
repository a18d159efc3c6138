/// Managed backend abstraction
///
/// Authentication, the per-user document and profile-picture storage all live
/// in an external backend. Each concern is a trait so the session and list
/// services can run against the Firebase REST adapters in production and an
/// in-process backend (or mocks) in tests.
use crate::{
    error::AppResult,
    models::{Identity, Movie, ProfileUpdate, UserDocument},
};

pub mod firebase;
pub mod memory;

pub use firebase::{FirebaseAuth, FirestoreStore, FirebaseStorage};
pub use memory::MemoryBackend;

/// Email/password authentication
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    /// Creates an account and returns its signed-in identity
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Identity>;

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity>;

    async fn sign_out(&self, identity: &Identity) -> AppResult<()>;
}

/// The per-user document (`users/<uid>`)
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read; `None` when the user has no document yet
    async fn get_user(&self, identity: &Identity) -> AppResult<Option<UserDocument>>;

    /// Creates or overwrites the whole document
    async fn set_user(&self, identity: &Identity, document: &UserDocument) -> AppResult<()>;

    /// Updates one profile field; fails if the document does not exist
    async fn update_profile(&self, identity: &Identity, update: &ProfileUpdate) -> AppResult<()>;

    /// Set-union append of a movie snapshot to the saved list
    async fn add_to_list(&self, identity: &Identity, movie: &Movie) -> AppResult<()>;

    /// Removes every saved entry equal to the snapshot
    async fn remove_from_list(&self, identity: &Identity, movie: &Movie) -> AppResult<()>;
}

/// Blob storage for profile pictures
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Uploads `bytes` under `key` and returns a durable download URL
    async fn upload(
        &self,
        identity: &Identity,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> AppResult<String>;
}
