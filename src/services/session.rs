/// Session and identity provider
///
/// Owns the signed-in identity, the profile read from the user's document
/// and the saved-list mirror. Other components receive the provider (or a
/// watch receiver for identity changes) explicitly instead of reaching for
/// ambient state.
///
/// Lifecycle:
/// 1. Created signed out
/// 2. `sign_in` / `sign_up` publish the identity and read the profile
/// 3. Every profile or list mutation is followed by a full profile re-read
/// 4. `sign_out` drops the identity and the mirrored data
use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    backend::{AuthBackend, BlobStore, DocumentStore},
    error::{AppError, AppResult},
    models::{Identity, Movie, MovieId, ProfileUpdate, UserDocument, UserProfile},
    services::my_list::MembershipStore,
};

/// Largest accepted profile picture
pub const MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;

const PROFILE_PICTURE_PREFIX: &str = "profilePictures";

/// `local@domain.tld` shape: one `@`, no whitespace, a dot inside the domain
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

struct Session {
    identity: Identity,
    profile: UserProfile,
}

pub struct SessionProvider {
    auth: Arc<dyn AuthBackend>,
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    identity_tx: watch::Sender<Option<Identity>>,
    session: Option<Session>,
    my_list: MembershipStore,
}

impl SessionProvider {
    pub fn new(
        auth: Arc<dyn AuthBackend>,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let (identity_tx, _) = watch::channel(None);
        Self {
            auth,
            my_list: MembershipStore::new(Arc::clone(&documents)),
            documents,
            blobs,
            identity_tx,
            session: None,
        }
    }

    /// Receives the current identity, then every authentication change
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity_tx.subscribe()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref().map(|s| &s.identity)
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.session.as_ref().map(|s| &s.profile)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn my_list(&self) -> &[Movie] {
        self.my_list.movies()
    }

    pub fn in_my_list(&self, id: MovieId) -> bool {
        self.my_list.contains(id)
    }

    fn require_identity(&self) -> AppResult<Identity> {
        self.identity().cloned().ok_or(AppError::NotSignedIn)
    }

    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        confirm_password: &str,
        username: &str,
    ) -> AppResult<()> {
        let email = email.trim();
        let username = username.trim();

        if email.is_empty() || password.is_empty() || confirm_password.is_empty() || username.is_empty()
        {
            return Err(AppError::InvalidInput("Please fill all the fields!".to_string()));
        }
        if !is_valid_email(email) {
            return Err(AppError::InvalidInput("Invalid email format!".to_string()));
        }
        if password != confirm_password {
            return Err(AppError::InvalidInput("Passwords do not match!".to_string()));
        }

        let identity = self.auth.sign_up(email, password).await?;

        self.documents
            .set_user(&identity, &UserDocument::new(&identity.user_id, username))
            .await?;

        tracing::info!(user_id = %identity.user_id, "Account registered");

        self.handle_auth_change(Some(identity)).await
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> AppResult<()> {
        let email = email.trim();

        if email.is_empty() || password.is_empty() {
            return Err(AppError::InvalidInput("Please fill all the fields!".to_string()));
        }
        if !is_valid_email(email) {
            return Err(AppError::InvalidInput("Invalid email format!".to_string()));
        }

        let identity = self.auth.sign_in(email, password).await?;
        self.handle_auth_change(Some(identity)).await
    }

    /// Signing out while signed out is a no-op
    pub async fn sign_out(&mut self) -> AppResult<()> {
        if let Some(identity) = self.identity().cloned() {
            self.auth.sign_out(&identity).await?;
        }
        self.handle_auth_change(None).await
    }

    /// Publishes an authentication change and (re)loads the profile for it.
    ///
    /// When the profile read fails the identity stays published; the error
    /// is returned so the caller can retry with `refresh_profile`.
    pub async fn handle_auth_change(&mut self, identity: Option<Identity>) -> AppResult<()> {
        self.identity_tx.send_replace(identity.clone());

        match identity {
            Some(identity) => {
                tracing::info!(user_id = %identity.user_id, "Signed in");
                self.session = Some(Session {
                    profile: UserProfile {
                        user_id: identity.user_id.clone(),
                        ..Default::default()
                    },
                    identity,
                });
                self.my_list.clear();
                self.refresh_profile().await
            }
            None => {
                if let Some(session) = self.session.take() {
                    tracing::info!(user_id = %session.identity.user_id, "Session cleared");
                }
                self.my_list.clear();
                Ok(())
            }
        }
    }

    /// Full re-read of the user's document
    pub async fn refresh_profile(&mut self) -> AppResult<()> {
        let identity = self.require_identity()?;

        let document = self.documents.get_user(&identity).await.map_err(|e| {
            tracing::warn!(user_id = %identity.user_id, error = %e, "Profile read failed");
            e
        })?;

        let Some(document) = document else {
            tracing::debug!(user_id = %identity.user_id, "No profile document yet");
            return Ok(());
        };

        let profile = UserProfile::from_document(&identity.user_id, &document);
        tracing::debug!(
            user_id = %identity.user_id,
            username = %profile.username,
            saved = document.my_list.len(),
            "Profile loaded"
        );

        self.my_list.seed(document.my_list);
        if let Some(session) = self.session.as_mut() {
            session.profile = profile;
        }
        Ok(())
    }

    /// Re-read after a confirmed mutation; a failed read keeps the confirmed state
    async fn refresh_after_mutation(&mut self) {
        if let Err(e) = self.refresh_profile().await {
            tracing::warn!(error = %e, "Keeping local state after failed profile re-read");
        }
    }

    pub async fn update_username(&mut self, username: &str) -> AppResult<()> {
        let identity = self.require_identity()?;
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::InvalidInput("Username cannot be empty".to_string()));
        }

        let update = ProfileUpdate::Username(username.to_string());
        self.documents.update_profile(&identity, &update).await?;
        if let Some(session) = self.session.as_mut() {
            session.profile.username = username.to_string();
        }

        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Uploads a new profile picture and stores its download URL
    pub async fn update_profile_picture(
        &mut self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> AppResult<String> {
        let identity = self.require_identity()?;

        if bytes.is_empty() {
            return Err(AppError::InvalidInput("Image is empty".to_string()));
        }
        if bytes.len() > MAX_PICTURE_BYTES {
            return Err(AppError::InvalidInput(
                "Image size is too large. Please select an image under 5MB.".to_string(),
            ));
        }

        let key = format!("{}/{}", PROFILE_PICTURE_PREFIX, identity.user_id);
        let size = bytes.len();
        let url = self.blobs.upload(&identity, &key, bytes, content_type).await?;

        let update = ProfileUpdate::ProfilePicture(url.clone());
        self.documents.update_profile(&identity, &update).await?;
        if let Some(session) = self.session.as_mut() {
            session.profile.profile_picture = Some(url.clone());
        }

        tracing::info!(user_id = %identity.user_id, bytes = size, "Profile picture updated");

        self.refresh_after_mutation().await;
        Ok(url)
    }

    pub async fn add_to_my_list(&mut self, movie: Movie) -> AppResult<()> {
        let identity = self.require_identity()?;
        self.my_list.add(&identity, movie).await?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    pub async fn remove_from_my_list(&mut self, movie: &Movie) -> AppResult<()> {
        let identity = self.require_identity()?;
        self.my_list.remove(&identity, movie).await?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Removes a saved movie by id, using the mirrored snapshot as the value to remove
    pub async fn remove_saved(&mut self, id: MovieId) -> AppResult<()> {
        let movie = self
            .my_list
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Movie {} is not in your list", id)))?;
        self.remove_from_my_list(&movie).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockAuthBackend, MockBlobStore, MockDocumentStore};
    use crate::error::AuthFailure;

    fn identity() -> Identity {
        Identity {
            user_id: "uid-1".to_string(),
            email: "neo@example.com".to_string(),
            id_token: "token".to_string(),
        }
    }

    fn movie(id: u64) -> Movie {
        Movie {
            id: MovieId(id),
            title: format!("Movie {}", id),
            poster_path: None,
            overview: String::new(),
            release_date: String::new(),
            vote_average: 6.5,
        }
    }

    fn provider(
        auth: MockAuthBackend,
        documents: MockDocumentStore,
        blobs: MockBlobStore,
    ) -> SessionProvider {
        SessionProvider::new(Arc::new(auth), Arc::new(documents), Arc::new(blobs))
    }

    fn signing_in_auth() -> MockAuthBackend {
        let mut auth = MockAuthBackend::new();
        auth.expect_sign_in().returning(|_, _| Ok(identity()));
        auth
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("neo@example.com"));
        assert!(is_valid_email("a@b.c"));
        assert!(!is_valid_email("neo@example"));
        assert!(!is_valid_email("neo example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("neo@@example.com"));
        assert!(!is_valid_email("neo@.com"));
        assert!(!is_valid_email("neo@example."));
    }

    #[tokio::test]
    async fn test_sign_up_validation_happens_before_backend() {
        let mut session = provider(
            MockAuthBackend::new(),
            MockDocumentStore::new(),
            MockBlobStore::new(),
        );

        let err = session
            .sign_up("neo@example.com", "redpill", "bluepill", "neo")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Passwords do not match!");

        let err = session
            .sign_up("neo@example.com", "redpill", "redpill", "  ")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Please fill all the fields!");

        let err = session
            .sign_up("not-an-email", "redpill", "redpill", "neo")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid email format!");
    }

    #[tokio::test]
    async fn test_sign_up_writes_user_document() {
        let mut auth = MockAuthBackend::new();
        auth.expect_sign_up().times(1).returning(|_, _| Ok(identity()));

        let mut documents = MockDocumentStore::new();
        documents
            .expect_set_user()
            .withf(|id, doc| id.user_id == "uid-1" && doc.username == "neo" && doc.user_id == "uid-1")
            .times(1)
            .returning(|_, _| Ok(()));
        documents
            .expect_get_user()
            .returning(|_| Ok(Some(UserDocument::new("uid-1", "neo"))));

        let mut session = provider(auth, documents, MockBlobStore::new());
        let rx = session.subscribe();
        session
            .sign_up("neo@example.com", "redpill", "redpill", "neo")
            .await
            .unwrap();

        assert!(session.is_authenticated());
        assert_eq!(session.profile().unwrap().username, "neo");
        assert_eq!(rx.borrow().as_ref().map(|i| i.user_id.clone()), Some("uid-1".to_string()));
    }

    #[tokio::test]
    async fn test_sign_in_failure_maps_auth_error() {
        let mut auth = MockAuthBackend::new();
        auth.expect_sign_in()
            .returning(|_, _| Err(AuthFailure::WrongCredentials.into()));

        let mut session = provider(auth, MockDocumentStore::new(), MockBlobStore::new());
        let err = session.sign_in("neo@example.com", "wrong").await.unwrap_err();

        assert_eq!(err.user_message(), "Wrong credentials");
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_in_loads_profile_and_list() {
        let mut documents = MockDocumentStore::new();
        documents.expect_get_user().returning(|_| {
            let mut doc = UserDocument::new("uid-1", "neo");
            doc.profile_picture = "https://cdn/p.jpg".to_string();
            doc.my_list = vec![movie(1), movie(2)];
            Ok(Some(doc))
        });

        let mut session = provider(signing_in_auth(), documents, MockBlobStore::new());
        session.sign_in("neo@example.com", "redpill").await.unwrap();

        let profile = session.profile().unwrap();
        assert_eq!(profile.profile_picture.as_deref(), Some("https://cdn/p.jpg"));
        assert!(session.in_my_list(MovieId(2)));
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let mut auth = signing_in_auth();
        auth.expect_sign_out().times(1).returning(|_| Ok(()));
        let mut documents = MockDocumentStore::new();
        documents.expect_get_user().returning(|_| {
            let mut doc = UserDocument::new("uid-1", "neo");
            doc.my_list = vec![movie(1)];
            Ok(Some(doc))
        });

        let mut session = provider(auth, documents, MockBlobStore::new());
        let rx = session.subscribe();
        session.sign_in("neo@example.com", "redpill").await.unwrap();
        session.sign_out().await.unwrap();

        assert!(!session.is_authenticated());
        assert!(session.my_list().is_empty());
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn test_mutations_require_sign_in() {
        let mut session = provider(
            MockAuthBackend::new(),
            MockDocumentStore::new(),
            MockBlobStore::new(),
        );
        assert!(matches!(
            session.add_to_my_list(movie(1)).await,
            Err(AppError::NotSignedIn)
        ));
        assert!(matches!(
            session.update_username("trinity").await,
            Err(AppError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn test_oversized_picture_rejected_before_upload() {
        let mut documents = MockDocumentStore::new();
        documents
            .expect_get_user()
            .returning(|_| Ok(Some(UserDocument::new("uid-1", "neo"))));

        let mut session = provider(signing_in_auth(), documents, MockBlobStore::new());
        session.sign_in("neo@example.com", "redpill").await.unwrap();

        let err = session
            .update_profile_picture(vec![0u8; MAX_PICTURE_BYTES + 1], "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_picture_uploaded_under_user_key() {
        let mut documents = MockDocumentStore::new();
        documents
            .expect_get_user()
            .returning(|_| Ok(Some(UserDocument::new("uid-1", "neo"))));
        documents
            .expect_update_profile()
            .withf(|_, update| {
                *update == ProfileUpdate::ProfilePicture("https://cdn/uid-1.jpg".to_string())
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut blobs = MockBlobStore::new();
        blobs
            .expect_upload()
            .withf(|_, key, bytes, content_type| {
                key == "profilePictures/uid-1" && bytes.len() == 3 && content_type == "image/png"
            })
            .times(1)
            .returning(|_, _, _, _| Ok("https://cdn/uid-1.jpg".to_string()));

        let mut session = provider(signing_in_auth(), documents, blobs);
        session.sign_in("neo@example.com", "redpill").await.unwrap();

        let url = session
            .update_profile_picture(vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert_eq!(url, "https://cdn/uid-1.jpg");
    }

    #[tokio::test]
    async fn test_failed_reread_keeps_confirmed_list() {
        let mut documents = MockDocumentStore::new();
        let mut reads = 0;
        documents.expect_get_user().returning(move |_| {
            reads += 1;
            if reads == 1 {
                Ok(Some(UserDocument::new("uid-1", "neo")))
            } else {
                Err(AppError::Persistence("unavailable".to_string()))
            }
        });
        documents.expect_add_to_list().returning(|_, _| Ok(()));

        let mut session = provider(signing_in_auth(), documents, MockBlobStore::new());
        session.sign_in("neo@example.com", "redpill").await.unwrap();
        session.add_to_my_list(movie(603)).await.unwrap();

        assert!(session.in_my_list(MovieId(603)));
    }

    #[tokio::test]
    async fn test_switching_accounts_drops_previous_list() {
        let trinity = Identity {
            user_id: "uid-2".to_string(),
            email: "trinity@example.com".to_string(),
            id_token: "token-2".to_string(),
        };

        let mut auth = MockAuthBackend::new();
        auth.expect_sign_in()
            .withf(|email, _| email == "neo@example.com")
            .returning(|_, _| Ok(identity()));
        let second = trinity.clone();
        auth.expect_sign_in()
            .withf(|email, _| email == "trinity@example.com")
            .returning(move |_, _| Ok(second.clone()));

        let mut documents = MockDocumentStore::new();
        documents.expect_get_user().returning(|identity| {
            if identity.user_id == "uid-1" {
                let mut doc = UserDocument::new("uid-1", "neo");
                doc.my_list = vec![movie(603)];
                Ok(Some(doc))
            } else {
                Ok(None)
            }
        });

        let mut session = provider(auth, documents, MockBlobStore::new());
        session.sign_in("neo@example.com", "redpill").await.unwrap();
        assert!(session.in_my_list(MovieId(603)));

        session.sign_in("trinity@example.com", "follow").await.unwrap();
        assert_eq!(session.identity(), Some(&trinity));
        assert!(!session.in_my_list(MovieId(603)));
        assert!(session.my_list().is_empty());
    }

    #[tokio::test]
    async fn test_failed_profile_read_on_account_switch_drops_previous_list() {
        let mut auth = MockAuthBackend::new();
        auth.expect_sign_in().returning(|_, _| Ok(identity()));

        let mut documents = MockDocumentStore::new();
        let mut reads = 0;
        documents.expect_get_user().returning(move |_| {
            reads += 1;
            if reads == 1 {
                let mut doc = UserDocument::new("uid-1", "neo");
                doc.my_list = vec![movie(603)];
                Ok(Some(doc))
            } else {
                Err(AppError::Persistence("unavailable".to_string()))
            }
        });

        let mut session = provider(auth, documents, MockBlobStore::new());
        session.sign_in("neo@example.com", "redpill").await.unwrap();
        assert!(session.sign_in("neo@example.com", "redpill").await.is_err());

        assert!(session.is_authenticated());
        assert!(session.my_list().is_empty());
    }

    #[tokio::test]
    async fn test_remove_saved_unknown_id() {
        let mut documents = MockDocumentStore::new();
        documents
            .expect_get_user()
            .returning(|_| Ok(Some(UserDocument::new("uid-1", "neo"))));

        let mut session = provider(signing_in_auth(), documents, MockBlobStore::new());
        session.sign_in("neo@example.com", "redpill").await.unwrap();

        assert!(matches!(
            session.remove_saved(MovieId(9)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
