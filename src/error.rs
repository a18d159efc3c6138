use serde::Serialize;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(AuthFailure),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            AppError::Network(_) => "Could not load movies. Please try again.".to_string(),
            AppError::Auth(failure) => failure.to_string(),
            AppError::Persistence(msg) => msg.clone(),
            AppError::NotSignedIn => "Please sign in first.".to_string(),
            AppError::NotFound(msg) | AppError::InvalidInput(msg) => msg.clone(),
            AppError::Config(_) | AppError::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

impl From<AuthFailure> for AppError {
    fn from(failure: AuthFailure) -> Self {
        AppError::Auth(failure)
    }
}

/// Rejections from the authentication backend, reduced to what a user can act on
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("Invalid email")]
    InvalidEmail,

    #[error("Wrong credentials")]
    WrongCredentials,

    #[error("This email is already in use")]
    EmailInUse,

    #[error("Password should be at least 6 characters")]
    WeakPassword,

    #[error("{0}")]
    Other(String),
}

impl AuthFailure {
    /// Maps a backend error code (e.g. `EMAIL_EXISTS`) to a failure.
    ///
    /// Codes may carry a trailing explanation (`WEAK_PASSWORD : ...`), so only
    /// the leading token is matched.
    pub fn from_code(code: &str) -> Self {
        let token = code.split([' ', ':']).next().unwrap_or_default();
        match token {
            "INVALID_EMAIL" => AuthFailure::InvalidEmail,
            "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" => {
                AuthFailure::WrongCredentials
            }
            "EMAIL_EXISTS" => AuthFailure::EmailInUse,
            "WEAK_PASSWORD" => AuthFailure::WeakPassword,
            _ => AuthFailure::Other(code.to_string()),
        }
    }
}

/// Result of a user-triggered action, as handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Outcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

impl<T> From<AppResult<T>> for Outcome {
    fn from(result: AppResult<T>) -> Self {
        match result {
            Ok(_) => Outcome::ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Action failed");
                Outcome::failed(e.user_message())
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
