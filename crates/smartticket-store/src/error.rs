use smartticket_core::Collection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no document '{id}' in {collection}")]
    NotFound { collection: Collection, id: String },

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("No user is logged in.")]
    NoSession,

    #[error("re-authentication failed")]
    ReauthRequired,

    #[error("no account for this email address")]
    UserNotFound,

    #[error("malformed email address")]
    InvalidEmail,

    #[error("email address already in use")]
    EmailInUse,

    #[error("auth backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid blob path '{0}'")]
    InvalidPath(String),

    #[error("blob backend error: {0}")]
    Backend(String),
}
