use smartticket_core::{FormError, PaymentError};
use smartticket_store::{AuthError, BlobError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("upload error: {0}")]
    Blob(#[from] BlobError),

    #[error("export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("No authenticated user found.")]
    NotAuthenticated,

    #[error("no {what} with id '{id}'")]
    Missing { what: &'static str, id: String },

    #[error("action '{action}' is missing data attribute '{key}'")]
    MissingData { action: &'static str, key: &'static str },

    #[error("no handler registered for action '{0}'")]
    Unhandled(String),
}
