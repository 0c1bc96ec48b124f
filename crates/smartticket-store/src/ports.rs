//! Collaborator contracts: documents, identity, and file uploads.
//!
//! Every call is async and awaited in sequence by the console. Backends do no
//! retries and no locking beyond their own internal state.

use async_trait::async_trait;
use serde_json::{Map, Value};
use smartticket_core::Collection;

use crate::error::{AuthError, BlobError, StoreError};

/// Field map of one stored document.
pub type Fields = Map<String, Value>;

/// A document as the store returns it: an opaque id and its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every document in `collection`, in the backend's listing order.
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// Insert under a fresh id and return it.
    async fn create(&self, collection: Collection, fields: Fields) -> Result<String, StoreError>;

    /// Write a whole document under a caller-chosen id, replacing any existing one.
    async fn set(&self, collection: Collection, id: &str, fields: Fields)
    -> Result<(), StoreError>;

    /// Merge `fields` into an existing document. Fails with `NotFound` if absent.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;
}

/// A signed-in operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub id_token: String,
}

#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn current_session(&self) -> Option<Session>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Register a new account. The current session, if any, is left in place.
    async fn create_account(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Re-authenticate the current user with `old`, then set `new`.
    async fn change_password(&self, old: &str, new: &str) -> Result<(), AuthError>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `path` and return a URL that retrieves them.
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, BlobError>;
}
