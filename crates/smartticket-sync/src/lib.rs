//! Remote backend: document, identity, and blob storage clients over HTTP.

#[cfg(feature = "http")]
pub mod auth;
#[cfg(feature = "http")]
pub mod blob;
#[cfg(feature = "http")]
pub mod codec;
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use auth::RestAuth;
#[cfg(feature = "http")]
pub use blob::RestBlobStore;
#[cfg(feature = "http")]
pub use http::{RestStore, SyncError, TokenCell};

/// The three REST clients for one project, sharing the operator's token.
#[cfg(feature = "http")]
pub struct RestBackend {
    pub store: RestStore,
    pub auth: RestAuth,
    pub blobs: RestBlobStore,
}

#[cfg(feature = "http")]
impl RestBackend {
    pub fn connect(
        config: &smartticket_core::ConsoleConfig,
    ) -> Result<Self, smartticket_core::ConfigError> {
        config.validate_remote()?;
        let token = TokenCell::default();
        tracing::info!(project = %config.project_id, "using remote backend");
        Ok(Self {
            store: RestStore::new(config, token.clone()),
            auth: RestAuth::new(config, token.clone()),
            blobs: RestBlobStore::new(config, token),
        })
    }
}
