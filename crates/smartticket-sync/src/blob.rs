//! Blob storage REST client for profile pictures and driver photos.

use async_trait::async_trait;
use serde::Deserialize;
use smartticket_core::ConsoleConfig;
use smartticket_store::{BlobError, BlobStore};
use tracing::info;
use url::Url;

use crate::http::{SyncError, TokenCell, authorize, check};

impl From<SyncError> for BlobError {
    fn from(e: SyncError) -> Self {
        BlobError::Backend(e.to_string())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectReply {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

/// Content type from a file extension.
pub fn content_type(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// [`BlobStore`] over the storage REST API.
pub struct RestBlobStore {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    token: TokenCell,
}

impl RestBlobStore {
    pub fn new(config: &ConsoleConfig, token: TokenCell) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.storage_url.trim_end_matches('/').to_string(),
            bucket: config.bucket(),
            token,
        }
    }

    fn object_url(&self, name: &str) -> Result<Url, SyncError> {
        let mut url = Url::parse(&format!("{}/b", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(&self.bucket)
            .push("o")
            // One segment: slashes in the object name are escaped.
            .push(name);
        Ok(url)
    }

    /// Upload endpoint for an object name.
    pub fn upload_url(&self, name: &str) -> Result<Url, SyncError> {
        let mut url = Url::parse(&format!("{}/b", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(&self.bucket)
            .push("o");
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", name);
        Ok(url)
    }

    /// Public download URL of an uploaded object.
    pub fn download_url(&self, name: &str, token: Option<&str>) -> Result<Url, SyncError> {
        let mut url = self.object_url(name)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("alt", "media");
            if let Some(t) = token {
                query.append_pair("token", t);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl BlobStore for RestBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, BlobError> {
        if path.is_empty() {
            return Err(BlobError::InvalidPath(path.to_string()));
        }
        let size = bytes.len();
        let url = self.upload_url(path)?;
        let resp = authorize(self.client.post(url), &self.token)
            .header(reqwest::header::CONTENT_TYPE, content_type(path))
            .body(bytes)
            .send()
            .await
            .map_err(SyncError::from)?;
        let reply: ObjectReply = check(resp)
            .await?
            .json()
            .await
            .map_err(SyncError::from)?;
        let token = reply
            .download_tokens
            .as_deref()
            .and_then(|t| t.split(',').next());
        let url = self.download_url(&reply.name, token)?;
        info!(path, size, "uploaded blob");
        Ok(url.to_string())
    }
}
