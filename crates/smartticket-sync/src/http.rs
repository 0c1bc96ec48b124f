//! HTTP document client for the hosted document database.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use smartticket_core::{Collection, ConsoleConfig};
use smartticket_store::{Document, Fields, RecordStore, StoreError};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::codec::{decode_fields, document_id, encode_fields, field_path};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<SyncError> for StoreError {
    fn from(e: SyncError) -> Self {
        StoreError::Other(e.to_string())
    }
}

/// Bearer token of the signed-in operator, shared by every REST client
/// built from the same [`RestBackend`](crate::RestBackend).
#[derive(Debug, Clone, Default)]
pub struct TokenCell(Arc<RwLock<Option<String>>>);

impl TokenCell {
    pub fn set(&self, token: Option<String>) {
        let mut slot = self.0.write().unwrap_or_else(|p| p.into_inner());
        *slot = token;
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

/// Attach the bearer token, if any.
pub(crate) fn authorize(req: reqwest::RequestBuilder, token: &TokenCell) -> reqwest::RequestBuilder {
    match token.get() {
        Some(t) => req.bearer_auth(t),
        None => req,
    }
}

/// Turn a non-2xx reply into [`SyncError::Server`].
pub(crate) async fn check(resp: reqwest::Response) -> Result<reqwest::Response, SyncError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(SyncError::Server {
        status: status.as_u16(),
        body,
    })
}

const PAGE_SIZE: u32 = 300;

#[derive(Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Value,
}

impl RawDocument {
    fn into_document(self) -> Document {
        Document::new(document_id(&self.name), decode_fields(&self.fields))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// [`RecordStore`] over the document REST API.
pub struct RestStore {
    client: reqwest::Client,
    root: String,
    api_key: String,
    token: TokenCell,
}

impl RestStore {
    pub fn new(config: &ConsoleConfig, token: TokenCell) -> Self {
        Self {
            client: reqwest::Client::new(),
            root: config.documents_root(),
            api_key: config.api_key.clone(),
            token,
        }
    }

    /// URL of a collection, or of one document when `id` is given.
    pub fn document_url(&self, collection: Collection, id: Option<&str>) -> Result<Url, SyncError> {
        let mut url = Url::parse(&self.root)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            segments.push(collection.as_str());
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// URL for a merge update that touches only `fields` and requires the document to exist.
    pub fn update_url(
        &self,
        collection: Collection,
        id: &str,
        fields: &Fields,
    ) -> Result<Url, SyncError> {
        let mut url = self.document_url(collection, Some(id))?;
        {
            let mut query = url.query_pairs_mut();
            for name in fields.keys() {
                query.append_pair("updateMask.fieldPaths", &field_path(name));
            }
            query.append_pair("currentDocument.exists", "true");
        }
        Ok(url)
    }

    async fn list_page(
        &self,
        collection: Collection,
        page_token: Option<&str>,
    ) -> Result<ListResponse, SyncError> {
        let mut url = self.document_url(collection, None)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pageSize", &PAGE_SIZE.to_string());
            if let Some(t) = page_token {
                query.append_pair("pageToken", t);
            }
        }
        let resp = authorize(self.client.get(url), &self.token).send().await?;
        let page: ListResponse = check(resp).await?.json().await?;
        Ok(page)
    }
}

fn is_not_found(e: &SyncError) -> bool {
    matches!(e, SyncError::Server { status: 404, .. })
}

#[async_trait]
impl RecordStore for RestStore {
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let mut docs = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.list_page(collection, page_token.as_deref()).await?;
            docs.extend(page.documents.into_iter().map(RawDocument::into_document));
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(t) => page_token = Some(t),
                None => break,
            }
        }
        info!(collection = %collection, count = docs.len(), "listed documents");
        Ok(docs)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.document_url(collection, Some(id)).map_err(SyncError::from)?;
        let resp = authorize(self.client.get(url), &self.token)
            .send()
            .await
            .map_err(SyncError::from)?;
        match check(resp).await {
            Ok(resp) => {
                let raw: RawDocument = resp.json().await.map_err(SyncError::from)?;
                Ok(Some(raw.into_document()))
            }
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, collection: Collection, fields: Fields) -> Result<String, StoreError> {
        let url = self.document_url(collection, None).map_err(SyncError::from)?;
        let body = json!({ "fields": encode_fields(&fields) });
        let resp = authorize(self.client.post(url), &self.token)
            .json(&body)
            .send()
            .await
            .map_err(SyncError::from)?;
        let raw: RawDocument = check(resp)
            .await?
            .json()
            .await
            .map_err(SyncError::from)?;
        let id = document_id(&raw.name).to_string();
        info!(collection = %collection, id = %id, "created document");
        Ok(id)
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        // A PATCH without a mask replaces the whole document, creating it if needed.
        let url = self.document_url(collection, Some(id)).map_err(SyncError::from)?;
        let body = json!({ "fields": encode_fields(&fields) });
        let resp = authorize(self.client.patch(url), &self.token)
            .json(&body)
            .send()
            .await
            .map_err(SyncError::from)?;
        check(resp).await?;
        info!(collection = %collection, id, "set document");
        Ok(())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let url = self.update_url(collection, id, &fields)?;
        let body = json!({ "fields": encode_fields(&fields) });
        let resp = authorize(self.client.patch(url), &self.token)
            .json(&body)
            .send()
            .await
            .map_err(SyncError::from)?;
        match check(resp).await {
            Ok(_) => {
                info!(collection = %collection, id, fields = fields.len(), "updated document");
                Ok(())
            }
            Err(e) if is_not_found(&e) => Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let url = self.document_url(collection, Some(id)).map_err(SyncError::from)?;
        let resp = authorize(self.client.delete(url), &self.token)
            .send()
            .await
            .map_err(SyncError::from)?;
        check(resp).await?;
        debug!(collection = %collection, id, "deleted document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RestStore {
        let config = ConsoleConfig {
            project_id: "smart-ticket".into(),
            api_key: "k123".into(),
            ..Default::default()
        };
        RestStore::new(&config, TokenCell::default())
    }

    #[test]
    fn collection_and_document_urls() {
        let s = store();
        assert_eq!(
            s.document_url(Collection::HistoryLogs, None).unwrap().as_str(),
            "https://firestore.googleapis.com/v1/projects/smart-ticket/databases/(default)/documents/historyLogs?key=k123"
        );
        let doc = s
            .document_url(Collection::Apprehensions, Some("a b"))
            .unwrap();
        assert!(doc.path().ends_with("/documents/apprehensions/a%20b"));
    }

    #[test]
    fn update_url_carries_mask_and_precondition() {
        let mut fields = Fields::new();
        fields.insert("status".into(), json!("paid"));
        fields.insert("orNumber".into(), json!("OR-1"));
        let url = store()
            .update_url(Collection::Apprehensions, "a1", &fields)
            .unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("updateMask.fieldPaths".into(), "status".into())));
        assert!(pairs.contains(&("updateMask.fieldPaths".into(), "orNumber".into())));
        assert!(pairs.contains(&("currentDocument.exists".into(), "true".into())));
        assert!(pairs.contains(&("key".into(), "k123".into())));
    }

    #[test]
    fn list_response_decodes_documents() {
        let page: ListResponse = serde_json::from_value(json!({
            "documents": [{
                "name": "projects/p/databases/(default)/documents/registered_drivers/d1",
                "fields": {"firstName": {"stringValue": "Ana"}}
            }],
            "nextPageToken": "abc"
        }))
        .unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
        let doc = page.documents.into_iter().next().unwrap().into_document();
        assert_eq!(doc.id, "d1");
        assert_eq!(doc.fields["firstName"], json!("Ana"));
    }

    #[test]
    fn token_cell_is_shared() {
        let cell = TokenCell::default();
        let other = cell.clone();
        cell.set(Some("t".into()));
        assert_eq!(other.get().as_deref(), Some("t"));
    }
}
