//! Typed access over a [`RecordStore`] for the core entity types.

use serde_json::Value;
use smartticket_core::Entity;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::ports::{Document, Fields, RecordStore};

/// Decode a document into `T`, attaching its id.
pub fn decode<T: Entity>(doc: Document) -> Result<T, StoreError> {
    let mut record: T = serde_json::from_value(Value::Object(doc.fields))?;
    record.set_id(doc.id);
    Ok(record)
}

/// Encode `record` as a field map. The id is never part of the fields.
pub fn encode<T: Entity>(record: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Other(format!(
            "{} record did not encode as an object: {other}",
            T::COLLECTION
        ))),
    }
}

/// Every decodable record of `T`'s collection. Documents that fail to decode
/// are logged and skipped.
pub async fn list_records<T: Entity>(store: &dyn RecordStore) -> Result<Vec<T>, StoreError> {
    let docs = store.list(T::COLLECTION).await?;
    let total = docs.len();
    let records: Vec<T> = docs
        .into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match decode::<T>(doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(collection = %T::COLLECTION, id = %id, error = %e, "skipping undecodable document");
                    None
                }
            }
        })
        .collect();
    debug!(collection = %T::COLLECTION, total, decoded = records.len(), "listed records");
    Ok(records)
}

pub async fn get_record<T: Entity>(
    store: &dyn RecordStore,
    id: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(T::COLLECTION, id).await? {
        Some(doc) => decode(doc).map(Some),
        None => Ok(None),
    }
}

/// Insert `record` under a fresh id and return it.
pub async fn create_record<T: Entity>(
    store: &dyn RecordStore,
    record: &T,
) -> Result<String, StoreError> {
    store.create(T::COLLECTION, encode(record)?).await
}

/// Write `record` under its own id.
pub async fn set_record<T: Entity>(store: &dyn RecordStore, record: &T) -> Result<(), StoreError> {
    if record.id().is_empty() {
        return Err(StoreError::Other(format!(
            "cannot set a {} record without an id",
            T::COLLECTION
        )));
    }
    store.set(T::COLLECTION, record.id(), encode(record)?).await
}
