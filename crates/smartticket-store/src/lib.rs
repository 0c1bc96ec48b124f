//! Storage layer: collaborator ports, typed record access, and the in-memory snapshot backend.

mod error;
pub use error::{AuthError, BlobError, StoreError};

pub mod memory;
pub mod ports;
pub mod typed;

pub use memory::{MemoryAuth, MemoryBlobStore, MemoryStore};
pub use ports::{AuthClient, BlobStore, Document, Fields, RecordStore, Session};
pub use typed::{create_record, get_record, list_records, set_record};
