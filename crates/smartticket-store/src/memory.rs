//! In-process backend with an optional JSON snapshot on disk.
//!
//! [`MemoryStore`] keeps documents per collection, [`MemoryAuth`] keeps
//! accounts, and [`MemoryBlobStore`] keeps uploaded files. Each can be opened
//! ephemeral or persistent; persistent instances rewrite their file after
//! every write.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use smartticket_core::Collection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AuthError, BlobError, StoreError};
use crate::ports::{AuthClient, BlobStore, Document, Fields, RecordStore, Session};

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    collections: Collections,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn write_file(path: &Path, contents: Vec<u8>) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await
}

/// Document store held in memory.
///
/// Documents list in id order within a collection. Use [`open`](Self::open)
/// for an ephemeral store and [`open_persistent`](Self::open_persistent) for
/// one backed by a snapshot file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
    path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn open() -> Self {
        Self::default()
    }

    /// Open or create a snapshot file. A missing file starts empty.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let snapshot = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str::<Snapshot>(&raw)?
        } else {
            Snapshot::default()
        };
        let count: usize = snapshot.collections.values().map(BTreeMap::len).sum();
        info!(path = %path.display(), documents = count, "opened snapshot store");
        Ok(Self {
            collections: Mutex::new(snapshot.collections),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: Collection) -> usize {
        lock(&self.collections)
            .get(collection.as_str())
            .map_or(0, BTreeMap::len)
    }

    async fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = {
            let collections = lock(&self.collections);
            serde_json::to_vec_pretty(&Snapshot {
                collections: collections.clone(),
            })?
        };
        write_file(path, bytes).await?;
        debug!(path = %path.display(), "saved snapshot");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let collections = lock(&self.collections);
        Ok(collections
            .get(collection.as_str())
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = lock(&self.collections);
        Ok(collections
            .get(collection.as_str())
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn create(&self, collection: Collection, fields: Fields) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        lock(&self.collections)
            .entry(collection.as_str().to_string())
            .or_default()
            .insert(id.clone(), fields);
        self.save().await?;
        debug!(collection = %collection, id = %id, "created document");
        Ok(id)
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        lock(&self.collections)
            .entry(collection.as_str().to_string())
            .or_default()
            .insert(id.to_string(), fields);
        self.save().await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        {
            let mut collections = lock(&self.collections);
            let doc = collections
                .get_mut(collection.as_str())
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StoreError::NotFound {
                    collection,
                    id: id.to_string(),
                })?;
            doc.extend(fields);
        }
        self.save().await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let removed = lock(&self.collections)
            .get_mut(collection.as_str())
            .and_then(|docs| docs.remove(id));
        if removed.is_none() {
            debug!(collection = %collection, id = %id, "delete of absent document");
            return Ok(());
        }
        self.save().await
    }
}

/// Lower-case hex SHA-256 of a password.
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    uid: String,
    email: String,
    password_sha256: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AccountFile {
    #[serde(default)]
    accounts: Vec<Account>,
}

#[derive(Debug, Default)]
struct AuthState {
    /// Keyed by lower-cased email.
    accounts: HashMap<String, Account>,
    session: Option<Session>,
}

/// Account registry held in memory, optionally persisted to a JSON file.
#[derive(Debug, Default)]
pub struct MemoryAuth {
    state: Mutex<AuthState>,
    path: Option<PathBuf>,
}

impl MemoryAuth {
    pub fn open() -> Self {
        Self::default()
    }

    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let file = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str::<AccountFile>(&raw)?
        } else {
            AccountFile::default()
        };
        let accounts = file
            .accounts
            .into_iter()
            .map(|a| (a.email.to_ascii_lowercase(), a))
            .collect::<HashMap<_, _>>();
        info!(path = %path.display(), accounts = accounts.len(), "opened account file");
        Ok(Self {
            state: Mutex::new(AuthState {
                accounts,
                session: None,
            }),
            path: Some(path.to_path_buf()),
        })
    }

    async fn save(&self) -> Result<(), AuthError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = {
            let state = lock(&self.state);
            let mut accounts: Vec<Account> = state.accounts.values().cloned().collect();
            accounts.sort_by(|a, b| a.email.cmp(&b.email));
            serde_json::to_vec_pretty(&AccountFile { accounts })
                .map_err(|e| AuthError::Backend(e.to_string()))?
        };
        write_file(path, bytes)
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))
    }

    fn session_for(account: &Account) -> Session {
        Session {
            uid: account.uid.clone(),
            email: account.email.clone(),
            id_token: Uuid::new_v4().simple().to_string(),
        }
    }
}

#[async_trait]
impl AuthClient for MemoryAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let mut state = lock(&self.state);
        let account = state
            .accounts
            .get(&email.trim().to_ascii_lowercase())
            .filter(|a| a.password_sha256 == password_digest(password))
            .ok_or(AuthError::InvalidCredentials)?;
        let session = Self::session_for(account);
        state.session = Some(session.clone());
        info!(uid = %session.uid, "signed in");
        Ok(session)
    }

    async fn current_session(&self) -> Option<Session> {
        lock(&self.state).session.clone()
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        lock(&self.state).session = None;
        Ok(())
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = smartticket_core::validate::email("email", email)
            .map_err(|_| AuthError::InvalidEmail)?;
        if password.chars().count() < smartticket_core::validate::MIN_PASSWORD_LEN {
            return Err(AuthError::Backend(
                "WEAK_PASSWORD : Password should be at least 6 characters".into(),
            ));
        }
        let session = {
            let mut state = lock(&self.state);
            let key = email.to_ascii_lowercase();
            if state.accounts.contains_key(&key) {
                return Err(AuthError::EmailInUse);
            }
            let account = Account {
                uid: Uuid::new_v4().simple().to_string(),
                email: email.to_string(),
                password_sha256: password_digest(password),
            };
            let session = Self::session_for(&account);
            state.accounts.insert(key, account);
            session
        };
        self.save().await?;
        info!(uid = %session.uid, "created account");
        Ok(session)
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = smartticket_core::validate::email("email", email)
            .map_err(|_| AuthError::InvalidEmail)?;
        let known = lock(&self.state)
            .accounts
            .contains_key(&email.to_ascii_lowercase());
        if !known {
            return Err(AuthError::UserNotFound);
        }
        info!(email = %email, "password reset requested");
        Ok(())
    }

    async fn change_password(&self, old: &str, new: &str) -> Result<(), AuthError> {
        {
            let mut state = lock(&self.state);
            let session = state.session.clone().ok_or(AuthError::NoSession)?;
            let account = state
                .accounts
                .get_mut(&session.email.to_ascii_lowercase())
                .ok_or(AuthError::UserNotFound)?;
            if account.password_sha256 != password_digest(old) {
                return Err(AuthError::ReauthRequired);
            }
            account.password_sha256 = password_digest(new);
        }
        self.save().await
    }
}

/// Uploaded files, kept in memory or written under a directory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    root: Option<PathBuf>,
}

impl MemoryBlobStore {
    pub fn open() -> Self {
        Self::default()
    }

    /// Files land under `root`, which is created on first upload.
    pub fn open_persistent(root: &Path) -> Self {
        Self {
            blobs: Mutex::default(),
            root: Some(root.to_path_buf()),
        }
    }

    /// Directory next to a snapshot file where its blobs are kept.
    pub fn dir_for_snapshot(snapshot: &Path) -> PathBuf {
        let stem = snapshot
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "smartticket".to_string());
        snapshot.with_file_name(format!("{stem}_blobs"))
    }

    /// Bytes of an uploaded blob, if held in memory.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        lock(&self.blobs).get(path).cloned()
    }
}

fn check_blob_path(path: &str) -> Result<(), BlobError> {
    let valid = !path.is_empty()
        && !path.starts_with('/')
        && path.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..");
    if valid {
        Ok(())
    } else {
        Err(BlobError::InvalidPath(path.to_string()))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, BlobError> {
        check_blob_path(path)?;
        let size = bytes.len();
        let url = match &self.root {
            Some(root) => {
                let target = root.join(path);
                write_file(&target, bytes).await?;
                let absolute = std::path::absolute(&target)?;
                format!("file://{}", absolute.display())
            }
            None => {
                lock(&self.blobs).insert(path.to_string(), bytes);
                format!("memory://{path}")
            }
        };
        debug!(path, size, "uploaded blob");
        Ok(url)
    }
}
