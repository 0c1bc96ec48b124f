//! The console context shared by every page, plus the mutate-then-reload contract.

use std::future::Future;
use std::sync::Arc;

use chrono::Local;
use smartticket_core::ledger::sort_recent_first;
use smartticket_core::{
    ApprehensionRecord, DriverForm, DriverRecord, LedgerFilter, StatusChangeContext, StatusGroup,
    UserEdit, UserRecord, filter_by_status_and_criteria,
};
use smartticket_store::{AuthClient, BlobStore, RecordStore, Session, list_records};
use tracing::{debug, error};

use crate::error::ConsoleError;
use crate::notify::Notifier;
use crate::table::{self, Table};

/// A table the console can show and refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Users,
    Drivers,
    Ledger {
        group: StatusGroup,
        filter: LedgerFilter,
    },
}

impl View {
    pub fn ledger(group: StatusGroup) -> Self {
        Self::Ledger {
            group,
            filter: LedgerFilter::default(),
        }
    }
}

/// What a page operation or row action ended with.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The operator declined the confirmation; nothing was written.
    Cancelled,
    /// A write succeeded and the affected view was re-listed.
    Reloaded(Table),
    /// The status dialog is open for this selection.
    StatusDialog(StatusChangeContext),
    /// The edit form is open, pre-filled from the stored user.
    EditUser { id: String, form: UserEdit },
    /// The edit form is open, pre-filled from the stored driver.
    EditDriver { id: String, form: DriverForm },
    /// A dialog was shown; nothing changed.
    Shown,
}

/// A file picked in a form, to be stored before the record is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Final path component of the picked file's name.
    pub fn base_name(&self) -> &str {
        self.file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.file_name)
    }
}

pub struct Console {
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn AuthClient>,
    blobs: Arc<dyn BlobStore>,
    notifier: Arc<dyn Notifier>,
}

impl Console {
    pub fn new(
        store: Arc<dyn RecordStore>,
        auth: Arc<dyn AuthClient>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            auth,
            blobs,
            notifier,
        }
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn auth(&self) -> &dyn AuthClient {
        self.auth.as_ref()
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// The signed-in operator, or `NotAuthenticated`.
    pub(crate) async fn session(&self) -> Result<Session, ConsoleError> {
        self.auth
            .current_session()
            .await
            .ok_or(ConsoleError::NotAuthenticated)
    }

    /// Log a failed remote call, show the page's generic failure dialog, and hand the error back.
    pub(crate) fn fail(&self, text: &str, err: ConsoleError) -> ConsoleError {
        error!(error = %err, "{text}");
        self.notifier.error("Error!", text);
        err
    }

    /// Report a form validation failure without touching any backend.
    pub(crate) fn invalid(&self, err: ConsoleError) -> ConsoleError {
        debug!(error = %err, "form rejected");
        self.notifier.error("Error!", &err.to_string());
        err
    }

    /// Store `upload` under `dir` and return its URL.
    pub(crate) async fn upload(
        &self,
        dir: &str,
        upload: Option<Upload>,
    ) -> Result<Option<String>, ConsoleError> {
        let Some(upload) = upload else {
            return Ok(None);
        };
        let path = format!("{dir}/{}", upload.base_name());
        let url = self.blobs.upload(&path, upload.bytes).await?;
        Ok(Some(url))
    }

    pub async fn apprehensions(&self) -> Result<Vec<ApprehensionRecord>, ConsoleError> {
        Ok(list_records(self.store()).await?)
    }

    pub async fn drivers(&self) -> Result<Vec<DriverRecord>, ConsoleError> {
        Ok(list_records(self.store()).await?)
    }

    pub async fn users(&self) -> Result<Vec<UserRecord>, ConsoleError> {
        Ok(list_records(self.store()).await?)
    }

    /// List the view's collection in full and render it.
    pub async fn render(&self, view: &View) -> Result<Table, ConsoleError> {
        let table = match view {
            View::Users => table::users_table(&self.users().await?),
            View::Drivers => table::drivers_table(&self.drivers().await?),
            View::Ledger { group, filter } => {
                let mut records = self.apprehensions().await?;
                sort_recent_first(&mut records);
                let ledger = filter_by_status_and_criteria(&records, *group, filter);
                table::ledger_table(&ledger, &Local)
            }
        };
        debug!(title = %table.title, rows = table.rows.len(), "rendered view");
        Ok(table)
    }

    /// Run `mutation`, then re-list and re-render `view`.
    ///
    /// The view is never patched in place: a successful write always costs
    /// one full `list` call. A failed mutation leaves the view untouched.
    pub async fn apply_mutation<Fut>(&self, view: &View, mutation: Fut) -> Result<Table, ConsoleError>
    where
        Fut: Future<Output = Result<(), ConsoleError>> + Send,
    {
        mutation.await?;
        debug!(?view, "view invalidated");
        self.render(view).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::notify::testing::RecordingNotifier;
    use smartticket_store::{MemoryAuth, MemoryBlobStore, MemoryStore};

    impl Console {
        pub(crate) fn in_memory(notifier: Arc<dyn Notifier>) -> Self {
            Self::new(
                Arc::new(MemoryStore::open()),
                Arc::new(MemoryAuth::open()),
                Arc::new(MemoryBlobStore::open()),
                notifier,
            )
        }
    }

    /// A console over in-memory backends, with handles for seeding and inspection.
    pub(crate) struct Fixture {
        pub console: Console,
        pub store: Arc<MemoryStore>,
        pub auth: Arc<MemoryAuth>,
        pub blobs: Arc<MemoryBlobStore>,
        pub notifier: Arc<RecordingNotifier>,
    }

    pub(crate) fn fixture(confirm: bool) -> Fixture {
        let store = Arc::new(MemoryStore::open());
        let auth = Arc::new(MemoryAuth::open());
        let blobs = Arc::new(MemoryBlobStore::open());
        let notifier = Arc::new(RecordingNotifier::answering(confirm));
        let console = Console::new(store.clone(), auth.clone(), blobs.clone(), notifier.clone());
        Fixture {
            console,
            store,
            auth,
            blobs,
            notifier,
        }
    }
}
