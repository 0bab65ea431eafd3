use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::address_change::AddressChangeWorkflow;
use crate::catalog::ServiceCatalog;
use crate::notifications::NotificationLedger;
use crate::profiles::ProfileRegistry;
use crate::store::{DocumentStore, JsonFileStore};

/// Every component wired to one document store.
///
/// This is what the CLI, TUI and HTTP server hold on to.
pub struct AddressBook {
    pub profiles: ProfileRegistry,
    pub catalog: ServiceCatalog,
    pub notifications: NotificationLedger,
    pub moves: AddressChangeWorkflow,
}

impl AddressBook {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            profiles: ProfileRegistry::new(store.clone()),
            catalog: ServiceCatalog::new(store.clone()),
            notifications: NotificationLedger::new(store.clone()),
            moves: AddressChangeWorkflow::new(store),
        }
    }

    /// Open (and initialize if needed) the JSON documents under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let store = JsonFileStore::open(data_dir)?;
        Ok(Self::new(Arc::new(store)))
    }
}
