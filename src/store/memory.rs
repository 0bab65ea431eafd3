use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};

use crate::catalog::{default_catalog, CatalogMap};
use crate::notifications::Notification;
use crate::profiles::ProfileMap;

use super::DocumentStore;

/// In-process store with the same whole-document semantics as the JSON files.
pub struct MemoryStore {
    profiles: Arc<RwLock<ProfileMap>>,
    catalog: CatalogMap,
    notifications: Arc<RwLock<Vec<Notification>>>,
}

impl MemoryStore {
    /// Empty profiles and ledger, default catalog.
    pub fn new() -> Self {
        Self::with_catalog(default_catalog())
    }

    pub fn with_catalog(catalog: CatalogMap) -> Self {
        Self {
            profiles: Arc::new(RwLock::new(ProfileMap::new())),
            catalog,
            notifications: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("memory store lock poisoned")
}

impl DocumentStore for MemoryStore {
    fn load_profiles(&self) -> Result<ProfileMap> {
        Ok(self.profiles.read().map_err(poisoned)?.clone())
    }

    fn save_profiles(&self, profiles: &ProfileMap) -> Result<()> {
        *self.profiles.write().map_err(poisoned)? = profiles.clone();
        Ok(())
    }

    fn load_catalog(&self) -> Result<CatalogMap> {
        Ok(self.catalog.clone())
    }

    fn load_notifications(&self) -> Result<Vec<Notification>> {
        Ok(self.notifications.read().map_err(poisoned)?.clone())
    }

    fn save_notifications(&self, notifications: &[Notification]) -> Result<()> {
        *self.notifications.write().map_err(poisoned)? = notifications.to_vec();
        Ok(())
    }
}
