use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::catalog::{default_catalog, CatalogMap};
use crate::notifications::Notification;
use crate::profiles::ProfileMap;

use super::DocumentStore;

pub const PROFILES_FILE: &str = "profiles.json";
pub const SERVICES_FILE: &str = "services.json";
pub const NOTIFICATIONS_FILE: &str = "notifications.json";

/// Collections stored as pretty-printed UTF-8 JSON files in one directory.
///
/// Each save rewrites the whole file: the document is written to a temp file
/// next to the target and renamed over it.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open `dir`, creating it and any missing document.
    ///
    /// Missing documents start as `{}` (profiles), the default catalog
    /// (services) and `[]` (notifications). Existing files are never touched.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { dir: dir.into() };

        fs::create_dir_all(&store.dir)
            .with_context(|| format!("Failed to create data directory {}", store.dir.display()))?;

        store.ensure_document(PROFILES_FILE, &ProfileMap::new())?;
        if store.ensure_document(SERVICES_FILE, &default_catalog())? {
            tracing::info!(dir = %store.dir.display(), "seeded default service catalog");
        }
        store.ensure_document(NOTIFICATIONS_FILE, &Vec::<Notification>::new())?;

        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Write `initial` when `file` does not exist yet. Returns whether it did.
    fn ensure_document<T: Serialize + ?Sized>(&self, file: &str, initial: &T) -> Result<bool> {
        if self.path(file).exists() {
            return Ok(false);
        }
        self.write_document(file, initial)?;
        Ok(true)
    }

    fn read_document<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.path(file);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn write_document<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.path(file);
        let payload = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to encode {}", file))?;

        let temp_path = self
            .dir
            .join(format!(".{}.{}.tmp", file, uuid::Uuid::new_v4().simple()));
        fs::write(&temp_path, payload)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;

        if let Err(err) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err).with_context(|| format!("Failed to replace {}", path.display()));
        }

        Ok(())
    }
}

impl DocumentStore for JsonFileStore {
    fn load_profiles(&self) -> Result<ProfileMap> {
        self.read_document(PROFILES_FILE)
    }

    fn save_profiles(&self, profiles: &ProfileMap) -> Result<()> {
        self.write_document(PROFILES_FILE, profiles)
    }

    fn load_catalog(&self) -> Result<CatalogMap> {
        self.read_document(SERVICES_FILE)
    }

    fn load_notifications(&self) -> Result<Vec<Notification>> {
        self.read_document(NOTIFICATIONS_FILE)
    }

    fn save_notifications(&self, notifications: &[Notification]) -> Result<()> {
        self.write_document(NOTIFICATIONS_FILE, notifications)
    }
}
