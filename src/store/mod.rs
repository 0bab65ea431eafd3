// Document Store - whole-document load/save per collection
//
// Three independent collections live behind this trait: profiles, the service
// catalog and the notification ledger. Reads return the full collection and
// writes replace it; there are no partial updates.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use anyhow::Result;

use crate::catalog::CatalogMap;
use crate::notifications::Notification;
use crate::profiles::ProfileMap;

pub trait DocumentStore: Send + Sync {
    fn load_profiles(&self) -> Result<ProfileMap>;

    fn save_profiles(&self, profiles: &ProfileMap) -> Result<()>;

    /// The catalog is read-only once seeded.
    fn load_catalog(&self) -> Result<CatalogMap>;

    fn load_notifications(&self) -> Result<Vec<Notification>>;

    fn save_notifications(&self, notifications: &[Notification]) -> Result<()>;
}
