// Change of Address - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod address_change; // Address-change workflow
pub mod book;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod ids;
pub mod notifications;
pub mod profiles;
pub mod store;
pub mod suggestions;
pub mod timestamp;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use address_change::{contact_summary, AddressChange, AddressChangeWorkflow};
pub use book::AddressBook;
pub use catalog::{default_catalog, CatalogEntry, CatalogMap, ServiceCatalog, ServiceCategory};
pub use config::{AiConfig, Config, ServerConfig};
pub use error::{AppError, AppResult};
pub use notifications::{Notification, NotificationDraft, NotificationLedger, NotificationStatus};
pub use profiles::{
    Profile, ProfileDraft, ProfileMap, ProfilePatch, ProfileRegistry, ServiceLink, ServicePatch,
};
pub use store::{DocumentStore, JsonFileStore, MemoryStore};
pub use suggestions::{
    CompletionClient, GeminiClient, ProfileSummary, ServiceSuggester, SuggestedService,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the `tracing` subscriber used by both binaries.
///
/// `RUST_LOG` overrides the default `change_of_address=info` filter.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("change_of_address=info,address_server=info,tower_http=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
