// Service Catalog - reference list of provider types a profile can link
//
// Seeded once when the services document is first created and read-only
// afterwards. Profiles are free to link keys that are not in the catalog.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::store::DocumentStore;

// ============================================================================
// SERVICE CATEGORY
// ============================================================================

/// Category of a catalog entry.
///
/// Unknown strings (for example categories coming back from the suggestion
/// service such as "media") are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceCategory {
    Utilities,
    Health,
    Insurance,
    Transport,
    Finance,
    Other(String),
}

impl ServiceCategory {
    pub fn as_str(&self) -> &str {
        match self {
            ServiceCategory::Utilities => "utilities",
            ServiceCategory::Health => "health",
            ServiceCategory::Insurance => "insurance",
            ServiceCategory::Transport => "transport",
            ServiceCategory::Finance => "finance",
            ServiceCategory::Other(raw) => raw,
        }
    }
}

impl From<String> for ServiceCategory {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "utilities" => ServiceCategory::Utilities,
            "health" => ServiceCategory::Health,
            "insurance" => ServiceCategory::Insurance,
            "transport" => ServiceCategory::Transport,
            "finance" => ServiceCategory::Finance,
            _ => ServiceCategory::Other(raw),
        }
    }
}

impl From<&str> for ServiceCategory {
    fn from(raw: &str) -> Self {
        ServiceCategory::from(raw.to_string())
    }
}

impl From<ServiceCategory> for String {
    fn from(category: ServiceCategory) -> Self {
        match category {
            ServiceCategory::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CATALOG ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub category: ServiceCategory,
}

impl CatalogEntry {
    pub fn new(name: &str, category: ServiceCategory) -> Self {
        Self {
            name: name.to_string(),
            category,
        }
    }
}

/// Catalog keyed by service key, in document order.
pub type CatalogMap = IndexMap<String, CatalogEntry>;

/// The 12 entries written to a fresh services document.
pub fn default_catalog() -> CatalogMap {
    use ServiceCategory::*;

    [
        ("gas", "Gas Provider", Utilities),
        ("water", "Water Provider", Utilities),
        ("electricity", "Electricity Provider", Utilities),
        ("medicare", "Medicare", Health),
        ("house_insurance", "House Insurance", Insurance),
        ("private_insurance", "Private Insurance", Insurance),
        ("car_rego", "Car Registration", Transport),
        ("gp", "General Practitioner", Health),
        ("internet", "Internet Provider", Utilities),
        ("phone", "Phone Provider", Utilities),
        ("bank", "Bank", Finance),
        ("postal", "Postal Service", Utilities),
    ]
    .into_iter()
    .map(|(key, name, category)| (key.to_string(), CatalogEntry::new(name, category)))
    .collect()
}

// ============================================================================
// SERVICE CATALOG
// ============================================================================

pub struct ServiceCatalog {
    store: Arc<dyn DocumentStore>,
}

impl ServiceCatalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All known services, key -> {name, category}.
    pub fn list(&self) -> AppResult<CatalogMap> {
        Ok(self.store.load_catalog()?)
    }
}
