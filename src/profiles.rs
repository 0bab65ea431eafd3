// Profile Registry - people, their addresses, and the services linked to them
//
// Every operation loads the whole profiles document, mutates it in memory and
// writes it back. The service links are owned by the profile that embeds them.

use std::borrow::Cow;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::ids::{IdAllocator, PROFILE_PREFIX};
use crate::store::DocumentStore;
use crate::timestamp;

// ============================================================================
// SERVICE LINK
// ============================================================================

/// A profile's record of one external provider.
///
/// Every field is optional and free-form: whatever JSON value the caller
/// stored is kept as-is. Fields this crate does not know about are kept in
/// `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Value>,

    /// Free-form contact line (postal address, portal, contact person...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<Value>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl ServiceLink {
    /// Name shown on notifications. An empty name counts as missing, and
    /// the raw key is used instead.
    pub fn display_name<'a>(&'a self, key: &'a str) -> Cow<'a, str> {
        present(&self.name).unwrap_or(Cow::Borrowed(key))
    }

    /// Merge the supplied fields, leaving the rest untouched.
    pub fn apply(&mut self, patch: ServicePatch) {
        let ServicePatch {
            name,
            category,
            contact,
            email,
            phone,
            account,
            website,
        } = patch;

        merge(&mut self.name, name);
        merge(&mut self.category, category);
        merge(&mut self.contact, contact);
        merge(&mut self.email, email);
        merge(&mut self.phone, phone);
        merge(&mut self.account, account);
        merge(&mut self.website, website);
    }
}

/// Text of a field when it holds a non-empty string or a number.
///
/// Other JSON values (null, booleans, arrays, objects) count as absent.
pub(crate) fn present(field: &Option<Value>) -> Option<Cow<'_, str>> {
    match field.as_ref()? {
        Value::String(text) if !text.is_empty() => Some(Cow::Borrowed(text.as_str())),
        Value::Number(number) => Some(Cow::Owned(number.to_string())),
        _ => None,
    }
}

fn merge(slot: &mut Option<Value>, update: Option<Value>) {
    if let Some(value) = update {
        *slot = Some(value);
    }
}

/// Subset of service fields a caller may change on an existing link.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServicePatch {
    pub name: Option<Value>,
    pub category: Option<Value>,
    pub contact: Option<Value>,
    pub email: Option<Value>,
    pub phone: Option<Value>,
    pub account: Option<Value>,
    pub website: Option<Value>,
}

// ============================================================================
// PROFILE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub current_address: String,

    #[serde(default)]
    pub previous_address: String,

    /// Linked services keyed by service key, in the order they were attached
    #[serde(default)]
    pub services: IndexMap<String, ServiceLink>,

    #[serde(default = "timestamp::now", deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "timestamp::now", deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    fn from_draft(id: String, draft: ProfileDraft) -> Self {
        let now = timestamp::now();

        Profile {
            id,
            name: draft.name.unwrap_or_default(),
            email: draft.email.unwrap_or_default(),
            phone: draft.phone.unwrap_or_default(),
            current_address: draft.current_address.unwrap_or_default(),
            previous_address: draft.previous_address.unwrap_or_default(),
            services: draft.services.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`; never moves it backwards.
    pub fn touch(&mut self) {
        self.updated_at = timestamp::touch(self.updated_at);
    }

    fn apply(&mut self, patch: ProfilePatch) {
        let ProfilePatch {
            name,
            email,
            phone,
            current_address,
            previous_address,
            services,
        } = patch;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(phone) = phone {
            self.phone = phone;
        }
        if let Some(current_address) = current_address {
            self.current_address = current_address;
        }
        if let Some(previous_address) = previous_address {
            self.previous_address = previous_address;
        }
        if let Some(services) = services {
            self.services = services;
        }
    }
}

/// Profiles keyed by id, in document order.
pub type ProfileMap = IndexMap<String, Profile>;

/// Fields accepted when creating a profile. Anything omitted defaults to empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileDraft {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub current_address: Option<String>,
    pub previous_address: Option<String>,
    pub services: Option<IndexMap<String, ServiceLink>>,
}

/// Fields accepted when updating a profile. Only supplied fields change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub current_address: Option<String>,
    pub previous_address: Option<String>,
    pub services: Option<IndexMap<String, ServiceLink>>,
}

// ============================================================================
// PROFILE REGISTRY
// ============================================================================

pub struct ProfileRegistry {
    store: Arc<dyn DocumentStore>,
}

impl ProfileRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> AppResult<ProfileMap> {
        Ok(self.store.load_profiles()?)
    }

    pub fn get(&self, id: &str) -> AppResult<Profile> {
        self.list()?
            .shift_remove(id)
            .ok_or_else(AppError::profile_not_found)
    }

    /// Create a profile. An omitted or empty id gets the next free `profile_<n>`.
    pub fn create(&self, mut draft: ProfileDraft) -> AppResult<Profile> {
        let mut profiles = self.store.load_profiles()?;

        let id = match draft.id.take().filter(|id| !id.is_empty()) {
            Some(id) => {
                if profiles.contains_key(&id) {
                    tracing::warn!(profile_id = %id, "create replaces an existing profile");
                }
                id
            }
            None => IdAllocator::new(PROFILE_PREFIX, profiles.keys().cloned()).allocate(),
        };

        let profile = Profile::from_draft(id.clone(), draft);
        profiles.insert(id, profile.clone());
        self.store.save_profiles(&profiles)?;

        tracing::info!(profile_id = %profile.id, "profile created");
        Ok(profile)
    }

    pub fn update(&self, id: &str, patch: ProfilePatch) -> AppResult<Profile> {
        self.modify(id, |profile| {
            profile.apply(patch);
            Ok(())
        })
    }

    pub fn delete(&self, id: &str) -> AppResult<()> {
        let mut profiles = self.store.load_profiles()?;

        if profiles.shift_remove(id).is_none() {
            return Err(AppError::profile_not_found());
        }

        self.store.save_profiles(&profiles)?;
        tracing::info!(profile_id = %id, "profile deleted");
        Ok(())
    }

    /// Link a service to a profile, replacing any link already under `key`.
    pub fn attach_service(&self, id: &str, key: &str, details: ServiceLink) -> AppResult<Profile> {
        let mut profiles = self.store.load_profiles()?;
        let profile = profiles
            .get_mut(id)
            .ok_or_else(AppError::profile_not_found)?;

        if key.is_empty() {
            return Err(AppError::invalid("Service key is required"));
        }

        profile.services.insert(key.to_string(), details);
        profile.touch();
        let updated = profile.clone();

        self.store.save_profiles(&profiles)?;
        Ok(updated)
    }

    pub fn update_service(&self, id: &str, key: &str, patch: ServicePatch) -> AppResult<Profile> {
        self.modify(id, |profile| {
            let link = profile
                .services
                .get_mut(key)
                .ok_or_else(AppError::service_not_found)?;
            link.apply(patch);
            Ok(())
        })
    }

    pub fn detach_service(&self, id: &str, key: &str) -> AppResult<Profile> {
        self.modify(id, |profile| {
            profile
                .services
                .shift_remove(key)
                .map(|_| ())
                .ok_or_else(AppError::service_not_found)
        })
    }

    /// Load, apply `update_fn` to one profile, restamp and save.
    ///
    /// Nothing is written when the profile is missing or `update_fn` fails.
    fn modify<F>(&self, id: &str, update_fn: F) -> AppResult<Profile>
    where
        F: FnOnce(&mut Profile) -> AppResult<()>,
    {
        let mut profiles = self.store.load_profiles()?;
        let profile = profiles
            .get_mut(id)
            .ok_or_else(AppError::profile_not_found)?;

        update_fn(profile)?;
        profile.touch();
        let updated = profile.clone();

        self.store.save_profiles(&profiles)?;
        Ok(updated)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn registry() -> ProfileRegistry {
        ProfileRegistry::new(Arc::new(MemoryStore::new()))
    }

    fn draft(name: &str, address: &str) -> ProfileDraft {
        ProfileDraft {
            name: Some(name.to_string()),
            current_address: Some(address.to_string()),
            ..Default::default()
        }
    }

    fn gas_link() -> ServiceLink {
        ServiceLink {
            email: Some(json!("a@b.com")),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_assigns_distinct_ids() {
        let registry = registry();

        let first = registry.create(draft("Ana", "1 Old St")).unwrap();
        let second = registry.create(draft("Ben", "9 Elm St")).unwrap();

        assert_eq!(first.id, "profile_1");
        assert_eq!(second.id, "profile_2");

        let fetched = registry.get(&first.id).unwrap();
        assert_eq!(fetched, first);
    }

    #[test]
    fn test_create_defaults_missing_fields() {
        let registry = registry();
        let profile = registry.create(ProfileDraft::default()).unwrap();

        assert!(profile.name.is_empty());
        assert!(profile.email.is_empty());
        assert!(profile.previous_address.is_empty());
        assert!(profile.services.is_empty());
        assert_eq!(profile.created_at, profile.updated_at);
    }

    #[test]
    fn test_create_after_delete_does_not_reuse_ids() {
        let registry = registry();

        let first = registry.create(draft("Ana", "")).unwrap();
        let second = registry.create(draft("Ben", "")).unwrap();
        registry.delete(&first.id).unwrap();

        let third = registry.create(draft("Cy", "")).unwrap();
        assert_ne!(third.id, second.id);
        assert_eq!(registry.list().unwrap().len(), 2);
    }

    #[test]
    fn test_create_with_explicit_and_empty_id() {
        let registry = registry();

        let named = registry
            .create(ProfileDraft {
                id: Some("home".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(named.id, "home");

        let blank = registry
            .create(ProfileDraft {
                id: Some(String::new()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(blank.id, "profile_2");
    }

    #[test]
    fn test_get_missing_profile() {
        let err = registry().get("nobody").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let registry = registry();
        let created = registry
            .create(ProfileDraft {
                name: Some("Ana".to_string()),
                email: Some("ana@example.com".to_string()),
                current_address: Some("1 Old St".to_string()),
                ..Default::default()
            })
            .unwrap();

        let updated = registry
            .update(
                &created.id,
                ProfilePatch {
                    phone: Some("0400 000 000".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.phone, "0400 000 000");
        assert_eq!(updated.name, "Ana");
        assert_eq!(updated.email, "ana@example.com");
        assert_eq!(updated.current_address, "1 Old St");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn test_update_missing_profile() {
        let err = registry()
            .update("nobody", ProfilePatch::default())
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_attach_then_detach_service() {
        let registry = registry();
        let profile = registry.create(draft("Ana", "1 Old St")).unwrap();

        let attached = registry.attach_service(&profile.id, "gas", gas_link()).unwrap();
        assert_eq!(attached.services["gas"].email, Some(json!("a@b.com")));

        let detached = registry.detach_service(&profile.id, "gas").unwrap();
        assert!(!detached.services.contains_key("gas"));

        let again = registry.detach_service(&profile.id, "gas").unwrap_err();
        assert!(matches!(again, AppError::NotFound(_)));
        assert_eq!(again.to_string(), "Service not found");
    }

    #[test]
    fn test_attach_requires_key_and_profile() {
        let registry = registry();
        let profile = registry.create(draft("Ana", "")).unwrap();

        let missing_key = registry.attach_service(&profile.id, "", gas_link()).unwrap_err();
        assert!(matches!(missing_key, AppError::InvalidArgument(_)));

        let missing_profile = registry.attach_service("nobody", "gas", gas_link()).unwrap_err();
        assert!(matches!(missing_profile, AppError::NotFound(_)));
    }

    #[test]
    fn test_attach_overwrites_existing_key() {
        let registry = registry();
        let profile = registry.create(draft("Ana", "")).unwrap();

        registry.attach_service(&profile.id, "gas", gas_link()).unwrap();
        let replaced = registry
            .attach_service(
                &profile.id,
                "gas",
                ServiceLink {
                    name: Some(json!("Gas Co")),
                    ..Default::default()
                },
            )
            .unwrap();

        let link = &replaced.services["gas"];
        assert_eq!(link.name, Some(json!("Gas Co")));
        assert!(link.email.is_none());
    }

    #[test]
    fn test_update_service_merges_fields() {
        let registry = registry();
        let profile = registry.create(draft("Ana", "")).unwrap();
        registry.attach_service(&profile.id, "gas", gas_link()).unwrap();

        let updated = registry
            .update_service(
                &profile.id,
                "gas",
                ServicePatch {
                    phone: Some(json!("555")),
                    ..Default::default()
                },
            )
            .unwrap();

        let link = &updated.services["gas"];
        assert_eq!(link.phone, Some(json!("555")));
        assert_eq!(link.email, Some(json!("a@b.com")));

        let missing = registry
            .update_service(&profile.id, "water", ServicePatch::default())
            .unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }

    #[test]
    fn test_delete_missing_profile() {
        let registry = registry();
        registry.create(draft("Ana", "")).unwrap();

        let err = registry.delete("nobody").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(registry.list().unwrap().len(), 1);
    }

    #[test]
    fn test_service_link_keeps_unknown_fields() {
        let raw = json!({
            "name": "Gas Co",
            "email": "gas@x.com",
            "notes": "meter #42"
        });

        let link: ServiceLink = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(link.extra["notes"], "meter #42");
        assert_eq!(serde_json::to_value(&link).unwrap(), raw);
    }

    #[test]
    fn test_display_name_falls_back_to_key() {
        let unnamed = ServiceLink::default();
        assert_eq!(unnamed.display_name("gas"), "gas");

        // an empty name is treated like a missing one
        let blank = ServiceLink {
            name: Some(json!("")),
            ..Default::default()
        };
        assert_eq!(blank.display_name("gas"), "gas");

        let named = ServiceLink {
            name: Some(json!("Gas Co")),
            ..Default::default()
        };
        assert_eq!(named.display_name("gas"), "Gas Co");
    }

    #[test]
    fn test_display_name_reads_numbers() {
        let numbered = ServiceLink {
            name: Some(json!(42)),
            ..Default::default()
        };
        assert_eq!(numbered.display_name("gas"), "42");

        let odd = ServiceLink {
            name: Some(json!(["Gas", "Co"])),
            ..Default::default()
        };
        assert_eq!(odd.display_name("gas"), "gas");
    }

    #[test]
    fn test_attach_accepts_any_json_value() {
        let registry = registry();
        let profile = registry.create(draft("Ana", "")).unwrap();

        let details: ServiceLink = serde_json::from_value(json!({
            "account": 12345678,
            "phone": null,
            "website": ["a.example", "b.example"]
        }))
        .unwrap();
        let attached = registry.attach_service(&profile.id, "bank", details).unwrap();

        let link = &attached.services["bank"];
        assert_eq!(link.account, Some(json!(12345678)));
        assert_eq!(link.website, Some(json!(["a.example", "b.example"])));

        let stored = registry.get(&profile.id).unwrap();
        assert_eq!(stored.services["bank"], *link);
    }

    #[test]
    fn test_non_string_service_field_does_not_block_other_profiles() {
        let registry = registry();
        let ana = registry.create(draft("Ana", "1 Old St")).unwrap();
        let ben = registry.create(draft("Ben", "9 Elm St")).unwrap();

        let details: ServiceLink = serde_json::from_value(json!({ "account": 12345678 })).unwrap();
        registry.attach_service(&ana.id, "bank", details).unwrap();

        assert_eq!(registry.get(&ben.id).unwrap().name, "Ben");
        assert_eq!(registry.list().unwrap().len(), 2);
    }
}
