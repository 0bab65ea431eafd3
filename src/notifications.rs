// Notification Ledger - append-only record of drafted address-change notices

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppResult;
use crate::ids::{IdAllocator, NOTIFICATION_PREFIX};
use crate::store::DocumentStore;
use crate::timestamp;

/// Delivery state of a notice.
///
/// Only `Pending` is ever written by this crate. Any other value found in the
/// ledger is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationStatus {
    /// Drafted, not yet sent.
    Pending,
    Other(String),
}

impl NotificationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for NotificationStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => NotificationStatus::Pending,
            _ => NotificationStatus::Other(raw),
        }
    }
}

impl From<NotificationStatus> for String {
    fn from(status: NotificationStatus) -> Self {
        match status {
            NotificationStatus::Other(raw) => raw,
            NotificationStatus::Pending => "pending".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub profile_id: String,
    pub service_key: String,
    pub service_name: String,
    pub old_address: String,
    pub new_address: String,
    pub status: NotificationStatus,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    /// "Email: .. | Phone: .. | <contact> | Website: .."
    #[serde(default, deserialize_with = "null_as_empty")]
    pub contact_info: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A notification before the ledger has given it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub profile_id: String,
    pub service_key: String,
    pub service_name: String,
    pub old_address: String,
    pub new_address: String,
    pub contact_info: String,
    pub email: String,
}

impl NotificationDraft {
    fn into_notification(self, id: String, created_at: DateTime<Utc>) -> Notification {
        Notification {
            id,
            profile_id: self.profile_id,
            service_key: self.service_key,
            service_name: self.service_name,
            old_address: self.old_address,
            new_address: self.new_address,
            status: NotificationStatus::Pending,
            created_at,
            contact_info: self.contact_info,
            email: self.email,
        }
    }
}

pub struct NotificationLedger {
    store: Arc<dyn DocumentStore>,
}

impl NotificationLedger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Append a batch, assigning each notice an id unique across the ledger.
    ///
    /// Returns the stored notifications in batch order.
    pub fn append(&self, batch: Vec<NotificationDraft>) -> AppResult<Vec<Notification>> {
        let mut ledger = self.store.load_notifications()?;
        let mut ids = IdAllocator::new(NOTIFICATION_PREFIX, ledger.iter().map(|n| n.id.clone()));
        let created_at = timestamp::now();

        let appended: Vec<Notification> = batch
            .into_iter()
            .map(|draft| draft.into_notification(ids.allocate(), created_at))
            .collect();

        if appended.is_empty() {
            return Ok(appended);
        }

        ledger.extend(appended.iter().cloned());
        self.store.save_notifications(&ledger)?;
        Ok(appended)
    }

    /// All notifications, or only those for `profile_id`, in ledger order.
    pub fn list(&self, profile_id: Option<&str>) -> AppResult<Vec<Notification>> {
        let ledger = self.store.load_notifications()?;

        Ok(match profile_id {
            Some(wanted) => ledger.into_iter().filter(|n| n.profile_id == wanted).collect(),
            None => ledger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::json_file::NOTIFICATIONS_FILE;
    use crate::store::{JsonFileStore, MemoryStore};

    fn notice(profile_id: &str, service_key: &str) -> NotificationDraft {
        NotificationDraft {
            profile_id: profile_id.to_string(),
            service_key: service_key.to_string(),
            service_name: service_key.to_string(),
            old_address: "1 Old St".to_string(),
            new_address: "2 New St".to_string(),
            contact_info: String::new(),
            email: String::new(),
        }
    }

    #[test]
    fn test_append_assigns_sequential_ids() {
        let ledger = NotificationLedger::new(Arc::new(MemoryStore::new()));

        let first = ledger
            .append(vec![notice("profile_1", "gas"), notice("profile_1", "water")])
            .unwrap();
        let second = ledger.append(vec![notice("profile_2", "bank")]).unwrap();

        let ids: Vec<&str> = first.iter().chain(&second).map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["notif_1", "notif_2", "notif_3"]);
        assert!(first.iter().all(|n| n.status == NotificationStatus::Pending));
    }

    #[test]
    fn test_list_filters_by_profile_preserving_order() {
        let ledger = NotificationLedger::new(Arc::new(MemoryStore::new()));
        ledger
            .append(vec![
                notice("profile_1", "gas"),
                notice("profile_2", "bank"),
                notice("profile_1", "water"),
            ])
            .unwrap();

        let mine = ledger.list(Some("profile_1")).unwrap();
        let keys: Vec<&str> = mine.iter().map(|n| n.service_key.as_str()).collect();
        assert_eq!(keys, vec!["gas", "water"]);
        assert!(mine.iter().all(|n| n.profile_id == "profile_1"));

        assert_eq!(ledger.list(None).unwrap().len(), 3);
        assert!(ledger.list(Some("profile_9")).unwrap().is_empty());
    }

    #[test]
    fn test_empty_batch_leaves_ledger_alone() {
        let ledger = NotificationLedger::new(Arc::new(MemoryStore::new()));
        assert!(ledger.append(Vec::new()).unwrap().is_empty());
        assert!(ledger.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_value(NotificationStatus::Pending).unwrap();
        assert_eq!(json, "pending");
    }

    #[test]
    fn test_unknown_status_and_null_fields_load() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(
            temp.path().join(NOTIFICATIONS_FILE),
            r#"[
  {
    "id": "notif_1",
    "profile_id": "profile_1",
    "service_key": "gas",
    "service_name": "Gas Co",
    "old_address": "1 Old St",
    "new_address": "2 New St",
    "status": "sent",
    "created_at": "2024-05-01T09:30:00",
    "contact_info": null,
    "email": null
  }
]"#,
        )
        .unwrap();
        let store = Arc::new(JsonFileStore::open(temp.path()).unwrap());
        let ledger = NotificationLedger::new(store.clone());

        let loaded = ledger.list(None).unwrap();
        assert_eq!(loaded[0].status, NotificationStatus::Other("sent".to_string()));
        assert_eq!(loaded[0].status.as_str(), "sent");
        assert!(loaded[0].email.is_empty());
        assert!(loaded[0].contact_info.is_empty());

        // appending keeps the foreign status as written
        ledger.append(vec![notice("profile_1", "water")]).unwrap();
        let raw = std::fs::read_to_string(store.path(NOTIFICATIONS_FILE)).unwrap();
        assert!(raw.contains("\"status\": \"sent\""));
        assert!(raw.contains("\"status\": \"pending\""));
    }
}
