// Address-Change Workflow
//
// Moves a profile to a new address and drafts one pending notification for
// every service the profile links. The profile is saved first, then the
// ledger; the two writes are not atomic.

use std::borrow::Cow;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::notifications::{Notification, NotificationDraft, NotificationLedger};
use crate::profiles::{present, Profile, ServiceLink};
use crate::store::DocumentStore;

/// Outcome of a move: the updated profile and the notices drafted for it.
#[derive(Debug, Clone, Serialize)]
pub struct AddressChange {
    pub message: String,
    pub notifications: Vec<Notification>,
    pub profile: Profile,
}

/// Contact line for a service: `Email: ..`, `Phone: ..`, the raw contact
/// field and `Website: ..`, whichever are present, joined with " | ".
pub fn contact_summary(link: &ServiceLink) -> String {
    let parts = [
        present(&link.email).map(|email| format!("Email: {email}")),
        present(&link.phone).map(|phone| format!("Phone: {phone}")),
        present(&link.contact).map(Cow::into_owned),
        present(&link.website).map(|website| format!("Website: {website}")),
    ];

    parts.into_iter().flatten().collect::<Vec<_>>().join(" | ")
}

pub struct AddressChangeWorkflow {
    store: Arc<dyn DocumentStore>,
    ledger: NotificationLedger,
}

impl AddressChangeWorkflow {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            ledger: NotificationLedger::new(store.clone()),
            store,
        }
    }

    pub fn change_address(&self, profile_id: &str, new_address: &str) -> AppResult<AddressChange> {
        let mut profiles = self.store.load_profiles()?;
        let profile = profiles
            .get_mut(profile_id)
            .ok_or_else(AppError::profile_not_found)?;

        if new_address.is_empty() {
            return Err(AppError::invalid("New address is required"));
        }

        let old_address = std::mem::replace(&mut profile.current_address, new_address.to_string());
        profile.previous_address = old_address.clone();
        profile.touch();

        let drafts: Vec<NotificationDraft> = profile
            .services
            .iter()
            .map(|(key, link)| NotificationDraft {
                profile_id: profile_id.to_string(),
                service_key: key.clone(),
                service_name: link.display_name(key).into_owned(),
                old_address: old_address.clone(),
                new_address: new_address.to_string(),
                contact_info: contact_summary(link),
                email: present(&link.email).map(Cow::into_owned).unwrap_or_default(),
            })
            .collect();
        let updated = profile.clone();

        self.store.save_profiles(&profiles)?;
        let notifications = self.ledger.append(drafts)?;

        tracing::info!(
            profile_id = %profile_id,
            notifications = notifications.len(),
            "address changed"
        );

        Ok(AddressChange {
            message: format!(
                "Address change notification sent to {} services",
                notifications.len()
            ),
            notifications,
            profile: updated,
        })
    }
}
