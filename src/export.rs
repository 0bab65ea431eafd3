// CSV export of drafted notifications, one row per notice, for mail merge.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::notifications::Notification;

#[derive(Serialize)]
struct NotificationRow<'a> {
    id: &'a str,
    profile_id: &'a str,
    service_key: &'a str,
    service_name: &'a str,
    old_address: &'a str,
    new_address: &'a str,
    status: &'a str,
    created_at: String,
    contact_info: &'a str,
    email: &'a str,
}

impl<'a> From<&'a Notification> for NotificationRow<'a> {
    fn from(n: &'a Notification) -> Self {
        Self {
            id: &n.id,
            profile_id: &n.profile_id,
            service_key: &n.service_key,
            service_name: &n.service_name,
            old_address: &n.old_address,
            new_address: &n.new_address,
            status: n.status.as_str(),
            created_at: n.created_at.to_rfc3339(),
            contact_info: &n.contact_info,
            email: &n.email,
        }
    }
}

/// Write `notifications` as CSV with a header row. Returns the row count.
pub fn write_csv<W: Write>(writer: W, notifications: &[Notification]) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for notification in notifications {
        csv_writer
            .serialize(NotificationRow::from(notification))
            .with_context(|| format!("Failed to write notification {}", notification.id))?;
    }

    csv_writer.flush().context("Failed to flush CSV output")?;
    Ok(notifications.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NotificationStatus;
    use chrono::Utc;

    fn notice(id: &str, contact_info: &str) -> Notification {
        Notification {
            id: id.to_string(),
            profile_id: "profile_1".to_string(),
            service_key: "gas".to_string(),
            service_name: "Gas Co".to_string(),
            old_address: "1 Old St".to_string(),
            new_address: "2 New St, Unit 4".to_string(),
            status: NotificationStatus::Pending,
            created_at: Utc::now(),
            contact_info: contact_info.to_string(),
            email: "gas@x.com".to_string(),
        }
    }

    #[test]
    fn test_write_csv_with_header_and_quoting() {
        let mut out = Vec::new();
        let rows = write_csv(
            &mut out,
            &[notice("notif_1", "Email: gas@x.com | Phone: 555"), notice("notif_2", "")],
        )
        .unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,profile_id,service_key,service_name,old_address,new_address,status"));
        assert!(lines[1].starts_with("notif_1,profile_1,gas,Gas Co,1 Old St,\"2 New St, Unit 4\",pending"));
    }

    #[test]
    fn test_write_csv_empty_ledger() {
        let mut out = Vec::new();
        assert_eq!(write_csv(&mut out, &[]).unwrap(), 0);
        assert!(out.is_empty());
    }
}
