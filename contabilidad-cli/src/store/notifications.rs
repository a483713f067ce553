use anyhow::Result;
use contabilidad::dates::{format_date, iso_date};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

use super::LocalStore;

const KEY: &str = "notificaciones_gastos_automaticos";
const RECENT_DAYS: i64 = 30;
const RETENTION_DAYS: i64 = 60;

/// A recurring expense that was recorded automatically and that the user
/// has not been told about yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "etiqueta")]
    pub label: String,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "fecha", with = "iso_date")]
    pub date: Date,
    #[serde(rename = "fechaCreacion", with = "iso_date")]
    pub created_on: Date,
    #[serde(rename = "mostrada")]
    pub shown: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Notifications {
    items: Vec<Notification>,
}

impl Notifications {
    /// Loads the notification log, dropping entries older than the
    /// retention window. Pruned entries are written back straight away.
    pub fn load(store: &LocalStore, today: Date) -> Self {
        let mut notifications = Self {
            items: store.load(KEY),
        };
        if notifications.prune(today) > 0 {
            if let Err(e) = notifications.save(store) {
                tracing::warn!(error = %e, "failed to save pruned notifications");
            }
        }
        notifications
    }

    pub fn save(&self, store: &LocalStore) -> Result<()> {
        store.save(KEY, &self.items)
    }

    /// Adds a notification unless one exists for the same label and date.
    /// Returns whether it was added.
    pub fn add(&mut self, label: &str, amount: f64, date: Date, today: Date) -> bool {
        if self
            .items
            .iter()
            .any(|n| n.label == label && n.date == date)
        {
            return false;
        }

        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        self.items.push(Notification {
            id: format!("{}-{}-{}", label, format_date(date), millis),
            label: label.to_string(),
            amount,
            date,
            created_on: today,
            shown: false,
        });
        true
    }

    /// Marks a notification as shown. Returns whether the id exists.
    pub fn mark_shown(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.shown = true;
                true
            }
            None => false,
        }
    }

    /// Notifications not shown yet.
    pub fn active(&self) -> Vec<&Notification> {
        self.items.iter().filter(|n| !n.shown).collect()
    }

    /// Notifications created in the last 30 days, newest first.
    pub fn recent(&self, today: Date) -> Vec<&Notification> {
        let since = today - Duration::days(RECENT_DAYS);
        let mut recent: Vec<&Notification> = self
            .items
            .iter()
            .filter(|n| n.created_on >= since)
            .collect();
        recent.sort_by(|a, b| b.created_on.cmp(&a.created_on));
        recent
    }

    /// Drops notifications created more than 60 days ago and returns how
    /// many were dropped.
    pub fn prune(&mut self, today: Date) -> usize {
        let since = today - Duration::days(RETENTION_DAYS);
        let before = self.items.len();
        self.items.retain(|n| n.created_on >= since);
        before - self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn same_label_and_date_is_added_once() {
        let today = date!(2024 - 03 - 20);
        let mut notifications = Notifications::default();

        assert!(notifications.add("Alquiler", 700.0, date!(2024 - 03 - 15), today));
        assert!(!notifications.add("Alquiler", 700.0, date!(2024 - 03 - 15), today));
        assert!(notifications.add("Alquiler", 700.0, date!(2024 - 02 - 15), today));

        assert_eq!(notifications.items.len(), 2);
        assert!(notifications.items[0].id.starts_with("Alquiler-2024-03-15-"));
    }

    #[test]
    fn shown_notifications_leave_the_active_list() {
        let today = date!(2024 - 03 - 20);
        let mut notifications = Notifications::default();
        notifications.add("Luz", 40.0, today, today);
        let id = notifications.items[0].id.clone();

        assert_eq!(notifications.active().len(), 1);
        assert!(notifications.mark_shown(&id));
        assert!(notifications.active().is_empty());
        assert!(!notifications.mark_shown("missing"));
    }

    #[test]
    fn recent_is_newest_first_within_thirty_days() {
        let today = date!(2024 - 03 - 31);
        let mut notifications = Notifications::default();
        notifications.add("Viejo", 1.0, date!(2024 - 02 - 01), date!(2024 - 02 - 01));
        notifications.add("Agua", 1.0, date!(2024 - 03 - 05), date!(2024 - 03 - 05));
        notifications.add("Luz", 1.0, date!(2024 - 03 - 25), date!(2024 - 03 - 25));

        let labels: Vec<&str> = notifications
            .recent(today)
            .into_iter()
            .map(|n| n.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Luz", "Agua"]);
    }

    #[test]
    fn load_prunes_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let mut notifications = Notifications::default();
        notifications.add("Viejo", 1.0, date!(2024 - 01 - 01), date!(2024 - 01 - 01));
        notifications.add("Nuevo", 1.0, date!(2024 - 03 - 01), date!(2024 - 03 - 01));
        notifications.save(&store).unwrap();

        let loaded = Notifications::load(&store, date!(2024 - 03 - 20));
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].label, "Nuevo");

        let raw: Vec<Notification> = store.load(KEY);
        assert_eq!(raw.len(), 1);
    }

    #[test]
    fn reads_web_client_records() {
        let raw = r#"[{"id": "Luz-2024-03-15-1710500000000", "etiqueta": "Luz", "monto": 40,
            "fecha": "2024-03-15", "fechaCreacion": "2024-03-15", "mostrada": true}]"#;
        let items: Vec<Notification> = serde_json::from_str(raw).unwrap();
        assert!(items[0].shown);
        assert_eq!(items[0].date, date!(2024 - 03 - 15));
    }
}
