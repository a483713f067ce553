use anyhow::Result;
use contabilidad::dates::iso_date;
use contabilidad::pending::Dismissals;
use serde::{Deserialize, Serialize};
use time::Date;

use super::LocalStore;

const KEY: &str = "rechazos_gastos_recurrentes";

/// The user chose not to record the occurrence of `label` due on
/// `expected_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dismissal {
    #[serde(rename = "etiqueta")]
    pub label: String,
    #[serde(rename = "fechaEsperada", with = "iso_date")]
    pub expected_date: Date,
    #[serde(rename = "fechaRechazo", with = "iso_date")]
    pub dismissed_on: Date,
}

#[derive(Debug, Clone, Default)]
pub struct DismissalLog {
    items: Vec<Dismissal>,
}

impl DismissalLog {
    pub fn load(store: &LocalStore) -> Self {
        Self {
            items: store.load(KEY),
        }
    }

    pub fn save(&self, store: &LocalStore) -> Result<()> {
        store.save(KEY, &self.items)
    }

    /// Records a dismissal. Returns false if the occurrence was already
    /// dismissed.
    pub fn add(&mut self, label: &str, expected_date: Date, today: Date) -> bool {
        if self.find(label, expected_date).is_some() {
            return false;
        }
        self.items.push(Dismissal {
            label: label.to_string(),
            expected_date,
            dismissed_on: today,
        });
        true
    }

    pub fn find(&self, label: &str, expected_date: Date) -> Option<&Dismissal> {
        self.items
            .iter()
            .find(|d| d.label == label && d.expected_date == expected_date)
    }

    pub fn for_label(&self, label: &str) -> Vec<&Dismissal> {
        self.items.iter().filter(|d| d.label == label).collect()
    }

    /// Forgets every dismissal for `label`, returning how many were removed.
    pub fn clear_label(&mut self, label: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|d| d.label != label);
        before - self.items.len()
    }
}

impl Dismissals for DismissalLog {
    fn is_dismissed(&self, label: &str, date: Date) -> bool {
        self.find(label, date).is_some()
    }
}
