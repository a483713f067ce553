use anyhow::Result;
use contabilidad::RecurringExpense;
use serde_json::Value;

use super::LocalStore;

const KEY: &str = "gastosRecurrentes";

/// The user's recurring expense definitions, in the order they were added.
///
/// Stored records this version cannot read are kept aside and written back
/// untouched, after the readable ones.
#[derive(Debug, Clone, Default)]
pub struct RecurringRegistry {
    items: Vec<RecurringExpense>,
    unreadable: Vec<Value>,
}

impl RecurringRegistry {
    pub fn load(store: &LocalStore) -> Self {
        let records: Vec<Value> = store.load(KEY);
        let mut registry = Self::default();

        for record in records {
            match serde_json::from_value::<RecurringExpense>(record.clone()) {
                Ok(expense) => registry.items.push(expense),
                Err(e) => {
                    tracing::warn!(error = %e, %record, "skipping unreadable recurring expense");
                    registry.unreadable.push(record);
                }
            }
        }

        registry
    }

    pub fn save(&self, store: &LocalStore) -> Result<()> {
        let mut records = self
            .items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        records.extend(self.unreadable.iter().cloned());
        store.save(KEY, &records)
    }

    pub fn all(&self) -> &[RecurringExpense] {
        &self.items
    }

    /// Number of stored records that could not be read.
    pub fn unreadable(&self) -> usize {
        self.unreadable.len()
    }

    /// Whether any stored record, readable or not, carries `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.items.iter().any(|e| e.label == label)
            || self
                .unreadable
                .iter()
                .any(|r| r.get("etiqueta").and_then(Value::as_str) == Some(label))
    }

    pub fn add(&mut self, expense: RecurringExpense) {
        self.items.push(expense);
    }

    /// Replaces the definition at `index`. Returns false if out of range.
    pub fn update(&mut self, index: usize, expense: RecurringExpense) -> bool {
        match self.items.get_mut(index) {
            Some(slot) => {
                *slot = expense;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<RecurringExpense> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contabilidad::Schedule;
    use time::macros::date;
    use time::Weekday;

    #[test]
    fn add_update_remove_by_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let mut registry = RecurringRegistry::load(&store);
        registry.add(RecurringExpense::new(
            "Alquiler",
            700.0,
            Schedule::monthly(1).unwrap(),
            date!(2024 - 01 - 01),
        ));
        registry.add(RecurringExpense::new(
            "Gimnasio",
            35.0,
            Schedule::weekly(Weekday::Monday),
            date!(2024 - 01 - 01),
        ));

        assert!(registry.update(
            0,
            RecurringExpense::new(
                "Alquiler",
                750.0,
                Schedule::monthly(1).unwrap(),
                date!(2024 - 01 - 01)
            )
        ));
        let first = registry.all()[0].clone();
        assert!(!registry.update(5, first));
        registry.save(&store).unwrap();

        let mut reloaded = RecurringRegistry::load(&store);
        assert_eq!(reloaded.all().len(), 2);
        assert_eq!(reloaded.all()[0].amount, 750.0);
        assert_eq!(reloaded.remove(1).map(|e| e.label), Some("Gimnasio".to_string()));
        assert!(reloaded.remove(1).is_none());
    }

    #[test]
    fn unreadable_records_survive_a_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(format!("{}.json", KEY)),
            r#"[
                {"etiqueta": "Alquiler", "monto": 700, "frecuencia": "mensual", "diaMes": 1, "fechaCreacion": "2024-01-01"},
                {"etiqueta": "Luz", "monto": 40, "frecuencia": "mensual"}
            ]"#,
        )
        .unwrap();
        let store = LocalStore::new(dir.path());

        let mut registry = RecurringRegistry::load(&store);
        assert_eq!(registry.all().len(), 1);
        assert_eq!(registry.all()[0].label, "Alquiler");
        assert_eq!(registry.unreadable(), 1);
        assert!(registry.has_label("Luz"));

        registry.add(RecurringExpense::new(
            "Agua",
            25.0,
            Schedule::monthly(10).unwrap(),
            date!(2024 - 02 - 01),
        ));
        registry.save(&store).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(format!("{}.json", KEY))).unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        let labels: Vec<&str> = records
            .iter()
            .map(|r| r["etiqueta"].as_str().unwrap())
            .collect();
        assert_eq!(labels, vec!["Alquiler", "Agua", "Luz"]);
        assert!(records[2].get("diaMes").is_none());

        let reloaded = RecurringRegistry::load(&store);
        assert_eq!(reloaded.all().len(), 2);
        assert_eq!(reloaded.unreadable(), 1);
    }
}
