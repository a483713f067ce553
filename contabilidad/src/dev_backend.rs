//! In-memory backend for offline use and tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::{Date, Duration, Month};

use crate::client::{ApiError, MAX_LIST_LIMIT};
use crate::domain::{
    DailyMovement, Expense, Income, ItemId, ItemKind, MonthSummaryRow, NewTag, SearchScope, Tag,
    TagSearchHit,
};
use crate::ports::MovementsApi;

#[derive(Debug, Default)]
struct DevStore {
    movements: BTreeMap<Date, DailyMovement>,
    tags: Vec<Tag>,
    delete_calls: Vec<(Date, ItemKind, i64)>,
}

/// A [`MovementsApi`] that keeps everything in memory and behaves like the
/// real backend: saves assign server ids and deleting a missing line
/// succeeds.
#[derive(Debug, Clone)]
pub struct DevBackend {
    store: Arc<Mutex<DevStore>>,
    next_id: Arc<AtomicI64>,
    saves_allowed: Arc<AtomicUsize>,
    fail_deletes: Arc<AtomicBool>,
    save_calls: Arc<AtomicUsize>,
}

impl Default for DevBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DevBackend {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(DevStore::default())),
            next_id: Arc::new(AtomicI64::new(1000)),
            saves_allowed: Arc::new(AtomicUsize::new(usize::MAX)),
            fail_deletes: Arc::new(AtomicBool::new(false)),
            save_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A backend with a few weeks of sample data ending on `today`.
    pub fn seeded(today: Date) -> Self {
        let backend = Self::new();
        {
            let mut store = backend.store.lock().expect("dev store lock poisoned");
            for movement in seed_movements(today) {
                store.movements.insert(movement.date, movement);
            }
            store.tags = seed_tags();
        }
        backend
    }

    pub fn with_movements(self, movements: Vec<DailyMovement>) -> Self {
        {
            let mut store = self.store.lock().expect("dev store lock poisoned");
            for movement in movements {
                store.movements.insert(movement.date, movement);
            }
        }
        self
    }

    /// Makes every following save fail with a server error.
    pub fn fail_saves(&self) {
        self.fail_saves_after(0);
    }

    /// Lets `count` more saves through, then fails every save after them.
    pub fn fail_saves_after(&self, count: usize) {
        let done = self.save_calls.load(Ordering::SeqCst);
        self.saves_allowed
            .store(done.saturating_add(count), Ordering::SeqCst);
    }

    /// Makes every following item delete fail with a server error.
    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    /// Item deletes received so far, in order.
    pub fn delete_calls(&self) -> Vec<(Date, ItemKind, i64)> {
        self.store
            .lock()
            .expect("dev store lock poisoned")
            .delete_calls
            .clone()
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    fn fresh_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn server_error() -> ApiError {
        ApiError::Status {
            status: 500,
            detail: "dev backend configured to fail".to_string(),
        }
    }
}

#[async_trait]
impl MovementsApi for DevBackend {
    async fn list_movements(&self, limit: u32) -> Result<Vec<DailyMovement>, ApiError> {
        let store = self.store.lock().expect("dev store lock poisoned");
        Ok(store
            .movements
            .values()
            .rev()
            .take(limit.clamp(1, MAX_LIST_LIMIT) as usize)
            .cloned()
            .collect())
    }

    async fn movement_on(&self, date: Date) -> Result<Option<DailyMovement>, ApiError> {
        let store = self.store.lock().expect("dev store lock poisoned");
        Ok(store.movements.get(&date).cloned())
    }

    async fn save_movement(&self, movement: &DailyMovement) -> Result<DailyMovement, ApiError> {
        let previous = self.save_calls.fetch_add(1, Ordering::SeqCst);
        if previous >= self.saves_allowed.load(Ordering::SeqCst) {
            return Err(Self::server_error());
        }

        let mut saved = movement.clone();
        for income in &mut saved.incomes {
            if let ItemId::Local(_) = income.id {
                income.id = ItemId::Remote(self.fresh_id());
            }
        }
        for expense in &mut saved.expenses {
            if let ItemId::Local(_) = expense.id {
                expense.id = ItemId::Remote(self.fresh_id());
            }
        }

        let mut store = self.store.lock().expect("dev store lock poisoned");
        saved.id = match store.movements.get(&saved.date) {
            Some(existing) => existing.id,
            None => Some(self.fresh_id()),
        };
        store.movements.insert(saved.date, saved.clone());
        Ok(saved)
    }

    async fn delete_movement(&self, date: Date) -> Result<(), ApiError> {
        let mut store = self.store.lock().expect("dev store lock poisoned");
        match store.movements.remove(&date) {
            Some(_) => Ok(()),
            None => Err(ApiError::NotFound),
        }
    }

    async fn delete_item(&self, date: Date, kind: ItemKind, id: i64) -> Result<(), ApiError> {
        let mut store = self.store.lock().expect("dev store lock poisoned");
        store.delete_calls.push((date, kind, id));
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Self::server_error());
        }

        if let Some(movement) = store.movements.get_mut(&date) {
            movement.remove(kind, ItemId::Remote(id));
        }
        Ok(())
    }

    async fn month_summary(
        &self,
        year: i32,
        month: Month,
    ) -> Result<Vec<MonthSummaryRow>, ApiError> {
        let store = self.store.lock().expect("dev store lock poisoned");
        Ok(store
            .movements
            .values()
            .filter(|m| m.date.year() == year && m.date.month() == month)
            .map(|m| MonthSummaryRow {
                date: m.date,
                income_total: m.income_total(),
                expense_total: m.expense_total(),
                balance: m.balance(),
                income_count: m.incomes.len() as u32,
                expense_count: m.expenses.len() as u32,
            })
            .collect())
    }

    async fn search_by_label(
        &self,
        label: &str,
        scope: SearchScope,
        limit: u32,
    ) -> Result<Vec<TagSearchHit>, ApiError> {
        let needle = label.to_lowercase();
        let store = self.store.lock().expect("dev store lock poisoned");

        let hits = store.movements.values().rev().flat_map(|m| {
            let lines: Vec<(&str, f64)> = match scope {
                SearchScope::Expenses => m
                    .expenses
                    .iter()
                    .map(|e| (e.label.as_str(), e.amount))
                    .collect(),
                SearchScope::Incomes => m
                    .incomes
                    .iter()
                    .map(|i| (i.label.as_str(), i.amount))
                    .collect(),
            };
            let day_income = m.income_total();
            lines
                .into_iter()
                .filter(|(line, _)| line.to_lowercase().contains(&needle))
                .map(move |(line, amount)| TagSearchHit {
                    date: m.date,
                    amount,
                    label: line.to_string(),
                    day_income,
                    scope,
                })
                .collect::<Vec<_>>()
        });

        Ok(hits.take(limit as usize).collect())
    }

    async fn tags(&self) -> Result<Vec<Tag>, ApiError> {
        let store = self.store.lock().expect("dev store lock poisoned");
        let mut tags = store.tags.clone();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<Tag, ApiError> {
        let mut store = self.store.lock().expect("dev store lock poisoned");
        if store
            .tags
            .iter()
            .any(|t| t.name == tag.name && t.kind == tag.kind)
        {
            return Err(ApiError::Status {
                status: 400,
                detail: format!("La etiqueta '{}' ya existe", tag.name),
            });
        }
        let created = Tag {
            id: self.fresh_id(),
            name: tag.name.clone(),
            kind: tag.kind,
            predefined: tag.predefined,
            essential: tag.essential,
        };
        store.tags.push(created.clone());
        Ok(created)
    }

    async fn update_tag(&self, id: i64, tag: &NewTag) -> Result<Tag, ApiError> {
        let mut store = self.store.lock().expect("dev store lock poisoned");
        let existing = store
            .tags
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(ApiError::NotFound)?;
        existing.name = tag.name.clone();
        existing.kind = tag.kind;
        existing.predefined = tag.predefined;
        existing.essential = tag.essential;
        Ok(existing.clone())
    }

    async fn delete_tag(&self, id: i64) -> Result<(), ApiError> {
        let mut store = self.store.lock().expect("dev store lock poisoned");
        let before = store.tags.len();
        store.tags.retain(|t| t.id != id);
        if store.tags.len() == before {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}

fn seed_movements(today: Date) -> Vec<DailyMovement> {
    let days: [(i64, &[(&str, f64)], &[(&str, f64, bool)]); 6] = [
        (
            24,
            &[("Nómina", 1850.0)],
            &[("Alquiler", 720.0, true), ("Supermercado", 64.3, false)],
        ),
        (17, &[], &[("Gasolina", 48.0, false), ("Gimnasio", 35.0, true)]),
        (12, &[("Venta segunda mano", 40.0)], &[("Cena", 52.8, false)]),
        (6, &[], &[("Supermercado", 81.15, false)]),
        (2, &[], &[("Farmacia", 12.4, false), ("Café", 2.2, false)]),
        (0, &[], &[("Café", 1.8, false)]),
    ];

    let mut line_id = 0;
    let mut movements = Vec::with_capacity(days.len());
    for (n, (ago, incomes, expenses)) in days.iter().enumerate() {
        let mut movement = DailyMovement::empty(today - Duration::days(*ago));
        movement.id = Some(n as i64 + 1);
        for (label, amount) in incomes.iter() {
            line_id += 1;
            movement.incomes.push(Income {
                id: ItemId::Remote(line_id),
                label: label.to_string(),
                amount: *amount,
            });
        }
        for (label, amount, is_recurring) in expenses.iter() {
            line_id += 1;
            movement.expenses.push(Expense {
                id: ItemId::Remote(line_id),
                label: label.to_string(),
                amount: *amount,
                is_recurring: *is_recurring,
            });
        }
        movements.push(movement);
    }
    movements
}

fn seed_tags() -> Vec<Tag> {
    [
        (1, "Alquiler", ItemKind::Expense, true),
        (2, "Supermercado", ItemKind::Expense, true),
        (3, "Ocio", ItemKind::Expense, false),
        (4, "Nómina", ItemKind::Income, false),
    ]
    .into_iter()
    .map(|(id, name, kind, essential)| Tag {
        id,
        name: name.to_string(),
        kind,
        predefined: true,
        essential,
    })
    .collect()
}
