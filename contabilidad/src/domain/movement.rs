use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Date;

/// Identifier of an income or expense line.
///
/// Lines that came from the backend carry the server id. Lines added during
/// an edit session get a temporary local id until the movement is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemId {
    Remote(i64),
    Local(u64),
}

impl ItemId {
    pub fn remote(self) -> Option<i64> {
        match self {
            ItemId::Remote(id) => Some(id),
            ItemId::Local(_) => None,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Remote(id) => write!(f, "{}", id),
            ItemId::Local(id) => write!(f, "new-{}", id),
        }
    }
}

impl FromStr for ItemId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(local) = s.strip_prefix("new-") {
            return local
                .parse()
                .map(ItemId::Local)
                .map_err(|_| format!("invalid local item id: {}", s));
        }
        s.parse()
            .map(ItemId::Remote)
            .map_err(|_| format!("invalid item id: {}", s))
    }
}

/// Whether a line is money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    #[serde(rename = "ingreso")]
    Income,
    #[serde(rename = "gasto")]
    Expense,
}

impl ItemKind {
    /// Path segment used by the backend's per-item endpoints.
    pub fn path_segment(self) -> &'static str {
        match self {
            ItemKind::Income => "ingreso",
            ItemKind::Expense => "gasto",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Income => f.write_str("income"),
            ItemKind::Expense => f.write_str("expense"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Income {
    pub id: ItemId,
    pub label: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: ItemId,
    pub label: String,
    pub amount: f64,
    pub is_recurring: bool,
}

/// All incomes and expenses recorded for one calendar day.
///
/// Totals are never stored: they are computed from the lines on every read.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyMovement {
    /// Server id, `None` for a day that has not been saved yet.
    pub id: Option<i64>,
    pub date: Date,
    pub incomes: Vec<Income>,
    pub expenses: Vec<Expense>,
}

impl DailyMovement {
    pub fn empty(date: Date) -> Self {
        Self {
            id: None,
            date,
            incomes: Vec::new(),
            expenses: Vec::new(),
        }
    }

    pub fn income_total(&self) -> f64 {
        self.incomes.iter().map(|i| i.amount).sum()
    }

    pub fn expense_total(&self) -> f64 {
        self.expenses.iter().map(|e| e.amount).sum()
    }

    pub fn balance(&self) -> f64 {
        self.income_total() - self.expense_total()
    }

    pub fn is_empty(&self) -> bool {
        self.incomes.is_empty() && self.expenses.is_empty()
    }

    pub fn contains(&self, kind: ItemKind, id: ItemId) -> bool {
        match kind {
            ItemKind::Income => self.incomes.iter().any(|i| i.id == id),
            ItemKind::Expense => self.expenses.iter().any(|e| e.id == id),
        }
    }

    /// Whether an expense with this label was recorded as a recurring payment.
    pub fn has_recurring_expense(&self, label: &str) -> bool {
        self.expenses
            .iter()
            .any(|e| e.is_recurring && e.label == label)
    }

    /// Removes a line, returning whether anything was removed.
    pub fn remove(&mut self, kind: ItemKind, id: ItemId) -> bool {
        match kind {
            ItemKind::Income => {
                let before = self.incomes.len();
                self.incomes.retain(|i| i.id != id);
                self.incomes.len() != before
            }
            ItemKind::Expense => {
                let before = self.expenses.len();
                self.expenses.retain(|e| e.id != id);
                self.expenses.len() != before
            }
        }
    }

    /// Replaces label and amount of a line in place. Returns whether the
    /// line was found.
    pub fn update(&mut self, kind: ItemKind, id: ItemId, label: &str, amount: f64) -> bool {
        match kind {
            ItemKind::Income => match self.incomes.iter_mut().find(|i| i.id == id) {
                Some(income) => {
                    income.label = label.to_string();
                    income.amount = amount;
                    true
                }
                None => false,
            },
            ItemKind::Expense => match self.expenses.iter_mut().find(|e| e.id == id) {
                Some(expense) => {
                    expense.label = label.to_string();
                    expense.amount = amount;
                    true
                }
                None => false,
            },
        }
    }

    /// Checks the movement before it is sent to the backend. Every problem is
    /// reported, not just the first one.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.is_empty() {
            errors.push(ValidationError::Empty);
        }

        let lines = self
            .incomes
            .iter()
            .map(|i| (ItemKind::Income, i.label.as_str(), i.amount))
            .enumerate()
            .chain(
                self.expenses
                    .iter()
                    .map(|e| (ItemKind::Expense, e.label.as_str(), e.amount))
                    .enumerate(),
            );

        for (index, (kind, label, amount)) in lines {
            let position = index + 1;
            if label.trim().is_empty() {
                errors.push(ValidationError::MissingLabel { kind, position });
            }
            if !(amount.is_finite() && amount > 0.0) {
                errors.push(ValidationError::InvalidAmount { kind, position });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a movement needs at least one income or expense")]
    Empty,
    #[error("{kind} {position} has no label")]
    MissingLabel { kind: ItemKind, position: usize },
    #[error("{kind} {position} needs a positive amount")]
    InvalidAmount { kind: ItemKind, position: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn sample() -> DailyMovement {
        DailyMovement {
            id: Some(7),
            date: date!(2024 - 03 - 15),
            incomes: vec![Income {
                id: ItemId::Remote(1),
                label: "Nómina".to_string(),
                amount: 1500.0,
            }],
            expenses: vec![
                Expense {
                    id: ItemId::Remote(2),
                    label: "Alquiler".to_string(),
                    amount: 700.0,
                    is_recurring: true,
                },
                Expense {
                    id: ItemId::Remote(3),
                    label: "Café".to_string(),
                    amount: 2.5,
                    is_recurring: false,
                },
            ],
        }
    }

    #[test]
    fn totals_follow_lines() {
        let mut m = sample();
        assert_eq!(m.income_total(), 1500.0);
        assert_eq!(m.expense_total(), 702.5);
        assert_eq!(m.balance(), 797.5);

        assert!(m.remove(ItemKind::Expense, ItemId::Remote(2)));
        assert_eq!(m.expense_total(), 2.5);
        assert_eq!(m.balance(), 1497.5);

        assert!(m.update(ItemKind::Income, ItemId::Remote(1), "Nómina", 1000.0));
        assert_eq!(m.balance(), 997.5);
    }

    #[test]
    fn kind_selects_the_list() {
        let mut m = sample();
        // Id 1 is an income, not an expense.
        assert!(!m.remove(ItemKind::Expense, ItemId::Remote(1)));
        assert!(!m.update(ItemKind::Expense, ItemId::Remote(1), "x", 1.0));
        assert!(m.contains(ItemKind::Income, ItemId::Remote(1)));
    }

    #[test]
    fn recurring_lookup_requires_flag() {
        let m = sample();
        assert!(m.has_recurring_expense("Alquiler"));
        assert!(!m.has_recurring_expense("Café"));
        assert!(!m.has_recurring_expense("Luz"));
    }

    #[test]
    fn item_id_round_trips_through_text() {
        assert_eq!("42".parse::<ItemId>().unwrap(), ItemId::Remote(42));
        assert_eq!("new-3".parse::<ItemId>().unwrap(), ItemId::Local(3));
        assert_eq!(ItemId::Local(3).to_string(), "new-3");
        assert!("abc".parse::<ItemId>().is_err());
    }

    #[test]
    fn validation_collects_every_problem() {
        let mut m = DailyMovement::empty(date!(2024 - 03 - 15));
        assert_eq!(m.validate(), Err(vec![ValidationError::Empty]));

        m.expenses.push(Expense {
            id: ItemId::Local(1),
            label: " ".to_string(),
            amount: 0.0,
            is_recurring: false,
        });
        assert_eq!(
            m.validate(),
            Err(vec![
                ValidationError::MissingLabel {
                    kind: ItemKind::Expense,
                    position: 1
                },
                ValidationError::InvalidAmount {
                    kind: ItemKind::Expense,
                    position: 1
                },
            ])
        );

        assert!(sample().validate().is_ok());
    }
}
