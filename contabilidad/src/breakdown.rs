//! Monthly and yearly aggregation of daily movements.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use time::{Date, Month};

use crate::domain::{DailyMovement, ItemKind};
use crate::format::month_label;

#[derive(Debug, Clone, PartialEq)]
pub struct MonthBreakdown {
    pub year: i32,
    pub month: Month,
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
    /// Days with a recorded movement.
    pub movement_count: usize,
    /// Income plus expenses: how much money moved at all.
    pub gross: f64,
}

impl MonthBreakdown {
    pub fn label(&self) -> String {
        month_label(self.year, self.month)
    }

    /// Average balance per day with movements.
    pub fn average_balance(&self) -> f64 {
        if self.movement_count == 0 {
            0.0
        } else {
            self.balance / self.movement_count as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearBreakdown {
    pub year: i32,
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
    pub movement_count: usize,
    pub gross: f64,
    pub months_with_movements: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Date,
    Gross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    Ascending,
    #[default]
    Descending,
}

/// A label and how much was booked under it.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTotal {
    pub label: String,
    pub amount: f64,
}

#[derive(Default)]
struct Totals {
    income: f64,
    expenses: f64,
    days: usize,
}

impl Totals {
    fn add(&mut self, movement: &DailyMovement) {
        self.income += movement.income_total();
        self.expenses += movement.expense_total();
        self.days += 1;
    }
}

/// One entry per month that has movements, oldest first.
pub fn month_breakdowns(movements: &[DailyMovement]) -> Vec<MonthBreakdown> {
    let mut months: BTreeMap<(i32, u8), Totals> = BTreeMap::new();
    for movement in movements {
        let key = (movement.date.year(), movement.date.month() as u8);
        months.entry(key).or_default().add(movement);
    }

    months
        .into_iter()
        .filter_map(|((year, month), totals)| {
            Some(MonthBreakdown {
                year,
                month: Month::try_from(month).ok()?,
                income: totals.income,
                expenses: totals.expenses,
                balance: totals.income - totals.expenses,
                movement_count: totals.days,
                gross: totals.income + totals.expenses,
            })
        })
        .collect()
}

/// One entry per year that has movements, oldest first.
pub fn year_breakdowns(movements: &[DailyMovement]) -> Vec<YearBreakdown> {
    let mut years: BTreeMap<i32, (Totals, BTreeSet<u8>)> = BTreeMap::new();
    for movement in movements {
        let (totals, months) = years.entry(movement.date.year()).or_default();
        totals.add(movement);
        months.insert(movement.date.month() as u8);
    }

    years
        .into_iter()
        .map(|(year, (totals, months))| YearBreakdown {
            year,
            income: totals.income,
            expenses: totals.expenses,
            balance: totals.income - totals.expenses,
            movement_count: totals.days,
            gross: totals.income + totals.expenses,
            months_with_movements: months.len(),
        })
        .collect()
}

pub fn total_days_with_movements(movements: &[DailyMovement]) -> usize {
    movements
        .iter()
        .map(|m| m.date)
        .collect::<BTreeSet<Date>>()
        .len()
}

pub fn sort_months(breakdowns: &mut [MonthBreakdown], key: SortKey, order: Order) {
    breakdowns.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Date => (a.year, a.month as u8).cmp(&(b.year, b.month as u8)),
            SortKey::Gross => a.gross.total_cmp(&b.gross),
        };
        apply(ordering, order)
    });
}

pub fn sort_years(breakdowns: &mut [YearBreakdown], key: SortKey, order: Order) {
    breakdowns.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Date => a.year.cmp(&b.year),
            SortKey::Gross => a.gross.total_cmp(&b.gross),
        };
        apply(ordering, order)
    });
}

fn apply(ordering: Ordering, order: Order) -> Ordering {
    match order {
        Order::Ascending => ordering,
        Order::Descending => ordering.reverse(),
    }
}

/// The `limit` labels with the largest totals for one side of the ledger,
/// largest first.
pub fn top_labels(movements: &[DailyMovement], kind: ItemKind, limit: usize) -> Vec<LabelTotal> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for movement in movements {
        match kind {
            ItemKind::Income => {
                for income in &movement.incomes {
                    *totals.entry(income.label.as_str()).or_insert(0.0) += income.amount;
                }
            }
            ItemKind::Expense => {
                for expense in &movement.expenses {
                    *totals.entry(expense.label.as_str()).or_insert(0.0) += expense.amount;
                }
            }
        }
    }

    let mut ranked: Vec<LabelTotal> = totals
        .into_iter()
        .map(|(label, amount)| LabelTotal {
            label: label.to_string(),
            amount,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.label.cmp(&b.label))
    });
    ranked.truncate(limit);
    ranked
}
