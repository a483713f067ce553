//! Detection of recurring expenses that are due but have not been recorded.
//!
//! Detection only looks at the current period: the current month for
//! monthly and weekly schedules, the current year for annual ones. The
//! result depends only on its inputs, so callers simply run it again
//! whenever definitions, movements or dismissals change.

use std::collections::HashSet;

use time::{Date, Duration};

use crate::dates;
use crate::domain::{DailyMovement, RecurringExpense, Schedule};

/// Occurrences the user has explicitly chosen not to record.
pub trait Dismissals {
    fn is_dismissed(&self, label: &str, date: Date) -> bool;
}

/// No dismissals at all.
pub struct NoDismissals;

impl Dismissals for NoDismissals {
    fn is_dismissed(&self, _label: &str, _date: Date) -> bool {
        false
    }
}

impl Dismissals for HashSet<(String, Date)> {
    fn is_dismissed(&self, label: &str, date: Date) -> bool {
        self.contains(&(label.to_string(), date))
    }
}

/// A recurring expense that should have been recorded on `expected_date`.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOccurrence {
    pub expense: RecurringExpense,
    pub expected_date: Date,
    pub days_late: i64,
}

/// Every due date of `schedule` in the period containing `today`, in
/// ascending order. Dates after `today` are included.
pub fn candidate_dates(schedule: &Schedule, today: Date) -> Vec<Date> {
    match *schedule {
        // A day the month does not have (31 in April) has no occurrence.
        Schedule::Monthly { day } => Date::from_calendar_date(today.year(), today.month(), day)
            .ok()
            .into_iter()
            .collect(),
        Schedule::Weekly { weekday } => {
            let first = dates::month_start(today);
            let last = dates::month_end(today);
            let mut found = Vec::new();
            let mut anchor = first;
            while anchor <= last {
                let offset = (weekday.number_days_from_monday() as i64
                    - anchor.weekday().number_days_from_monday() as i64)
                    .rem_euclid(7);
                let candidate = anchor + Duration::days(offset);
                if candidate <= last && !found.contains(&candidate) {
                    found.push(candidate);
                }
                anchor += Duration::days(7);
            }
            found
        }
        Schedule::Annual { month, day } => Date::from_calendar_date(today.year(), month, day)
            .ok()
            .into_iter()
            .collect(),
    }
}

/// Recurring expenses due on or before `today` with no matching recorded
/// expense.
///
/// An occurrence counts as recorded when the movement for its date has an
/// expense with the same label flagged as recurring. Occurrences before the
/// definition's creation date, and dismissed ones, are skipped.
pub fn detect<D>(
    definitions: &[RecurringExpense],
    movements: &[DailyMovement],
    dismissals: &D,
    today: Date,
) -> Vec<PendingOccurrence>
where
    D: Dismissals + ?Sized,
{
    let mut pending = Vec::new();

    for definition in definitions {
        if definition.created_on > today {
            continue;
        }

        let due = candidate_dates(&definition.schedule, today)
            .into_iter()
            .filter(|date| *date <= today && *date >= definition.created_on);

        for expected_date in due {
            let recorded = movements
                .iter()
                .filter(|m| m.date == expected_date)
                .any(|m| m.has_recurring_expense(&definition.label));
            if recorded || dismissals.is_dismissed(&definition.label, expected_date) {
                continue;
            }

            pending.push(PendingOccurrence {
                expense: definition.clone(),
                expected_date,
                days_late: (today - expected_date).whole_days(),
            });
        }
    }

    tracing::debug!(
        definitions = definitions.len(),
        pending = pending.len(),
        %today,
        "detected pending recurring expenses"
    );
    pending
}
