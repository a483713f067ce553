use contabilidad::breakdown::{MonthBreakdown, YearBreakdown};
use contabilidad::dates::format_date;
use contabilidad::format::format_euro;
use contabilidad::pending::PendingOccurrence;
use contabilidad::{
    DailyMovement, ExpenseKind, MonthSummaryRow, RecurringExpense, Tag, TagSearchHit,
};

use crate::store::{Dismissal, Notification};

pub fn movement_row(movement: &DailyMovement) {
    println!(
        "{}  +{:>12}  -{:>12}  = {:>12}  ({} lines)",
        format_date(movement.date),
        format_euro(movement.income_total()),
        format_euro(movement.expense_total()),
        format_euro(movement.balance()),
        movement.incomes.len() + movement.expenses.len()
    );
}

pub fn movement_detail(movement: &DailyMovement) {
    println!("{}", format_date(movement.date));

    println!("  Incomes");
    if movement.incomes.is_empty() {
        println!("    (none)");
    }
    for income in &movement.incomes {
        println!(
            "    [{:>6}] {:<30} {:>12}",
            income.id.to_string(),
            income.label,
            format_euro(income.amount)
        );
    }

    println!("  Expenses");
    if movement.expenses.is_empty() {
        println!("    (none)");
    }
    for expense in &movement.expenses {
        println!(
            "    [{:>6}] {:<30} {:>12}{}",
            expense.id.to_string(),
            expense.label,
            format_euro(expense.amount),
            if expense.is_recurring { "  (recurring)" } else { "" }
        );
    }

    println!(
        "  Total income {}  Total expenses {}  Balance {}",
        format_euro(movement.income_total()),
        format_euro(movement.expense_total()),
        format_euro(movement.balance())
    );
}

pub fn summary_row(row: &MonthSummaryRow) {
    println!(
        "{}  +{:>12}  -{:>12}  = {:>12}  ({} in, {} out)",
        format_date(row.date),
        format_euro(row.income_total),
        format_euro(row.expense_total),
        format_euro(row.balance),
        row.income_count,
        row.expense_count
    );
}

pub fn pending(occurrence: &PendingOccurrence) {
    let late = match occurrence.days_late {
        0 => "due today".to_string(),
        1 => "1 day late".to_string(),
        n => format!("{} days late", n),
    };
    println!(
        "{}  {:<30} {:>12}  {} ({})",
        format_date(occurrence.expected_date),
        occurrence.expense.label,
        format_euro(occurrence.expense.amount),
        occurrence.expense.schedule,
        late
    );
}

pub fn recurring(index: usize, expense: &RecurringExpense, dismissals: &[&Dismissal]) {
    println!(
        "{:>3}. {:<30} {:>12}  {}  since {}",
        index,
        expense.label,
        format_euro(expense.amount),
        expense.schedule,
        format_date(expense.created_on)
    );
    for dismissal in dismissals {
        println!(
            "       dismissed {} on {}",
            format_date(dismissal.expected_date),
            format_date(dismissal.dismissed_on)
        );
    }
}

pub fn expense_kind(kind: &ExpenseKind) {
    println!("{:<10} {}", format!("{:?}", kind.cadence), kind.label);
}

pub fn month_breakdown(month: &MonthBreakdown) {
    println!("{}", month_breakdown_line(month));
}

fn month_breakdown_line(month: &MonthBreakdown) -> String {
    format!(
        "{:<20} +{:>12}  -{:>12}  = {:>12}  gross {:>12}  {} days, {} per day",
        month.label(),
        format_euro(month.income),
        format_euro(month.expenses),
        format_euro(month.balance),
        format_euro(month.gross),
        month.movement_count,
        format_euro(month.average_balance())
    )
}

pub fn year_breakdown(year: &YearBreakdown) {
    println!(
        "{:<20} +{:>12}  -{:>12}  = {:>12}  gross {:>12}  {} days in {} months",
        year.year,
        format_euro(year.income),
        format_euro(year.expenses),
        format_euro(year.balance),
        format_euro(year.gross),
        year.movement_count,
        year.months_with_movements
    );
}

pub fn tag(tag: &Tag) {
    let mut flags = Vec::new();
    if tag.predefined {
        flags.push("predefined");
    }
    if tag.essential {
        flags.push("essential");
    }
    println!(
        "{:>4}  {:<8} {:<30} {}",
        tag.id,
        tag.kind.to_string(),
        tag.name,
        flags.join(", ")
    );
}

pub fn search_hit(hit: &TagSearchHit) {
    println!(
        "{}  {:<30} {:>12}  (day income {})",
        format_date(hit.date),
        hit.label,
        format_euro(hit.amount),
        format_euro(hit.day_income)
    );
}

pub fn notification(notification: &Notification) {
    println!(
        "{}  {} recorded {} for {}{}",
        notification.id,
        format_date(notification.created_on),
        format_euro(notification.amount),
        notification.label,
        if notification.shown { "" } else { "  (new)" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn month_line_shows_the_daily_average() {
        let month = MonthBreakdown {
            year: 2024,
            month: Month::March,
            income: 100.0,
            expenses: 40.0,
            balance: 60.0,
            movement_count: 4,
            gross: 140.0,
        };

        let line = month_breakdown_line(&month);
        assert!(line.starts_with("marzo de 2024"));
        assert!(line.ends_with("4 days, 15,00€ per day"));
    }
}
