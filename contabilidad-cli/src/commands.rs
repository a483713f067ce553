use std::collections::BTreeSet;

use anyhow::{anyhow, bail, Context as _, Result};
use contabilidad::breakdown::{self, Order, SortKey};
use contabilidad::dates::{self, format_date};
use contabilidad::edit::EditSession;
use contabilidad::pending::{self, PendingOccurrence};
use contabilidad::{
    expense_kinds, parse_weekday, DailyMovement, ItemId, ItemKind, MovementsApi, NewTag,
    RecurringExpense, Schedule, SearchScope,
};
use time::{Date, Month};

use crate::cli::{Commands, EditArgs, FrequencyArg, Period, RecurringCommand, SortBy, TagCommand};
use crate::config::AppConfig;
use crate::output;
use crate::store::{
    load_dark_mode, toggle_dark_mode, DismissalLog, LocalStore, Notifications, RecurringRegistry,
};

pub struct Context {
    pub api: Box<dyn MovementsApi>,
    pub store: LocalStore,
    pub config: AppConfig,
    pub today: Date,
}

pub async fn run(command: Commands, ctx: &Context) -> Result<()> {
    match command {
        Commands::List { limit } => list(ctx, limit).await,
        Commands::Show { date } => show(ctx, parse_date_arg(&date)?).await,
        Commands::Edit(args) => edit(ctx, args).await,
        Commands::Delete { date } => delete_day(ctx, parse_date_arg(&date)?).await,
        Commands::Month { month } => month_summary(ctx, &month).await,
        Commands::Pending { today } => {
            let today = match today {
                Some(raw) => parse_date_arg(&raw)?,
                None => ctx.today,
            };
            show_pending(ctx, today).await
        }
        Commands::Record { label, date, all } => record(ctx, label, date, all).await,
        Commands::Dismiss { label, date, all } => dismiss(ctx, label, date, all).await,
        Commands::Recurring { command } => recurring(ctx, command),
        Commands::Kinds => kinds(ctx).await,
        Commands::Breakdown { period, sort, asc } => show_breakdown(ctx, period, sort, asc).await,
        Commands::Tags { command } => tags(ctx, command.unwrap_or(TagCommand::List)).await,
        Commands::Search {
            label,
            income,
            limit,
        } => search(ctx, &label, income, limit).await,
        Commands::Notifications { all, close } => notifications(ctx, all, close),
        Commands::Theme { toggle } => theme(ctx, toggle),
        Commands::ConfigPath => config_path(),
    }
}

pub fn config_path() -> Result<()> {
    let path = AppConfig::config_path()?;
    if !path.exists() {
        AppConfig::default().save()?;
        println!("Created default config at {}", path.display());
    }
    println!("{}", path.display());
    Ok(())
}

fn parse_date_arg(raw: &str) -> Result<Date> {
    dates::parse_date(raw).with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

fn parse_month_arg(raw: &str) -> Result<(i32, Month)> {
    let (year, month) = raw
        .trim()
        .split_once('-')
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", raw))?;
    let year: i32 = year
        .parse()
        .with_context(|| format!("Invalid year in '{}'", raw))?;
    let month: u8 = month
        .parse()
        .with_context(|| format!("Invalid month in '{}'", raw))?;
    let month = Month::try_from(month).with_context(|| format!("Invalid month in '{}'", raw))?;
    Ok((year, month))
}

fn parse_amount(raw: &str) -> Result<f64> {
    let amount: f64 = raw
        .trim()
        .replace(',', ".")
        .parse()
        .with_context(|| format!("Invalid amount '{}'", raw))?;
    Ok(amount)
}

/// `LABEL=AMOUNT`. The label may itself contain `=`.
fn parse_line(raw: &str) -> Result<(String, f64)> {
    let (label, amount) = raw
        .rsplit_once('=')
        .with_context(|| format!("Expected LABEL=AMOUNT, got '{}'", raw))?;
    Ok((label.trim().to_string(), parse_amount(amount)?))
}

/// `ID=LABEL=AMOUNT`
fn parse_update(raw: &str) -> Result<(ItemId, String, f64)> {
    let (id, rest) = raw
        .split_once('=')
        .with_context(|| format!("Expected ID=LABEL=AMOUNT, got '{}'", raw))?;
    let id = parse_item_id(id)?;
    let (label, amount) = parse_line(rest)?;
    Ok((id, label, amount))
}

fn parse_item_id(raw: &str) -> Result<ItemId> {
    raw.parse::<ItemId>().map_err(|e| anyhow!(e))
}

async fn load_movement(ctx: &Context, date: Date) -> Result<DailyMovement> {
    let movement = ctx
        .api
        .movement_on(date)
        .await
        .with_context(|| format!("Failed to load movement for {}", format_date(date)))?;
    Ok(movement.unwrap_or_else(|| DailyMovement::empty(date)))
}

async fn recent_movements(ctx: &Context, limit: Option<u32>) -> Result<Vec<DailyMovement>> {
    ctx.api
        .list_movements(limit.unwrap_or(ctx.config.movement_limit))
        .await
        .context("Failed to load movements")
}

async fn list(ctx: &Context, limit: Option<u32>) -> Result<()> {
    let movements = recent_movements(ctx, limit).await?;
    if movements.is_empty() {
        println!("No movements yet.");
        return Ok(());
    }
    for movement in &movements {
        output::movement_row(movement);
    }

    let active = Notifications::load(&ctx.store, ctx.today).active().len();
    if active > 0 {
        println!();
        println!(
            "{} new automatic expense notification(s), see `contabilidad notifications`",
            active
        );
    }
    Ok(())
}

async fn show(ctx: &Context, date: Date) -> Result<()> {
    let movement = load_movement(ctx, date).await?;
    if movement.id.is_none() {
        println!("Nothing recorded on {}.", format_date(date));
        return Ok(());
    }
    output::movement_detail(&movement);
    Ok(())
}

async fn edit(ctx: &Context, args: EditArgs) -> Result<()> {
    let date = parse_date_arg(&args.date)?;
    let mut session = EditSession::new(load_movement(ctx, date).await?);
    let api = ctx.api.as_ref();

    let deletes = args
        .delete_income
        .iter()
        .map(|id| (ItemKind::Income, id))
        .chain(args.delete_expense.iter().map(|id| (ItemKind::Expense, id)));
    for (kind, raw) in deletes {
        let id = parse_item_id(raw)?;
        let deleted = session
            .delete(api, kind, id)
            .await
            .with_context(|| format!("Failed to delete {} {}", kind, id))?;
        if deleted {
            println!("Deleted {} {}", kind, id);
        } else {
            println!("No {} with id {} on {}", kind, id, format_date(date));
        }
    }

    let updates = args
        .update_income
        .iter()
        .map(|raw| (ItemKind::Income, raw))
        .chain(args.update_expense.iter().map(|raw| (ItemKind::Expense, raw)));
    for (kind, raw) in updates {
        let (id, label, amount) = parse_update(raw)?;
        if !session.update(kind, id, &label, amount) {
            bail!("No {} with id {} on {}", kind, id, format_date(date));
        }
    }

    for raw in &args.add_income {
        let (label, amount) = parse_line(raw)?;
        session.add(ItemKind::Income, &label, amount);
    }
    for raw in &args.add_expense {
        let (label, amount) = parse_line(raw)?;
        session.add(ItemKind::Expense, &label, amount);
    }

    if let Some(raw) = &args.new_date {
        session.set_date(parse_date_arg(raw)?);
    }

    if !session.has_changes() {
        output::movement_detail(session.movement());
        return Ok(());
    }

    if let Err(errors) = session.movement().validate() {
        let problems: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        bail!("Movement not saved:\n  {}", problems.join("\n  "));
    }

    session.save(api).await.context("Failed to save movement")?;
    println!("Saved.");
    output::movement_detail(session.movement());
    Ok(())
}

async fn delete_day(ctx: &Context, date: Date) -> Result<()> {
    ctx.api
        .delete_movement(date)
        .await
        .with_context(|| format!("Failed to delete movement for {}", format_date(date)))?;
    println!("Deleted {}.", format_date(date));
    Ok(())
}

async fn month_summary(ctx: &Context, raw: &str) -> Result<()> {
    let (year, month) = parse_month_arg(raw)?;
    let rows = ctx
        .api
        .month_summary(year, month)
        .await
        .context("Failed to load month summary")?;

    println!("{}", contabilidad::format::month_label(year, month));
    if rows.is_empty() {
        println!("No movements.");
        return Ok(());
    }
    for row in &rows {
        output::summary_row(row);
    }

    let movements: Vec<DailyMovement> = recent_movements(ctx, None)
        .await?
        .into_iter()
        .filter(|m| m.date.year() == year && m.date.month() == month)
        .collect();
    for (kind, title) in [
        (ItemKind::Expense, "Top expenses"),
        (ItemKind::Income, "Top incomes"),
    ] {
        let top = breakdown::top_labels(&movements, kind, 5);
        if top.is_empty() {
            continue;
        }
        println!();
        println!("{}", title);
        for entry in top {
            println!(
                "  {:<30} {:>12}",
                entry.label,
                contabilidad::format::format_euro(entry.amount)
            );
        }
    }
    Ok(())
}

/// Movements on every date a definition can be due on this period. Fetched
/// per date because annual dates may lie beyond the recent listing.
async fn movements_for_detection(
    ctx: &Context,
    definitions: &[RecurringExpense],
    today: Date,
) -> Result<Vec<DailyMovement>> {
    let due_dates: BTreeSet<Date> = definitions
        .iter()
        .flat_map(|d| {
            pending::candidate_dates(&d.schedule, today)
                .into_iter()
                .filter(move |date| *date <= today && *date >= d.created_on)
        })
        .collect();

    let mut movements = Vec::with_capacity(due_dates.len());
    for date in due_dates {
        if let Some(movement) = ctx
            .api
            .movement_on(date)
            .await
            .with_context(|| format!("Failed to load movement for {}", format_date(date)))?
        {
            movements.push(movement);
        }
    }
    Ok(movements)
}

async fn detect_pending(ctx: &Context, today: Date) -> Result<Vec<PendingOccurrence>> {
    let registry = RecurringRegistry::load(&ctx.store);
    let dismissals = DismissalLog::load(&ctx.store);
    let movements = movements_for_detection(ctx, registry.all(), today).await?;
    Ok(pending::detect(
        registry.all(),
        &movements,
        &dismissals,
        today,
    ))
}

async fn show_pending(ctx: &Context, today: Date) -> Result<()> {
    let occurrences = detect_pending(ctx, today).await?;
    if occurrences.is_empty() {
        println!("Nothing pending.");
        return Ok(());
    }
    for occurrence in &occurrences {
        output::pending(occurrence);
    }
    Ok(())
}

/// Pending occurrences picked by `label` and `date`, or all of them.
async fn select_pending(
    ctx: &Context,
    label: Option<String>,
    date: Option<String>,
    all: bool,
) -> Result<Vec<PendingOccurrence>> {
    let occurrences = detect_pending(ctx, ctx.today).await?;
    if all {
        return Ok(occurrences);
    }

    let (Some(label), Some(date)) = (label, date) else {
        bail!("Give a label and a date, or --all");
    };
    let date = parse_date_arg(&date)?;
    let selected: Vec<PendingOccurrence> = occurrences
        .into_iter()
        .filter(|o| o.expense.label == label && o.expected_date == date)
        .collect();
    if selected.is_empty() {
        bail!(
            "No pending occurrence of '{}' on {}",
            label,
            format_date(date)
        );
    }
    Ok(selected)
}

async fn record(
    ctx: &Context,
    label: Option<String>,
    date: Option<String>,
    all: bool,
) -> Result<()> {
    let selected = select_pending(ctx, label, date, all).await?;
    let mut notifications = Notifications::load(&ctx.store, ctx.today);

    for occurrence in &selected {
        let expense = &occurrence.expense;
        let mut session = EditSession::new(load_movement(ctx, occurrence.expected_date).await?);
        session.add_recurring_expense(&expense.label, expense.amount);
        session.save(ctx.api.as_ref()).await.with_context(|| {
            format!(
                "Failed to record '{}' on {}",
                expense.label,
                format_date(occurrence.expected_date)
            )
        })?;

        notifications.add(
            &expense.label,
            expense.amount,
            occurrence.expected_date,
            ctx.today,
        );
        // Persist per occurrence so a later failure keeps the ones already recorded.
        notifications.save(&ctx.store)?;
        tracing::info!(label = %expense.label, date = %occurrence.expected_date, "recorded recurring expense");
        println!(
            "Recorded {} on {}",
            expense.label,
            format_date(occurrence.expected_date)
        );
    }

    if selected.is_empty() {
        println!("Nothing pending.");
    }
    Ok(())
}

async fn dismiss(
    ctx: &Context,
    label: Option<String>,
    date: Option<String>,
    all: bool,
) -> Result<()> {
    let selected = select_pending(ctx, label, date, all).await?;
    let mut dismissals = DismissalLog::load(&ctx.store);
    for occurrence in &selected {
        dismissals.add(
            &occurrence.expense.label,
            occurrence.expected_date,
            ctx.today,
        );
        println!(
            "Dismissed {} on {}",
            occurrence.expense.label,
            format_date(occurrence.expected_date)
        );
    }
    dismissals.save(&ctx.store)?;
    if selected.is_empty() {
        println!("Nothing pending.");
    }
    Ok(())
}

fn ensure_positive_amount(amount: f64) -> Result<()> {
    if !(amount.is_finite() && amount > 0.0) {
        bail!("A recurring expense needs a positive amount");
    }
    Ok(())
}

fn recurring(ctx: &Context, command: RecurringCommand) -> Result<()> {
    let mut registry = RecurringRegistry::load(&ctx.store);

    match command {
        RecurringCommand::List => {
            let dismissals = DismissalLog::load(&ctx.store);
            if registry.all().is_empty() {
                println!("No recurring expenses.");
            }
            for (index, expense) in registry.all().iter().enumerate() {
                output::recurring(index, expense, &dismissals.for_label(&expense.label));
            }
            if registry.unreadable() > 0 {
                println!(
                    "{} stored definition(s) could not be read and are left untouched.",
                    registry.unreadable()
                );
            }
            return Ok(());
        }
        RecurringCommand::Add {
            label,
            amount,
            frequency,
            day,
            weekday,
            on,
            since,
        } => {
            let schedule = match frequency {
                FrequencyArg::Monthly => {
                    Schedule::monthly(day.context("--day is required for monthly")?)?
                }
                FrequencyArg::Weekly => Schedule::weekly(parse_weekday(
                    weekday
                        .as_deref()
                        .context("--weekday is required for weekly")?,
                )?),
                FrequencyArg::Annual => {
                    Schedule::annual(on.as_deref().context("--on is required for annual")?)?
                }
            };
            let created_on = match since {
                Some(raw) => parse_date_arg(&raw)?,
                None => ctx.today,
            };
            if label.trim().is_empty() {
                bail!("A recurring expense needs a label");
            }
            ensure_positive_amount(amount)?;
            println!("Added {} ({})", label, schedule);
            registry.add(RecurringExpense::new(label, amount, schedule, created_on));
        }
        RecurringCommand::SetAmount { index, amount } => {
            ensure_positive_amount(amount)?;
            let mut expense = registry
                .all()
                .get(index)
                .cloned()
                .with_context(|| format!("No recurring expense at index {}", index))?;
            expense.amount = amount;
            registry.update(index, expense);
        }
        RecurringCommand::Remove { index } => {
            let removed = registry
                .remove(index)
                .with_context(|| format!("No recurring expense at index {}", index))?;
            if !registry.has_label(&removed.label) {
                let mut dismissals = DismissalLog::load(&ctx.store);
                if dismissals.clear_label(&removed.label) > 0 {
                    dismissals.save(&ctx.store)?;
                }
            }
            println!("Removed {}", removed.label);
        }
    }

    registry.save(&ctx.store)
}

async fn kinds(ctx: &Context) -> Result<()> {
    let movements = recent_movements(ctx, None).await?;
    let expenses: Vec<_> = movements
        .into_iter()
        .flat_map(|m| m.expenses)
        .collect();
    let registry = RecurringRegistry::load(&ctx.store);

    for kind in expense_kinds(&expenses, registry.all()) {
        output::expense_kind(&kind);
    }
    Ok(())
}

async fn show_breakdown(ctx: &Context, period: Period, sort: SortBy, asc: bool) -> Result<()> {
    let movements = recent_movements(ctx, None).await?;
    let key = match sort {
        SortBy::Date => SortKey::Date,
        SortBy::Gross => SortKey::Gross,
    };
    let order = if asc {
        Order::Ascending
    } else {
        Order::Descending
    };

    match period {
        Period::Monthly => {
            let mut months = breakdown::month_breakdowns(&movements);
            breakdown::sort_months(&mut months, key, order);
            for month in &months {
                output::month_breakdown(month);
            }
        }
        Period::Yearly => {
            let mut years = breakdown::year_breakdowns(&movements);
            breakdown::sort_years(&mut years, key, order);
            for year in &years {
                output::year_breakdown(year);
            }
        }
    }
    println!(
        "{} days with movements",
        breakdown::total_days_with_movements(&movements)
    );
    Ok(())
}

async fn tags(ctx: &Context, command: TagCommand) -> Result<()> {
    match command {
        TagCommand::List => {
            for tag in ctx.api.tags().await.context("Failed to load tags")? {
                output::tag(&tag);
            }
        }
        TagCommand::Add {
            name,
            income,
            essential,
        } => {
            let tag = NewTag {
                name,
                kind: if income {
                    ItemKind::Income
                } else {
                    ItemKind::Expense
                },
                predefined: false,
                essential,
            };
            let created = ctx
                .api
                .create_tag(&tag)
                .await
                .context("Failed to create tag")?;
            output::tag(&created);
        }
        TagCommand::Rename { id, name } => {
            let existing = ctx
                .api
                .tags()
                .await
                .context("Failed to load tags")?
                .into_iter()
                .find(|t| t.id == id)
                .with_context(|| format!("No tag with id {}", id))?;
            let tag = NewTag {
                name,
                kind: existing.kind,
                predefined: existing.predefined,
                essential: existing.essential,
            };
            let updated = ctx
                .api
                .update_tag(id, &tag)
                .await
                .context("Failed to update tag")?;
            output::tag(&updated);
        }
        TagCommand::Remove { id } => {
            ctx.api
                .delete_tag(id)
                .await
                .with_context(|| format!("Failed to delete tag {}", id))?;
            println!("Deleted tag {}", id);
        }
    }
    Ok(())
}

async fn search(ctx: &Context, label: &str, income: bool, limit: u32) -> Result<()> {
    let scope = if income {
        SearchScope::Incomes
    } else {
        SearchScope::Expenses
    };
    let hits = ctx
        .api
        .search_by_label(label, scope, limit)
        .await
        .context("Search failed")?;
    if hits.is_empty() {
        println!("No matches for '{}'.", label);
    }
    for hit in &hits {
        output::search_hit(hit);
    }
    Ok(())
}

fn notifications(ctx: &Context, all: bool, close: Option<String>) -> Result<()> {
    let mut notifications = Notifications::load(&ctx.store, ctx.today);

    if let Some(id) = close {
        if !notifications.mark_shown(&id) {
            bail!("No notification with id {}", id);
        }
        notifications.save(&ctx.store)?;
        return Ok(());
    }

    let listed = if all {
        notifications.recent(ctx.today)
    } else {
        notifications.active()
    };
    if listed.is_empty() {
        println!("No notifications.");
    }
    for notification in listed {
        output::notification(notification);
    }
    Ok(())
}

fn theme(ctx: &Context, toggle: bool) -> Result<()> {
    let dark = if toggle {
        toggle_dark_mode(&ctx.store)?
    } else {
        load_dark_mode(&ctx.store)
    };
    println!("{}", if dark { "dark" } else { "light" });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contabilidad::dev_backend::DevBackend;
    use time::macros::date;

    fn context(dir: &tempfile::TempDir, api: DevBackend, today: Date) -> Context {
        Context {
            api: Box::new(api),
            store: LocalStore::new(dir.path()),
            config: AppConfig::default(),
            today,
        }
    }

    #[test]
    fn parses_line_arguments() {
        assert_eq!(parse_line("Pan=1,20").unwrap(), ("Pan".to_string(), 1.2));
        assert_eq!(parse_line("a=b=3").unwrap(), ("a=b".to_string(), 3.0));
        assert!(parse_line("Pan").is_err());
        assert!(parse_line("Pan=x").is_err());

        let (id, label, amount) = parse_update("12=Luz=40.5").unwrap();
        assert_eq!(id, ItemId::Remote(12));
        assert_eq!(label, "Luz");
        assert_eq!(amount, 40.5);
        assert!(parse_update("abc=Luz=1").is_err());
    }

    #[test]
    fn parses_month_arguments() {
        assert_eq!(parse_month_arg("2024-03").unwrap(), (2024, Month::March));
        assert!(parse_month_arg("2024-13").is_err());
        assert!(parse_month_arg("marzo").is_err());
    }

    #[tokio::test]
    async fn recording_clears_the_pending_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let today = date!(2024 - 03 - 20);
        let ctx = context(&dir, DevBackend::new(), today);
        let mut registry = RecurringRegistry::default();
        registry.add(RecurringExpense::new(
            "Alquiler",
            700.0,
            Schedule::monthly(15).unwrap(),
            date!(2024 - 01 - 01),
        ));
        registry.save(&ctx.store).unwrap();

        assert_eq!(detect_pending(&ctx, today).await.unwrap().len(), 1);

        record(&ctx, Some("Alquiler".into()), Some("2024-03-15".into()), false)
            .await
            .unwrap();

        assert!(detect_pending(&ctx, today).await.unwrap().is_empty());
        let saved = ctx
            .api
            .movement_on(date!(2024 - 03 - 15))
            .await
            .unwrap()
            .unwrap();
        assert!(saved.has_recurring_expense("Alquiler"));
        assert_eq!(Notifications::load(&ctx.store, today).active().len(), 1);
    }

    #[tokio::test]
    async fn dismissing_hides_the_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let today = date!(2024 - 03 - 20);
        let ctx = context(&dir, DevBackend::new(), today);
        let mut registry = RecurringRegistry::default();
        registry.add(RecurringExpense::new(
            "Luz",
            40.0,
            Schedule::monthly(10).unwrap(),
            date!(2024 - 01 - 01),
        ));
        registry.save(&ctx.store).unwrap();

        dismiss(&ctx, None, None, true).await.unwrap();

        assert!(detect_pending(&ctx, today).await.unwrap().is_empty());
        assert!(DismissalLog::load(&ctx.store)
            .find("Luz", date!(2024 - 03 - 10))
            .is_some());
    }

    #[tokio::test]
    async fn failed_record_keeps_notifications_for_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let today = date!(2024 - 03 - 20);
        let api = DevBackend::new();
        api.fail_saves_after(1);
        let ctx = context(&dir, api, today);
        let mut registry = RecurringRegistry::default();
        registry.add(RecurringExpense::new(
            "Alquiler",
            700.0,
            Schedule::monthly(1).unwrap(),
            date!(2024 - 01 - 01),
        ));
        registry.add(RecurringExpense::new(
            "Luz",
            40.0,
            Schedule::monthly(10).unwrap(),
            date!(2024 - 01 - 01),
        ));
        registry.save(&ctx.store).unwrap();

        let result = record(&ctx, None, None, true).await;

        assert!(result.is_err());
        let notifications = Notifications::load(&ctx.store, today);
        let active = notifications.active();
        let labels: Vec<&str> = active.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["Alquiler"]);
    }

    #[test]
    fn set_amount_rejects_non_positive_amounts() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir, DevBackend::new(), date!(2024 - 03 - 20));
        let mut registry = RecurringRegistry::default();
        registry.add(RecurringExpense::new(
            "Luz",
            40.0,
            Schedule::monthly(10).unwrap(),
            date!(2024 - 01 - 01),
        ));
        registry.save(&ctx.store).unwrap();

        for amount in [0.0, -5.0, f64::NAN] {
            let result = recurring(&ctx, RecurringCommand::SetAmount { index: 0, amount });
            assert!(result.is_err());
        }
        recurring(&ctx, RecurringCommand::SetAmount { index: 0, amount: 42.5 }).unwrap();

        assert_eq!(RecurringRegistry::load(&ctx.store).all()[0].amount, 42.5);
    }

    #[tokio::test]
    async fn recording_an_unknown_occurrence_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir, DevBackend::new(), date!(2024 - 03 - 20));

        let result = record(&ctx, Some("Luz".into()), Some("2024-03-10".into()), false).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn removing_a_definition_forgets_its_dismissals() {
        let dir = tempfile::tempdir().unwrap();
        let today = date!(2024 - 03 - 20);
        let ctx = context(&dir, DevBackend::new(), today);
        let mut registry = RecurringRegistry::default();
        registry.add(RecurringExpense::new(
            "Luz",
            40.0,
            Schedule::monthly(10).unwrap(),
            date!(2024 - 01 - 01),
        ));
        registry.save(&ctx.store).unwrap();
        let mut dismissals = DismissalLog::default();
        dismissals.add("Luz", date!(2024 - 03 - 10), today);
        dismissals.save(&ctx.store).unwrap();

        recurring(&ctx, RecurringCommand::Remove { index: 0 }).unwrap();

        assert!(RecurringRegistry::load(&ctx.store).all().is_empty());
        assert!(DismissalLog::load(&ctx.store).for_label("Luz").is_empty());
    }

    #[tokio::test]
    async fn edit_applies_every_operation_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let today = date!(2024 - 03 - 20);
        let api = DevBackend::seeded(today);
        let before = api.movement_on(today).await.unwrap().unwrap();
        let coffee = before.expenses[0].id;
        let ctx = context(&dir, api, today);

        edit(
            &ctx,
            EditArgs {
                date: "2024-03-20".to_string(),
                add_income: vec!["Bizum=15".to_string()],
                add_expense: vec!["Pan=1,10".to_string()],
                update_income: vec![],
                update_expense: vec![],
                delete_income: vec![],
                delete_expense: vec![coffee.to_string()],
                new_date: None,
            },
        )
        .await
        .unwrap();

        let after = ctx.api.movement_on(today).await.unwrap().unwrap();
        assert_eq!(after.income_total(), 15.0);
        assert_eq!(after.expense_total(), 1.1);
        assert!(!after.contains(ItemKind::Expense, coffee));
    }

    #[tokio::test]
    async fn edit_refuses_invalid_lines() {
        let dir = tempfile::tempdir().unwrap();
        let today = date!(2024 - 03 - 20);
        let ctx = context(&dir, DevBackend::new(), today);

        let result = edit(
            &ctx,
            EditArgs {
                date: "2024-03-20".to_string(),
                add_income: vec![],
                add_expense: vec!["Pan=0".to_string()],
                update_income: vec![],
                update_expense: vec![],
                delete_income: vec![],
                delete_expense: vec![],
                new_date: None,
            },
        )
        .await;

        assert!(result.is_err());
        assert!(ctx.api.movement_on(today).await.unwrap().is_none());
    }
}
