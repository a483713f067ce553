use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Date, Month, Weekday};

use crate::dates::{self, iso_date};
use crate::domain::Expense;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "mensual")]
    Monthly,
    #[serde(rename = "semanal")]
    Weekly,
    #[serde(rename = "anual")]
    Annual,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Monthly => f.write_str("monthly"),
            Frequency::Weekly => f.write_str("weekly"),
            Frequency::Annual => f.write_str("annual"),
        }
    }
}

/// When a recurring expense falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Monthly { day: u8 },
    Weekly { weekday: Weekday },
    Annual { month: Month, day: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("day of month must be between 1 and 31, got {0}")]
    InvalidDayOfMonth(u8),
    #[error("unknown weekday: {0}")]
    UnknownWeekday(String),
    #[error("annual date must be MM-DD, got {0}")]
    InvalidAnnualDate(String),
    #[error("{frequency} schedule is missing {field}")]
    MissingField {
        frequency: Frequency,
        field: &'static str,
    },
}

impl Schedule {
    pub fn monthly(day: u8) -> Result<Self, ScheduleError> {
        if (1..=31).contains(&day) {
            Ok(Schedule::Monthly { day })
        } else {
            Err(ScheduleError::InvalidDayOfMonth(day))
        }
    }

    pub fn weekly(weekday: Weekday) -> Self {
        Schedule::Weekly { weekday }
    }

    /// Parses an `MM-DD` annual date. `02-29` is accepted and only falls
    /// due in leap years.
    pub fn annual(raw: &str) -> Result<Self, ScheduleError> {
        let invalid = || ScheduleError::InvalidAnnualDate(raw.to_string());
        let (month, day) = raw.trim().split_once('-').ok_or_else(invalid)?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let day: u8 = day.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;
        // 2024 is a leap year, so this bounds-checks against the longest
        // possible month.
        if day == 0 || day > dates::days_in_month(2024, month) {
            return Err(invalid());
        }
        Ok(Schedule::Annual { month, day })
    }

    pub fn frequency(&self) -> Frequency {
        match self {
            Schedule::Monthly { .. } => Frequency::Monthly,
            Schedule::Weekly { .. } => Frequency::Weekly,
            Schedule::Annual { .. } => Frequency::Annual,
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Monthly { day } => write!(f, "monthly on day {}", day),
            Schedule::Weekly { weekday } => write!(f, "weekly on {}", weekday),
            Schedule::Annual { month, day } => {
                write!(f, "yearly on {:02}-{:02}", *month as u8, day)
            }
        }
    }
}

/// Parses a weekday name as stored by the web client (`lunes` .. `domingo`,
/// accents optional). English names are accepted too.
pub fn parse_weekday(raw: &str) -> Result<Weekday, ScheduleError> {
    let weekday = match raw.trim().to_lowercase().as_str() {
        "lunes" | "monday" => Weekday::Monday,
        "martes" | "tuesday" => Weekday::Tuesday,
        "miercoles" | "miércoles" | "wednesday" => Weekday::Wednesday,
        "jueves" | "thursday" => Weekday::Thursday,
        "viernes" | "friday" => Weekday::Friday,
        "sabado" | "sábado" | "saturday" => Weekday::Saturday,
        "domingo" | "sunday" => Weekday::Sunday,
        _ => return Err(ScheduleError::UnknownWeekday(raw.to_string())),
    };
    Ok(weekday)
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "lunes",
        Weekday::Tuesday => "martes",
        Weekday::Wednesday => "miercoles",
        Weekday::Thursday => "jueves",
        Weekday::Friday => "viernes",
        Weekday::Saturday => "sabado",
        Weekday::Sunday => "domingo",
    }
}

/// Template for an expense that is expected to repeat on a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecurringExpenseRecord", into = "RecurringExpenseRecord")]
pub struct RecurringExpense {
    pub label: String,
    pub amount: f64,
    pub schedule: Schedule,
    /// Occurrences before this date are never reported as pending.
    pub created_on: Date,
}

impl RecurringExpense {
    pub fn new(
        label: impl Into<String>,
        amount: f64,
        schedule: Schedule,
        created_on: Date,
    ) -> Self {
        Self {
            label: label.into(),
            amount,
            schedule,
            created_on,
        }
    }
}

/// Persisted shape of a recurring expense, the one the web client kept in
/// browser storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecurringExpenseRecord {
    etiqueta: String,
    monto: f64,
    frecuencia: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dia_mes: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dia_semana: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fecha_anual: Option<String>,
    #[serde(default, with = "iso_date::option")]
    fecha_creacion: Option<Date>,
}

impl TryFrom<RecurringExpenseRecord> for RecurringExpense {
    type Error = ScheduleError;

    fn try_from(record: RecurringExpenseRecord) -> Result<Self, Self::Error> {
        let schedule = match record.frecuencia {
            Frequency::Monthly => {
                let day = record.dia_mes.ok_or(ScheduleError::MissingField {
                    frequency: Frequency::Monthly,
                    field: "diaMes",
                })?;
                Schedule::monthly(day)?
            }
            Frequency::Weekly => {
                let name = record.dia_semana.ok_or(ScheduleError::MissingField {
                    frequency: Frequency::Weekly,
                    field: "diaSemana",
                })?;
                Schedule::weekly(parse_weekday(&name)?)
            }
            Frequency::Annual => {
                let raw = record.fecha_anual.ok_or(ScheduleError::MissingField {
                    frequency: Frequency::Annual,
                    field: "fechaAnual",
                })?;
                Schedule::annual(&raw)?
            }
        };

        Ok(RecurringExpense {
            label: record.etiqueta,
            amount: record.monto,
            schedule,
            created_on: record.fecha_creacion.unwrap_or_else(dates::today),
        })
    }
}

impl From<RecurringExpense> for RecurringExpenseRecord {
    fn from(expense: RecurringExpense) -> Self {
        let (dia_mes, dia_semana, fecha_anual) = match expense.schedule {
            Schedule::Monthly { day } => (Some(day), None, None),
            Schedule::Weekly { weekday } => (None, Some(weekday_name(weekday).to_string()), None),
            Schedule::Annual { month, day } => {
                (None, None, Some(format!("{:02}-{:02}", month as u8, day)))
            }
        };

        RecurringExpenseRecord {
            etiqueta: expense.label,
            monto: expense.amount,
            frecuencia: expense.schedule.frequency(),
            dia_mes,
            dia_semana,
            fecha_anual,
            fecha_creacion: Some(expense.created_on),
        }
    }
}

/// How an expense label is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Cadence {
    Monthly,
    Weekly,
    Annual,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseKind {
    pub label: String,
    pub cadence: Cadence,
}

/// Every distinct expense label, from recorded expenses and recurring
/// definitions, classified by how it is paid. Ordered monthly, weekly,
/// annual, manual; first-seen order within each group.
pub fn expense_kinds(expenses: &[Expense], definitions: &[RecurringExpense]) -> Vec<ExpenseKind> {
    let mut labels: Vec<&str> = Vec::new();
    let candidates = expenses
        .iter()
        .map(|e| e.label.as_str())
        .chain(definitions.iter().map(|d| d.label.as_str()));
    for label in candidates {
        if !label.is_empty() && !labels.contains(&label) {
            labels.push(label);
        }
    }

    let mut kinds: Vec<ExpenseKind> = labels
        .into_iter()
        .map(|label| {
            let cadence = definitions
                .iter()
                .find(|d| d.label == label)
                .map(|d| match d.schedule.frequency() {
                    Frequency::Monthly => Cadence::Monthly,
                    Frequency::Weekly => Cadence::Weekly,
                    Frequency::Annual => Cadence::Annual,
                })
                .unwrap_or(Cadence::Manual);
            ExpenseKind {
                label: label.to_string(),
                cadence,
            }
        })
        .collect();

    kinds.sort_by_key(|k| k.cadence);
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemId;
    use time::macros::date;

    #[test]
    fn reads_web_client_records() {
        let raw = r#"[
            {"etiqueta": "Alquiler", "monto": 700, "frecuencia": "mensual", "diaMes": 1, "fechaCreacion": "2024-01-01"},
            {"etiqueta": "Gimnasio", "monto": 10.5, "frecuencia": "semanal", "diaSemana": "miercoles", "fechaCreacion": "2024-01-01"},
            {"etiqueta": "Seguro", "monto": 300, "frecuencia": "anual", "fechaAnual": "03-15", "fechaCreacion": "2023-06-01"}
        ]"#;
        let parsed: Vec<RecurringExpense> = serde_json::from_str(raw).unwrap();

        assert_eq!(parsed[0].schedule, Schedule::Monthly { day: 1 });
        assert_eq!(
            parsed[1].schedule,
            Schedule::Weekly {
                weekday: Weekday::Wednesday
            }
        );
        assert_eq!(
            parsed[2].schedule,
            Schedule::Annual {
                month: Month::March,
                day: 15
            }
        );
        assert_eq!(parsed[2].created_on, date!(2023 - 06 - 01));
    }

    #[test]
    fn writes_web_client_records() {
        let expense = RecurringExpense::new(
            "Gimnasio",
            10.5,
            Schedule::weekly(Weekday::Saturday),
            date!(2024 - 01 - 01),
        );
        let value = serde_json::to_value(&expense).unwrap();
        assert_eq!(value["frecuencia"], "semanal");
        assert_eq!(value["diaSemana"], "sabado");
        assert_eq!(value["fechaCreacion"], "2024-01-01");
        assert!(value.get("diaMes").is_none());
    }

    #[test]
    fn rejects_invalid_schedules() {
        assert_eq!(Schedule::monthly(0), Err(ScheduleError::InvalidDayOfMonth(0)));
        assert_eq!(Schedule::monthly(32), Err(ScheduleError::InvalidDayOfMonth(32)));
        assert!(Schedule::annual("13-01").is_err());
        assert!(Schedule::annual("04-31").is_err());
        assert!(Schedule::annual("0315").is_err());
        assert!(Schedule::annual("02-29").is_ok());
        assert!(parse_weekday("funday").is_err());

        let missing = r#"{"etiqueta": "Luz", "monto": 40, "frecuencia": "mensual"}"#;
        assert!(serde_json::from_str::<RecurringExpense>(missing).is_err());
    }

    #[test]
    fn missing_creation_date_reads_as_today() {
        let raw = r#"{"etiqueta": "Luz", "monto": 40, "frecuencia": "mensual", "diaMes": 5}"#;
        let parsed: RecurringExpense = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.created_on, dates::today());
    }

    #[test]
    fn expense_kinds_group_by_cadence() {
        let expenses = vec![
            Expense {
                id: ItemId::Remote(1),
                label: "Café".to_string(),
                amount: 2.0,
                is_recurring: false,
            },
            Expense {
                id: ItemId::Remote(2),
                label: "Alquiler".to_string(),
                amount: 700.0,
                is_recurring: true,
            },
        ];
        let definitions = vec![
            RecurringExpense::new("Seguro", 300.0, Schedule::annual("03-15").unwrap(), date!(2024 - 01 - 01)),
            RecurringExpense::new("Alquiler", 700.0, Schedule::monthly(1).unwrap(), date!(2024 - 01 - 01)),
        ];

        let kinds = expense_kinds(&expenses, &definitions);
        let summary: Vec<(&str, Cadence)> =
            kinds.iter().map(|k| (k.label.as_str(), k.cadence)).collect();
        assert_eq!(
            summary,
            vec![
                ("Alquiler", Cadence::Monthly),
                ("Seguro", Cadence::Annual),
                ("Café", Cadence::Manual),
            ]
        );
    }
}
