//! Wire shapes of the movements endpoints. Kept apart from the domain types
//! because the backend's fields are Spanish, ids are bare integers and the
//! totals it sends are ignored.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::dates::iso_date;
use crate::domain::{DailyMovement, Expense, Income, ItemId};

#[derive(Debug, Deserialize)]
pub(crate) struct MovementDto {
    pub id: i64,
    #[serde(with = "iso_date")]
    pub fecha: Date,
    #[serde(default)]
    pub ingresos: Vec<IncomeDto>,
    #[serde(default)]
    pub gastos: Vec<ExpenseDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IncomeDto {
    pub id: i64,
    pub etiqueta: String,
    pub monto: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExpenseDto {
    pub id: i64,
    pub etiqueta: String,
    pub monto: f64,
    #[serde(default)]
    pub es_recurrente: Option<bool>,
}

impl From<MovementDto> for DailyMovement {
    fn from(dto: MovementDto) -> Self {
        DailyMovement {
            id: Some(dto.id),
            date: dto.fecha,
            incomes: dto
                .ingresos
                .into_iter()
                .map(|i| Income {
                    id: ItemId::Remote(i.id),
                    label: i.etiqueta,
                    amount: i.monto,
                })
                .collect(),
            expenses: dto
                .gastos
                .into_iter()
                .map(|e| Expense {
                    id: ItemId::Remote(e.id),
                    label: e.etiqueta,
                    amount: e.monto,
                    is_recurring: e.es_recurrente.unwrap_or(false),
                })
                .collect(),
        }
    }
}

/// Body of `POST /api/movimientos/`. The backend creates or updates the day
/// and keeps lines whose id it recognises.
#[derive(Debug, Serialize)]
pub(crate) struct MovementUpsert<'a> {
    #[serde(with = "iso_date")]
    pub fecha: Date,
    pub ingresos: Vec<IncomeUpsert<'a>>,
    pub gastos: Vec<ExpenseUpsert<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct IncomeUpsert<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub etiqueta: &'a str,
    pub monto: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExpenseUpsert<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub etiqueta: &'a str,
    pub monto: f64,
    pub es_recurrente: bool,
}

impl<'a> From<&'a DailyMovement> for MovementUpsert<'a> {
    fn from(movement: &'a DailyMovement) -> Self {
        MovementUpsert {
            fecha: movement.date,
            ingresos: movement
                .incomes
                .iter()
                .map(|i| IncomeUpsert {
                    id: i.id.remote(),
                    etiqueta: &i.label,
                    monto: i.amount,
                })
                .collect(),
            gastos: movement
                .expenses
                .iter()
                .map(|e| ExpenseUpsert {
                    id: e.id.remote(),
                    etiqueta: &e.label,
                    monto: e.amount,
                    es_recurrente: e.is_recurring,
                })
                .collect(),
        }
    }
}

/// FastAPI error body. `detail` is a string for handled errors and a list
/// of problems for validation failures.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn ignores_server_totals() {
        let raw = r#"{
            "id": 9, "fecha": "2024-03-15",
            "ingreso_total": 999, "total_gastos": 999, "balance": 999,
            "ingresos": [{"id": 1, "etiqueta": "Nómina", "monto": 100, "fecha": "2024-03-15", "created_at": "2024-03-15T08:00:00"}],
            "gastos": [
                {"id": 2, "etiqueta": "Alquiler", "monto": 40, "es_recurrente": true, "recurrente_id": null},
                {"id": 3, "etiqueta": "Pan", "monto": 1.5, "es_recurrente": null}
            ]
        }"#;
        let movement: DailyMovement = serde_json::from_str::<MovementDto>(raw).unwrap().into();

        assert_eq!(movement.id, Some(9));
        assert_eq!(movement.date, date!(2024 - 03 - 15));
        assert_eq!(movement.income_total(), 100.0);
        assert_eq!(movement.expense_total(), 41.5);
        assert!(movement.expenses[0].is_recurring);
        assert!(!movement.expenses[1].is_recurring);
    }

    #[test]
    fn local_ids_are_not_sent() {
        let movement = DailyMovement {
            id: Some(9),
            date: date!(2024 - 03 - 15),
            incomes: vec![Income {
                id: ItemId::Local(1),
                label: "Venta".to_string(),
                amount: 20.0,
            }],
            expenses: vec![Expense {
                id: ItemId::Remote(5),
                label: "Luz".to_string(),
                amount: 30.0,
                is_recurring: true,
            }],
        };
        let body = serde_json::to_value(MovementUpsert::from(&movement)).unwrap();

        assert_eq!(body["fecha"], "2024-03-15");
        assert!(body["ingresos"][0].get("id").is_none());
        assert_eq!(body["gastos"][0]["id"], 5);
        assert_eq!(body["gastos"][0]["es_recurrente"], true);
    }

    #[test]
    fn error_detail_may_be_structured() {
        let plain: ErrorBody = serde_json::from_str(r#"{"detail": "Gasto no encontrado"}"#).unwrap();
        assert_eq!(plain.message(), "Gasto no encontrado");

        let listed: ErrorBody =
            serde_json::from_str(r#"{"detail": [{"msg": "field required"}]}"#).unwrap();
        assert!(listed.message().contains("field required"));
    }
}
