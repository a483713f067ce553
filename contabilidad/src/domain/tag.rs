use serde::{Deserialize, Serialize};
use time::Date;

use crate::dates::iso_date;
use crate::domain::ItemKind;

/// A label that incomes or expenses can be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "tipo")]
    pub kind: ItemKind,
    #[serde(rename = "es_predefinida", default)]
    pub predefined: bool,
    #[serde(rename = "es_esencial", default)]
    pub essential: bool,
}

/// Body for creating or updating a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTag {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "tipo")]
    pub kind: ItemKind,
    #[serde(rename = "es_predefinida")]
    pub predefined: bool,
    #[serde(rename = "es_esencial")]
    pub essential: bool,
}

/// Which side of the ledger a label search looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchScope {
    #[serde(rename = "gastos")]
    Expenses,
    #[serde(rename = "ingresos")]
    Incomes,
}

impl SearchScope {
    pub fn as_query(self) -> &'static str {
        match self {
            SearchScope::Expenses => "gastos",
            SearchScope::Incomes => "ingresos",
        }
    }
}

/// One line matched by a label search, with that day's income total.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TagSearchHit {
    #[serde(rename = "fecha", with = "iso_date")]
    pub date: Date,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "etiqueta")]
    pub label: String,
    #[serde(rename = "ingreso_dia", default)]
    pub day_income: f64,
    #[serde(rename = "tipo")]
    pub scope: SearchScope,
}

/// Per-day row of the backend's month summary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonthSummaryRow {
    #[serde(rename = "fecha", with = "iso_date")]
    pub date: Date,
    #[serde(rename = "ingreso_total")]
    pub income_total: f64,
    #[serde(rename = "total_gastos")]
    pub expense_total: f64,
    pub balance: f64,
    #[serde(rename = "cantidad_ingresos")]
    pub income_count: u32,
    #[serde(rename = "cantidad_gastos")]
    pub expense_count: u32,
}
