//! Text rendering of amounts and months, in Spanish.

use time::Month;

const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Formats an amount in euros with a decimal comma and `.` thousands
/// separators: `1.234,50€`.
pub fn format_euro(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let units = (cents / 100).to_string();

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{}{},{:02}€", sign, grouped, cents % 100)
}

pub fn month_name(month: Month) -> &'static str {
    MONTH_NAMES[month as usize - 1]
}

/// `marzo de 2024`
pub fn month_label(year: i32, month: Month) -> String {
    format!("{} de {}", month_name(month), year)
}
