//! Text formatting for invoice fields.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Placeholder printed for any missing value.
pub const MISSING: &str = "-";

/// Formats a date as `DD Month, YYYY`, e.g. `01 February, 2024`.
#[must_use]
pub fn date(value: NaiveDate) -> String {
    value.format("%d %B, %Y").to_string()
}

/// Formats an amount with the currency symbol and two decimals.
#[must_use]
pub fn money(symbol: &str, amount: Decimal) -> String {
    format!("{symbol}{:.2}", amount.round_dp(2))
}

/// Returns the trimmed text, or [`MISSING`] when absent or blank.
#[must_use]
pub fn text_or_missing(value: Option<&str>) -> String {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(MISSING).to_owned()
}
