// Declare domain modules
pub mod admin_user;
pub mod menu_view;
pub mod restaurant;
pub mod sale;
pub mod wine;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// Scale used for every monetary amount (prices, sale totals, revenue sums).
pub const MONEY_SCALE: u32 = 2;

/// Largest unit price a wine or sale may carry: 99,999,999.99 (`NUMERIC(10,2)`).
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, MONEY_SCALE);

/// Largest sale total: 9,999,999,999.99 (`NUMERIC(12,2)`).
pub const MAX_TOTAL: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, MONEY_SCALE);

/// Bottles per sale line.
pub const MAX_SALE_QUANTITY: i32 = 9_999;

/// Bottles held for a single wine.
pub const MAX_STOCK: i32 = 1_000_000;

/// Normalizes a monetary amount to two decimal places.
///
/// Amounts with more precision are rounded (banker's rounding, as
/// `rust_decimal` does by default); amounts with less are padded so that
/// `450` and `450.00` serialize identically.
pub fn money(amount: Decimal) -> Decimal {
    let mut normalized = amount.round_dp(MONEY_SCALE);
    normalized.rescale(MONEY_SCALE);
    normalized
}

/// Returns `None` for missing, blank, or `"all"` filter values.
pub(crate) fn filter_value(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

/// Trims optional free text and drops it when empty.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Lets a `Option<Option<T>>` field tell an explicit `null` (`Some(None)`)
/// apart from an absent key (`None`). Pair with `#[serde(default)]`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn parse_instant(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{raw}', expected YYYY-MM-DD or RFC 3339"))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        Some(NaiveTime::MIN)
    };
    time.map(|t| date.and_time(t).and_utc())
        .ok_or_else(|| format!("invalid date '{raw}'"))
}

/// Deserializes an optional lower date bound. A bare date means midnight UTC.
pub fn deserialize_start_bound<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_instant(s, false)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Deserializes an optional inclusive upper date bound. A bare date covers the whole day.
pub fn deserialize_end_bound<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_instant(s, true)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

/// Deserializes an optional id given as a number or a query-string value.
/// A blank value means absent.
pub fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(id)) => Ok(Some(id)),
        Some(RawId::Text(raw)) => match raw.trim() {
            "" => Ok(None),
            s => s
                .parse::<i64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid id '{s}'"))),
        },
    }
}
