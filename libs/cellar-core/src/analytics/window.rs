use crate::domain::money;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use rust_decimal::Decimal;

/// First instant of the calendar month containing `now`, in UTC.
///
/// Every month-windowed aggregate goes through here; callers pass the clock in.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// Time range an aggregate covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    AllTime,
    /// The calendar month containing the instant.
    MonthOf(DateTime<Utc>),
}

impl Window {
    pub fn since(&self) -> Option<DateTime<Utc>> {
        match self {
            Window::AllTime => None,
            Window::MonthOf(as_of) => Some(month_start(*as_of)),
        }
    }
}

/// `total / restaurant_count` at two decimals, or zero when there are no restaurants.
pub fn average_per_restaurant(total: Decimal, restaurant_count: i64) -> Decimal {
    if restaurant_count <= 0 {
        return money(Decimal::ZERO);
    }
    money(total / Decimal::from(restaurant_count))
}
