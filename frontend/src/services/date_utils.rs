use chrono::{NaiveDate, Utc};
use shared::CalendarDay;

/// Today's date as the backend sees it (UTC+5:30)
pub fn today() -> CalendarDay {
    CalendarDay::from_instant(Utc::now())
}

/// Parse a typed date: `DD/MM/YYYY` as sent to the backend, or ISO `YYYY-MM-DD`
pub fn parse_date_input(input: &str) -> Option<CalendarDay> {
    let input = input.trim();
    if let Ok(day) = input.parse::<CalendarDay>() {
        return Some(day);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .map(CalendarDay::from)
}
