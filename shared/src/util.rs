//! Date/time formatting shared by the ledger and spreadsheets

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};

/// Production date format (YYYY-MM-DD)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Print timestamp format (YYYY-MM-DD HH:MM:SS)
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 当前本地时间 (精确到秒)
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// 今天 (本地时区)
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Parse a YYYY-MM-DD string
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}
