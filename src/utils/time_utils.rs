use chrono::{DateTime, Months, Utc};

pub struct TimeUtils;

impl TimeUtils {
    pub const S_IN_MIN: i64 = 60;
    pub const S_IN_H: i64 = Self::S_IN_MIN * 60;
    pub const S_IN_D: i64 = Self::S_IN_H * 24;
    pub const MS_IN_S: i64 = 1000;
    pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d";
}

/// Whole days between `epoch_sec` and `now_sec`, truncated toward zero.
/// A timestamp less than a day in the future counts as day 0.
pub fn whole_days_between(epoch_sec: i64, now_sec: i64) -> i64 {
    (now_sec - epoch_sec) / TimeUtils::S_IN_D
}

pub fn epoch_ms_to_sec(epoch_ms: i64) -> i64 {
    epoch_ms / TimeUtils::MS_IN_S
}

pub fn epoch_sec_to_utc(epoch_sec: i64) -> String {
    // Used for display purposes
    match DateTime::from_timestamp(epoch_sec, 0) {
        Some(dt) => dt.format(TimeUtils::STANDARD_TIME_FORMAT).to_string(),
        None => String::new(),
    }
}

/// `now` minus `months` calendar months, clamped to the epoch if it underflows.
/// A day missing from the target month clamps to that month's last day
/// (31 Jul - 5 months = 29 Feb), keeping the window inside the requested months.
pub fn months_before(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
