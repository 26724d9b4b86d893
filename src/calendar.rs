//! calendar arithmetic on plain dates
use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::errors::{Result, ScheduleError};
use crate::types::PeriodUnit;

/// add months, clamping to the end of shorter months (Jan 31 + 1 = Feb 28/29)
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| out_of_range(date))
}

pub fn add_weeks(date: NaiveDate, weeks: u32) -> Result<NaiveDate> {
    date.checked_add_signed(Duration::weeks(weeks as i64))
        .ok_or_else(|| out_of_range(date))
}

pub fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
        .ok_or_else(|| out_of_range(date))
}

/// advance by `count` period units
pub fn advance(date: NaiveDate, unit: PeriodUnit, count: u32) -> Result<NaiveDate> {
    match unit {
        PeriodUnit::Weeks(weeks) => add_weeks(date, scaled(date, weeks, count)?),
        PeriodUnit::Months(months) => add_months(date, scaled(date, months, count)?),
    }
}

fn scaled(date: NaiveDate, step: u32, count: u32) -> Result<u32> {
    step.checked_mul(count).ok_or_else(|| out_of_range(date))
}

/// last day of the month containing `date`
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// `day` of the month containing `date`, or that month's last day when it has no such day
pub fn day_in_month_or_last(date: NaiveDate, day: u8) -> NaiveDate {
    date.with_day(day as u32)
        .unwrap_or_else(|| last_day_of_month(date))
}

/// whole days from `from` to `to`, negative when `to` is earlier
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

fn out_of_range(date: NaiveDate) -> ScheduleError {
    ScheduleError::invalid_schedule(format!("date arithmetic overflowed from {}", date))
}
