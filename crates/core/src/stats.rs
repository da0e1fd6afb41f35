//! Rolling twelve-month attendance statistics.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::attendance::AttendanceStatus;

/// Number of calendar months covered by [`monthly_present_counts`].
pub const STATS_MONTHS: u32 = 12;

/// Present-count for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: u32,
    /// Short label such as `"Mar 24"`.
    pub label: String,
    pub present: i64,
}

/// Count `present` events per month for the twelve months ending with the
/// month containing `today`, oldest first. Events outside that range and
/// non-present statuses are ignored.
pub fn monthly_present_counts<I>(today: NaiveDate, events: I) -> Vec<MonthlyCount>
where
    I: IntoIterator<Item = (NaiveDate, AttendanceStatus)>,
{
    let mut months: Vec<MonthlyCount> = (0..STATS_MONTHS)
        .rev()
        .map(|back| {
            let (year, month) = months_before(today.year(), today.month(), back);
            MonthlyCount {
                year,
                month,
                label: month_label(year, month),
                present: 0,
            }
        })
        .collect();

    for (date, status) in events {
        if status != AttendanceStatus::Present {
            continue;
        }
        if let Some(slot) = months
            .iter_mut()
            .find(|m| m.year == date.year() && m.month == date.month())
        {
            slot.present += 1;
        }
    }

    months
}

fn months_before(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%b %y").to_string())
        .unwrap_or_default()
}
