use chrono::{Datelike, Months, NaiveDate};

/// Two letter weekday names, weeks start on Sunday.
pub const WEEKDAY_HEADER: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

/// One calendar row. Cells outside the month hold 0.
pub type Week = [u32; 7];

/// Links to the neighbouring year, month or day, already formatted as url paths
/// relative to `/tracker/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub prev: String,
    pub next: String,
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some(last.day())
}

/// Build the Sunday-first week rows for a month.
///
/// Returns `None` when the year/month pair is not a representable date.
pub fn month_grid(year: i32, month: u32) -> Option<Vec<Week>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let length = days_in_month(year, month)?;
    let offset = first.weekday().num_days_from_sunday() as usize;

    let mut weeks = Vec::new();
    let mut week: Week = [0; 7];
    let mut slot = offset;
    for day in 1..=length {
        week[slot] = day;
        slot += 1;
        if slot == 7 {
            weeks.push(week);
            week = [0; 7];
            slot = 0;
        }
    }
    if slot != 0 {
        weeks.push(week);
    }

    Some(weeks)
}

pub fn year_navigation(year: i32) -> Option<Navigation> {
    let date = NaiveDate::from_ymd_opt(year, 1, 1)?;
    navigation(
        date.checked_sub_months(Months::new(12))?,
        date.checked_add_months(Months::new(12))?,
        "%Y",
    )
}

pub fn month_navigation(year: i32, month: u32) -> Option<Navigation> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)?;
    navigation(
        date.checked_sub_months(Months::new(1))?,
        date.checked_add_months(Months::new(1))?,
        "%Y/%b",
    )
}

pub fn day_navigation(date: NaiveDate) -> Option<Navigation> {
    navigation(date.pred_opt()?, date.succ_opt()?, "%Y/%b/%d")
}

fn navigation(prev: NaiveDate, next: NaiveDate, fmt: &str) -> Option<Navigation> {
    Some(Navigation {
        prev: prev.format(fmt).to_string(),
        next: next.format(fmt).to_string(),
    })
}
