//! Calendar-day windows.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// The half-open window `[start of day, start of next day)` containing `now`,
/// where "day" is the calendar day in `now`'s time zone.
///
/// The bounds are returned in UTC so they can be compared against stored
/// timestamps directly.
#[must_use]
pub fn day_window<Tz: TimeZone>(now: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    let today = now.date_naive();
    let start = start_of_day(&tz, today);
    let end = today
        .succ_opt()
        .map_or(DateTime::<Utc>::MAX_UTC, |tomorrow| start_of_day(&tz, tomorrow));
    (start, end)
}

/// First instant of `date` in `tz`.
///
/// Where a DST change skips midnight the day begins an hour later; where it
/// repeats midnight the earlier instant wins.
#[must_use]
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map_or_else(
            || Utc.from_utc_datetime(&midnight),
            |start| start.with_timezone(&Utc),
        )
}
