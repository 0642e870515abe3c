//! Due/overdue/clear timestamp calculation.
//!
//! A task instance's schedule is derived from its civil date and a symbolic
//! due-time label, interpreted in the household timezone, then persisted as
//! UTC instants. All arithmetic happens in the local calendar so daylight
//! saving transitions are absorbed; every branch has a total default, so
//! these functions never fail.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::template::OverdueWhen;

/// The three instants that bound an instance's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSchedule {
    /// When the task is expected to be completed
    pub due_at: DateTime<Utc>,
    /// When a still-pending task turns Overdue
    pub overdue_at: DateTime<Utc>,
    /// Local midnight after the task's date; Overdue turns Cleared here
    pub clear_at: DateTime<Utc>,
}

/// Compute the schedule for an instance on `date` with the given due label.
pub fn compute_schedule(
    date: NaiveDate,
    due_label: &str,
    overdue_when: OverdueWhen,
    tz: Tz,
) -> TaskSchedule {
    let due_at = due_instant(date, due_label, tz);
    let overdue_at = due_at + Duration::hours(overdue_when.offset_hours());
    let clear_at = clear_instant(date, tz);

    TaskSchedule {
        due_at,
        overdue_at,
        clear_at,
    }
}

/// Map a due-time label to its UTC instant on the given civil date.
///
/// Labels are matched case-insensitively as substrings, in priority order:
/// Morning (12:00), Lunch (13:00), Afternoon (18:00), Evening (23:00),
/// Night (02:00 of the next day). An explicit "H:MM AM/PM" token is parsed
/// directly; anything else falls back to Morning.
pub fn due_instant(date: NaiveDate, due_label: &str, tz: Tz) -> DateTime<Utc> {
    let (time, extra_days) = due_local_time(due_label);
    let local_date = date + Duration::days(extra_days);
    local_to_utc(tz, local_date, time)
}

/// Local midnight of the day after `date`, in UTC.
pub fn clear_instant(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = NaiveTime::from_hms_opt(0, 0, 0).expect("midnight is a valid time");
    local_to_utc(tz, date + Duration::days(1), midnight)
}

fn due_local_time(label: &str) -> (NaiveTime, i64) {
    let lowered = label.trim().to_lowercase();

    let at = |h, m| NaiveTime::from_hms_opt(h, m, 0).expect("valid time of day");

    if lowered.contains("morning") {
        return (at(12, 0), 0);
    }
    if lowered.contains("lunch") {
        return (at(13, 0), 0);
    }
    if lowered.contains("afternoon") {
        return (at(18, 0), 0);
    }
    if lowered.contains("evening") {
        return (at(23, 0), 0);
    }
    if lowered.contains("night") {
        // Night belongs to the evening routine; it lands at 02:00 the next day.
        return (at(2, 0), 1);
    }

    if let Ok(time) = NaiveTime::parse_from_str(&lowered.to_uppercase(), "%I:%M %p") {
        return (time, 0);
    }

    (at(12, 0), 0)
}

/// Resolve a local wall-clock time to UTC, absorbing DST transitions.
///
/// Ambiguous times (fall-back) take the earlier offset; nonexistent times
/// (spring-forward) shift forward an hour into the valid range.
fn local_to_utc(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            match tz.from_local_datetime(&shifted) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                    dt.with_timezone(&Utc)
                }
                LocalResult::None => Utc.from_utc_datetime(&naive),
            }
        }
    }
}
