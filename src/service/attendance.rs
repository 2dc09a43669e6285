//! Daily attendance transitions and the per-employee views derived from them.
//!
//! Everything here is pure: callers load today's record (or a date range of
//! records) and pass in the current local time.

use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use derive_more::Display;
use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;

#[derive(Debug, Display, PartialEq, Eq)]
pub enum AttendanceError {
    #[display(fmt = "Already checked in today")]
    AlreadyCheckedIn,
    #[display(fmt = "No active check-in found")]
    NoActiveCheckIn,
    #[display(fmt = "Invalid month {}/{}", _0, _1)]
    InvalidMonth(u32, i32),
    #[display(fmt = "Absence can only be marked for past days")]
    DayNotOver,
}

impl From<AttendanceError> for AppError {
    fn from(e: AttendanceError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayState {
    NotCheckedIn,
    CheckedIn,
    CheckedOut,
}

/// Row to insert for a fresh check-in.
#[derive(Debug, PartialEq, Eq)]
pub struct NewCheckIn {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub check_in: NaiveDateTime,
    pub status: AttendanceStatus,
}

/// Fields to update on today's record at check-out.
#[derive(Debug, PartialEq, Eq)]
pub struct CheckOut {
    pub record_id: u64,
    pub check_out: NaiveDateTime,
    pub status: AttendanceStatus,
}

pub fn check_in(
    employee_id: u64,
    today: Option<&AttendanceRecord>,
    now: NaiveDateTime,
) -> Result<NewCheckIn, AttendanceError> {
    if today.is_some() {
        return Err(AttendanceError::AlreadyCheckedIn);
    }

    Ok(NewCheckIn {
        employee_id,
        date: now.date(),
        check_in: now,
        status: AttendanceStatus::Present,
    })
}

/// Closes today's record. Shorter than `half_day_threshold` is a half day.
pub fn check_out(
    today: Option<&AttendanceRecord>,
    now: NaiveDateTime,
    half_day_threshold: Duration,
) -> Result<CheckOut, AttendanceError> {
    let record = today.ok_or(AttendanceError::NoActiveCheckIn)?;
    let checked_in_at = match (record.check_in, record.check_out) {
        (Some(at), None) => at,
        _ => return Err(AttendanceError::NoActiveCheckIn),
    };

    let worked = (now - checked_in_at).max(Duration::zero());
    let status = if worked < half_day_threshold {
        AttendanceStatus::HalfDay
    } else {
        AttendanceStatus::Present
    };

    Ok(CheckOut {
        record_id: record.id,
        check_out: now,
        status,
    })
}

pub fn day_state(today: Option<&AttendanceRecord>) -> DayState {
    match today {
        Some(AttendanceRecord {
            check_in: Some(_),
            check_out: None,
            ..
        }) => DayState::CheckedIn,
        Some(AttendanceRecord {
            check_in: Some(_),
            check_out: Some(_),
            ..
        }) => DayState::CheckedOut,
        _ => DayState::NotCheckedIn,
    }
}

/// Time between check-in and check-out, once both are known.
pub fn worked(record: &AttendanceRecord) -> Option<Duration> {
    match (record.check_in, record.check_out) {
        (Some(start), Some(end)) => Some((end - start).max(Duration::zero())),
        _ => None,
    }
}

pub fn format_worked(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    format!("{}h {}m", minutes / 60, minutes % 60)
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub worked_minutes: Option<i64>,
    #[schema(example = "8h 30m")]
    pub worked: Option<String>,
}

impl From<AttendanceRecord> for HistoryEntry {
    fn from(record: AttendanceRecord) -> Self {
        let duration = worked(&record);
        Self {
            worked_minutes: duration.map(|d| d.num_minutes()),
            worked: duration.map(format_worked),
            record,
        }
    }
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), AttendanceError> {
    let invalid = || AttendanceError::InvalidMonth(month, year);
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;

    Ok((first, next - Duration::days(1)))
}

pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

pub const MAX_RATE_WINDOW_DAYS: i64 = 366;

pub fn clamp_window_days(window_days: i64) -> i64 {
    window_days.clamp(1, MAX_RATE_WINDOW_DAYS)
}

/// First day of the trailing attendance-rate window ending on `today`.
pub fn rate_window_start(today: NaiveDate, window_days: i64) -> NaiveDate {
    today - Duration::days(clamp_window_days(window_days) - 1)
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub days_worked: i64,
    pub hours_this_week: f64,
    pub attendance_rate: u32,
    pub window_days: i64,
}

/// Personal dashboard numbers. `records` must cover the current month and
/// the trailing rate window; anything outside is ignored.
pub fn stats(today: NaiveDate, records: &[AttendanceRecord], window_days: i64) -> AttendanceStats {
    let window_days = clamp_window_days(window_days);
    let window_start = rate_window_start(today, window_days);
    let monday = week_start(today);

    let days_worked = records
        .iter()
        .filter(|r| r.status.is_worked())
        .filter(|r| r.date.year() == today.year() && r.date.month() == today.month())
        .filter(|r| r.date <= today)
        .count() as i64;

    let worked_in_window = records
        .iter()
        .filter(|r| r.status.is_worked())
        .filter(|r| r.date >= window_start && r.date <= today)
        .count() as i64;

    let week_minutes: i64 = records
        .iter()
        .filter(|r| r.date >= monday && r.date <= today)
        .filter_map(worked)
        .map(|d| d.num_minutes())
        .sum();

    AttendanceStats {
        days_worked,
        hours_this_week: (week_minutes as f64 / 60.0 * 10.0).round() / 10.0,
        attendance_rate: super::report::percentage(worked_in_window, window_days),
        window_days,
    }
}

/// Day an absence sweep applies to: yesterday unless given, never a day
/// that is still open for check-in.
pub fn sweep_date(
    requested: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<NaiveDate, AttendanceError> {
    let date = requested.unwrap_or(today - Duration::days(1));
    if date >= today {
        return Err(AttendanceError::DayNotOver);
    }
    Ok(date)
}

/// Employees that should get an ABSENT record for a day: no record yet and
/// not covered by approved leave.
pub fn absent_candidates(
    employee_ids: &[u64],
    recorded: &HashSet<u64>,
    on_leave: &HashSet<u64>,
) -> Vec<u64> {
    employee_ids
        .iter()
        .copied()
        .filter(|id| !recorded.contains(id) && !on_leave.contains(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(
        date: NaiveDate,
        check_in: Option<(u32, u32)>,
        check_out: Option<(u32, u32)>,
        status: AttendanceStatus,
    ) -> AttendanceRecord {
        AttendanceRecord {
            id: 7,
            employee_id: 1,
            date,
            check_in: check_in.map(|(h, m)| at(date, h, m)),
            check_out: check_out.map(|(h, m)| at(date, h, m)),
            status,
        }
    }

    fn four_hours() -> Duration {
        Duration::minutes(240)
    }

    #[test]
    fn first_check_in_creates_present_record() {
        let now = at(day(2026, 1, 5), 9, 0);
        let new = check_in(1, None, now).unwrap();
        assert_eq!(
            new,
            NewCheckIn {
                employee_id: 1,
                date: day(2026, 1, 5),
                check_in: now,
                status: AttendanceStatus::Present,
            }
        );
    }

    #[test]
    fn second_check_in_same_day_is_rejected() {
        let today = day(2026, 1, 5);
        let existing = record(today, Some((9, 0)), None, AttendanceStatus::Present);
        let err = check_in(1, Some(&existing), at(today, 9, 5)).unwrap_err();
        assert_eq!(err, AttendanceError::AlreadyCheckedIn);
        assert_eq!(err.to_string(), "Already checked in today");
    }

    #[test]
    fn absent_record_also_blocks_check_in() {
        let today = day(2026, 1, 5);
        let existing = record(today, None, None, AttendanceStatus::Absent);
        assert!(check_in(1, Some(&existing), at(today, 10, 0)).is_err());
    }

    #[test]
    fn check_out_before_check_in_is_rejected() {
        let now = at(day(2026, 1, 5), 17, 0);
        assert_eq!(
            check_out(None, now, four_hours()).unwrap_err(),
            AttendanceError::NoActiveCheckIn
        );

        let absent = record(day(2026, 1, 5), None, None, AttendanceStatus::Absent);
        assert_eq!(
            check_out(Some(&absent), now, four_hours()).unwrap_err(),
            AttendanceError::NoActiveCheckIn
        );
    }

    #[test]
    fn double_check_out_is_rejected() {
        let today = day(2026, 1, 5);
        let done = record(today, Some((9, 0)), Some((17, 0)), AttendanceStatus::Present);
        assert!(check_out(Some(&done), at(today, 18, 0), four_hours()).is_err());
    }

    #[test]
    fn full_day_stays_present_and_reports_worked_time() {
        let today = day(2026, 1, 5);
        let open = record(today, Some((9, 0)), None, AttendanceStatus::Present);

        let out = check_out(Some(&open), at(today, 17, 30), four_hours()).unwrap();
        assert_eq!(out.status, AttendanceStatus::Present);
        assert_eq!(out.record_id, 7);

        let closed = AttendanceRecord {
            check_out: Some(out.check_out),
            status: out.status,
            ..open
        };
        let entry = HistoryEntry::from(closed);
        assert_eq!(entry.worked.as_deref(), Some("8h 30m"));
        assert_eq!(entry.worked_minutes, Some(510));
        assert_eq!(entry.record.status, AttendanceStatus::Present);
    }

    #[test]
    fn short_day_becomes_half_day() {
        let today = day(2026, 1, 5);
        let open = record(today, Some((9, 0)), None, AttendanceStatus::Present);

        let out = check_out(Some(&open), at(today, 12, 59), four_hours()).unwrap();
        assert_eq!(out.status, AttendanceStatus::HalfDay);

        let out = check_out(Some(&open), at(today, 13, 0), four_hours()).unwrap();
        assert_eq!(out.status, AttendanceStatus::Present);
    }

    #[test]
    fn open_record_has_no_worked_time() {
        let entry = HistoryEntry::from(record(
            day(2026, 1, 5),
            Some((9, 0)),
            None,
            AttendanceStatus::Present,
        ));
        assert_eq!(entry.worked, None);
        assert_eq!(entry.worked_minutes, None);
    }

    #[test]
    fn day_state_follows_timestamps() {
        let today = day(2026, 1, 5);
        assert_eq!(day_state(None), DayState::NotCheckedIn);
        assert_eq!(
            day_state(Some(&record(today, None, None, AttendanceStatus::Absent))),
            DayState::NotCheckedIn
        );
        assert_eq!(
            day_state(Some(&record(today, Some((9, 0)), None, AttendanceStatus::Present))),
            DayState::CheckedIn
        );
        assert_eq!(
            day_state(Some(&record(
                today,
                Some((9, 0)),
                Some((17, 0)),
                AttendanceStatus::Present
            ))),
            DayState::CheckedOut
        );
    }

    #[test]
    fn month_bounds_handle_december_and_leap_years() {
        assert_eq!(
            month_bounds(2024, 2).unwrap(),
            (day(2024, 2, 1), day(2024, 2, 29))
        );
        assert_eq!(
            month_bounds(2025, 12).unwrap(),
            (day(2025, 12, 1), day(2025, 12, 31))
        );
        assert_eq!(
            month_bounds(2025, 13).unwrap_err(),
            AttendanceError::InvalidMonth(13, 2025)
        );
        assert!(month_bounds(2025, 0).is_err());
    }

    #[test]
    fn week_starts_on_monday_even_from_sunday() {
        // 2026-01-07 is a Wednesday, 2026-01-11 a Sunday.
        assert_eq!(week_start(day(2026, 1, 7)), day(2026, 1, 5));
        assert_eq!(week_start(day(2026, 1, 11)), day(2026, 1, 5));
        assert_eq!(week_start(day(2026, 1, 5)), day(2026, 1, 5));
    }

    #[test]
    fn stats_count_month_week_and_window() {
        // Wednesday 2026-02-04.
        let today = day(2026, 2, 4);
        let records = vec![
            // Previous month, inside the 30-day window.
            record(day(2026, 1, 20), Some((9, 0)), Some((17, 0)), AttendanceStatus::Present),
            // Outside the window.
            record(day(2025, 12, 1), Some((9, 0)), Some((17, 0)), AttendanceStatus::Present),
            // This week.
            record(day(2026, 2, 2), Some((9, 0)), Some((17, 30)), AttendanceStatus::Present),
            record(day(2026, 2, 3), Some((9, 0)), Some((12, 0)), AttendanceStatus::HalfDay),
            record(day(2026, 2, 4), None, None, AttendanceStatus::Absent),
        ];

        let s = stats(today, &records, 30);
        assert_eq!(s.days_worked, 2);
        assert!((s.hours_this_week - 11.5).abs() < f64::EPSILON);
        // 3 worked days in the last 30 -> 10%.
        assert_eq!(s.attendance_rate, 10);
        assert_eq!(s.window_days, 30);
    }

    #[test]
    fn absent_candidates_skip_recorded_and_on_leave() {
        let recorded: HashSet<u64> = [2].into_iter().collect();
        let on_leave: HashSet<u64> = [3].into_iter().collect();
        assert_eq!(absent_candidates(&[1, 2, 3, 4], &recorded, &on_leave), vec![1, 4]);
        assert!(absent_candidates(&[], &recorded, &on_leave).is_empty());
    }

    #[test]
    fn sweep_defaults_to_yesterday_and_leaves_today_open() {
        let today = day(2026, 1, 6);
        assert_eq!(sweep_date(None, today).unwrap(), day(2026, 1, 5));
        assert_eq!(sweep_date(Some(day(2026, 1, 2)), today).unwrap(), day(2026, 1, 2));
        assert_eq!(
            sweep_date(Some(today), today).unwrap_err(),
            AttendanceError::DayNotOver
        );
        assert!(sweep_date(Some(day(2026, 1, 7)), today).is_err());

        // Today has no swept row, so a late arrival can still check in.
        assert!(check_in(1, None, at(today, 11, 30)).is_ok());
    }

    #[test]
    fn oversized_rate_window_is_clamped() {
        let today = day(2026, 2, 4);
        assert_eq!(clamp_window_days(0), 1);
        assert_eq!(clamp_window_days(i64::MAX), MAX_RATE_WINDOW_DAYS);
        assert_eq!(rate_window_start(today, i64::MAX), today - Duration::days(365));

        let s = stats(today, &[], i64::MAX);
        assert_eq!(s.window_days, MAX_RATE_WINDOW_DAYS);
        assert_eq!(s.attendance_rate, 0);
    }
}
