//! Dashboard rollups over attendance and leave data.

use crate::model::attendance::AttendanceStatus;
use crate::model::leave_request::LeaveType;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

const WEEKDAYS: [&str; 5] = ["Mon", "Tue", "Wed", "Thu", "Fri"];

/// Rounded `part / whole` percentage; 0 when there is nothing to divide by.
pub fn percentage(part: i64, whole: i64) -> u32 {
    if whole <= 0 || part <= 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct WeekdayAttendance {
    #[schema(example = "Mon", value_type = String)]
    pub day: &'static str,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub present: i64,
    pub absent: i64,
}

/// The week's per-day counts; only `days` goes over the wire.
#[derive(Debug, PartialEq, Eq)]
pub struct WeeklyAttendance {
    pub week_start: NaiveDate,
    pub days: Vec<WeekdayAttendance>,
    pub total_present: i64,
    pub total_absent: i64,
}

/// Present/absent counts for Mon..Fri of the week starting `monday`.
/// Records outside those five days are ignored; HALF_DAY counts as neither.
pub fn weekly_attendance(
    monday: NaiveDate,
    records: &[(NaiveDate, AttendanceStatus)],
) -> WeeklyAttendance {
    let days: Vec<WeekdayAttendance> = WEEKDAYS
        .iter()
        .zip(0..)
        .map(|(&day, offset)| {
            let date = monday + Duration::days(offset);
            let count = |status: AttendanceStatus| {
                records
                    .iter()
                    .filter(|(d, s)| *d == date && *s == status)
                    .count() as i64
            };
            WeekdayAttendance {
                day,
                date,
                present: count(AttendanceStatus::Present),
                absent: count(AttendanceStatus::Absent),
            }
        })
        .collect();

    WeeklyAttendance {
        week_start: monday,
        total_present: days.iter().map(|d| d.present).sum(),
        total_absent: days.iter().map(|d| d.absent).sum(),
        days,
    }
}

#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct DepartmentShare {
    pub name: String,
    pub count: i64,
    pub percentage: u32,
}

/// One entry per department, largest first.
pub fn department_distribution<S: AsRef<str>>(departments: &[S]) -> Vec<DepartmentShare> {
    let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
    for department in departments {
        *counts.entry(department.as_ref()).or_insert(0) += 1;
    }

    let total = departments.len() as i64;
    let mut shares: Vec<DepartmentShare> = counts
        .into_iter()
        .map(|(name, count)| DepartmentShare {
            name: name.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect();

    // BTreeMap already yields names in order, so a stable sort keeps ties alphabetical.
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Checkin,
    Leave,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub employee: String,
    #[schema(value_type = String, format = "date-time")]
    pub time: NaiveDateTime,
    pub message: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CheckInEvent {
    pub full_name: String,
    pub check_in: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeaveEvent {
    pub full_name: String,
    #[sqlx(try_from = "String")]
    pub leave_type: LeaveType,
    pub created_at: NaiveDateTime,
}

/// Newest first, at most `limit` entries.
pub fn recent_activity(
    check_ins: Vec<CheckInEvent>,
    leaves: Vec<LeaveEvent>,
    limit: usize,
) -> Vec<Activity> {
    let mut feed: Vec<Activity> = check_ins
        .into_iter()
        .map(|c| Activity {
            kind: ActivityKind::Checkin,
            employee: c.full_name,
            time: c.check_in,
            message: "Checked in".to_string(),
        })
        .chain(leaves.into_iter().map(|l| Activity {
            kind: ActivityKind::Leave,
            employee: l.full_name,
            time: l.created_at,
            message: format!(
                "Requested {} leave",
                l.leave_type.as_ref().to_ascii_lowercase()
            ),
        }))
        .collect();

    feed.sort_by(|a, b| b.time.cmp(&a.time));
    feed.truncate(limit);
    feed
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub present: i64,
    pub half_day: i64,
    pub absent: i64,
}

pub fn daily_summary<I>(statuses: I) -> DailySummary
where
    I: IntoIterator<Item = AttendanceStatus>,
{
    statuses
        .into_iter()
        .fold(DailySummary::default(), |mut acc, status| {
            match status {
                AttendanceStatus::Present => acc.present += 1,
                AttendanceStatus::HalfDay => acc.half_day += 1,
                AttendanceStatus::Absent => acc.absent += 1,
            }
            acc
        })
}

#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_employees: i64,
    pub present_today: i64,
    pub on_leave: i64,
    pub pending_requests: i64,
    pub attendance_rate: u32,
}

impl DashboardStats {
    pub fn new(total_employees: i64, present_today: i64, on_leave: i64, pending_requests: i64) -> Self {
        Self {
            total_employees,
            present_today,
            on_leave,
            pending_requests,
            attendance_rate: percentage(present_today, total_employees),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn percentage_rounds_and_guards_zero() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(5, 0), 0);
        assert_eq!(percentage(0, 10), 0);
        assert_eq!(percentage(10, 10), 100);
    }

    #[test]
    fn weekly_totals_equal_sum_of_days() {
        let monday = day(2026, 1, 5);
        let records = vec![
            (day(2026, 1, 5), AttendanceStatus::Present),
            (day(2026, 1, 5), AttendanceStatus::Present),
            (day(2026, 1, 5), AttendanceStatus::Absent),
            (day(2026, 1, 6), AttendanceStatus::HalfDay),
            (day(2026, 1, 7), AttendanceStatus::Absent),
            (day(2026, 1, 9), AttendanceStatus::Present),
            // Weekend and previous week are outside Mon..Fri.
            (day(2026, 1, 10), AttendanceStatus::Present),
            (day(2026, 1, 2), AttendanceStatus::Absent),
        ];

        let week = weekly_attendance(monday, &records);
        let labels: Vec<_> = week.days.iter().map(|d| d.day).collect();
        assert_eq!(labels, WEEKDAYS);
        assert_eq!(week.days[0].present, 2);
        assert_eq!(week.days[0].absent, 1);
        assert_eq!(week.days[1].present, 0);
        assert_eq!(week.days[4].date, day(2026, 1, 9));

        assert_eq!(week.total_present, 3);
        assert_eq!(week.total_absent, 2);
        assert_eq!(
            week.total_present,
            week.days.iter().map(|d| d.present).sum::<i64>()
        );
        assert_eq!(
            week.total_absent,
            week.days.iter().map(|d| d.absent).sum::<i64>()
        );
    }

    #[test]
    fn departments_are_grouped_with_percentages() {
        let departments = ["Engineering", "HR", "Engineering", "Sales", "Engineering", "HR"];
        let shares = department_distribution(&departments);

        assert_eq!(
            shares,
            vec![
                DepartmentShare {
                    name: "Engineering".to_string(),
                    count: 3,
                    percentage: 50
                },
                DepartmentShare {
                    name: "HR".to_string(),
                    count: 2,
                    percentage: 33
                },
                DepartmentShare {
                    name: "Sales".to_string(),
                    count: 1,
                    percentage: 17
                },
            ]
        );
        assert!(department_distribution::<&str>(&[]).is_empty());
    }

    #[test]
    fn activity_is_merged_newest_first_and_truncated() {
        let d = day(2026, 1, 5);
        let check_ins = vec![
            CheckInEvent {
                full_name: "Ada".to_string(),
                check_in: at(d, 9, 0),
            },
            CheckInEvent {
                full_name: "Linus".to_string(),
                check_in: at(d, 8, 30),
            },
        ];
        let leaves = vec![LeaveEvent {
            full_name: "Grace".to_string(),
            leave_type: LeaveType::Sick,
            created_at: at(d, 8, 45),
        }];

        let feed = recent_activity(check_ins.clone(), leaves.clone(), 10);
        let order: Vec<_> = feed.iter().map(|a| a.employee.as_str()).collect();
        assert_eq!(order, ["Ada", "Grace", "Linus"]);
        assert_eq!(feed[1].kind, ActivityKind::Leave);
        assert_eq!(feed[1].message, "Requested sick leave");
        assert_eq!(feed[0].message, "Checked in");

        let feed = recent_activity(check_ins, leaves, 2);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[1].employee, "Grace");
    }

    #[test]
    fn daily_summary_counts_each_status() {
        let summary = daily_summary([
            AttendanceStatus::Present,
            AttendanceStatus::HalfDay,
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
        ]);
        assert_eq!(
            summary,
            DailySummary {
                present: 2,
                half_day: 1,
                absent: 1
            }
        );
    }

    #[test]
    fn dashboard_rate_is_present_over_headcount() {
        let stats = DashboardStats::new(8, 6, 1, 3);
        assert_eq!(stats.attendance_rate, 75);
        assert_eq!(DashboardStats::new(0, 0, 0, 0).attendance_rate, 0);
    }
}
