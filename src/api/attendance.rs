use crate::{
    auth::auth::AuthUser,
    config::Config,
    db::is_unique_violation,
    error::AppError,
    model::attendance::AttendanceRecord,
    service::attendance::{self as tracker, AttendanceError, HistoryEntry},
};
use actix_web::{HttpResponse, web};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::IntoParams;

const ATTENDANCE_SELECT: &str = r#"
    SELECT id, employee_id, date, check_in, check_out, status
    FROM attendance
"#;

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

async fn record_for_day(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    let sql = format!("{ATTENDANCE_SELECT} WHERE employee_id = ? AND date = ?");
    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(employee_id)
        .bind(date)
        .fetch_optional(pool)
        .await
}

async fn records_between(
    pool: &MySqlPool,
    employee_id: u64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    let sql = format!(
        "{ATTENDANCE_SELECT} WHERE employee_id = ? AND date BETWEEN ? AND ? ORDER BY date ASC"
    );
    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(employee_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/attendance/check-in",
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully",
            "attendance": {
                "id": 1, "employeeId": 1000, "date": "2026-01-05",
                "checkIn": "2026-01-05T09:00:00", "checkOut": null, "status": "PRESENT"
            }
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.require_employee()?;
    let now = now();

    let today = record_for_day(pool.get_ref(), employee_id, now.date()).await?;
    let new = tracker::check_in(employee_id, today.as_ref(), now)?;

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (employee_id, date, check_in, status)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(new.employee_id)
    .bind(new.date)
    .bind(new.check_in)
    .bind(new.status.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        // Duplicate check-in for same day
        if is_unique_violation(&e) {
            AppError::from(AttendanceError::AlreadyCheckedIn)
        } else {
            error!(error = %e, employee_id, "Check-in failed");
            AppError::Internal
        }
    })?;

    let attendance = AttendanceRecord {
        id: result.last_insert_id(),
        employee_id: new.employee_id,
        date: new.date,
        check_in: Some(new.check_in),
        check_out: None,
        status: new.status,
    };

    debug!(employee_id, attendance_id = attendance.id, "Checked in");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked in successfully",
        "attendance": attendance,
    })))
}

/// Check-out endpoint
///
/// Days shorter than the configured half-day threshold are stored as `HALF_DAY`.
#[utoipa::path(
    post,
    path = "/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully",
            "attendance": {
                "id": 1, "employeeId": 1000, "date": "2026-01-05",
                "checkIn": "2026-01-05T09:00:00", "checkOut": "2026-01-05T17:30:00",
                "status": "PRESENT", "workedMinutes": 510, "worked": "8h 30m"
            }
        })),
        (status = 400, description = "No active check-in found", body = Object, example = json!({
            "message": "No active check-in found"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.require_employee()?;
    let now = now();

    let today = record_for_day(pool.get_ref(), employee_id, now.date()).await?;
    let threshold = Duration::minutes(config.half_day_threshold_minutes);
    let update = tracker::check_out(today.as_ref(), now, threshold)?;

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET check_out = ?, status = ?
        WHERE id = ?
        AND check_out IS NULL
        "#,
    )
    .bind(update.check_out)
    .bind(update.status.as_ref())
    .bind(update.record_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Check-out failed");
        AppError::Internal
    })?;

    // a concurrent check-out got there first
    if result.rows_affected() == 0 {
        return Err(AttendanceError::NoActiveCheckIn.into());
    }

    let Some(mut attendance) = today else {
        return Err(AttendanceError::NoActiveCheckIn.into());
    };
    attendance.check_out = Some(update.check_out);
    attendance.status = update.status;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked out successfully",
        "attendance": HistoryEntry::from(attendance),
    })))
}

/// Today's record and check-in state
#[utoipa::path(
    get,
    path = "/attendance/today",
    responses(
        (status = 200, description = "Today's attendance", body = Object, example = json!({
            "attendance": null,
            "state": "NOT_CHECKED_IN"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, AppError> {
    let employee_id = auth.require_employee()?;

    let record = record_for_day(pool.get_ref(), employee_id, now().date()).await?;
    let state = tracker::day_state(record.as_ref());

    Ok(HttpResponse::Ok().json(json!({
        "attendance": record.map(HistoryEntry::from),
        "state": state,
    })))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Number of most recent records (default 30, max 366)
    pub limit: Option<u32>,
}

/// Recent attendance history, newest first
#[utoipa::path(
    get,
    path = "/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Attendance history", body = [HistoryEntry]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.require_employee()?;
    let limit = query.limit.unwrap_or(30).clamp(1, 366);

    let sql = format!("{ATTENDANCE_SELECT} WHERE employee_id = ? ORDER BY date DESC LIMIT ?");
    let records = sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(employee_id)
        .bind(limit)
        .fetch_all(pool.get_ref())
        .await?;

    let entries: Vec<HistoryEntry> = records.into_iter().map(HistoryEntry::from).collect();
    Ok(HttpResponse::Ok().json(entries))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CalendarQuery {
    /// 1..=12, defaults to the current month
    pub month: Option<u32>,
    /// Defaults to the current year
    pub year: Option<i32>,
}

/// Records within one calendar month
#[utoipa::path(
    get,
    path = "/attendance/calendar",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Month of attendance", body = Object, example = json!({
            "month": 1,
            "year": 2026,
            "records": []
        })),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn calendar(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CalendarQuery>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.require_employee()?;
    let today = now().date();
    let month = query.month.unwrap_or_else(|| today.month());
    let year = query.year.unwrap_or_else(|| today.year());

    let (first, last) = tracker::month_bounds(year, month)?;
    let records = records_between(pool.get_ref(), employee_id, first, last).await?;

    Ok(HttpResponse::Ok().json(json!({
        "month": month,
        "year": year,
        "records": records,
    })))
}

/// Personal attendance stats
#[utoipa::path(
    get,
    path = "/attendance/stats",
    responses(
        (status = 200, description = "Days worked this month, hours this week, attendance rate", body = crate::service::attendance::AttendanceStats),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.require_employee()?;
    let today = now().date();
    let window = config.attendance_rate_window_days;

    // month start, week start and window start can each be the earliest
    let from = [
        today.with_day(1).unwrap_or(today),
        tracker::week_start(today),
        tracker::rate_window_start(today, window),
    ]
    .into_iter()
    .min()
    .unwrap_or(today);

    let records = records_between(pool.get_ref(), employee_id, from, today).await?;

    Ok(HttpResponse::Ok().json(tracker::stats(today, &records, window)))
}
