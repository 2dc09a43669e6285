use crate::{
    api::employee::{AccountInput, EMPLOYEE_SELECT, create_employee_account},
    auth::auth::AuthUser,
    error::AppError,
    model::{
        attendance::{AttendanceStatus, EmployeeAttendance},
        employee::Employee,
        leave_request::LeaveStatus,
    },
    service::{
        attendance::{absent_candidates, sweep_date, week_start},
        report::{self, CheckInEvent, DailySummary, DashboardStats, LeaveEvent},
    },
};
use actix_web::{HttpResponse, web};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::collections::HashSet;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Employees on approved leave covering `date`.
async fn on_leave_ids(pool: &MySqlPool, date: NaiveDate) -> Result<Vec<u64>, sqlx::Error> {
    sqlx::query_scalar::<_, u64>(
        r#"
        SELECT DISTINCT employee_id
        FROM leave_requests
        WHERE status = ?
        AND start_date <= ?
        AND end_date >= ?
        "#,
    )
    .bind(LeaveStatus::Approved.as_ref())
    .bind(date)
    .bind(date)
    .fetch_all(pool)
    .await
}

/* =========================
Dashboard
========================= */

/// Headline numbers for today
#[utoipa::path(
    get,
    path = "/admin/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard stats", body = DashboardStats, example = json!({
            "totalEmployees": 12,
            "presentToday": 9,
            "onLeave": 1,
            "pendingRequests": 3,
            "attendanceRate": 75
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn dashboard_stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let today = today();
    let pool = pool.get_ref();

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(pool)
        .await?;

    let present: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM attendance WHERE date = ? AND status IN (?, ?)")
            .bind(today)
            .bind(AttendanceStatus::Present.as_ref())
            .bind(AttendanceStatus::HalfDay.as_ref())
            .fetch_one(pool)
            .await?;

    let on_leave = on_leave_ids(pool, today).await?.len() as i64;

    let pending: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leave_requests WHERE status = ?")
        .bind(LeaveStatus::Pending.as_ref())
        .fetch_one(pool)
        .await?;

    Ok(HttpResponse::Ok().json(DashboardStats::new(total, present, on_leave, pending)))
}

/// Present/absent per weekday of the current week
#[utoipa::path(
    get,
    path = "/admin/dashboard/weekly-attendance",
    responses(
        (status = 200, description = "Mon..Fri counts of the current week", body = [crate::service::report::WeekdayAttendance], example = json!([
            { "day": "Mon", "date": "2026-01-05", "present": 9, "absent": 1 },
            { "day": "Tue", "date": "2026-01-06", "present": 10, "absent": 0 }
        ])),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn weekly_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let monday = week_start(today());
    let friday = monday + Duration::days(4);

    let rows = sqlx::query_as::<_, (NaiveDate, String)>(
        "SELECT date, status FROM attendance WHERE date BETWEEN ? AND ?",
    )
    .bind(monday)
    .bind(friday)
    .fetch_all(pool.get_ref())
    .await?;

    let records: Vec<(NaiveDate, AttendanceStatus)> = rows
        .into_iter()
        .filter_map(|(date, status)| AttendanceStatus::try_from(status).ok().map(|s| (date, s)))
        .collect();

    let week = report::weekly_attendance(monday, &records);
    debug!(
        week_start = %week.week_start,
        present = week.total_present,
        absent = week.total_absent,
        "Weekly attendance"
    );

    Ok(HttpResponse::Ok().json(week.days))
}

/// Employee count per department
#[utoipa::path(
    get,
    path = "/admin/dashboard/departments",
    responses(
        (status = 200, description = "Department distribution, largest first", body = [crate::service::report::DepartmentShare]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn departments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let departments: Vec<String> = sqlx::query_scalar("SELECT department FROM employees")
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(report::department_distribution(&departments)))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ActivityQuery {
    /// Number of entries (default 10, max 100)
    pub limit: Option<u32>,
}

/// Latest check-ins and leave applications, merged
#[utoipa::path(
    get,
    path = "/admin/activity",
    params(ActivityQuery),
    responses(
        (status = 200, description = "Recent activity, newest first", body = [crate::service::report::Activity], example = json!([
            { "type": "checkin", "employee": "Jane Doe", "time": "2026-01-05T09:00:00", "message": "Checked in" },
            { "type": "leave", "employee": "John Roe", "time": "2026-01-05T08:10:00", "message": "Requested sick leave" }
        ])),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn activity(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ActivityQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let check_ins = sqlx::query_as::<_, CheckInEvent>(
        r#"
        SELECT e.full_name, a.check_in
        FROM attendance a
        JOIN employees e ON e.id = a.employee_id
        WHERE a.check_in IS NOT NULL
        ORDER BY a.check_in DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool.get_ref())
    .await?;

    let leaves = sqlx::query_as::<_, LeaveEvent>(
        r#"
        SELECT e.full_name, l.leave_type, l.created_at
        FROM leave_requests l
        JOIN employees e ON e.id = l.employee_id
        ORDER BY l.created_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(report::recent_activity(check_ins, leaves, limit as usize)))
}

/* =========================
Employees
========================= */

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeQuery {
    /// Page number, starting at 1
    pub page: Option<u32>,
    /// Items per page (default and max 100)
    pub per_page: Option<u32>,
    pub department: Option<String>,
    /// Matches name or email
    pub search: Option<String>,
}

/// List employees
#[utoipa::path(
    get,
    path = "/admin/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Employees, newest first; total match count in X-Total-Count", body = [Employee]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(100).clamp(1, 100);
    let offset = u64::from(page - 1) * u64::from(per_page);

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(department) = query.department.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        conditions.push("e.department = ?");
        bindings.push(department.to_string());
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push("(e.full_name LIKE ? OR u.email LIKE ?)");
        let like = format!("%{search}%");
        bindings.push(like.clone());
        bindings.push(like);
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!(
        "SELECT COUNT(*) FROM employees e LEFT JOIN users u ON u.employee_id = e.id {where_clause}"
    );
    debug!(sql = %count_sql, bindings = ?bindings, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }
    let total = count_query.fetch_one(pool.get_ref()).await?;

    // ---------- data query ----------
    let data_sql = format!("{EMPLOYEE_SELECT} {where_clause} ORDER BY e.id DESC LIMIT ? OFFSET ?");
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    let employees = data_query
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok()
        .insert_header(("X-Total-Count", total.to_string()))
        .json(employees))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployee {
    #[schema(example = "john@dayflow.com")]
    pub email: Option<String>,
    #[schema(example = "secret123")]
    pub password: Option<String>,
    #[schema(example = "John Roe")]
    pub full_name: Option<String>,
    #[schema(example = "+8801811111111")]
    pub phone: Option<String>,
    #[schema(example = "Accountant")]
    pub job_title: Option<String>,
    #[schema(example = "Finance")]
    pub department: Option<String>,
    #[schema(example = 55000.0)]
    pub salary: Option<f64>,
    #[schema(example = "2026-02-01", format = "date", value_type = Option<String>)]
    pub join_date: Option<NaiveDate>,
}

/// Create an employee with login credentials
#[utoipa::path(
    post,
    path = "/admin/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Object, example = json!({
            "message": "Employee created",
            "employee": {
                "id": 3, "employeeCode": "EMP-0003", "fullName": "John Roe",
                "email": "john@dayflow.com", "phone": null, "jobTitle": "Accountant",
                "department": "Finance", "salary": 55000.0,
                "joinDate": "2026-02-01", "createdAt": "2026-02-01T10:00:00"
            }
        })),
        (status = 400, description = "Missing fields, invalid salary or email already registered"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let payload = payload.into_inner();

    let salary = payload.salary.unwrap_or(0.0);
    if !salary.is_finite() || salary < 0.0 {
        return Err(AppError::bad_request("Salary must be a non-negative number"));
    }

    let mut input = AccountInput::new(
        payload.email,
        payload.password,
        payload.full_name,
        payload.phone,
        payload.job_title,
        payload.department,
    )?;
    input.salary = salary;
    input.join_date = payload.join_date;

    let (_, employee) = create_employee_account(pool.get_ref(), input).await?;

    info!(admin = auth.user_id, employee_id = employee.id, "Employee created");

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee created",
        "employee": employee,
    })))
}

/* =========================
Attendance (admin)
========================= */

#[derive(Debug, Deserialize, IntoParams)]
pub struct DayQuery {
    /// YYYY-MM-DD
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyAttendance {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub summary: DailySummary,
    pub attendance: Vec<EmployeeAttendance>,
}

/// Attendance sheet for one day
#[utoipa::path(
    get,
    path = "/admin/attendance/daily",
    params(DayQuery),
    responses(
        (status = 200, description = "Records for the day (default today) with a status summary", body = DailyAttendance),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn daily_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DayQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let date = query.date.unwrap_or_else(today);

    let attendance = sqlx::query_as::<_, EmployeeAttendance>(
        r#"
        SELECT
            a.id,
            a.employee_id,
            e.full_name,
            e.department,
            u.email,
            a.date,
            a.check_in,
            a.check_out,
            a.status
        FROM attendance a
        JOIN employees e ON e.id = a.employee_id
        LEFT JOIN users u ON u.employee_id = e.id
        WHERE a.date = ?
        ORDER BY e.full_name ASC
        "#,
    )
    .bind(date)
    .fetch_all(pool.get_ref())
    .await?;

    let summary = report::daily_summary(attendance.iter().map(|r| r.status));

    Ok(HttpResponse::Ok().json(DailyAttendance {
        date,
        summary,
        attendance,
    }))
}

/// Record ABSENT for everyone without attendance or approved leave on a past
/// day (default yesterday)
#[utoipa::path(
    post,
    path = "/admin/attendance/mark-absent",
    params(DayQuery),
    responses(
        (status = 200, description = "Absence sweep finished", body = Object, example = json!({
            "date": "2026-01-05",
            "marked": 2
        })),
        (status = 400, description = "Date is today or in the future"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn mark_absent(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DayQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let date = sweep_date(query.date, today())?;

    let employee_ids: Vec<u64> = sqlx::query_scalar("SELECT id FROM employees ORDER BY id")
        .fetch_all(pool.get_ref())
        .await?;

    let recorded: HashSet<u64> =
        sqlx::query_scalar::<_, u64>("SELECT employee_id FROM attendance WHERE date = ?")
            .bind(date)
            .fetch_all(pool.get_ref())
            .await?
            .into_iter()
            .collect();

    let on_leave: HashSet<u64> = on_leave_ids(pool.get_ref(), date)
        .await?
        .into_iter()
        .collect();

    let candidates = absent_candidates(&employee_ids, &recorded, &on_leave);

    let mut tx = pool.begin().await?;
    let mut marked = 0u64;
    for employee_id in &candidates {
        // unique (employee_id, date) keeps repeated sweeps idempotent
        marked += sqlx::query(
            "INSERT IGNORE INTO attendance (employee_id, date, status) VALUES (?, ?, ?)",
        )
        .bind(employee_id)
        .bind(date)
        .bind(AttendanceStatus::Absent.as_ref())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to mark absence");
            AppError::Internal
        })?
        .rows_affected();
    }
    tx.commit().await?;

    info!(admin = auth.user_id, %date, marked, "Absence sweep finished");

    Ok(HttpResponse::Ok().json(json!({
        "date": date,
        "marked": marked,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn daily_sheet_lists_rows_under_attendance() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let row = EmployeeAttendance {
            id: 1,
            employee_id: 3,
            full_name: "Ada Lovelace".to_string(),
            department: "Engineering".to_string(),
            email: Some("ada@dayflow.test".to_string()),
            date,
            check_in: date.and_hms_opt(9, 0, 0),
            check_out: None,
            status: AttendanceStatus::Present,
        };
        let sheet = DailyAttendance {
            date,
            summary: report::daily_summary([row.status]),
            attendance: vec![row],
        };

        let body = serde_json::to_value(&sheet).unwrap();
        assert_eq!(body["date"], "2026-01-05");
        assert_eq!(body["summary"]["present"], 1);
        assert_eq!(body["summary"]["halfDay"], 0);
        assert_eq!(body["attendance"][0]["fullName"], "Ada Lovelace");
        assert_eq!(body.get("records"), None::<&Value>);
    }

    #[test]
    fn weekly_attendance_body_is_a_plain_list() {
        let monday = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let week = report::weekly_attendance(monday, &[(monday, AttendanceStatus::Present)]);

        let body = serde_json::to_value(&week.days).unwrap();
        let days = body.as_array().unwrap();
        assert_eq!(days.len(), 5);
        assert_eq!(days[0]["day"], "Mon");
        assert_eq!(days[0]["present"], 1);
        assert_eq!(days[4]["absent"], 0);
    }
}
