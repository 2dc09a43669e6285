use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::leave_request::{EmployeeLeave, LeaveRequest, LeaveStatus, LeaveType},
    service::leave::{self as ledger, Application, LeaveError},
};
use actix_web::{HttpResponse, web};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

const LEAVE_SELECT: &str = r#"
    SELECT id, employee_id, leave_type, start_date, end_date, reason,
           status, admin_note, created_at, reviewed_at
    FROM leave_requests
"#;

const EMPLOYEE_LEAVE_SELECT: &str = r#"
    SELECT l.id, l.employee_id, e.full_name, e.department, l.leave_type,
           l.start_date, l.end_date, l.reason, l.status, l.admin_note, l.created_at
    FROM leave_requests l
    JOIN employees e ON e.id = l.employee_id
"#;

async fn leaves_of(pool: &MySqlPool, employee_id: u64) -> Result<Vec<LeaveRequest>, sqlx::Error> {
    let sql = format!("{LEAVE_SELECT} WHERE employee_id = ? ORDER BY created_at DESC, id DESC");
    sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(employee_id)
        .fetch_all(pool)
        .await
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyLeave {
    #[serde(rename = "type")]
    #[schema(example = "SICK")]
    pub leave_type: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-01-03", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = "Flu")]
    pub reason: Option<String>,
}

/* =========================
Apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/leave/apply",
    request_body(
        content = ApplyLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave request submitted",
            "leave": {
                "id": 1, "employeeId": 1000, "type": "SICK",
                "startDate": "2026-01-01", "endDate": "2026-01-03", "reason": "Flu",
                "status": "PENDING", "adminNote": null,
                "createdAt": "2026-01-01T08:00:00", "reviewedAt": null
            }
        })),
        (status = 400, description = "Missing fields, invalid range or overlapping request", body = Object, example = json!({
            "message": "All fields are required"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn apply(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ApplyLeave>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.require_employee()?;
    let payload = payload.into_inner();

    let leave_type = ledger::parse_leave_type(payload.leave_type.as_deref())?;

    let existing = leaves_of(pool.get_ref(), employee_id).await?;
    let new = ledger::validate_application(
        Application {
            leave_type,
            start_date: payload.start_date,
            end_date: payload.end_date,
            reason: payload.reason,
        },
        &existing,
    )?;

    let leave_id = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, leave_type, start_date, end_date, reason, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(new.leave_type.as_ref())
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(&new.reason)
    .bind(LeaveStatus::Pending.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to create leave request");
        AppError::Internal
    })?
    .last_insert_id();

    let sql = format!("{LEAVE_SELECT} WHERE id = ?");
    let leave = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(leave_id)
        .fetch_one(pool.get_ref())
        .await?;

    debug!(employee_id, leave_id, "Leave request submitted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave request submitted",
        "leave": leave,
    })))
}

/// Own leave requests, newest first
#[utoipa::path(
    get,
    path = "/leave/my",
    responses(
        (status = 200, description = "Own leave requests", body = [LeaveRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.require_employee()?;
    let leaves = leaves_of(pool.get_ref(), employee_id).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BalanceQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
}

/// Remaining leave per type
#[utoipa::path(
    get,
    path = "/leave/balance",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Leave balance", body = crate::service::leave::LeaveBalance, example = json!({
            "year": 2026,
            "paid": { "total": 15, "used": 2, "remaining": 13 },
            "sick": { "total": 10, "used": 0, "remaining": 10 },
            "unpaid": { "total": 5, "used": 0, "remaining": 5 }
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<BalanceQuery>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.require_employee()?;
    let year = query
        .year
        .unwrap_or_else(|| chrono::Local::now().date_naive().year());

    let sql = format!(
        "{LEAVE_SELECT} WHERE employee_id = ? AND status = ? AND YEAR(start_date) = ?"
    );
    let approved = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(employee_id)
        .bind(LeaveStatus::Approved.as_ref())
        .bind(year)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(ledger::balance(year, &approved)))
}

/// Pending requests, oldest first (admin)
#[utoipa::path(
    get,
    path = "/leave/pending",
    responses(
        (status = 200, description = "Pending leave requests", body = [EmployeeLeave]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn pending(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let sql = format!("{EMPLOYEE_LEAVE_SELECT} WHERE l.status = ? ORDER BY l.created_at ASC, l.id ASC");
    let leaves = sqlx::query_as::<_, EmployeeLeave>(&sql)
        .bind(LeaveStatus::Pending.as_ref())
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(leaves))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaveFilter {
    /// PENDING, APPROVED, REJECTED or ALL
    pub status: Option<String>,
    /// PAID, SICK, UNPAID or ALL
    #[serde(rename = "type")]
    pub leave_type: Option<String>,
}

/// All leave requests with optional filters (admin)
#[utoipa::path(
    get,
    path = "/leave/all",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Leave requests, newest first", body = [EmployeeLeave]),
        (status = 400, description = "Invalid filter value"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn all(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let status = ledger::parse_filter::<LeaveStatus>(query.status.as_deref())?;
    let leave_type = ledger::parse_filter::<LeaveType>(query.leave_type.as_deref())?;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<String> = Vec::new();

    if let Some(status) = status {
        where_sql.push_str(" AND l.status = ?");
        args.push(status.to_string());
    }

    if let Some(leave_type) = leave_type {
        where_sql.push_str(" AND l.leave_type = ?");
        args.push(leave_type.to_string());
    }

    let sql = format!("{EMPLOYEE_LEAVE_SELECT}{where_sql} ORDER BY l.created_at DESC, l.id DESC");

    let mut data_q = sqlx::query_as::<_, EmployeeLeave>(&sql);
    for arg in args {
        data_q = data_q.bind(arg);
    }

    let leaves = data_q.fetch_all(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLeave {
    #[schema(example = "APPROVED")]
    pub status: Option<String>,
    #[schema(example = "Get well soon")]
    pub admin_note: Option<String>,
}

/* =========================
Approve / reject leave (Admin)
========================= */
#[utoipa::path(
    patch,
    path = "/leave/{leave_id}/status",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to review")
    ),
    request_body = ReviewLeave,
    responses(
        (status = 200, description = "Leave reviewed", body = Object, example = json!({
            "message": "Leave request approved",
            "leave": {
                "id": 1, "employeeId": 1000, "type": "SICK",
                "startDate": "2026-01-01", "endDate": "2026-01-03", "reason": "Flu",
                "status": "APPROVED", "adminNote": "Get well soon",
                "createdAt": "2026-01-01T08:00:00", "reviewedAt": "2026-01-01T10:00:00"
            }
        })),
        (status = 400, description = "Invalid status or already processed", body = Object, example = json!({
            "message": "Leave request already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ReviewLeave>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let leave_id = path.into_inner();
    let payload = payload.into_inner();

    let requested = payload.status.unwrap_or_default().trim().to_ascii_uppercase();
    let next = ledger::parse_decision(&requested)?;
    let admin_note = payload
        .admin_note
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let select = format!("{LEAVE_SELECT} WHERE id = ?");
    let current = sqlx::query_as::<_, LeaveRequest>(&select)
        .bind(leave_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| AppError::not_found("Leave request not found"))?;

    let next = ledger::transition(current.status, next)?;

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, admin_note = ?, reviewed_at = NOW()
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(next.as_ref())
    .bind(&admin_note)
    .bind(leave_id)
    .bind(LeaveStatus::Pending.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Leave review failed");
        AppError::Internal
    })?;

    // reviewed concurrently by someone else
    if result.rows_affected() == 0 {
        return Err(LeaveError::AlreadyProcessed.into());
    }

    let leave = sqlx::query_as::<_, LeaveRequest>(&select)
        .bind(leave_id)
        .fetch_one(pool.get_ref())
        .await?;

    info!(leave_id, admin = auth.user_id, status = %next, "Leave request reviewed");

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Leave request {}", next.as_ref().to_lowercase()),
        "leave": leave,
    })))
}
