use crate::{
    auth::{auth::AuthUser, password::hash_password},
    db::or_duplicate,
    error::AppError,
    model::{
        employee::{Employee, employee_code},
        role::Role,
    },
    utils::{
        db_utils::{build_update_sql, execute_update},
        email_cache, email_filter,
    },
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::{debug, error};

pub(crate) const EMPLOYEE_SELECT: &str = r#"
    SELECT
        e.id,
        e.employee_code,
        e.full_name,
        u.email,
        e.phone,
        e.job_title,
        e.department,
        e.salary,
        e.join_date,
        e.created_at
    FROM employees e
    LEFT JOIN users u ON u.employee_id = e.id
"#;

/// JSON keys an employee may change on their own profile.
const PROFILE_FIELDS: &[(&str, &str)] = &[
    ("fullName", "full_name"),
    ("phone", "phone"),
    ("jobTitle", "job_title"),
    ("department", "department"),
];

/// Validated input for a new login + employee profile.
#[derive(Debug, PartialEq)]
pub struct AccountInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub job_title: String,
    pub department: String,
    pub salary: f64,
    pub join_date: Option<NaiveDate>,
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AccountInput {
    /// Email, password, full name, job title and department are required.
    pub fn new(
        email: Option<String>,
        password: Option<String>,
        full_name: Option<String>,
        phone: Option<String>,
        job_title: Option<String>,
        department: Option<String>,
    ) -> Result<Self, AppError> {
        let (Some(email), Some(password), Some(full_name), Some(job_title), Some(department)) = (
            present(email).map(|e| email_filter::normalize(&e)),
            password.filter(|p| !p.is_empty()),
            present(full_name),
            present(job_title),
            present(department),
        ) else {
            return Err(AppError::bad_request(
                "Email, password, full name, job title, and department are required",
            ));
        };

        Ok(Self {
            email,
            password,
            full_name,
            phone: present(phone),
            job_title,
            department,
            salary: 0.0,
            join_date: None,
        })
    }
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, pool: &MySqlPool) -> Result<bool, AppError> {
    // 1️⃣ Cuckoo filter: fast negative
    if !email_filter::might_exist(email) {
        return Ok(true);
    }

    // 2️⃣ Moka cache: fast positive
    if email_cache::owner(email).await.is_some() {
        return Ok(false);
    }

    // 3️⃣ Database fallback
    let owner = sqlx::query_scalar::<_, u64>("SELECT id FROM users WHERE email = ?")
        .bind(email_filter::normalize(email))
        .fetch_optional(pool)
        .await?;

    match owner {
        Some(user_id) => {
            email_cache::remember(email, user_id).await;
            Ok(false)
        }
        None => Ok(true),
    }
}

pub(crate) async fn fetch_employee(
    pool: &MySqlPool,
    employee_id: u64,
) -> Result<Option<Employee>, AppError> {
    let sql = format!("{EMPLOYEE_SELECT} WHERE e.id = ?");
    Ok(sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(pool)
        .await?)
}

/// Creates the employee profile and its EMPLOYEE login in one transaction.
/// Returns the new user id and the stored profile.
pub(crate) async fn create_employee_account(
    pool: &MySqlPool,
    input: AccountInput,
) -> Result<(u64, Employee), AppError> {
    let taken = || AppError::bad_request("User with this email already exists");

    if !is_email_available(&input.email, pool).await? {
        return Err(taken());
    }

    let password_hash = hash_password(&input.password).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        AppError::Internal
    })?;

    let mut tx = pool.begin().await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(&mut *tx)
        .await?;
    let code = employee_code(count);
    let join_date = input
        .join_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let employee_id = sqlx::query(
        r#"
        INSERT INTO employees
            (employee_code, full_name, phone, job_title, department, salary, join_date)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&code)
    .bind(&input.full_name)
    .bind(&input.phone)
    .bind(&input.job_title)
    .bind(&input.department)
    .bind(input.salary)
    .bind(join_date)
    .execute(&mut *tx)
    .await
    // concurrent registrations can compute the same code
    .map_err(|e| {
        or_duplicate(e, || AppError::bad_request("Registration conflict, please retry"))
    })?
    .last_insert_id();

    let user_id = sqlx::query(
        r#"INSERT INTO users (email, password, role_id, employee_id) VALUES (?, ?, ?, ?)"#,
    )
    .bind(&input.email)
    .bind(&password_hash)
    .bind(Role::Employee.id())
    .bind(employee_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| or_duplicate(e, taken))?
    .last_insert_id();

    tx.commit().await?;

    // keep filter and cache in step with the users table
    email_filter::insert(&input.email);
    email_cache::remember(&input.email, user_id).await;

    debug!(user_id, employee_id, code = %code, "Employee account created");

    let employee = fetch_employee(pool, employee_id)
        .await?
        .ok_or(AppError::Internal)?;

    Ok((user_id, employee))
}

/// Own employee profile
#[utoipa::path(
    get,
    path = "/employee/profile",
    responses(
        (status = 200, description = "Employee profile", body = Employee),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.require_employee()?;

    match fetch_employee(pool.get_ref(), employee_id).await? {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Err(AppError::not_found("Employee not found")),
    }
}

/// Update own profile
///
/// Accepts any subset of `fullName`, `phone`, `jobTitle`, `department`.
#[utoipa::path(
    patch,
    path = "/employee/profile",
    request_body(content = Object, example = json!({ "phone": "+8801700000000" })),
    responses(
        (status = 200, description = "Updated profile", body = Employee),
        (status = 400, description = "Unknown or invalid field"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn update_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.require_employee()?;

    let update = build_update_sql("employees", &body, PROFILE_FIELDS, "id", employee_id)?;
    debug!(sql = %update.sql, employee_id, "Updating profile");

    execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, employee_id, "Failed to update profile");
        AppError::Internal
    })?;

    // MySQL reports 0 affected rows when nothing changed, so re-read instead.
    match fetch_employee(pool.get_ref(), employee_id).await? {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Err(AppError::not_found("Employee not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn account_input_normalizes_and_trims() {
        let input = AccountInput::new(
            s(" Jane@Dayflow.COM "),
            s("secret123"),
            s(" Jane Doe "),
            s("   "),
            s("Developer"),
            s("Engineering"),
        )
        .unwrap();

        assert_eq!(input.email, "jane@dayflow.com");
        assert_eq!(input.full_name, "Jane Doe");
        assert_eq!(input.phone, None);
        assert_eq!(input.salary, 0.0);
    }

    #[test]
    fn account_input_requires_core_fields() {
        let err = AccountInput::new(
            s("jane@dayflow.com"),
            s("secret123"),
            s("Jane Doe"),
            None,
            None,
            s("Engineering"),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        assert!(
            AccountInput::new(s("a@b.c"), s(""), s("A"), None, s("Dev"), s("Eng")).is_err()
        );
    }
}
