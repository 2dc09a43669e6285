use crate::{
    api::employee::{AccountInput, create_employee_account},
    auth::{jwt::generate_access_token, password::verify_password},
    config::Config,
    error::AppError,
    model::{role::Role, user::User},
    models::{LoginReqDto, RegisterReq},
    utils::email_filter,
};
use actix_web::{HttpResponse, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

fn issue_token(
    user_id: u64,
    email: &str,
    role: Role,
    employee_id: Option<u64>,
    config: &Config,
) -> Result<String, AppError> {
    generate_access_token(
        user_id,
        email.to_string(),
        role.id(),
        employee_id,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, user_id, "Failed to sign access token");
        AppError::Internal
    })
}

/// User registration handler
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 200, description = "Registered; employee profile created", body = Object, example = json!({
            "message": "Registration successful",
            "token": "eyJ...",
            "role": "EMPLOYEE",
            "user": { "id": 2, "email": "jane@dayflow.com", "role": "EMPLOYEE" },
            "employee": { "id": 2, "fullName": "Jane Doe", "employeeCode": "EMP-0002" }
        })),
        (status = 400, description = "Missing fields or email already registered")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(pool, config, payload))]
pub async fn register(
    payload: web::Json<RegisterReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    let input = AccountInput::new(
        payload.email,
        payload.password,
        payload.full_name,
        payload.phone,
        payload.job_title,
        payload.department,
    )?;

    let (user_id, employee) = create_employee_account(pool.get_ref(), input).await?;
    let email = employee.email.clone().unwrap_or_default();

    let token = issue_token(user_id, &email, Role::Employee, Some(employee.id), &config)?;

    info!(user_id, employee_id = employee.id, "Registration successful");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Registration successful",
        "token": token,
        "role": Role::Employee,
        "user": {
            "id": user_id,
            "email": email,
            "role": Role::Employee,
        },
        "employee": {
            "id": employee.id,
            "fullName": employee.full_name,
            "employeeCode": employee.employee_code,
        },
    })))
}

/// Login handler
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login successful", body = Object, example = json!({
            "message": "Login successful",
            "token": "eyJ...",
            "role": "ADMIN"
        })),
        (status = 400, description = "Email and password required"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(pool, config, payload))]
pub async fn login(
    payload: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    // 1️⃣ Basic validation
    let (Some(email), Some(password)) = (
        payload
            .email
            .as_deref()
            .map(email_filter::normalize)
            .filter(|e| !e.is_empty()),
        payload.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        info!("Validation failed: empty email or password");
        return Err(AppError::bad_request("Email and password required"));
    };

    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    // 2️⃣ Fetch user
    let Some(db_user) = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password, role_id, employee_id
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await?
    else {
        info!("Invalid credentials: user not found");
        return Err(invalid());
    };

    debug!(user_id = db_user.id, "User found");

    // 3️⃣ Verify password
    let matches = verify_password(password, &db_user.password).map_err(|e| {
        error!(error = %e, user_id = db_user.id, "Stored password hash is malformed");
        AppError::Internal
    })?;
    if !matches {
        info!("Invalid credentials: password mismatch");
        return Err(invalid());
    }

    let role = Role::from_id(db_user.role_id).ok_or_else(|| {
        error!(user_id = db_user.id, role_id = db_user.role_id, "Unknown role id");
        AppError::Internal
    })?;

    // 4️⃣ Generate access token
    let token = issue_token(db_user.id, &db_user.email, role, db_user.employee_id, &config)?;

    // 5️⃣ Update last_login_at (non-fatal)
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(user_id = db_user.id, "Login successful");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Login successful",
        "token": token,
        "role": role,
    })))
}
