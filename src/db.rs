use crate::auth::password::hash_password;
use crate::error::AppError;
use crate::model::role::Role;
use crate::utils::{email_cache, email_filter};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::time::Duration;

pub async fn init_db(database_url: &str, max_connections: u32) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await
}

/// MySQL reports duplicate keys as SQLSTATE 23000.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() || db_err.code().as_deref() == Some("23000")
        }
        _ => false,
    }
}

/// Maps a failed write, turning a duplicate key into `duplicate()`.
pub fn or_duplicate(err: sqlx::Error, duplicate: impl FnOnce() -> AppError) -> AppError {
    if is_unique_violation(&err) {
        duplicate()
    } else {
        err.into()
    }
}

/// Creates the first ADMIN login (with its employee profile) when no admin
/// exists yet. Returns `true` when an account was created.
pub async fn seed_admin(pool: &MySqlPool, email: &str, password: &str) -> anyhow::Result<bool> {
    let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role_id = ?")
        .bind(Role::Admin.id())
        .fetch_one(pool)
        .await?;
    if admins > 0 {
        return Ok(false);
    }

    let password_hash =
        hash_password(password).map_err(|e| anyhow::anyhow!("Password hashing failed: {e}"))?;
    let email = email_filter::normalize(email);

    let mut tx = pool.begin().await?;

    let employee_id = sqlx::query(
        r#"
        INSERT INTO employees (employee_code, full_name, job_title, department, salary, join_date)
        VALUES ('EMP-ADMIN-001', 'Admin User', 'Administrator', 'HR', 0, CURDATE())
        "#,
    )
    .execute(&mut *tx)
    .await?
    .last_insert_id();

    let user_id = sqlx::query(
        "INSERT INTO users (email, password, role_id, employee_id) VALUES (?, ?, ?, ?)",
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(Role::Admin.id())
    .bind(employee_id)
    .execute(&mut *tx)
    .await?
    .last_insert_id();

    tx.commit().await?;
    email_filter::insert(&email);
    email_cache::remember(&email, user_id).await;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::fmt;

    #[derive(Debug)]
    struct DuplicateCode;

    impl fmt::Display for DuplicateCode {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("Duplicate entry 'EMP-0004' for key 'uq_employees_code'")
        }
    }

    impl std::error::Error for DuplicateCode {}

    impl DatabaseError for DuplicateCode {
        fn message(&self) -> &str {
            "Duplicate entry 'EMP-0004' for key 'uq_employees_code'"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23000"))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn duplicate_key_maps_to_caller_error() {
        let err = sqlx::Error::Database(Box::new(DuplicateCode));
        assert!(is_unique_violation(&err));

        let mapped = or_duplicate(err, || AppError::bad_request("Please retry"));
        assert!(matches!(mapped, AppError::BadRequest(ref m) if m == "Please retry"));
    }

    #[test]
    fn other_errors_stay_internal() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));

        let mapped = or_duplicate(sqlx::Error::PoolTimedOut, || {
            AppError::bad_request("Please retry")
        });
        assert!(matches!(mapped, AppError::Internal));
    }
}
