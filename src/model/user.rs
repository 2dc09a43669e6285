use sqlx::FromRow;

/// Login credential; `employee_id` links to the employee profile.
#[derive(Debug, FromRow)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub password: String,
    pub role_id: u8,
    pub employee_id: Option<u64>,
}
