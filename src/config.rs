use crate::service::attendance::clamp_window_days;
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,

    // Bootstrap admin, created at startup when both are set
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,

    // Attendance rules
    pub half_day_threshold_minutes: i64,
    pub attendance_rate_window_days: i64,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn optional<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            db_max_connections: optional("DB_MAX_CONNECTIONS", 10)?,
            access_token_ttl: optional("ACCESS_TOKEN_TTL", 86_400)?, // 1 day

            rate_login_per_min: optional("RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: optional("RATE_REGISTER_PER_MIN", 30)?,
            rate_protected_per_min: optional("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_default(),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            admin_email: env::var("ADMIN_EMAIL").ok().filter(|v| !v.trim().is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),

            half_day_threshold_minutes: optional("HALF_DAY_THRESHOLD_MINUTES", 240)?.clamp(0, 24 * 60),
            attendance_rate_window_days: clamp_window_days(optional(
                "ATTENDANCE_RATE_WINDOW_DAYS",
                30,
            )?),
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "mysql://localhost/dayflow_test".to_string(),
            db_max_connections: 1,
            jwt_secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            access_token_ttl: 900,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: String::new(),
            log_dir: "logs".to_string(),
            admin_email: None,
            admin_password: None,
            half_day_threshold_minutes: 240,
            attendance_rate_window_days: 30,
        }
    }
}
