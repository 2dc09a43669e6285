use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": 1,
        "employeeCode": "EMP-0001",
        "fullName": "John Doe",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "jobTitle": "Developer",
        "department": "Engineering",
        "salary": 50000.0,
        "joinDate": "2024-01-01",
        "createdAt": "2024-01-01T09:00:00"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-0001")]
    pub employee_code: String,

    #[schema(example = "John Doe")]
    pub full_name: String,

    /// Login email of the linked user
    #[schema(example = "john.doe@company.com", nullable = true)]
    pub email: Option<String>,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "Developer")]
    pub job_title: String,

    #[schema(example = "Engineering")]
    pub department: String,

    #[schema(example = 50000.0)]
    pub salary: f64,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub join_date: NaiveDate,

    #[schema(example = "2024-01-01T09:00:00", value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

/// Employee codes are sequential: `EMP-0001`, `EMP-0002`, ...
pub fn employee_code(existing_count: i64) -> String {
    format!("EMP-{:04}", existing_count + 1)
}
