use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveType {
    Paid,
    Sick,
    Unpaid,
}

impl LeaveType {
    /// Fixed annual allotment.
    pub fn quota(self) -> i64 {
        match self {
            LeaveType::Paid => 15,
            LeaveType::Sick => 10,
            LeaveType::Unpaid => 5,
        }
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl TryFrom<String> for LeaveType {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for LeaveStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "employeeId": 1000,
    "type": "SICK",
    "startDate": "2026-01-01",
    "endDate": "2026-01-03",
    "reason": "Flu",
    "status": "PENDING",
    "adminNote": null,
    "createdAt": "2026-01-01T08:00:00",
    "reviewedAt": null
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub leave_type: LeaveType,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub reason: String,
    #[sqlx(try_from = "String")]
    pub status: LeaveStatus,
    pub admin_note: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub reviewed_at: Option<NaiveDateTime>,
}

/// Leave request joined with the requesting employee, for admin views.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeLeave {
    pub id: u64,
    pub employee_id: u64,
    pub full_name: String,
    pub department: String,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub leave_type: LeaveType,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub reason: String,
    #[sqlx(try_from = "String")]
    pub status: LeaveStatus,
    pub admin_note: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}
