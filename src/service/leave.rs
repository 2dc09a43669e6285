//! Leave applications, review transitions and quota accounting.

use crate::error::AppError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use chrono::{Datelike, NaiveDate};
use derive_more::Display;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Display, PartialEq, Eq)]
pub enum LeaveError {
    #[display(fmt = "All fields are required")]
    MissingFields,
    #[display(fmt = "startDate cannot be after endDate")]
    InvalidRange,
    #[display(fmt = "Leave overlaps an existing request ({})", _0)]
    Overlap(u64),
    #[display(fmt = "Invalid leave type. Allowed: PAID, SICK, UNPAID")]
    InvalidType,
    #[display(fmt = "Invalid status")]
    InvalidStatus,
    #[display(fmt = "Leave request already processed")]
    AlreadyProcessed,
}

impl From<LeaveError> for AppError {
    fn from(e: LeaveError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

/// Raw application as submitted; every field is checked by [`validate_application`].
#[derive(Debug, Default)]
pub struct Application {
    pub leave_type: Option<LeaveType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct NewLeave {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

fn overlaps(a_start: NaiveDate, a_end: NaiveDate, b_start: NaiveDate, b_end: NaiveDate) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// `existing` is the employee's own requests; rejected ones never block.
pub fn validate_application(
    application: Application,
    existing: &[LeaveRequest],
) -> Result<NewLeave, LeaveError> {
    let reason = application
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    let (Some(leave_type), Some(start_date), Some(end_date), Some(reason)) = (
        application.leave_type,
        application.start_date,
        application.end_date,
        reason,
    ) else {
        return Err(LeaveError::MissingFields);
    };

    if start_date > end_date {
        return Err(LeaveError::InvalidRange);
    }

    if let Some(clash) = existing.iter().find(|l| {
        l.status != LeaveStatus::Rejected && overlaps(start_date, end_date, l.start_date, l.end_date)
    }) {
        return Err(LeaveError::Overlap(clash.id));
    }

    Ok(NewLeave {
        leave_type,
        start_date,
        end_date,
        reason,
    })
}

/// Leave type of an application. Absent or blank is left to
/// [`validate_application`]; anything else must name a concrete type.
pub fn parse_leave_type(raw: Option<&str>) -> Result<Option<LeaveType>, LeaveError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .to_ascii_uppercase()
            .parse::<LeaveType>()
            .map(Some)
            .map_err(|_| LeaveError::InvalidType),
    }
}

/// Parses a requested review decision. Only a final state may be requested.
pub fn parse_decision(status: &str) -> Result<LeaveStatus, LeaveError> {
    match status.parse::<LeaveStatus>() {
        Ok(s @ (LeaveStatus::Approved | LeaveStatus::Rejected)) => Ok(s),
        _ => Err(LeaveError::InvalidStatus),
    }
}

/// Pending is the only state a request can leave.
pub fn transition(current: LeaveStatus, next: LeaveStatus) -> Result<LeaveStatus, LeaveError> {
    match (current, next) {
        (LeaveStatus::Pending, LeaveStatus::Approved | LeaveStatus::Rejected) => Ok(next),
        (LeaveStatus::Pending, LeaveStatus::Pending) => Err(LeaveError::InvalidStatus),
        _ => Err(LeaveError::AlreadyProcessed),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct BalanceEntry {
    pub total: i64,
    pub used: i64,
    /// Not clamped; overspending shows up as a negative number.
    pub remaining: i64,
}

#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaveBalance {
    pub year: i32,
    pub paid: BalanceEntry,
    pub sick: BalanceEntry,
    pub unpaid: BalanceEntry,
}

/// remaining = quota - number of approved requests starting within `year`.
pub fn balance(year: i32, requests: &[LeaveRequest]) -> LeaveBalance {
    let entry = |leave_type: LeaveType| {
        let used = requests
            .iter()
            .filter(|r| r.status == LeaveStatus::Approved)
            .filter(|r| r.leave_type == leave_type)
            .filter(|r| r.start_date.year() == year)
            .count() as i64;
        BalanceEntry {
            total: leave_type.quota(),
            used,
            remaining: leave_type.quota() - used,
        }
    };

    LeaveBalance {
        year,
        paid: entry(LeaveType::Paid),
        sick: entry(LeaveType::Sick),
        unpaid: entry(LeaveType::Unpaid),
    }
}

/// Filter value of the admin listing: `ALL` or missing means no filter.
pub fn parse_filter<T: std::str::FromStr>(raw: Option<&str>) -> Result<Option<T>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("ALL") => Ok(None),
        Some(v) => v
            .to_ascii_uppercase()
            .parse()
            .map(Some)
            .map_err(|_| AppError::bad_request(format!("Invalid filter value: {v}"))),
    }
}
