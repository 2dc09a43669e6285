use crate::api::admin::{CreateEmployee, DailyAttendance};
use crate::api::leave::{ApplyLeave, ReviewLeave};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, EmployeeAttendance};
use crate::model::employee::Employee;
use crate::model::leave_request::{EmployeeLeave, LeaveRequest, LeaveStatus, LeaveType};
use crate::models::{LoginReqDto, RegisterReq};
use crate::service::attendance::{AttendanceStats, DayState, HistoryEntry};
use crate::service::leave::{BalanceEntry, LeaveBalance};
use crate::service::report::{
    Activity, ActivityKind, DailySummary, DashboardStats, DepartmentShare, WeekdayAttendance,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dayflow HRMS API",
        version = "1.0.0",
        description = r#"
## Dayflow: attendance and leave management

### 🔹 Key Features
- **Attendance**
  - Daily check-in / check-out, history, monthly calendar and personal stats
- **Leave**
  - Apply for PAID / SICK / UNPAID leave, track balance, admin review
- **Admin dashboard**
  - Headline stats, weekly attendance, department distribution, recent activity
- **Employees**
  - Self-service profile, admin onboarding and listing

### 🔐 Security
All endpoints except `/auth/*` and `/health` require a **JWT Bearer** token.
Admin endpoints additionally require the **ADMIN** role.

### 📦 Response Format
- JSON with camelCase fields; enum values in SCREAMING_SNAKE_CASE
- Errors are `{"message": "..."}`
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today,
        crate::api::attendance::history,
        crate::api::attendance::calendar,
        crate::api::attendance::stats,

        crate::api::leave::apply,
        crate::api::leave::my_leaves,
        crate::api::leave::balance,
        crate::api::leave::pending,
        crate::api::leave::all,
        crate::api::leave::update_status,

        crate::api::employee::get_profile,
        crate::api::employee::update_profile,

        crate::api::admin::dashboard_stats,
        crate::api::admin::weekly_attendance,
        crate::api::admin::departments,
        crate::api::admin::list_employees,
        crate::api::admin::create_employee,
        crate::api::admin::daily_attendance,
        crate::api::admin::mark_absent,
        crate::api::admin::activity
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            Employee,
            CreateEmployee,
            AttendanceStatus,
            AttendanceRecord,
            EmployeeAttendance,
            HistoryEntry,
            DayState,
            AttendanceStats,
            LeaveType,
            LeaveStatus,
            LeaveRequest,
            EmployeeLeave,
            ApplyLeave,
            ReviewLeave,
            BalanceEntry,
            LeaveBalance,
            DashboardStats,
            WeekdayAttendance,
            DepartmentShare,
            ActivityKind,
            Activity,
            DailySummary,
            DailyAttendance
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Attendance", description = "Employee attendance APIs"),
        (name = "Leave", description = "Leave application and review APIs"),
        (name = "Employee", description = "Employee self-service APIs"),
        (name = "Admin", description = "Admin dashboard and management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_registers_bearer_scheme_and_paths() {
        let doc = ApiDoc::openapi();

        let components = doc.components.expect("components should be generated");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("LeaveBalance"));
        assert!(components.schemas.contains_key("WeekdayAttendance"));
        assert!(components.schemas.contains_key("DailyAttendance"));

        assert!(doc.paths.paths.contains_key("/attendance/check-in"));
        assert!(doc.paths.paths.contains_key("/leave/{leave_id}/status"));
        assert!(doc.paths.paths.contains_key("/admin/attendance/mark-absent"));
    }
}
