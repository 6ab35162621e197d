use crate::api::attendance::AttendanceRequest;
use crate::model::attendance::{AttendanceStatus, AttendanceView, Category};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance API",
        version = "1.0.0",
        description = r#"
## Attendance Recording

Daily attendance for employees: one record per user per day.

### Key Features
- **Recording**
  - Check in, check out, or take annual leave for today
- **History**
  - A user's records, most recent first, and today's status
- **Administration**
  - All users' records for a date range
  - Report export (`attendance_YYYYMMDD_to_YYYYMMDD.csv`)

### Response Format
- JSON views with a derived `status` (`IN_PROGRESS`, `COMPLETED`, `ANNUAL_LEAVE`)
- Errors as `{"message": "..."}` with 400 / 404 / 409
"#,
    ),
    paths(
        crate::api::attendance::record_attendance,
        crate::api::attendance::user_records,
        crate::api::attendance::today,
        crate::api::attendance::range,
        crate::api::attendance::export
    ),
    components(
        schemas(
            AttendanceRequest,
            AttendanceView,
            AttendanceStatus,
            Category
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance recording and reporting APIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_attendance_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/attendance/record",
            "/api/attendance/user/{user_id}",
            "/api/attendance/today/{user_id}",
            "/api/attendance/range",
            "/api/attendance/export",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}
