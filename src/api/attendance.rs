use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDateTime;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::service::{AttendanceService, ReportBuilder};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest {
    #[schema(example = 1000)]
    pub user_id: u64,
    /// CHECK_IN, CHECK_OUT or ANNUAL_LEAVE
    #[serde(rename = "type")]
    #[schema(example = "CHECK_IN")]
    pub kind: String,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RangeQuery {
    /// Inclusive lower bound, local time
    #[param(example = "2026-01-01T00:00:00", value_type = String)]
    pub start_date: NaiveDateTime,
    /// Inclusive upper bound, local time
    #[param(example = "2026-01-31T23:59:59", value_type = String)]
    pub end_date: NaiveDateTime,
}

/// Record a check-in, check-out or annual leave for today
#[utoipa::path(
    post,
    path = "/api/attendance/record",
    request_body(
        content = AttendanceRequest,
        description = "User and attendance type",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Attendance recorded", body = crate::model::attendance::AttendanceView),
        (status = 400, description = "Unknown attendance type", body = Object, example = json!({
            "message": "unknown attendance type: LUNCH"
        })),
        (status = 404, description = "User or today's check-in not found", body = Object, example = json!({
            "message": "no check-in found today"
        })),
        (status = 409, description = "Conflicts with today's record", body = Object, example = json!({
            "message": "already checked in today"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn record_attendance(
    service: web::Data<AttendanceService>,
    payload: web::Json<AttendanceRequest>,
) -> actix_web::Result<impl Responder> {
    let view = service
        .record_requested(payload.user_id, &payload.kind)
        .await?;

    Ok(HttpResponse::Ok().json(view))
}

/// A user's attendance history, most recent first
#[utoipa::path(
    get,
    path = "/api/attendance/user/{user_id}",
    params(
        ("user_id" = u64, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "Attendance history", body = [crate::model::attendance::AttendanceView]),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn user_records(
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    let views = service.list_for_user(user_id).await?;

    Ok(HttpResponse::Ok().json(views))
}

/// Today's attendance for a user
#[utoipa::path(
    get,
    path = "/api/attendance/today/{user_id}",
    params(
        ("user_id" = u64, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "Today's record", body = crate::model::attendance::AttendanceView),
        (status = 204, description = "Nothing recorded today"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn today(
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();

    match service.today_for_user(user_id).await? {
        Some(view) => Ok(HttpResponse::Ok().json(view)),
        None => Ok(HttpResponse::NoContent().finish()),
    }
}

/// Every user's records in a date range (admin)
#[utoipa::path(
    get,
    path = "/api/attendance/range",
    params(RangeQuery),
    responses(
        (status = 200, description = "Records ordered by user then date", body = [crate::model::attendance::AttendanceView]),
        (status = 400, description = "Malformed dates"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn range(
    service: web::Data<AttendanceService>,
    query: web::Query<RangeQuery>,
) -> actix_web::Result<impl Responder> {
    let views = service
        .list_by_date_range(query.start_date, query.end_date)
        .await?;

    Ok(HttpResponse::Ok().json(views))
}

/// Download the attendance report for a date range (admin)
#[utoipa::path(
    get,
    path = "/api/attendance/export",
    params(RangeQuery),
    responses(
        (status = 200, description = "Report file", body = String, content_type = "text/csv"),
        (status = 400, description = "Malformed dates"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn export(
    reports: web::Data<ReportBuilder>,
    query: web::Query<RangeQuery>,
) -> actix_web::Result<impl Responder> {
    let bytes = reports
        .export_report(query.start_date, query.end_date)
        .await?;
    let filename = reports.file_name(query.start_date, query.end_date);

    Ok(HttpResponse::Ok()
        .content_type(reports.content_type())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .body(bytes))
}
