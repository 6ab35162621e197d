//! HTTP mapping for attendance failures.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use crate::error::AttendanceError;

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::NotFound(_) => StatusCode::NOT_FOUND,
            AttendanceError::Conflict(_) => StatusCode::CONFLICT,
            AttendanceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AttendanceError::Store(_) | AttendanceError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AttendanceError::Store(_) | AttendanceError::Render(_) => {
                tracing::error!(error = %self, "Attendance request failed");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use actix_web::body::to_bytes;
    use rstest::rstest;

    #[rstest]
    #[case(AttendanceError::NotFound("user 9 not found".into()), StatusCode::NOT_FOUND)]
    #[case(AttendanceError::Conflict("already checked in today".into()), StatusCode::CONFLICT)]
    #[case(AttendanceError::InvalidArgument("unknown attendance type: X".into()), StatusCode::BAD_REQUEST)]
    fn classified_errors_map_to_status(#[case] err: AttendanceError, #[case] status: StatusCode) {
        assert_eq!(err.status_code(), status);
    }

    #[actix_web::test]
    async fn store_details_are_not_leaked() {
        let err = AttendanceError::Store(StoreError::Corrupt("record 4: secret".into()));
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Internal Server Error");
    }
}
