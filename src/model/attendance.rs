use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::{error::AttendanceError, model::user::User};

/// Stored attendance category. Never changes once a record exists.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Work,
    AnnualLeave,
}

/// The action a user requests for the current moment.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    CheckIn,
    CheckOut,
    AnnualLeave,
}

impl Intent {
    /// Parses the wire value (`CHECK_IN`, `CHECK_OUT`, `ANNUAL_LEAVE`).
    pub fn parse(value: &str) -> Result<Self, AttendanceError> {
        value
            .parse()
            .map_err(|_| AttendanceError::InvalidArgument(format!("unknown attendance type: {value}")))
    }
}

/// What happened on a record's day.
///
/// Leave records carry no timestamps and work records always carry a
/// check-in, so the category and its times cannot disagree.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Attendance {
    Work {
        check_in: NaiveDateTime,
        check_out: Option<NaiveDateTime>,
    },
    AnnualLeave,
}

impl Attendance {
    /// Rebuilds the variant from the flat column layout, rejecting
    /// combinations that break the record invariants.
    pub fn from_parts(
        category: Category,
        check_in: Option<NaiveDateTime>,
        check_out: Option<NaiveDateTime>,
    ) -> Result<Self, String> {
        match (category, check_in, check_out) {
            (Category::AnnualLeave, None, None) => Ok(Attendance::AnnualLeave),
            (Category::AnnualLeave, _, _) => {
                Err("annual leave record carries check-in/out times".to_string())
            }
            (Category::Work, None, _) => Err("work record has no check-in time".to_string()),
            (Category::Work, Some(check_in), Some(check_out)) if check_out <= check_in => {
                Err("check-out time is not after check-in time".to_string())
            }
            (Category::Work, Some(check_in), check_out) => Ok(Attendance::Work {
                check_in,
                check_out,
            }),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Attendance::Work { .. } => Category::Work,
            Attendance::AnnualLeave => Category::AnnualLeave,
        }
    }

    pub fn check_in(&self) -> Option<NaiveDateTime> {
        match self {
            Attendance::Work { check_in, .. } => Some(*check_in),
            Attendance::AnnualLeave => None,
        }
    }

    pub fn check_out(&self) -> Option<NaiveDateTime> {
        match self {
            Attendance::Work { check_out, .. } => *check_out,
            Attendance::AnnualLeave => None,
        }
    }
}

/// One user's attendance for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    /// Assigned by the store on insert.
    pub id: Option<u64>,
    pub user_id: u64,
    pub username: String,
    /// The day the record belongs to; doubles as the leave timestamp.
    pub record_date: NaiveDateTime,
    pub attendance: Attendance,
}

impl AttendanceRecord {
    /// A fresh work record checked in at `now`.
    pub fn check_in(user: &User, now: NaiveDateTime) -> Self {
        Self {
            id: None,
            user_id: user.id,
            username: user.username.clone(),
            record_date: now,
            attendance: Attendance::Work {
                check_in: now,
                check_out: None,
            },
        }
    }

    /// A fresh annual-leave record for the day containing `now`.
    pub fn annual_leave(user: &User, now: NaiveDateTime) -> Self {
        Self {
            id: None,
            user_id: user.id,
            username: user.username.clone(),
            record_date: now,
            attendance: Attendance::AnnualLeave,
        }
    }

    pub fn category(&self) -> Category {
        self.attendance.category()
    }

    pub fn status(&self) -> AttendanceStatus {
        match self.attendance {
            Attendance::AnnualLeave => AttendanceStatus::AnnualLeave,
            Attendance::Work {
                check_out: Some(_), ..
            } => AttendanceStatus::Completed,
            Attendance::Work { check_out: None, .. } => AttendanceStatus::InProgress,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    InProgress,
    Completed,
    AnnualLeave,
}

/// Read-only projection of a record returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "recordId": 1,
    "userId": 1000,
    "username": "yamada",
    "checkInTime": "2026-01-05T09:00:00",
    "checkOutTime": "2026-01-05T17:30:00",
    "recordDate": "2026-01-05T09:00:00",
    "attendanceType": "WORK",
    "status": "COMPLETED"
}))]
pub struct AttendanceView {
    pub record_id: Option<u64>,
    pub user_id: u64,
    pub username: String,
    #[schema(example = "2026-01-05T09:00:00", format = "date-time", value_type = Option<String>)]
    pub check_in_time: Option<NaiveDateTime>,
    #[schema(example = "2026-01-05T17:30:00", format = "date-time", value_type = Option<String>)]
    pub check_out_time: Option<NaiveDateTime>,
    #[schema(example = "2026-01-05T09:00:00", format = "date-time", value_type = String)]
    pub record_date: NaiveDateTime,
    pub attendance_type: Category,
    pub status: AttendanceStatus,
}

impl From<&AttendanceRecord> for AttendanceView {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            record_id: record.id,
            user_id: record.user_id,
            username: record.username.clone(),
            check_in_time: record.attendance.check_in(),
            check_out_time: record.attendance.check_out(),
            record_date: record.record_date,
            attendance_type: record.category(),
            status: record.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[rstest]
    #[case("CHECK_IN", Intent::CheckIn)]
    #[case("CHECK_OUT", Intent::CheckOut)]
    #[case("ANNUAL_LEAVE", Intent::AnnualLeave)]
    fn parses_wire_intents(#[case] raw: &str, #[case] expected: Intent) {
        assert_eq!(Intent::parse(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("LUNCH")]
    #[case("check_in")]
    #[case("")]
    fn unknown_intent_is_invalid_argument(#[case] raw: &str) {
        assert!(matches!(
            Intent::parse(raw),
            Err(AttendanceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn from_parts_rejects_inconsistent_rows() {
        assert!(Attendance::from_parts(Category::AnnualLeave, Some(at(9, 0)), None).is_err());
        assert!(Attendance::from_parts(Category::Work, None, Some(at(17, 0))).is_err());
        assert!(Attendance::from_parts(Category::Work, Some(at(9, 0)), Some(at(9, 0))).is_err());
        assert_eq!(
            Attendance::from_parts(Category::Work, Some(at(9, 0)), Some(at(17, 0))).unwrap(),
            Attendance::Work {
                check_in: at(9, 0),
                check_out: Some(at(17, 0)),
            }
        );
    }

    #[test]
    fn view_status_follows_record_state() {
        let user = User::new(7, "sato", Role::User);
        let mut record = AttendanceRecord::check_in(&user, at(9, 0));
        assert_eq!(AttendanceView::from(&record).status, AttendanceStatus::InProgress);

        record.attendance = Attendance::Work {
            check_in: at(9, 0),
            check_out: Some(at(18, 0)),
        };
        let view = AttendanceView::from(&record);
        assert_eq!(view.status, AttendanceStatus::Completed);
        assert_eq!(view.attendance_type, Category::Work);
        assert_eq!(view.check_out_time, Some(at(18, 0)));

        let leave = AttendanceView::from(&AttendanceRecord::annual_leave(&user, at(8, 0)));
        assert_eq!(leave.status, AttendanceStatus::AnnualLeave);
        assert_eq!(leave.check_in_time, None);
        assert_eq!(leave.username, "sato");
    }

    #[test]
    fn view_serializes_camel_case() {
        let user = User::new(1, "tanaka", Role::Admin);
        let view = AttendanceView::from(&AttendanceRecord::annual_leave(&user, at(10, 0)));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["attendanceType"], "ANNUAL_LEAVE");
        assert_eq!(json["status"], "ANNUAL_LEAVE");
        assert_eq!(json["recordDate"], "2026-01-05T10:00:00");
        assert!(json["checkInTime"].is_null());
    }
}
