//! Attendance recording and read-side queries.

use std::sync::Arc;

use chrono::NaiveDateTime;
use mockable::Clock;
use tracing::{error, info, warn};

use crate::{
    error::AttendanceError,
    model::{
        attendance::{Attendance, AttendanceRecord, AttendanceView, Intent},
        user::User,
    },
    service::clock::{local_now, today_window, DayWindow},
    store::{AttendanceStore, StoreError, UserDirectory},
};

/// Decides the single legal transition for `intent` given today's record.
///
/// Returns the record to persist; a rejection means nothing is written.
pub fn transition(
    user: &User,
    intent: Intent,
    existing: Option<AttendanceRecord>,
    now: NaiveDateTime,
) -> Result<AttendanceRecord, AttendanceError> {
    match (intent, existing) {
        (Intent::CheckIn, None) => Ok(AttendanceRecord::check_in(user, now)),
        (Intent::CheckIn, Some(record)) => match record.attendance {
            Attendance::Work { .. } => Err(AttendanceError::conflict("already checked in today")),
            Attendance::AnnualLeave => Err(AttendanceError::conflict(
                "annual leave already recorded today",
            )),
        },

        (Intent::CheckOut, None) => Err(AttendanceError::NotFound(
            "no check-in found today".to_string(),
        )),
        (Intent::CheckOut, Some(mut record)) => match record.attendance {
            Attendance::AnnualLeave => Err(AttendanceError::conflict("annual leave recorded today")),
            Attendance::Work {
                check_out: Some(_), ..
            } => Err(AttendanceError::conflict("already checked out today")),
            Attendance::Work {
                check_in,
                check_out: None,
            } => {
                if now <= check_in {
                    return Err(AttendanceError::conflict(
                        "check-out must be later than check-in",
                    ));
                }
                record.attendance = Attendance::Work {
                    check_in,
                    check_out: Some(now),
                };
                Ok(record)
            }
        },

        (Intent::AnnualLeave, None) => Ok(AttendanceRecord::annual_leave(user, now)),
        (Intent::AnnualLeave, Some(_)) => Err(AttendanceError::conflict(
            "attendance already recorded today",
        )),
    }
}

/// Store guards firing here mean a concurrent request won the race for the
/// same day, or the user vanished after the lookup; report it the way the
/// sequential check would have.
fn map_save_error(intent: Intent, err: StoreError) -> AttendanceError {
    match err {
        StoreError::Duplicate { .. } => match intent {
            Intent::CheckIn => AttendanceError::conflict("already checked in today"),
            _ => AttendanceError::conflict("attendance already recorded today"),
        },
        StoreError::Stale(_) => AttendanceError::conflict("already checked out today"),
        StoreError::UnknownUser(user_id) => {
            AttendanceError::NotFound(format!("user {user_id} not found"))
        }
        other => AttendanceError::Store(other),
    }
}

fn log_outcome(
    user_id: u64,
    intent: &dyn std::fmt::Display,
    result: &Result<AttendanceView, AttendanceError>,
) {
    match result {
        Ok(view) => info!(user_id, %intent, status = %view.status, "Attendance recorded"),
        Err(AttendanceError::Store(cause)) => {
            error!(user_id, %intent, error = %cause, "Attendance store failure")
        }
        Err(err) => warn!(user_id, %intent, reason = %err, "Attendance rejected"),
    }
}

pub struct AttendanceService {
    store: Arc<dyn AttendanceStore>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl AttendanceService {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            store,
            users,
            clock,
        }
    }

    async fn require_user(&self, user_id: u64) -> Result<User, AttendanceError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AttendanceError::NotFound(format!("user {user_id} not found")))
    }

    /// Applies `intent` for `user_id` at the current moment.
    pub async fn record_attendance(
        &self,
        user_id: u64,
        intent: Intent,
    ) -> Result<AttendanceView, AttendanceError> {
        let result = async {
            let user = self.require_user(user_id).await?;
            self.try_record(user, intent).await
        }
        .await;
        log_outcome(user_id, &intent, &result);
        result
    }

    /// Like [`Self::record_attendance`] for an unparsed wire type.
    ///
    /// An unknown user is reported before an unknown type.
    pub async fn record_requested(
        &self,
        user_id: u64,
        kind: &str,
    ) -> Result<AttendanceView, AttendanceError> {
        let result = async {
            let user = self.require_user(user_id).await?;
            let intent = Intent::parse(kind)?;
            self.try_record(user, intent).await
        }
        .await;
        log_outcome(user_id, &kind, &result);
        result
    }

    async fn try_record(
        &self,
        user: User,
        intent: Intent,
    ) -> Result<AttendanceView, AttendanceError> {
        let now = local_now(self.clock.as_ref());
        let today = DayWindow::for_date(now.date());
        let existing = self
            .store
            .find_by_user_and_day_window(user.id, today)
            .await?;

        let record = transition(&user, intent, existing, now)?;
        let saved = self
            .store
            .save(record)
            .await
            .map_err(|err| map_save_error(intent, err))?;

        Ok(AttendanceView::from(&saved))
    }

    /// All of a user's records, most recent first.
    pub async fn list_for_user(&self, user_id: u64) -> Result<Vec<AttendanceView>, AttendanceError> {
        let user = self.require_user(user_id).await?;
        let records = self.store.find_all_by_user(user.id).await?;
        Ok(records.iter().map(AttendanceView::from).collect())
    }

    /// Today's record for the user, if one exists yet.
    pub async fn today_for_user(
        &self,
        user_id: u64,
    ) -> Result<Option<AttendanceView>, AttendanceError> {
        let user = self.require_user(user_id).await?;
        let window = today_window(self.clock.as_ref());
        let record = self
            .store
            .find_by_user_and_day_window(user.id, window)
            .await?;
        Ok(record.as_ref().map(AttendanceView::from))
    }

    /// Records of every user between `start` and `end` inclusive, ordered by
    /// user id then record date.
    pub async fn list_by_date_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<AttendanceView>, AttendanceError> {
        let records = self.store.find_by_date_range(start, end).await?;
        Ok(records.iter().map(AttendanceView::from).collect())
    }
}
