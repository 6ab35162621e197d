//! Persistence ports for attendance records and the user directory.
//!
//! The state machine relies on two guarantees from every [`AttendanceStore`]:
//! an insert for a (user, day) pair that already has a record fails with
//! [`StoreError::Duplicate`], and a check-out update only applies to a record
//! that has not been checked out yet ([`StoreError::Stale`] otherwise).

use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

use crate::{
    model::{attendance::AttendanceRecord, user::User},
    service::clock::DayWindow,
};

pub mod memory;
pub mod mysql;

pub use memory::{InMemoryAttendanceStore, InMemoryUserDirectory};
pub use mysql::{MySqlAttendanceStore, MySqlUserDirectory};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("attendance already recorded for user {user_id} on {day}")]
    Duplicate { user_id: u64, day: chrono::NaiveDate },
    #[error("record {0} was already checked out")]
    Stale(u64),
    #[error("record {0} does not exist")]
    Missing(u64),
    #[error("user {0} does not exist")]
    UnknownUser(u64),
    #[error("stored row is inconsistent: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// The record for `user_id` whose record date falls inside `window`.
    async fn find_by_user_and_day_window(
        &self,
        user_id: u64,
        window: DayWindow,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Every record of `user_id`, most recent record date first.
    async fn find_all_by_user(&self, user_id: u64) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Records of all users with `start <= record_date <= end`, ordered by
    /// user id then record date.
    async fn find_by_date_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Inserts a record without an id, or records the check-out of an
    /// existing one. Returns the stored record.
    async fn save(&self, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, user_id: u64) -> Result<Option<User>, StoreError>;
}
