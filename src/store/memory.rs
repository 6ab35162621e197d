use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::{AttendanceStore, StoreError, UserDirectory};
use crate::{
    model::{
        attendance::{Attendance, AttendanceRecord},
        user::User,
    },
    service::clock::DayWindow,
};

/// Process-local record store. One mutex serializes every read-modify-write,
/// which gives the same (user, day) and check-out guarantees as the SQL
/// adapter's unique index and conditional update.
#[derive(Debug, Default)]
pub struct InMemoryAttendanceStore {
    inner: Mutex<Records>,
}

#[derive(Debug, Default)]
struct Records {
    last_id: u64,
    rows: Vec<AttendanceRecord>,
}

impl InMemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored record in insertion order.
    pub fn snapshot(&self) -> Vec<AttendanceRecord> {
        self.lock().rows.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Records {
    fn insert(&mut self, mut record: AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        let day = record.record_date.date();
        let taken = self
            .rows
            .iter()
            .any(|row| row.user_id == record.user_id && row.record_date.date() == day);
        if taken {
            return Err(StoreError::Duplicate {
                user_id: record.user_id,
                day,
            });
        }

        self.last_id += 1;
        record.id = Some(self.last_id);
        self.rows.push(record.clone());
        Ok(record)
    }

    fn check_out(&mut self, id: u64, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        let stored = self
            .rows
            .iter_mut()
            .find(|row| row.id == Some(id))
            .ok_or(StoreError::Missing(id))?;

        match (stored.attendance, record.attendance) {
            (
                Attendance::Work {
                    check_in,
                    check_out: None,
                },
                Attendance::Work {
                    check_out: Some(check_out),
                    ..
                },
            ) => {
                stored.attendance = Attendance::Work {
                    check_in,
                    check_out: Some(check_out),
                };
                Ok(stored.clone())
            }
            _ => Err(StoreError::Stale(id)),
        }
    }
}

#[async_trait]
impl AttendanceStore for InMemoryAttendanceStore {
    async fn find_by_user_and_day_window(
        &self,
        user_id: u64,
        window: DayWindow,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self
            .lock()
            .rows
            .iter()
            .filter(|row| row.user_id == user_id && window.contains(row.record_date))
            .min_by_key(|row| row.record_date)
            .cloned())
    }

    async fn find_all_by_user(&self, user_id: u64) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut rows: Vec<_> = self
            .lock()
            .rows
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.record_date.cmp(&a.record_date));
        Ok(rows)
    }

    async fn find_by_date_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut rows: Vec<_> = self
            .lock()
            .rows
            .iter()
            .filter(|row| start <= row.record_date && row.record_date <= end)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.user_id, row.record_date));
        Ok(rows)
    }

    async fn save(&self, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        let mut records = self.lock();
        match record.id {
            None => records.insert(record),
            Some(id) => records.check_out(id, record),
        }
    }
}

/// Fixed set of users, keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: BTreeMap<u64, User>,
}

impl InMemoryUserDirectory {
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|user| (user.id, user)).collect(),
        }
    }

}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, user_id: u64) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&user_id).cloned())
    }
}
