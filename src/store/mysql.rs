use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, MySqlPool, error::ErrorKind};

use super::{AttendanceStore, StoreError, UserDirectory};
use crate::{
    model::{
        attendance::{Attendance, AttendanceRecord, Category},
        role::Role,
        user::User,
    },
    service::clock::DayWindow,
};

const SELECT_RECORDS: &str = r#"
    SELECT
        a.record_id,
        a.user_id,
        u.username,
        a.check_in_time,
        a.check_out_time,
        a.record_date,
        a.attendance_type
    FROM attendance_records a
    JOIN users u ON u.user_id = a.user_id
"#;

#[derive(FromRow)]
struct AttendanceRow {
    record_id: u64,
    user_id: u64,
    username: String,
    check_in_time: Option<NaiveDateTime>,
    check_out_time: Option<NaiveDateTime>,
    record_date: NaiveDateTime,
    attendance_type: String,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let category: Category = row.attendance_type.parse().map_err(|_| {
            StoreError::Corrupt(format!(
                "record {} has unknown attendance_type {:?}",
                row.record_id, row.attendance_type
            ))
        })?;
        let attendance = Attendance::from_parts(category, row.check_in_time, row.check_out_time)
            .map_err(|reason| StoreError::Corrupt(format!("record {}: {reason}", row.record_id)))?;

        Ok(AttendanceRecord {
            id: Some(row.record_id),
            user_id: row.user_id,
            username: row.username,
            record_date: row.record_date,
            attendance,
        })
    }
}

/// Unique key: a concurrent request inserted the same day first.
/// Foreign key: the user row went away after it was looked up.
fn constraint_error(kind: ErrorKind, record: &AttendanceRecord) -> Option<StoreError> {
    match kind {
        ErrorKind::UniqueViolation => Some(StoreError::Duplicate {
            user_id: record.user_id,
            day: record.record_date.date(),
        }),
        ErrorKind::ForeignKeyViolation => Some(StoreError::UnknownUser(record.user_id)),
        _ => None,
    }
}

fn into_records(rows: Vec<AttendanceRow>) -> Result<Vec<AttendanceRecord>, StoreError> {
    rows.into_iter().map(AttendanceRecord::try_from).collect()
}

/// Attendance records in MySQL.
///
/// Relies on the unique `(user_id, record_day)` index from
/// `migrations/0001_attendance.sql` to reject a second record for the same day.
#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, mut record: AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_records
                (user_id, check_in_time, check_out_time, record_date, attendance_type)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.user_id)
        .bind(record.attendance.check_in())
        .bind(record.attendance.check_out())
        .bind(record.record_date)
        .bind(record.category().to_string())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                record.id = Some(done.last_insert_id());
                Ok(record)
            }
            Err(e) => {
                if let sqlx::Error::Database(db_err) = &e {
                    if let Some(err) = constraint_error(db_err.kind(), &record) {
                        return Err(err);
                    }
                }
                Err(e.into())
            }
        }
    }

    async fn check_out(&self, id: u64, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        let check_out = record.attendance.check_out().ok_or(StoreError::Stale(id))?;

        let result = sqlx::query(
            r#"
            UPDATE attendance_records
            SET check_out_time = ?
            WHERE record_id = ?
            AND attendance_type = 'WORK'
            AND check_out_time IS NULL
            "#,
        )
        .bind(check_out)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Stale(id));
        }

        Ok(record)
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn find_by_user_and_day_window(
        &self,
        user_id: u64,
        window: DayWindow,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!(
            "{SELECT_RECORDS} WHERE a.user_id = ? AND a.record_date BETWEEN ? AND ? \
             ORDER BY a.record_date LIMIT 1"
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .bind(window.start)
            .bind(window.end)
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn find_all_by_user(&self, user_id: u64) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!("{SELECT_RECORDS} WHERE a.user_id = ? ORDER BY a.record_date DESC");
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        into_records(rows)
    }

    async fn find_by_date_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!(
            "{SELECT_RECORDS} WHERE a.record_date >= ? AND a.record_date <= ? \
             ORDER BY a.user_id, a.record_date"
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        into_records(rows)
    }

    async fn save(&self, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        match record.id {
            None => self.insert(record).await,
            Some(id) => self.check_out(id, record).await,
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    user_id: u64,
    username: String,
    role: String,
}

/// Read-only view of the `users` table.
#[derive(Clone)]
pub struct MySqlUserDirectory {
    pool: MySqlPool,
}

impl MySqlUserDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for MySqlUserDirectory {
    async fn find_by_id(&self, user_id: u64) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, username, role FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let role: Role = row.role.parse().map_err(|_| {
                StoreError::Corrupt(format!("user {} has unknown role {:?}", row.user_id, row.role))
            })?;
            Ok(User::new(row.user_id, row.username, role))
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 2)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn row(attendance_type: &str, check_in: Option<NaiveDateTime>) -> AttendanceRow {
        AttendanceRow {
            record_id: 9,
            user_id: 3,
            username: "suzuki".to_string(),
            check_in_time: check_in,
            check_out_time: None,
            record_date: at(9),
            attendance_type: attendance_type.to_string(),
        }
    }

    #[test]
    fn row_maps_to_record() {
        let record = AttendanceRecord::try_from(row("WORK", Some(at(9)))).unwrap();
        assert_eq!(record.id, Some(9));
        assert_eq!(record.username, "suzuki");
        assert_eq!(
            record.attendance,
            Attendance::Work {
                check_in: at(9),
                check_out: None
            }
        );
    }

    #[test]
    fn inconsistent_rows_are_corrupt() {
        assert!(matches!(
            AttendanceRecord::try_from(row("HOLIDAY", None)),
            Err(StoreError::Corrupt(_))
        ));
        assert!(matches!(
            AttendanceRecord::try_from(row("WORK", None)),
            Err(StoreError::Corrupt(_))
        ));
        assert!(matches!(
            AttendanceRecord::try_from(row("ANNUAL_LEAVE", Some(at(9)))),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn constraint_violations_are_told_apart() {
        let user = User::new(3, "suzuki", Role::User);
        let record = AttendanceRecord::check_in(&user, at(9));

        assert!(matches!(
            constraint_error(ErrorKind::UniqueViolation, &record),
            Some(StoreError::Duplicate { user_id: 3, .. })
        ));
        assert!(matches!(
            constraint_error(ErrorKind::ForeignKeyViolation, &record),
            Some(StoreError::UnknownUser(3))
        ));
        assert!(constraint_error(ErrorKind::NotNullViolation, &record).is_none());
        assert!(constraint_error(ErrorKind::Other, &record).is_none());
    }
}
