//! Test doubles shared by unit and integration tests.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use mockable::Clock;

/// A local wall clock that stays where it is put.
pub struct FixtureClock(Mutex<NaiveDateTime>);

impl FixtureClock {
    pub fn at(now: NaiveDateTime) -> Arc<Self> {
        Arc::new(Self(Mutex::new(now)))
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.lock_clock() = now;
    }

    fn lock_clock(&self) -> MutexGuard<'_, NaiveDateTime> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        let now = *self.lock_clock();
        match Local.from_local_datetime(&now).earliest() {
            Some(local) => local,
            None => panic!("{now} does not exist in the local time zone"),
        }
    }

    fn utc(&self) -> DateTime<Utc> {
        self.local().with_timezone(&Utc)
    }
}
