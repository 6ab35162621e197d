use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use mockable::Clock;

/// The inclusive instant range covering one local calendar day.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DayWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DayWindow {
    /// Midnight through the last representable instant of `date`.
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            start: date.and_time(NaiveTime::MIN),
            end: date.and_time(end_of_day()),
        }
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// The local wall-clock moment according to `clock`.
pub fn local_now(clock: &dyn Clock) -> NaiveDateTime {
    clock.local().naive_local()
}

pub fn today_window(clock: &dyn Clock) -> DayWindow {
    DayWindow::for_date(local_now(clock).date())
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}
