//! Tabular attendance export.
//!
//! [`Report::from_records`] derives the display fields; a [`ReportRenderer`]
//! turns the finished table into bytes.

use std::sync::Arc;

use chrono::NaiveDateTime;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::{
    error::AttendanceError,
    model::attendance::{Attendance, AttendanceRecord},
    store::AttendanceStore,
};

const DATE_FORMAT: &str = "%Y/%m/%d";
const TIME_FORMAT: &str = "%H:%M";
const NO_TIME: &str = "-";

/// Language of labels and headers in the export.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ReportLocale {
    #[default]
    En,
    Ja,
}

impl ReportLocale {
    pub fn headers(&self) -> [&'static str; 7] {
        match self {
            ReportLocale::En => [
                "User ID",
                "Username",
                "Date",
                "Category",
                "Check-in",
                "Check-out",
                "Worked",
            ],
            ReportLocale::Ja => [
                "ユーザーID",
                "ユーザー名",
                "日付",
                "勤怠区分",
                "出勤時刻",
                "退勤時刻",
                "勤務時間",
            ],
        }
    }

    pub fn leave_label(&self) -> &'static str {
        match self {
            ReportLocale::En => "annual leave",
            ReportLocale::Ja => "年休",
        }
    }

    pub fn work_label(&self) -> &'static str {
        match self {
            ReportLocale::En => "regular work",
            ReportLocale::Ja => "通常勤務",
        }
    }

    pub fn duration(&self, hours: i64, minutes: i64) -> String {
        match self {
            ReportLocale::En => format!("{hours} hours {minutes} minutes"),
            ReportLocale::Ja => format!("{hours}時間{minutes}分"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Number(u64),
    Text(String),
    Blank,
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Plain-text rendering, empty for [`Cell::Blank`].
    pub fn to_plain(&self) -> String {
        match self {
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Blank => String::new(),
        }
    }
}

/// Header rows are bold on a grey fill; data rows are plain bordered cells.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CellStyle {
    Header,
    Data,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub style: CellStyle,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub header: Row,
    pub rows: Vec<Row>,
}

impl Report {
    /// One data row per record, in the given order.
    pub fn from_records(records: &[AttendanceRecord], locale: ReportLocale) -> Self {
        let header = Row {
            style: CellStyle::Header,
            cells: locale.headers().into_iter().map(Cell::text).collect(),
        };
        let rows = records.iter().map(|record| data_row(record, locale)).collect();

        Self {
            header,
            rows,
        }
    }
}

fn data_row(record: &AttendanceRecord, locale: ReportLocale) -> Row {
    let (category, check_in, check_out, worked) = match record.attendance {
        Attendance::AnnualLeave => (
            Cell::text(locale.leave_label()),
            Cell::text(NO_TIME),
            Cell::text(NO_TIME),
            Cell::text(locale.leave_label()),
        ),
        Attendance::Work {
            check_in,
            check_out,
        } => (
            Cell::text(locale.work_label()),
            time_cell(Some(check_in)),
            time_cell(check_out),
            check_out
                .map(|check_out| Cell::Text(worked(check_in, check_out, locale)))
                .unwrap_or(Cell::Blank),
        ),
    };

    Row {
        style: CellStyle::Data,
        cells: vec![
            Cell::Number(record.user_id),
            Cell::text(record.username.as_str()),
            Cell::Text(record.record_date.format(DATE_FORMAT).to_string()),
            category,
            check_in,
            check_out,
            worked,
        ],
    }
}

fn time_cell(instant: Option<NaiveDateTime>) -> Cell {
    instant
        .map(|t| Cell::Text(t.format(TIME_FORMAT).to_string()))
        .unwrap_or(Cell::Blank)
}

/// Whole hours and leftover whole minutes between the two instants.
fn worked(check_in: NaiveDateTime, check_out: NaiveDateTime, locale: ReportLocale) -> String {
    let minutes = (check_out - check_in).num_minutes();
    locale.duration(minutes / 60, minutes % 60)
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write report row: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush report: {0}")]
    Flush(String),
}

/// Output sink for a finished report.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, report: &Report) -> Result<Vec<u8>, RenderError>;

    fn file_extension(&self) -> &'static str;

    fn content_type(&self) -> &'static str;
}

/// Comma-separated output, header row first. Styles have no CSV form and are
/// dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvRenderer;

impl ReportRenderer for CsvRenderer {
    fn render(&self, report: &Report) -> Result<Vec<u8>, RenderError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in std::iter::once(&report.header).chain(&report.rows) {
            writer.write_record(row.cells.iter().map(Cell::to_plain))?;
        }
        writer
            .into_inner()
            .map_err(|e| RenderError::Flush(e.error().to_string()))
    }

    fn file_extension(&self) -> &'static str {
        "csv"
    }

    fn content_type(&self) -> &'static str {
        "text/csv; charset=utf-8"
    }
}

/// Builds exports from the record store.
pub struct ReportBuilder {
    store: Arc<dyn AttendanceStore>,
    renderer: Arc<dyn ReportRenderer>,
    locale: ReportLocale,
}

impl ReportBuilder {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        renderer: Arc<dyn ReportRenderer>,
        locale: ReportLocale,
    ) -> Self {
        Self {
            store,
            renderer,
            locale,
        }
    }

    /// Rows for every record between `start` and `end` inclusive, in range
    /// query order.
    pub async fn build_report(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Report, AttendanceError> {
        let records = self.store.find_by_date_range(start, end).await?;
        Ok(Report::from_records(&records, self.locale))
    }

    /// [`Self::build_report`] rendered to bytes.
    pub async fn export_report(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<u8>, AttendanceError> {
        let report = self.build_report(start, end).await?;
        tracing::debug!(rows = report.rows.len(), "Rendering attendance report");
        Ok(self.renderer.render(&report)?)
    }

    /// `attendance_YYYYMMDD_to_YYYYMMDD.<ext>` for the given range.
    pub fn file_name(&self, start: NaiveDateTime, end: NaiveDateTime) -> String {
        format!(
            "attendance_{}_to_{}.{}",
            start.format("%Y%m%d"),
            end.format("%Y%m%d"),
            self.renderer.file_extension()
        )
    }

    pub fn content_type(&self) -> &'static str {
        self.renderer.content_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{role::Role, user::User},
        store::{AttendanceStore, InMemoryAttendanceStore},
    };
    use chrono::NaiveDate;
    use rstest::rstest;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 7, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn work(user_id: u64, check_in: NaiveDateTime, check_out: Option<NaiveDateTime>) -> AttendanceRecord {
        let user = User::new(user_id, format!("user{user_id}"), Role::User);
        let mut record = AttendanceRecord::check_in(&user, check_in);
        record.attendance = Attendance::Work {
            check_in,
            check_out,
        };
        record
    }

    fn leave(user_id: u64, date: NaiveDateTime) -> AttendanceRecord {
        let user = User::new(user_id, format!("user{user_id}"), Role::User);
        AttendanceRecord::annual_leave(&user, date)
    }

    fn text(value: &str) -> Cell {
        Cell::Text(value.to_string())
    }

    #[test]
    fn completed_work_row() {
        let report = Report::from_records(
            &[work(4, at(6, 9, 0), Some(at(6, 17, 30)))],
            ReportLocale::En,
        );
        assert_eq!(
            report.rows[0].cells,
            vec![
                Cell::Number(4),
                text("user4"),
                text("2026/07/06"),
                text("regular work"),
                text("09:00"),
                text("17:30"),
                text("8 hours 30 minutes"),
            ]
        );
        assert_eq!(report.rows[0].style, CellStyle::Data);
    }

    #[test]
    fn leave_row_uses_placeholders_and_label() {
        let report = Report::from_records(&[leave(2, at(7, 8, 15))], ReportLocale::En);
        let cells = &report.rows[0].cells;
        assert_eq!(cells[2], text("2026/07/07"));
        assert_eq!(cells[3], text("annual leave"));
        assert_eq!(cells[4], text("-"));
        assert_eq!(cells[5], text("-"));
        assert_eq!(cells[6], text("annual leave"));
    }

    #[test]
    fn open_work_row_leaves_check_out_and_duration_blank() {
        let report = Report::from_records(&[work(1, at(6, 9, 5), None)], ReportLocale::En);
        let cells = &report.rows[0].cells;
        assert_eq!(cells[4], text("09:05"));
        assert_eq!(cells[5], Cell::Blank);
        assert_eq!(cells[6], Cell::Blank);
    }

    #[rstest]
    #[case(at(6, 9, 0), at(6, 9, 59), "0 hours 59 minutes")]
    #[case(at(6, 9, 0), at(6, 10, 0), "1 hours 0 minutes")]
    #[case(at(6, 8, 45), at(6, 18, 14), "9 hours 29 minutes")]
    fn duration_truncates_to_whole_minutes(
        #[case] check_in: NaiveDateTime,
        #[case] check_out: NaiveDateTime,
        #[case] expected: &str,
    ) {
        assert_eq!(worked(check_in, check_out, ReportLocale::En), expected);
    }

    #[test]
    fn seconds_do_not_round_up() {
        let check_in = at(6, 9, 0);
        let check_out = at(6, 9, 30) + chrono::Duration::seconds(59);
        assert_eq!(worked(check_in, check_out, ReportLocale::En), "0 hours 30 minutes");
    }

    #[test]
    fn japanese_labels() {
        let report = Report::from_records(
            &[work(1, at(6, 9, 0), Some(at(6, 17, 30))), leave(1, at(7, 9, 0))],
            ReportLocale::Ja,
        );
        assert_eq!(report.header.cells[6], text("勤務時間"));
        assert_eq!(report.header.style, CellStyle::Header);
        assert_eq!(report.rows[0].cells[3], text("通常勤務"));
        assert_eq!(report.rows[0].cells[6], text("8時間30分"));
        assert_eq!(report.rows[1].cells[6], text("年休"));
    }

    #[test]
    fn locale_parses_from_config_value() {
        assert_eq!("ja".parse::<ReportLocale>().unwrap(), ReportLocale::Ja);
        assert_eq!("en".parse::<ReportLocale>().unwrap(), ReportLocale::En);
        assert!("fr".parse::<ReportLocale>().is_err());
    }

    #[test]
    fn csv_renders_header_then_rows() {
        let report = Report::from_records(
            &[work(1, at(6, 9, 0), Some(at(6, 17, 30))), leave(2, at(6, 9, 0))],
            ReportLocale::En,
        );
        let bytes = CsvRenderer.render(&report).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "User ID,Username,Date,Category,Check-in,Check-out,Worked",
                "1,user1,2026/07/06,regular work,09:00,17:30,8 hours 30 minutes",
                "2,user2,2026/07/06,annual leave,-,-,annual leave",
            ]
        );
    }

    #[actix_web::test]
    async fn builder_follows_range_order() {
        let store = Arc::new(InMemoryAttendanceStore::new());
        for record in [
            work(3, at(6, 9, 0), None),
            leave(1, at(7, 9, 0)),
            work(1, at(6, 9, 0), Some(at(6, 12, 0))),
            work(2, at(20, 9, 0), None),
        ] {
            store.save(record).await.unwrap();
        }
        let builder = ReportBuilder::new(store, Arc::new(CsvRenderer), ReportLocale::En);

        let report = builder.build_report(at(6, 0, 0), at(7, 23, 59)).await.unwrap();
        let keys: Vec<_> = report
            .rows
            .iter()
            .map(|row| (row.cells[0].clone(), row.cells[2].clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (Cell::Number(1), text("2026/07/06")),
                (Cell::Number(1), text("2026/07/07")),
                (Cell::Number(3), text("2026/07/06")),
            ]
        );

        let bytes = builder.export_report(at(6, 0, 0), at(7, 23, 59)).await.unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap().lines().count(), 4);
        assert_eq!(
            builder.file_name(at(6, 0, 0), at(7, 23, 59)),
            "attendance_20260706_to_20260707.csv"
        );
    }
}
