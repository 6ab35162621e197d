pub mod attendance;
pub mod clock;
pub mod report;

pub use attendance::AttendanceService;
pub use report::{CsvRenderer, ReportBuilder, ReportLocale};
