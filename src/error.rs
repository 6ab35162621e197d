use thiserror::Error;

use crate::{service::report::RenderError, store::StoreError};

/// Failures surfaced by the attendance operations.
///
/// The core only classifies; translating a kind into a caller-facing code is
/// left to the transport layer.
#[derive(Debug, Error)]
pub enum AttendanceError {
    /// Unknown user, or a check-out with no check-in today.
    #[error("{0}")]
    NotFound(String),
    /// The requested transition clashes with today's record.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("attendance store failure: {0}")]
    Store(#[from] StoreError),
    #[error("report rendering failed: {0}")]
    Render(#[from] RenderError),
}

impl AttendanceError {
    pub(crate) fn conflict(message: &str) -> Self {
        AttendanceError::Conflict(message.to_string())
    }
}
