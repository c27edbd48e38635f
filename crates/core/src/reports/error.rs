//! Report error types.

use rentdesk_shared::AppError;
use rentdesk_shared::types::ScheduledReportId;
use thiserror::Error;

use super::types::ReportType;

/// Errors that can occur in the report pipeline.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Filters failed validation; holds every violation, in rule order.
    #[error("{}", .0.first().map_or("Invalid report filters", String::as_str))]
    Validation(Vec<String>),

    /// The report API could not be reached or answered garbage.
    #[error("Report service unavailable: {0}")]
    Client(String),

    /// The report API rejected our credentials.
    #[error("Report service rejected the credentials")]
    Unauthorized,

    /// The report API refused access.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// The report API has no such resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The report API answered with an unexpected status.
    #[error("Report service error ({status}): {message}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// Scheduled report not found.
    #[error("Scheduled report not found: {0}")]
    ScheduleNotFound(ScheduledReportId),

    /// Scheduled report input failed validation.
    #[error("{0}")]
    InvalidSchedule(String),

    /// Nothing has been generated for the report type yet.
    #[error("No {0} report has been generated")]
    NoReportData(ReportType),

    /// Export could not be produced.
    #[error("Export failed: {0}")]
    Export(String),

    /// Payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ReportError {
    /// Create a client error.
    #[must_use]
    pub fn client(msg: impl Into<String>) -> Self {
        Self::Client(msg.into())
    }

    /// Create an export error.
    #[must_use]
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Validation(_) | ReportError::InvalidSchedule(_) => {
                Self::Validation(err.to_string())
            }
            ReportError::NotFound(_)
            | ReportError::ScheduleNotFound(_)
            | ReportError::NoReportData(_) => Self::NotFound(err.to_string()),
            ReportError::Unauthorized => Self::Unauthorized(err.to_string()),
            ReportError::Forbidden(msg) => Self::Forbidden(msg),
            ReportError::Client(_) | ReportError::Upstream { .. } => {
                Self::ExternalService(err.to_string())
            }
            ReportError::Export(_) | ReportError::Serialization(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_displays_first_violation() {
        let err = ReportError::Validation(vec![
            "Start date is required".to_string(),
            "End date is required".to_string(),
        ]);
        assert_eq!(err.to_string(), "Start date is required");
    }

    #[test]
    fn test_empty_validation_has_fallback_message() {
        assert_eq!(
            ReportError::Validation(vec![]).to_string(),
            "Invalid report filters"
        );
    }

    #[test]
    fn test_maps_into_app_error() {
        let app: AppError = ReportError::NoReportData(ReportType::Occupancy).into();
        assert_eq!(app.status_code(), 404);

        let app: AppError = ReportError::Upstream {
            status: 503,
            message: "down".into(),
        }
        .into();
        assert_eq!(app.error_code(), "EXTERNAL_SERVICE_ERROR");

        let app: AppError = ReportError::InvalidSchedule("Name is required".into()).into();
        assert_eq!(app.to_string(), "Validation error: Name is required");
    }
}
