//! # Console Error Type
//!
//! What a failed command reports before the process exits with code 1.
//!
//! ```text
//! SyncError ───┐
//!              ├──► AppError { code, message } ──► stderr, exit 1
//! ReportError ─┘
//! ```

use almacen_report::ReportError;
use almacen_sync::SyncError;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// User-facing message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad config file or environment
    ConfigError,

    /// Backend unreachable or failing
    Connection,

    /// Backend refused the request
    Rejected,

    /// Local validation failed
    ValidationError,

    /// Report could not be produced
    ExportError,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        let code = match &err {
            e if e.is_config_error() => ErrorCode::ConfigError,
            SyncError::Rejected { .. } | SyncError::NotFound { .. } => ErrorCode::Rejected,
            SyncError::Validation(_) | SyncError::Core(_) => ErrorCode::ValidationError,
            _ => ErrorCode::Connection,
        };
        tracing::debug!(error = %err, "Command failed");
        AppError::new(code, err.user_message())
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        tracing::error!(error = %err, "Export failed");
        AppError::new(ErrorCode::ExportError, err.user_message())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_errors_map_to_codes() {
        let err: AppError = SyncError::InvalidUrl("x".into()).into();
        assert_eq!(err.code, ErrorCode::ConfigError);

        let err: AppError = SyncError::Rejected {
            status: 400,
            message: "Nombre duplicado".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::Rejected);
        assert_eq!(err.to_string(), "Nombre duplicado");

        let err: AppError = SyncError::Timeout(15).into();
        assert_eq!(err.code, ErrorCode::Connection);
    }

    #[test]
    fn test_report_error_message() {
        let err: AppError = ReportError::EmptySchema("ventas".into()).into();
        assert_eq!(err.code, ErrorCode::ExportError);
        assert!(err.message.starts_with("No se pudo generar el reporte"));
    }
}
