//! # Report Errors
//!
//! Failures that abort an export. A missing branding image is NOT one of
//! them: it is logged and the export continues without it.

use std::path::PathBuf;

use thiserror::Error;

/// Export failures. No partial file is left behind when one occurs.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A schema has no columns.
    #[error("Report schema '{0}' has no columns")]
    EmptySchema(String),

    /// A row does not have one cell per column.
    ///
    /// ## When This Occurs
    /// - A hand-built table was passed with ragged rows
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    /// Page geometry leaves no room for rows.
    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),

    /// Recording could not be serialized.
    #[error("Failed to serialize layout: {0}")]
    Serialize(#[from] serde_json::Error),

    /// CSV sink failure.
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Export file could not be written.
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    /// Text for the user-visible alert.
    pub fn user_message(&self) -> String {
        format!("No se pudo generar el reporte: {}", self)
    }
}

/// Convenience type alias for Results with ReportError.
pub type ReportResult<T> = Result<T, ReportError>;
