//! # Sync Errors
//!
//! Everything a load or mutation can fail with, and the text the
//! collection error slot shows for it.
//!
//! ```text
//!   config file / env ──► InvalidConfig, InvalidUrl, ConfigLoadFailed, ConfigSaveFailed
//!   reqwest           ──► Transport, Timeout            (retried by backoff)
//!   response body     ──► Decode
//!   backend status    ──► Rejected { status, message }, NotFound
//!   local rules       ──► Validation, Core              (request never sent)
//!   newer load        ──► Cancelled                     (silent, slot untouched)
//! ```

use almacen_core::{CoreError, ValidationError};
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

/// Generic text shown for transport-class failures.
pub const GENERIC_FAILURE: &str = "No se pudo conectar con el servidor. Intente nuevamente.";

#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid console configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid API base URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to load the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save the config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Network failure, or a non-2xx response without a readable message.
    ///
    /// ## When This Occurs
    /// - Backend unreachable, connection reset
    /// - 5xx with an HTML or empty body
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Request exceeded the configured timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Response body was not JSON.
    #[error("Could not decode response: {0}")]
    Decode(String),

    /// The request was aborted because a newer load replaced it.
    #[error("Request cancelled")]
    Cancelled,

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// Backend answered with an error status and a message.
    ///
    /// ## When This Occurs
    /// - Duplicate document number on client create (400/409)
    /// - Deleting a category that still has products (400)
    #[error("Backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Backend answered 404.
    #[error("Not found: {path}")]
    NotFound { path: String },

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// A form failed validation before being sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A business rule failed before being sent.
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Text for the collection error slot.
    ///
    /// Backend messages are shown verbatim; transport failures get one
    /// generic message.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Rejected { message, .. } => message.clone(),
            SyncError::NotFound { .. } => "El registro solicitado no existe.".to_string(),
            SyncError::Validation(e) => e.to_string(),
            SyncError::Core(e) => e.to_string(),
            SyncError::Cancelled => "Operación cancelada.".to_string(),
            e if e.is_config_error() => format!("Configuración inválida: {}", e),
            _ => GENERIC_FAILURE.to_string(),
        }
    }

    /// Cancellation never reaches the error slot.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncError::Cancelled)
    }

    /// Returns true if an idempotent request may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport(_) | SyncError::Timeout(_) => true,
            SyncError::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::Transport("connection refused".into()).is_retryable());
        assert!(SyncError::Timeout(15).is_retryable());
        assert!(SyncError::Rejected {
            status: 503,
            message: "mantenimiento".into()
        }
        .is_retryable());

        assert!(!SyncError::Rejected {
            status: 400,
            message: "duplicado".into()
        }
        .is_retryable());
        assert!(!SyncError::Cancelled.is_retryable());
        assert!(!SyncError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_user_message() {
        let rejected = SyncError::Rejected {
            status: 409,
            message: "El documento ya está registrado".into(),
        };
        assert_eq!(rejected.user_message(), "El documento ya está registrado");
        assert_eq!(SyncError::Transport("reset".into()).user_message(), GENERIC_FAILURE);
        assert_eq!(SyncError::Decode("eof".into()).user_message(), GENERIC_FAILURE);
        assert!(SyncError::InvalidUrl("x".into()).user_message().starts_with("Configuración"));
    }

    #[test]
    fn test_validation_converts() {
        let err: SyncError = ValidationError::Required {
            field: "nombre_categoria".into(),
        }
        .into();
        assert!(matches!(err, SyncError::Validation(_)));
        assert_eq!(err.user_message(), "El campo nombre_categoria es obligatorio");
        assert!(!err.is_retryable());
    }
}
