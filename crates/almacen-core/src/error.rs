//! # Error Types
//!
//! Failures raised before anything reaches the backend.
//!
//! ```text
//!   XForm ──validate_form──► ValidationError ─┐
//!                                             ├──► SyncError::{Validation, Core}
//!   Cart ──build_sale_payload──► CoreError ───┘         │
//!                                                       ▼
//!                                          collection error slot (verbatim)
//! ```
//!
//! Messages are user-facing and shown as-is in the error slot, hence
//! Spanish. Normalization has no error type: it degrades to defaults.

use thiserror::Error;

// =============================================================================
// Sale Building
// =============================================================================

/// Cart and sale rules.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("La venta no tiene productos")]
    EmptyCart,

    /// A cart line carries no detail id, code or product id.
    ///
    /// ## When This Occurs
    /// - The UI built a line from a search result that had no identifier
    #[error("La línea {index} ({name}) no identifica ningún producto")]
    MissingProductRef { index: usize, name: String },

    #[error("El producto {0} no está en el carrito")]
    NotInCart(String),

    #[error("El carrito admite como máximo {max} productos")]
    CartTooLarge { max: usize },

    /// Merging lines pushed a quantity over the per-line cap.
    #[error("La cantidad {requested} supera el máximo permitido ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Form Fields
// =============================================================================

/// Field rule violations. `field` is the backend field name, which is what
/// the forms label their inputs with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("El campo {field} es obligatorio")]
    Required { field: String },

    /// Counted in characters.
    #[error("El campo {field} admite como máximo {max} caracteres")]
    TooLong { field: String, max: usize },

    #[error("El campo {field} debe estar entre {min} y {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("El campo {field} debe ser mayor que cero")]
    MustBePositive { field: String },

    /// Money amounts and stock levels.
    #[error("El campo {field} no puede ser negativo")]
    Negative { field: String },

    #[error("El campo {field} no es válido: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Closed vocabularies (payment method, person type).
    #[error("El campo {field} debe ser uno de: {}", allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_messages() {
        let err = CoreError::QuantityTooLarge {
            requested: 1500,
            max: 999,
        };
        assert_eq!(err.to_string(), "La cantidad 1500 supera el máximo permitido (999)");
        assert_eq!(CoreError::EmptyCart.to_string(), "La venta no tiene productos");
    }

    #[test]
    fn test_field_messages() {
        let err = ValidationError::TooLong {
            field: "descripcion".to_string(),
            max: 80,
        };
        assert_eq!(err.to_string(), "El campo descripcion admite como máximo 80 caracteres");

        let err = ValidationError::NotAllowed {
            field: "metodo_pago".to_string(),
            allowed: vec!["efectivo".into(), "transferencia".into()],
        };
        assert_eq!(err.to_string(), "El campo metodo_pago debe ser uno de: efectivo, transferencia");
    }

    #[test]
    fn test_validation_is_transparent_in_core_error() {
        let core_err: CoreError = ValidationError::MustBePositive {
            field: "cantidad".to_string(),
        }
        .into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "El campo cantidad debe ser mayor que cero");
    }
}
