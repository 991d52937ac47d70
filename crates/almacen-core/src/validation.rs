//! # Validation Module
//!
//! Form validation rules for the Almacén console.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form (`XForm::validate`)                                     │
//! │  ├── Required fields, lengths, ranges                                  │
//! │  └── THIS MODULE: field rules shared by every form                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Resource Synchronizer                                        │
//! │  └── Refuses create/update before any request when a form is invalid  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  ├── Uniqueness (document number per type)                             │
//! │  └── 4xx with a message, surfaced verbatim                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lengths are counted in characters, not bytes: names carry accents.
//!
//! ## Usage
//! ```rust
//! use almacen_core::validation::{validate_name, validate_quantity};
//!
//! validate_name("nombre", "Leche entera").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of any entity name.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of a category description.
pub const MAX_DESCRIPTION_LEN: usize = 80;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required text field against a maximum length.
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    validate_max_len(field, value, max)
}

/// Validates an optional text field against a maximum length.
pub fn validate_max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an entity name.
///
/// ## Rules
/// - Must not be empty
/// - At most 100 characters
///
/// ## Example
/// ```rust
/// use almacen_core::validation::validate_name;
///
/// assert!(validate_name("nombre", "Aseo").is_ok());
/// assert!(validate_name("nombre", "  ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    validate_required(field, name, MAX_NAME_LEN)
}

/// Validates a category description (optional, at most 80 characters).
pub fn validate_description(description: &str) -> ValidationResult<()> {
    validate_max_len("descripcion", description, MAX_DESCRIPTION_LEN)
}

/// Validates an optional email.
///
/// Only the shape is checked: one `@` with text on both sides and a dot in
/// the domain. Empty is accepted.
pub fn validate_email(email: Option<&str>) -> ValidationResult<()> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(());
    };

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.contains('@') && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "correo".to_string(),
            reason: "use el formato usuario@dominio.com".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.is_empty() {
        return Err(ValidationError::Required {
            field: "query".to_string(),
        });
    }

    validate_max_len("query", query, MAX_NAME_LEN)?;
    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stock range.
///
/// ## Example
/// ```rust
/// use almacen_core::validation::validate_stock_range;
///
/// assert!(validate_stock_range(5, 50).is_ok());
/// assert!(validate_stock_range(10, 10).is_ok());
/// assert!(validate_stock_range(20, 10).is_err());
/// ```
pub fn validate_stock_range(stock_min: u32, stock_max: u32) -> ValidationResult<()> {
    if stock_min > stock_max {
        return Err(ValidationError::OutOfRange {
            field: "stock_minimo".to_string(),
            min: 0,
            max: stock_max as i64,
        });
    }

    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "cantidad".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "cantidad".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a monetary amount in cents. Zero is allowed.
pub fn validate_non_negative_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more line fits in the cart.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "lineas".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

/// Validates a value against a closed vocabulary (case-insensitive).
pub fn validate_one_of(field: &str, value: &str, allowed: &[&str]) -> ValidationResult<()> {
    let value = value.trim().to_lowercase();
    if allowed.iter().any(|a| a.eq_ignore_ascii_case(&value)) {
        return Ok(());
    }

    Err(ValidationError::NotAllowed {
        field: field.to_string(),
        allowed: allowed.iter().map(|a| a.to_string()).collect(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("nombre", "Leche entera").is_ok());
        assert!(validate_name("nombre", "").is_err());
        assert!(validate_name("nombre", &"á".repeat(100)).is_ok());
        assert_eq!(
            validate_name("nombre", &"a".repeat(101)),
            Err(ValidationError::TooLong {
                field: "nombre".to_string(),
                max: 100
            })
        );
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description("").is_ok());
        assert!(validate_description(&"x".repeat(80)).is_ok());
        assert!(validate_description(&"x".repeat(81)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email(None).is_ok());
        assert!(validate_email(Some("")).is_ok());
        assert!(validate_email(Some("ventas@almacen.co")).is_ok());
        assert!(validate_email(Some("ventas.almacen.co")).is_err());
        assert!(validate_email(Some("@almacen.co")).is_err());
        assert!(validate_email(Some("a@b@c.co")).is_err());
    }

    #[test]
    fn test_validate_stock_range() {
        assert!(validate_stock_range(0, 0).is_ok());
        assert!(validate_stock_range(6, 5).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(99).is_ok());
        assert!(validate_cart_size(100).is_err());
    }

    #[test]
    fn test_validate_one_of() {
        assert!(validate_one_of("metodo_pago", "Efectivo", &["efectivo", "transferencia"]).is_ok());
        assert!(validate_one_of("metodo_pago", "tarjeta", &["efectivo", "transferencia"]).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  leche ").unwrap(), "leche");
        assert!(validate_search_query(" ").is_err());
    }
}
