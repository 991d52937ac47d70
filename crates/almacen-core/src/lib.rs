//! # almacen-core: Pure Business Logic for the Almacén console
//!
//! This crate sits between the REST backend's raw schema and everything that
//! reads data in the console: dashboards, the sale screen and reports.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Almacén Console Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              almacen-sync (REST + per-collection cache)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ raw JSON records                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ almacen-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌─────────────┐  ┌──────────┐  │   │
//! │  │   │   wire    │─►│ normalize │─►│ aggregation │  │   sale   │  │   │
//! │  │   │ (Spanish) │◄─│  (both    │  │ (dashboard) │  │ (builder)│  │   │
//! │  │   │           │  │   ways)   │  └─────────────┘  └──────────┘  │   │
//! │  │   └───────────┘  └───────────┘                                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │ canonical snapshots                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 almacen-report (PDF / sheet layout)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Canonical entities (Category, Client, Supplier, Product, Sale, Purchase)
//! - [`wire`] - Backend records with their native field names
//! - [`lenient`] - Never-failing field deserializers used by [`wire`]
//! - [`relation`] - Direct vs. join-table relation resolution
//! - [`normalize`] - Backend ⇄ canonical mapping, one impl per entity
//! - [`validation`] - Form validation rules
//! - [`aggregation`] - Dashboard metrics
//! - [`sale`] - Cart state and sale payload construction
//! - [`money`] - Integer money
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use almacen_core::normalize::Normalize;
//! use almacen_core::types::Category;
//! use almacen_core::wire::{decode_record, WireCategory};
//!
//! let raw = serde_json::json!({
//!     "id_categoria": 7,
//!     "nombre_categoria": "Bebidas",
//!     "estado": "inactivo"
//! });
//! let category = Category::to_canonical(&decode_record::<WireCategory>(raw));
//!
//! assert_eq!(category.id, "CAT-007");
//! assert!(!category.active);
//! assert_eq!(category.status_label(), "Inactivo");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregation;
pub mod error;
pub mod lenient;
pub mod money;
pub mod normalize;
pub mod relation;
pub mod sale;
pub mod types;
pub mod validation;
pub mod wire;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use normalize::Normalize;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Id of the walk-in counter client.
///
/// Sales without an explicit client are billed to this record, and it always
/// reports itself as active regardless of the stored status.
pub const COUNTER_CLIENT_ID: &str = "1";

/// Display name of the walk-in counter client.
pub const COUNTER_CLIENT_NAME: &str = "Cliente Mostrador";

/// Prefix of the display form of category ids (`CAT-007`).
pub const CATEGORY_ID_PREFIX: &str = "CAT-";

/// Display text for missing values in report contexts.
pub const NOT_AVAILABLE: &str = "N/A";

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in a cart.
pub const MAX_ITEM_QUANTITY: i64 = 999;
