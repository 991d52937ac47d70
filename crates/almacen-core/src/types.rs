//! # Canonical Types
//!
//! Backend-agnostic entities used throughout aggregation, sale building and
//! report export. Nothing here knows the backend's field names; see
//! [`crate::wire`] for those and [`crate::normalize`] for the mapping.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Canonical Types                                 │
//! │                                                                         │
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐              │
//! │  │   Category   │◄───│   Product    │───►│ SupplierRef  │ (ordered,    │
//! │  │  CAT-007     │    │ stock/prices │    │ first=primary│  many)       │
//! │  └──────▲───────┘    └──────────────┘    └──────────────┘              │
//! │         │ many-to-many                                                  │
//! │  ┌──────┴───────┐    ┌──────────────┐    ┌──────────────┐              │
//! │  │   Supplier   │◄───│   Purchase   │    │    Client    │              │
//! │  └──────────────┘    └──────────────┘    └──────▲───────┘              │
//! │                                                 │ ClientRef | counter   │
//! │                      ┌──────────────┐    ┌──────┴───────┐              │
//! │                      │   SaleLine   │◄───│     Sale     │              │
//! │                      └──────────────┘    └──────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status
//! Every `active` flag is a `bool`. The "Activo"/"Inactivo" label is always
//! derived from it with [`status_label`], never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::{COUNTER_CLIENT_ID, COUNTER_CLIENT_NAME, NOT_AVAILABLE};

/// Display label for an `active` flag.
pub fn status_label(active: bool) -> &'static str {
    if active {
        "Activo"
    } else {
        "Inactivo"
    }
}

/// Deduplicates names (first occurrence wins) and joins them for display.
///
/// Returns `"N/A"` when nothing is left.
pub fn join_names<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: Vec<&str> = Vec::new();
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !seen.contains(&name) {
            seen.push(name);
        }
    }

    if seen.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        seen.join(", ")
    }
}

// =============================================================================
// References
// =============================================================================

/// Reference to a category from another entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
}

/// Reference to a supplier from a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SupplierRef {
    pub id: String,
    pub name: String,
}

/// Reference to the client billed in a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClientRef {
    pub id: String,
    pub name: String,
}

impl ClientRef {
    /// The walk-in counter client.
    pub fn counter() -> Self {
        ClientRef {
            id: COUNTER_CLIENT_ID.to_string(),
            name: COUNTER_CLIENT_NAME.to_string(),
        }
    }

    /// Checks if this reference points to the counter client.
    pub fn is_counter(&self) -> bool {
        self.id == COUNTER_CLIENT_ID
    }
}

impl Default for ClientRef {
    fn default() -> Self {
        ClientRef::counter()
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    /// Display id, `CAT-` + zero-padded backend id.
    pub id: String,
    pub name: String,
    /// At most 80 characters (enforced on forms).
    pub description: String,
    pub active: bool,
}

impl Category {
    pub fn status_label(&self) -> &'static str {
        status_label(self.active)
    }

    pub fn to_ref(&self) -> CategoryRef {
        CategoryRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// A client that can be billed in a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub document_type: String,
    /// Unique per document type (enforced by the backend).
    pub document_number: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Always `true` for the counter client.
    pub active: bool,
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Client {
    /// Checks if this is the walk-in counter client.
    pub fn is_counter(&self) -> bool {
        self.id == COUNTER_CLIENT_ID
    }

    pub fn status_label(&self) -> &'static str {
        status_label(self.active)
    }

    pub fn to_ref(&self) -> ClientRef {
        ClientRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

// =============================================================================
// Supplier
// =============================================================================

/// Legal person type of a supplier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PersonType {
    #[default]
    Natural,
    Juridica,
}

impl PersonType {
    /// Parses the backend text; anything unknown is a natural person.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "juridica" | "jurídica" | "empresa" | "legal" => PersonType::Juridica,
            _ => PersonType::Natural,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            PersonType::Natural => "natural",
            PersonType::Juridica => "juridica",
        }
    }
}

/// A supplier of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub tax_id: String,
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub active: bool,
    pub person_type: PersonType,
    /// Deduplicated by id, in backend order.
    pub categories: Vec<CategoryRef>,
}

impl Supplier {
    pub fn status_label(&self) -> &'static str {
        status_label(self.active)
    }

    /// Category names joined for report cells.
    pub fn categories_display(&self) -> String {
        join_names(self.categories.iter().map(|c| c.name.as_str()))
    }

    pub fn to_ref(&self) -> SupplierRef {
        SupplierRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalogue.
///
/// ## Invariants
/// - stock levels are non-negative (by type)
/// - `stock_min <= stock_max`
/// - prices are non-negative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Empty id when the backend record had no category.
    pub category: CategoryRef,
    /// Ordered; the first one is the primary supplier.
    pub providers: Vec<SupplierRef>,
    pub stock_current: u32,
    pub stock_min: u32,
    pub stock_max: u32,
    pub unit_cost: Money,
    pub sale_price: Money,
    /// Last update, or creation when never updated.
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Value of the stock on hand: `unit_cost * stock_current`.
    pub fn inventory_value(&self) -> Money {
        self.unit_cost.multiply_quantity(self.stock_current as i64)
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock_current == 0
    }

    /// At or below the minimum threshold, or empty.
    pub fn is_stock_risk(&self) -> bool {
        self.stock_current <= self.stock_min || self.stock_current == 0
    }

    pub fn primary_provider(&self) -> Option<&SupplierRef> {
        self.providers.first()
    }

    pub fn category_display(&self) -> &str {
        if self.category.name.trim().is_empty() {
            NOT_AVAILABLE
        } else {
            &self.category.name
        }
    }

    /// Supplier names joined for report cells.
    pub fn providers_display(&self) -> String {
        join_names(self.providers.iter().map(|p| p.name.as_str()))
    }
}

// =============================================================================
// Sale
// =============================================================================

/// How a sale was paid. Exactly two values are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    /// Fallback for any unrecognized input.
    #[default]
    Transfer,
}

impl PaymentMethod {
    /// Parses UI or backend text. Anything but cash is a transfer.
    ///
    /// ```rust
    /// use almacen_core::PaymentMethod;
    ///
    /// assert_eq!(PaymentMethod::parse_lenient("Efectivo"), PaymentMethod::Cash);
    /// assert_eq!(PaymentMethod::parse_lenient("tarjeta"), PaymentMethod::Transfer);
    /// ```
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "efectivo" | "cash" => PaymentMethod::Cash,
            _ => PaymentMethod::Transfer,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "efectivo",
            PaymentMethod::Transfer => "transferencia",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Efectivo",
            PaymentMethod::Transfer => "Transferencia",
        }
    }
}

/// The status of a sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SaleStatus {
    #[default]
    Completed,
    Pending,
    Voided,
}

impl SaleStatus {
    /// Parses backend text; unknown values are treated as completed.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "pendiente" | "pending" => SaleStatus::Pending,
            "anulada" | "anulado" | "voided" | "cancelada" => SaleStatus::Voided,
            _ => SaleStatus::Completed,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completada",
            SaleStatus::Pending => "pendiente",
            SaleStatus::Voided => "anulada",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "Completada",
            SaleStatus::Pending => "Pendiente",
            SaleStatus::Voided => "Anulada",
        }
    }
}

/// A line of a sale.
///
/// `subtotal == quantity * unit_price` unless the backend or the cart
/// supplied an explicit subtotal, which is then trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLine {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl SaleLine {
    /// `quantity * unit_price`, ignoring any override.
    pub fn computed_subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Checks if the stored subtotal agrees with the computed one.
    pub fn is_consistent(&self) -> bool {
        self.subtotal == self.computed_subtotal()
    }
}

/// A sale transaction.
///
/// ## Invariant
/// `total == Σ line.subtotal` whenever the sale carries lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    #[ts(as = "Option<String>")]
    pub date: Option<DateTime<Utc>>,
    pub client: ClientRef,
    pub lines: Vec<SaleLine>,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub total: Money,
}

// =============================================================================
// Purchase
// =============================================================================

/// A purchase (delivery) from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    pub supplier_id: String,
    #[ts(as = "Option<String>")]
    pub date: Option<DateTime<Utc>>,
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
