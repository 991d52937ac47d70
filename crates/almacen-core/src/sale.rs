//! # Sale Builder
//!
//! Turns cart state from the sale screen into a validated sale payload.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Cart (UI state)                                                       │
//! │  ├── add(line)            merges lines with the same product ref       │
//! │  ├── update_quantity()    0 removes the line                           │
//! │  └── remove() / clear()                                                │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  build_sale_payload(client?, lines, "efectivo")                        │
//! │  ├── client:   explicit selection, else the counter client             │
//! │  ├── product:  detail id → code → id (first non-empty wins)            │
//! │  ├── subtotal: explicit override as-is, else qty × unit price          │
//! │  ├── method:   efectivo → Cash, anything else → Transfer               │
//! │  └── total:    Σ subtotals (never a client-supplied total)             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  SalePayload ──► SaleForm ──► Normalize::to_backend ──► POST /sales    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Subtotal overrides
//! An explicit subtotal is trusted even when it disagrees with
//! `quantity * unit_price`. [`SalePayload::subtotal_mismatches`] reports
//! those lines so callers can log them.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::normalize::{Normalize, SaleForm};
use crate::types::{ClientRef, PaymentMethod, Product, Sale, SaleLine, SaleStatus};
use crate::validation;
use crate::wire::WireSale;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// A line as the sale screen holds it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Detail id, present when the line comes from an existing sale.
    pub detail_id: Option<String>,
    /// Product code/SKU.
    pub code: Option<String>,
    /// Generic product id.
    pub id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// Explicit subtotal; trusted as-is when present.
    pub subtotal: Option<Money>,
}

impl CartLine {
    /// Creates a line for a catalogue product at its sale price.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            id: Some(product.id.clone()),
            name: product.name.clone(),
            quantity,
            unit_price: product.sale_price,
            ..Default::default()
        }
    }

    /// The product reference: detail id, then code, then id.
    ///
    /// ```rust
    /// use almacen_core::sale::CartLine;
    ///
    /// let line = CartLine {
    ///     detail_id: Some(" ".into()),
    ///     code: Some("SKU-9".into()),
    ///     id: Some("9".into()),
    ///     ..Default::default()
    /// };
    /// assert_eq!(line.product_ref(), Some("SKU-9"));
    /// ```
    pub fn product_ref(&self) -> Option<&str> {
        [&self.detail_id, &self.code, &self.id]
            .into_iter()
            .filter_map(|candidate| candidate.as_deref().map(str::trim))
            .find(|candidate| !candidate.is_empty())
    }

    /// The line subtotal: the override when present, else `quantity * unit_price`.
    pub fn subtotal(&self) -> Money {
        self.subtotal
            .unwrap_or_else(|| self.unit_price.multiply_quantity(self.quantity))
    }
}

// =============================================================================
// Sale Payload
// =============================================================================

/// A validated sale, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalePayload {
    pub client: ClientRef,
    pub lines: Vec<SaleLine>,
    pub payment_method: PaymentMethod,
    /// Always `Σ lines.subtotal`.
    pub total: Money,
}

impl SalePayload {
    /// Indices of lines whose subtotal differs from `quantity * unit_price`.
    pub fn subtotal_mismatches(&self) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.is_consistent())
            .map(|(i, _)| i)
            .collect()
    }

    /// Backend record for `POST /sales`.
    pub fn to_wire(&self) -> WireSale {
        Sale::to_backend(&SaleForm::from(self.clone()))
    }
}

impl From<SalePayload> for SaleForm {
    fn from(payload: SalePayload) -> Self {
        SaleForm {
            id: None,
            date: None,
            client: payload.client,
            lines: payload.lines,
            payment_method: payload.payment_method,
            status: SaleStatus::Completed,
            total: payload.total,
        }
    }
}

/// Builds a sale payload from cart state.
///
/// ## Errors
/// - [`CoreError::EmptyCart`] when there are no lines
/// - [`CoreError::MissingProductRef`] when a line has no detail id, code or id
/// - [`CoreError::Validation`] for a non-positive or too large quantity, a
///   negative unit price or a negative subtotal override
///
/// ## Example
/// ```rust
/// use almacen_core::money::Money;
/// use almacen_core::sale::{build_sale_payload, CartLine};
///
/// let lines = vec![
///     CartLine { id: Some("1".into()), quantity: 2, unit_price: Money::from_cents(1000), ..Default::default() },
///     CartLine { id: Some("2".into()), quantity: 1, unit_price: Money::from_cents(3500), ..Default::default() },
/// ];
/// let payload = build_sale_payload(None, &lines, "efectivo").unwrap();
/// assert_eq!(payload.total.cents(), 5500);
/// assert!(payload.client.is_counter());
/// ```
pub fn build_sale_payload(
    selected_client: Option<&ClientRef>,
    lines: &[CartLine],
    payment_method: &str,
) -> CoreResult<SalePayload> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut sale_lines = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        let product_id = line.product_ref().ok_or_else(|| CoreError::MissingProductRef {
            index,
            name: line.name.clone(),
        })?;

        validation::validate_quantity(line.quantity)?;
        validation::validate_non_negative_cents("precio_unitario", line.unit_price.cents())?;
        if let Some(subtotal) = line.subtotal {
            validation::validate_non_negative_cents("subtotal", subtotal.cents())?;
        }

        sale_lines.push(SaleLine {
            product_id: product_id.to_string(),
            name: line.name.trim().to_string(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal: line.subtotal(),
        });
    }

    let client = selected_client
        .filter(|c| !c.id.trim().is_empty())
        .cloned()
        .unwrap_or_else(ClientRef::counter);
    let total = sale_lines.iter().map(|l| l.subtotal).sum();

    Ok(SalePayload {
        client,
        lines: sale_lines,
        payment_method: PaymentMethod::parse_lenient(payment_method),
        total,
    })
}

// =============================================================================
// Cart
// =============================================================================

/// The sale screen's cart.
///
/// ## Invariants
/// - Lines are unique by product reference (adding the same product
///   increases its quantity)
/// - Maximum lines: 100, maximum quantity per line: 999
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a line, or increases the quantity of the matching one.
    pub fn add(&mut self, line: CartLine) -> CoreResult<()> {
        let key = line
            .product_ref()
            .map(str::to_string)
            .ok_or_else(|| CoreError::MissingProductRef {
                index: self.lines.len(),
                name: line.name.clone(),
            })?;
        validation::validate_quantity(line.quantity)?;

        if let Some(existing) = self.find_mut(&key) {
            let new_qty = existing.quantity + line.quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            existing.quantity = new_qty;
            // A merged line no longer matches a fixed subtotal.
            existing.subtotal = None;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        self.lines.push(line);
        Ok(())
    }

    /// Sets the quantity of a line. Zero removes it.
    pub fn update_quantity(&mut self, product_ref: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove(product_ref);
        }
        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if quantity < 0 {
            return Err(ValidationError::MustBePositive {
                field: "cantidad".to_string(),
            }
            .into());
        }

        match self.find_mut(product_ref) {
            Some(line) => {
                line.quantity = quantity;
                line.subtotal = None;
                Ok(())
            }
            None => Err(CoreError::NotInCart(product_ref.to_string())),
        }
    }

    pub fn remove(&mut self, product_ref: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.product_ref() != Some(product_ref));

        if self.lines.len() == initial_len {
            Err(CoreError::NotInCart(product_ref.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Builds the payload for this cart.
    pub fn checkout(&self, client: Option<&ClientRef>, payment_method: &str) -> CoreResult<SalePayload> {
        build_sale_payload(client, &self.lines, payment_method)
    }

    fn find_mut(&mut self, product_ref: &str) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|l| l.product_ref() == Some(product_ref))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
