//! # Aggregation Engine
//!
//! Dashboard metrics derived from normalized snapshots.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Aggregation Engine                                │
//! │                                                                         │
//! │   &[Product] ──► InventoryAnalytics ──┬─► top_by_inventory_value(n)    │
//! │                                       ├─► stock_risk()                 │
//! │                                       ├─► summary_metrics()            │
//! │                                       └─► category_breakdown()         │
//! │                                                                         │
//! │   &[Supplier] + &[Purchase] ─────────────► supplier_activity()         │
//! │   &[Sale] ───────────────────────────────► sales_summary()             │
//! │                                                                         │
//! │   All of the above ──────────────────────► Dashboard::compute()        │
//! │                                                                         │
//! │   Stateless: every call recomputes from the snapshot it is given.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::money::Money;
use crate::types::{PaymentMethod, Product, Purchase, Sale, SaleStatus, Supplier};
use crate::NOT_AVAILABLE;

/// Default size of the top-N ranking on the dashboard.
pub const DEFAULT_TOP_N: usize = 5;

// =============================================================================
// Metric
// =============================================================================

/// A metric that may not be computable from the data the backend exposes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Metric<T> {
    Available(T),
    /// Placeholder for metrics the backend has no data for yet.
    Unavailable,
}

impl<T> Metric<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Available(_))
    }
}

// =============================================================================
// Inventory Analytics
// =============================================================================

/// Scalar inventory aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    pub total: usize,
    pub out_of_stock: usize,
    pub inventory_value: Money,
    pub turnover_rate: Metric<f64>,
}

/// Product count and stock value of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category: String,
    pub product_count: usize,
    pub inventory_value: Money,
}

/// Read-only view over a product snapshot.
#[derive(Debug, Clone, Copy)]
pub struct InventoryAnalytics<'a> {
    products: &'a [Product],
}

impl<'a> InventoryAnalytics<'a> {
    pub fn new(products: &'a [Product]) -> Self {
        Self { products }
    }

    /// The `n` products with the highest `unit_cost * stock_current`.
    ///
    /// Ties keep the input order.
    ///
    /// ```rust
    /// use almacen_core::aggregation::InventoryAnalytics;
    /// use almacen_core::Product;
    ///
    /// let products: Vec<Product> = Vec::new();
    /// assert!(InventoryAnalytics::new(&products).top_by_inventory_value(3).is_empty());
    /// ```
    pub fn top_by_inventory_value(&self, n: usize) -> Vec<&'a Product> {
        let mut ranked: Vec<(&'a Product, Money)> = self
            .products
            .iter()
            .map(|p| (p, p.inventory_value()))
            .collect();
        // `sort_by` is stable.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.into_iter().take(n).map(|(p, _)| p).collect()
    }

    /// Products at or below their minimum, or empty. Input order.
    pub fn stock_risk(&self) -> Vec<&'a Product> {
        self.products.iter().filter(|p| p.is_stock_risk()).collect()
    }

    pub fn summary_metrics(&self) -> SummaryMetrics {
        SummaryMetrics {
            total: self.products.len(),
            out_of_stock: self.products.iter().filter(|p| p.is_out_of_stock()).count(),
            inventory_value: self.products.iter().map(Product::inventory_value).sum(),
            turnover_rate: Metric::Unavailable,
        }
    }

    /// Per-category counts and values, in order of first appearance.
    pub fn category_breakdown(&self) -> Vec<CategoryShare> {
        let mut shares: Vec<CategoryShare> = Vec::new();
        for product in self.products {
            let category = product.category_display();
            match shares.iter_mut().find(|s| s.category == category) {
                Some(share) => {
                    share.product_count += 1;
                    share.inventory_value += product.inventory_value();
                }
                None => shares.push(CategoryShare {
                    category: category.to_string(),
                    product_count: 1,
                    inventory_value: product.inventory_value(),
                }),
            }
        }
        shares
    }
}

// =============================================================================
// Supplier Activity
// =============================================================================

/// Purchase history of one supplier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierActivity {
    pub supplier_id: String,
    pub name: String,
    pub last_delivery_date: Option<DateTime<Utc>>,
    pub total_purchased: Money,
    pub purchase_count: usize,
    pub reliability: Metric<f64>,
}

/// Last delivery and purchased total per supplier, in supplier order.
pub fn supplier_activity(suppliers: &[Supplier], purchases: &[Purchase]) -> Vec<SupplierActivity> {
    suppliers
        .iter()
        .map(|supplier| {
            let history: Vec<&Purchase> = purchases
                .iter()
                .filter(|p| !p.supplier_id.is_empty() && p.supplier_id == supplier.id)
                .collect();

            SupplierActivity {
                supplier_id: supplier.id.clone(),
                name: supplier.name.clone(),
                last_delivery_date: history.iter().filter_map(|p| p.date).max(),
                total_purchased: history.iter().map(|p| p.total).sum(),
                purchase_count: history.len(),
                reliability: Metric::Unavailable,
            }
        })
        .collect()
}

// =============================================================================
// Sales Summary
// =============================================================================

/// Revenue figures over completed sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub completed: usize,
    pub pending: usize,
    pub voided: usize,
    pub revenue: Money,
    pub cash_revenue: Money,
    pub transfer_revenue: Money,
    pub average_ticket: Money,
}

pub fn sales_summary(sales: &[Sale]) -> SalesSummary {
    let mut summary = SalesSummary {
        completed: 0,
        pending: 0,
        voided: 0,
        revenue: Money::zero(),
        cash_revenue: Money::zero(),
        transfer_revenue: Money::zero(),
        average_ticket: Money::zero(),
    };

    for sale in sales {
        match sale.status {
            SaleStatus::Pending => summary.pending += 1,
            SaleStatus::Voided => summary.voided += 1,
            SaleStatus::Completed => {
                summary.completed += 1;
                summary.revenue += sale.total;
                match sale.payment_method {
                    PaymentMethod::Cash => summary.cash_revenue += sale.total,
                    PaymentMethod::Transfer => summary.transfer_revenue += sale.total,
                }
            }
        }
    }

    if summary.completed > 0 {
        summary.average_ticket = Money::from_cents(summary.revenue.cents() / summary.completed as i64);
    }
    summary
}

// =============================================================================
// Dashboard
// =============================================================================

/// Compact product row for dashboard lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub stock_current: u32,
    pub stock_min: u32,
    pub inventory_value: Money,
    pub primary_provider: String,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        ProductRow {
            id: p.id.clone(),
            name: p.name.clone(),
            category: p.category_display().to_string(),
            stock_current: p.stock_current,
            stock_min: p.stock_min,
            inventory_value: p.inventory_value(),
            primary_provider: p
                .primary_provider()
                .map(|s| s.name.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}

/// Everything the dashboard screen shows, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub summary: SummaryMetrics,
    pub top_by_value: Vec<ProductRow>,
    pub stock_risk: Vec<ProductRow>,
    pub categories: Vec<CategoryShare>,
    pub suppliers: Vec<SupplierActivity>,
    pub sales: SalesSummary,
}

impl Dashboard {
    pub fn compute(
        products: &[Product],
        suppliers: &[Supplier],
        purchases: &[Purchase],
        sales: &[Sale],
        top_n: usize,
    ) -> Self {
        let inventory = InventoryAnalytics::new(products);

        Dashboard {
            summary: inventory.summary_metrics(),
            top_by_value: inventory
                .top_by_inventory_value(top_n)
                .into_iter()
                .map(ProductRow::from)
                .collect(),
            stock_risk: inventory.stock_risk().into_iter().map(ProductRow::from).collect(),
            categories: inventory.category_breakdown(),
            suppliers: supplier_activity(suppliers, purchases),
            sales: sales_summary(sales),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryRef, ClientRef, PersonType};
    use chrono::TimeZone;

    fn product(id: &str, stock_current: u32, stock_min: u32, unit_cost_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Producto {}", id),
            category: CategoryRef::default(),
            providers: Vec::new(),
            stock_current,
            stock_min,
            stock_max: 100,
            unit_cost: Money::from_cents(unit_cost_cents),
            sale_price: Money::zero(),
            updated_at: None,
        }
    }

    fn supplier(id: &str) -> Supplier {
        Supplier {
            id: id.to_string(),
            tax_id: String::new(),
            name: format!("Proveedor {}", id),
            contact: None,
            phone: None,
            email: None,
            address: None,
            active: true,
            person_type: PersonType::Natural,
            categories: Vec::new(),
        }
    }

    fn sale(total: i64, method: PaymentMethod, status: SaleStatus) -> Sale {
        Sale {
            id: String::new(),
            date: None,
            client: ClientRef::counter(),
            lines: Vec::new(),
            payment_method: method,
            status,
            total: Money::from_cents(total),
        }
    }

    #[test]
    fn test_top_n_is_stable_on_ties() {
        let products = vec![product("a", 5, 0, 100), product("b", 5, 0, 100), product("c", 3, 0, 100)];
        let top = InventoryAnalytics::new(&products).top_by_inventory_value(2);
        let ids: Vec<&str> = top.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_top_n_sorts_descending() {
        let products = vec![product("a", 1, 0, 100), product("b", 9, 0, 100), product("c", 4, 0, 100)];
        let top = InventoryAnalytics::new(&products).top_by_inventory_value(10);
        let ids: Vec<&str> = top.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_stock_risk_membership() {
        let products = vec![product("empty", 0, 5, 100), product("ok", 10, 5, 100), product("edge", 5, 5, 100)];
        let risk = InventoryAnalytics::new(&products).stock_risk();
        let ids: Vec<&str> = risk.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["empty", "edge"]);
    }

    #[test]
    fn test_summary_metrics() {
        let products = vec![product("a", 0, 5, 100), product("b", 10, 5, 250)];
        let summary = InventoryAnalytics::new(&products).summary_metrics();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.out_of_stock, 1);
        assert_eq!(summary.inventory_value.cents(), 2500);
        assert!(!summary.turnover_rate.is_available());
    }

    #[test]
    fn test_summary_metrics_with_extreme_values() {
        // 1e17 pesos per unit, far past what the cent total can hold.
        let unit_cost = Money::from_major(1e17).cents();
        let products = vec![product("a", 1_000, 5, unit_cost), product("b", u32::MAX, 5, i64::MAX)];
        let analytics = InventoryAnalytics::new(&products);

        let summary = analytics.summary_metrics();
        assert_eq!(summary.inventory_value.cents(), i64::MAX);

        let shares = analytics.category_breakdown();
        assert_eq!(shares[0].inventory_value.cents(), i64::MAX);

        let top: Vec<&str> = analytics.top_by_inventory_value(2).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(top, vec!["a", "b"]);
    }

    #[test]
    fn test_sales_summary_saturates() {
        let sales = vec![
            sale(i64::MAX, PaymentMethod::Cash, SaleStatus::Completed),
            sale(i64::MAX, PaymentMethod::Cash, SaleStatus::Completed),
        ];
        let summary = sales_summary(&sales);
        assert_eq!(summary.revenue.cents(), i64::MAX);
        assert_eq!(summary.cash_revenue.cents(), i64::MAX);
        assert_eq!(summary.average_ticket.cents(), i64::MAX / 2);
    }

    #[test]
    fn test_category_breakdown_groups_missing_as_na() {
        let mut a = product("a", 2, 0, 100);
        a.category = CategoryRef {
            id: "CAT-001".into(),
            name: "Aseo".into(),
        };
        let products = vec![a, product("b", 1, 0, 100), product("c", 1, 0, 100)];
        let shares = InventoryAnalytics::new(&products).category_breakdown();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].category, "Aseo");
        assert_eq!(shares[1].category, "N/A");
        assert_eq!(shares[1].product_count, 2);
    }

    #[test]
    fn test_supplier_activity() {
        let suppliers = vec![supplier("3"), supplier("4")];
        let d1 = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let d2 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let purchases = vec![
            Purchase { id: "1".into(), supplier_id: "3".into(), date: Some(d2), total: Money::from_cents(500) },
            Purchase { id: "2".into(), supplier_id: "3".into(), date: Some(d1), total: Money::from_cents(700) },
        ];

        let activity = supplier_activity(&suppliers, &purchases);
        assert_eq!(activity[0].last_delivery_date, Some(d2));
        assert_eq!(activity[0].total_purchased.cents(), 1200);
        assert_eq!(activity[0].purchase_count, 2);
        assert_eq!(activity[1].last_delivery_date, None);
        assert_eq!(activity[1].total_purchased, Money::zero());
    }

    #[test]
    fn test_sales_summary() {
        let sales = vec![
            sale(1000, PaymentMethod::Cash, SaleStatus::Completed),
            sale(2001, PaymentMethod::Transfer, SaleStatus::Completed),
            sale(9999, PaymentMethod::Cash, SaleStatus::Voided),
        ];
        let summary = sales_summary(&sales);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.voided, 1);
        assert_eq!(summary.revenue.cents(), 3001);
        assert_eq!(summary.cash_revenue.cents(), 1000);
        assert_eq!(summary.average_ticket.cents(), 1500);

        assert_eq!(sales_summary(&[]).average_ticket, Money::zero());
    }

    #[test]
    fn test_dashboard_serializes_placeholders() {
        let products = vec![product("a", 0, 5, 100)];
        let dashboard = Dashboard::compute(&products, &[], &[], &[], DEFAULT_TOP_N);
        assert_eq!(dashboard.stock_risk.len(), 1);
        assert_eq!(dashboard.stock_risk[0].primary_provider, "N/A");

        let json = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(json["summary"]["turnoverRate"]["status"], "unavailable");
    }
}
