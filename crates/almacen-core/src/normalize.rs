//! # Entity Normalizer
//!
//! One [`Normalize`] impl per entity, translating backend records to the
//! canonical model and form records back to backend records.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   serde_json::Value ──decode_record──► WireX ──to_canonical──► X       │
//! │                                          ▲                       │      │
//! │                                          └──to_backend── XForm ◄─┘      │
//! │                                                          to_form        │
//! │                                                                         │
//! │   • total: no function here returns a Result                          │
//! │   • every fallback source is listed in priority order in ONE place     │
//! │   • to_canonical(to_backend(to_form(to_canonical(x)))) == to_canonical(x)│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::lenient::{self, StatusFlag};
use crate::money::Money;
use crate::relation::{dedup_by_key, Relation};
use crate::types::*;
use crate::validation::{self, ValidationResult};
use crate::wire::*;
use crate::{CATEGORY_ID_PREFIX, COUNTER_CLIENT_ID, COUNTER_CLIENT_NAME};

/// Bidirectional mapping between a canonical entity and its backend record.
pub trait Normalize: Sized + Clone + Debug + Send + Sync + 'static {
    /// Backend record with native field names.
    type Wire: Serialize + DeserializeOwned + Default + Clone + Debug + Send + Sync + 'static;
    /// Editable record the UI submits on create/update.
    type Form: Clone + Debug + Send + Sync + 'static;

    /// Backend → canonical. Never fails; missing fields take defaults.
    fn to_canonical(wire: &Self::Wire) -> Self;

    /// Form → backend. Only backend field names are produced.
    fn to_backend(form: &Self::Form) -> Self::Wire;

    /// Canonical → form, for editing an existing record.
    fn to_form(&self) -> Self::Form;

    /// Field rules checked before a create/update request.
    fn validate_form(form: &Self::Form) -> ValidationResult<()>;

    /// Canonical id, used to locate the record in a collection.
    fn id(&self) -> &str;

    /// Decodes and normalizes one raw JSON element.
    fn from_value(value: Value) -> Self {
        Self::to_canonical(&decode_record::<Self::Wire>(value))
    }
}

// =============================================================================
// Field Helpers
// =============================================================================

/// Trimmed text, empty when missing.
fn text(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

/// Trimmed text, `None` when missing or blank.
fn opt_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Non-blank text for an outgoing record.
fn out_text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn money(value: Option<f64>) -> Money {
    Money::from_major(value.unwrap_or(0.0)).non_negative()
}

fn date(value: &Option<String>) -> Option<DateTime<Utc>> {
    value.as_deref().and_then(lenient::parse_date)
}

fn date_text(value: &Option<DateTime<Utc>>) -> Option<String> {
    value.map(|d| d.to_rfc3339())
}

/// Display form of a category id: `7` → `CAT-007`.
///
/// Backend category ids are numeric. A numeric id that already carries the
/// prefix is re-padded, so the mapping is idempotent; anything else passes
/// through unchanged.
///
/// ```rust
/// use almacen_core::normalize::display_category_id;
///
/// assert_eq!(display_category_id("7"), "CAT-007");
/// assert_eq!(display_category_id("1234"), "CAT-1234");
/// assert_eq!(display_category_id("CAT-012"), "CAT-012");
/// assert_eq!(display_category_id("CAT-7"), "CAT-007");
/// assert_eq!(display_category_id(""), "");
/// ```
pub fn display_category_id(raw: &str) -> String {
    let raw = raw.trim();
    let digits = raw.strip_prefix(CATEGORY_ID_PREFIX).unwrap_or(raw);
    match digits.parse::<u64>() {
        Ok(n) => format!("{}{:03}", CATEGORY_ID_PREFIX, n),
        Err(_) => raw.to_string(),
    }
}

/// Backend form of a category id: `CAT-007` → `7`. Inverse of
/// [`display_category_id`] for numeric ids; other ids pass through.
pub fn backend_category_id(display: &str) -> String {
    let display = display.trim();
    let stripped = display.strip_prefix(CATEGORY_ID_PREFIX).unwrap_or(display);
    match stripped.parse::<u64>() {
        Ok(n) => n.to_string(),
        Err(_) => display.to_string(),
    }
}

fn category_ref(wire: &WireCategory) -> CategoryRef {
    CategoryRef {
        id: display_category_id(&text(&wire.id_categoria)),
        name: text(&wire.nombre_categoria),
    }
}

fn category_ref_to_wire(category: &CategoryRef) -> WireCategory {
    WireCategory {
        id_categoria: out_text(&backend_category_id(&category.id)),
        nombre_categoria: out_text(&category.name),
        ..Default::default()
    }
}

fn supplier_ref(wire: &WireSupplier) -> SupplierRef {
    SupplierRef {
        id: text(&wire.id_proveedor),
        name: text(&wire.nombre_proveedor),
    }
}

/// Dedup key of a reference: the id, or the name when there is no id.
fn ref_key(id: &str, name: &str) -> String {
    if id.is_empty() {
        name.to_lowercase()
    } else {
        id.to_string()
    }
}

// =============================================================================
// Category
// =============================================================================

/// Editable category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryForm {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub active: bool,
}

impl Normalize for Category {
    type Wire = WireCategory;
    type Form = CategoryForm;

    fn to_canonical(wire: &WireCategory) -> Self {
        Category {
            id: display_category_id(&text(&wire.id_categoria)),
            name: text(&wire.nombre_categoria),
            description: text(&wire.descripcion),
            active: lenient::is_active(wire.estado.as_ref()),
        }
    }

    fn to_backend(form: &CategoryForm) -> WireCategory {
        WireCategory {
            id_categoria: form.id.as_deref().and_then(|id| out_text(&backend_category_id(id))),
            nombre_categoria: Some(form.name.trim().to_string()),
            descripcion: Some(form.description.trim().to_string()),
            estado: Some(StatusFlag::Flag(form.active)),
        }
    }

    fn to_form(&self) -> CategoryForm {
        CategoryForm {
            id: out_text(&self.id),
            name: self.name.clone(),
            description: self.description.clone(),
            active: self.active,
        }
    }

    fn validate_form(form: &CategoryForm) -> ValidationResult<()> {
        validation::validate_name("nombre_categoria", &form.name)?;
        validation::validate_description(&form.description)
    }

    fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Client
// =============================================================================

/// Editable client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientForm {
    pub id: Option<String>,
    pub name: String,
    pub document_type: String,
    pub document_number: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Normalize for Client {
    type Wire = WireClient;
    type Form = ClientForm;

    fn to_canonical(wire: &WireClient) -> Self {
        let id = text(&wire.id_cliente);
        // The counter client is active whatever the backend stores.
        let active = id == COUNTER_CLIENT_ID || lenient::is_active(wire.estado_cliente.as_ref());

        Client {
            id,
            name: text(&wire.nombre_cliente),
            document_type: text(&wire.tipo_docume),
            document_number: text(&wire.numero_documento),
            email: opt_text(&wire.correo),
            phone: opt_text(&wire.telefono),
            active,
            created_at: date(&wire.fecha_registro),
        }
    }

    fn to_backend(form: &ClientForm) -> WireClient {
        WireClient {
            id_cliente: form.id.as_deref().and_then(out_text),
            nombre_cliente: Some(form.name.trim().to_string()),
            tipo_docume: Some(form.document_type.trim().to_string()),
            numero_documento: Some(form.document_number.trim().to_string()),
            correo: opt_text(&form.email),
            telefono: opt_text(&form.phone),
            estado_cliente: Some(StatusFlag::text(form.active)),
            fecha_registro: date_text(&form.created_at),
        }
    }

    fn to_form(&self) -> ClientForm {
        ClientForm {
            id: out_text(&self.id),
            name: self.name.clone(),
            document_type: self.document_type.clone(),
            document_number: self.document_number.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            active: self.active,
            created_at: self.created_at,
        }
    }

    fn validate_form(form: &ClientForm) -> ValidationResult<()> {
        validation::validate_name("nombre_cliente", &form.name)?;
        validation::validate_required("tipo_docume", &form.document_type, 20)?;
        validation::validate_required("numero_documento", &form.document_number, 30)?;
        validation::validate_email(form.email.as_deref())
    }

    fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Supplier
// =============================================================================

/// Editable supplier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplierForm {
    pub id: Option<String>,
    pub tax_id: String,
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub active: bool,
    pub person_type: PersonType,
    pub categories: Vec<CategoryRef>,
}

impl Normalize for Supplier {
    type Wire = WireSupplier;
    type Form = SupplierForm;

    fn to_canonical(wire: &WireSupplier) -> Self {
        let join = wire
            .proveedor_categorias
            .as_ref()
            .map(|rows| rows.iter().filter_map(|r| r.categoria.clone()).collect());
        let categories = Relation::resolve(wire.categorias.clone(), join)
            .into_items()
            .iter()
            .map(category_ref)
            .filter(|c| !c.id.is_empty() || !c.name.is_empty())
            .collect();

        Supplier {
            id: text(&wire.id_proveedor),
            tax_id: text(&wire.nit),
            name: text(&wire.nombre_proveedor),
            contact: opt_text(&wire.contacto),
            phone: opt_text(&wire.telefono),
            email: opt_text(&wire.correo),
            address: opt_text(&wire.direccion),
            active: lenient::is_active(wire.estado_proveedor.as_ref()),
            person_type: wire
                .tipo_persona
                .as_deref()
                .map(PersonType::parse_lenient)
                .unwrap_or_default(),
            categories: dedup_by_key(categories, |c: &CategoryRef| ref_key(&c.id, &c.name)),
        }
    }

    fn to_backend(form: &SupplierForm) -> WireSupplier {
        let categorias: Vec<WireCategory> = form.categories.iter().map(category_ref_to_wire).collect();

        WireSupplier {
            id_proveedor: form.id.as_deref().and_then(out_text),
            nit: Some(form.tax_id.trim().to_string()),
            nombre_proveedor: Some(form.name.trim().to_string()),
            contacto: opt_text(&form.contact),
            telefono: opt_text(&form.phone),
            correo: opt_text(&form.email),
            direccion: opt_text(&form.address),
            estado_proveedor: Some(StatusFlag::Flag(form.active)),
            tipo_persona: Some(form.person_type.as_wire().to_string()),
            categorias: (!categorias.is_empty()).then_some(categorias),
            proveedor_categorias: None,
        }
    }

    fn to_form(&self) -> SupplierForm {
        SupplierForm {
            id: out_text(&self.id),
            tax_id: self.tax_id.clone(),
            name: self.name.clone(),
            contact: self.contact.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
            active: self.active,
            person_type: self.person_type,
            categories: self.categories.clone(),
        }
    }

    fn validate_form(form: &SupplierForm) -> ValidationResult<()> {
        validation::validate_name("nombre_proveedor", &form.name)?;
        validation::validate_required("nit", &form.tax_id, 30)?;
        validation::validate_email(form.email.as_deref())
    }

    fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Product
// =============================================================================

/// Editable product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub id: Option<String>,
    pub name: String,
    pub category: CategoryRef,
    pub providers: Vec<SupplierRef>,
    pub stock_current: u32,
    pub stock_min: u32,
    pub stock_max: u32,
    pub unit_cost: Money,
    pub sale_price: Money,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Normalize for Product {
    type Wire = WireProduct;
    type Form = ProductForm;

    fn to_canonical(wire: &WireProduct) -> Self {
        // Nested category record first, then the flat id.
        let category = match &wire.categoria {
            Some(nested) => {
                let mut c = category_ref(nested);
                if c.id.is_empty() {
                    c.id = display_category_id(&text(&wire.id_categoria));
                }
                c
            }
            None => CategoryRef {
                id: display_category_id(&text(&wire.id_categoria)),
                name: String::new(),
            },
        };

        let join = wire
            .producto_proveedores
            .as_ref()
            .map(|rows| rows.iter().filter_map(|r| r.proveedor.clone()).collect());
        let providers: Vec<SupplierRef> = Relation::resolve(wire.proveedores.clone(), join)
            .into_items()
            .iter()
            .map(supplier_ref)
            .filter(|s| !s.id.is_empty() || !s.name.is_empty())
            .collect();

        let stock_min = lenient::count(wire.stock_minimo);

        Product {
            id: text(&wire.id_producto),
            name: text(&wire.nombre_producto),
            category,
            providers: dedup_by_key(providers, |s: &SupplierRef| ref_key(&s.id, &s.name)),
            stock_current: lenient::count(wire.stock_actual),
            stock_min,
            stock_max: lenient::count(wire.stock_maximo).max(stock_min),
            unit_cost: money(wire.costo_unitario),
            sale_price: money(wire.precio_venta),
            updated_at: date(&wire.fecha_actualizacion).or_else(|| date(&wire.fecha_creacion)),
        }
    }

    fn to_backend(form: &ProductForm) -> WireProduct {
        let has_category = !form.category.id.is_empty() || !form.category.name.is_empty();
        let proveedores: Vec<WireSupplier> = form
            .providers
            .iter()
            .map(|p| WireSupplier {
                id_proveedor: out_text(&p.id),
                nombre_proveedor: out_text(&p.name),
                ..Default::default()
            })
            .collect();

        WireProduct {
            id_producto: form.id.as_deref().and_then(out_text),
            nombre_producto: Some(form.name.trim().to_string()),
            categoria: has_category.then(|| category_ref_to_wire(&form.category)),
            id_categoria: out_text(&backend_category_id(&form.category.id)),
            proveedores: (!proveedores.is_empty()).then_some(proveedores),
            producto_proveedores: None,
            stock_actual: Some(form.stock_current as f64),
            stock_minimo: Some(form.stock_min as f64),
            stock_maximo: Some(form.stock_max as f64),
            costo_unitario: Some(form.unit_cost.to_major()),
            precio_venta: Some(form.sale_price.to_major()),
            fecha_actualizacion: date_text(&form.updated_at),
            fecha_creacion: None,
        }
    }

    fn to_form(&self) -> ProductForm {
        ProductForm {
            id: out_text(&self.id),
            name: self.name.clone(),
            category: self.category.clone(),
            providers: self.providers.clone(),
            stock_current: self.stock_current,
            stock_min: self.stock_min,
            stock_max: self.stock_max,
            unit_cost: self.unit_cost,
            sale_price: self.sale_price,
            updated_at: self.updated_at,
        }
    }

    fn validate_form(form: &ProductForm) -> ValidationResult<()> {
        validation::validate_name("nombre_producto", &form.name)?;
        validation::validate_stock_range(form.stock_min, form.stock_max)?;
        validation::validate_non_negative_cents("costo_unitario", form.unit_cost.cents())?;
        validation::validate_non_negative_cents("precio_venta", form.sale_price.cents())
    }

    fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Editable sale. Built by the sale builder for creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleForm {
    pub id: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub client: ClientRef,
    pub lines: Vec<SaleLine>,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub total: Money,
}

fn sale_line(wire: &WireSaleLine) -> SaleLine {
    let quantity = wire.cantidad.map(|q| q.round().max(0.0) as i64).unwrap_or(0);
    let unit_price = money(wire.precio_unitario);
    // An explicit subtotal is trusted as sent.
    let subtotal = match wire.subtotal {
        Some(s) => money(Some(s)),
        None => unit_price.multiply_quantity(quantity),
    };

    SaleLine {
        product_id: opt_text(&wire.id_producto)
            .or_else(|| opt_text(&wire.codigo))
            .unwrap_or_default(),
        name: text(&wire.nombre_producto),
        quantity,
        unit_price,
        subtotal,
    }
}

fn sale_line_to_wire(line: &SaleLine) -> WireSaleLine {
    WireSaleLine {
        id_producto: out_text(&line.product_id),
        nombre_producto: out_text(&line.name),
        cantidad: Some(line.quantity as f64),
        precio_unitario: Some(line.unit_price.to_major()),
        subtotal: Some(line.subtotal.to_major()),
        ..Default::default()
    }
}

fn client_ref(wire: &WireSale) -> ClientRef {
    // Nested client record, then the flat id, then the counter client.
    let (id, name) = match &wire.cliente {
        Some(nested) => (
            opt_text(&nested.id_cliente).or_else(|| opt_text(&wire.id_cliente)),
            text(&nested.nombre_cliente),
        ),
        None => (opt_text(&wire.id_cliente), String::new()),
    };

    match id {
        Some(id) if id == COUNTER_CLIENT_ID && name.is_empty() => ClientRef::counter(),
        Some(id) => ClientRef { id, name },
        None => ClientRef::counter(),
    }
}

impl Normalize for Sale {
    type Wire = WireSale;
    type Form = SaleForm;

    fn to_canonical(wire: &WireSale) -> Self {
        let lines: Vec<SaleLine> = wire
            .detalle_venta
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(sale_line)
            .collect();
        let total = if lines.is_empty() {
            money(wire.total)
        } else {
            lines.iter().map(|l| l.subtotal).sum()
        };

        Sale {
            id: text(&wire.id_venta),
            date: date(&wire.fecha_venta),
            client: client_ref(wire),
            lines,
            payment_method: wire
                .metodo_pago
                .as_deref()
                .map(PaymentMethod::parse_lenient)
                .unwrap_or_default(),
            status: wire
                .estado_venta
                .as_deref()
                .map(SaleStatus::parse_lenient)
                .unwrap_or_default(),
            total,
        }
    }

    fn to_backend(form: &SaleForm) -> WireSale {
        let named = !form.client.name.trim().is_empty() && form.client.name != COUNTER_CLIENT_NAME;

        WireSale {
            id_venta: form.id.as_deref().and_then(out_text),
            fecha_venta: date_text(&form.date),
            cliente: named.then(|| WireClient {
                id_cliente: out_text(&form.client.id),
                nombre_cliente: out_text(&form.client.name),
                ..Default::default()
            }),
            id_cliente: out_text(&form.client.id),
            detalle_venta: Some(form.lines.iter().map(sale_line_to_wire).collect()),
            metodo_pago: Some(form.payment_method.as_wire().to_string()),
            estado_venta: Some(form.status.as_wire().to_string()),
            total: Some(form.total.to_major()),
        }
    }

    fn to_form(&self) -> SaleForm {
        SaleForm {
            id: out_text(&self.id),
            date: self.date,
            client: self.client.clone(),
            lines: self.lines.clone(),
            payment_method: self.payment_method,
            status: self.status,
            total: self.total,
        }
    }

    fn validate_form(form: &SaleForm) -> ValidationResult<()> {
        if form.lines.is_empty() {
            return Err(crate::ValidationError::Required {
                field: "detalles".to_string(),
            });
        }
        for line in &form.lines {
            validation::validate_quantity(line.quantity)?;
            validation::validate_non_negative_cents("precio_unitario", line.unit_price.cents())?;
            validation::validate_non_negative_cents("subtotal", line.subtotal.cents())?;
        }
        Ok(())
    }

    fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// Editable purchase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseForm {
    pub id: Option<String>,
    pub supplier_id: String,
    pub date: Option<DateTime<Utc>>,
    pub total: Money,
}

impl Normalize for Purchase {
    type Wire = WirePurchase;
    type Form = PurchaseForm;

    fn to_canonical(wire: &WirePurchase) -> Self {
        Purchase {
            id: text(&wire.id_compra),
            supplier_id: text(&wire.id_proveedor),
            date: date(&wire.fecha_compra),
            total: money(wire.total),
        }
    }

    fn to_backend(form: &PurchaseForm) -> WirePurchase {
        WirePurchase {
            id_compra: form.id.as_deref().and_then(out_text),
            id_proveedor: out_text(&form.supplier_id),
            fecha_compra: date_text(&form.date),
            total: Some(form.total.to_major()),
        }
    }

    fn to_form(&self) -> PurchaseForm {
        PurchaseForm {
            id: out_text(&self.id),
            supplier_id: self.supplier_id.clone(),
            date: self.date,
            total: self.total,
        }
    }

    fn validate_form(form: &PurchaseForm) -> ValidationResult<()> {
        validation::validate_required("id_proveedor", &form.supplier_id, 30)?;
        validation::validate_non_negative_cents("total", form.total.cents())
    }

    fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
