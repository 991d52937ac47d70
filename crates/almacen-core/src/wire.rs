//! # Wire Records
//!
//! Backend records with the backend's native field names. These types are
//! the only place Spanish snake_case names appear; request bodies are always
//! built from them so no canonical name leaks to the server.
//!
//! Every field is optional and decoded through [`crate::lenient`], so
//! decoding a JSON object never fails. [`decode_record`] covers the remaining
//! case (the element is not an object at all) by falling back to an empty
//! record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lenient::{self, StatusFlag};

/// Decodes one backend record, degrading to an empty record.
pub fn decode_record<W>(value: Value) -> W
where
    W: DeserializeOwned + Default,
{
    serde_json::from_value(value).unwrap_or_default()
}

/// Decodes a list of backend records, one at a time.
pub fn decode_records<W>(values: Vec<Value>) -> Vec<W>
where
    W: DeserializeOwned + Default,
{
    values.into_iter().map(decode_record).collect()
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireCategory {
    #[serde(default, deserialize_with = "lenient::opt_string", serialize_with = "lenient::ser_id", skip_serializing_if = "Option::is_none")]
    pub id_categoria: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub nombre_categoria: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    /// Boolean on this resource.
    #[serde(default, deserialize_with = "lenient::opt_status", skip_serializing_if = "Option::is_none")]
    pub estado: Option<StatusFlag>,
}

// =============================================================================
// Client
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireClient {
    #[serde(default, deserialize_with = "lenient::opt_string", serialize_with = "lenient::ser_id", skip_serializing_if = "Option::is_none")]
    pub id_cliente: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub nombre_cliente: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub tipo_docume: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub numero_documento: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub correo: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    /// Text (`activo`/`inactivo`) on this resource.
    #[serde(default, deserialize_with = "lenient::opt_status", skip_serializing_if = "Option::is_none")]
    pub estado_cliente: Option<StatusFlag>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub fecha_registro: Option<String>,
}

// =============================================================================
// Supplier
// =============================================================================

/// Join row of the supplier ⇄ category relation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryLink {
    #[serde(default, deserialize_with = "lenient::opt_record", skip_serializing_if = "Option::is_none")]
    pub categoria: Option<WireCategory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireSupplier {
    #[serde(default, deserialize_with = "lenient::opt_string", serialize_with = "lenient::ser_id", skip_serializing_if = "Option::is_none")]
    pub id_proveedor: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub nit: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub nombre_proveedor: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub contacto: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub correo: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    /// Boolean on this resource.
    #[serde(default, deserialize_with = "lenient::opt_status", skip_serializing_if = "Option::is_none")]
    pub estado_proveedor: Option<StatusFlag>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub tipo_persona: Option<String>,
    /// Direct shape of the category relation.
    #[serde(default, deserialize_with = "lenient::opt_vec", skip_serializing_if = "Option::is_none")]
    pub categorias: Option<Vec<WireCategory>>,
    /// Join-table shape of the category relation.
    #[serde(default, deserialize_with = "lenient::opt_vec", skip_serializing_if = "Option::is_none")]
    pub proveedor_categorias: Option<Vec<CategoryLink>>,
}

// =============================================================================
// Product
// =============================================================================

/// Join row of the product ⇄ supplier relation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierLink {
    #[serde(default, deserialize_with = "lenient::opt_record", skip_serializing_if = "Option::is_none")]
    pub proveedor: Option<WireSupplier>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireProduct {
    #[serde(default, deserialize_with = "lenient::opt_string", serialize_with = "lenient::ser_id", skip_serializing_if = "Option::is_none")]
    pub id_producto: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub nombre_producto: Option<String>,
    /// Nested category record.
    #[serde(default, deserialize_with = "lenient::opt_record", skip_serializing_if = "Option::is_none")]
    pub categoria: Option<WireCategory>,
    /// Flat category id, used when no nested record is present.
    #[serde(default, deserialize_with = "lenient::opt_string", serialize_with = "lenient::ser_id", skip_serializing_if = "Option::is_none")]
    pub id_categoria: Option<String>,
    /// Direct shape of the supplier relation.
    #[serde(default, deserialize_with = "lenient::opt_vec", skip_serializing_if = "Option::is_none")]
    pub proveedores: Option<Vec<WireSupplier>>,
    /// Join-table shape of the supplier relation.
    #[serde(default, deserialize_with = "lenient::opt_vec", skip_serializing_if = "Option::is_none")]
    pub producto_proveedores: Option<Vec<SupplierLink>>,
    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub stock_actual: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub stock_minimo: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub stock_maximo: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub costo_unitario: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub precio_venta: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub fecha_actualizacion: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub fecha_creacion: Option<String>,
}

// =============================================================================
// Sale
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireSaleLine {
    #[serde(default, deserialize_with = "lenient::opt_string", serialize_with = "lenient::ser_id", skip_serializing_if = "Option::is_none")]
    pub id_detalle: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", serialize_with = "lenient::ser_id", skip_serializing_if = "Option::is_none")]
    pub id_producto: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub codigo: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub nombre_producto: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub cantidad: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub precio_unitario: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireSale {
    #[serde(default, deserialize_with = "lenient::opt_string", serialize_with = "lenient::ser_id", skip_serializing_if = "Option::is_none")]
    pub id_venta: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub fecha_venta: Option<String>,
    /// Nested client record.
    #[serde(default, deserialize_with = "lenient::opt_record", skip_serializing_if = "Option::is_none")]
    pub cliente: Option<WireClient>,
    /// Flat client id, used when no nested record is present.
    #[serde(default, deserialize_with = "lenient::opt_string", serialize_with = "lenient::ser_id", skip_serializing_if = "Option::is_none")]
    pub id_cliente: Option<String>,
    /// Lines; create payloads send them as `detalles`.
    #[serde(rename = "detalles", alias = "detalle_venta", default, deserialize_with = "lenient::opt_vec", skip_serializing_if = "Option::is_none")]
    pub detalle_venta: Option<Vec<WireSaleLine>>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub metodo_pago: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub estado_venta: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}

/// Body of `PUT /sales/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireSaleStatus {
    pub estado_venta: String,
}

// =============================================================================
// Purchase
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WirePurchase {
    #[serde(default, deserialize_with = "lenient::opt_string", serialize_with = "lenient::ser_id", skip_serializing_if = "Option::is_none")]
    pub id_compra: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", serialize_with = "lenient::ser_id", skip_serializing_if = "Option::is_none")]
    pub id_proveedor: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub fecha_compra: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_number", skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}
