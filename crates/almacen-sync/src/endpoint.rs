//! # Endpoints
//!
//! REST paths and response envelopes per collection.
//!
//! | Entity   | Path         | Envelope key  |
//! |----------|--------------|---------------|
//! | Category | `categories` | `categorias`  |
//! | Client   | `clients`    | `clientes`    |
//! | Supplier | `suppliers`  | `proveedores` |
//! | Product  | `products`   | `productos`   |
//! | Sale     | `sales`      | `ventas`      |
//! | Purchase | `purchases`  | `compras`     |

use almacen_core::normalize::backend_category_id;
use almacen_core::{Category, Client, Normalize, Product, Purchase, Sale, Supplier};
use serde_json::Value;

/// Generic envelope key accepted for every collection.
pub const DATA_KEY: &str = "data";

/// A normalizable entity served by a REST collection.
pub trait Endpoint: Normalize {
    /// Collection path relative to the API base URL.
    const PATH: &'static str;

    /// Key wrapping the array in `{ key: [...] }` responses.
    const ENVELOPE: &'static str;

    /// Id as the backend expects it in a path.
    fn backend_id(id: &str) -> String {
        id.to_string()
    }

    /// Overwrites the canonical id.
    fn set_id(&mut self, id: &str);

    fn item_path(id: &str) -> String {
        format!("{}/{}", Self::PATH, urlencoding::encode(&Self::backend_id(id)))
    }

    fn search_path(query: &str) -> String {
        format!("{}/search/{}", Self::PATH, urlencoding::encode(query))
    }
}

impl Endpoint for Category {
    const PATH: &'static str = "categories";
    const ENVELOPE: &'static str = "categorias";

    fn backend_id(id: &str) -> String {
        backend_category_id(id)
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

impl Endpoint for Client {
    const PATH: &'static str = "clients";
    const ENVELOPE: &'static str = "clientes";

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

impl Endpoint for Supplier {
    const PATH: &'static str = "suppliers";
    const ENVELOPE: &'static str = "proveedores";

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

impl Endpoint for Product {
    const PATH: &'static str = "products";
    const ENVELOPE: &'static str = "productos";

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

impl Endpoint for Sale {
    const PATH: &'static str = "sales";
    const ENVELOPE: &'static str = "ventas";

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

impl Endpoint for Purchase {
    const PATH: &'static str = "purchases";
    const ENVELOPE: &'static str = "compras";

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

// =============================================================================
// Envelopes
// =============================================================================

/// Extracts the record array from a list response.
///
/// Accepts a bare array, `{ envelope: [...] }` or `{ "data": [...] }`;
/// anything else is an empty collection.
pub fn unwrap_envelope(body: Value, envelope: &str) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(envelope).or_else(|| map.remove(DATA_KEY)) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Extracts one record from a get/create/update response.
///
/// Accepts the bare record or `{ "data": {...} }`; anything else is `None`.
pub fn unwrap_record(body: Value) -> Option<Value> {
    match body {
        Value::Object(mut map) => match map.remove(DATA_KEY) {
            Some(Value::Object(inner)) => Some(Value::Object(inner)),
            Some(other) => {
                map.insert(DATA_KEY.to_string(), other);
                Some(Value::Object(map))
            }
            None => Some(Value::Object(map)),
        },
        _ => None,
    }
}
